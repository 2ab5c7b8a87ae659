use crate::models::Coordinates;
use crate::normalize;

/// Used when neither a city nor a geocode could be resolved (Milan, Piazza del Duomo).
pub const DEFAULT_COORDINATES: Coordinates = Coordinates::new(45.4642, 9.1900);

#[derive(Debug)]
pub struct KnownCity {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub coordinates: Coordinates,
}

impl KnownCity {
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        std::iter::once(self.name).chain(self.aliases.iter().copied())
    }
}

macro_rules! city {
    ($name:expr, [$($alias:expr),*], $lat:expr, $lon:expr) => {
        KnownCity {
            name: $name,
            aliases: &[$($alias),*],
            coordinates: Coordinates::new($lat, $lon),
        }
    };
}

/// Table order is match priority.
pub static KNOWN_CITIES: &[KnownCity] = &[
    city!("Milano", ["Milan"], 45.4642, 9.1900),
    city!("Roma", ["Rome"], 41.9028, 12.4964),
    city!("Torino", ["Turin"], 45.0703, 7.6869),
    city!("Napoli", ["Naples"], 40.8518, 14.2681),
    city!("Bologna", [], 44.4949, 11.3426),
    city!("Firenze", ["Florence"], 43.7696, 11.2558),
    city!("Genova", ["Genoa"], 44.4056, 8.9463),
    city!("Venezia", ["Venice", "Mestre"], 45.4408, 12.3155),
    city!("Palermo", [], 38.1157, 13.3615),
    city!("Bari", [], 41.1171, 16.8719),
    city!("Catania", [], 37.5079, 15.0830),
    city!("Verona", [], 45.4384, 10.9916),
    city!("Padova", ["Padua"], 45.4064, 11.8768),
    city!("Trieste", [], 45.6495, 13.7768),
    city!("Brescia", [], 45.5416, 10.2118),
    city!("Bergamo", [], 45.6983, 9.6773),
    city!("Reggio Emilia", [], 44.6989, 10.6297),
    city!("Pisa", [], 43.7228, 10.4017),
    city!("Parma", [], 44.8015, 10.3279),
    city!("Modena", [], 44.6471, 10.9252),
    city!("Perugia", [], 43.1107, 12.3908),
    city!("Cagliari", [], 39.2238, 9.1217),
    city!("Trento", [], 46.0748, 11.1217),
    city!("Bolzano", ["Bozen"], 46.4983, 11.3548),
    city!("Ancona", [], 43.6158, 13.5189),
    city!("Lecce", [], 40.3515, 18.1750),
    city!("Livorno", [], 43.5485, 10.3106),
    city!("Salerno", [], 40.6824, 14.7681),
    city!("Monza", [], 45.5845, 9.2744),
    city!("Como", [], 45.8081, 9.0852),
];

/// First table entry whose name or alias appears as a whole word in `text`,
/// ignoring case and diacritics.
pub fn detect(text: &str) -> Option<&'static KnownCity> {
    let folded = normalize::fold(text);
    KNOWN_CITIES.iter().find(|city| {
        city.names()
            .any(|name| normalize::contains_word(&folded, &normalize::fold(name)))
    })
}

pub fn by_name(name: &str) -> Option<&'static KnownCity> {
    let folded = normalize::fold(name.trim());
    KNOWN_CITIES
        .iter()
        .find(|city| city.names().any(|n| normalize::fold(n) == folded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_city_anywhere_in_text() {
        let city = detect("Presidio sotto la prefettura di Torino alle 18").expect("city");
        assert_eq!(city.name, "Torino");
    }

    #[test]
    fn detection_ignores_case_diacritics_and_aliases() {
        assert_eq!(detect("march in MILAN tomorrow").map(|c| c.name), Some("Milano"));
        assert_eq!(detect("corteo a Fìrenze").map(|c| c.name), Some("Firenze"));
    }

    #[test]
    fn table_order_breaks_ties() {
        assert_eq!(
            detect("Da Roma a Milano in bicicletta").map(|c| c.name),
            Some("Milano")
        );
    }

    #[test]
    fn partial_words_do_not_match() {
        assert!(detect("un barista romantico").is_none());
    }

    #[test]
    fn table_coordinates_are_valid() {
        assert!(KNOWN_CITIES.iter().all(|c| c.coordinates.is_valid()));
        assert!(DEFAULT_COORDINATES.is_valid());
        assert_eq!(by_name("rome").map(|c| c.name), Some("Roma"));
    }
}
