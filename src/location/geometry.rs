use geo::{
    Centroid, HaversineDistance, HaversineIntermediate, HaversineLength, LineString,
    MultiPolygon, Point, Polygon,
};

use super::geocoder::{GeocodeHit, Geometry};
use crate::models::Coordinates;

/// Geometry capabilities the resolver needs; swappable for synthetic tests.
pub trait GeometryOps {
    /// Area centroid of one or more polygons given as rings (outer ring first).
    fn centroid(&self, polygons: &[Vec<Vec<Coordinates>>]) -> Option<Coordinates>;

    /// Point halfway along the longest of `lines`, measured on the sphere.
    fn midpoint(&self, lines: &[Vec<Coordinates>]) -> Option<Coordinates>;
}

/// [`GeometryOps`] backed by the `geo` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoOps;

impl GeometryOps for GeoOps {
    fn centroid(&self, polygons: &[Vec<Vec<Coordinates>>]) -> Option<Coordinates> {
        let polygons: Vec<Polygon<f64>> = polygons
            .iter()
            .filter_map(|rings| {
                let (exterior, interiors) = rings.split_first()?;
                Some(Polygon::new(
                    to_line_string(exterior),
                    interiors.iter().map(|ring| to_line_string(ring)).collect(),
                ))
            })
            .collect();
        MultiPolygon::new(polygons).centroid().map(from_point)
    }

    fn midpoint(&self, lines: &[Vec<Coordinates>]) -> Option<Coordinates> {
        let longest = lines
            .iter()
            .filter(|line| !line.is_empty())
            .map(|line| to_line_string(line))
            .max_by(|a, b| a.haversine_length().total_cmp(&b.haversine_length()))?;

        let half = longest.haversine_length() / 2.0;
        let mut walked = 0.0;
        for segment in longest.lines() {
            let start = Point::from(segment.start);
            let end = Point::from(segment.end);
            let length = start.haversine_distance(&end);
            if walked + length >= half {
                let fraction = if length > 0.0 {
                    (half - walked) / length
                } else {
                    0.0
                };
                return Some(from_point(start.haversine_intermediate(&end, fraction)));
            }
            walked += length;
        }
        longest.points().next().map(from_point)
    }
}

/// Centroid for areas, arc midpoint for lines, the point itself otherwise.
/// Falls back to the service's reference point when refinement yields
/// nothing usable.
pub fn refine<O: GeometryOps + ?Sized>(ops: &O, hit: &GeocodeHit) -> Option<Coordinates> {
    let refined = match &hit.geometry {
        Some(Geometry::Polygon(rings)) => ops.centroid(std::slice::from_ref(rings)),
        Some(Geometry::MultiPolygon(polygons)) => ops.centroid(polygons),
        Some(Geometry::LineString(line)) => ops.midpoint(std::slice::from_ref(line)),
        Some(Geometry::MultiLineString(lines)) => ops.midpoint(lines),
        Some(Geometry::Point(point)) => Some(*point),
        None => None,
    };
    refined
        .filter(Coordinates::is_valid)
        .or_else(|| Some(hit.point).filter(Coordinates::is_valid))
}

fn to_line_string(points: &[Coordinates]) -> LineString<f64> {
    points.iter().map(|c| (c.lon, c.lat)).collect::<Vec<_>>().into()
}

fn from_point(point: Point<f64>) -> Coordinates {
    Coordinates::new(point.y(), point.x())
}
