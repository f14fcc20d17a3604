// [libs/domain/atlas-models/src/boundary.rs]
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `{geoid, name, layer, geometry (Polygon | MultiPolygon),
/// jurisdiction_id, properties}` (§3). `geoid` format is layer-specific
/// (e.g. 7 digits for school districts, 11 for VTD); format validation
/// itself lives in the `validators` crate.
#[derive(Debug, Clone)]
pub struct NormalizedBoundary {
    pub geoid: String,
    pub name: String,
    pub layer: String,
    pub geometry: Geometry<f64>,
    pub jurisdiction_id: String,
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BoundaryInvariantError {
    #[error("geometry type must be Polygon or MultiPolygon, got {0}")]
    NotPolygonal(&'static str),
    #[error("geometry contains a NaN or infinite coordinate")]
    NonFiniteCoordinate,
    #[error("polygon ring is not closed (first point != last point)")]
    UnclosedRing,
}

impl NormalizedBoundary {
    /// §4.4 transform invariants: valid Polygon/MultiPolygon geometry,
    /// no NaN coordinates, closed rings. Construction-time enforcement
    /// means every `NormalizedBoundary` that exists is already valid —
    /// callers never re-check these three invariants downstream.
    pub fn validate_geometry(geometry: &Geometry<f64>) -> Result<(), BoundaryInvariantError> {
        match geometry {
            Geometry::Polygon(p) => {
                check_finite_and_closed(std::iter::once(p))?;
            }
            Geometry::MultiPolygon(mp) => {
                check_finite_and_closed(mp.0.iter())?;
            }
            other => return Err(BoundaryInvariantError::NotPolygonal(geometry_type_name(other))),
        }
        Ok(())
    }

    pub fn new(
        geoid: impl Into<String>,
        name: impl Into<String>,
        layer: impl Into<String>,
        geometry: Geometry<f64>,
        jurisdiction_id: impl Into<String>,
        properties: BTreeMap<String, Value>,
    ) -> Result<Self, BoundaryInvariantError> {
        Self::validate_geometry(&geometry)?;
        Ok(Self {
            geoid: geoid.into(),
            name: name.into(),
            layer: layer.into(),
            geometry,
            jurisdiction_id: jurisdiction_id.into(),
            properties,
        })
    }
}

fn geometry_type_name(g: &Geometry<f64>) -> &'static str {
    match g {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

fn check_finite_and_closed<'a>(
    polygons: impl Iterator<Item = &'a geo_types::Polygon<f64>>,
) -> Result<(), BoundaryInvariantError> {
    for polygon in polygons {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            let coords: Vec<_> = ring.coords().collect();
            for c in &coords {
                if !c.x.is_finite() || !c.y.is_finite() {
                    return Err(BoundaryInvariantError::NonFiniteCoordinate);
                }
            }
            if let (Some(first), Some(last)) = (coords.first(), coords.last()) {
                if first.x != last.x || first.y != last.y {
                    return Err(BoundaryInvariantError::UnclosedRing);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{polygon, Geometry};

    #[test]
    fn accepts_closed_finite_polygon() {
        let poly: geo_types::Polygon<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        assert!(NormalizedBoundary::validate_geometry(&Geometry::Polygon(poly)).is_ok());
    }

    #[test]
    fn rejects_non_polygonal_geometry() {
        let point = Geometry::Point(geo_types::Point::new(1.0, 2.0));
        assert_eq!(
            NormalizedBoundary::validate_geometry(&point),
            Err(BoundaryInvariantError::NotPolygonal("Point"))
        );
    }

    #[test]
    fn rejects_nan_coordinate() {
        let poly: geo_types::Polygon<f64> = polygon![
            (x: 0.0, y: 0.0),
            (x: f64::NAN, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 0.0),
        ];
        assert_eq!(
            NormalizedBoundary::validate_geometry(&Geometry::Polygon(poly)),
            Err(BoundaryInvariantError::NonFiniteCoordinate)
        );
    }
}
