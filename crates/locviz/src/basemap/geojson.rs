//! Minimal GeoJSON reader for background layers.
//!
//! Only what map layers need is modelled: feature collections, single
//! features and bare geometries holding lines and polygons. Points are read
//! and discarded.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geo::{Coord, LineString, Polygon};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Lines and polygons read from a layer file, in longitude/latitude degrees.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shapes {
    /// Line geometries.
    pub lines: Vec<LineString<f64>>,
    /// Polygon geometries, holes included.
    pub polygons: Vec<Polygon<f64>>,
}

impl Shapes {
    /// Check if no geometry was read.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.polygons.is_empty()
    }
}

// Tried in order; a bare geometry would also match `Feature` with no geometry.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    FeatureCollection { features: Vec<Feature> },
    Geometry(Geometry),
    Feature(Feature),
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Point {},
    MultiPoint {},
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

/// A GeoJSON position: longitude, latitude and an optional altitude.
#[derive(Debug, Deserialize)]
struct Position(Vec<f64>);

impl Position {
    fn to_coord(&self) -> std::result::Result<Coord<f64>, String> {
        match self.0.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            other => Err(format!("position needs at least two values, got {other:?}")),
        }
    }
}

fn line(positions: &[Position]) -> std::result::Result<LineString<f64>, String> {
    positions
        .iter()
        .map(Position::to_coord)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> std::result::Result<Option<Polygon<f64>>, String> {
    let mut rings = rings.iter().map(|r| line(r));
    let Some(exterior) = rings.next().transpose()? else {
        return Ok(None);
    };
    let interiors = rings.collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(Some(Polygon::new(exterior, interiors)))
}

impl Geometry {
    fn collect_into(&self, shapes: &mut Shapes) -> std::result::Result<(), String> {
        match self {
            Self::Point {} | Self::MultiPoint {} => {}
            Self::LineString { coordinates } => shapes.lines.push(line(coordinates)?),
            Self::MultiLineString { coordinates } => {
                for positions in coordinates {
                    shapes.lines.push(line(positions)?);
                }
            }
            Self::Polygon { coordinates } => shapes.polygons.extend(polygon(coordinates)?),
            Self::MultiPolygon { coordinates } => {
                for rings in coordinates {
                    shapes.polygons.extend(polygon(rings)?);
                }
            }
            Self::GeometryCollection { geometries } => {
                for geometry in geometries {
                    geometry.collect_into(shapes)?;
                }
            }
        }
        Ok(())
    }
}

/// Parse GeoJSON text into shapes.
///
/// # Errors
///
/// Returns a message describing the first structural problem found.
pub fn parse_shapes(json: &str) -> std::result::Result<Shapes, String> {
    let document: Document = serde_json::from_str(json).map_err(|e| e.to_string())?;
    shapes_from(&document)
}

/// Read a GeoJSON file into shapes.
///
/// # Errors
///
/// Returns [`Error::LayerLoad`] if the file cannot be read or is not
/// usable GeoJSON.
pub fn read_shapes(path: &Path) -> Result<Shapes> {
    let file = File::open(path).map_err(|e| Error::layer_load(path, e.to_string()))?;
    let document: Document = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| Error::layer_load(path, e.to_string()))?;
    shapes_from(&document).map_err(|message| Error::layer_load(path, message))
}

fn shapes_from(document: &Document) -> std::result::Result<Shapes, String> {
    let mut shapes = Shapes::default();
    match document {
        Document::FeatureCollection { features } => {
            for geometry in features.iter().filter_map(|f| f.geometry.as_ref()) {
                geometry.collect_into(&mut shapes)?;
            }
        }
        Document::Feature(feature) => {
            if let Some(geometry) = &feature.geometry {
                geometry.collect_into(&mut shapes)?;
            }
        }
        Document::Geometry(geometry) => geometry.collect_into(&mut shapes)?,
    }
    Ok(shapes)
}
