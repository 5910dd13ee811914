//! Background map layers.
//!
//! Each layer is read from a GeoJSON file, cut down to the part of the world
//! the map shows, projected, and cut again to the exact map rectangle. The
//! result is ready to be scaled to pixels by the renderer.

pub mod geojson;

use std::fmt;
use std::path::Path;

use geo::{
    coord, BooleanOps, BoundingRect, Coord, Intersects, LineString, MapCoords, MultiLineString,
    MultiPolygon, Polygon, Rect,
};
use tracing::debug;

use crate::config::LayersConfig;
use crate::error::Result;
use crate::projection::{MapExtent, TransverseMercator};

pub use geojson::{parse_shapes, read_shapes, Shapes};

/// Degrees added around the geographic envelope before the first cut.
const ENVELOPE_MARGIN_DEG: f64 = 1.0;

/// Largest longitude distance from the central meridian kept before
/// projecting; the series diverge towards 90 degrees.
const MAX_MERIDIAN_DISTANCE_DEG: f64 = 80.0;

/// The kinds of background layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Coastlines, drawn as lines.
    Coastlines,
    /// Country borders, drawn as lines.
    Countries,
    /// State and province borders, drawn as lines.
    States,
    /// Land masses, drawn as filled polygons.
    Land,
}

impl LayerKind {
    /// Whether the layer is filled rather than stroked.
    #[must_use]
    pub fn is_fill(self) -> bool {
        matches!(self, Self::Land)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coastlines => write!(f, "coastlines"),
            Self::Countries => write!(f, "countries"),
            Self::States => write!(f, "states"),
            Self::Land => write!(f, "land"),
        }
    }
}

/// A projected layer, clipped to the map rectangle. Coordinates are metres.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    /// What the layer represents.
    pub kind: LayerKind,
    /// Lines to stroke (empty for fill layers).
    pub lines: MultiLineString<f64>,
    /// Polygons to fill (empty for line layers).
    pub polygons: MultiPolygon<f64>,
}

impl Layer {
    /// Build a layer from longitude/latitude shapes.
    ///
    /// Line layers stroke both line geometries and polygon rings; fill layers
    /// use polygons only.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Projection`] if the map extent has no usable
    /// geographic envelope.
    pub fn from_shapes(
        kind: LayerKind,
        shapes: &Shapes,
        projection: &TransverseMercator,
        extent: &MapExtent,
    ) -> Result<Self> {
        let window = geographic_window(projection, extent)?;
        let map = extent.rect();
        let shift = |c: Coord<f64>| coord! { x: unwrap_longitude(c.x, projection.lon_0()), y: c.y };

        let layer = if kind.is_fill() {
            let polygons: Vec<Polygon<f64>> = shapes
                .polygons
                .iter()
                .map(|p| p.map_coords(shift))
                .filter(|p| touches(p.bounding_rect(), &window))
                .collect();
            let geographic = clip_polygons(MultiPolygon::new(polygons), &window);
            let projected = geographic.map_coords(|c| projection.forward_coord(c));
            Self {
                kind,
                lines: MultiLineString::new(Vec::new()),
                polygons: clip_polygons(projected, &map),
            }
        } else {
            let lines: Vec<LineString<f64>> = shapes
                .lines
                .iter()
                .chain(
                    shapes
                        .polygons
                        .iter()
                        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors())),
                )
                .map(|l| l.map_coords(shift))
                .filter(|l| touches(l.bounding_rect(), &window))
                .collect();
            let geographic = clip_lines(&MultiLineString::new(lines), &window);
            let projected = geographic.map_coords(|c| projection.forward_coord(c));
            Self {
                kind,
                lines: clip_lines(&projected, &map),
                polygons: MultiPolygon::new(Vec::new()),
            }
        };

        debug!(
            "Layer {kind}: {} lines, {} polygons on map",
            layer.lines.0.len(),
            layer.polygons.0.len()
        );
        Ok(layer)
    }

    /// Check if nothing of the layer falls on the map.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.0.is_empty() && self.polygons.0.is_empty()
    }
}

/// The background layers of a map. Absent layers are not drawn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BaseMap {
    /// Coastlines.
    pub coastlines: Option<Layer>,
    /// Country borders.
    pub countries: Option<Layer>,
    /// State borders.
    pub states: Option<Layer>,
    /// Land fill.
    pub land: Option<Layer>,
}

impl BaseMap {
    /// A base map with no layers.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every layer that has a configured source.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::LayerLoad`] if a configured file cannot be read
    /// and [`crate::Error::Projection`] if the extent cannot be inverted.
    pub fn load(
        config: &LayersConfig,
        projection: &TransverseMercator,
        extent: &MapExtent,
    ) -> Result<Self> {
        let load = |kind: LayerKind, path: Option<&Path>| -> Result<Option<Layer>> {
            let Some(path) = path else {
                debug!("No source configured for {kind} layer, skipping");
                return Ok(None);
            };
            debug!("Loading {kind} layer from {}", path.display());
            let shapes = read_shapes(path)?;
            Layer::from_shapes(kind, &shapes, projection, extent).map(Some)
        };

        Ok(Self {
            coastlines: load(LayerKind::Coastlines, config.coastlines.as_deref())?,
            countries: load(LayerKind::Countries, config.countries.as_deref())?,
            states: load(LayerKind::States, config.states.as_deref())?,
            land: load(LayerKind::Land, config.land.as_deref())?,
        })
    }

    /// Get a layer by kind.
    #[must_use]
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        match kind {
            LayerKind::Coastlines => self.coastlines.as_ref(),
            LayerKind::Countries => self.countries.as_ref(),
            LayerKind::States => self.states.as_ref(),
            LayerKind::Land => self.land.as_ref(),
        }
    }
}

/// The longitude/latitude region worth projecting for this map.
fn geographic_window(projection: &TransverseMercator, extent: &MapExtent) -> Result<Rect<f64>> {
    let env = extent.geographic_envelope(projection)?;
    let lon_0 = projection.lon_0();
    let min_lon = (env.min().x - ENVELOPE_MARGIN_DEG).max(lon_0 - MAX_MERIDIAN_DISTANCE_DEG);
    let max_lon = (env.max().x + ENVELOPE_MARGIN_DEG).min(lon_0 + MAX_MERIDIAN_DISTANCE_DEG);
    let min_lat = (env.min().y - ENVELOPE_MARGIN_DEG).max(-90.0);
    let max_lat = (env.max().y + ENVELOPE_MARGIN_DEG).min(90.0);
    Ok(Rect::new(
        coord! { x: min_lon, y: min_lat },
        coord! { x: max_lon, y: max_lat },
    ))
}

/// Move `lon` into the 360 degree span centred on `lon_0`.
fn unwrap_longitude(lon: f64, lon_0: f64) -> f64 {
    lon_0 + (lon - lon_0 + 180.0).rem_euclid(360.0) - 180.0
}

fn touches(bounds: Option<Rect<f64>>, window: &Rect<f64>) -> bool {
    bounds.is_some_and(|b| b.intersects(window))
}

fn clip_lines(lines: &MultiLineString<f64>, window: &Rect<f64>) -> MultiLineString<f64> {
    if lines.0.is_empty() {
        return lines.clone();
    }
    let clipped = window.to_polygon().clip(lines, false);
    MultiLineString::new(clipped.0.into_iter().filter(|l| l.0.len() >= 2).collect())
}

fn clip_polygons(polygons: MultiPolygon<f64>, window: &Rect<f64>) -> MultiPolygon<f64> {
    if polygons.0.is_empty() {
        return polygons;
    }
    polygons.intersection(&MultiPolygon::new(vec![window.to_polygon()]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cambridge() -> (TransverseMercator, MapExtent) {
        (
            TransverseMercator::new(52.2053, 0.1218).unwrap(),
            MapExtent::new(13_750.0, 22_000.0).unwrap(),
        )
    }

    fn all_inside(layer: &Layer, extent: &MapExtent) -> bool {
        let r = extent.rect();
        let eps = 1e-6;
        let inside = |c: &Coord<f64>| {
            c.x >= r.min().x - eps
                && c.x <= r.max().x + eps
                && c.y >= r.min().y - eps
                && c.y <= r.max().y + eps
        };
        layer.lines.0.iter().all(|l| l.0.iter().all(inside))
            && layer
                .polygons
                .0
                .iter()
                .all(|p| p.exterior().0.iter().all(inside))
    }

    #[test]
    fn test_line_crossing_map_is_clipped() {
        let (tm, extent) = cambridge();
        // An east-west line through the centre, much wider than the map
        let shapes = parse_shapes(
            r#"{"type": "LineString", "coordinates": [[-1.0, 52.2053], [1.5, 52.2053]]}"#,
        )
        .unwrap();
        let layer = Layer::from_shapes(LayerKind::Coastlines, &shapes, &tm, &extent).unwrap();

        assert_eq!(layer.lines.0.len(), 1);
        assert!(all_inside(&layer, &extent));
        let xs: Vec<f64> = layer.lines.0[0].0.iter().map(|c| c.x).collect();
        let span = xs.iter().copied().fold(f64::MIN, f64::max)
            - xs.iter().copied().fold(f64::MAX, f64::min);
        assert!((span - 13_750.0).abs() < 1.0, "span {span}");
    }

    #[test]
    fn test_far_away_geometry_dropped() {
        let (tm, extent) = cambridge();
        let shapes = parse_shapes(
            r#"{"type": "LineString", "coordinates": [[140.0, -35.0], [150.0, -30.0]]}"#,
        )
        .unwrap();
        let layer = Layer::from_shapes(LayerKind::Countries, &shapes, &tm, &extent).unwrap();
        assert!(layer.is_empty());
    }

    #[test]
    fn test_polygon_rings_become_lines_for_line_layers() {
        let (tm, extent) = cambridge();
        let shapes = parse_shapes(
            r#"{"type": "Polygon", "coordinates": [[[0.08, 52.18], [0.16, 52.18], [0.16, 52.23], [0.08, 52.23], [0.08, 52.18]]]}"#,
        )
        .unwrap();
        let layer = Layer::from_shapes(LayerKind::States, &shapes, &tm, &extent).unwrap();

        assert!(layer.polygons.0.is_empty());
        assert!(!layer.lines.0.is_empty());
        assert!(all_inside(&layer, &extent));
    }

    #[test]
    fn test_land_polygon_clipped_to_map() {
        let (tm, extent) = cambridge();
        // A square much larger than the map, with a lake in the middle
        let shapes = parse_shapes(
            r#"{"type": "Polygon", "coordinates": [
                [[-2.0, 50.0], [2.0, 50.0], [2.0, 54.0], [-2.0, 54.0], [-2.0, 50.0]],
                [[0.11, 52.20], [0.13, 52.20], [0.13, 52.21], [0.11, 52.21], [0.11, 52.20]]
            ]}"#,
        )
        .unwrap();
        let layer = Layer::from_shapes(LayerKind::Land, &shapes, &tm, &extent).unwrap();

        assert!(layer.lines.0.is_empty());
        assert_eq!(layer.polygons.0.len(), 1);
        assert_eq!(layer.polygons.0[0].interiors().len(), 1);
        assert!(all_inside(&layer, &extent));
    }

    #[test]
    fn test_fill_layer_ignores_lines() {
        let (tm, extent) = cambridge();
        let shapes = parse_shapes(
            r#"{"type": "LineString", "coordinates": [[0.0, 52.2], [0.2, 52.2]]}"#,
        )
        .unwrap();
        let layer = Layer::from_shapes(LayerKind::Land, &shapes, &tm, &extent).unwrap();
        assert!(layer.is_empty());
    }

    #[test]
    fn test_unwrap_longitude() {
        assert!((unwrap_longitude(-179.9, 179.9) - 180.1).abs() < 1e-9);
        assert!((unwrap_longitude(10.0, 0.0) - 10.0).abs() < 1e-9);
        assert!((unwrap_longitude(350.0, 0.0) + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_without_sources_is_empty() {
        let (tm, extent) = cambridge();
        let basemap = BaseMap::load(&LayersConfig::default(), &tm, &extent).unwrap();
        assert_eq!(basemap, BaseMap::empty());
        assert!(basemap.layer(LayerKind::Land).is_none());
    }

    #[test]
    fn test_load_missing_source_fails() {
        let (tm, extent) = cambridge();
        let config = LayersConfig {
            coastlines: Some("/nonexistent/coast.geojson".into()),
            ..LayersConfig::default()
        };
        let err = BaseMap::load(&config, &tm, &extent).unwrap_err();
        assert!(matches!(err, crate::Error::LayerLoad { .. }));
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;

        let (tm, extent) = cambridge();
        let mut file = tempfile::Builder::new().suffix(".geojson").tempfile().unwrap();
        write!(
            file,
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {{}},
                  "geometry": {{"type": "LineString", "coordinates": [[0.0, 52.2], [0.3, 52.2]]}}}}
            ]}}"#
        )
        .unwrap();

        let config = LayersConfig {
            countries: Some(file.path().to_path_buf()),
            ..LayersConfig::default()
        };
        let basemap = BaseMap::load(&config, &tm, &extent).unwrap();
        let countries = basemap.layer(LayerKind::Countries).unwrap();
        assert_eq!(countries.kind, LayerKind::Countries);
        assert!(!countries.is_empty());
        assert!(basemap.coastlines.is_none());
    }
}
