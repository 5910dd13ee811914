//! Configuration management for locviz.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults. The
//! defaults reproduce the fixed map style and figure geometry, so a run
//! without any configuration always produces the same kind of image.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::style;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "locviz";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "LOCVIZ_";

/// Metres per map unit used for the default extent.
const EXTENT_UNIT_M: f64 = 550.0;

/// Largest rendered image side, in pixels.
const MAX_CANVAS_SIDE_PX: f64 = 32_768.0;

/// Largest rendered image area, in pixels.
const MAX_CANVAS_PIXELS: f64 = 100_000_000.0;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `LOCVIZ_`, sections split by `__`)
/// 2. TOML config file at `~/.config/locviz/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Map extent configuration.
    pub map: MapConfig,
    /// Figure geometry and marker configuration.
    pub render: RenderConfig,
    /// Map colours.
    pub style: StyleConfig,
    /// Background layer sources.
    pub layers: LayersConfig,
}

/// Physical extent of the projected map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Map width in metres.
    pub width_m: f64,
    /// Map height in metres.
    pub height_m: f64,
}

/// Figure geometry and scatter marker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output resolution in dots per inch.
    pub dpi: u32,
    /// Width of the map area in inches.
    pub figure_width_in: f64,
    /// Padding around the figure in inches.
    pub pad_inches: f64,
    /// Marker area in square points.
    pub marker_size: f64,
    /// Marker opacity, 0 (transparent) to 1 (opaque).
    pub marker_alpha: f64,
    /// Title shown above the map; the observed year range is appended.
    pub title: String,
    /// Title size in points.
    pub title_font_pt: f64,
}

/// Map colours as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Continent fill.
    pub land: String,
    /// Ocean and lake fill.
    pub water: String,
    /// Coastline stroke.
    pub coastline: String,
    /// Country and state border stroke.
    pub border: String,
    /// Scatter marker fill.
    pub marker_fill: String,
    /// Scatter marker edge, or `None` for no edge.
    pub marker_edge: String,
    /// Figure background.
    pub background: String,
    /// Title text.
    pub title: String,
}

/// GeoJSON sources for the background layers.
///
/// A layer without a source is not drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayersConfig {
    /// Coastline lines or land polygons whose outlines are drawn.
    pub coastlines: Option<PathBuf>,
    /// Country borders.
    pub countries: Option<PathBuf>,
    /// State and province borders.
    pub states: Option<PathBuf>,
    /// Land polygons used for the continent fill.
    pub land: Option<PathBuf>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width_m: 25.0 * EXTENT_UNIT_M,
            height_m: 40.0 * EXTENT_UNIT_M,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: 600,
            figure_width_in: 6.0,
            pad_inches: 0.2,
            marker_size: 0.5,
            marker_alpha: 0.6,
            title: "Location history".to_string(),
            title_font_pt: 16.0,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            land: "#f2f2f0".to_string(),
            water: "#cdd2d4".to_string(),
            coastline: "#f5f5f3".to_string(),
            border: "#bbbbbb".to_string(),
            marker_fill: "#3FEAE9".to_string(),
            marker_edge: "None".to_string(),
            background: "#ffffff".to_string(),
            title: "#333333".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing config file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("map.width_m", self.map.width_m),
            ("map.height_m", self.map.height_m),
            ("render.figure_width_in", self.render.figure_width_in),
            ("render.marker_size", self.render.marker_size),
            ("render.title_font_pt", self.render.title_font_pt),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::ConfigValidation {
                    message: format!("{name} must be greater than 0 (got {value})"),
                });
            }
        }

        if self.render.dpi == 0 {
            return Err(Error::ConfigValidation {
                message: "render.dpi must be greater than 0".to_string(),
            });
        }

        if !self.render.pad_inches.is_finite() || self.render.pad_inches < 0.0 {
            return Err(Error::ConfigValidation {
                message: format!(
                    "render.pad_inches cannot be negative (got {})",
                    self.render.pad_inches
                ),
            });
        }

        let (width, height) = self.approximate_canvas_px();
        if width > MAX_CANVAS_SIDE_PX
            || height > MAX_CANVAS_SIDE_PX
            || width * height > MAX_CANVAS_PIXELS
        {
            return Err(Error::ConfigValidation {
                message: format!(
                    "render settings give a {width:.0}x{height:.0} pixel canvas; \
                     lower render.dpi, render.figure_width_in or render.pad_inches"
                ),
            });
        }

        if !(0.0..=1.0).contains(&self.render.marker_alpha) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "render.marker_alpha must be between 0 and 1 (got {})",
                    self.render.marker_alpha
                ),
            });
        }

        let s = &self.style;
        for (name, value) in [
            ("style.land", &s.land),
            ("style.water", &s.water),
            ("style.coastline", &s.coastline),
            ("style.border", &s.border),
            ("style.marker_fill", &s.marker_fill),
            ("style.background", &s.background),
            ("style.title", &s.title),
        ] {
            if !style::is_hex_color(value) {
                return Err(Error::ConfigValidation {
                    message: format!("{name} is not a #rrggbb colour: {value}"),
                });
            }
        }

        if !style::is_none_color(&s.marker_edge) && !style::is_hex_color(&s.marker_edge) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "style.marker_edge must be a #rrggbb colour or None: {}",
                    s.marker_edge
                ),
            });
        }

        Ok(())
    }

    /// Image size in pixels implied by the render and map settings, title
    /// band included.
    fn approximate_canvas_px(&self) -> (f64, f64) {
        let r = &self.render;
        let dpi = f64::from(r.dpi);
        let map_height_in = r.figure_width_in * self.map.height_m / self.map.width_m;
        let title_in = r.title_font_pt / 72.0;
        (
            (r.figure_width_in + 2.0 * r.pad_inches) * dpi,
            (map_height_in + 2.0 * r.pad_inches + title_in) * dpi,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.render.dpi, 600);
        assert_eq!(config.style.marker_edge, "None");
        assert!(config.layers.coastlines.is_none());
    }

    #[test]
    fn test_default_map_config() {
        let map = MapConfig::default();

        assert!((map.width_m - 13_750.0).abs() < f64::EPSILON);
        assert!((map.height_m - 22_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_render_config() {
        let render = RenderConfig::default();

        assert!((render.figure_width_in - 6.0).abs() < f64::EPSILON);
        assert!((render.pad_inches - 0.2).abs() < f64::EPSILON);
        assert!((render.marker_size - 0.5).abs() < f64::EPSILON);
        assert!((render.marker_alpha - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_default_style_config() {
        let style = StyleConfig::default();

        assert_eq!(style.land, "#f2f2f0");
        assert_eq!(style.water, "#cdd2d4");
        assert_eq!(style.coastline, "#f5f5f3");
        assert_eq!(style.border, "#bbbbbb");
        assert_eq!(style.marker_fill, "#3FEAE9");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_dpi() {
        let mut config = Config::default();
        config.render.dpi = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("render.dpi"));
    }

    #[test]
    fn test_validate_negative_extent() {
        let mut config = Config::default();
        config.map.height_m = -1.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("map.height_m"));
    }

    #[test]
    fn test_validate_rejects_huge_canvas() {
        let mut config = Config::default();
        config.render.dpi = 600_000;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
        assert!(err.to_string().contains("render.dpi"));

        let mut config = Config::default();
        config.render.pad_inches = 100.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.map.height_m = config.map.width_m * 50.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_large_print_canvas() {
        let mut config = Config::default();
        config.render.dpi = 1200;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_alpha_out_of_range() {
        let mut config = Config::default();
        config.render.marker_alpha = 1.5;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("marker_alpha"));
    }

    #[test]
    fn test_validate_bad_colour() {
        let mut config = Config::default();
        config.style.water = "blue".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("style.water"));
    }

    #[test]
    fn test_validate_marker_edge_colour() {
        let mut config = Config::default();
        config.style.marker_edge = "#000000".to_string();
        assert!(config.validate().is_ok());

        config.style.marker_edge = "black".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("locviz"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    // Tests that read the environment run inside a `Jail`, which serializes
    // them and restores the variables afterwards.

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("missing.toml");
            let config = Config::load_from(Some(path)).map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_toml_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [render]
                dpi = 72
                title = "Cambridge"

                [layers]
                coastlines = "/maps/coast.geojson"
                "#,
            )?;

            let config = Config::load_from(Some(jail.directory().join("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.render.dpi, 72);
            assert_eq!(config.render.title, "Cambridge");
            assert_eq!(
                config.layers.coastlines,
                Some(PathBuf::from("/maps/coast.geojson"))
            );
            // Untouched sections keep their defaults
            assert_eq!(config.style, StyleConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[render]\ndpi = 72\n")?;
            jail.set_env("LOCVIZ_RENDER__DPI", "150");
            jail.set_env("LOCVIZ_MAP__WIDTH_M", "5000");
            jail.set_env("LOCVIZ_STYLE__MARKER_FILL", "#ff0000");

            let config = Config::load_from(Some(jail.directory().join("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.render.dpi, 150);
            assert!((config.map.width_m - 5000.0).abs() < f64::EPSILON);
            assert!((config.map.height_m - MapConfig::default().height_m).abs() < f64::EPSILON);
            assert_eq!(config.style.marker_fill, "#ff0000");
            Ok(())
        });
    }

    #[test]
    fn test_env_override_is_validated() {
        Jail::expect_with(|jail| {
            jail.set_env("LOCVIZ_RENDER__MARKER_ALPHA", "2.0");

            let result = Config::load_from(Some(jail.directory().join("missing.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_load_invalid_toml_value() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[render]\ndpi = 0\n")?;

            let result = Config::load_from(Some(jail.directory().join("config.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_render_config_deserialize() {
        let json = r#"{"dpi": 150, "marker_alpha": 1.0}"#;
        let render: RenderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(render.dpi, 150);
        assert!((render.marker_alpha - 1.0).abs() < f64::EPSILON);
        assert!((render.figure_width_in - 6.0).abs() < f64::EPSILON);
    }
}
