//! Map colours.
//!
//! Colours are configured as `#rrggbb` strings and resolved once into a
//! [`MapStyle`] before rendering starts.

use std::sync::LazyLock;

use plotters::style::RGBColor;
use regex::Regex;

use crate::config::StyleConfig;
use crate::error::{Error, Result};

static HEX_COLOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
        .unwrap_or_else(|e| unreachable!("hex colour pattern is valid: {e}"))
});

/// Check whether `value` is a `#rrggbb` colour.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    HEX_COLOR.is_match(value)
}

/// Check whether `value` spells "no colour".
#[must_use]
pub fn is_none_color(value: &str) -> bool {
    value.eq_ignore_ascii_case("none")
}

/// Parse a `#rrggbb` colour.
///
/// # Errors
///
/// Returns a configuration error if `value` is not a hex colour.
pub fn parse_color(value: &str) -> Result<RGBColor> {
    let caps = HEX_COLOR
        .captures(value)
        .ok_or_else(|| Error::ConfigValidation {
            message: format!("not a #rrggbb colour: {value}"),
        })?;

    let channel = |i: usize| u8::from_str_radix(&caps[i], 16).unwrap_or_default();
    Ok(RGBColor(channel(1), channel(2), channel(3)))
}

/// Parse a colour that may also be `None`.
///
/// # Errors
///
/// Returns a configuration error if `value` is neither `None` nor a hex colour.
pub fn parse_optional_color(value: &str) -> Result<Option<RGBColor>> {
    if is_none_color(value) {
        Ok(None)
    } else {
        parse_color(value).map(Some)
    }
}

/// Resolved colours used by the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapStyle {
    /// Continent fill.
    pub land: RGBColor,
    /// Ocean and lake fill.
    pub water: RGBColor,
    /// Coastline stroke.
    pub coastline: RGBColor,
    /// Country and state border stroke.
    pub border: RGBColor,
    /// Scatter marker fill.
    pub marker_fill: RGBColor,
    /// Scatter marker edge; `None` draws no edge.
    pub marker_edge: Option<RGBColor>,
    /// Figure background.
    pub background: RGBColor,
    /// Title text.
    pub title: RGBColor,
}

impl MapStyle {
    /// Resolve colours from configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid colour.
    pub fn from_config(config: &StyleConfig) -> Result<Self> {
        Ok(Self {
            land: parse_color(&config.land)?,
            water: parse_color(&config.water)?,
            coastline: parse_color(&config.coastline)?,
            border: parse_color(&config.border)?,
            marker_fill: parse_color(&config.marker_fill)?,
            marker_edge: parse_optional_color(&config.marker_edge)?,
            background: parse_color(&config.background)?,
            title: parse_color(&config.title)?,
        })
    }
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            land: RGBColor(0xf2, 0xf2, 0xf0),
            water: RGBColor(0xcd, 0xd2, 0xd4),
            coastline: RGBColor(0xf5, 0xf5, 0xf3),
            border: RGBColor(0xbb, 0xbb, 0xbb),
            marker_fill: RGBColor(0x3f, 0xea, 0xe9),
            marker_edge: None,
            background: RGBColor(0xff, 0xff, 0xff),
            title: RGBColor(0x33, 0x33, 0x33),
        }
    }
}
