//! The end-to-end run: load, normalize, project and render.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::basemap::BaseMap;
use crate::config::Config;
use crate::error::Result;
use crate::history::load_history;
use crate::normalize::normalize;
use crate::projection::{MapExtent, TransverseMercator};
use crate::render::{RenderSummary, Renderer};
use crate::style::MapStyle;

/// Inputs of a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOptions {
    /// Location history export to read.
    pub input: PathBuf,
    /// PNG file to write.
    pub output: PathBuf,
    /// Latitude of the map centre in degrees.
    pub latitude: f64,
    /// Longitude of the map centre in degrees.
    pub longitude: f64,
}

impl From<&crate::cli::Cli> for RunOptions {
    fn from(cli: &crate::cli::Cli) -> Self {
        Self {
            input: cli.location_history_json.clone(),
            output: cli.output_png.clone(),
            latitude: cli.latitude,
            longitude: cli.longitude,
        }
    }
}

/// Render the location history in `options.input` to `options.output`.
///
/// The projection is checked before any file is touched, and the output file
/// is only created once the input has been read and normalized.
///
/// # Errors
///
/// Returns the error of the first stage that fails.
pub fn run(options: &RunOptions, config: &Config) -> Result<RenderSummary> {
    let projection = TransverseMercator::new(options.latitude, options.longitude)?;
    let extent = MapExtent::new(config.map.width_m, config.map.height_m)?;
    debug!(
        "Map centred on ({}, {}), {} m x {} m",
        options.latitude,
        options.longitude,
        extent.width_m(),
        extent.height_m()
    );

    let history = load_history(&options.input)?;
    let data = normalize(&history.locations)?;
    if let Some(range) = &data.year_range {
        info!("Data spans {range}");
    }

    let basemap = BaseMap::load(&config.layers, &projection, &extent)?;
    let style = MapStyle::from_config(&config.style)?;

    Renderer::new(config.render.clone(), style, projection, extent).render(
        &data,
        &basemap,
        &options.output,
    )
}
