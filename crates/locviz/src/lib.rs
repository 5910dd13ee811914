//! `locviz` - Plot a location history export on a transverse Mercator map
//!
//! This library reads a location history JSON export, converts its records to
//! decimal degrees and local date-times, and renders them as a scatter plot
//! over optional background layers into a PNG image.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod basemap;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod normalize;
pub mod pipeline;
pub mod projection;
pub mod render;
pub mod style;

pub use basemap::BaseMap;
pub use config::Config;
pub use error::{Error, Result};
pub use history::{load_history, LocationHistory, LocationRecord};
pub use logging::init_logging;
pub use normalize::{normalize, Normalized, NormalizedPoint};
pub use pipeline::{run, RunOptions};
pub use projection::{MapExtent, TransverseMercator};
pub use render::{RenderSummary, Renderer};
