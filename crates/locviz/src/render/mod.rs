//! Figure rendering.
//!
//! The figure is a padded canvas holding a title band and the map. The map
//! is painted in stages: draw calls are registered in a fixed order and
//! painted by z-order, so filled areas never cover lines and the scatter
//! overlay is always on top. The finished bitmap is written as a PNG with the
//! configured DPI recorded in its `pHYs` chunk.

pub mod glyphs;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use geo::{Coord, LineString, Rect};
use plotters::coord::Shift;
use plotters::drawing::{DrawingArea, IntoDrawingArea};
use plotters::element::{Circle, PathElement, Polygon, Rectangle};
use plotters::prelude::BitMapBackend;
use plotters::style::{Color, RGBColor, ShapeStyle};
use tracing::{debug, info};

use crate::basemap::{BaseMap, Layer, LayerKind};
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::normalize::Normalized;
use crate::projection::{MapExtent, TransverseMercator};
use crate::style::MapStyle;

/// Points per inch.
const PT_PER_INCH: f64 = 72.0;

/// Metres per inch, for the PNG physical-size chunk.
const METERS_PER_INCH: f64 = 0.0254;

/// Stroke widths in points.
const COASTLINE_WIDTH_PT: f64 = 1.0;
const BORDER_WIDTH_PT: f64 = 0.5;
const BOUNDARY_WIDTH_PT: f64 = 1.0;

/// Gap between the title and the map, in points.
const TITLE_GAP_PT: f64 = 6.0;

/// Bytes per pixel of the RGB bitmap.
const BYTES_PER_PIXEL: usize = 3;

/// A painting stage of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Coastline strokes.
    Coastlines,
    /// Country border strokes.
    Countries,
    /// Land fill with lakes.
    ContinentFill,
    /// State border strokes.
    States,
    /// Water fill and frame of the map rectangle.
    MapBoundary,
    /// The location points.
    Scatter,
}

impl Stage {
    /// Order in which draw calls are registered.
    pub const REGISTRATION_ORDER: [Stage; 6] = [
        Stage::Coastlines,
        Stage::Countries,
        Stage::ContinentFill,
        Stage::States,
        Stage::MapBoundary,
        Stage::Scatter,
    ];

    /// Painting depth; lower values are painted first.
    #[must_use]
    pub fn z_order(self) -> u8 {
        match self {
            Self::MapBoundary => 0,
            Self::ContinentFill => 1,
            Self::Coastlines | Self::Countries | Self::States => 2,
            Self::Scatter => 3,
        }
    }

    /// Stages in painting order. Stages at the same depth keep their
    /// registration order.
    #[must_use]
    pub fn paint_order() -> Vec<Stage> {
        let mut stages = Self::REGISTRATION_ORDER.to_vec();
        stages.sort_by_key(|s| s.z_order());
        stages
    }
}

/// Pixel geometry of the figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Left edge of the map.
    pub map_x: i32,
    /// Top edge of the map.
    pub map_y: i32,
    /// Map width in pixels.
    pub map_width: u32,
    /// Map height in pixels.
    pub map_height: u32,
    /// Size of one title glyph pixel, in canvas pixels.
    pub title_scale: u32,
    /// Top edge of the title.
    pub title_y: i32,
    rect: Rect<f64>,
}

impl Layout {
    /// Compute the layout for a map extent under `config`.
    #[must_use]
    pub fn new(config: &RenderConfig, extent: &MapExtent) -> Self {
        let dpi = f64::from(config.dpi);
        let map_width = ((config.figure_width_in * dpi).round() as u32).max(1);
        let map_height =
            ((f64::from(map_width) * extent.height_m() / extent.width_m()).round() as u32).max(1);
        let pad = (config.pad_inches * dpi).round() as u32;

        let title_px = config.title_font_pt / PT_PER_INCH * dpi;
        let title_scale = ((title_px / glyphs::GLYPH_HEIGHT as f64).round() as u32).max(1);
        let title_gap = points_to_pixels(TITLE_GAP_PT, config.dpi);
        let title_band = glyphs::GLYPH_HEIGHT as u32 * title_scale + title_gap;

        Self {
            width: map_width + 2 * pad,
            height: map_height + 2 * pad + title_band,
            map_x: pad as i32,
            map_y: (pad + title_band) as i32,
            map_width,
            map_height,
            title_scale,
            title_y: pad as i32,
            rect: extent.rect(),
        }
    }

    /// Convert projected metres to a canvas pixel.
    #[must_use]
    pub fn to_pixel(&self, c: Coord<f64>) -> (i32, i32) {
        let r = self.rect;
        let px = f64::from(self.map_x)
            + (c.x - r.min().x) / r.width() * f64::from(self.map_width);
        let py = f64::from(self.map_y)
            + (r.max().y - c.y) / r.height() * f64::from(self.map_height);
        (px.round() as i32, py.round() as i32)
    }
}

/// What a render produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    /// Image width in pixels.
    pub width_px: u32,
    /// Image height in pixels.
    pub height_px: u32,
    /// Points painted on the map.
    pub points_drawn: usize,
    /// Points outside the map rectangle.
    pub points_clipped: usize,
}

/// Draws normalized points over a base map.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
    style: MapStyle,
    projection: TransverseMercator,
    extent: MapExtent,
}

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn draw_error(e: impl std::fmt::Display) -> Error {
    Error::render(e.to_string())
}

fn points_to_pixels(pt: f64, dpi: u32) -> u32 {
    ((pt / PT_PER_INCH * f64::from(dpi)).round() as u32).max(1)
}

impl Renderer {
    /// Create a renderer.
    #[must_use]
    pub fn new(
        config: RenderConfig,
        style: MapStyle,
        projection: TransverseMercator,
        extent: MapExtent,
    ) -> Self {
        Self {
            config,
            style,
            projection,
            extent,
        }
    }

    /// Layout of the figure this renderer produces.
    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::new(&self.config, &self.extent)
    }

    /// Title text for `data`: the configured title followed by the year range.
    #[must_use]
    pub fn title(&self, data: &Normalized) -> String {
        match &data.year_range {
            Some(range) if self.config.title.is_empty() => range.to_string(),
            Some(range) => format!("{} {range}", self.config.title),
            None => self.config.title.clone(),
        }
    }

    /// Marker radius in pixels for the configured marker area and DPI.
    #[must_use]
    pub fn marker_radius(&self) -> u32 {
        let diameter_pt = self.config.marker_size.sqrt();
        ((diameter_pt / 2.0 / PT_PER_INCH * f64::from(self.config.dpi)).round() as u32).max(1)
    }

    /// Render the figure and write it to `output` as a PNG.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if drawing fails and [`Error::OutputWrite`]
    /// if the file cannot be written.
    pub fn render(
        &self,
        data: &Normalized,
        basemap: &BaseMap,
        output: &Path,
    ) -> Result<RenderSummary> {
        let (pixels, summary) = self.render_to_buffer(data, basemap)?;
        write_png(output, &pixels, summary.width_px, summary.height_px, self.config.dpi)?;
        info!(
            "Wrote {}x{} map with {} points to {}",
            summary.width_px,
            summary.height_px,
            summary.points_drawn,
            output.display()
        );
        Ok(summary)
    }

    /// Render the figure into an RGB buffer, row-major, three bytes per pixel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if drawing fails.
    pub fn render_to_buffer(
        &self,
        data: &Normalized,
        basemap: &BaseMap,
    ) -> Result<(Vec<u8>, RenderSummary)> {
        let layout = self.layout();
        debug!(
            "Canvas {}x{}, map {}x{} at ({}, {})",
            layout.width, layout.height, layout.map_width, layout.map_height, layout.map_x, layout.map_y
        );

        let mut pixels = vec![0u8; layout.width as usize * layout.height as usize * BYTES_PER_PIXEL];
        let mut summary = RenderSummary {
            width_px: layout.width,
            height_px: layout.height,
            points_drawn: 0,
            points_clipped: 0,
        };

        {
            let root = BitMapBackend::with_buffer(&mut pixels, (layout.width, layout.height))
                .into_drawing_area();
            root.fill(&self.style.background).map_err(draw_error)?;
            self.draw_title(&root, &layout, &self.title(data))?;

            for stage in Stage::paint_order() {
                match stage {
                    Stage::MapBoundary => self.draw_boundary(&root, &layout)?,
                    Stage::ContinentFill => {
                        if let Some(layer) = basemap.layer(LayerKind::Land) {
                            self.draw_fill(&root, &layout, layer)?;
                        }
                    }
                    Stage::Coastlines => {
                        let width = points_to_pixels(COASTLINE_WIDTH_PT, self.config.dpi);
                        if let Some(layer) = basemap.layer(LayerKind::Coastlines) {
                            self.draw_lines(&root, &layout, layer, self.style.coastline, width)?;
                        }
                    }
                    Stage::Countries | Stage::States => {
                        let kind = if stage == Stage::Countries {
                            LayerKind::Countries
                        } else {
                            LayerKind::States
                        };
                        let width = points_to_pixels(BORDER_WIDTH_PT, self.config.dpi);
                        if let Some(layer) = basemap.layer(kind) {
                            self.draw_lines(&root, &layout, layer, self.style.border, width)?;
                        }
                    }
                    Stage::Scatter => self.draw_scatter(&root, &layout, data, &mut summary)?,
                }
            }

            root.present().map_err(draw_error)?;
        }

        debug!(
            "Drew {} points, {} outside the map",
            summary.points_drawn, summary.points_clipped
        );
        Ok((pixels, summary))
    }

    fn draw_title(&self, root: &Canvas<'_>, layout: &Layout, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let scale = layout.title_scale as i32;
        let text_width = glyphs::text_width(text) as i32 * scale;
        let left = (layout.width as i32 - text_width) / 2;
        let style = self.style.title.filled();

        for (gx, gy) in glyphs::pixels(text) {
            let x = left + gx as i32 * scale;
            let y = layout.title_y + gy as i32 * scale;
            if x < 0 || x + scale > layout.width as i32 {
                continue;
            }
            root.draw(&Rectangle::new([(x, y), (x + scale - 1, y + scale - 1)], style))
                .map_err(draw_error)?;
        }
        Ok(())
    }

    fn draw_boundary(&self, root: &Canvas<'_>, layout: &Layout) -> Result<()> {
        let (x0, y0) = (layout.map_x, layout.map_y);
        let (x1, y1) = (
            x0 + layout.map_width as i32 - 1,
            y0 + layout.map_height as i32 - 1,
        );
        root.draw(&Rectangle::new([(x0, y0), (x1, y1)], self.style.water.filled()))
            .map_err(draw_error)?;

        // Frame sits just outside the map so later fills cannot cover it
        let width = points_to_pixels(BOUNDARY_WIDTH_PT, self.config.dpi) as i32;
        let half = width / 2 + 1;
        let frame = ShapeStyle::from(&self.style.border).stroke_width(width as u32);
        root.draw(&PathElement::new(
            vec![
                (x0 - half, y0 - half),
                (x1 + half, y0 - half),
                (x1 + half, y1 + half),
                (x0 - half, y1 + half),
                (x0 - half, y0 - half),
            ],
            frame,
        ))
        .map_err(draw_error)
    }

    fn draw_fill(&self, root: &Canvas<'_>, layout: &Layout, layer: &Layer) -> Result<()> {
        for polygon in &layer.polygons {
            root.draw(&Polygon::new(
                ring_pixels(layout, polygon.exterior()),
                self.style.land.filled(),
            ))
            .map_err(draw_error)?;
            for lake in polygon.interiors() {
                root.draw(&Polygon::new(
                    ring_pixels(layout, lake),
                    self.style.water.filled(),
                ))
                .map_err(draw_error)?;
            }
        }
        Ok(())
    }

    fn draw_lines(
        &self,
        root: &Canvas<'_>,
        layout: &Layout,
        layer: &Layer,
        color: RGBColor,
        width: u32,
    ) -> Result<()> {
        let style = ShapeStyle::from(&color).stroke_width(width);
        for line in &layer.lines {
            root.draw(&PathElement::new(ring_pixels(layout, line), style))
                .map_err(draw_error)?;
        }
        Ok(())
    }

    fn draw_scatter(
        &self,
        root: &Canvas<'_>,
        layout: &Layout,
        data: &Normalized,
        summary: &mut RenderSummary,
    ) -> Result<()> {
        let radius = self.marker_radius();
        let fill = self.style.marker_fill.mix(self.config.marker_alpha).filled();
        let edge = self
            .style
            .marker_edge
            .map(|c| c.mix(self.config.marker_alpha).stroke_width(1));

        for point in &data.points {
            let (x, y) = self.projection.forward(point.lon, point.lat);
            if !self.extent.contains(x, y) {
                summary.points_clipped += 1;
                continue;
            }
            let center = layout.to_pixel(Coord { x, y });
            root.draw(&Circle::new(center, radius, fill))
                .map_err(draw_error)?;
            if let Some(edge) = edge {
                root.draw(&Circle::new(center, radius, edge))
                    .map_err(draw_error)?;
            }
            summary.points_drawn += 1;
        }
        Ok(())
    }
}

fn ring_pixels(layout: &Layout, line: &LineString<f64>) -> Vec<(i32, i32)> {
    let mut out: Vec<(i32, i32)> = Vec::with_capacity(line.0.len());
    for c in &line.0 {
        let p = layout.to_pixel(*c);
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    out
}

/// Encode an RGB buffer as PNG at `path`.
///
/// # Errors
///
/// Returns [`Error::OutputWrite`] if the file cannot be created or written.
pub fn write_png(path: &Path, pixels: &[u8], width: u32, height: u32, dpi: u32) -> Result<()> {
    let write_err = |e: &dyn std::fmt::Display| Error::output_write(path, e.to_string());

    let file = File::create(path).map_err(|e| write_err(&e))?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let ppu = (f64::from(dpi) / METERS_PER_INCH).round() as u32;
    encoder.set_pixel_dims(Some(png::PixelDimensions {
        xppu: ppu,
        yppu: ppu,
        unit: png::Unit::Meter,
    }));

    let mut writer = encoder.write_header().map_err(|e| write_err(&e))?;
    writer.write_image_data(pixels).map_err(|e| write_err(&e))?;
    writer.finish().map_err(|e| write_err(&e))
}
