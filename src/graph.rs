use anyhow::{bail, Context, Result};
use image::ImageEncoder;
use plotters::coord::types::RangedCoordf64;
use plotters::prelude::*;
use std::ops::Range;

/// Ten-color categorical palette, cycled per series.
pub const CATEGORY10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

pub fn series_color(idx: usize) -> RGBColor {
    CATEGORY10[idx % CATEGORY10.len()]
}

/// Sequential light-to-dark blue ramp over t in [0, 1].
pub fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(lerp(247, 8), lerp(251, 48), lerp(255, 107))
}

/// Drawing surface for one chart: an RGB buffer with fixed data ranges.
/// Each draw call rebuilds the plotters chart over the shared buffer, so
/// layers accumulate. The background and mesh are drawn on the first call.
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
    x_range: Range<f64>,
    y_range: Range<f64>,
    title: Option<String>,
    x_categories: Option<Vec<String>>,
    y_categories: Option<Vec<String>>,
    mesh: bool,
    chart_initialized: bool,
}

impl Canvas {
    pub fn new(
        width: u32,
        height: u32,
        title: Option<String>,
        x_range: (f64, f64),
        y_range: (f64, f64),
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("canvas dimensions must be non-zero ({width}x{height})");
        }

        let buffer = vec![0u8; (width * height * 3) as usize];

        Ok(Canvas {
            buffer,
            width,
            height,
            x_range: x_range.0..x_range.1,
            y_range: y_range.0..y_range.1,
            title,
            x_categories: None,
            y_categories: None,
            mesh: true,
            chart_initialized: false,
        })
    }

    /// Label x-axis ticks with category names at integer positions.
    pub fn with_x_categories(mut self, categories: Vec<String>) -> Self {
        self.x_categories = Some(categories);
        self
    }

    /// Label y-axis ticks with category names at integer positions.
    pub fn with_y_categories(mut self, categories: Vec<String>) -> Self {
        self.y_categories = Some(categories);
        self
    }

    /// Skip the mesh and axes entirely, for free-form drawings.
    pub fn without_mesh(mut self) -> Self {
        self.mesh = false;
        self
    }

    pub fn draw_line(&mut self, points: Vec<(f64, f64)>, color: RGBAColor, width: u32) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();

        let first_layer = !self.chart_initialized;
        if first_layer {
            root.fill(&WHITE).context("filling background")?;
            self.chart_initialized = true;
        }

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(self.x_range.clone(), self.y_range.clone())
            .context("building chart")?;

        if first_layer {
            draw_mesh(&mut chart, self.mesh, &self.x_categories, &self.y_categories)?;
        }

        chart
            .draw_series(LineSeries::new(points, color.stroke_width(width)))
            .context("drawing line series")?;

        root.present().context("presenting drawing")?;
        Ok(())
    }

    /// Filled circles with a per-point pixel radius.
    pub fn draw_points(&mut self, points: Vec<(f64, f64, i32)>, color: RGBAColor) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();

        let first_layer = !self.chart_initialized;
        if first_layer {
            root.fill(&WHITE).context("filling background")?;
            self.chart_initialized = true;
        }

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(self.x_range.clone(), self.y_range.clone())
            .context("building chart")?;

        if first_layer {
            draw_mesh(&mut chart, self.mesh, &self.x_categories, &self.y_categories)?;
        }

        chart
            .draw_series(
                points
                    .into_iter()
                    .map(|(x, y, radius)| Circle::new((x, y), radius, color.filled())),
            )
            .context("drawing point series")?;

        root.present().context("presenting drawing")?;
        Ok(())
    }

    /// Filled rectangles given as (top-left, bottom-right, color) in data
    /// coordinates.
    pub fn draw_rects(&mut self, rects: Vec<((f64, f64), (f64, f64), RGBAColor)>) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();

        let first_layer = !self.chart_initialized;
        if first_layer {
            root.fill(&WHITE).context("filling background")?;
            self.chart_initialized = true;
        }

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(self.x_range.clone(), self.y_range.clone())
            .context("building chart")?;

        if first_layer {
            draw_mesh(&mut chart, self.mesh, &self.x_categories, &self.y_categories)?;
        }

        chart
            .draw_series(
                rects
                    .into_iter()
                    .map(|(tl, br, color)| Rectangle::new([tl, br], color.filled())),
            )
            .context("drawing rectangles")?;

        root.present().context("presenting drawing")?;
        Ok(())
    }

    pub fn draw_polygon(&mut self, points: Vec<(f64, f64)>, color: RGBAColor) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();

        let first_layer = !self.chart_initialized;
        if first_layer {
            root.fill(&WHITE).context("filling background")?;
            self.chart_initialized = true;
        }

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(self.x_range.clone(), self.y_range.clone())
            .context("building chart")?;

        if first_layer {
            draw_mesh(&mut chart, self.mesh, &self.x_categories, &self.y_categories)?;
        }

        chart
            .draw_series(std::iter::once(Polygon::new(points, color.filled())))
            .context("drawing polygon")?;

        root.present().context("presenting drawing")?;
        Ok(())
    }

    /// Straight segments, one path element each.
    pub fn draw_segments(
        &mut self,
        segments: Vec<[(f64, f64); 2]>,
        color: RGBAColor,
        width: u32,
    ) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();

        let first_layer = !self.chart_initialized;
        if first_layer {
            root.fill(&WHITE).context("filling background")?;
            self.chart_initialized = true;
        }

        let mut chart = ChartBuilder::on(&root)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(self.x_range.clone(), self.y_range.clone())
            .context("building chart")?;

        if first_layer {
            draw_mesh(&mut chart, self.mesh, &self.x_categories, &self.y_categories)?;
        }

        chart
            .draw_series(
                segments
                    .into_iter()
                    .map(|[a, b]| PathElement::new(vec![a, b], color.stroke_width(width))),
            )
            .context("drawing segments")?;

        root.present().context("presenting drawing")?;
        Ok(())
    }

    /// Finalize and encode the canvas as PNG.
    pub fn render(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(
                    &self.buffer,
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )
                .context("encoding PNG")?;
        }

        Ok(png_bytes)
    }
}

fn draw_mesh<DB: DrawingBackend>(
    chart: &mut ChartContext<'_, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    mesh: bool,
    x_categories: &Option<Vec<String>>,
    y_categories: &Option<Vec<String>>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    if !mesh {
        return Ok(());
    }

    let result = match (x_categories, y_categories) {
        (Some(xc), Some(yc)) => chart
            .configure_mesh()
            .x_labels(xc.len())
            .y_labels(yc.len())
            .x_label_formatter(&|x| label_at(xc, *x))
            .y_label_formatter(&|y| label_at(yc, *y))
            .draw(),
        (Some(xc), None) => chart
            .configure_mesh()
            .x_labels(xc.len())
            .x_label_formatter(&|x| label_at(xc, *x))
            .draw(),
        (None, Some(yc)) => chart
            .configure_mesh()
            .y_labels(yc.len())
            .y_label_formatter(&|y| label_at(yc, *y))
            .draw(),
        (None, None) => chart.configure_mesh().draw(),
    };
    result.context("drawing mesh")
}

fn label_at(categories: &[String], pos: f64) -> String {
    let idx = pos.round();
    if idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}
