use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, TAU};

use anyhow::{bail, Result};
use plotters::style::{Color, RGBAColor, BLACK, GREEN, RED};

use crate::catalog::ChartType;
use crate::graph::{heat_color, series_color, Canvas};
use crate::ir::{
    BarSeries, BoxStats, Candle, ChartData, ChartDescription, GeoPoint, LineSeries, PointSeries,
    RadarSeries, TreeNode, ViolinShape,
};
use crate::scale::{categorical_range, numeric_range, numeric_range_with_zero, pad_range};
use crate::RenderOptions;

/// Render a chart description to PNG bytes. The description-only families
/// (Sunburst, Word Cloud, Sankey, Choropleth) have no renderer.
pub fn render_description(
    description: &ChartDescription,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let title = options
        .title
        .clone()
        .unwrap_or_else(|| description.title.clone());
    let (w, h) = (options.width, options.height);

    match &description.data {
        ChartData::Slices { values, hole, .. } => render_slices(w, h, title, values, *hole),
        ChartData::Bars { categories, series, stacked } => {
            render_bars(w, h, title, categories, series, *stacked)
        }
        ChartData::Lines { series, filled } => render_lines(w, h, title, series, *filled),
        ChartData::Points { x_categories, series } => {
            render_points(w, h, title, x_categories.as_deref(), series)
        }
        ChartData::Bins { centers, width, counts } => {
            render_bins(w, h, title, centers, *width, counts)
        }
        ChartData::Boxes { categories, boxes } => render_boxes(w, h, title, categories, boxes),
        ChartData::Violins { categories, violins } => {
            render_violins(w, h, title, categories, violins)
        }
        ChartData::HeatGrid { x_labels, y_labels, values } => {
            render_heat_grid(w, h, title, x_labels, y_labels, values)
        }
        ChartData::DensityGrid { x_centers, y_centers, x_width, y_width, counts } => {
            render_density_grid(w, h, title, x_centers, y_centers, *x_width, *y_width, counts)
        }
        ChartData::Candles { candles } => render_candles(w, h, title, candles),
        ChartData::Funnel { stages, values } => render_funnel(w, h, title, stages, values),
        ChartData::Tree { nodes } if description.chart == ChartType::Treemap => {
            render_treemap(w, h, title, nodes)
        }
        ChartData::Radar { axes, series } => render_radar(w, h, title, axes, series),
        ChartData::GeoPoints { points } => render_geo_points(w, h, title, points),
        ChartData::Tree { .. }
        | ChartData::WordCounts { .. }
        | ChartData::SankeyFlows { .. }
        | ChartData::RegionValues { .. } => bail!(
            "{} has no PNG renderer; request the JSON description instead",
            description.chart.name()
        ),
    }
}

fn render_slices(
    width: u32,
    height: u32,
    title: String,
    values: &[f64],
    hole: f64,
) -> Result<Vec<u8>> {
    let mut canvas =
        Canvas::new(width, height, Some(title), (-1.2, 1.2), (-1.2, 1.2))?.without_mesh();

    let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
    if total > 0.0 {
        let mut cursor = 0.0;
        for (idx, &value) in values.iter().enumerate() {
            if value <= 0.0 {
                continue;
            }
            let span = value / total;
            let points = wedge_points(cursor, cursor + span, hole);
            cursor += span;
            canvas.draw_polygon(points, series_color(idx).mix(0.9))?;
        }
    }
    canvas.render()
}

/// Polygon outline of one wedge between two turns of the circle, annular
/// when hole > 0. Turn 0 sits at twelve o'clock and grows clockwise.
fn wedge_points(from: f64, to: f64, hole: f64) -> Vec<(f64, f64)> {
    let steps = (((to - from) * 64.0).ceil() as usize).max(2);
    let arc = |turn: f64, radius: f64| {
        let theta = FRAC_PI_2 - turn * TAU;
        (radius * theta.cos(), radius * theta.sin())
    };

    let mut points = Vec::with_capacity(2 * steps + 3);
    for step in 0..=steps {
        let turn = from + (to - from) * step as f64 / steps as f64;
        points.push(arc(turn, 1.0));
    }
    if hole > 0.0 {
        for step in (0..=steps).rev() {
            let turn = from + (to - from) * step as f64 / steps as f64;
            points.push(arc(turn, hole));
        }
    } else {
        points.push((0.0, 0.0));
    }
    points
}

fn render_bars(
    width: u32,
    height: u32,
    title: String,
    categories: &[String],
    series: &[BarSeries],
    stacked: bool,
) -> Result<Vec<u8>> {
    let mut extents = Vec::new();
    if stacked {
        for cat_idx in 0..categories.len() {
            let mut cumulative = 0.0;
            for s in series {
                cumulative += s.values.get(cat_idx).copied().unwrap_or(0.0);
                extents.push(cumulative);
            }
        }
    } else {
        for s in series {
            extents.extend_from_slice(&s.values);
        }
    }

    let mut canvas = Canvas::new(
        width,
        height,
        Some(title),
        categorical_range(categories.len()),
        numeric_range_with_zero(extents.into_iter()),
    )?
    .with_x_categories(categories.to_vec());

    let mut rects = Vec::new();
    if stacked {
        for cat_idx in 0..categories.len() {
            let x = cat_idx as f64;
            let mut cumulative = 0.0;
            for (series_idx, s) in series.iter().enumerate() {
                let value = s.values.get(cat_idx).copied().unwrap_or(0.0);
                rects.push((
                    (x - 0.4, cumulative + value),
                    (x + 0.4, cumulative),
                    series_color(series_idx).mix(0.9),
                ));
                cumulative += value;
            }
        }
    } else {
        let slot = 0.8 / series.len().max(1) as f64;
        for (series_idx, s) in series.iter().enumerate() {
            let offset = (series_idx as f64 - (series.len() as f64 - 1.0) / 2.0) * slot;
            for (cat_idx, &value) in s.values.iter().enumerate() {
                let x = cat_idx as f64 + offset;
                rects.push((
                    (x - slot / 2.0, value),
                    (x + slot / 2.0, 0.0),
                    series_color(series_idx).mix(0.9),
                ));
            }
        }
    }

    canvas.draw_rects(rects)?;
    canvas.render()
}

fn render_lines(
    width: u32,
    height: u32,
    title: String,
    series: &[LineSeries],
    filled: bool,
) -> Result<Vec<u8>> {
    let mut dates: Vec<String> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.date.clone()))
        .collect();
    dates.sort();
    dates.dedup();
    let index: HashMap<&str, usize> = dates
        .iter()
        .enumerate()
        .map(|(i, d)| (d.as_str(), i))
        .collect();

    let values = series.iter().flat_map(|s| s.points.iter().map(|p| p.value));
    let y_range = if filled {
        numeric_range_with_zero(values)
    } else {
        numeric_range(values)
    };

    let mut canvas = Canvas::new(
        width,
        height,
        Some(title),
        categorical_range(dates.len()),
        y_range,
    )?
    .with_x_categories(dates.clone());

    for (idx, s) in series.iter().enumerate() {
        let points: Vec<(f64, f64)> = s
            .points
            .iter()
            .map(|p| (index[p.date.as_str()] as f64, p.value))
            .collect();
        if filled && points.len() > 1 {
            let mut polygon = points.clone();
            polygon.push((points[points.len() - 1].0, 0.0));
            polygon.push((points[0].0, 0.0));
            canvas.draw_polygon(polygon, series_color(idx).mix(0.35))?;
        }
        canvas.draw_line(points, series_color(idx).mix(1.0), 2)?;
    }
    canvas.render()
}

fn render_points(
    width: u32,
    height: u32,
    title: String,
    x_categories: Option<&[String]>,
    series: &[PointSeries],
) -> Result<Vec<u8>> {
    let marks: Vec<_> = series.iter().flat_map(|s| s.points.iter()).collect();
    let x_range = match x_categories {
        Some(cats) => categorical_range(cats.len()),
        None => numeric_range(marks.iter().map(|m| m.x)),
    };
    let y_range = numeric_range(marks.iter().map(|m| m.y));
    let bounds = size_bounds(marks.iter().filter_map(|m| m.size));

    let mut canvas = Canvas::new(width, height, Some(title), x_range, y_range)?;
    if let Some(cats) = x_categories {
        canvas = canvas.with_x_categories(cats.to_vec());
    }

    for (idx, s) in series.iter().enumerate() {
        let points: Vec<(f64, f64, i32)> = s
            .points
            .iter()
            .map(|m| (m.x, m.y, point_radius(m.size, bounds)))
            .collect();
        canvas.draw_points(points, series_color(idx).mix(0.8))?;
    }
    canvas.render()
}

/// Min and max of the bound size values, when any are present.
fn size_bounds(sizes: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut bounds: Option<(f64, f64)> = None;
    for s in sizes {
        bounds = Some(match bounds {
            Some((min, max)) => (min.min(s), max.max(s)),
            None => (s, s),
        });
    }
    bounds
}

/// Pixel radius for one mark: fixed for unsized points, scaled from 4 to
/// 20 px across the size range otherwise.
fn point_radius(size: Option<f64>, bounds: Option<(f64, f64)>) -> i32 {
    match (size, bounds) {
        (Some(s), Some((min, max))) if max > min => {
            (4.0 + 16.0 * (s - min) / (max - min)).round() as i32
        }
        (Some(_), Some(_)) => 8,
        _ => 4,
    }
}

fn render_bins(
    width: u32,
    height: u32,
    title: String,
    centers: &[f64],
    bin_width: f64,
    counts: &[u64],
) -> Result<Vec<u8>> {
    let edges = centers
        .iter()
        .flat_map(|&c| [c - bin_width / 2.0, c + bin_width / 2.0]);
    let y_range = numeric_range_with_zero(counts.iter().map(|&c| c as f64));
    let mut canvas = Canvas::new(width, height, Some(title), numeric_range(edges), y_range)?;

    let rects = centers
        .iter()
        .zip(counts)
        .map(|(&center, &count)| {
            (
                (center - bin_width / 2.0, count as f64),
                (center + bin_width / 2.0, 0.0),
                series_color(0).mix(0.8),
            )
        })
        .collect();
    canvas.draw_rects(rects)?;
    canvas.render()
}

fn render_boxes(
    width: u32,
    height: u32,
    title: String,
    categories: &[String],
    boxes: &[BoxStats],
) -> Result<Vec<u8>> {
    let extents = boxes.iter().flat_map(|b| {
        let mut vals = vec![b.whisker_low, b.whisker_high, b.q1, b.q3, b.median];
        vals.extend_from_slice(&b.outliers);
        vals
    });
    let mut canvas = Canvas::new(
        width,
        height,
        Some(title),
        categorical_range(categories.len()),
        numeric_range(extents),
    )?
    .with_x_categories(categories.to_vec());

    for (idx, stats) in boxes.iter().enumerate() {
        let x = idx as f64;
        let color = series_color(idx);
        canvas.draw_rects(vec![((x - 0.25, stats.q3), (x + 0.25, stats.q1), color.mix(0.6))])?;
        canvas.draw_segments(
            vec![
                [(x, stats.whisker_low), (x, stats.q1)],
                [(x, stats.q3), (x, stats.whisker_high)],
                [(x - 0.1, stats.whisker_low), (x + 0.1, stats.whisker_low)],
                [(x - 0.1, stats.whisker_high), (x + 0.1, stats.whisker_high)],
            ],
            color.mix(1.0),
            2,
        )?;
        canvas.draw_segments(
            vec![[(x - 0.25, stats.median), (x + 0.25, stats.median)]],
            color.mix(1.0),
            2,
        )?;
        if !stats.outliers.is_empty() {
            let points = stats.outliers.iter().map(|&v| (x, v, 3)).collect();
            canvas.draw_points(points, color.mix(0.8))?;
        }
    }
    canvas.render()
}

fn render_violins(
    width: u32,
    height: u32,
    title: String,
    categories: &[String],
    violins: &[ViolinShape],
) -> Result<Vec<u8>> {
    let extents = violins.iter().flat_map(|v| v.grid.iter().copied());
    let mut canvas = Canvas::new(
        width,
        height,
        Some(title),
        categorical_range(categories.len()),
        numeric_range(extents),
    )?
    .with_x_categories(categories.to_vec());

    for (idx, violin) in violins.iter().enumerate() {
        let x = idx as f64;
        let mut outline = Vec::with_capacity(violin.grid.len() * 2);
        for (&g, &d) in violin.grid.iter().zip(&violin.density) {
            outline.push((x + d * 0.4, g));
        }
        for (&g, &d) in violin.grid.iter().zip(&violin.density).rev() {
            outline.push((x - d * 0.4, g));
        }
        canvas.draw_polygon(outline, series_color(idx).mix(0.5))?;
        canvas.draw_segments(
            vec![[(x - 0.3, violin.median), (x + 0.3, violin.median)]],
            series_color(idx).mix(1.0),
            2,
        )?;
    }
    canvas.render()
}

fn render_heat_grid(
    width: u32,
    height: u32,
    title: String,
    x_labels: &[String],
    y_labels: &[String],
    values: &[Vec<Option<f64>>],
) -> Result<Vec<u8>> {
    let mut canvas = Canvas::new(
        width,
        height,
        Some(title),
        categorical_range(x_labels.len()),
        categorical_range(y_labels.len()),
    )?
    .with_x_categories(x_labels.to_vec())
    .with_y_categories(y_labels.to_vec());

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values.iter().flatten().flatten() {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }

    let mut rects = Vec::new();
    for (yi, row) in values.iter().enumerate() {
        for (xi, cell) in row.iter().enumerate() {
            if let Some(v) = *cell {
                let t = if max > min { (v - min) / (max - min) } else { 0.5 };
                rects.push((
                    (xi as f64 - 0.5, yi as f64 + 0.5),
                    (xi as f64 + 0.5, yi as f64 - 0.5),
                    heat_color(t).mix(1.0),
                ));
            }
        }
    }
    canvas.draw_rects(rects)?;
    canvas.render()
}

#[allow(clippy::too_many_arguments)]
fn render_density_grid(
    width: u32,
    height: u32,
    title: String,
    x_centers: &[f64],
    y_centers: &[f64],
    x_width: f64,
    y_width: f64,
    counts: &[Vec<u64>],
) -> Result<Vec<u8>> {
    let x_range = numeric_range(
        x_centers
            .iter()
            .flat_map(|&c| [c - x_width / 2.0, c + x_width / 2.0]),
    );
    let y_range = numeric_range(
        y_centers
            .iter()
            .flat_map(|&c| [c - y_width / 2.0, c + y_width / 2.0]),
    );
    let mut canvas = Canvas::new(width, height, Some(title), x_range, y_range)?;

    let max_count = counts.iter().flatten().copied().max().unwrap_or(0);
    if max_count > 0 {
        let mut rects = Vec::new();
        for (yi, row) in counts.iter().enumerate() {
            for (xi, &count) in row.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let t = count as f64 / max_count as f64;
                rects.push((
                    (x_centers[xi] - x_width / 2.0, y_centers[yi] + y_width / 2.0),
                    (x_centers[xi] + x_width / 2.0, y_centers[yi] - y_width / 2.0),
                    heat_color(t).mix(1.0),
                ));
            }
        }
        canvas.draw_rects(rects)?;
    }
    canvas.render()
}

fn render_candles(width: u32, height: u32, title: String, candles: &[Candle]) -> Result<Vec<u8>> {
    let extents = candles.iter().flat_map(|c| [c.low, c.high]);
    let dates: Vec<String> = candles.iter().map(|c| c.date.clone()).collect();
    let mut canvas = Canvas::new(
        width,
        height,
        Some(title),
        categorical_range(candles.len()),
        numeric_range(extents),
    )?
    .with_x_categories(dates);

    let mut wicks = Vec::new();
    let mut bodies = Vec::new();
    for (idx, candle) in candles.iter().enumerate() {
        let x = idx as f64;
        wicks.push([(x, candle.low), (x, candle.high)]);
        let color = if candle.close >= candle.open { GREEN } else { RED };
        bodies.push((
            (x - 0.3, candle.open.max(candle.close)),
            (x + 0.3, candle.open.min(candle.close)),
            color.mix(0.9),
        ));
    }
    canvas.draw_segments(wicks, BLACK.mix(0.8), 1)?;
    canvas.draw_rects(bodies)?;
    canvas.render()
}

fn render_funnel(
    width: u32,
    height: u32,
    title: String,
    stages: &[String],
    values: &[f64],
) -> Result<Vec<u8>> {
    let max = values.iter().copied().fold(0.0f64, f64::max);
    let n = stages.len();
    // First stage at the top; the y axis runs upward.
    let y_categories: Vec<String> = stages.iter().rev().cloned().collect();
    let x_range = if max > 0.0 {
        pad_range(-max / 2.0, max / 2.0)
    } else {
        (-1.0, 1.0)
    };
    let mut canvas = Canvas::new(width, height, Some(title), x_range, categorical_range(n))?
        .with_y_categories(y_categories);

    let mut rects = Vec::new();
    for (idx, &value) in values.iter().enumerate() {
        if value <= 0.0 {
            continue;
        }
        let y = (n - 1 - idx) as f64;
        rects.push((
            (-value / 2.0, y + 0.35),
            (value / 2.0, y - 0.35),
            series_color(idx).mix(0.85),
        ));
    }
    canvas.draw_rects(rects)?;
    canvas.render()
}

fn render_treemap(width: u32, height: u32, title: String, nodes: &[TreeNode]) -> Result<Vec<u8>> {
    let mut canvas =
        Canvas::new(width, height, Some(title), (0.0, 1.0), (0.0, 1.0))?.without_mesh();

    let weights: Vec<(usize, f64)> = nodes
        .iter()
        .enumerate()
        .filter(|(_, node)| node.value > 0.0)
        .map(|(idx, node)| (idx, node.value))
        .collect();
    let total: f64 = weights.iter().map(|(_, v)| v).sum();
    if total > 0.0 {
        let mut rects = Vec::new();
        dice(&weights, total, (0.0, 0.0, 1.0, 1.0), true, &mut rects);
        canvas.draw_rects(rects)?;
    }
    canvas.render()
}

/// Slice-and-dice layout: each node takes a strip of the remaining area,
/// alternating the cut direction at every step.
fn dice(
    nodes: &[(usize, f64)],
    total: f64,
    area: (f64, f64, f64, f64),
    vertical: bool,
    out: &mut Vec<((f64, f64), (f64, f64), RGBAColor)>,
) {
    const GAP: f64 = 0.004;

    let (idx, value) = match nodes.first() {
        Some(&(idx, value)) => (idx, value),
        None => return,
    };
    if total <= 0.0 {
        return;
    }

    let (x0, y0, x1, y1) = area;
    let frac = (value / total).clamp(0.0, 1.0);
    let color = series_color(idx).mix(0.85);
    if vertical {
        let split = x0 + (x1 - x0) * frac;
        out.push(((x0 + GAP, y1 - GAP), (split - GAP, y0 + GAP), color));
        dice(&nodes[1..], total - value, (split, y0, x1, y1), false, out);
    } else {
        let split = y1 - (y1 - y0) * frac;
        out.push(((x0 + GAP, y1 - GAP), (x1 - GAP, split + GAP), color));
        dice(&nodes[1..], total - value, (x0, y0, x1, split), true, out);
    }
}

fn render_radar(
    width: u32,
    height: u32,
    title: String,
    axes: &[String],
    series: &[RadarSeries],
) -> Result<Vec<u8>> {
    let mut canvas =
        Canvas::new(width, height, Some(title), (-1.2, 1.2), (-1.2, 1.2))?.without_mesh();

    let n = axes.len();
    if n > 0 {
        let spoke = |k: usize, r: f64| {
            let theta = FRAC_PI_2 - (k as f64 / n as f64) * TAU;
            (r * theta.cos(), r * theta.sin())
        };
        let spokes: Vec<[(f64, f64); 2]> = (0..n).map(|k| [(0.0, 0.0), spoke(k, 1.0)]).collect();
        canvas.draw_segments(spokes, BLACK.mix(0.3), 1)?;

        let max = series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0f64, f64::max);
        if max > 0.0 {
            for (idx, s) in series.iter().enumerate() {
                let mut points: Vec<(f64, f64)> = s
                    .values
                    .iter()
                    .enumerate()
                    .map(|(k, &v)| spoke(k, (v / max).clamp(0.0, 1.0)))
                    .collect();
                canvas.draw_polygon(points.clone(), series_color(idx).mix(0.3))?;
                if let Some(&first) = points.first() {
                    points.push(first);
                }
                canvas.draw_line(points, series_color(idx).mix(0.9), 2)?;
            }
        }
    }
    canvas.render()
}

fn render_geo_points(
    width: u32,
    height: u32,
    title: String,
    points: &[GeoPoint],
) -> Result<Vec<u8>> {
    let x_range = numeric_range(points.iter().map(|p| p.longitude));
    let y_range = numeric_range(points.iter().map(|p| p.latitude));
    let bounds = size_bounds(points.iter().filter_map(|p| p.size));

    let mut canvas = Canvas::new(width, height, Some(title), x_range, y_range)?;
    let marks = points
        .iter()
        .map(|p| (p.longitude, p.latitude, point_radius(p.size, bounds)))
        .collect();
    canvas.draw_points(marks, series_color(0).mix(0.7))?;
    canvas.render()
}
