use std::collections::{HashMap, HashSet};

use crate::catalog::ChartType;
use crate::data::{Column, Dataset};
use crate::ir::{
    BarSeries, Candle, ChartData, ChartDescription, GeoPoint, LineSeries, PointMark, PointSeries,
    RadarSeries, ResolvedChart, TimePoint, TreeNode, ViolinShape,
};
use crate::transform::{
    aggregate_links, aggregate_mean, aggregate_sum, compute_bins, compute_box_stats,
    compute_density_grid, compute_kde, count_words, group_numeric, percentile,
    silverman_bandwidth, DEFAULT_BIN_COUNT, WORD_CAP,
};

/// Build the renderable description for a validated chart. Total over the
/// catalog: every failure mode was ruled out during resolution, so the only
/// data concern left is rows with empty or unparseable cells in a bound
/// role, which are skipped.
pub fn compile_chart(dataset: &Dataset, resolved: &ResolvedChart) -> ChartDescription {
    let data = match resolved.chart {
        ChartType::Pie => compile_slices(dataset, resolved, 0.0),
        ChartType::Donut => compile_slices(dataset, resolved, 0.5),
        ChartType::Bar => compile_bars(dataset, resolved),
        ChartType::GroupedBar => compile_multi_bars(dataset, resolved, false),
        ChartType::StackedBar => compile_multi_bars(dataset, resolved, true),
        ChartType::Line => compile_lines(dataset, resolved, false),
        ChartType::Area => compile_lines(dataset, resolved, true),
        ChartType::Scatter => compile_points(dataset, resolved, false),
        ChartType::Bubble => compile_points(dataset, resolved, true),
        ChartType::Histogram => compile_histogram(dataset, resolved),
        ChartType::Box => compile_boxes(dataset, resolved),
        ChartType::Violin => compile_violins(dataset, resolved),
        ChartType::Strip => compile_strip(dataset, resolved),
        ChartType::Heatmap => compile_heat_grid(dataset, resolved),
        ChartType::DensityHeatmap => compile_density_heatmap(dataset, resolved),
        ChartType::Candlestick => compile_candles(dataset, resolved),
        ChartType::Funnel => compile_funnel(dataset, resolved),
        ChartType::Treemap | ChartType::Sunburst => compile_tree(dataset, resolved),
        ChartType::Radar => compile_radar(dataset, resolved),
        ChartType::WordCloud => compile_word_counts(dataset, resolved),
        ChartType::Sankey => compile_sankey(dataset, resolved),
        ChartType::Choropleth => compile_region_values(dataset, resolved),
        ChartType::PointMap => compile_geo_points(dataset, resolved),
    };

    ChartDescription {
        chart: resolved.chart,
        title: chart_title(resolved),
        bindings: resolved.bindings.clone(),
        data,
    }
}

/// Column bound to a role. Resolution guarantees every declared binding
/// points at an existing column, so a failed lookup is a caller bug.
fn role_column<'a>(dataset: &'a Dataset, resolved: &ResolvedChart, role: &str) -> &'a Column {
    resolved
        .column(role)
        .and_then(|name| dataset.column(name))
        .unwrap_or_else(|| panic!("role '{role}' is not bound to a dataset column"))
}

fn optional_column<'a>(
    dataset: &'a Dataset,
    resolved: &ResolvedChart,
    role: &str,
) -> Option<&'a Column> {
    resolved.column(role).and_then(|name| dataset.column(name))
}

/// (category, value) rows with both cells present.
fn category_value_pairs(cat: &Column, val: &Column) -> Vec<(String, f64)> {
    let labels = cat.text_values();
    let nums = val.numeric_values();
    let mut pairs = Vec::new();
    for i in 0..labels.len() {
        if let (Some(label), Some(v)) = (labels[i], nums[i]) {
            pairs.push((label.to_string(), v));
        }
    }
    pairs
}

/// Mean per (series, category) cell from (series, category, value) rows,
/// 0.0 where a combination never occurs. Both axes come out sorted.
fn series_matrix(rows: &[(String, String, f64)]) -> (Vec<String>, Vec<(String, Vec<f64>)>) {
    let mut cells: HashMap<(String, String), Vec<f64>> = HashMap::new();
    let mut category_set: HashSet<String> = HashSet::new();
    let mut series_set: HashSet<String> = HashSet::new();
    for (series, category, value) in rows {
        cells
            .entry((series.clone(), category.clone()))
            .or_default()
            .push(*value);
        category_set.insert(category.clone());
        series_set.insert(series.clone());
    }

    let mut categories: Vec<String> = category_set.into_iter().collect();
    categories.sort();
    let mut series_names: Vec<String> = series_set.into_iter().collect();
    series_names.sort();

    let matrix = series_names
        .into_iter()
        .map(|name| {
            let values = categories
                .iter()
                .map(|cat| {
                    match cells.get(&(name.clone(), cat.clone())) {
                        Some(vals) => vals.iter().sum::<f64>() / vals.len() as f64,
                        None => 0.0,
                    }
                })
                .collect();
            (name, values)
        })
        .collect();

    (categories, matrix)
}

/// Numeric values grouped by the optional "group" role. Ungrouped data
/// becomes a single group labeled with the values column name.
fn grouped_values(dataset: &Dataset, resolved: &ResolvedChart) -> Vec<(String, Vec<f64>)> {
    let values_col = role_column(dataset, resolved, "values");
    let nums = values_col.numeric_values();
    match optional_column(dataset, resolved, "group") {
        Some(group_col) => {
            let labels = group_col.text_values();
            let mut pairs = Vec::new();
            for i in 0..nums.len() {
                if let (Some(label), Some(v)) = (labels[i], nums[i]) {
                    pairs.push((label.to_string(), v));
                }
            }
            group_numeric(&pairs)
        }
        None => {
            let vals: Vec<f64> = nums.into_iter().flatten().collect();
            vec![(values_col.name.clone(), vals)]
        }
    }
}

fn compile_slices(dataset: &Dataset, resolved: &ResolvedChart, hole: f64) -> ChartData {
    let names = role_column(dataset, resolved, "names");
    let values = role_column(dataset, resolved, "values");
    let (labels, values) = aggregate_sum(&category_value_pairs(names, values));
    ChartData::Slices { labels, values, hole }
}

fn compile_bars(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let category = role_column(dataset, resolved, "category");
    let value = role_column(dataset, resolved, "value");
    let (categories, means) = aggregate_mean(&category_value_pairs(category, value));
    ChartData::Bars {
        categories,
        series: vec![BarSeries { name: value.name.clone(), values: means }],
        stacked: false,
    }
}

fn compile_multi_bars(dataset: &Dataset, resolved: &ResolvedChart, stacked: bool) -> ChartData {
    let categories = role_column(dataset, resolved, "category").text_values();
    let values = role_column(dataset, resolved, "value").numeric_values();
    let groups = role_column(dataset, resolved, "group").text_values();

    let mut rows = Vec::new();
    for i in 0..values.len() {
        if let (Some(group), Some(category), Some(value)) = (groups[i], categories[i], values[i]) {
            rows.push((group.to_string(), category.to_string(), value));
        }
    }

    let (categories, matrix) = series_matrix(&rows);
    let series = matrix
        .into_iter()
        .map(|(name, values)| BarSeries { name, values })
        .collect();
    ChartData::Bars { categories, series, stacked }
}

fn compile_lines(dataset: &Dataset, resolved: &ResolvedChart, filled: bool) -> ChartData {
    let y_col = role_column(dataset, resolved, "y");
    let dates = role_column(dataset, resolved, "x").date_values();
    let values = y_col.numeric_values();
    let series_cells = optional_column(dataset, resolved, "series").map(|c| c.text_values());

    // ISO-formatted dates sort chronologically as strings, so the shared
    // category aggregation doubles as the time axis sort.
    let mut by_series: HashMap<String, Vec<(String, f64)>> = HashMap::new();
    for i in 0..values.len() {
        let (date, value) = match (dates[i], values[i]) {
            (Some(d), Some(v)) => (d, v),
            _ => continue,
        };
        let key = match &series_cells {
            Some(cells) => match cells[i] {
                Some(s) => s.to_string(),
                None => continue,
            },
            None => y_col.name.clone(),
        };
        by_series
            .entry(key)
            .or_default()
            .push((date.format("%Y-%m-%d").to_string(), value));
    }

    let mut names: Vec<String> = by_series.keys().cloned().collect();
    names.sort();

    let series = names
        .into_iter()
        .map(|name| {
            let (dates, values) = aggregate_mean(&by_series[&name]);
            let points = dates
                .into_iter()
                .zip(values)
                .map(|(date, value)| TimePoint { date, value })
                .collect();
            LineSeries { name, points }
        })
        .collect();

    ChartData::Lines { series, filled }
}

fn compile_points(dataset: &Dataset, resolved: &ResolvedChart, with_size: bool) -> ChartData {
    let y_col = role_column(dataset, resolved, "y");
    let xs = role_column(dataset, resolved, "x").numeric_values();
    let ys = y_col.numeric_values();
    let sizes = with_size.then(|| role_column(dataset, resolved, "size").numeric_values());
    let colors = optional_column(dataset, resolved, "color").map(|c| c.text_values());

    let mut by_series: HashMap<String, Vec<PointMark>> = HashMap::new();
    for i in 0..xs.len() {
        let (x, y) = match (xs[i], ys[i]) {
            (Some(x), Some(y)) => (x, y),
            _ => continue,
        };
        let size = match &sizes {
            Some(vals) => match vals[i] {
                Some(s) => Some(s),
                None => continue,
            },
            None => None,
        };
        let key = match &colors {
            Some(cells) => match cells[i] {
                Some(c) => c.to_string(),
                None => continue,
            },
            None => y_col.name.clone(),
        };
        by_series.entry(key).or_default().push(PointMark { x, y, size });
    }

    let mut names: Vec<String> = by_series.keys().cloned().collect();
    names.sort();
    let series = names
        .into_iter()
        .map(|name| {
            let points = by_series.remove(&name).unwrap_or_default();
            PointSeries { name, points }
        })
        .collect();

    ChartData::Points { x_categories: None, series }
}

fn compile_histogram(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let values: Vec<f64> = role_column(dataset, resolved, "values")
        .numeric_values()
        .into_iter()
        .flatten()
        .collect();
    let (centers, width, counts) = compute_bins(&values, DEFAULT_BIN_COUNT);
    ChartData::Bins { centers, width, counts }
}

fn compile_boxes(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let mut categories = Vec::new();
    let mut boxes = Vec::new();
    for (label, values) in grouped_values(dataset, resolved) {
        if values.is_empty() {
            continue;
        }
        categories.push(label);
        boxes.push(compute_box_stats(&values));
    }
    ChartData::Boxes { categories, boxes }
}

fn compile_violins(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let mut categories = Vec::new();
    let mut violins = Vec::new();
    for (label, values) in grouped_values(dataset, resolved) {
        if values.is_empty() {
            continue;
        }
        let bandwidth = silverman_bandwidth(&values);
        let (grid, density) = compute_kde(&values, bandwidth);
        let mut sorted = values.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        categories.push(label);
        violins.push(ViolinShape { grid, density, median: percentile(&sorted, 0.5) });
    }
    ChartData::Violins { categories, violins }
}

fn compile_strip(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let grouped = grouped_values(dataset, resolved);
    let x_categories: Vec<String> = grouped.iter().map(|(label, _)| label.clone()).collect();
    let series = grouped
        .into_iter()
        .enumerate()
        .map(|(idx, (name, values))| {
            let points = values
                .into_iter()
                .map(|v| PointMark { x: idx as f64, y: v, size: None })
                .collect();
            PointSeries { name, points }
        })
        .collect();
    ChartData::Points { x_categories: Some(x_categories), series }
}

fn compile_heat_grid(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let xs = role_column(dataset, resolved, "x").text_values();
    let ys = role_column(dataset, resolved, "y").text_values();
    let values = role_column(dataset, resolved, "values").numeric_values();

    let mut cells: HashMap<(String, String), Vec<f64>> = HashMap::new();
    let mut x_set: HashSet<String> = HashSet::new();
    let mut y_set: HashSet<String> = HashSet::new();
    for i in 0..values.len() {
        if let (Some(x), Some(y), Some(v)) = (xs[i], ys[i], values[i]) {
            cells.entry((y.to_string(), x.to_string())).or_default().push(v);
            x_set.insert(x.to_string());
            y_set.insert(y.to_string());
        }
    }

    let mut x_labels: Vec<String> = x_set.into_iter().collect();
    x_labels.sort();
    let mut y_labels: Vec<String> = y_set.into_iter().collect();
    y_labels.sort();

    let values = y_labels
        .iter()
        .map(|y| {
            x_labels
                .iter()
                .map(|x| {
                    cells
                        .get(&(y.clone(), x.clone()))
                        .map(|vals| vals.iter().sum::<f64>() / vals.len() as f64)
                })
                .collect()
        })
        .collect();

    ChartData::HeatGrid { x_labels, y_labels, values }
}

fn compile_density_heatmap(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let xs = role_column(dataset, resolved, "x").numeric_values();
    let ys = role_column(dataset, resolved, "y").numeric_values();
    let mut points = Vec::new();
    for i in 0..xs.len() {
        if let (Some(x), Some(y)) = (xs[i], ys[i]) {
            points.push((x, y));
        }
    }

    let grid = compute_density_grid(&points, DEFAULT_BIN_COUNT);
    ChartData::DensityGrid {
        x_centers: grid.x_centers,
        y_centers: grid.y_centers,
        x_width: grid.x_width,
        y_width: grid.y_width,
        counts: grid.counts,
    }
}

fn compile_candles(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let dates = role_column(dataset, resolved, "date").date_values();
    let opens = role_column(dataset, resolved, "open").numeric_values();
    let highs = role_column(dataset, resolved, "high").numeric_values();
    let lows = role_column(dataset, resolved, "low").numeric_values();
    let closes = role_column(dataset, resolved, "close").numeric_values();

    let mut candles = Vec::new();
    for i in 0..dates.len() {
        if let (Some(date), Some(open), Some(high), Some(low), Some(close)) =
            (dates[i], opens[i], highs[i], lows[i], closes[i])
        {
            candles.push(Candle {
                date: date.format("%Y-%m-%d").to_string(),
                open,
                high,
                low,
                close,
            });
        }
    }
    candles.sort_by(|a, b| a.date.cmp(&b.date));

    ChartData::Candles { candles }
}

fn compile_funnel(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let stages = role_column(dataset, resolved, "stages");
    let values = role_column(dataset, resolved, "values");
    let (stages, values) = aggregate_sum(&category_value_pairs(stages, values));
    ChartData::Funnel { stages, values }
}

fn compile_tree(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let labels = role_column(dataset, resolved, "labels").text_values();
    let values = role_column(dataset, resolved, "values").numeric_values();
    let parents = optional_column(dataset, resolved, "parents").map(|c| c.text_values());

    // An empty parent cell marks a root node, not a skippable row.
    let mut totals: HashMap<(String, Option<String>), f64> = HashMap::new();
    for i in 0..values.len() {
        let (label, value) = match (labels[i], values[i]) {
            (Some(l), Some(v)) => (l, v),
            _ => continue,
        };
        let parent = match &parents {
            Some(cells) => cells[i].map(|p| p.to_string()),
            None => None,
        };
        *totals.entry((label.to_string(), parent)).or_default() += value;
    }

    let mut keys: Vec<(String, Option<String>)> = totals.keys().cloned().collect();
    keys.sort();
    let nodes = keys
        .into_iter()
        .map(|key| {
            let value = totals[&key];
            let (label, parent) = key;
            TreeNode { label, parent, value }
        })
        .collect();

    ChartData::Tree { nodes }
}

fn compile_radar(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let values_col = role_column(dataset, resolved, "values");
    let axes = role_column(dataset, resolved, "axes").text_values();
    let values = values_col.numeric_values();
    let series_cells = optional_column(dataset, resolved, "series").map(|c| c.text_values());

    let mut rows = Vec::new();
    for i in 0..values.len() {
        let (axis, value) = match (axes[i], values[i]) {
            (Some(a), Some(v)) => (a, v),
            _ => continue,
        };
        let key = match &series_cells {
            Some(cells) => match cells[i] {
                Some(s) => s.to_string(),
                None => continue,
            },
            None => values_col.name.clone(),
        };
        rows.push((key, axis.to_string(), value));
    }

    let (axes, matrix) = series_matrix(&rows);
    let series = matrix
        .into_iter()
        .map(|(name, values)| RadarSeries { name, values })
        .collect();
    ChartData::Radar { axes, series }
}

fn compile_word_counts(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let cells = role_column(dataset, resolved, "text").text_values();
    let texts: Vec<&str> = cells.into_iter().flatten().collect();
    ChartData::WordCounts { words: count_words(&texts, WORD_CAP) }
}

fn compile_sankey(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let sources = role_column(dataset, resolved, "source").text_values();
    let targets = role_column(dataset, resolved, "target").text_values();
    let values = role_column(dataset, resolved, "values").numeric_values();

    let mut triples = Vec::new();
    for i in 0..values.len() {
        if let (Some(source), Some(target), Some(value)) = (sources[i], targets[i], values[i]) {
            triples.push((source.to_string(), target.to_string(), value));
        }
    }

    let (nodes, links) = aggregate_links(&triples);
    ChartData::SankeyFlows { nodes, links }
}

fn compile_region_values(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let locations = role_column(dataset, resolved, "locations");
    let values = role_column(dataset, resolved, "values");
    let (regions, values) = aggregate_sum(&category_value_pairs(locations, values));
    ChartData::RegionValues { regions, values }
}

fn compile_geo_points(dataset: &Dataset, resolved: &ResolvedChart) -> ChartData {
    let lats = role_column(dataset, resolved, "latitude").numeric_values();
    let lons = role_column(dataset, resolved, "longitude").numeric_values();
    let sizes = optional_column(dataset, resolved, "size").map(|c| c.numeric_values());

    let mut points = Vec::new();
    for i in 0..lats.len() {
        let (latitude, longitude) = match (lats[i], lons[i]) {
            (Some(lat), Some(lon)) => (lat, lon),
            _ => continue,
        };
        let size = match &sizes {
            Some(vals) => match vals[i] {
                Some(s) => Some(s),
                None => continue,
            },
            None => None,
        };
        points.push(GeoPoint { latitude, longitude, size });
    }

    ChartData::GeoPoints { points }
}

fn chart_title(resolved: &ResolvedChart) -> String {
    let col = |role: &str| resolved.column(role).unwrap_or("").to_string();
    let name = resolved.chart.name();
    match resolved.chart {
        ChartType::Pie | ChartType::Donut => {
            format!("{name} of {} by {}", col("values"), col("names"))
        }
        ChartType::Bar | ChartType::GroupedBar | ChartType::StackedBar => {
            format!("{name} of {} by {}", col("value"), col("category"))
        }
        ChartType::Line | ChartType::Area => {
            format!("{name} of {} over {}", col("y"), col("x"))
        }
        ChartType::Scatter | ChartType::Bubble | ChartType::DensityHeatmap => {
            format!("{name} of {} vs {}", col("y"), col("x"))
        }
        ChartType::Histogram => format!("{name} of {}", col("values")),
        ChartType::Box | ChartType::Violin | ChartType::Strip => match resolved.column("group") {
            Some(group) => format!("{name} of {} by {group}", col("values")),
            None => format!("{name} of {}", col("values")),
        },
        ChartType::Heatmap => {
            format!("{name} of {} by {} and {}", col("values"), col("x"), col("y"))
        }
        ChartType::Candlestick => format!("{name} of {} over {}", col("close"), col("date")),
        ChartType::Funnel => format!("{name} of {} by {}", col("values"), col("stages")),
        ChartType::Treemap | ChartType::Sunburst => {
            format!("{name} of {} by {}", col("values"), col("labels"))
        }
        ChartType::Radar => format!("{name} of {} by {}", col("values"), col("axes")),
        ChartType::WordCloud => format!("{name} of {}", col("text")),
        ChartType::Sankey => {
            format!("{name} of {} from {} to {}", col("values"), col("source"), col("target"))
        }
        ChartType::Choropleth => {
            format!("{name} of {} by {}", col("values"), col("locations"))
        }
        ChartType::PointMap => {
            format!("{name} of {} and {}", col("latitude"), col("longitude"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ChartSpec;
    use crate::resolve::resolve_chart_spec;

    fn make_dataset(cols: &[(&str, &[&str])]) -> Dataset {
        let headers: Vec<String> = cols.iter().map(|(name, _)| name.to_string()).collect();
        let row_count = cols.first().map(|(_, vals)| vals.len()).unwrap_or(0);
        let rows: Vec<Vec<String>> = (0..row_count)
            .map(|i| cols.iter().map(|(_, vals)| vals[i].to_string()).collect())
            .collect();
        Dataset::from_rows(headers, rows).unwrap()
    }

    fn build(dataset: &Dataset, spec: &ChartSpec) -> ChartDescription {
        let resolved = resolve_chart_spec(dataset, spec).unwrap();
        compile_chart(dataset, &resolved)
    }

    // Part-of-whole charts

    #[test]
    fn test_pie_sums_per_category() {
        let dataset = make_dataset(&[
            ("region", &["east", "west", "east"]),
            ("sales", &["10", "5", "20"]),
        ]);
        let spec = ChartSpec::new(ChartType::Pie)
            .bind("names", "region")
            .bind("values", "sales");
        let description = build(&dataset, &spec);

        match description.data {
            ChartData::Slices { labels, values, hole } => {
                assert_eq!(labels, vec!["east", "west"]);
                assert_eq!(values, vec![30.0, 5.0]);
                assert_eq!(hole, 0.0);
            }
            other => panic!("expected slices, got {other:?}"),
        }
    }

    #[test]
    fn test_donut_has_hole() {
        let dataset = make_dataset(&[("k", &["a", "b"]), ("v", &["1", "2"])]);
        let spec = ChartSpec::new(ChartType::Donut).bind("names", "k").bind("values", "v");
        match build(&dataset, &spec).data {
            ChartData::Slices { hole, .. } => assert_eq!(hole, 0.5),
            other => panic!("expected slices, got {other:?}"),
        }
    }

    // Bar families

    #[test]
    fn test_bar_means_per_category() {
        let dataset = make_dataset(&[
            ("region", &["west", "east", "west"]),
            ("sales", &["4", "10", "6"]),
        ]);
        let spec = ChartSpec::new(ChartType::Bar)
            .bind("category", "region")
            .bind("value", "sales");
        let description = build(&dataset, &spec);

        assert_eq!(description.title, "Bar Chart of sales by region");
        match description.data {
            ChartData::Bars { categories, series, stacked } => {
                assert_eq!(categories, vec!["east", "west"]);
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].name, "sales");
                assert_eq!(series[0].values, vec![10.0, 5.0]);
                assert!(!stacked);
            }
            other => panic!("expected bars, got {other:?}"),
        }
    }

    #[test]
    fn test_grouped_bar_fills_missing_combinations() {
        let dataset = make_dataset(&[
            ("quarter", &["q1", "q2", "q1"]),
            ("sales", &["10", "20", "30"]),
            ("team", &["a", "a", "b"]),
        ]);
        let spec = ChartSpec::new(ChartType::GroupedBar)
            .bind("category", "quarter")
            .bind("value", "sales")
            .bind("group", "team");
        match build(&dataset, &spec).data {
            ChartData::Bars { categories, series, stacked } => {
                assert_eq!(categories, vec!["q1", "q2"]);
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].name, "a");
                assert_eq!(series[0].values, vec![10.0, 20.0]);
                assert_eq!(series[1].name, "b");
                // Team b never sold in q2.
                assert_eq!(series[1].values, vec![30.0, 0.0]);
                assert!(!stacked);
            }
            other => panic!("expected bars, got {other:?}"),
        }
    }

    #[test]
    fn test_stacked_bar_sets_flag() {
        let dataset = make_dataset(&[
            ("c", &["x"]),
            ("v", &["1"]),
            ("g", &["a"]),
        ]);
        let spec = ChartSpec::new(ChartType::StackedBar)
            .bind("category", "c")
            .bind("value", "v")
            .bind("group", "g");
        match build(&dataset, &spec).data {
            ChartData::Bars { stacked, .. } => assert!(stacked),
            other => panic!("expected bars, got {other:?}"),
        }
    }

    // Time series

    #[test]
    fn test_line_sorts_and_averages_dates() {
        let dataset = make_dataset(&[
            ("day", &["2024-02-01", "2024-01-01", "2024-02-01"]),
            ("price", &["4", "1", "6"]),
        ]);
        let spec = ChartSpec::new(ChartType::Line).bind("x", "day").bind("y", "price");
        match build(&dataset, &spec).data {
            ChartData::Lines { series, filled } => {
                assert!(!filled);
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].name, "price");
                let points = &series[0].points;
                assert_eq!(points[0], TimePoint { date: "2024-01-01".into(), value: 1.0 });
                assert_eq!(points[1], TimePoint { date: "2024-02-01".into(), value: 5.0 });
            }
            other => panic!("expected lines, got {other:?}"),
        }
    }

    #[test]
    fn test_line_splits_series() {
        let dataset = make_dataset(&[
            ("day", &["2024-01-01", "2024-01-01"]),
            ("price", &["1", "9"]),
            ("ticker", &["b", "a"]),
        ]);
        let spec = ChartSpec::new(ChartType::Line)
            .bind("x", "day")
            .bind("y", "price")
            .bind("series", "ticker");
        match build(&dataset, &spec).data {
            ChartData::Lines { series, .. } => {
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].name, "a");
                assert_eq!(series[1].name, "b");
            }
            other => panic!("expected lines, got {other:?}"),
        }
    }

    // Point families

    #[test]
    fn test_scatter_references_bound_columns() {
        let dataset = make_dataset(&[
            ("x", &["1", "2", "3"]),
            ("y", &["4", "5", "6"]),
        ]);
        let spec = ChartSpec::new(ChartType::Scatter).bind("x", "x").bind("y", "y");
        let description = build(&dataset, &spec);

        assert_eq!(description.binding("x"), Some("x"));
        assert_eq!(description.binding("y"), Some("y"));
        match description.data {
            ChartData::Points { x_categories, series } => {
                assert!(x_categories.is_none());
                assert_eq!(series.len(), 1);
                assert_eq!(series[0].points.len(), 3);
                assert_eq!(series[0].points[0], PointMark { x: 1.0, y: 4.0, size: None });
            }
            other => panic!("expected points, got {other:?}"),
        }
    }

    #[test]
    fn test_scatter_skips_incomplete_rows() {
        let dataset = make_dataset(&[
            ("x", &["1", "2", "3"]),
            ("y", &["4", "", "6"]),
        ]);
        let spec = ChartSpec::new(ChartType::Scatter).bind("x", "x").bind("y", "y");
        match build(&dataset, &spec).data {
            ChartData::Points { series, .. } => assert_eq!(series[0].points.len(), 2),
            other => panic!("expected points, got {other:?}"),
        }
    }

    #[test]
    fn test_bubble_carries_sizes() {
        let dataset = make_dataset(&[
            ("x", &["1", "2"]),
            ("y", &["3", "4"]),
            ("pop", &["10", "20"]),
        ]);
        let spec = ChartSpec::new(ChartType::Bubble)
            .bind("x", "x")
            .bind("y", "y")
            .bind("size", "pop");
        match build(&dataset, &spec).data {
            ChartData::Points { series, .. } => {
                assert_eq!(series[0].points[0].size, Some(10.0));
                assert_eq!(series[0].points[1].size, Some(20.0));
            }
            other => panic!("expected points, got {other:?}"),
        }
    }

    #[test]
    fn test_strip_indexes_categories() {
        let dataset = make_dataset(&[
            ("score", &["1", "2", "3"]),
            ("class", &["b", "a", "b"]),
        ]);
        let spec = ChartSpec::new(ChartType::Strip)
            .bind("values", "score")
            .bind("group", "class");
        match build(&dataset, &spec).data {
            ChartData::Points { x_categories, series } => {
                assert_eq!(x_categories, Some(vec!["a".to_string(), "b".to_string()]));
                assert_eq!(series.len(), 2);
                assert_eq!(series[0].points[0].x, 0.0);
                assert_eq!(series[1].points[0].x, 1.0);
            }
            other => panic!("expected points, got {other:?}"),
        }
    }

    // Distribution charts

    #[test]
    fn test_histogram_bins_cover_all_values() {
        let values: Vec<String> = (1..=20).map(|v| v.to_string()).collect();
        let refs: Vec<&str> = values.iter().map(|s| s.as_str()).collect();
        let dataset = make_dataset(&[("v", refs.as_slice())]);
        let spec = ChartSpec::new(ChartType::Histogram).bind("values", "v");
        match build(&dataset, &spec).data {
            ChartData::Bins { centers, counts, .. } => {
                assert_eq!(centers.len(), 10);
                assert_eq!(counts.iter().sum::<u64>(), 20);
            }
            other => panic!("expected bins, got {other:?}"),
        }
    }

    #[test]
    fn test_box_without_group_uses_column_name() {
        let dataset = make_dataset(&[("score", &["1", "2", "3", "4", "100"])]);
        let spec = ChartSpec::new(ChartType::Box).bind("values", "score");
        match build(&dataset, &spec).data {
            ChartData::Boxes { categories, boxes } => {
                assert_eq!(categories, vec!["score"]);
                assert_eq!(boxes[0].median, 3.0);
                assert_eq!(boxes[0].outliers, vec![100.0]);
            }
            other => panic!("expected boxes, got {other:?}"),
        }
    }

    #[test]
    fn test_violin_density_normalized() {
        let dataset = make_dataset(&[("v", &["1", "2", "2", "3", "4", "5"])]);
        let spec = ChartSpec::new(ChartType::Violin).bind("values", "v");
        match build(&dataset, &spec).data {
            ChartData::Violins { categories, violins } => {
                assert_eq!(categories, vec!["v"]);
                let peak = violins[0].density.iter().fold(0.0f64, |a, &b| a.max(b));
                assert!((peak - 1.0).abs() < 1e-9);
                assert_eq!(violins[0].median, 2.5);
            }
            other => panic!("expected violins, got {other:?}"),
        }
    }

    // Grid charts

    #[test]
    fn test_heatmap_missing_cells_are_none() {
        let dataset = make_dataset(&[
            ("row", &["r1", "r1", "r2"]),
            ("col", &["c1", "c2", "c1"]),
            ("v", &["1", "3", "5"]),
        ]);
        let spec = ChartSpec::new(ChartType::Heatmap)
            .bind("x", "col")
            .bind("y", "row")
            .bind("values", "v");
        match build(&dataset, &spec).data {
            ChartData::HeatGrid { x_labels, y_labels, values } => {
                assert_eq!(x_labels, vec!["c1", "c2"]);
                assert_eq!(y_labels, vec!["r1", "r2"]);
                assert_eq!(values[0], vec![Some(1.0), Some(3.0)]);
                assert_eq!(values[1], vec![Some(5.0), None]);
            }
            other => panic!("expected heat grid, got {other:?}"),
        }
    }

    // Financial

    #[test]
    fn test_candles_sorted_by_date() {
        let dataset = make_dataset(&[
            ("day", &["2024-01-02", "2024-01-01"]),
            ("open", &["10", "9"]),
            ("high", &["12", "11"]),
            ("low", &["9", "8"]),
            ("close", &["11", "10"]),
        ]);
        let spec = ChartSpec::new(ChartType::Candlestick)
            .bind("date", "day")
            .bind("open", "open")
            .bind("high", "high")
            .bind("low", "low")
            .bind("close", "close");
        match build(&dataset, &spec).data {
            ChartData::Candles { candles } => {
                assert_eq!(candles[0].date, "2024-01-01");
                assert_eq!(candles[1].date, "2024-01-02");
                assert_eq!(candles[1].close, 11.0);
            }
            other => panic!("expected candles, got {other:?}"),
        }
    }

    // Hierarchies and flows

    #[test]
    fn test_sunburst_keeps_root_rows() {
        let dataset = make_dataset(&[
            ("node", &["food", "fruit"]),
            ("v", &["10", "4"]),
            ("parent", &["", "food"]),
        ]);
        let spec = ChartSpec::new(ChartType::Sunburst)
            .bind("labels", "node")
            .bind("values", "v")
            .bind("parents", "parent");
        match build(&dataset, &spec).data {
            ChartData::Tree { nodes } => {
                assert_eq!(nodes.len(), 2);
                assert_eq!(nodes[0].label, "food");
                assert_eq!(nodes[0].parent, None);
                assert_eq!(nodes[1].parent.as_deref(), Some("food"));
            }
            other => panic!("expected tree, got {other:?}"),
        }
    }

    #[test]
    fn test_sankey_links_indexed_into_nodes() {
        let dataset = make_dataset(&[
            ("from", &["a", "a"]),
            ("to", &["b", "b"]),
            ("v", &["1", "2"]),
        ]);
        let spec = ChartSpec::new(ChartType::Sankey)
            .bind("source", "from")
            .bind("target", "to")
            .bind("values", "v");
        match build(&dataset, &spec).data {
            ChartData::SankeyFlows { nodes, links } => {
                assert_eq!(nodes, vec!["a", "b"]);
                assert_eq!(links.len(), 1);
                assert_eq!(links[0].value, 3.0);
            }
            other => panic!("expected sankey flows, got {other:?}"),
        }
    }

    // Maps

    #[test]
    fn test_point_map_optional_size() {
        let dataset = make_dataset(&[
            ("lat", &["40.7", "34.0"]),
            ("lon", &["-74.0", "-118.2"]),
        ]);
        let spec = ChartSpec::new(ChartType::PointMap)
            .bind("latitude", "lat")
            .bind("longitude", "lon");
        match build(&dataset, &spec).data {
            ChartData::GeoPoints { points } => {
                assert_eq!(points.len(), 2);
                assert_eq!(points[0].size, None);
            }
            other => panic!("expected geo points, got {other:?}"),
        }
    }

    // Titles

    #[test]
    fn test_titles_name_bound_columns() {
        let dataset = make_dataset(&[
            ("x", &["1"]),
            ("y", &["2"]),
        ]);
        let spec = ChartSpec::new(ChartType::Scatter).bind("x", "x").bind("y", "y");
        assert_eq!(build(&dataset, &spec).title, "Scatter Plot of y vs x");
    }
}
