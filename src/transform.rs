use std::collections::{HashMap, HashSet};

use crate::ir::{BoxStats, SankeyLink, WordCount};

/// Bin count for histograms and (per axis) density grids.
pub const DEFAULT_BIN_COUNT: usize = 10;

/// Words kept in a word-cloud description.
pub const WORD_CAP: usize = 100;

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<String> {
    let mut keys: Vec<String> = map.keys().cloned().collect();
    keys.sort();
    keys
}

/// Mean value per category, categories sorted.
pub fn aggregate_mean(pairs: &[(String, f64)]) -> (Vec<String>, Vec<f64>) {
    let groups = collect_groups(pairs);
    let keys = sorted_keys(&groups);
    let means = keys
        .iter()
        .map(|k| {
            let vals = &groups[k];
            vals.iter().sum::<f64>() / vals.len() as f64
        })
        .collect();
    (keys, means)
}

/// Summed value per category, categories sorted.
pub fn aggregate_sum(pairs: &[(String, f64)]) -> (Vec<String>, Vec<f64>) {
    let groups = collect_groups(pairs);
    let keys = sorted_keys(&groups);
    let sums = keys.iter().map(|k| groups[k].iter().sum()).collect();
    (keys, sums)
}

/// Values grouped by category, categories sorted.
pub fn group_numeric(pairs: &[(String, f64)]) -> Vec<(String, Vec<f64>)> {
    let mut groups = collect_groups(pairs);
    sorted_keys(&groups)
        .into_iter()
        .map(|k| {
            let vals = groups.remove(&k).unwrap_or_default();
            (k, vals)
        })
        .collect()
}

fn collect_groups(pairs: &[(String, f64)]) -> HashMap<String, Vec<f64>> {
    let mut groups: HashMap<String, Vec<f64>> = HashMap::new();
    for (key, val) in pairs {
        groups.entry(key.clone()).or_default().push(*val);
    }
    groups
}

/// Linear-interpolation percentile over pre-sorted data.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// Five-number summary with 1.5*IQR fences. Whiskers span the data inside
/// the fences; everything outside is listed as an outlier.
pub fn compute_box_stats(values: &[f64]) -> BoxStats {
    let mut ys = values.to_vec();
    ys.sort_by(|a, b| a.total_cmp(b));

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let whisker_low = ys
        .iter()
        .filter(|&&v| v >= lower_fence)
        .copied()
        .fold(f64::INFINITY, f64::min);
    let whisker_high = ys
        .iter()
        .filter(|&&v| v <= upper_fence)
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    let outliers: Vec<f64> = ys
        .iter()
        .filter(|&&v| v < lower_fence || v > upper_fence)
        .copied()
        .collect();

    BoxStats {
        q1,
        median,
        q3,
        whisker_low: if whisker_low.is_finite() { whisker_low } else { q1 },
        whisker_high: if whisker_high.is_finite() { whisker_high } else { q3 },
        outliers,
    }
}

/// Silverman's rule of thumb for bandwidth selection.
pub fn silverman_bandwidth(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if n < 2.0 {
        return 1.0;
    }

    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let q1 = percentile(&sorted, 0.25);
    let q3 = percentile(&sorted, 0.75);
    let iqr = q3 - q1;

    // h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std_dev.min(iqr / 1.34) } else { std_dev };
    if scale <= 0.0 {
        return 1.0;
    }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Gaussian KDE over a fixed grid, density normalized to a 0-1 peak.
/// Returns (grid, density).
pub fn compute_kde(data: &[f64], bandwidth: f64) -> (Vec<f64>, Vec<f64>) {
    const GRID_POINTS: usize = 128;

    let n = data.len() as f64;
    if n == 0.0 {
        return (vec![], vec![]);
    }

    let min_y = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max_y = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

    // Extend range slightly for smooth edges
    let extend = 3.0 * bandwidth;
    let y_start = min_y - extend;
    let y_end = max_y + extend;

    let range = y_end - y_start;
    if range <= 0.0 {
        return (vec![min_y], vec![1.0]);
    }

    let step = range / (GRID_POINTS - 1) as f64;
    let mut grid = Vec::with_capacity(GRID_POINTS);
    let mut density = Vec::with_capacity(GRID_POINTS);

    for i in 0..GRID_POINTS {
        let y = y_start + i as f64 * step;
        grid.push(y);

        let mut d = 0.0;
        for &xi in data {
            let u = (y - xi) / bandwidth;
            d += gaussian_kernel(u);
        }
        d /= n * bandwidth;
        density.push(d);
    }

    let max_density = density.iter().fold(0.0f64, |a, &b| a.max(b));
    if max_density > 0.0 {
        for d in &mut density {
            *d /= max_density;
        }
    }

    (grid, density)
}

/// Equal-width bins over the value range. Returns (centers, width, counts);
/// the top edge is closed so the max value lands in the last bin.
pub fn compute_bins(values: &[f64], bin_count: usize) -> (Vec<f64>, f64, Vec<u64>) {
    if values.is_empty() || bin_count == 0 {
        return (vec![], 0.0, vec![]);
    }

    let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let range = max - min;
    let width = if range == 0.0 { 1.0 } else { range / bin_count as f64 };

    let mut counts = vec![0u64; bin_count];
    for &v in values {
        let mut idx = ((v - min) / width).floor() as usize;
        if idx >= bin_count {
            idx = bin_count - 1;
        }
        counts[idx] += 1;
    }

    let centers = (0..bin_count).map(|i| min + (i as f64 + 0.5) * width).collect();
    (centers, width, counts)
}

/// Output of 2D binning: row-major counts, rows following y centers.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCounts {
    pub x_centers: Vec<f64>,
    pub y_centers: Vec<f64>,
    pub x_width: f64,
    pub y_width: f64,
    pub counts: Vec<Vec<u64>>,
}

/// Count paired observations on a bins x bins grid.
pub fn compute_density_grid(points: &[(f64, f64)], bins: usize) -> GridCounts {
    if points.is_empty() || bins == 0 {
        return GridCounts {
            x_centers: vec![],
            y_centers: vec![],
            x_width: 0.0,
            y_width: 0.0,
            counts: vec![],
        };
    }

    let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
    let (x_centers, x_width, _) = compute_bins(&xs, bins);
    let (y_centers, y_width, _) = compute_bins(&ys, bins);

    let x_min = xs.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    let y_min = ys.iter().fold(f64::INFINITY, |a, &b| a.min(b));

    let mut counts = vec![vec![0u64; bins]; bins];
    for &(x, y) in points {
        let mut xi = ((x - x_min) / x_width).floor() as usize;
        let mut yi = ((y - y_min) / y_width).floor() as usize;
        if xi >= bins {
            xi = bins - 1;
        }
        if yi >= bins {
            yi = bins - 1;
        }
        counts[yi][xi] += 1;
    }

    GridCounts { x_centers, y_centers, x_width, y_width, counts }
}

/// Lowercase alphanumeric tokens of length >= 2, counted and sorted by
/// descending count then token, capped.
pub fn count_words(cells: &[&str], cap: usize) -> Vec<WordCount> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for cell in cells {
        for token in cell.split(|c: char| !c.is_alphanumeric()) {
            if token.chars().count() < 2 {
                continue;
            }
            *counts.entry(token.to_lowercase()).or_default() += 1;
        }
    }

    let mut words: Vec<WordCount> = counts
        .into_iter()
        .map(|(word, count)| WordCount { word, count })
        .collect();
    words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    words.truncate(cap);
    words
}

/// Aggregate (source, target, value) rows into a sorted node list and
/// index-based links, one link per distinct source/target pair.
pub fn aggregate_links(triples: &[(String, String, f64)]) -> (Vec<String>, Vec<SankeyLink>) {
    let mut totals: HashMap<(String, String), f64> = HashMap::new();
    let mut node_set: HashSet<String> = HashSet::new();
    for (source, target, value) in triples {
        *totals.entry((source.clone(), target.clone())).or_default() += value;
        node_set.insert(source.clone());
        node_set.insert(target.clone());
    }

    let mut nodes: Vec<String> = node_set.into_iter().collect();
    nodes.sort();
    let index: HashMap<&str, usize> =
        nodes.iter().enumerate().map(|(i, n)| (n.as_str(), i)).collect();

    let mut keys: Vec<(String, String)> = totals.keys().cloned().collect();
    keys.sort();

    let links = keys
        .into_iter()
        .map(|key| {
            let value = totals[&key];
            SankeyLink {
                source: index[key.0.as_str()],
                target: index[key.1.as_str()],
                value,
            }
        })
        .collect();

    (nodes, links)
}
