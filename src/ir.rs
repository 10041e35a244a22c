use serde::{Deserialize, Serialize};

use crate::catalog::ChartType;

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// One role bound to a concrete column, using the dataset's actual spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub role: String,
    pub column: String,
}

/// A validated request: every bound role checked against the dataset for
/// existence and type compatibility, in declared role order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChart {
    pub chart: ChartType,
    pub bindings: Vec<RoleBinding>,
}

impl ResolvedChart {
    pub fn column(&self, role: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.role == role)
            .map(|b| b.column.as_str())
    }
}

// =============================================================================
// Phase 2: Construction (chart description)
// =============================================================================

/// The declarative output of a successful dispatch. Pure data: the render
/// layer (or any front end) decides how to draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescription {
    pub chart: ChartType,
    pub title: String,
    pub bindings: Vec<RoleBinding>,
    pub data: ChartData,
}

impl ChartDescription {
    pub fn binding(&self, role: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|b| b.role == role)
            .map(|b| b.column.as_str())
    }
}

/// Shape families shared across the catalog. Grids are row-major: outer
/// vectors follow the y labels/centers, inner vectors the x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartData {
    Slices {
        labels: Vec<String>,
        values: Vec<f64>,
        hole: f64,
    },
    Bars {
        categories: Vec<String>,
        series: Vec<BarSeries>,
        stacked: bool,
    },
    Lines {
        series: Vec<LineSeries>,
        filled: bool,
    },
    Points {
        x_categories: Option<Vec<String>>,
        series: Vec<PointSeries>,
    },
    Bins {
        centers: Vec<f64>,
        width: f64,
        counts: Vec<u64>,
    },
    Boxes {
        categories: Vec<String>,
        boxes: Vec<BoxStats>,
    },
    Violins {
        categories: Vec<String>,
        violins: Vec<ViolinShape>,
    },
    HeatGrid {
        x_labels: Vec<String>,
        y_labels: Vec<String>,
        values: Vec<Vec<Option<f64>>>,
    },
    DensityGrid {
        x_centers: Vec<f64>,
        y_centers: Vec<f64>,
        x_width: f64,
        y_width: f64,
        counts: Vec<Vec<u64>>,
    },
    Candles {
        candles: Vec<Candle>,
    },
    Funnel {
        stages: Vec<String>,
        values: Vec<f64>,
    },
    Tree {
        nodes: Vec<TreeNode>,
    },
    Radar {
        axes: Vec<String>,
        series: Vec<RadarSeries>,
    },
    WordCounts {
        words: Vec<WordCount>,
    },
    SankeyFlows {
        nodes: Vec<String>,
        links: Vec<SankeyLink>,
    },
    RegionValues {
        regions: Vec<String>,
        values: Vec<f64>,
    },
    GeoPoints {
        points: Vec<GeoPoint>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<TimePoint>,
}

/// Dates travel as ISO strings so descriptions stay plainly serializable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub date: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSeries {
    pub name: String,
    pub points: Vec<PointMark>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMark {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

/// Mirrored KDE outline: density is normalized to [0, 1] over the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolinShape {
    pub grid: Vec<f64>,
    pub density: Vec<f64>,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarSeries {
    pub name: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// Links are indices into the node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}
