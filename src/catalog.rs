use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::data::ColumnType;
use crate::error::ChartError;

/// One abstract slot a chart needs filled with a column.
#[derive(Debug, Clone, Copy)]
pub struct RoleSpec {
    pub role: &'static str,
    pub accepts: &'static [ColumnType],
    pub required: bool,
}

/// Static per-chart validation metadata. The declared role order is the
/// order validation failures are reported in.
#[derive(Debug, Clone, Copy)]
pub struct ChartRequirement {
    pub roles: &'static [RoleSpec],
}

impl ChartRequirement {
    pub fn role(&self, name: &str) -> Option<&'static RoleSpec> {
        self.roles.iter().find(|r| r.role == name)
    }

    pub fn required_roles(&self) -> impl Iterator<Item = &'static RoleSpec> {
        self.roles.iter().filter(|r| r.required)
    }
}

const fn req(role: &'static str, accepts: &'static [ColumnType]) -> RoleSpec {
    RoleSpec { role, accepts, required: true }
}

const fn opt(role: &'static str, accepts: &'static [ColumnType]) -> RoleSpec {
    RoleSpec { role, accepts, required: false }
}

const NUMERIC: &[ColumnType] = &[ColumnType::Numeric];
const DATE: &[ColumnType] = &[ColumnType::Date];
const CATEGORICAL: &[ColumnType] = &[ColumnType::Categorical, ColumnType::Text];
const TEXTUAL: &[ColumnType] = &[ColumnType::Text, ColumnType::Categorical];

const PIE_ROLES: &[RoleSpec] = &[req("names", CATEGORICAL), req("values", NUMERIC)];
const BAR_ROLES: &[RoleSpec] = &[req("category", CATEGORICAL), req("value", NUMERIC)];
const MULTI_BAR_ROLES: &[RoleSpec] = &[
    req("category", CATEGORICAL),
    req("value", NUMERIC),
    req("group", CATEGORICAL),
];
const LINE_ROLES: &[RoleSpec] = &[req("x", DATE), req("y", NUMERIC), opt("series", CATEGORICAL)];
const AREA_ROLES: &[RoleSpec] = &[req("x", DATE), req("y", NUMERIC)];
const SCATTER_ROLES: &[RoleSpec] = &[req("x", NUMERIC), req("y", NUMERIC), opt("color", CATEGORICAL)];
const BUBBLE_ROLES: &[RoleSpec] = &[
    req("x", NUMERIC),
    req("y", NUMERIC),
    req("size", NUMERIC),
    opt("color", CATEGORICAL),
];
const HISTOGRAM_ROLES: &[RoleSpec] = &[req("values", NUMERIC)];
const DISTRIBUTION_ROLES: &[RoleSpec] = &[req("values", NUMERIC), opt("group", CATEGORICAL)];
const HEATMAP_ROLES: &[RoleSpec] = &[
    req("x", CATEGORICAL),
    req("y", CATEGORICAL),
    req("values", NUMERIC),
];
const DENSITY_ROLES: &[RoleSpec] = &[req("x", NUMERIC), req("y", NUMERIC)];
const CANDLESTICK_ROLES: &[RoleSpec] = &[
    req("date", DATE),
    req("open", NUMERIC),
    req("high", NUMERIC),
    req("low", NUMERIC),
    req("close", NUMERIC),
];
const FUNNEL_ROLES: &[RoleSpec] = &[req("stages", CATEGORICAL), req("values", NUMERIC)];
const TREEMAP_ROLES: &[RoleSpec] = &[req("labels", CATEGORICAL), req("values", NUMERIC)];
const SUNBURST_ROLES: &[RoleSpec] = &[
    req("labels", CATEGORICAL),
    req("values", NUMERIC),
    opt("parents", CATEGORICAL),
];
const RADAR_ROLES: &[RoleSpec] = &[
    req("axes", CATEGORICAL),
    req("values", NUMERIC),
    opt("series", CATEGORICAL),
];
const WORD_CLOUD_ROLES: &[RoleSpec] = &[req("text", TEXTUAL)];
const SANKEY_ROLES: &[RoleSpec] = &[
    req("source", CATEGORICAL),
    req("target", CATEGORICAL),
    req("values", NUMERIC),
];
const CHOROPLETH_ROLES: &[RoleSpec] = &[req("locations", CATEGORICAL), req("values", NUMERIC)];
const POINT_MAP_ROLES: &[RoleSpec] = &[
    req("latitude", NUMERIC),
    req("longitude", NUMERIC),
    opt("size", NUMERIC),
];

/// The closed set of chart types. Dispatch over this enum is exhaustive;
/// the only place an unknown chart identifier can appear at runtime is
/// string parsing via `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartType {
    Pie,
    Donut,
    Bar,
    GroupedBar,
    StackedBar,
    Line,
    Area,
    Scatter,
    Bubble,
    Histogram,
    Box,
    Violin,
    Strip,
    Heatmap,
    DensityHeatmap,
    Candlestick,
    Funnel,
    Treemap,
    Sunburst,
    Radar,
    WordCloud,
    Sankey,
    Choropleth,
    PointMap,
}

impl ChartType {
    pub const ALL: [ChartType; 24] = [
        ChartType::Pie,
        ChartType::Donut,
        ChartType::Bar,
        ChartType::GroupedBar,
        ChartType::StackedBar,
        ChartType::Line,
        ChartType::Area,
        ChartType::Scatter,
        ChartType::Bubble,
        ChartType::Histogram,
        ChartType::Box,
        ChartType::Violin,
        ChartType::Strip,
        ChartType::Heatmap,
        ChartType::DensityHeatmap,
        ChartType::Candlestick,
        ChartType::Funnel,
        ChartType::Treemap,
        ChartType::Sunburst,
        ChartType::Radar,
        ChartType::WordCloud,
        ChartType::Sankey,
        ChartType::Choropleth,
        ChartType::PointMap,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChartType::Pie => "Pie Chart",
            ChartType::Donut => "Donut Chart",
            ChartType::Bar => "Bar Chart",
            ChartType::GroupedBar => "Grouped Bar Chart",
            ChartType::StackedBar => "Stacked Bar Chart",
            ChartType::Line => "Line Chart",
            ChartType::Area => "Area Chart",
            ChartType::Scatter => "Scatter Plot",
            ChartType::Bubble => "Bubble Chart",
            ChartType::Histogram => "Histogram",
            ChartType::Box => "Box Plot",
            ChartType::Violin => "Violin Plot",
            ChartType::Strip => "Strip Plot",
            ChartType::Heatmap => "Heatmap",
            ChartType::DensityHeatmap => "Density Heatmap",
            ChartType::Candlestick => "Candlestick Chart",
            ChartType::Funnel => "Funnel Chart",
            ChartType::Treemap => "Treemap",
            ChartType::Sunburst => "Sunburst Chart",
            ChartType::Radar => "Radar Chart",
            ChartType::WordCloud => "Word Cloud",
            ChartType::Sankey => "Sankey Diagram",
            ChartType::Choropleth => "Choropleth Map",
            ChartType::PointMap => "Point Map",
        }
    }

    /// One-line guidance shown next to the chart picker.
    pub fn description(&self) -> &'static str {
        match self {
            ChartType::Pie => "Use for categorical data to show proportions.",
            ChartType::Donut => "Use for proportions, with a hollow center for a lighter look.",
            ChartType::Bar => "Use to compare values across categories.",
            ChartType::GroupedBar => "Use to compare sub-groups side by side within each category.",
            ChartType::StackedBar => "Use to show how sub-groups add up within each category.",
            ChartType::Line => "Use to show trends over time.",
            ChartType::Area => "Use to show trends over time with emphasis on magnitude.",
            ChartType::Scatter => "Use to show the relationship between two numeric variables.",
            ChartType::Bubble => {
                "Use to show the relationship between two numeric variables, with a third as size."
            }
            ChartType::Histogram => "Use to show the distribution of a numeric variable.",
            ChartType::Box => "Use to summarize a distribution with quartiles and outliers.",
            ChartType::Violin => "Use to compare full distribution shapes across groups.",
            ChartType::Strip => "Use to show every observation along a category axis.",
            ChartType::Heatmap => "Use to show a value across two categorical dimensions.",
            ChartType::DensityHeatmap => "Use to show where two numeric variables concentrate.",
            ChartType::Candlestick => "Use for open/high/low/close price series over time.",
            ChartType::Funnel => "Use to show drop-off across ordered stages.",
            ChartType::Treemap => "Use to show part-of-whole composition as tiled rectangles.",
            ChartType::Sunburst => "Use to show hierarchical part-of-whole composition as rings.",
            ChartType::Radar => "Use to compare several metrics on a circular axis.",
            ChartType::WordCloud => "Use to show the most frequent words in a text column.",
            ChartType::Sankey => "Use to show flow volume between sources and targets.",
            ChartType::Choropleth => "Use to show a value by geographic region.",
            ChartType::PointMap => "Use to plot individual locations by latitude and longitude.",
        }
    }

    pub fn requirement(&self) -> ChartRequirement {
        let roles = match self {
            ChartType::Pie | ChartType::Donut => PIE_ROLES,
            ChartType::Bar => BAR_ROLES,
            ChartType::GroupedBar | ChartType::StackedBar => MULTI_BAR_ROLES,
            ChartType::Line => LINE_ROLES,
            ChartType::Area => AREA_ROLES,
            ChartType::Scatter => SCATTER_ROLES,
            ChartType::Bubble => BUBBLE_ROLES,
            ChartType::Histogram => HISTOGRAM_ROLES,
            ChartType::Box | ChartType::Violin | ChartType::Strip => DISTRIBUTION_ROLES,
            ChartType::Heatmap => HEATMAP_ROLES,
            ChartType::DensityHeatmap => DENSITY_ROLES,
            ChartType::Candlestick => CANDLESTICK_ROLES,
            ChartType::Funnel => FUNNEL_ROLES,
            ChartType::Treemap => TREEMAP_ROLES,
            ChartType::Sunburst => SUNBURST_ROLES,
            ChartType::Radar => RADAR_ROLES,
            ChartType::WordCloud => WORD_CLOUD_ROLES,
            ChartType::Sankey => SANKEY_ROLES,
            ChartType::Choropleth => CHOROPLETH_ROLES,
            ChartType::PointMap => POINT_MAP_ROLES,
        };
        ChartRequirement { roles }
    }

    /// Short form: the canonical name minus a trailing kind word, so
    /// "pie" or "grouped bar" parse as well as the full names.
    fn short_name(&self) -> String {
        let name = self.name().to_ascii_lowercase();
        for suffix in [" chart", " plot", " diagram", " map", " cloud"] {
            if let Some(stripped) = name.strip_suffix(suffix) {
                return stripped.to_string();
            }
        }
        name
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = wanted.split_whitespace().collect::<Vec<_>>().join(" ");
        for chart in ChartType::ALL {
            if wanted == chart.name().to_ascii_lowercase() || wanted == chart.short_name() {
                return Ok(chart);
            }
        }
        Err(ChartError::UnknownChartType { name: s.trim().to_string() })
    }
}

/// A user's chart selection: a chart type plus role-to-column bindings.
/// Built fresh per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub chart: ChartType,
    #[serde(default)]
    pub bindings: HashMap<String, String>,
}

impl ChartSpec {
    pub fn new(chart: ChartType) -> Self {
        ChartSpec { chart, bindings: HashMap::new() }
    }

    pub fn bind(mut self, role: &str, column: &str) -> Self {
        self.bindings.insert(role.to_string(), column.to_string());
        self
    }

    pub fn binding(&self, role: &str) -> Option<&str> {
        self.bindings.get(role).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    // Parsing tests

    #[test]
    fn test_parse_roundtrip_all() {
        for chart in ChartType::ALL {
            assert_eq!(ChartType::from_str(chart.name()).unwrap(), chart);
        }
    }

    #[test]
    fn test_parse_case_and_short_forms() {
        assert_eq!(ChartType::from_str("pie").unwrap(), ChartType::Pie);
        assert_eq!(ChartType::from_str("Scatter plot").unwrap(), ChartType::Scatter);
        assert_eq!(ChartType::from_str("  grouped   bar ").unwrap(), ChartType::GroupedBar);
        assert_eq!(ChartType::from_str("sankey").unwrap(), ChartType::Sankey);
        assert_eq!(ChartType::from_str("choropleth").unwrap(), ChartType::Choropleth);
    }

    #[test]
    fn test_parse_unknown() {
        let err = ChartType::from_str("spiral chart").unwrap_err();
        assert!(err.to_string().contains("unknown chart type 'spiral chart'"));
    }

    // Catalog shape tests

    #[test]
    fn test_names_are_distinct() {
        let names: HashSet<&str> = ChartType::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), ChartType::ALL.len());
    }

    #[test]
    fn test_every_chart_has_roles_and_description() {
        for chart in ChartType::ALL {
            assert!(!chart.requirement().roles.is_empty(), "{} has no roles", chart);
            assert!(!chart.description().is_empty());
            assert!(chart.requirement().required_roles().count() >= 1);
        }
    }

    #[test]
    fn test_declared_role_order() {
        let roles: Vec<&str> = ChartType::Pie.requirement().roles.iter().map(|r| r.role).collect();
        assert_eq!(roles, vec!["names", "values"]);

        let roles: Vec<&str> =
            ChartType::Candlestick.requirement().roles.iter().map(|r| r.role).collect();
        assert_eq!(roles, vec!["date", "open", "high", "low", "close"]);
    }

    #[test]
    fn test_role_lookup() {
        let req = ChartType::Bubble.requirement();
        assert!(req.role("size").unwrap().required);
        assert!(!req.role("color").unwrap().required);
        assert!(req.role("nope").is_none());
    }

    // ChartSpec tests

    #[test]
    fn test_spec_builder_and_serde() {
        let spec = ChartSpec::new(ChartType::Scatter).bind("x", "height").bind("y", "weight");
        assert_eq!(spec.binding("x"), Some("height"));
        assert_eq!(spec.binding("size"), None);

        let json = serde_json::to_string(&spec).unwrap();
        let back: ChartSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
