use std::collections::HashSet;

use anyhow::Result;

use crate::catalog::{ChartSpec, ChartType};
use crate::compiler::compile_chart;
use crate::data::Dataset;
use crate::error::ChartError;
use crate::ir::ChartDescription;
use crate::render::render_description;
use crate::resolve::resolve_chart_spec;
use crate::RenderOptions;

/// Validate a chart spec against a dataset and compile its description.
///
/// This is the whole request path: resolution rejects a bad spec with a
/// single [`ChartError`], and compilation cannot fail after that.
pub fn build_chart(dataset: &Dataset, spec: &ChartSpec) -> Result<ChartDescription, ChartError> {
    let resolved = resolve_chart_spec(dataset, spec)?;
    Ok(compile_chart(dataset, &resolved))
}

/// Render a built description to PNG bytes.
pub fn render_chart(description: &ChartDescription, options: &RenderOptions) -> Result<Vec<u8>> {
    render_description(description, options)
}

/// Chart types whose required roles can all be filled from this dataset.
pub fn applicable_charts(dataset: &Dataset) -> Vec<ChartType> {
    ChartType::ALL
        .iter()
        .copied()
        .filter(|chart| suggest_spec(dataset, *chart).is_some())
        .collect()
}

/// Propose a spec for `chart`: walk its required roles in declared order
/// and bind each to the first still-unused column of an accepted type.
/// Returns None when some required role cannot be filled.
pub fn suggest_spec(dataset: &Dataset, chart: ChartType) -> Option<ChartSpec> {
    let requirement = chart.requirement();
    let mut used: HashSet<&str> = HashSet::new();
    let mut spec = ChartSpec::new(chart);
    for role_spec in requirement.required_roles() {
        let column = dataset.columns.iter().find(|column| {
            !used.contains(column.name.as_str()) && role_spec.accepts.contains(&column.ctype)
        })?;
        used.insert(column.name.as_str());
        spec = spec.bind(role_spec.role, &column.name);
    }
    Some(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, ColumnType};

    fn make_dataset(columns: &[(&str, &[&str])]) -> Dataset {
        let headers: Vec<String> = columns.iter().map(|(name, _)| name.to_string()).collect();
        let row_count = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        let rows: Vec<Vec<String>> = (0..row_count)
            .map(|row| {
                columns
                    .iter()
                    .map(|(_, values)| values[row].to_string())
                    .collect()
            })
            .collect();
        Dataset::from_rows(headers, rows).unwrap()
    }

    // build_chart tests (4 tests)

    #[test]
    fn test_build_pie_without_values_names_the_role() {
        let dataset = make_dataset(&[
            ("region", &["north", "south", "north"]),
            ("sales", &["10", "20", "30"]),
        ]);
        let spec = ChartSpec::new(ChartType::Pie).bind("names", "region");

        let err = build_chart(&dataset, &spec).unwrap_err();
        assert_eq!(
            err,
            ChartError::UnboundRole { chart: ChartType::Pie, role: "values" }
        );
        assert!(err.to_string().contains("'values'"));
    }

    #[test]
    fn test_build_scatter_references_both_columns() {
        let dataset = make_dataset(&[
            ("height", &["1.2", "1.4", "1.9"]),
            ("weight", &["50", "60", "80"]),
        ]);
        let spec = ChartSpec::new(ChartType::Scatter)
            .bind("x", "height")
            .bind("y", "weight");

        let description = build_chart(&dataset, &spec).unwrap();
        assert_eq!(description.title, "Scatter Plot of weight vs height");
        assert_eq!(description.binding("x"), Some("height"));
        assert_eq!(description.binding("y"), Some("weight"));
    }

    #[test]
    fn test_build_reports_missing_column() {
        let dataset = make_dataset(&[("sales", &["10", "20"])]);
        let spec = ChartSpec::new(ChartType::Histogram).bind("values", "revenue");

        let err = build_chart(&dataset, &spec).unwrap_err();
        assert!(err.to_string().contains("'revenue'"));
    }

    #[test]
    fn test_build_rejects_empty_dataset() {
        let dataset = Dataset {
            columns: vec![Column {
                name: "sales".to_string(),
                ctype: ColumnType::Numeric,
                values: vec![],
            }],
        };
        let spec = ChartSpec::new(ChartType::Histogram).bind("values", "sales");

        let err = build_chart(&dataset, &spec).unwrap_err();
        assert_eq!(err, ChartError::EmptyDataset);
    }

    // render_chart tests (2 tests)

    #[test]
    fn test_build_then_render_produces_png() {
        let dataset = make_dataset(&[
            ("region", &["north", "south", "north"]),
            ("sales", &["10", "20", "30"]),
        ]);
        let spec = ChartSpec::new(ChartType::Bar)
            .bind("category", "region")
            .bind("value", "sales");

        let description = build_chart(&dataset, &spec).unwrap();
        let png = render_chart(&description, &RenderOptions::default()).unwrap();
        assert_eq!(&png[0..8], &[137, 80, 78, 71, 13, 10, 26, 10]);
    }

    #[test]
    fn test_render_description_only_chart_fails() {
        let dataset = make_dataset(&[
            ("from", &["a", "a", "b"]),
            ("to", &["b", "c", "c"]),
            ("amount", &["1", "2", "3"]),
        ]);
        let spec = ChartSpec::new(ChartType::Sankey)
            .bind("source", "from")
            .bind("target", "to")
            .bind("values", "amount");

        let description = build_chart(&dataset, &spec).unwrap();
        let err = render_chart(&description, &RenderOptions::default()).unwrap_err();
        assert!(err.to_string().contains("no PNG renderer"));
    }

    // suggestion tests (3 tests)

    #[test]
    fn test_applicable_charts_respects_column_types() {
        let dataset = make_dataset(&[
            ("region", &["north", "south", "north"]),
            ("sales", &["10", "20", "30"]),
            ("day", &["2024-01-01", "2024-01-02", "2024-01-03"]),
        ]);

        let applicable = applicable_charts(&dataset);
        assert!(applicable.contains(&ChartType::Pie));
        assert!(applicable.contains(&ChartType::Bar));
        assert!(applicable.contains(&ChartType::Line));
        assert!(applicable.contains(&ChartType::Histogram));
        assert!(applicable.contains(&ChartType::Box));

        // One numeric column cannot fill both scatter axes.
        assert!(!applicable.contains(&ChartType::Scatter));
        assert!(!applicable.contains(&ChartType::Candlestick));
    }

    #[test]
    fn test_suggest_spec_uses_distinct_columns() {
        let dataset = make_dataset(&[
            ("height", &["1.2", "1.4"]),
            ("weight", &["50", "60"]),
        ]);

        let spec = suggest_spec(&dataset, ChartType::Scatter).unwrap();
        assert_eq!(spec.binding("x"), Some("height"));
        assert_eq!(spec.binding("y"), Some("weight"));

        let description = build_chart(&dataset, &spec).unwrap();
        assert_eq!(description.binding("x"), Some("height"));
    }

    #[test]
    fn test_suggest_spec_fails_without_matching_types() {
        let dataset = make_dataset(&[("region", &["north", "south", "east"])]);
        assert_eq!(suggest_spec(&dataset, ChartType::Scatter), None);
    }
}
