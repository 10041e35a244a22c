use thiserror::Error;

use crate::catalog::ChartType;
use crate::data::ColumnType;

/// Failures produced while turning a chart selection into a chart description.
///
/// Every variant formats as a single line naming the role, column, or chart
/// involved, so the calling layer can surface it verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("unknown chart type '{name}'")]
    UnknownChartType { name: String },

    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("{chart} requires role '{role}', but no column is bound to it")]
    UnboundRole { chart: ChartType, role: &'static str },

    #[error("column '{column}' (bound to role '{role}') not found in dataset")]
    MissingColumn { role: &'static str, column: String },

    #[error("role '{role}' requires a {expected} column, but '{column}' is {found}")]
    IncompatibleType {
        role: &'static str,
        column: String,
        expected: String,
        found: ColumnType,
    },

    #[error("{chart} has no role named '{role}'")]
    UnknownRole { chart: ChartType, role: String },
}
