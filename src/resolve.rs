use crate::catalog::{ChartSpec, RoleSpec};
use crate::data::{Column, ColumnType, Dataset};
use crate::error::ChartError;
use crate::ir::{ResolvedChart, RoleBinding};

/// Validate a chart selection against a dataset.
///
/// Checks run in a fixed order so the reported failure is deterministic:
/// dataset non-empty, then an existence pass (required roles bound, bound
/// columns present), then a type pass, each walking the chart's roles in
/// declared order. Existence problems therefore always outrank type
/// problems. Bindings naming roles the chart does not declare are rejected
/// last.
pub fn resolve_chart_spec(data: &Dataset, spec: &ChartSpec) -> Result<ResolvedChart, ChartError> {
    if data.is_empty() {
        return Err(ChartError::EmptyDataset);
    }

    let requirement = spec.chart.requirement();

    // 1. Existence pass; remembers resolved columns in declared role order.
    let mut bound: Vec<(&'static RoleSpec, &Column)> = Vec::new();
    for role_spec in requirement.roles {
        match spec.binding(role_spec.role) {
            None if role_spec.required => {
                return Err(ChartError::UnboundRole {
                    chart: spec.chart,
                    role: role_spec.role,
                });
            }
            None => {}
            Some(column) => match data.column(column) {
                Some(col) => bound.push((role_spec, col)),
                None => {
                    return Err(ChartError::MissingColumn {
                        role: role_spec.role,
                        column: column.to_string(),
                    });
                }
            },
        }
    }

    // 2. Type pass over the same roles, same order.
    for (role_spec, col) in &bound {
        if !role_spec.accepts.contains(&col.ctype) {
            return Err(ChartError::IncompatibleType {
                role: role_spec.role,
                column: col.name.clone(),
                expected: describe_accepts(role_spec.accepts),
                found: col.ctype,
            });
        }
    }

    // 3. Reject bindings for roles this chart does not have.
    let mut stray: Vec<&String> = spec
        .bindings
        .keys()
        .filter(|k| requirement.role(k).is_none())
        .collect();
    stray.sort();
    if let Some(role) = stray.first() {
        return Err(ChartError::UnknownRole {
            chart: spec.chart,
            role: (*role).clone(),
        });
    }

    Ok(ResolvedChart {
        chart: spec.chart,
        bindings: bound
            .into_iter()
            .map(|(role_spec, col)| RoleBinding {
                role: role_spec.role.to_string(),
                column: col.name.clone(),
            })
            .collect(),
    })
}

fn describe_accepts(accepts: &[ColumnType]) -> String {
    accepts
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" or ")
}
