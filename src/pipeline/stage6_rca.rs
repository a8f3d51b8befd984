use crate::model::label::Label;
use crate::model::profile::RcaRule;
use crate::pipeline::stage5_aggregate::AnomalyColumns;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RcaColumn {
    pub target: String,
    pub remarks: Vec<String>,
}

impl RcaColumn {
    pub fn header(&self) -> String {
        format!("{}_RCA_Remark", self.target)
    }
}

/// One remark column per rule whose target was scored. Sources that were
/// not scored are ignored.
pub fn annotate(
    metric_names: &[String],
    anomalies: &AnomalyColumns,
    rules: &[RcaRule],
) -> Vec<RcaColumn> {
    let index_of = |name: &str| metric_names.iter().position(|m| m == name);
    let mut out = Vec::new();

    for rule in rules {
        let Some(target) = index_of(&rule.target) else {
            tracing::warn!(metric = %rule.target, "rca target not among scored metrics; skipping");
            continue;
        };
        let sources: Vec<(usize, &str)> = rule
            .sources
            .iter()
            .filter_map(|s| index_of(s).map(|idx| (idx, s.as_str())))
            .collect();

        let target_column = anomalies.metric(target);
        let remarks = (0..target_column.len())
            .map(|row| {
                let flagged: Vec<&str> = sources
                    .iter()
                    .filter(|(idx, _)| anomalies.get(*idx, row) == Label::Anomalous)
                    .map(|(_, name)| *name)
                    .collect();
                remark_for_row(&rule.target, target_column[row], &flagged)
            })
            .collect();

        out.push(RcaColumn {
            target: rule.target.clone(),
            remarks,
        });
    }
    out
}

pub fn remark_for_row(target: &str, target_label: Label, flagged_sources: &[&str]) -> String {
    if !target_label.is_anomalous() {
        return String::new();
    }
    if flagged_sources.is_empty() {
        format!("{target} has an anomaly but no significant RCA found")
    } else {
        format!("{target} is impacted due to {}", flagged_sources.join(", "))
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_rca.rs"]
mod tests;
