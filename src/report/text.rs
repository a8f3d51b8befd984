use crate::report::{EntitySummary, QualitySummary, RiskLevel, TrendPoint, format_f64_6};

#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub n_rows: usize,
    pub n_entities: usize,
    pub injected_rows: usize,
    pub quality: &'a QualitySummary,
    pub entities: &'a [EntitySummary],
    pub trend: &'a [TrendPoint],
}

pub fn render_report_text(ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();

    out.push_str("KPI Anomaly Detection Report\n");
    out.push_str("============================\n\n");

    out.push_str("1. Input\n");
    out.push_str(&format!("Rows: {}\n", ctx.n_rows));
    out.push_str(&format!("Entities: {}\n", ctx.n_entities));
    out.push_str(&format!("Injected rows: {}\n\n", ctx.injected_rows));

    out.push_str("2. Detection quality\n");
    out.push_str(&format!("Metrics scored: {}\n", ctx.quality.n_metrics));
    out.push_str(&format!(
        "Mean precision: {}\nMean recall: {}\nMean F1: {}\n",
        format_f64_6(ctx.quality.mean_precision),
        format_f64_6(ctx.quality.mean_recall),
        format_f64_6(ctx.quality.mean_f1)
    ));
    out.push_str(&format!("Best metric: {}\n", ctx.quality.best_metric));
    out.push_str(&format!("{}\n\n", quality_statement(ctx.quality.mean_f1)));

    out.push_str("3. Entity risk\n");
    let count = |level: RiskLevel| ctx.entities.iter().filter(|e| e.risk == level).count();
    out.push_str(&format!(
        "high={} medium={} low={}\n",
        count(RiskLevel::High),
        count(RiskLevel::Medium),
        count(RiskLevel::Low)
    ));
    for e in top_entities(ctx.entities, 5) {
        out.push_str(&format!(
            "  {} rate={}% top_metric={} risk={}\n",
            e.entity,
            format_f64_6(e.anomaly_rate_pct),
            e.top_metric,
            e.risk.as_str()
        ));
    }
    out.push('\n');

    out.push_str("4. Trend\n");
    match peak_day(ctx.trend) {
        Some(p) => out.push_str(&format!(
            "Days covered: {}\nPeak day: {} ({} flags, {}%)\n",
            ctx.trend.len(),
            p.date,
            p.flagged,
            format_f64_6(p.anomaly_rate_pct)
        )),
        None => out.push_str("No dated rows.\n"),
    }

    out
}

fn quality_statement(mean_f1: f64) -> &'static str {
    if mean_f1 >= 0.8 {
        "Injected anomalies are recovered reliably."
    } else if mean_f1 >= 0.5 {
        "Injected anomalies are partially recovered."
    } else {
        "Injected anomalies are poorly recovered; consider widening the configuration grid."
    }
}

fn top_entities(entities: &[EntitySummary], k: usize) -> Vec<&EntitySummary> {
    let mut sorted: Vec<&EntitySummary> = entities.iter().collect();
    sorted.sort_by(|a, b| {
        b.anomaly_rate_pct
            .partial_cmp(&a.anomaly_rate_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.entity.cmp(&b.entity))
    });
    sorted.truncate(k);
    sorted
}

fn peak_day(trend: &[TrendPoint]) -> Option<&TrendPoint> {
    let mut best: Option<&TrendPoint> = None;
    for p in trend {
        if best.is_none_or(|b| p.flagged > b.flagged) {
            best = Some(p);
        }
    }
    best
}
