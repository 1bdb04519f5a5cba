//! Renderer-agnostic views over a finished model.
//!
//! Everything a dashboard shows beyond raw numbers lives here: KPI captions,
//! ranked contribution shares, waterfall running totals, drill-down tables
//! and the month picker. Renderers only lay these out.

use crate::{
    format::{format_money, format_pct, format_rate},
    model::{BridgeStep, ClientDetail, DetailBreakdown, Driver, DriverKind, Insight, PeriodDataModel, Polarity, StepKind},
    numeric::safe_div,
    types::PeriodKey,
};
use chrono::NaiveDate;
use serde::Serialize;

// ── KPI cards ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub label: &'static str,
    pub value: String,
    pub caption: String,
    /// `None` for neutral cards, otherwise whether the figure is favourable.
    pub favourable: Option<bool>,
}

pub fn kpi_cards(model: &PeriodDataModel) -> [KpiCard; 4] {
    let over = model.variance >= 0.0;
    [
        KpiCard {
            label: "Planned recognized revenue",
            value: format_money(model.plan_revenue),
            caption: format!("Delay {} · FX {}", format_pct(model.plan_delay), format_rate(model.plan_fx)),
            favourable: None,
        },
        KpiCard {
            label: "Actual recognized revenue",
            value: format_money(model.actual_revenue),
            caption: format!("Delay {} · FX {}", format_pct(model.actual_delay), format_rate(model.actual_fx)),
            favourable: None,
        },
        KpiCard {
            label: "Variance (Actual − Plan)",
            value: format_money(model.variance),
            caption: format!(
                "{} plan by {}",
                if over { "Over" } else { "Under" },
                format_money(model.variance.abs())
            ),
            favourable: Some(over),
        },
        KpiCard {
            label: "Variance %",
            value: format_pct(model.variance_pct),
            caption: format!("vs plan {}", format_pct(model.variance_pct)),
            favourable: Some(model.variance_pct >= 0.0),
        },
    ]
}

// ── Ranked drivers ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverContribution<'a> {
    pub kind: DriverKind,
    pub name: &'a str,
    pub value: f64,
    /// |value| / Σ|values|.
    pub share: f64,
    pub note: &'a str,
    pub has_details: bool,
}

/// Drivers sorted by absolute contribution, largest first.
pub fn rank_drivers(model: &PeriodDataModel) -> Vec<DriverContribution<'_>> {
    let total_abs: f64 = model.drivers.iter().map(|d| d.value.abs()).sum();
    let denominator = if total_abs > 0.0 { total_abs } else { 1.0 };

    let mut ranked: Vec<_> = model
        .drivers
        .iter()
        .map(|d| DriverContribution {
            kind: d.kind,
            name: &d.name,
            value: d.value,
            share: safe_div(d.value.abs(), denominator),
            note: &d.note,
            has_details: !d.client_details.is_empty(),
        })
        .collect();
    ranked.sort_by(|a, b| b.value.abs().total_cmp(&a.value.abs()));
    ranked
}

/// |Other| as a fraction of |variance|. Ideally small.
pub fn residual_share(model: &PeriodDataModel) -> f64 {
    safe_div(model.driver_value(DriverKind::Other).abs(), model.variance.abs())
}

// ── Waterfall ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaterfallBar<'a> {
    pub label: &'a str,
    pub value: f64,
    pub start: f64,
    pub end: f64,
    pub is_total: bool,
}

/// Running start/end for each bar. Totals are anchored at zero; each delta
/// starts where the previous bar ended.
pub fn waterfall(steps: &[BridgeStep]) -> Vec<WaterfallBar<'_>> {
    let mut running = 0.0;
    steps
        .iter()
        .map(|s| {
            if s.kind == StepKind::Total {
                running = s.value;
                WaterfallBar { label: &s.label, value: s.value, start: 0.0, end: s.value, is_total: true }
            } else {
                let start = running;
                running += s.value;
                WaterfallBar { label: &s.label, value: s.value, start, end: running, is_total: false }
            }
        })
        .collect()
}

/// Y-axis range for a waterfall: 10% padding below (never under zero) and
/// 15% above.
pub fn axis_range(bars: &[WaterfallBar<'_>]) -> (f64, f64) {
    if bars.is_empty() {
        return (0.0, 1.0);
    }
    let min = bars.iter().map(|b| b.start.min(b.end)).fold(f64::INFINITY, f64::min);
    let max = bars.iter().map(|b| b.start.max(b.end)).fold(f64::NEG_INFINITY, f64::max);
    let span = if max - min > 0.0 { max - min } else { 1.0 };
    ((min - span * 0.10).max(0.0), max + span * 0.15)
}

// ── Drill-down ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailTable<'a> {
    pub driver: &'a Driver,
    /// Valid rows, largest absolute impact first.
    pub rows: Vec<&'a ClientDetail>,
    pub total_variance: f64,
    /// Σ plan and actual transaction counts; volume drivers only.
    pub volume_totals: Option<(i64, i64)>,
}

pub fn detail_table(driver: &Driver) -> DetailTable<'_> {
    let mut rows: Vec<&ClientDetail> = driver.client_details.iter().filter(|d| d.is_valid()).collect();
    rows.sort_by(|a, b| b.variance.abs().total_cmp(&a.variance.abs()));
    let total_variance = rows.iter().map(|d| d.variance).sum();

    let volume_totals = (driver.kind == DriverKind::Volume).then(|| {
        rows.iter().fold((0, 0), |(plan, actual), d| match d.breakdown {
            DetailBreakdown::Volume { plan_volume, actual_volume } => (plan + plan_volume, actual + actual_volume),
            _ => (plan, actual),
        })
    });

    DetailTable { driver, rows, total_variance, volume_totals }
}

pub fn timing_status(days_delay: i64) -> &'static str {
    match days_delay {
        d if d > 0 => "Delayed",
        d if d < 0 => "Accelerated",
        _ => "On time",
    }
}

pub fn fx_direction(fx_change: f64) -> &'static str {
    if fx_change >= 0.0 { "Appreciation" } else { "Depreciation" }
}

// ── Insights panel ───────────────────────────────────────────────────────────

pub fn split_insights(model: &PeriodDataModel) -> (Vec<&Insight>, Vec<&Insight>) {
    (
        model.insights_of(Polarity::Positive).collect(),
        model.insights_of(Polarity::Negative).collect(),
    )
}

// ── Month picker ─────────────────────────────────────────────────────────────

/// The `n` months ending at `today`'s month, newest first, with labels.
pub fn recent_months(today: NaiveDate, n: usize) -> Vec<(PeriodKey, String)> {
    let current = PeriodKey::from_date(today);
    (0..n as i32)
        .map(|i| {
            let key = current.shift(-i);
            (key, key.label())
        })
        .collect()
}
