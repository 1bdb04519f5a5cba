//! Insight synthesizer: narrative highlights derived from a period's numbers.
//!
//! Rules run in a fixed order and each emits at most one sentence. Rule
//! output always comes first; filler is appended afterwards until each
//! polarity has MIN_PER_POLARITY entries or its filler list runs out.

use crate::format::{format_money, format_pct, format_rate};
use crate::model::{DetailBreakdown, Driver, DriverKind, Insight, PeriodDataModel, Polarity};
use crate::numeric::safe_div;

pub const MIN_PER_POLARITY: usize = 3;

/// |Other| above this share of |variance| is flagged as poorly explained.
pub const RESIDUAL_WARNING_SHARE: f64 = 0.10;

/// Actual delay above plan × this factor is called out as a serious overrun.
pub const DELAY_OVERRUN_FACTOR: f64 = 1.2;

/// An FX loss is only reported once it exceeds this share of plan revenue.
pub const FX_MATERIALITY_SHARE: f64 = 0.02;

const POSITIVE_FILLER: [&str; 4] = [
    "Core account retention held steady across the portfolio.",
    "Billing operations closed the period without material reconciliation breaks.",
    "Pipeline conversion tracked in line with forecast.",
    "Rate card governance held with no unapproved discounts recorded.",
];

const NEGATIVE_FILLER: [&str; 4] = [
    "Implementation capacity is tight heading into next period.",
    "Revenue remains concentrated in the top client cohort.",
    "Part of the book carries unhedged FX exposure.",
    "Forecast accuracy should be reviewed against the latest run-rate.",
];

/// Build the insight list for a model whose drivers are already final.
/// Any insights already on the model are ignored.
pub fn synthesize(model: &PeriodDataModel) -> Vec<Insight> {
    let mut out = Vec::new();

    headline_rule(model, &mut out);
    if let Some(d) = model.driver(DriverKind::Volume) {
        volume_rule(d, &mut out);
    }
    if let Some(d) = model.driver(DriverKind::Price) {
        price_rule(d, model.plan_revenue, &mut out);
    }
    if let Some(d) = model.driver(DriverKind::Timing) {
        timing_rule(d, &mut out);
    }
    delay_rule(model.plan_delay, model.actual_delay, &mut out);
    if let Some(d) = model.driver(DriverKind::Timing) {
        on_time_rule(d, &mut out);
    }
    if let Some(d) = model.driver(DriverKind::Churn) {
        churn_rule(d, &mut out);
    }
    if let Some(d) = model.driver(DriverKind::Fx) {
        fx_rule(d, model.plan_revenue, model.plan_fx, model.actual_fx, &mut out);
    }
    if let Some(d) = model.driver(DriverKind::Other) {
        residual_rule(d, model.variance, &mut out);
    }

    pad_with_filler(&mut out);
    out
}

/// Append filler per polarity up to the floor. A polarity that already has
/// `n` insights continues the filler list at index `n`, never past its end.
pub fn pad_with_filler(insights: &mut Vec<Insight>) {
    for (polarity, filler) in [
        (Polarity::Positive, &POSITIVE_FILLER),
        (Polarity::Negative, &NEGATIVE_FILLER),
    ] {
        let have = insights.iter().filter(|i| i.polarity == polarity).count();
        let missing = MIN_PER_POLARITY.saturating_sub(have);
        insights.extend(
            filler
                .iter()
                .skip(have)
                .take(missing)
                .map(|text| Insight { polarity, text: text.to_string() }),
        );
    }
}

// ── Rules ────────────────────────────────────────────────────────────────────

fn headline_rule(model: &PeriodDataModel, out: &mut Vec<Insight>) {
    let amount = format_money(model.variance.abs());
    let pct = format_pct(model.variance_pct.abs());
    if model.variance >= 0.0 {
        out.push(Insight::positive(format!(
            "Recognized revenue closed {amount} ({pct}) above plan."
        )));
    } else {
        out.push(Insight::negative(format!(
            "Recognized revenue closed {amount} ({pct}) below plan."
        )));
    }
}

fn volume_rule(driver: &Driver, out: &mut Vec<Insight>) {
    let amount = format_money(driver.value.abs());
    if driver.value > 0.0 {
        let leaders = top_clients(driver, 3, true);
        out.push(Insight::positive(format!(
            "Transaction volume ran {amount} ahead of plan, led by {leaders}."
        )));
    } else if driver.value < 0.0 {
        let laggards = top_clients(driver, 3, false);
        out.push(Insight::negative(format!(
            "Transaction volume fell {amount} short of plan, concentrated in {laggards}."
        )));
    }
}

/// Price impact is stated relative to plan revenue.
fn price_rule(driver: &Driver, plan_revenue: f64, out: &mut Vec<Insight>) {
    let pct = format_pct(safe_div(driver.value, plan_revenue).abs());
    if driver.value > 0.0 {
        out.push(Insight::positive(format!(
            "Realized pricing and mix ran {pct} of plan above the rate card."
        )));
    } else if driver.value < 0.0 {
        out.push(Insight::negative(format!(
            "Price concessions and mix cost {pct} of plan against the rate card."
        )));
    }
}

fn timing_rule(driver: &Driver, out: &mut Vec<Insight>) {
    let amount = format_money(driver.value.abs());
    if driver.value > 0.0 {
        out.push(Insight::positive(format!(
            "Implementation acceleration pulled {amount} of recognition into the period."
        )));
    } else if driver.value < 0.0 {
        out.push(Insight::negative(format!(
            "Implementation delays pushed {amount} of recognition into future periods."
        )));
    }
}

/// Slip below plan is positive; only an overrun past DELAY_OVERRUN_FACTOR is
/// negative. Anything between says nothing.
fn delay_rule(plan_delay: f64, actual_delay: f64, out: &mut Vec<Insight>) {
    let actual = format_pct(actual_delay);
    let plan = format_pct(plan_delay);
    if actual_delay < plan_delay {
        out.push(Insight::positive(format!(
            "Implementation slip of {actual} came in under the {plan} planned."
        )));
    } else if actual_delay > plan_delay * DELAY_OVERRUN_FACTOR {
        out.push(Insight::negative(format!(
            "Implementation slip of {actual} significantly exceeded the {plan} planned."
        )));
    }
}

fn on_time_rule(driver: &Driver, out: &mut Vec<Insight>) {
    let on_time = driver
        .client_details
        .iter()
        .filter(|d| matches!(d.breakdown, DetailBreakdown::Timing { days_delay, .. } if days_delay <= 0))
        .count();
    match on_time {
        0 => {}
        1 => out.push(Insight::positive("1 client went live on time or ahead of schedule.")),
        n => out.push(Insight::positive(format!("{n} clients went live on time or ahead of schedule."))),
    }
}

fn churn_rule(driver: &Driver, out: &mut Vec<Insight>) {
    let amount = format_money(driver.value.abs());
    if driver.value < 0.0 {
        let reason = first_churn_reason(driver).unwrap_or("unspecified");
        out.push(Insight::negative(format!(
            "Unplanned churn cost {amount}; most cited reason: {}.",
            reason.to_lowercase()
        )));
    } else if driver.value > 0.0 {
        out.push(Insight::positive(format!(
            "Churn came in below plan, protecting {amount} of revenue."
        )));
    }
}

/// Losses below FX_MATERIALITY_SHARE of plan are not reported.
fn fx_rule(driver: &Driver, plan_revenue: f64, plan_fx: f64, actual_fx: f64, out: &mut Vec<Insight>) {
    let amount = format_money(driver.value.abs());
    let rates = format!("{} vs {} plan", format_rate(actual_fx), format_rate(plan_fx));
    if driver.value > 0.0 {
        out.push(Insight::positive(format!("FX was a {amount} tailwind (rate {rates}).")));
    } else if driver.value < 0.0 && driver.value.abs() > plan_revenue * FX_MATERIALITY_SHARE {
        out.push(Insight::negative(format!("FX was a {amount} headwind (rate {rates}).")));
    }
}

fn residual_rule(driver: &Driver, variance: f64, out: &mut Vec<Insight>) {
    if variance == 0.0 {
        return;
    }
    let share = safe_div(driver.value.abs(), variance.abs());
    if share > RESIDUAL_WARNING_SHARE {
        out.push(Insight::negative(format!(
            "Unexplained residual is {} of total variance; review the driver mapping.",
            format_pct(share)
        )));
    } else {
        out.push(Insight::positive(format!(
            "Modeled drivers explain the bridge; residual is only {} of variance.",
            format_pct(share)
        )));
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Names of the `n` largest gainers (or losers), comma separated.
fn top_clients(driver: &Driver, n: usize, gainers: bool) -> String {
    let mut rows: Vec<_> = driver.client_details.iter().filter(|d| d.is_valid()).collect();
    if gainers {
        rows.sort_by(|a, b| b.variance.total_cmp(&a.variance));
    } else {
        rows.sort_by(|a, b| a.variance.total_cmp(&b.variance));
    }
    let names: Vec<&str> = rows.iter().take(n).map(|d| d.client_name.as_str()).collect();
    if names.is_empty() {
        "no single client".to_string()
    } else {
        names.join(", ")
    }
}

fn first_churn_reason(driver: &Driver) -> Option<&str> {
    driver.client_details.iter().find_map(|d| match &d.breakdown {
        DetailBreakdown::Churn { churn_reason } => Some(churn_reason.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build_bridge_steps, ClientDetail};

    fn churn_row(name: &str, variance: f64, reason: &str) -> ClientDetail {
        ClientDetail {
            client_name: name.into(),
            plan_value: 1_000.0,
            actual_value: 1_000.0 + variance,
            variance,
            variance_pct: variance / 1_000.0,
            breakdown: DetailBreakdown::Churn { churn_reason: reason.into() },
        }
    }

    fn residual_row(name: &str, variance: f64) -> ClientDetail {
        ClientDetail {
            client_name: name.into(),
            plan_value: 1_000.0,
            actual_value: 1_000.0 + variance,
            variance,
            variance_pct: variance / 1_000.0,
            breakdown: DetailBreakdown::Residual,
        }
    }

    fn timing_row(name: &str, variance: f64, days_delay: i64) -> ClientDetail {
        let plan_date = chrono::NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        ClientDetail {
            client_name: name.into(),
            plan_value: 1_000.0,
            actual_value: 1_000.0 + variance,
            variance,
            variance_pct: variance / 1_000.0,
            breakdown: DetailBreakdown::Timing {
                plan_date,
                actual_date: plan_date + chrono::Duration::days(days_delay),
                days_delay,
            },
        }
    }

    fn model_with(values: [f64; 6], plan_delay: f64, actual_delay: f64) -> PeriodDataModel {
        let drivers: Vec<Driver> = DriverKind::ALL
            .iter()
            .zip(values)
            .map(|(kind, value)| {
                let details = match kind {
                    DriverKind::Timing => vec![
                        timing_row("Initech", value * 0.4, 3),
                        timing_row("Umbrella", value * 0.3, 0),
                        timing_row("Hooli", value * 0.2, -2),
                        timing_row("Vandelay", value * 0.1, 5),
                    ],
                    DriverKind::Churn => vec![
                        churn_row("Acme", value / 2.0, "Budget cuts"),
                        churn_row("Globex", value / 2.0, "Moved to competitor"),
                    ],
                    _ => vec![
                        residual_row("Initech", value * 0.6),
                        residual_row("Umbrella", value * 0.3),
                        residual_row("Hooli", value * 0.1),
                        residual_row("Vandelay", 0.0),
                    ],
                };
                Driver::new(*kind, value, String::new(), details)
            })
            .collect();
        let variance: f64 = values.iter().sum();
        let plan = 1_000_000.0;
        PeriodDataModel {
            plan_revenue: plan,
            actual_revenue: plan + variance,
            variance,
            variance_pct: variance / plan,
            plan_delay,
            actual_delay,
            plan_fx: 1.0,
            actual_fx: 1.02,
            bridge_steps: build_bridge_steps(plan, plan + variance, &drivers, 1.0),
            drivers,
            insights: Vec::new(),
        }
    }

    #[test]
    fn every_model_gets_three_of_each_polarity() {
        let model = model_with([50_000.0, 30_000.0, 20_000.0, -20_000.0, 10_000.0, 1_000.0], 0.08, 0.05);
        let insights = synthesize(&model);
        let pos = insights.iter().filter(|i| i.polarity == Polarity::Positive).count();
        let neg = insights.iter().filter(|i| i.polarity == Polarity::Negative).count();
        assert!(pos >= MIN_PER_POLARITY, "only {pos} positive insights");
        assert!(neg >= MIN_PER_POLARITY, "only {neg} negative insights");
    }

    #[test]
    fn volume_gain_names_the_top_three_clients() {
        let model = model_with([50_000.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0.08, 0.08);
        let insights = synthesize(&model);
        let volume = insights
            .iter()
            .find(|i| i.text.starts_with("Transaction volume ran"))
            .expect("volume insight present");
        assert_eq!(volume.polarity, Polarity::Positive);
        assert!(volume.text.ends_with("led by Initech, Umbrella, Hooli."), "{}", volume.text);
    }

    #[test]
    fn churn_loss_cites_the_first_reason() {
        let model = model_with([0.0, 0.0, 0.0, -40_000.0, 0.0, 0.0], 0.08, 0.08);
        let insights = synthesize(&model);
        let churn = insights
            .iter()
            .find(|i| i.text.starts_with("Unplanned churn"))
            .expect("churn insight present");
        assert_eq!(churn.polarity, Polarity::Negative);
        assert!(churn.text.contains("budget cuts"), "{}", churn.text);
    }

    fn texts_of(insights: &[Insight], polarity: Polarity) -> Vec<&str> {
        insights.iter().filter(|i| i.polarity == polarity).map(|i| i.text.as_str()).collect()
    }

    #[test]
    fn timing_loss_is_negative_even_when_slip_beat_plan() {
        let model = model_with([0.0, 0.0, -78_600.0, 0.0, 0.0, 0.0], 0.0621, 0.0566);
        let insights = synthesize(&model);
        let negative = texts_of(&insights, Polarity::Negative);
        let positive = texts_of(&insights, Polarity::Positive);
        assert!(
            negative.contains(&"Implementation delays pushed $78.6k of recognition into future periods."),
            "{negative:?}"
        );
        assert!(positive.iter().all(|t| !t.starts_with("Implementation acceleration")), "{positive:?}");
        assert!(positive.contains(&"Implementation slip of 5.7% came in under the 6.2% planned."), "{positive:?}");
    }

    #[test]
    fn timing_gain_is_positive_even_when_slip_overran() {
        let model = model_with([0.0, 0.0, 12_000.0, 0.0, 0.0, 0.0], 0.07, 0.12);
        let insights = synthesize(&model);
        assert!(texts_of(&insights, Polarity::Positive)
            .contains(&"Implementation acceleration pulled $12.0k of recognition into the period."));
        assert!(texts_of(&insights, Polarity::Negative)
            .contains(&"Implementation slip of 12.0% significantly exceeded the 7.0% planned."));
    }

    #[test]
    fn modest_overrun_says_nothing_about_delay() {
        // 0.09 is above plan but within the 1.2x overrun band.
        let model = model_with([0.0, 0.0, 0.0, 0.0, 0.0, 0.0], 0.08, 0.09);
        let insights = synthesize(&model);
        assert!(insights.iter().all(|i| !i.text.starts_with("Implementation slip")));
    }

    #[test]
    fn on_time_clients_are_counted() {
        let model = model_with([0.0, 0.0, -10_000.0, 0.0, 0.0, 0.0], 0.08, 0.08);
        let insights = synthesize(&model);
        assert!(texts_of(&insights, Polarity::Positive)
            .contains(&"2 clients went live on time or ahead of schedule."));

        let mut late = model.clone();
        for row in &mut late.drivers[2].client_details {
            if let DetailBreakdown::Timing { days_delay, .. } = &mut row.breakdown {
                *days_delay = 4;
            }
        }
        late.drivers[2].client_details[1].breakdown = DetailBreakdown::Timing {
            plan_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            actual_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(),
            days_delay: 0,
        };
        assert!(texts_of(&synthesize(&late), Polarity::Positive)
            .contains(&"1 client went live on time or ahead of schedule."));
    }

    #[test]
    fn no_on_time_insight_when_every_client_slipped() {
        let mut model = model_with([0.0, 0.0, -10_000.0, 0.0, 0.0, 0.0], 0.08, 0.08);
        for row in &mut model.drivers[2].client_details {
            if let DetailBreakdown::Timing { days_delay, .. } = &mut row.breakdown {
                *days_delay = 7;
            }
        }
        assert!(synthesize(&model).iter().all(|i| !i.text.contains("went live on time")));
    }

    #[test]
    fn small_fx_losses_are_immaterial() {
        // Plan is 1M, so the threshold is 20k.
        let small = synthesize(&model_with([0.0, 0.0, 0.0, 0.0, -15_000.0, 0.0], 0.08, 0.08));
        assert!(small.iter().all(|i| !i.text.contains("headwind")));

        let large = synthesize(&model_with([0.0, 0.0, 0.0, 0.0, -25_000.0, 0.0], 0.08, 0.08));
        assert!(texts_of(&large, Polarity::Negative)
            .contains(&"FX was a $25.0k headwind (rate 1.0200 vs 1.0000 plan)."));

        let gain = synthesize(&model_with([0.0, 0.0, 0.0, 0.0, 5_000.0, 0.0], 0.08, 0.08));
        assert!(gain.iter().any(|i| i.polarity == Polarity::Positive && i.text.contains("tailwind")));
    }

    #[test]
    fn price_is_stated_as_share_of_plan() {
        let up = synthesize(&model_with([0.0, 30_000.0, 0.0, 0.0, 0.0, 0.0], 0.08, 0.08));
        assert!(texts_of(&up, Polarity::Positive)
            .contains(&"Realized pricing and mix ran 3.0% of plan above the rate card."));

        let down = synthesize(&model_with([0.0, -13_000.0, 0.0, 0.0, 0.0, 0.0], 0.08, 0.08));
        assert!(texts_of(&down, Polarity::Negative)
            .contains(&"Price concessions and mix cost 1.3% of plan against the rate card."));
    }

    #[test]
    fn rules_run_in_evaluation_order() {
        let model = model_with([50_000.0, 30_000.0, 20_000.0, -20_000.0, 30_000.0, 1_000.0], 0.08, 0.05);
        let insights = synthesize(&model);
        let position = |prefix: &str| {
            insights
                .iter()
                .position(|i| i.text.starts_with(prefix))
                .unwrap_or_else(|| panic!("no insight starting with {prefix:?}"))
        };
        let order = [
            position("Recognized revenue"),
            position("Transaction volume"),
            position("Realized pricing"),
            position("Implementation acceleration"),
            position("Implementation slip"),
            position("2 clients went live"),
            position("Unplanned churn"),
            position("FX was"),
            position("Modeled drivers"),
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]), "{order:?}");
    }

    #[test]
    fn rule_output_precedes_filler() {
        let model = model_with([50_000.0, 30_000.0, 0.0, 0.0, 0.0, 0.0], 0.08, 0.08);
        let insights = synthesize(&model);
        let first_filler = insights
            .iter()
            .position(|i| POSITIVE_FILLER.contains(&i.text.as_str()) || NEGATIVE_FILLER.contains(&i.text.as_str()))
            .expect("some filler needed");
        assert!(insights[first_filler..]
            .iter()
            .all(|i| POSITIVE_FILLER.contains(&i.text.as_str()) || NEGATIVE_FILLER.contains(&i.text.as_str())));
    }

    #[test]
    fn padding_never_exceeds_filler_list() {
        let mut insights = Vec::new();
        pad_with_filler(&mut insights);
        assert_eq!(insights.len(), 2 * MIN_PER_POLARITY);
        assert_eq!(insights[0].text, POSITIVE_FILLER[0]);
        assert_eq!(insights[MIN_PER_POLARITY].text, NEGATIVE_FILLER[0]);

        let mut full: Vec<Insight> = (0..5).map(|i| Insight::positive(format!("p{i}"))).collect();
        full.extend((0..5).map(|i| Insight::negative(format!("n{i}"))));
        pad_with_filler(&mut full);
        assert_eq!(full.len(), 10, "no filler when both polarities are covered");
    }

    #[test]
    fn padding_continues_from_existing_count() {
        let mut insights = vec![Insight::positive("rule"), Insight::negative("a"), Insight::negative("b")];
        pad_with_filler(&mut insights);
        let positive = texts_of(&insights, Polarity::Positive);
        assert_eq!(positive, vec!["rule", POSITIVE_FILLER[1], POSITIVE_FILLER[2]]);
        let negative = texts_of(&insights, Polarity::Negative);
        assert_eq!(negative, vec!["a", "b", NEGATIVE_FILLER[2]]);
    }
}
