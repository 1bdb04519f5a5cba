//! bridge-runner: headless revenue variance bridge for one period.
//!
//! Usage:
//!   bridge-runner --period 2025-06 --segment existing-clients --view monthly
//!   bridge-runner --view quarterly-cumulative --seed FP&A-bridge --json
//!   bridge-runner --config data/generator_config.json

use anyhow::{Context, Result};
use bridge_core::{
    format::{
        format_count, format_count_change, format_money, format_pct, format_price, format_rate,
        format_rate_change, format_signed_money,
    },
    report, BridgeEngine, ClientDetail, DetailBreakdown, PeriodDataModel, PeriodKey, Segment, ViewType,
    DEFAULT_SEED,
};
use serde::Serialize;
use std::env;

const TOP_CLIENTS: usize = 3;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Request<'a> {
    period: PeriodKey,
    segment: Segment,
    view: ViewType,
    seed: &'a str,
}

#[derive(Serialize)]
struct Envelope<'a> {
    request: Request<'a>,
    model: &'a PeriodDataModel,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let period = match flag_value(&args, "--period") {
        Some(raw) => raw.parse::<PeriodKey>().with_context(|| format!("--period {raw}"))?,
        None => PeriodKey::from_date(chrono::Local::now().date_naive()),
    };
    let segment = parse_arg(&args, "--segment", Segment::ExistingClients)?;
    let view = parse_arg(&args, "--view", ViewType::Monthly)?;
    let seed = flag_value(&args, "--seed").unwrap_or(DEFAULT_SEED);
    let json = args.iter().any(|a| a == "--json");

    let engine = BridgeEngine::build(flag_value(&args, "--config"))?;
    log::info!("generating {view} bridge for {period}/{segment} (seed {seed:?})");
    let model = engine.generate(period, segment, view, seed);

    if json {
        let envelope = Envelope { request: Request { period, segment, view, seed }, model: &model };
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    } else {
        print_dashboard(&model, period, segment, view, seed);
    }
    Ok(())
}

fn print_dashboard(model: &PeriodDataModel, period: PeriodKey, segment: Segment, view: ViewType, seed: &str) {
    println!("Revenue variance bridge");
    println!("  period:   {} ({period})", period.label());
    println!("  segment:  {}", segment.label());
    println!("  view:     {view}");
    println!("  seed:     {seed}");
    println!();

    println!("=== KPIs ===");
    for card in report::kpi_cards(model) {
        let marker = match card.favourable {
            Some(true) => "+",
            Some(false) => "-",
            None => " ",
        };
        println!("  {marker} {:<28} {:>12}  {}", card.label, card.value, card.caption);
    }
    println!();

    println!("=== BRIDGE ===");
    for bar in report::waterfall(&model.bridge_steps) {
        let shown = if bar.is_total { format_money(bar.value) } else { format_signed_money(bar.value) };
        println!("  {:<8} {:>12}   {} -> {}", bar.label, shown, format_money(bar.start), format_money(bar.end));
    }
    println!();

    println!("=== DRIVERS (by impact) ===");
    for c in report::rank_drivers(model) {
        println!("  {:<24} {:>12} {:>7}  {}", c.name, format_signed_money(c.value), format_pct(c.share), c.note);
    }
    println!(
        "  residual is {} of total variance (ideally small)",
        format_pct(report::residual_share(model))
    );
    println!();

    println!("=== TOP CLIENTS ===");
    for driver in &model.drivers {
        let table = report::detail_table(driver);
        println!("  {} ({} clients, {})", driver.name, table.rows.len(), format_signed_money(table.total_variance));
        for row in table.rows.iter().take(TOP_CLIENTS) {
            println!("    {:<36} {:>12}  {}", row.client_name, format_signed_money(row.variance), describe(row));
        }
        if let Some((plan, actual)) = table.volume_totals {
            println!("    transactions: {} plan, {} actual", format_count(plan), format_count(actual));
        }
    }
    println!();

    let (positive, negative) = report::split_insights(model);
    println!("=== WHAT WENT WELL {} ===", view.period_label());
    for i in positive {
        println!("  + {}", i.text);
    }
    println!("=== WHAT TO WATCH {} ===", view.period_label());
    for i in negative {
        println!("  - {}", i.text);
    }
}

fn describe(row: &ClientDetail) -> String {
    match &row.breakdown {
        DetailBreakdown::Volume { plan_volume, actual_volume } => {
            format!("{} txns", format_count_change(actual_volume - plan_volume))
        }
        DetailBreakdown::Price { plan_price, actual_price } => {
            format!("{} -> {}", format_price(*plan_price), format_price(*actual_price))
        }
        DetailBreakdown::Timing { plan_date, actual_date, days_delay } => {
            format!("{plan_date} -> {actual_date} ({}, {days_delay}d)", report::timing_status(*days_delay))
        }
        DetailBreakdown::Churn { churn_reason } => churn_reason.clone(),
        DetailBreakdown::Fx { plan_rate, fx_rate, fx_change } => format!(
            "{} -> {} ({}, {})",
            format_rate(*plan_rate),
            format_rate(*fx_rate),
            format_rate_change(*fx_change),
            report::fx_direction(*fx_change)
        ),
        DetailBreakdown::Residual => String::new(),
    }
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

fn parse_arg<T>(args: &[String], flag: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match flag_value(args, flag) {
        Some(raw) => raw.parse().with_context(|| format!("{flag} {raw}")),
        None => Ok(default),
    }
}
