//! Single-period generator: one month of synthetic plan-vs-actual revenue.
//!
//! DRAW ORDER (fixed, never reordered; changing it changes every output):
//!   1. plan revenue
//!   2. variance percentage
//!   3. plan delay, delay drift
//!   4. plan FX, actual FX multiplier
//!   5. driver shares: volume, price, timing, churn, fx
//!   6. client detail rows, driver by driver in bridge order
//!
//! The Other driver is solved as the residual after step 5.

use crate::{
    client_names::select_distinct,
    config::{GeneratorConfig, SegmentProfile},
    format::{format_pct, format_rate},
    insights,
    model::{build_bridge_steps, ClientDetail, DetailBreakdown, Driver, DriverKind, PeriodDataModel},
    numeric::{finite_or, round_count, safe_div},
    rng::{period_seed_string, PeriodRng},
    types::{PeriodKey, Segment},
};
use chrono::{Duration, NaiveDate};

/// Days in a month used to convert a relative revenue slip into a date shift.
const DAYS_PER_MONTH: f64 = 30.0;
/// Plan go-live dates fall on one of the first 28 days of the month.
const PLAN_DAY_SPREAD: usize = 28;

/// Period-level values every detail row may need.
struct PeriodContext {
    month_start:  NaiveDate,
    plan_revenue: f64,
    plan_delay:   f64,
    actual_delay: f64,
    plan_fx:      f64,
    actual_fx:    f64,
}

pub struct PeriodGenerator<'a> {
    config: &'a GeneratorConfig,
}

impl<'a> PeriodGenerator<'a> {
    pub fn new(config: &'a GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generate the month `period` shifted by `offset` months.
    ///
    /// The stream is seeded from `seed|<shifted key>|<segment>|<offset>`, so
    /// the same tuple always reproduces the same model.
    pub fn generate(&self, period: PeriodKey, segment: Segment, seed: &str, offset: i32) -> PeriodDataModel {
        let effective = period.shift(offset);
        let seed_string = period_seed_string(seed, &effective.to_string(), segment.id(), offset);
        let mut rng = PeriodRng::from_seed_string(&seed_string);
        let profile = self.config.profile(segment);

        // Headline revenue.
        let plan_revenue = profile.plan_revenue.sample(&mut rng);
        let drawn_pct = rng.uniform(-profile.variance_band, profile.variance_band);
        let actual_revenue = plan_revenue * (1.0 + drawn_pct);
        let variance = actual_revenue - plan_revenue;
        let variance_pct = safe_div(variance, plan_revenue);

        // Implementation delay, clamped without panicking on a bad config.
        let delay = &self.config.delay;
        let plan_delay = delay.plan_delay.sample(&mut rng);
        let actual_delay = (plan_delay + rng.uniform(-delay.drift, delay.drift))
            .max(delay.floor)
            .min(delay.ceiling);

        let plan_fx = self.config.fx.plan_rate.sample(&mut rng);
        let actual_fx = plan_fx * self.config.fx.actual_multiplier.sample(&mut rng);

        // Sampled drivers, then the residual.
        let shares = &profile.driver_shares;
        let volume = variance * shares.volume.sample(&mut rng);
        let price  = variance * shares.price.sample(&mut rng);
        let timing = variance * shares.timing.sample(&mut rng);
        let churn  = variance * shares.churn.sample(&mut rng);
        let fx     = variance * shares.fx.sample(&mut rng);
        let other  = variance - (volume + price + timing + churn + fx);

        let ctx = PeriodContext {
            month_start: effective.first_day().unwrap_or_default(),
            plan_revenue,
            plan_delay,
            actual_delay,
            plan_fx,
            actual_fx,
        };

        let mut drivers = Vec::with_capacity(DriverKind::ALL.len());
        for (kind, value) in DriverKind::ALL.into_iter().zip([volume, price, timing, churn, fx, other]) {
            let details = self.client_details(&mut rng, profile, kind, value, &ctx);
            drivers.push(Driver::new(kind, value, driver_note(kind, &ctx), details));
        }

        let mut model = PeriodDataModel {
            plan_revenue,
            actual_revenue,
            variance,
            variance_pct,
            plan_delay,
            actual_delay,
            plan_fx,
            actual_fx,
            bridge_steps: build_bridge_steps(plan_revenue, actual_revenue, &drivers, plan_fx),
            drivers,
            insights: Vec::new(),
        };
        model.insights = insights::synthesize(&model);

        log::debug!(
            "period={effective} segment={segment} offset={offset} seed={:#010x} plan={plan_revenue:.0} actual={actual_revenue:.0}",
            rng.seed
        );
        model
    }

    /// Spread `value` across 6–8 distinct clients. Every non-final row takes a
    /// sampled share of the value; the final row takes the exact remainder.
    fn client_details(
        &self,
        rng: &mut PeriodRng,
        profile: &SegmentProfile,
        kind: DriverKind,
        value: f64,
        ctx: &PeriodContext,
    ) -> Vec<ClientDetail> {
        let d = &self.config.details;
        let rows = rng.range_inclusive(d.min_rows, d.max_rows).max(1);
        let names = select_distinct(rng, &profile.client_pool, rows);
        let baseline = safe_div(ctx.plan_revenue, rows as f64);

        let mut details = Vec::with_capacity(rows);
        let mut remaining = value;
        for (i, client_name) in names.into_iter().enumerate() {
            let variance = if i + 1 == rows {
                remaining
            } else {
                let portion = value * d.row_share.sample(rng);
                remaining -= portion;
                portion
            };
            let client_plan = baseline * d.client_weight.sample(rng);
            details.push(self.detail_row(rng, kind, client_name, client_plan, variance, ctx));
        }
        details
    }

    fn detail_row(
        &self,
        rng: &mut PeriodRng,
        kind: DriverKind,
        client_name: String,
        client_plan: f64,
        variance: f64,
        ctx: &PeriodContext,
    ) -> ClientDetail {
        let d = &self.config.details;
        let variance_pct = safe_div(variance, client_plan);
        let actual_value = finite_or(client_plan + variance, client_plan);

        let breakdown = match kind {
            DriverKind::Volume => {
                // Back-solve transaction counts from an approximate revenue per unit.
                let unit_revenue = d.unit_revenue.sample(rng);
                DetailBreakdown::Volume {
                    plan_volume:   round_count(safe_div(client_plan, unit_revenue)).max(0),
                    actual_volume: round_count(safe_div(actual_value, unit_revenue)).max(0),
                }
            }
            DriverKind::Price => {
                let plan_price = d.unit_price.sample(rng);
                DetailBreakdown::Price {
                    plan_price,
                    actual_price: finite_or(plan_price * (1.0 + variance_pct), plan_price),
                }
            }
            DriverKind::Timing => {
                let offset_days = rng.index_below(PLAN_DAY_SPREAD) as i64;
                let plan_date = shift_date(ctx.month_start, offset_days);
                let max_shift = d.max_days_shift.abs();
                // Revenue lost to timing means the client went live late.
                let days_delay = round_count(-variance_pct * DAYS_PER_MONTH).clamp(-max_shift, max_shift);
                DetailBreakdown::Timing {
                    plan_date,
                    actual_date: shift_date(plan_date, days_delay),
                    days_delay,
                }
            }
            DriverKind::Churn => {
                let churn_reason = if d.churn_reasons.is_empty() {
                    "Unspecified".to_string()
                } else {
                    d.churn_reasons[rng.index_below(d.churn_reasons.len())].clone()
                };
                DetailBreakdown::Churn { churn_reason }
            }
            DriverKind::Fx => {
                let fx_rate = finite_or(ctx.actual_fx * self.config.fx.client_jitter.sample(rng), ctx.plan_fx);
                DetailBreakdown::Fx {
                    plan_rate: ctx.plan_fx,
                    fx_rate,
                    fx_change: fx_rate - ctx.plan_fx,
                }
            }
            DriverKind::Other => DetailBreakdown::Residual,
        };

        ClientDetail {
            client_name,
            plan_value: client_plan,
            actual_value,
            variance,
            variance_pct,
            breakdown,
        }
    }
}

fn shift_date(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days)).unwrap_or(date)
}

fn driver_note(kind: DriverKind, ctx: &PeriodContext) -> String {
    match kind {
        DriverKind::Volume => "Transaction volume vs plan across active clients".to_string(),
        DriverKind::Price  => "Realized price and mix vs plan rate card".to_string(),
        DriverKind::Timing => format!(
            "Implementation slip {} vs plan {}",
            format_pct(ctx.actual_delay),
            format_pct(ctx.plan_delay)
        ),
        DriverKind::Churn  => "Unplanned churn and downgrades".to_string(),
        DriverKind::Fx     => format!(
            "FX {} vs plan {}",
            format_rate(ctx.actual_fx),
            format_rate(ctx.plan_fx)
        ),
        DriverKind::Other  => "Residual not explained by modeled drivers".to_string(),
    }
}
