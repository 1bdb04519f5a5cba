//! Period aggregator: folds consecutive months into one cumulative model.
//!
//! RULES:
//!   - Plan and actual are summed; variance is recomputed from the sums,
//!     never summed on its own.
//!   - The Other driver is re-solved from the aggregated sums so the bridge
//!     identity survives aggregation.
//!   - Delay and FX scalars are not additive. The first period's values are
//!     carried through unchanged.

use crate::{
    error::{BridgeError, BridgeResult},
    model::{build_bridge_steps, ClientDetail, Driver, DriverKind, Insight, PeriodDataModel},
    numeric::safe_div,
};
use std::collections::HashSet;

/// Combine `periods` (newest first) into one cumulative model.
///
/// A single period is returned unchanged. Periods without drivers or bridge
/// steps are skipped; if none are left the result is a structural error.
pub fn aggregate(periods: &[PeriodDataModel]) -> BridgeResult<PeriodDataModel> {
    match periods {
        [] => return Err(BridgeError::EmptyAggregationInput),
        [single] => return Ok(single.clone()),
        _ => {}
    }

    let valid: Vec<(usize, &PeriodDataModel)> = periods
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.drivers.is_empty() && !p.bridge_steps.is_empty())
        .collect();
    if valid.len() < periods.len() {
        log::warn!(
            "aggregation skipped {} of {} periods with missing drivers or bridge steps",
            periods.len() - valid.len(),
            periods.len()
        );
    }
    let Some(&(_, first)) = valid.first() else {
        return Err(BridgeError::structural("no period had drivers and bridge steps"));
    };

    let plan_revenue: f64 = valid.iter().map(|(_, p)| p.plan_revenue).sum();
    let actual_revenue: f64 = valid.iter().map(|(_, p)| p.actual_revenue).sum();
    let variance = actual_revenue - plan_revenue;
    let variance_pct = safe_div(variance, plan_revenue);

    let mut drivers = Vec::with_capacity(DriverKind::ALL.len());
    let mut modeled = 0.0;
    for kind in DriverKind::ALL {
        let value = if kind == DriverKind::Other {
            variance - modeled
        } else {
            let v: f64 = valid.iter().map(|(_, p)| p.driver_value(kind)).sum();
            modeled += v;
            v
        };
        let note = first
            .driver(kind)
            .map(|d| format!("{} (cumulative, {} periods)", d.note, valid.len()))
            .unwrap_or_else(|| format!("Cumulative across {} periods", valid.len()));
        drivers.push(Driver::new(kind, value, note, merged_details(&valid, kind)));
    }

    let mut model = PeriodDataModel {
        plan_revenue,
        actual_revenue,
        variance,
        variance_pct,
        plan_delay: first.plan_delay,
        actual_delay: first.actual_delay,
        plan_fx: first.plan_fx,
        actual_fx: first.actual_fx,
        bridge_steps: build_bridge_steps(plan_revenue, actual_revenue, &drivers, first.plan_fx),
        drivers,
        insights: merge_insights(valid.iter().map(|(_, p)| *p)),
    };
    // Merged insights already satisfy the floor; this only matters when every
    // input arrived without insights.
    crate::insights::pad_with_filler(&mut model.insights);

    log::debug!(
        "aggregated {} periods: plan={:.0} actual={:.0}",
        valid.len(),
        model.plan_revenue,
        model.actual_revenue
    );
    Ok(model)
}

/// Concatenate one driver's rows across periods, tagging each client with
/// the month it came from: "Acme (M1)", "Acme (M2)", ...
fn merged_details(periods: &[(usize, &PeriodDataModel)], kind: DriverKind) -> Vec<ClientDetail> {
    periods
        .iter()
        .filter_map(|(index, p)| p.driver(kind).map(|d| (*index, d)))
        .flat_map(|(index, driver)| {
            driver
                .client_details
                .iter()
                .filter(|row| row.is_valid())
                .map(move |row| ClientDetail {
                    client_name: format!("{} (M{})", row.client_name, index + 1),
                    ..row.clone()
                })
        })
        .collect()
}

/// Union by exact text, first occurrence wins, encounter order kept.
fn merge_insights<'a>(periods: impl Iterator<Item = &'a PeriodDataModel>) -> Vec<Insight> {
    let mut seen = HashSet::new();
    periods
        .flat_map(|p| p.insights.iter())
        .filter(|i| seen.insert(i.text.clone()))
        .cloned()
        .collect()
}
