//! Bridge, detail-sum and range invariants across every view and segment.

use bridge_core::{
    generate_revenue_data, model::BRIDGE_STEP_COUNT, numeric::approx_eq, DriverKind, PeriodDataModel,
    PeriodKey, Polarity, Segment, ViewType,
};

const REL_TOL: f64 = 1e-6;
const SEEDS: [&str; 5] = ["FP&A-bridge", "test-seed", "alpha", "", "ünïcødé-😀"];
const PERIODS: [&str; 4] = ["2025-06", "2025-01", "2024-12", "1999-03"];

fn each_model(mut check: impl FnMut(&str, Segment, ViewType, &PeriodDataModel)) {
    for period in PERIODS {
        let key: PeriodKey = period.parse().unwrap();
        for segment in Segment::ALL {
            for view in ViewType::ALL {
                for seed in SEEDS {
                    let model = generate_revenue_data(key, segment, view, seed);
                    check(&format!("{period}/{segment}/{view}/{seed:?}"), segment, view, &model);
                }
            }
        }
    }
}

#[test]
fn plan_plus_drivers_equals_actual() {
    each_model(|ctx, _, _, m| {
        let sum: f64 = m.plan_revenue + m.drivers.iter().map(|d| d.value).sum::<f64>();
        assert!(
            approx_eq(sum, m.actual_revenue, REL_TOL),
            "{ctx}: plan + drivers = {sum:.4}, actual = {:.4}",
            m.actual_revenue
        );

        let steps = &m.bridge_steps;
        let stepped: f64 = steps[0].value + steps[1..BRIDGE_STEP_COUNT - 1].iter().map(|s| s.value).sum::<f64>();
        assert!(approx_eq(stepped, steps[BRIDGE_STEP_COUNT - 1].value, REL_TOL), "{ctx}: bridge steps do not close");
    });
}

#[test]
fn bridge_steps_mirror_drivers() {
    each_model(|ctx, _, _, m| {
        for (step, driver) in m.bridge_steps[1..7].iter().zip(&m.drivers) {
            assert_eq!(step.value, driver.value, "{ctx}: {} step/driver mismatch", step.label);
            assert_eq!(step.driver, Some(driver.kind));
            assert_eq!(step.client_details, driver.client_details);
        }
        assert_eq!(m.bridge_steps[0].plan_fx, Some(m.plan_fx), "{ctx}: Plan step lacks planFX");
        assert_eq!(m.bridge_steps[5].plan_fx, Some(m.plan_fx), "{ctx}: FX step lacks planFX");
    });
}

#[test]
fn client_details_sum_to_driver_value() {
    each_model(|ctx, _, _, m| {
        for d in &m.drivers {
            assert!(!d.client_details.is_empty(), "{ctx}: {} has no detail rows", d.name);
            assert!(
                approx_eq(d.detail_total(), d.value, REL_TOL),
                "{ctx}: {} rows sum to {:.6}, driver is {:.6}",
                d.name,
                d.detail_total(),
                d.value
            );
        }
    });
}

#[test]
fn headline_figures_stay_in_their_bands() {
    each_model(|ctx, segment, view, m| {
        let (plan_lo, plan_hi, band) = match segment {
            Segment::ExistingClients => (1_200_000.0, 1_800_000.0, 0.30),
            Segment::NewClients      => (400_000.0, 700_000.0, 0.25),
        };
        let months = view.period_count() as f64;
        assert!(
            m.plan_revenue >= plan_lo * months && m.plan_revenue <= plan_hi * months,
            "{ctx}: plan {} outside band",
            m.plan_revenue
        );
        assert!(m.variance_pct.abs() <= band + 1e-12, "{ctx}: variance pct {}", m.variance_pct);
        assert!((0.01..=0.20).contains(&m.plan_delay), "{ctx}: plan delay {}", m.plan_delay);
        assert!((0.01..=0.20).contains(&m.actual_delay), "{ctx}: actual delay {}", m.actual_delay);
        assert!((0.97..=1.05).contains(&m.plan_fx), "{ctx}: plan fx {}", m.plan_fx);
    });
}

#[test]
fn every_model_has_the_insight_floor() {
    each_model(|ctx, _, _, m| {
        let pos = m.insights_of(Polarity::Positive).count();
        let neg = m.insights_of(Polarity::Negative).count();
        assert!(pos >= 3 && neg >= 3, "{ctx}: {pos} positive / {neg} negative insights");
    });
}

#[test]
fn driver_order_is_fixed() {
    each_model(|ctx, _, _, m| {
        let kinds: Vec<DriverKind> = m.drivers.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, DriverKind::ALL.to_vec(), "{ctx}");
    });
}
