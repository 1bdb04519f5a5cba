//! The period data model: the single read-only structure handed to renderers.
//!
//! RULE: plan + Σ(driver values) == actual, for every model this crate
//! produces. The Other driver is always solved as the residual, never
//! sampled, so the identity holds by construction.

use crate::error::{BridgeError, BridgeResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const PLAN_LABEL: &str = "Plan";
pub const ACTUAL_LABEL: &str = "Actual";

/// Plan, six deltas, Actual.
pub const BRIDGE_STEP_COUNT: usize = DriverKind::ALL.len() + 2;

// ── Drivers ──────────────────────────────────────────────────────────────────

/// The six variance drivers, in bridge order.
/// NEVER reorder: the bridge, the aggregator and the insight rules all walk
/// this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    Volume,
    Price,
    Timing,
    Churn,
    Fx,
    Other,
}

impl DriverKind {
    pub const ALL: [DriverKind; 6] = [
        DriverKind::Volume,
        DriverKind::Price,
        DriverKind::Timing,
        DriverKind::Churn,
        DriverKind::Fx,
        DriverKind::Other,
    ];

    /// Name shown in the driver table.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Volume => "Volume",
            Self::Price  => "Price",
            Self::Timing => "Timing (implementation)",
            Self::Churn  => "Unknown churn",
            Self::Fx     => "FX",
            Self::Other  => "Other / residual",
        }
    }

    /// Short label shown under the waterfall bar.
    pub fn bridge_label(&self) -> &'static str {
        match self {
            Self::Volume => "Volume",
            Self::Price  => "Price",
            Self::Timing => "Timing",
            Self::Churn  => "Unknown churn",
            Self::Fx     => "FX",
            Self::Other  => "Other",
        }
    }

    /// One-line explanation for the drill-down modal.
    pub fn detail_blurb(&self) -> &'static str {
        match self {
            Self::Volume => "Transaction volume differences per client. Higher volume increases revenue, lower volume decreases it.",
            Self::Price  => "Price point differences per client. Price increases boost revenue, decreases reduce it.",
            Self::Timing => "Implementation timing differences. Delays push revenue recognition later, accelerations bring it forward.",
            Self::Churn  => "Clients that churned or downgraded, causing revenue loss.",
            Self::Fx     => "FX rate impact per client when converting local revenue to the reporting currency.",
            Self::Other  => "Residual variance distributed across clients.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub kind: DriverKind,
    pub name: String,
    pub value: f64,
    pub note: String,
    pub client_details: Vec<ClientDetail>,
}

impl Driver {
    pub fn new(kind: DriverKind, value: f64, note: String, client_details: Vec<ClientDetail>) -> Self {
        Self {
            kind,
            name: kind.name().to_string(),
            value,
            note,
            client_details,
        }
    }

    /// Σ client detail variances. Equals `value` for generated drivers.
    pub fn detail_total(&self) -> f64 {
        self.client_details.iter().map(|d| d.variance).sum()
    }
}

// ── Client detail rows ───────────────────────────────────────────────────────

/// Part of one driver's value attributed to one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    pub client_name: String,
    pub plan_value: f64,
    pub actual_value: f64,
    /// Revenue impact. Always revenue, even on volume rows.
    pub variance: f64,
    pub variance_pct: f64,
    #[serde(flatten)]
    pub breakdown: DetailBreakdown,
}

impl ClientDetail {
    /// Rows with a blank name or a non-finite variance are dropped by
    /// aggregation and by the drill-down table.
    pub fn is_valid(&self) -> bool {
        !self.client_name.trim().is_empty() && self.variance.is_finite()
    }
}

/// Driver-specific fields of a detail row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "detailKind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DetailBreakdown {
    Volume {
        plan_volume:   i64,
        actual_volume: i64,
    },
    Price {
        plan_price:   f64,
        actual_price: f64,
    },
    Timing {
        plan_date:   NaiveDate,
        actual_date: NaiveDate,
        days_delay:  i64,
    },
    Churn {
        churn_reason: String,
    },
    Fx {
        plan_rate: f64,
        fx_rate:   f64,
        fx_change: f64,
    },
    Residual,
}

// ── Bridge steps ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Total,
    Delta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeStep {
    pub label: String,
    pub kind: StepKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver: Option<DriverKind>,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub client_details: Vec<ClientDetail>,
    #[serde(default, rename = "planFX", skip_serializing_if = "Option::is_none")]
    pub plan_fx: Option<f64>,
}

impl BridgeStep {
    fn total(label: &str, value: f64, plan_fx: Option<f64>) -> Self {
        Self {
            label: label.to_string(),
            kind: StepKind::Total,
            driver: None,
            value,
            client_details: Vec::new(),
            plan_fx,
        }
    }

    fn delta(driver: &Driver, plan_fx: f64) -> Self {
        Self {
            label: driver.kind.bridge_label().to_string(),
            kind: StepKind::Delta,
            driver: Some(driver.kind),
            value: driver.value,
            client_details: driver.client_details.clone(),
            plan_fx: (driver.kind == DriverKind::Fx).then_some(plan_fx),
        }
    }
}

/// Assemble the waterfall in fixed order: Plan, the six drivers, Actual.
/// The FX detail view needs the plan rate, so Plan and FX carry it.
pub fn build_bridge_steps(plan: f64, actual: f64, drivers: &[Driver], plan_fx: f64) -> Vec<BridgeStep> {
    let mut steps = Vec::with_capacity(BRIDGE_STEP_COUNT);
    steps.push(BridgeStep::total(PLAN_LABEL, plan, Some(plan_fx)));
    steps.extend(drivers.iter().map(|d| BridgeStep::delta(d, plan_fx)));
    steps.push(BridgeStep::total(ACTUAL_LABEL, actual, None));
    steps
}

// ── Insights ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub polarity: Polarity,
    pub text: String,
}

impl Insight {
    pub fn positive(text: impl Into<String>) -> Self {
        Self { polarity: Polarity::Positive, text: text.into() }
    }

    pub fn negative(text: impl Into<String>) -> Self {
        Self { polarity: Polarity::Negative, text: text.into() }
    }
}

// ── PeriodDataModel ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDataModel {
    pub plan_revenue: f64,
    pub actual_revenue: f64,
    pub variance: f64,
    pub variance_pct: f64,
    pub plan_delay: f64,
    pub actual_delay: f64,
    #[serde(rename = "planFX")]
    pub plan_fx: f64,
    #[serde(rename = "actualFX")]
    pub actual_fx: f64,
    pub drivers: Vec<Driver>,
    pub bridge_steps: Vec<BridgeStep>,
    pub insights: Vec<Insight>,
}

impl PeriodDataModel {
    pub fn driver(&self, kind: DriverKind) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.kind == kind)
    }

    /// Value of a driver, 0.0 if absent.
    pub fn driver_value(&self, kind: DriverKind) -> f64 {
        self.driver(kind).map_or(0.0, |d| d.value)
    }

    /// plan + Σ drivers − actual. Zero up to float rounding.
    pub fn bridge_gap(&self) -> f64 {
        let drivers: f64 = self.drivers.iter().map(|d| d.value).sum();
        self.plan_revenue + drivers - self.actual_revenue
    }

    pub fn insights_of(&self, polarity: Polarity) -> impl Iterator<Item = &Insight> {
        self.insights.iter().filter(move |i| i.polarity == polarity)
    }

    /// Check the shape renderers rely on: six drivers in bridge order, eight
    /// bridge steps bracketed by Plan and Actual, finite headline totals.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.drivers.len() != DriverKind::ALL.len() {
            return Err(BridgeError::structural(format!(
                "expected {} drivers, found {}",
                DriverKind::ALL.len(),
                self.drivers.len()
            )));
        }
        if let Some((i, d)) = self
            .drivers
            .iter()
            .enumerate()
            .find(|(i, d)| d.kind != DriverKind::ALL[*i])
        {
            return Err(BridgeError::structural(format!(
                "driver {i} is {:?}, expected {:?}",
                d.kind,
                DriverKind::ALL[i]
            )));
        }
        if self.bridge_steps.len() != BRIDGE_STEP_COUNT {
            return Err(BridgeError::structural(format!(
                "expected {BRIDGE_STEP_COUNT} bridge steps, found {}",
                self.bridge_steps.len()
            )));
        }
        let first = &self.bridge_steps[0];
        let last = &self.bridge_steps[BRIDGE_STEP_COUNT - 1];
        if first.label != PLAN_LABEL || last.label != ACTUAL_LABEL {
            return Err(BridgeError::structural(format!(
                "bridge must run {PLAN_LABEL} -> {ACTUAL_LABEL}, got {} -> {}",
                first.label, last.label
            )));
        }
        if !self.plan_revenue.is_finite() || !self.actual_revenue.is_finite() {
            return Err(BridgeError::structural("non-finite plan or actual revenue"));
        }
        Ok(())
    }
}
