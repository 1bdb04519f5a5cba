use crate::client_names::ClientDirectory;
use crate::error::{BridgeError, BridgeResult};
use crate::rng::PeriodRng;
use crate::types::Segment;
use serde::{Deserialize, Serialize};

/// A closed-open sampling interval `[min, max)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

impl Band {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut PeriodRng) -> f64 {
        rng.uniform(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, name: &str) -> BridgeResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(BridgeError::InvalidConfig(format!(
                "{name}: band [{}, {}] is inverted or non-finite",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

// ── Segment profiles ───────────────────────────────────────────────

/// Fractions of the headline variance assigned to each sampled driver.
/// The residual is never sampled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverShares {
    pub volume: Band,
    pub price:  Band,
    pub timing: Band,
    pub churn:  Band,
    pub fx:     Band,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentProfile {
    pub label: String,
    pub plan_revenue: Band,
    /// Symmetric half-width of the variance percentage draw.
    pub variance_band: f64,
    pub driver_shares: DriverShares,
    pub client_pool: Vec<String>,
}

// ── Timing, FX and detail rows ─────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    pub plan_delay: Band,
    /// Actual delay = plan delay + U(-drift, drift), then clamped.
    pub drift: f64,
    pub floor: f64,
    pub ceiling: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxConfig {
    pub plan_rate: Band,
    /// Multiplier applied to the plan rate to get the actual rate.
    pub actual_multiplier: Band,
    /// Per-client jitter around the actual rate.
    pub client_jitter: Band,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailConfig {
    pub min_rows: usize,
    pub max_rows: usize,
    /// Share of the driver value taken by each non-final row.
    pub row_share: Band,
    /// Client plan baseline = plan revenue / rows × weight.
    pub client_weight: Band,
    pub unit_revenue: Band,
    pub unit_price: Band,
    pub max_days_shift: i64,
    pub churn_reasons: Vec<String>,
}

// ── Top-level config ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub existing_clients: SegmentProfile,
    pub new_clients: SegmentProfile,
    pub delay: DelayConfig,
    pub fx: FxConfig,
    pub details: DetailConfig,
}

impl GeneratorConfig {
    /// Load from a JSON file, e.g. `data/generator_config.json`.
    /// In tests, use `GeneratorConfig::default()`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: GeneratorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Loaded generator config from {path}");
        Ok(config)
    }

    pub fn profile(&self, segment: Segment) -> &SegmentProfile {
        match segment {
            Segment::ExistingClients => &self.existing_clients,
            Segment::NewClients      => &self.new_clients,
        }
    }

    pub fn validate(&self) -> BridgeResult<()> {
        for segment in Segment::ALL {
            let p = self.profile(segment);
            let id = segment.id();
            p.plan_revenue.check(&format!("{id}.plan_revenue"))?;
            if p.plan_revenue.min <= 0.0 {
                return Err(BridgeError::InvalidConfig(format!("{id}.plan_revenue must be positive")));
            }
            if !(0.0..1.0).contains(&p.variance_band) {
                return Err(BridgeError::InvalidConfig(format!("{id}.variance_band must be in [0, 1)")));
            }
            let s = &p.driver_shares;
            s.volume.check(&format!("{id}.driver_shares.volume"))?;
            s.price.check(&format!("{id}.driver_shares.price"))?;
            s.timing.check(&format!("{id}.driver_shares.timing"))?;
            s.churn.check(&format!("{id}.driver_shares.churn"))?;
            s.fx.check(&format!("{id}.driver_shares.fx"))?;
            if p.client_pool.len() < self.details.max_rows {
                return Err(BridgeError::InvalidConfig(format!(
                    "{id}.client_pool has {} names, need at least {}",
                    p.client_pool.len(),
                    self.details.max_rows
                )));
            }
        }

        let d = &self.delay;
        d.plan_delay.check("delay.plan_delay")?;
        if d.floor > d.ceiling || d.drift < 0.0 {
            return Err(BridgeError::InvalidConfig("delay: floor above ceiling or negative drift".into()));
        }

        self.fx.plan_rate.check("fx.plan_rate")?;
        self.fx.actual_multiplier.check("fx.actual_multiplier")?;
        self.fx.client_jitter.check("fx.client_jitter")?;

        let r = &self.details;
        if r.min_rows == 0 || r.min_rows > r.max_rows {
            return Err(BridgeError::InvalidConfig(format!(
                "details: row range {}..={} is empty",
                r.min_rows, r.max_rows
            )));
        }
        r.row_share.check("details.row_share")?;
        r.client_weight.check("details.client_weight")?;
        r.unit_revenue.check("details.unit_revenue")?;
        r.unit_price.check("details.unit_price")?;
        if r.churn_reasons.is_empty() {
            return Err(BridgeError::InvalidConfig("details.churn_reasons is empty".into()));
        }
        Ok(())
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            existing_clients: SegmentProfile {
                label: Segment::ExistingClients.label().into(),
                plan_revenue: Band::new(1_200_000.0, 1_800_000.0),
                variance_band: 0.30,
                driver_shares: DriverShares {
                    volume: Band::new(0.25, 0.45),
                    price:  Band::new(0.20, 0.38),
                    timing: Band::new(0.15, 0.30),
                    churn:  Band::new(-0.30, -0.10),
                    fx:     Band::new(0.10, 0.20),
                },
                client_pool: ClientDirectory::default_pool(Segment::ExistingClients),
            },
            new_clients: SegmentProfile {
                label: Segment::NewClients.label().into(),
                plan_revenue: Band::new(400_000.0, 700_000.0),
                variance_band: 0.25,
                driver_shares: DriverShares {
                    volume: Band::new(0.35, 0.55),
                    price:  Band::new(0.22, 0.40),
                    timing: Band::new(0.15, 0.30),
                    churn:  Band::new(-0.05, 0.0),
                    fx:     Band::new(0.08, 0.16),
                },
                client_pool: ClientDirectory::default_pool(Segment::NewClients),
            },
            delay: DelayConfig {
                plan_delay: Band::new(0.06, 0.10),
                drift: 0.06,
                floor: 0.01,
                ceiling: 0.20,
            },
            fx: FxConfig {
                plan_rate: Band::new(0.97, 1.05),
                actual_multiplier: Band::new(0.94, 1.06),
                client_jitter: Band::new(0.99, 1.01),
            },
            details: DetailConfig {
                min_rows: 6,
                max_rows: 8,
                row_share: Band::new(0.10, 0.35),
                client_weight: Band::new(0.6, 1.4),
                unit_revenue: Band::new(0.80, 2.50),
                unit_price: Band::new(0.05, 0.25),
                max_days_shift: 45,
                churn_reasons: [
                    "Contract not renewed",
                    "Moved to competitor",
                    "Downgraded service tier",
                    "Budget cuts",
                    "Merged with another entity",
                    "Consolidated vendors",
                ]
                .iter()
                .map(|r| r.to_string())
                .collect(),
            },
        }
    }
}
