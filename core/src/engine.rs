//! The bridge engine: the single entry point renderers call.
//!
//! EXECUTION ORDER (per request):
//!   1. Single-period generator, once per month in the view (newest first)
//!   2. Period aggregator (cumulative views only)
//!   3. Structural validation of the result
//!
//! RULES:
//!   - `generate` never fails. Any error from steps 2–3 is logged and the
//!     monthly model for the selected period is returned instead.
//!   - No state survives between requests; every call builds a fresh model.

use crate::{
    aggregator,
    config::GeneratorConfig,
    error::BridgeResult,
    generator::PeriodGenerator,
    model::PeriodDataModel,
    types::{PeriodKey, Segment, ViewType, DEFAULT_SEED},
};

pub struct BridgeEngine {
    config: GeneratorConfig,
}

impl BridgeEngine {
    /// Build an engine over a validated config.
    pub fn new(config: GeneratorConfig) -> BridgeResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Load the config from `path`, or use the built-in defaults.
    pub fn build(config_path: Option<&str>) -> anyhow::Result<Self> {
        let config = match config_path {
            Some(path) => GeneratorConfig::load(path)?,
            None => GeneratorConfig::default(),
        };
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// One month, shifted by `offset` months from `period`.
    pub fn generate_period(&self, period: PeriodKey, segment: Segment, seed: &str, offset: i32) -> PeriodDataModel {
        PeriodGenerator::new(&self.config).generate(period, segment, seed, offset)
    }

    /// Every month a view covers, newest first.
    pub fn generate_months(&self, period: PeriodKey, segment: Segment, view: ViewType, seed: &str) -> Vec<PeriodDataModel> {
        let generator = PeriodGenerator::new(&self.config);
        view.offsets()
            .map(|offset| generator.generate(period, segment, seed, offset))
            .collect()
    }

    /// Generate the model for a view, surfacing aggregation and validation
    /// errors instead of recovering from them.
    pub fn try_generate(&self, period: PeriodKey, segment: Segment, view: ViewType, seed: &str) -> BridgeResult<PeriodDataModel> {
        let months = self.generate_months(period, segment, view, seed);
        let model = aggregator::aggregate(&months)?;
        model.validate()?;
        Ok(model)
    }

    /// Generate the model for a view. Always returns a structurally valid model.
    pub fn generate(&self, period: PeriodKey, segment: Segment, view: ViewType, seed: &str) -> PeriodDataModel {
        let attempt = self.try_generate(period, segment, view, seed);
        self.recover(attempt, period, segment, view, seed)
    }

    fn recover(
        &self,
        attempt: BridgeResult<PeriodDataModel>,
        period: PeriodKey,
        segment: Segment,
        view: ViewType,
        seed: &str,
    ) -> PeriodDataModel {
        match attempt {
            Ok(model) => model,
            Err(e) => {
                log::warn!(
                    "{view} bridge for {period}/{segment} failed ({e}); falling back to the monthly model"
                );
                self.generate_period(period, segment, seed, 0)
            }
        }
    }
}

impl Default for BridgeEngine {
    fn default() -> Self {
        Self { config: GeneratorConfig::default() }
    }
}

/// Generate the dashboard model with the built-in config.
///
/// Total: returns a valid model for every input combination.
pub fn generate_revenue_data(period: PeriodKey, segment: Segment, view: ViewType, seed: &str) -> PeriodDataModel {
    BridgeEngine::default().generate(period, segment, view, seed)
}

/// `generate_revenue_data` with the default seed.
pub fn generate_revenue_data_default(period: PeriodKey, segment: Segment, view: ViewType) -> PeriodDataModel {
    generate_revenue_data(period, segment, view, DEFAULT_SEED)
}
