//! Deterministic revenue variance bridge generator.
//!
//! Given a month, a client segment and a view, synthesizes a plan-vs-actual
//! revenue dataset and decomposes the variance into Volume, Price, Timing,
//! Unknown churn, FX and a residual, with per-client detail rows and
//! narrative insights. The same inputs always produce the same model.

pub mod aggregator;
pub mod client_names;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod generator;
pub mod insights;
pub mod model;
pub mod numeric;
pub mod report;
pub mod rng;
pub mod types;

pub use engine::{generate_revenue_data, generate_revenue_data_default, BridgeEngine};
pub use error::{BridgeError, BridgeResult};
pub use model::{BridgeStep, ClientDetail, DetailBreakdown, Driver, DriverKind, Insight, PeriodDataModel, Polarity};
pub use types::{PeriodKey, Segment, ViewType, DEFAULT_SEED};
