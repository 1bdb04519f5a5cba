//! Deterministic client name selection from curated, segment-specific pools.
//!
//! Every driver's detail rows draw their client names without replacement,
//! so one driver never lists the same client twice.

use crate::rng::PeriodRng;
use crate::types::Segment;

/// Curated client directories used by the default generator config.
pub struct ClientDirectory;

impl ClientDirectory {
    /// Default pool for a segment.
    pub fn default_pool(segment: Segment) -> Vec<String> {
        let names = match segment {
            Segment::ExistingClients => Self::existing_clients(),
            Segment::NewClients      => Self::new_clients(),
        };
        names.iter().map(|n| n.to_string()).collect()
    }

    /// Established accounts with multi-year contracts.
    fn existing_clients() -> &'static [&'static str] {
        &[
            "Northwind Logistics", "Apex Retail Group", "Meridian Health",
            "Crestview Insurance", "Harbor Freight Lines", "Summit Energy",
            "Pinnacle Foods", "Atlas Manufacturing", "Bluewater Telecom",
            "Granite Financial", "Redwood Hospitality", "Silverline Airways",
            "Evergreen Utilities", "Ironclad Security", "Lakeside Pharma",
            "Keystone Automotive",
        ]
    }

    /// Accounts onboarded within the current plan year.
    fn new_clients() -> &'static [&'static str] {
        &[
            "Brightpath Fintech", "Nimbus Analytics", "Quantum Parcel",
            "Verdant Grocers", "Lumen Mobility", "Orbit Travel",
            "Cobalt Gaming", "Tidal Payments", "Horizon Clinics",
            "Sparrow Media", "Foxglove Apparel", "Helix Biotech",
            "Mosaic Marketplaces", "Juniper Learning", "Beacon Realty",
            "Cascade Robotics",
        ]
    }
}

/// Draw `count` distinct names from `pool` (partial Fisher-Yates).
///
/// When the pool is smaller than `count`, the remainder is filled with
/// placeholder names so the caller always gets `count` rows.
pub fn select_distinct(rng: &mut PeriodRng, pool: &[String], count: usize) -> Vec<String> {
    let mut remaining: Vec<&String> = pool.iter().collect();
    let mut chosen = Vec::with_capacity(count);

    for i in 0..count {
        if remaining.is_empty() {
            chosen.push(format!("Client {}", i + 1));
            continue;
        }
        let idx = rng.index_below(remaining.len());
        chosen.push(remaining.swap_remove(idx).clone());
    }
    chosen
}
