//! Shared primitive types used across the generator.
//!
//! All three request dimensions (period, segment, view) are parsed once at
//! the boundary. Everything below the engine works on these typed values.

use crate::error::BridgeError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The base seed used when the caller does not supply one.
pub const DEFAULT_SEED: &str = "FP&A-bridge";

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ── PeriodKey ────────────────────────────────────────────────────────────────

/// One calendar month, rendered as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    year:  i32,
    month: u32, // 1..=12
}

impl PeriodKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self { year: date.year(), month: date.month() }
    }

    pub fn year(&self) -> i32 { self.year }
    pub fn month(&self) -> u32 { self.month }

    /// Shift by a signed number of months, rolling the year as needed.
    pub fn shift(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year:  index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    /// First calendar day of the month. `None` only for years chrono cannot represent.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Short label for month pickers, e.g. "Jun 2025".
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_ABBREVIATIONS[(self.month - 1) as usize], self.year)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || BridgeError::InvalidPeriod { key: s.to_string() };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ── Segment ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Segment {
    ExistingClients,
    NewClients,
}

impl Segment {
    pub const ALL: [Segment; 2] = [Segment::ExistingClients, Segment::NewClients];

    /// Stable identifier. Part of every seed string, so never change it.
    pub fn id(&self) -> &'static str {
        match self {
            Self::ExistingClients => "existing-clients",
            Self::NewClients      => "new-clients",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ExistingClients => "Existing Clients",
            Self::NewClients      => "New Clients",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Segment {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|seg| seg.id() == s.trim())
            .ok_or_else(|| BridgeError::UnknownSegment(s.to_string()))
    }
}

// ── ViewType ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewType {
    Monthly,
    QuarterlyCumulative,
    AnnualCumulative,
}

impl ViewType {
    pub const ALL: [ViewType; 3] = [
        ViewType::Monthly,
        ViewType::QuarterlyCumulative,
        ViewType::AnnualCumulative,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::Monthly             => "monthly",
            Self::QuarterlyCumulative => "quarterly-cumulative",
            Self::AnnualCumulative    => "annual-cumulative",
        }
    }

    /// Number of consecutive months the view covers.
    pub fn period_count(&self) -> usize {
        match self {
            Self::Monthly             => 1,
            Self::QuarterlyCumulative => 3,
            Self::AnnualCumulative    => 12,
        }
    }

    /// Month offsets relative to the selected period, newest first: 0, -1, ...
    pub fn offsets(&self) -> impl Iterator<Item = i32> {
        (0..self.period_count() as i32).map(|i| -i)
    }

    pub fn is_cumulative(&self) -> bool {
        !matches!(self, Self::Monthly)
    }

    /// Phrase used by the insights panel heading.
    pub fn period_label(&self) -> &'static str {
        match self {
            Self::Monthly             => "this month",
            Self::QuarterlyCumulative => "this quarter",
            Self::AnnualCumulative    => "this year",
        }
    }
}

impl fmt::Display for ViewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ViewType {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|view| view.id() == s.trim())
            .ok_or_else(|| BridgeError::UnknownView(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_key_parses_and_displays() {
        let key: PeriodKey = "2025-06".parse().unwrap();
        assert_eq!(key.year(), 2025);
        assert_eq!(key.month(), 6);
        assert_eq!(key.to_string(), "2025-06");
        assert_eq!(key.label(), "Jun 2025");
    }

    #[test]
    fn period_key_rejects_malformed_input() {
        for bad in ["2025-13", "2025-00", "2025-6", "25-06", "2025/06", "", "abcd-ef"] {
            assert!(bad.parse::<PeriodKey>().is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn shift_rolls_across_year_boundaries() {
        let jan = PeriodKey::new(2025, 1).unwrap();
        assert_eq!(jan.shift(-1).to_string(), "2024-12");
        assert_eq!(jan.shift(-11).to_string(), "2024-02");
        assert_eq!(jan.shift(-13).to_string(), "2023-12");
        assert_eq!(jan.shift(12).to_string(), "2026-01");
        assert_eq!(jan.shift(0), jan);
    }

    #[test]
    fn view_offsets_are_newest_first() {
        let q: Vec<i32> = ViewType::QuarterlyCumulative.offsets().collect();
        assert_eq!(q, vec![0, -1, -2]);
        assert_eq!(ViewType::AnnualCumulative.offsets().count(), 12);
        assert_eq!(ViewType::Monthly.offsets().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn segment_and_view_round_trip_through_ids() {
        for seg in Segment::ALL {
            assert_eq!(seg.id().parse::<Segment>().unwrap(), seg);
        }
        for view in ViewType::ALL {
            assert_eq!(view.id().parse::<ViewType>().unwrap(), view);
        }
        assert!("retail".parse::<Segment>().is_err());
        assert!("weekly".parse::<ViewType>().is_err());
    }
}
