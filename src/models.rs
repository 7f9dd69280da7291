//! Data models for the war status bot.
//!
//! This module contains the core data structures used throughout
//! the application for representing planets, trends, and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one upstream war season.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(pub String);

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CampaignId {
    fn from(s: &str) -> Self {
        CampaignId(s.to_string())
    }
}

/// A single planet as reported by one fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Planet name. Unique within one cycle; join key for snapshots.
    pub name: String,
    /// Number of players currently deployed on the planet.
    pub participant_count: u64,
    /// Liberation progress in [0, 100], rounded to 2 decimals.
    pub progress_percent: f64,
}

impl EntityRecord {
    /// Creates a record, rounding the progress to 2 decimal places.
    pub fn new(name: impl Into<String>, participant_count: u64, progress_percent: f64) -> Self {
        Self {
            name: name.into(),
            participant_count,
            progress_percent: round_progress(progress_percent),
        }
    }
}

/// Round a liberation percentage to 2 decimal places.
///
/// Rounds from the exact decimal value of `value`, so 2.675 (stored as
/// 2.67499...) becomes 2.67.
pub fn round_progress(value: f64) -> f64 {
    to_fixed(value, 2).parse().unwrap_or(value)
}

/// Format `value` with exactly `digits` decimals.
///
/// Rounds to nearest from the exact binary value. A value that sits exactly
/// halfway between two candidates rounds away from zero (1.25 -> "1.3").
pub fn to_fixed(value: f64, digits: usize) -> String {
    if is_midpoint(value, digits) {
        let scale = 10f64.powi(digits as i32);
        let rounded = (value.abs() * scale).ceil().copysign(value) / scale;
        return format!("{:.*}", digits, rounded);
    }
    format!("{:.*}", digits, value)
}

/// Whether `value` lies exactly halfway between two multiples of
/// `10^-digits`.
///
/// With `value = m * 2^e` and `m` odd, that holds only when `e == -(digits + 1)`.
fn is_midpoint(value: f64, digits: usize) -> bool {
    if value == 0.0 || !value.is_finite() {
        return false;
    }

    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };

    exponent + i64::from(mantissa.trailing_zeros()) == -(digits as i64 + 1)
}

/// Change in liberation since the previous cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    /// No prior observation and nothing notable; renders as empty text.
    #[default]
    Unknown,
    /// Liberation is at 0%.
    NotLiberated,
    /// Liberation is at 100%.
    Liberated,
    /// Liberation went up.
    Advancing,
    /// Liberation dropped by at most 3 points.
    Regressing,
    /// Liberation dropped by more than 3 points.
    CriticalRegressing,
}

impl Trend {
    /// Text appended to a planet line in the report.
    pub fn text(&self) -> &'static str {
        match self {
            Trend::Unknown => "",
            Trend::NotLiberated => "*This planet has yet to see democracy, give it hell, divers!*",
            Trend::Liberated => "*Super Earth has taken control, good work Helldivers!*",
            Trend::Advancing => "*Liberation efforts are ongoing.*",
            Trend::Regressing => "*Defense is failing, Helldivers being overrun! Need reinforcements!*",
            Trend::CriticalRegressing => {
                "*Helldivers suffering extreme casualties. Requests for reinforcements have been sent.*"
            }
        }
    }
}

/// Last observed state of a planet, kept across cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Planet name.
    pub name: String,
    /// Liberation percentage at the last featured observation.
    pub last_progress_percent: f64,
    /// Trend derived at the last featured observation.
    pub last_trend: Trend,
}

/// One titled line of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportLine {
    /// Field title (planet name or the aggregate label).
    pub title: String,
    /// Field body.
    pub body: String,
}

/// A rendered combat report, ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Embed title.
    pub title: String,
    /// Featured planets in rank order, followed by the aggregate line.
    pub lines: Vec<ReportLine>,
    /// When the report was built.
    pub timestamp: DateTime<Utc>,
    /// Footer text.
    pub footer: String,
    /// Embed accent color (RGB).
    pub color: u32,
}

impl Report {
    /// Lines for the individually featured planets.
    pub fn featured_lines(&self) -> &[ReportLine] {
        match self.lines.split_last() {
            Some((_, featured)) => featured,
            None => &[],
        }
    }

    /// The trailing aggregate line, if any.
    pub fn remainder_line(&self) -> Option<&ReportLine> {
        self.lines.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_rounds_progress() {
        let record = EntityRecord::new("Malevelon Creek", 100, 45.6789);
        assert_eq!(record.progress_percent, 45.68);

        let record = EntityRecord::new("Draupnir", 100, 12.344);
        assert_eq!(record.progress_percent, 12.34);
    }

    #[test]
    fn test_rounding_uses_stored_decimal_value() {
        // These are stored just below the written value.
        assert_eq!(round_progress(1.045), 1.04);
        assert_eq!(round_progress(2.675), 2.67);
        assert_eq!(round_progress(45.555), 45.55);

        // Exactly representable halves round up.
        assert_eq!(round_progress(1.125), 1.13);
        assert_eq!(round_progress(0.375), 0.38);
        assert_eq!(round_progress(45.5), 45.5);
        assert_eq!(round_progress(100.0), 100.0);
        assert_eq!(round_progress(0.0), 0.0);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.25, 1), "1.3");
        assert_eq!(to_fixed(3.25, 1), "3.3");
        assert_eq!(to_fixed(1.15, 1), "1.1");
        assert_eq!(to_fixed(12.345, 1), "12.3");
        assert_eq!(to_fixed(1.0, 1), "1.0");
        assert_eq!(to_fixed(0.125, 2), "0.13");
        assert_eq!(to_fixed(-1.25, 1), "-1.3");
    }

    #[test]
    fn test_trend_text() {
        assert_eq!(Trend::Unknown.text(), "");
        assert!(Trend::Advancing.text().contains("ongoing"));
        assert!(Trend::CriticalRegressing.text().contains("extreme casualties"));
        assert!(Trend::Regressing.text().contains("Defense is failing"));
        assert!(Trend::NotLiberated.text().contains("yet to see democracy"));
        assert!(Trend::Liberated.text().contains("taken control"));
    }

    #[test]
    fn test_report_line_accessors() {
        let report = Report {
            title: "t".to_string(),
            lines: vec![
                ReportLine {
                    title: "A".to_string(),
                    body: "a".to_string(),
                },
                ReportLine {
                    title: "Other Planets*".to_string(),
                    body: "o".to_string(),
                },
            ],
            timestamp: Utc::now(),
            footer: String::new(),
            color: 0,
        };

        assert_eq!(report.featured_lines().len(), 1);
        assert_eq!(
            report.remainder_line().map(|l| l.title.as_str()),
            Some("Other Planets*")
        );
    }
}
