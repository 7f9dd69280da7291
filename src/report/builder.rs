//! Combat report assembly.
//!
//! Ranks the current planets, derives a trend for each featured one against
//! the snapshot tracker, records the new snapshots, and produces the report
//! lines.

use crate::analysis::{derive_trend, format_count, rank, total_participants, SnapshotTracker};
use crate::config::ReportConfig;
use crate::models::{EntityRecord, Report, ReportLine};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Title of the aggregate line.
pub const OTHER_PLANETS_TITLE: &str = "Other Planets*";

/// Build a report from this cycle's records.
///
/// Only featured planets are written back to the tracker; planets outside
/// the top list keep whatever snapshot they had.
pub fn build_report(
    records: Vec<EntityRecord>,
    tracker: &mut SnapshotTracker,
    config: &ReportConfig,
    now: DateTime<Utc>,
) -> Report {
    debug!(
        "Building report from {} planets ({} players)",
        records.len(),
        total_participants(&records)
    );

    let ranking = rank(records, config.featured_count);
    let mut lines = Vec::with_capacity(ranking.featured.len() + 1);

    for planet in &ranking.featured {
        let prior = tracker.lookup(&planet.name);
        if let Some(prior) = prior {
            debug!(
                "{}: {}% -> {}%",
                prior.name, prior.last_progress_percent, planet.progress_percent
            );
        }
        let trend = derive_trend(planet.progress_percent, prior);

        lines.push(ReportLine {
            title: planet.name.clone(),
            body: format!(
                "{} {}, {}% liberated. {}",
                format_count(planet.participant_count),
                config.participant_label,
                planet.progress_percent,
                trend.text()
            ),
        });

        tracker.upsert(&planet.name, planet.progress_percent, trend);
    }

    lines.push(ReportLine {
        title: OTHER_PLANETS_TITLE.to_string(),
        body: format!(
            "{} {} taking on various missions across varied sectors.",
            format_count(ranking.other_count),
            config.participant_label
        ),
    });

    debug!(
        "Featured {} planets, {} folded into remainder; tracker holds {}",
        ranking.featured.len(),
        ranking.other_planets,
        tracker.len()
    );

    Report {
        title: config.title.clone(),
        lines,
        timestamp: now,
        footer: config.footer.clone(),
        color: config.color,
    }
}
