//! Trend derivation against the previous snapshot.

use crate::models::{SnapshotEntry, Trend};

/// Drop (in percentage points) beyond which losses count as critical.
pub const CRITICAL_DROP: f64 = 3.0;

/// Derive the trend for a planet from its current progress and the prior
/// snapshot, if any. Rules are evaluated in order; the first match wins.
pub fn derive_trend(progress_percent: f64, prior: Option<&SnapshotEntry>) -> Trend {
    if progress_percent == 0.0 {
        return Trend::NotLiberated;
    }
    if progress_percent == 100.0 {
        return Trend::Liberated;
    }

    let Some(prior) = prior else {
        return Trend::Unknown;
    };

    let delta = progress_percent - prior.last_progress_percent;
    if delta > 0.0 {
        Trend::Advancing
    } else if delta < -CRITICAL_DROP {
        Trend::CriticalRegressing
    } else if delta < 0.0 {
        Trend::Regressing
    } else {
        // Unchanged: carry the previous verdict forward.
        prior.last_trend
    }
}
