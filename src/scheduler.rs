//! Hourly report schedule.
//!
//! The schedule is armed once at startup: if the current UTC hour falls in
//! the active window, the first report fires at the top of the next hour and
//! then every interval after that. Outside the window nothing is armed for
//! the lifetime of the process.

use crate::config::ScheduleConfig;
use crate::cycle::{Trigger, TriggerSender};
use crate::gateway::ChannelRef;
use chrono::{DateTime, Timelike, Utc};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Range of UTC hours during which scheduled reports run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveWindow {
    /// First active hour (inclusive).
    pub start_hour: u32,
    /// First inactive hour after the window (exclusive).
    pub end_hour: u32,
}

impl ActiveWindow {
    /// Whether `hour` lies inside the window. Windows may wrap midnight;
    /// equal bounds cover the whole day.
    pub fn contains(&self, hour: u32) -> bool {
        use std::cmp::Ordering;

        match self.start_hour.cmp(&self.end_hour) {
            Ordering::Less => hour >= self.start_hour && hour < self.end_hour,
            Ordering::Greater => hour >= self.start_hour || hour < self.end_hour,
            Ordering::Equal => true,
        }
    }
}

/// Time remaining until the top of the next UTC hour.
pub fn delay_to_next_hour(now: DateTime<Utc>) -> Duration {
    let elapsed_secs = u64::from(now.minute() * 60 + now.second());
    // Leap seconds report nanos >= 1e9.
    let elapsed = Duration::new(elapsed_secs, now.nanosecond().min(999_999_999));
    Duration::from_secs(3600).saturating_sub(elapsed)
}

/// Scheduling policy derived from configuration.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub window: ActiveWindow,
    pub interval: Duration,
    pub recheck_window: bool,
}

impl Schedule {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            window: ActiveWindow {
                start_hour: config.start_hour,
                end_hour: config.end_hour,
            },
            interval: Duration::from_secs(config.interval_minutes * 60),
            recheck_window: config.recheck_window,
        }
    }

    /// Delay before the first scheduled fire, or `None` when `now` is
    /// outside the active window.
    pub fn first_delay(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.window.contains(now.hour()) {
            Some(delay_to_next_hour(now))
        } else {
            None
        }
    }

    /// Whether a recurring fire at `now` should produce a report.
    ///
    /// Without `recheck_window`, once armed the schedule keeps firing
    /// around the clock.
    pub fn should_fire(&self, now: DateTime<Utc>) -> bool {
        !self.recheck_window || self.window.contains(now.hour())
    }
}

/// Fire triggers after `first_delay` and then every interval, until the
/// trigger queue is closed.
pub async fn run(
    schedule: Schedule,
    first_delay: Duration,
    triggers: TriggerSender,
    channel: ChannelRef,
) {
    info!(
        "Scheduled updates armed: first in {}s, then every {}m",
        first_delay.as_secs(),
        schedule.interval.as_secs() / 60
    );

    let mut ticker = interval_at(Instant::now() + first_delay, schedule.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if triggers.is_closed() {
            debug!("Trigger queue closed, stopping schedule");
            return;
        }

        if !schedule.should_fire(Utc::now()) {
            debug!("Outside active window, skipping scheduled update");
            continue;
        }

        triggers.send(Trigger::scheduled(channel.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::{trigger_queue, TriggerSource};
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, second).unwrap()
    }

    fn default_schedule() -> Schedule {
        Schedule::from_config(&ScheduleConfig::default())
    }

    #[test]
    fn test_default_window() {
        let window = default_schedule().window;
        for hour in [21, 22, 23, 0] {
            assert!(window.contains(hour), "hour {} should be active", hour);
        }
        for hour in [1, 2, 10, 20] {
            assert!(!window.contains(hour), "hour {} should be idle", hour);
        }
    }

    #[test]
    fn test_non_wrapping_and_full_day_windows() {
        let window = ActiveWindow {
            start_hour: 9,
            end_hour: 17,
        };
        assert!(window.contains(9));
        assert!(window.contains(16));
        assert!(!window.contains(17));
        assert!(!window.contains(3));

        let all_day = ActiveWindow {
            start_hour: 0,
            end_hour: 0,
        };
        assert!((0..24).all(|h| all_day.contains(h)));
    }

    #[test]
    fn test_delay_to_next_hour() {
        assert_eq!(delay_to_next_hour(at(22, 0, 0)), Duration::from_secs(3600));
        assert_eq!(delay_to_next_hour(at(22, 30, 0)), Duration::from_secs(1800));
        assert_eq!(delay_to_next_hour(at(23, 59, 59)), Duration::from_secs(1));
    }

    #[test]
    fn test_first_delay() {
        let schedule = default_schedule();
        assert_eq!(schedule.first_delay(at(22, 0, 0)), Some(Duration::from_secs(3600)));
        assert_eq!(schedule.first_delay(at(0, 45, 0)), Some(Duration::from_secs(900)));
        assert_eq!(schedule.first_delay(at(10, 0, 0)), None);
        assert_eq!(schedule.first_delay(at(1, 0, 0)), None);
    }

    #[test]
    fn test_should_fire() {
        let mut schedule = default_schedule();
        assert!(schedule.should_fire(at(5, 0, 0)));

        schedule.recheck_window = true;
        assert!(!schedule.should_fire(at(5, 0, 0)));
        assert!(schedule.should_fire(at(23, 0, 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_delay_then_hourly() {
        let (triggers, mut rx) = trigger_queue();
        let schedule = default_schedule();
        let delay = schedule.first_delay(at(22, 0, 0)).unwrap();
        let start = Instant::now();

        tokio::spawn(run(
            schedule,
            delay,
            triggers,
            ChannelRef::Name("galactic-war-effort".to_string()),
        ));

        let first = rx.recv().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3600));
        assert!(elapsed < Duration::from_secs(3601));
        assert_eq!(first.source, TriggerSource::Scheduled);
        assert_eq!(
            first.channel,
            ChannelRef::Name("galactic-war-effort".to_string())
        );

        rx.recv().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(7200));
        assert!(elapsed < Duration::from_secs(7201));

        rx.recv().await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(10800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_queue_closes() {
        let (triggers, rx) = trigger_queue();
        drop(rx);

        let handle = tokio::spawn(run(
            default_schedule(),
            Duration::from_secs(60),
            triggers,
            ChannelRef::Name("x".to_string()),
        ));

        tokio::time::timeout(Duration::from_secs(120), handle)
            .await
            .expect("schedule should stop")
            .unwrap();
    }
}
