//! Fetch-and-report cycles.
//!
//! Triggers from the scheduler and the command router go through a queue
//! that holds at most one pending trigger. A single [`CycleRunner`] drains
//! it and owns the snapshot tracker, so cycles never overlap.

use crate::analysis::SnapshotTracker;
use crate::config::ReportConfig;
use crate::error::FetchError;
use crate::gateway::{ChannelRef, Gateway};
use crate::models::Report;
use crate::report::build_report;
use crate::status::{fetch_all, StatusFetcher};
use chrono::Utc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

/// What asked for a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerSource {
    Scheduled,
    Command { author: String },
}

/// A request for one cycle, with the channel that should get the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    pub source: TriggerSource,
    pub channel: ChannelRef,
}

impl Trigger {
    pub fn scheduled(channel: ChannelRef) -> Self {
        Self {
            source: TriggerSource::Scheduled,
            channel,
        }
    }

    pub fn command(author: impl Into<String>, channel: ChannelRef) -> Self {
        Self {
            source: TriggerSource::Command {
                author: author.into(),
            },
            channel,
        }
    }
}

/// Producer side of the trigger queue.
#[derive(Debug, Clone)]
pub struct TriggerSender {
    tx: mpsc::Sender<Trigger>,
}

/// Create the trigger queue. At most one trigger waits while a cycle runs.
pub fn trigger_queue() -> (TriggerSender, mpsc::Receiver<Trigger>) {
    let (tx, rx) = mpsc::channel(1);
    (TriggerSender { tx }, rx)
}

impl TriggerSender {
    /// Queue a trigger. Returns `false` if it was dropped because another
    /// trigger is already pending or the runner has stopped.
    pub fn send(&self, trigger: Trigger) -> bool {
        match self.tx.try_send(trigger) {
            Ok(()) => true,
            Err(TrySendError::Full(t)) => {
                info!("Update already pending, dropping {:?} trigger", t.source);
                false
            }
            Err(TrySendError::Closed(t)) => {
                warn!("Cycle runner stopped, dropping {:?} trigger", t.source);
                false
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Runs cycles one at a time and delivers the results.
pub struct CycleRunner<F, G> {
    fetcher: F,
    gateway: G,
    tracker: SnapshotTracker,
    report_config: ReportConfig,
}

impl<F: StatusFetcher, G: Gateway> CycleRunner<F, G> {
    pub fn new(fetcher: F, gateway: G, report_config: ReportConfig) -> Self {
        Self {
            fetcher,
            gateway,
            tracker: SnapshotTracker::new(),
            report_config,
        }
    }

    pub fn tracker(&self) -> &SnapshotTracker {
        &self.tracker
    }

    /// Fetch current status and build a report, updating the tracker.
    pub async fn run_cycle(&mut self) -> Result<Report, FetchError> {
        if self.tracker.is_empty() {
            info!("No previous snapshot; trends start with the next update");
        }

        let outcome = fetch_all(&self.fetcher).await?;
        if !outcome.failures.is_empty() {
            warn!(
                "{} campaign(s) failed and were skipped",
                outcome.failures.len()
            );
        }

        Ok(build_report(
            outcome.records,
            &mut self.tracker,
            &self.report_config,
            Utc::now(),
        ))
    }

    /// Run one cycle for `trigger` and post the report or an error message.
    pub async fn handle(&mut self, trigger: Trigger) {
        match &trigger.source {
            TriggerSource::Scheduled => info!("Starting scheduled update for {}", trigger.channel),
            TriggerSource::Command { author } => {
                info!("Update requested by {} in {}", author, trigger.channel)
            }
        }

        match self.run_cycle().await {
            Ok(report) => {
                if let Err(e) = self.gateway.send_report(&trigger.channel, &report).await {
                    error!("Failed to deliver report to {}: {}", trigger.channel, e);
                } else {
                    info!(
                        "Delivered report with {} lines to {}",
                        report.lines.len(),
                        trigger.channel
                    );
                }
            }
            Err(e) => {
                error!("Error: {}", e);
                if let Err(send_err) = self
                    .gateway
                    .send_text(&trigger.channel, e.user_message())
                    .await
                {
                    error!(
                        "Failed to deliver error message to {}: {}",
                        trigger.channel, send_err
                    );
                }
            }
        }

        debug!("Snapshot tracker holds {} planets", self.tracker().len());
    }

    /// Drain the trigger queue until every sender is gone.
    pub async fn run(mut self, mut triggers: mpsc::Receiver<Trigger>) {
        while let Some(trigger) = triggers.recv().await {
            self.handle(trigger).await;
        }
        info!("Trigger queue closed, cycle runner stopping");
    }
}
