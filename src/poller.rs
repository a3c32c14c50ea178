use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::config::Config;
use crate::error::{BotError, ErrorKind};
use crate::practicum::{self, HomeworkApi};
use crate::status;
use crate::telegram::Notifier;

pub const MALFUNCTION_PREFIX: &str = "Program malfunction";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerSettings {
    pub retry_interval: Duration,
}

impl PollerSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            retry_interval: cfg.retry_interval(),
        }
    }
}

/// Result of one poll iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new status message was delivered.
    Sent(String),
    /// The status message was already delivered earlier.
    Duplicate,
    /// The API reported no changed submissions.
    NoUpdates,
    /// Fetch, validation, mapping or delivery failed; a malfunction report
    /// was attempted.
    Failed(ErrorKind),
}

/// Poll → validate → map → notify loop. Owns the dedup set and cursor.
pub struct StatusPoller<A, N> {
    settings: PollerSettings,
    api: A,
    notifier: N,
    sent: HashSet<String>,
    cursor: i64,
}

impl<A, N> StatusPoller<A, N>
where
    A: HomeworkApi,
    N: Notifier,
{
    pub fn new(settings: PollerSettings, api: A, notifier: N, cursor: i64) -> Self {
        Self {
            settings,
            api,
            notifier,
            sent: HashSet::new(),
            cursor,
        }
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    pub fn was_sent(&self, text: &str) -> bool {
        self.sent.contains(text)
    }

    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }

    /// Run one iteration. Failures are reported through the notifier and
    /// never escape.
    #[instrument(skip_all, fields(cursor = self.cursor))]
    pub async fn tick(&mut self) -> TickOutcome {
        match self.poll().await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(kind = %err.kind(), %err, "poll iteration failed");
                self.report(&err).await;
                TickOutcome::Failed(err.kind())
            }
        }
    }

    async fn poll(&mut self) -> Result<TickOutcome, BotError> {
        let response = self.api.fetch(self.cursor).await?;
        let homeworks = practicum::check_response(&response)?;

        let Some(latest) = homeworks.first() else {
            debug!("no new statuses");
            self.cursor = Utc::now().timestamp();
            return Ok(TickOutcome::NoUpdates);
        };

        let message = status::parse_status(latest)?;
        let outcome = if self.sent.contains(&message) {
            debug!(text = %message, "status already reported");
            TickOutcome::Duplicate
        } else {
            self.notifier.send(&message).await?;
            self.sent.insert(message.clone());
            TickOutcome::Sent(message)
        };
        self.cursor = Utc::now().timestamp();
        Ok(outcome)
    }

    async fn report(&mut self, err: &BotError) {
        let message = format!("{MALFUNCTION_PREFIX}: {err}");
        if self.sent.contains(&message) {
            debug!(text = %message, "malfunction already reported");
            return;
        }
        match self.notifier.send(&message).await {
            Ok(()) => {
                self.sent.insert(message);
            }
            Err(send_err) => warn!(%send_err, "failed to report malfunction"),
        }
    }

    /// Tick, then sleep the retry interval, until `shutdown` resolves. Shutdown
    /// is only observed between iterations.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(
            retry_secs = self.settings.retry_interval.as_secs(),
            cursor = self.cursor,
            "homework poller started"
        );
        loop {
            let outcome = self.tick().await;
            debug!(?outcome, "poll iteration finished");
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, stopping poller");
                    break;
                }
                _ = tokio::time::sleep(self.settings.retry_interval) => {}
            }
        }
    }
}
