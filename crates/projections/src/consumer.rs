//! The long-running projection consumer.

use std::time::Duration;

use domain::AccountEvent;
use event_bus::{EventBus, Record};
use event_store::EventEnvelope;
use tokio::sync::watch;

use crate::Result;
use crate::account_view::BankAccountProjection;
use crate::dead_letter::{DeadLetter, DeadLetterSink};
use crate::read_model::BankAccountRepository;

/// How long a single poll blocks before coming back empty. Bounds how long
/// shutdown can take.
const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(250);

/// How many times a transient read-store failure is retried in place before
/// the loop gives up and terminates for its supervisor.
const TRANSIENT_RETRIES: u32 = 3;

const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Single long-running subscriber that keeps the read store eventually
/// consistent with the event log.
///
/// One instance per deployment. The loop polls the subscription, projects
/// each record, and commits the offset only after the read-store write
/// succeeded — a crash in between redelivers the record, which the
/// repository's event-id de-duplication absorbs.
///
/// Failure handling per record:
/// - malformed payload → dead-letter sink, offset committed, loop continues
/// - transient read-store fault → logged and retried in place; exhaustion
///   terminates the loop with the error
/// - anything else → loop terminates with the error for its supervisor
pub struct ProjectionConsumer<R: BankAccountRepository, D: DeadLetterSink> {
    projection: BankAccountProjection<R>,
    dead_letters: D,
    poll_timeout: Duration,
}

impl<R: BankAccountRepository, D: DeadLetterSink> ProjectionConsumer<R, D> {
    /// Creates a consumer over the given repository and dead-letter sink.
    pub fn new(repository: R, dead_letters: D) -> Self {
        Self {
            projection: BankAccountProjection::new(repository),
            dead_letters,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Overrides the poll timeout.
    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    /// Runs the consume loop until the shutdown signal fires or a fatal
    /// error occurs.
    ///
    /// Subscribes the given consumer group to every account topic. On
    /// shutdown the subscription is closed and the loop returns cleanly
    /// within one poll cycle.
    #[tracing::instrument(skip_all, fields(group = %group))]
    pub async fn run<B: EventBus>(
        &self,
        bus: &B,
        group: &str,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        let topics: Vec<String> = AccountEvent::topics()
            .iter()
            .map(|t| t.to_string())
            .collect();
        let mut subscription = bus.subscribe(&topics, group).await?;

        tracing::info!(?topics, "projection consumer started");

        loop {
            let polled = tokio::select! {
                _ = shutdown.changed() => break,
                polled = subscription.poll(self.poll_timeout) => polled?,
            };

            let Some(record) = polled else {
                // Empty poll, just try again
                continue;
            };

            let mut outcome = self.process(&record).await;
            let mut retries = 0;
            while let Err(err) = &outcome {
                if !err.is_transient() || retries >= TRANSIENT_RETRIES {
                    break;
                }
                retries += 1;
                tracing::warn!(
                    topic = %record.topic,
                    key = %record.key,
                    error = %err,
                    retries,
                    "transient read store failure, retrying"
                );
                tokio::time::sleep(RETRY_BACKOFF).await;
                outcome = self.process(&record).await;
            }

            match outcome {
                Ok(()) => {
                    // Offset moves only after the read-store write is in
                    subscription.commit(&record).await?;
                    metrics::counter!("projection_events_processed").increment(1);
                }
                Err(err) if err.is_deserialization() => {
                    self.dead_letters
                        .push(DeadLetter::from_record(&record, &err))
                        .await?;
                    subscription.commit(&record).await?;
                    metrics::counter!("projection_dead_letters_total").increment(1);
                }
                Err(err) => {
                    tracing::error!(
                        topic = %record.topic,
                        key = %record.key,
                        error = %err,
                        "fatal projection failure, terminating consumer"
                    );
                    subscription.close().await?;
                    return Err(err);
                }
            }
        }

        subscription.close().await?;
        tracing::info!("projection consumer stopped");
        Ok(())
    }

    /// Decodes a record into an envelope and projects it.
    async fn process(&self, record: &Record) -> Result<()> {
        let envelope: EventEnvelope = serde_json::from_value(record.payload.clone())?;
        self.projection.apply(&envelope).await
    }
}
