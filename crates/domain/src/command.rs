//! Command handling infrastructure.

use std::marker::PhantomData;

use common::AggregateId;
use event_bus::EventPublisher;
use event_store::{AppendOptions, EventEnvelope, EventStore, EventStoreError, Version};

use crate::aggregate::{Aggregate, AggregateRoot, DomainEvent};
use crate::error::DomainError;

/// How many times a command is re-run after losing an optimistic-concurrency
/// race before the conflict is surfaced to the caller.
const MAX_CONFLICT_ATTEMPTS: u32 = 3;

/// Result of command execution.
#[derive(Debug)]
pub struct CommandResult<A: Aggregate> {
    /// The aggregate state after applying the new events.
    pub aggregate: A,

    /// The events that were generated, persisted, and published.
    pub events: Vec<A::Event>,

    /// The new version of the aggregate after the command.
    pub new_version: Version,
}

/// Trait for commands that can be executed against an aggregate.
///
/// Commands represent an intention to perform an action. They may be rejected
/// if the aggregate's current state doesn't allow the action.
pub trait Command: Send + Sync {
    /// The type of aggregate this command targets.
    type Aggregate: Aggregate;

    /// Returns the ID of the aggregate this command targets.
    fn aggregate_id(&self) -> &AggregateId;
}

/// Handler for executing commands against aggregates.
///
/// Each execution is a full load → replay → mutate → persist → publish →
/// discard cycle:
/// 1. Read the stream and replay it into a fresh [`AggregateRoot`]
/// 2. Run the command closure (validates preconditions, raises events)
/// 3. Append the uncommitted events with the loaded version as the expected
///    version
/// 4. On success, publish the envelopes to the durable log
///
/// A `ConcurrencyConflict` on append means another command won the race for
/// this identifier; the handler reloads and reapplies, a bounded number of
/// times. Nothing is published unless the append succeeded, and a failed
/// append leaves no partial state behind — the root is simply dropped.
pub struct CommandHandler<S, P, A>
where
    S: EventStore,
    P: EventPublisher,
    A: Aggregate,
{
    store: S,
    publisher: P,
    _phantom: PhantomData<A>,
}

impl<S, P, A> CommandHandler<S, P, A>
where
    S: EventStore,
    P: EventPublisher,
    A: Aggregate,
{
    /// Creates a new command handler over the given store and publisher.
    pub fn new(store: S, publisher: P) -> Self {
        Self {
            store,
            publisher,
            _phantom: PhantomData,
        }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads an aggregate by replaying its stream.
    ///
    /// If the aggregate doesn't exist, returns a root around the default
    /// (uninitialized) state.
    pub async fn load(&self, aggregate_id: &AggregateId) -> Result<AggregateRoot<A>, DomainError> {
        let envelopes = self.store.read_stream(aggregate_id).await?;

        let mut root = AggregateRoot::new();
        let events = envelopes
            .into_iter()
            .map(decode_event::<A>)
            .collect::<Result<Vec<_>, _>>()?;
        root.replay(events);

        Ok(root)
    }

    /// Loads an aggregate's state, returning None if it doesn't exist.
    pub async fn load_existing(&self, aggregate_id: &AggregateId) -> Result<Option<A>, DomainError> {
        let root = self.load(aggregate_id).await?;
        if root.state().id().is_some() {
            Ok(Some(root.into_state()))
        } else {
            Ok(None)
        }
    }

    /// Executes a command, persists and publishes the resulting events.
    ///
    /// The closure receives the freshly loaded root and raises events on it.
    /// It runs again from a reloaded root after each lost concurrency race,
    /// so it must be free of external side effects.
    pub async fn execute<F>(
        &self,
        aggregate_id: &AggregateId,
        command_fn: F,
    ) -> Result<CommandResult<A>, DomainError>
    where
        F: Fn(&mut AggregateRoot<A>) -> Result<(), A::Error>,
        DomainError: From<A::Error>,
        A::Event: Clone,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut root = self.load(aggregate_id).await?;
            let loaded_version = root.version();

            command_fn(&mut root)?;

            if root.uncommitted_events().is_empty() {
                return Ok(CommandResult {
                    aggregate: root.into_state(),
                    events: vec![],
                    new_version: loaded_version,
                });
            }

            let envelopes =
                build_envelopes::<A>(aggregate_id, loaded_version, root.uncommitted_events())?;

            let options = if loaded_version == Version::initial() {
                AppendOptions::expect_new()
            } else {
                AppendOptions::expect_version(loaded_version)
            };

            match self.store.append(envelopes.clone(), options).await {
                Ok(new_version) => {
                    // Append is durable; anything failing from here on is
                    // surfaced, not swallowed, so the caller knows the event
                    // exists but may not have propagated.
                    self.publisher.publish(&envelopes).await.map_err(|e| {
                        tracing::error!(
                            %aggregate_id,
                            error = %e,
                            "events appended but publish failed"
                        );
                        e
                    })?;

                    let events = root.uncommitted_events().to_vec();
                    root.mark_committed();

                    metrics::counter!("commands_executed_total").increment(1);

                    return Ok(CommandResult {
                        aggregate: root.into_state(),
                        events,
                        new_version,
                    });
                }
                Err(EventStoreError::ConcurrencyConflict { .. })
                    if attempt < MAX_CONFLICT_ATTEMPTS =>
                {
                    tracing::warn!(%aggregate_id, attempt, "append conflict, reloading");
                    metrics::counter!("command_conflicts_total").increment(1);
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Decodes a stored envelope back into a domain event.
///
/// An envelope whose payload doesn't match any event variant is a fatal
/// replay error, not a skippable message.
fn decode_event<A: Aggregate>(envelope: EventEnvelope) -> Result<A::Event, DomainError> {
    let EventEnvelope {
        event_type, payload, ..
    } = envelope;
    serde_json::from_value(payload).map_err(|source| DomainError::UnknownEvent {
        event_type,
        source,
    })
}

/// Builds envelopes for the uncommitted events, continuing the stream's
/// version sequence from `loaded_version`.
fn build_envelopes<A: Aggregate>(
    aggregate_id: &AggregateId,
    loaded_version: Version,
    events: &[A::Event],
) -> Result<Vec<EventEnvelope>, DomainError> {
    let mut envelopes = Vec::with_capacity(events.len());
    let mut version = loaded_version;

    for event in events {
        version = version.next();
        let envelope = EventEnvelope::builder()
            .aggregate_id(aggregate_id.clone())
            .aggregate_type(A::aggregate_type())
            .event_type(event.event_type())
            .version(version)
            .payload(event)
            .map_err(DomainError::Serialization)?
            .build();
        envelopes.push(envelope);
    }

    Ok(envelopes)
}
