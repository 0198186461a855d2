//! Core aggregate and domain event traits, plus the generic raise/replay
//! discipline.

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent:
    std::fmt::Debug + Serialize + DeserializeOwned + Send + Sync + Clone
{
    /// Returns the event variant name.
    ///
    /// This is the event's topic on the durable log and its type tag in the
    /// event store.
    fn event_type(&self) -> &'static str;
}

/// Trait for aggregate state in an event-sourced system.
///
/// The state is a pure function of event history: `apply` is the only place
/// it changes, and must be deterministic and side-effect free. Events
/// represent facts that have already happened, so `apply` cannot fail.
///
/// Dispatch inside `apply` is an explicit match over the event enum,
/// resolved once per call; there is no runtime type inspection.
pub trait Aggregate: Default + Send + Sync + Sized {
    /// The type of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The type of errors this aggregate's command methods can produce.
    type Error: std::error::Error + Send + Sync;

    /// Returns the aggregate type name.
    ///
    /// Used for event store organization and routing.
    fn aggregate_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    ///
    /// Returns None for a new, uninitialized aggregate.
    fn id(&self) -> Option<&AggregateId>;

    /// Applies an event to the aggregate, updating its state.
    fn apply(&mut self, event: Self::Event);
}

/// Generic raise/replay discipline wrapping an aggregate's state.
///
/// The root owns the version counter and the uncommitted-events buffer; the
/// wrapped state is only reachable through read-only accessors. Command
/// methods live on concrete instantiations (`AggregateRoot<Account>`):
/// they validate preconditions and call [`raise`](Self::raise), never
/// touching the state directly.
///
/// No instance outlives a command: handlers rebuild the root from history,
/// mutate it, persist the new events, and discard it.
pub struct AggregateRoot<A: Aggregate> {
    state: A,
    version: Version,
    uncommitted: Vec<A::Event>,
}

impl<A: Aggregate> AggregateRoot<A> {
    /// Creates a root around a fresh, uninitialized aggregate.
    pub fn new() -> Self {
        Self {
            state: A::default(),
            version: Version::initial(),
            uncommitted: Vec::new(),
        }
    }

    /// Returns the wrapped aggregate state, read-only.
    pub fn state(&self) -> &A {
        &self.state
    }

    /// Consumes the root, returning the aggregate state.
    pub fn into_state(self) -> A {
        self.state
    }

    /// Returns the current version: number of events applied so far,
    /// committed or not.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Applies a new event and records it as uncommitted.
    ///
    /// The event takes effect immediately (the matching apply rule runs
    /// before buffering), so a command method can raise several events and
    /// later ones see the effect of earlier ones.
    pub fn raise(&mut self, event: A::Event) {
        self.state.apply(event.clone());
        self.uncommitted.push(event);
        self.version = self.version.next();
    }

    /// Replays historical events without buffering them.
    ///
    /// Used to rebuild state from storage; the version advances by one per
    /// event, matching the stream's strictly sequential numbering.
    pub fn replay(&mut self, events: impl IntoIterator<Item = A::Event>) {
        for event in events {
            self.state.apply(event);
            self.version = self.version.next();
        }
    }

    /// Returns the events raised since the last commit, in raise order.
    pub fn uncommitted_events(&self) -> &[A::Event] {
        &self.uncommitted
    }

    /// Clears the uncommitted buffer after a successful append.
    pub fn mark_committed(&mut self) {
        self.uncommitted.clear();
    }
}

impl<A: Aggregate> Default for AggregateRoot<A> {
    fn default() -> Self {
        Self::new()
    }
}
