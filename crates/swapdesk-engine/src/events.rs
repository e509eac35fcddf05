//! Committed event log.

use swapdesk_types::{Event, EventRecord, Height};

/// Append-only record of committed events. Sequence numbers are gap-free
/// and keep counting across [`EventLog::drain`].
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_sequence: u64,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the events of one committed call.
    pub fn commit(&mut self, height: Height, events: Vec<Event>) {
        for event in events {
            tracing::debug!(
                sequence = self.next_sequence,
                kind = event.kind(),
                height = height.0,
                "Event committed"
            );
            self.records.push(EventRecord {
                height,
                sequence: self.next_sequence,
                event,
            });
            self.next_sequence += 1;
        }
    }

    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Hand the buffered records to the caller.
    pub fn drain(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.records)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
