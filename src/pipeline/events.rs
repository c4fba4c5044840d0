//! # Progress Events
//!
//! Events the engine emits while a run is in flight. Sinks must never
//! block the engine; the channel sink drops events if the consumer has
//! gone away.

use crossbeam_channel::Sender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Extracting,
    ProcessingErrors,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Extracting => "Extracting files...",
            Phase::ProcessingErrors => "Processing errors...",
        }
    }
}

/// Progress reported to the caller; not a wire format.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A pass started; callers typically show the phase label.
    PhaseStarted { phase: Phase },
    /// First-pass counters after each entry.
    Extraction {
        total: u64,
        processed: u64,
        errored: u64,
        percent: f64,
    },
    /// Recovery-pass counters after each retried entry.
    Recovery { total: u64, fixed: u64, failed: u64 },
    /// The run is over; callers may re-enable their start control.
    Completed,
}

/// Event sink the engine pushes progress into.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink that discards all events.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Sink backed by an unbounded channel drained by the caller on its own
/// schedule. A closed receiver is not an error for the engine.
pub struct ChannelSink {
    tx: Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn channel_sink_delivers_events_in_order() {
        let (tx, rx) = unbounded();
        let sink = ChannelSink::new(tx);
        sink.emit(ProgressEvent::PhaseStarted {
            phase: Phase::Extracting,
        });
        sink.emit(ProgressEvent::Completed);

        assert!(matches!(
            rx.recv().unwrap(),
            ProgressEvent::PhaseStarted {
                phase: Phase::Extracting
            }
        ));
        assert!(matches!(rx.recv().unwrap(), ProgressEvent::Completed));
    }

    #[test]
    fn emitting_after_receiver_drop_is_silent() {
        let (tx, rx) = unbounded();
        drop(rx);
        let sink = ChannelSink::new(tx);
        sink.emit(ProgressEvent::Completed);
    }

    #[test]
    fn phase_labels_match_caller_expectations() {
        assert_eq!(Phase::Extracting.label(), "Extracting files...");
        assert_eq!(Phase::ProcessingErrors.label(), "Processing errors...");
    }
}
