//! Event channel built on crossbeam-channel.

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::Event;

/// Sending half, handed to the pipeline and cloned into worker threads.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Wrap a raw crossbeam sender
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Send an event.
    ///
    /// A dropped receiver is not an error: progress reporting is optional.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Receiving half, owned by whatever displays progress.
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Block until the next event is received
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Iterate until every sender is dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }

    /// Drain whatever is currently queued
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }
}

/// Constructors for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Create an unbounded event channel
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

/// A sender whose receiver is already gone. Every event is discarded.
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CopyEvent, RunEvent, RunPhase};
    use std::path::PathBuf;
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::Copy(CopyEvent::Copied {
                from: PathBuf::from("/scan/a.jpg"),
                to: PathBuf::from("/out/a.jpg"),
            }));
        });
        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::Copy(CopyEvent::Copied { to, .. }) => {
                assert_eq!(to, PathBuf::from("/out/a.jpg"));
            }
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Run(RunEvent::Started));
    }

    #[test]
    fn drain_returns_queued_events_in_order() {
        let (sender, receiver) = EventChannel::new();
        sender.send(Event::Run(RunEvent::Started));
        sender.send(Event::Run(RunEvent::PhaseChanged {
            phase: RunPhase::IndexingAlbums,
        }));

        let events = receiver.drain();
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[1],
            Event::Run(RunEvent::PhaseChanged {
                phase: RunPhase::IndexingAlbums
            })
        ));
        assert!(receiver.try_recv().is_none());
    }
}
