use crossbeam_channel::{bounded, Receiver, Sender};

/// Depth of the notification queue. Events are dropped, not blocked on,
/// when the UI stops draining.
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Notifications pushed from the engine to the GUI so it can redraw
/// without polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// Any parameter of the percussion state changed.
    StateChanged,
    /// A render pass finished; the kick sound is up to date.
    KickUpdated,
    /// A freshly rendered preview buffer is available.
    NewKickBuffer,
    /// Playback progress, reported from the audio callback.
    CurrentPlayingFrame(usize),
}

/// Channel-based pub/sub between the engine threads and the GUI.
///
/// One logical consumer drains the receiver; senders (control thread,
/// render worker, audio callback) only ever `try_send`.
pub(crate) struct EventHub {
    tx: Sender<EngineEvent>,
    rx: Receiver<EngineEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, rx) = bounded(EVENT_QUEUE_CAPACITY);
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<EngineEvent> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<EngineEvent> {
        self.rx.clone()
    }

    pub fn publish(&self, event: EngineEvent) {
        let _ = self.tx.try_send(event);
    }
}
