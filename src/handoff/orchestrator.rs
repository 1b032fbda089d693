use super::HandoffSequence;
use crate::event::ApplicationEvent;
use crate::event::channel::EventConsumer;
use tracing::{info, warn};

/// Progress of the shutdown sequence. A termination signal while the sequence
/// is `InProgress` must be a no-op, and no second sequence starts after `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShutdownState {
    Idle,
    InProgress,
    Done,
}

/// Terminal outcome of the orchestrator run loop. The caller decides how the
/// process exits based on it; the orchestrator itself never exits the process.
#[derive(Debug, PartialEq)]
pub enum ShutdownOutcome {
    /// A warm instance of the service answered the self call.
    HandoffCompleted,
    /// All signal publishers are gone, no sequence can be triggered anymore.
    ChannelClosed,
}

/// Runs as the process's shutdown task: dormant until a termination signal is
/// published, then drives one warm hand-off sequence at a time.
pub struct ShutdownOrchestrator<H> {
    handoff: H,
    application_event_consumer: EventConsumer<ApplicationEvent>,
    state: ShutdownState,
}

impl<H: HandoffSequence> ShutdownOrchestrator<H> {
    pub fn new(handoff: H, application_event_consumer: EventConsumer<ApplicationEvent>) -> Self {
        Self {
            handoff,
            application_event_consumer,
            state: ShutdownState::Idle,
        }
    }

    /// Blocks until a termination signal triggers a successful hand-off. A
    /// failed sequence leaves the process serving; the platform's own kill
    /// grace period is the backstop.
    pub fn run(mut self) -> ShutdownOutcome {
        loop {
            let Ok(event) = self.application_event_consumer.as_ref().recv() else {
                return ShutdownOutcome::ChannelClosed;
            };
            match event {
                ApplicationEvent::StopRequested => {
                    if let Some(outcome) = self.on_stop_requested() {
                        return outcome;
                    }
                }
            }
        }
    }

    fn on_stop_requested(&mut self) -> Option<ShutdownOutcome> {
        if self.state != ShutdownState::Idle {
            return None;
        }
        self.state = ShutdownState::InProgress;
        info!("termination notice received, starting the warm hand-off");

        match self.handoff.execute() {
            Ok(endpoint) => {
                self.state = ShutdownState::Done;
                info!(%endpoint, "warm hand-off completed");
                Some(ShutdownOutcome::HandoffCompleted)
            }
            Err(err) => {
                warn!(%err, "warm hand-off failed, the instance keeps serving until the platform kills it");
                self.drain_pending_signals();
                self.state = ShutdownState::Idle;
                None
            }
        }
    }

    // Signals queued while a sequence was running must not trigger another one.
    fn drain_pending_signals(&self) {
        while self.application_event_consumer.as_ref().try_recv().is_ok() {}
    }
}
