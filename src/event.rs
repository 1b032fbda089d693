pub mod cancellation;
pub mod channel;

/// Process-level events driving the shutdown orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub enum ApplicationEvent {
    StopRequested,
}
