pub mod retry;
pub mod thread_context;
pub mod threads;
