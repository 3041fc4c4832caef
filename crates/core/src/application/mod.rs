// Application Layer - Use Cases and Background Services

pub mod dispatcher;
pub mod queue_service;

// Re-exports
pub use dispatcher::{
    shutdown_channel, DispatchConfig, Dispatcher, FanOut, ShutdownSender, ShutdownToken,
    TickReport,
};
pub use queue_service::QueueService;
