// Dispatcher constants (no magic values)
use std::time::Duration;

/// Period between dispatch sweeps (5s)
pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_secs(5);

/// Lease taken on each message while it is fanned out (30s)
pub const DEFAULT_DISPATCH_LEASE: Duration = Duration::from_secs(30);

/// Outbound webhook calls allowed in flight at once, across all queues
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 64;

/// Longest a single webhook attempt may hold a fan-out permit (30s)
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Grace period the daemon gives the dispatcher on shutdown (5s)
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
