//! Event type names published on the pipeline event bus and forwarded to
//! WebSocket clients as change notifications.

/// A pipeline job row was created.
pub const EVENT_JOB_CREATED: &str = "job.created";

/// A job's progress (and optionally metadata) changed.
pub const EVENT_JOB_PROGRESS: &str = "job.progress";

/// A job moved from `pending` to `processing`.
pub const EVENT_JOB_STARTED: &str = "job.started";

/// A job reached `completed`.
pub const EVENT_JOB_COMPLETED: &str = "job.completed";

/// A job reached `failed`.
pub const EVENT_JOB_FAILED: &str = "job.failed";

/// An asset pack row was created.
pub const EVENT_PACK_CREATED: &str = "asset_pack.created";

/// An asset pack's status or totals changed.
pub const EVENT_PACK_UPDATED: &str = "asset_pack.updated";
