/// All primary keys are UUIDs so demo rows and stored rows can share a list.
pub type DbId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Generate a fresh, time-ordered identifier.
pub fn new_id() -> DbId {
    uuid::Uuid::now_v7()
}
