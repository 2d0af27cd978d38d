use chrono::Utc;
use uuid::Uuid;

pub fn create_id() -> String {
    return Uuid::new_v4().simple().to_string();
}

/// Milliseconds since the unix epoch, the unit every persisted timestamp uses.
pub fn now_millis() -> i64 {
    return Utc::now().timestamp_millis();
}
