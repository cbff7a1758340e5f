use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: u64,
    #[schema(example = "2024-05-10T09:01:00Z", value_type = String, format = "date-time")]
    pub timestamp: DateTime<Utc>,
    pub user_id: u64,
    pub user_name: String,
    #[schema(example = "User Login")]
    pub action: String,
    pub details: String,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub timestamp: DateTime<Utc>,
    pub user_id: u64,
    pub user_name: String,
    pub action: String,
    pub details: String,
}

impl NewAuditLog {
    pub fn into_entry(self, id: u64) -> AuditLogEntry {
        AuditLogEntry {
            id,
            timestamp: self.timestamp,
            user_id: self.user_id,
            user_name: self.user_name,
            action: self.action,
            details: self.details,
        }
    }
}
