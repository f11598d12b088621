use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteChangeRequest {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub walker_id: Uuid,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl RouteChangeRequest {
    pub fn new(trip_id: Uuid, walker_id: Uuid, reason: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            trip_id,
            walker_id,
            reason,
            created_at: Utc::now(),
        }
    }
}
