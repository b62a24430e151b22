//! Session DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response to a session initialisation request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInit {
    pub session_id: Uuid,
}
