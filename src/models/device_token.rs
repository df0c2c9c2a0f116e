use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::recipient::Recipient;

/// Push registration for one device. Deactivated when the provider reports
/// the token permanently invalid; never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceToken {
    pub token: String,
    #[serde(flatten)]
    pub recipient: Recipient,
    pub is_active: bool,
    pub registered_at: DateTime<Utc>,
}
