use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The only one-time code the demo accepts.
pub const DEMO_OTP: &str = "1234";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub mobile: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn verified(mobile: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            mobile: mobile.into(),
            is_verified: true,
            created_at: Utc::now(),
        }
    }
}

/// A mobile number is 10 digits, starting with 6, 7, 8 or 9.
pub fn is_valid_mobile(mobile: &str) -> bool {
    mobile.len() == 10
        && mobile.chars().all(|c| c.is_ascii_digit())
        && mobile.starts_with(['6', '7', '8', '9'])
}

/// Check a login attempt. There is no OTP delivery; the code is fixed.
pub fn authenticate(mobile: &str, code: &str) -> bool {
    is_valid_mobile(mobile) && code.trim() == DEMO_OTP
}
