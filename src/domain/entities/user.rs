//! # User Profile
//!
//! The signed-in user's account as returned by the profile endpoint.
//! Only the balance matters to the trade lifecycle; it is refreshed after
//! escrow is funded and broadcast to balance displays.

use crate::domain::value_objects::{Price, UserId};
use serde::{Deserialize, Serialize};

/// Account snapshot of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account identifier.
    pub id: Option<UserId>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email.
    pub email: String,
    /// Platform cash balance in USD.
    pub balance: Price,
}

impl UserProfile {
    /// "First Last", trimmed.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
