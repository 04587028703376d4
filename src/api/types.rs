use serde::{Deserialize, Serialize};

use crate::models::{Account, AccountStatus, Role};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Public view of the authenticated account, for display in admin pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminInfo {
    pub username: String,
    pub role: Role,
    pub status: AccountStatus,
}

impl From<&Account> for AdminInfo {
    fn from(account: &Account) -> Self {
        Self {
            username: account.username.clone(),
            role: account.role,
            status: account.status,
        }
    }
}
