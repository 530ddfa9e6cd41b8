//! Client-related types shared between the sync layer and the API surface
//!
//! Common request/response types used in auth communication.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role.
///
/// ADMIN is the back-office account; WAITER and KITCHEN are the employee
/// roles. The admin and employee credential slots are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Waiter,
    Kitchen,
}

impl Role {
    pub fn is_employee(&self) -> bool {
        matches!(self, Role::Waiter | Role::Kitchen)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::Waiter => write!(f, "WAITER"),
            Role::Kitchen => write!(f, "KITCHEN"),
        }
    }
}

/// Unknown role string received from the backend or storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "WAITER" => Ok(Role::Waiter),
            "KITCHEN" => Ok(Role::Kitchen),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub user: AccountInfo,
}

/// Account information as returned by the login endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub name: String,
    pub role: Role,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
}

/// Persisted session value, the shape stored under `userData` /
/// `employeeData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub name: String,
    pub role: Role,
    pub email: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
}

impl StoredUser {
    /// Build the persisted value from a login response.
    pub fn from_login(resp: &LoginResponse) -> Self {
        Self {
            name: resp.user.name.clone(),
            role: resp.user.role,
            email: resp.user.username.clone(),
            token: resp.access_token.clone(),
            restaurant_id: resp.user.restaurant_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("WAITER".parse::<Role>().unwrap(), Role::Waiter);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn stored_user_keeps_login_fields() {
        let resp = LoginResponse {
            access_token: "tok".into(),
            refresh_token: None,
            user: AccountInfo {
                name: "Ana".into(),
                role: Role::Kitchen,
                username: "ana@example.com".into(),
                restaurant_id: Some("r1".into()),
            },
        };
        let stored = StoredUser::from_login(&resp);
        assert_eq!(stored.email, "ana@example.com");
        assert_eq!(stored.token, "tok");
        assert_eq!(stored.role, Role::Kitchen);
    }
}
