use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Anonymous,
    User,
    Admin,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "user" | "customer" => Self::User,
            _ => Self::Anonymous,
        }
    }
}

/// The caller of an ingest or query operation.
///
/// Resolved once per request by the HTTP layer and passed explicitly into the
/// core so that nothing reads ambient request state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    pub user_id: Option<String>,
    pub role: Role,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
