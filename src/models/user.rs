use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Manager,
    Staff,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Staff => "staff",
        }
    }

    /// Whether the role may edit products and categories.
    pub fn can_manage_inventory(&self) -> bool {
        match self {
            UserRole::Admin | UserRole::Manager => true,
            UserRole::Staff => false,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "manager" => Ok(UserRole::Manager),
            "staff" => Ok(UserRole::Staff),
            other => Err(AppError::UnknownTag {
                field: "role",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_tags() {
        for role in [UserRole::Admin, UserRole::Manager, UserRole::Staff] {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!(matches!(
            "Admin".parse::<UserRole>(),
            Err(AppError::UnknownTag { field: "role", .. })
        ));
    }

    #[test]
    fn test_inventory_permission() {
        assert!(UserRole::Admin.can_manage_inventory());
        assert!(UserRole::Manager.can_manage_inventory());
        assert!(!UserRole::Staff.can_manage_inventory());
    }

    #[test]
    fn test_user_rejects_unknown_role() {
        let row = json!({
            "id": "a1", "email": "chef@example.com", "role": "owner",
            "created_at": "2024-01-01T00:00:00Z"
        });
        assert!(serde_json::from_value::<User>(row).is_err());
    }
}
