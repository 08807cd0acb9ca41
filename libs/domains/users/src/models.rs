use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Fixed at registration; self-registered accounts are always `USER`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "ADMIN"),
            Role::User => write!(f, "USER"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "USER" => Ok(Role::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Stored user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    /// Unique login name
    pub name: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Insert payload handed to a repository; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub password_hash: String,
    pub role: Role,
}

/// Public view of a user, as nested in project members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUser {
    #[validate(length(min = 1, max = 50))]
    #[schema(example = "alice")]
    pub name: String,
    #[validate(length(min = 8, max = 128))]
    #[schema(example = "correct-horse")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Returned by register and login.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: i32,
    /// Bearer token for the `Authorization` header
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_text() {
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!(Role::User.to_string(), "USER");
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_response_hides_password_hash() {
        let user = User {
            id: 3,
            name: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(json, serde_json::json!({"id": 3, "name": "alice", "role": "USER"}));
    }

    #[test]
    fn test_register_limits() {
        let ok = RegisterUser {
            name: "a".to_string(),
            password: "12345678".to_string(),
        };
        assert!(ok.validate().is_ok());

        let long_name = RegisterUser {
            name: "n".repeat(51),
            password: "12345678".to_string(),
        };
        assert!(long_name.validate().is_err());

        let short_password = RegisterUser {
            name: "alice".to_string(),
            password: "1234567".to_string(),
        };
        assert!(short_password.validate().is_err());
    }
}
