use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use validator::{Validate, ValidationError};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub account_tier_id: Uuid,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct UserInsert {
    pub username: String,
    pub password_hash: String,
    pub account_tier_id: Uuid,
    pub is_active: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NewUser {
    #[validate(
        length(min = 1, max = 150, message = "Username is required"),
        custom(function = "validate_not_blank", message = "Username cannot be blank")
    )]
    pub username: String,

    #[validate(
        length(min = 1, message = "Password is required"),
        custom(function = "validate_not_blank", message = "Password cannot be blank")
    )]
    pub password: String,

    /// Account tier id the new user signs up under.
    pub account_type: Uuid,
}

/// Whitespace-only values pass `length` checks but are still unusable.
fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

impl NewUser {
    pub fn prepare_for_insert(&self, password_hash: String) -> UserInsert {
        UserInsert {
            username: self.username.clone(),
            password_hash,
            account_tier_id: self.account_type,
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub id: Uuid,
    pub username: String,
    pub account_type: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginUser {
    #[validate(length(min = 1, message = "Username cannot be empty"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password cannot be empty"))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            password: password.to_string(),
            account_type: Uuid::new_v4(),
        }
    }

    #[test]
    fn valid_signup_input_passes() {
        assert!(new_user("michael", "hunter2!").validate().is_ok());
    }

    #[test]
    fn blank_username_is_rejected() {
        assert!(new_user("", "hunter2!").validate().is_err());
        assert!(new_user("   ", "hunter2!").validate().is_err());
    }

    #[test]
    fn blank_password_is_rejected() {
        assert!(new_user("michael", "").validate().is_err());
        assert!(new_user("michael", " \t ").validate().is_err());
    }
}
