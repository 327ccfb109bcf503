use crate::models::{NewUser, User, UserChanges};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Names are stored trimmed, so whitespace alone counts as empty.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Name must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = not_blank)
    )]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

impl From<CreateUserRequest> for NewUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(
        length(min = 1, max = 100, message = "Name must be 1-100 characters"),
        custom(function = not_blank)
    )]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        Self {
            name: req.name.map(|n| n.trim().to_string()),
            email: req.email.map(|e| e.trim().to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            name: u.name,
            email: u.email,
            created_utc: u.created_utc,
            updated_utc: u.updated_utc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_name_rejected() {
        let req = CreateUserRequest {
            name: "   ".to_string(),
            email: "ada@example.com".to_string(),
        };
        assert!(req.validate().is_err());

        let req = UpdateUserRequest {
            name: Some("\t ".to_string()),
            email: None,
        };
        assert!(req.validate().is_err());

        let req = CreateUserRequest {
            name: "  Ada ".to_string(),
            email: "ada@example.com".to_string(),
        };
        assert!(req.validate().is_ok());
        assert_eq!(NewUser::from(req).name, "Ada");
    }
}
