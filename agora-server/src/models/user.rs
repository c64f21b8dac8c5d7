//! User request and response bodies
//!
//! Username: 5-20 characters. Email: `local@domain.tld`. Password: 8-20
//! characters with a lowercase letter, an uppercase letter, a digit and one
//! of `!@#$%^&*`. The password is checked and then discarded; it is never
//! persisted.

use agora_db::models::{NewUser, User, UserUpdate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::validation::{check_length, ValidationError};

const USERNAME_MIN: usize = 5;
const USERNAME_MAX: usize = 20;
const PASSWORD_MIN: usize = 8;
const PASSWORD_MAX: usize = 20;
const PASSWORD_SPECIALS: &str = "!@#$%^&*";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("invalid email regex")
});

fn validate_username(username: &str) -> Result<(), ValidationError> {
    check_length("username", username, USERNAME_MIN, USERNAME_MAX)
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::Empty { field: "email" });
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidFormat {
            field: "email",
            reason: "must look like name@example.com",
        });
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ValidationError> {
    check_length("password", password, PASSWORD_MIN, PASSWORD_MAX)?;

    let rules: [(fn(char) -> bool, &'static str); 4] = [
        (|c| c.is_lowercase(), "must contain at least one lowercase letter"),
        (|c| c.is_uppercase(), "must contain at least one uppercase letter"),
        (|c| c.is_ascii_digit(), "must contain at least one digit"),
        (
            |c| PASSWORD_SPECIALS.contains(c),
            "must contain at least one special character: !@#$%^&*",
        ),
    ];

    for (matches, reason) in rules {
        if !password.chars().any(matches) {
            return Err(ValidationError::InvalidFormat {
                field: "password",
                reason,
            });
        }
    }
    Ok(())
}

/// POST /v1/users/create body
#[derive(Debug, Deserialize)]
pub struct UserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl UserRequest {
    /// Validate every field and produce the row to insert.
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;

        Ok(NewUser {
            email: self.email,
            username: self.username,
        })
    }
}

/// PATCH /v1/users/{id} body; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<String>,
    pub is_confirmed: Option<bool>,
}

impl UserPatch {
    pub fn validate(self) -> Result<UserUpdate, ValidationError> {
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }

        let update = UserUpdate {
            email: self.email,
            username: self.username,
            is_confirmed: self.is_confirmed,
        };
        if update.is_empty() {
            return Err(ValidationError::Empty { field: "update" });
        }
        Ok(update)
    }
}

/// User as returned by the API
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_confirmed: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            username: u.username,
            is_confirmed: u.is_confirmed,
            created_at: u.created_at.to_rfc3339(),
            updated_at: u.updated_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> UserRequest {
        UserRequest {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn valid_request_drops_password() {
        let user = request("alice", "alice@example.com", "Secret1!")
            .validate()
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn username_bounds() {
        let err = request("abcd", "a@b.io", "Secret1!").validate().unwrap_err();
        assert!(matches!(err, ValidationError::TooShort { field: "username", .. }));

        let err = request(&"a".repeat(21), "a@b.io", "Secret1!")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { field: "username", .. }));

        assert!(request(&"a".repeat(20), "a@b.io", "Secret1!").validate().is_ok());
    }

    #[test]
    fn rejects_bad_email() {
        for email in ["plain", "a@b", "@example.com", "a b@example.com"] {
            let err = request("alice", email, "Secret1!").validate().unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidFormat { field: "email", .. }),
                "{} should be rejected",
                email
            );
        }
        assert!(request("alice", "first.last+tag@sub-domain.co.uk", "Secret1!")
            .validate()
            .is_ok());
    }

    #[test]
    fn password_rules() {
        let cases = [
            ("Sh0rt!", "at least 8"),
            ("NOLOWER1!", "lowercase"),
            ("noupper1!", "uppercase"),
            ("NoDigits!", "digit"),
            ("NoSpecial1", "special"),
        ];
        for (password, expected) in cases {
            let err = request("alice", "a@b.io", password).validate().unwrap_err();
            assert!(
                err.to_string().contains(expected),
                "{}: got '{}'",
                password,
                err
            );
        }
    }

    #[test]
    fn patch_requires_a_field() {
        let err = UserPatch::default().validate().unwrap_err();
        assert_eq!(err, ValidationError::Empty { field: "update" });

        let update = UserPatch {
            is_confirmed: Some(true),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(update.is_confirmed, Some(true));
    }

    #[test]
    fn patch_validates_present_fields() {
        let err = UserPatch {
            email: Some("nope".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { field: "email", .. }));
    }
}
