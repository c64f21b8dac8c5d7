//! User entity and query filters

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::error::DbError;
use crate::registry::{Entity, TableDef};

/// User record from database
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub is_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for User {
    const TABLE: &'static str = "user";

    fn table_def() -> TableDef {
        TableDef {
            name: "user",
            create: r#"
            CREATE TABLE IF NOT EXISTS "user" (
                id BIGSERIAL PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                username TEXT NOT NULL UNIQUE,
                is_confirmed BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            indexes: &[
                r#"CREATE INDEX IF NOT EXISTS idx_user_email ON "user"(email)"#,
                r#"CREATE INDEX IF NOT EXISTS idx_user_username ON "user"(username)"#,
            ],
            references: &[],
        }
    }
}

/// Fields for a new user. New users always start unconfirmed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
}

/// Partial update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub username: Option<String>,
    pub is_confirmed: Option<bool>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.username.is_none() && self.is_confirmed.is_none()
    }
}

/// Searchable user column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Id,
    Email,
    Username,
    IsConfirmed,
}

impl UserField {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Email => "email",
            Self::Username => "username",
            Self::IsConfirmed => "is_confirmed",
        }
    }
}

impl FromStr for UserField {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "email" => Ok(Self::Email),
            "username" => Ok(Self::Username),
            "is_confirmed" => Ok(Self::IsConfirmed),
            other => Err(DbError::InvalidField(format!("user has no field '{}'", other))),
        }
    }
}

/// Typed value for an equality filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Int(i64),
    Text(String),
    Bool(bool),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// `field = value` condition on the user table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFilter {
    pub field: UserField,
    pub value: FilterValue,
}

impl UserFilter {
    pub fn id(id: i64) -> Self {
        Self {
            field: UserField::Id,
            value: FilterValue::Int(id),
        }
    }

    pub fn email(email: impl Into<String>) -> Self {
        Self {
            field: UserField::Email,
            value: FilterValue::Text(email.into()),
        }
    }

    pub fn username(username: impl Into<String>) -> Self {
        Self {
            field: UserField::Username,
            value: FilterValue::Text(username.into()),
        }
    }

    /// Parse a filter from untyped `field=value` input, checking the
    /// field name and the value's type.
    pub fn parse(field: &str, value: &str) -> Result<Self, DbError> {
        let field: UserField = field.parse()?;
        let value = match field {
            UserField::Id => value.parse().map(FilterValue::Int).map_err(|_| {
                DbError::InvalidField(format!("id must be an integer, got '{}'", value))
            })?,
            UserField::IsConfirmed => value.parse().map(FilterValue::Bool).map_err(|_| {
                DbError::InvalidField(format!("is_confirmed must be true or false, got '{}'", value))
            })?,
            UserField::Email | UserField::Username => FilterValue::Text(value.to_owned()),
        };
        Ok(Self { field, value })
    }
}

impl fmt::Display for UserFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.field.column(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_fields() {
        assert_eq!(UserFilter::parse("id", "7").unwrap(), UserFilter::id(7));
        assert_eq!(
            UserFilter::parse("email", "a@b.io").unwrap(),
            UserFilter::email("a@b.io")
        );
        assert_eq!(
            UserFilter::parse("is_confirmed", "false").unwrap().value,
            FilterValue::Bool(false)
        );
    }

    #[test]
    fn rejects_unknown_field() {
        let err = UserFilter::parse("password", "x").unwrap_err();
        assert!(matches!(err, DbError::InvalidField(_)));
    }

    #[test]
    fn rejects_mistyped_value() {
        let err = UserFilter::parse("id", "seven").unwrap_err();
        assert!(err.to_string().contains("integer"));
    }

    #[test]
    fn filter_display() {
        assert_eq!(UserFilter::username("alice").to_string(), "username=alice");
    }

    #[test]
    fn update_emptiness() {
        assert!(UserUpdate::default().is_empty());
        let update = UserUpdate {
            is_confirmed: Some(true),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
