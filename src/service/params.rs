//! Use-case parameters
//!
//! Inputs to the user service, decoupled from any request format.

use serde::{Deserialize, Serialize};

use crate::domain::UserField;

/// Parameters to create a new user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserParams {
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub password: String,
    pub email: String,
    pub country: String,
}

impl CreateUserParams {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            ..Self::default()
        }
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = last_name.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = country.into();
        self
    }
}

/// Parameters to update an existing user.
///
/// `None` and empty strings both mean "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUserParams {
    pub id: i64,
    /// Version the caller last read
    pub version: u32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nickname: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub country: Option<String>,
}

impl UpdateUserParams {
    pub fn new(id: i64, version: u32) -> Self {
        Self {
            id,
            version,
            ..Self::default()
        }
    }

    pub fn with(mut self, field: UserField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            UserField::FirstName => self.first_name = value,
            UserField::LastName => self.last_name = value,
            UserField::Nickname => self.nickname = value,
            UserField::Password => self.password = value,
            UserField::Email => self.email = value,
            UserField::Country => self.country = value,
        }
        self
    }

    /// Supplied, non-empty field values
    pub fn requested(&self) -> Vec<(UserField, &str)> {
        [
            (UserField::FirstName, &self.first_name),
            (UserField::LastName, &self.last_name),
            (UserField::Nickname, &self.nickname),
            (UserField::Password, &self.password),
            (UserField::Email, &self.email),
            (UserField::Country, &self.country),
        ]
        .into_iter()
        .filter_map(|(field, value)| match value.as_deref() {
            Some(v) if !v.is_empty() => Some((field, v)),
            _ => None,
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_params_builder() {
        let params = CreateUserParams::new("testuser")
            .with_first_name("Test")
            .with_country("uk");

        assert_eq!(params.nickname, "testuser");
        assert_eq!(params.first_name, "Test");
        assert_eq!(params.country, "uk");
        assert!(params.email.is_empty());
    }

    #[test]
    fn test_requested_skips_missing_and_empty() {
        let mut params = UpdateUserParams::new(1, 1)
            .with(UserField::Country, "ab")
            .with(UserField::Email, "");
        params.first_name = None;

        assert_eq!(params.requested(), vec![(UserField::Country, "ab")]);
    }
}
