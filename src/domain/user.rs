//! User Aggregate
//!
//! Change-tracking user record. Carries no knowledge of storage or transport.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::Meta;

/// Mutable business fields of a [`User`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserField {
    FirstName,
    LastName,
    Nickname,
    Password,
    Email,
    Country,
}

impl UserField {
    pub const ALL: [UserField; 6] = [
        UserField::FirstName,
        UserField::LastName,
        UserField::Nickname,
        UserField::Password,
        UserField::Email,
        UserField::Country,
    ];

    /// Column name in the `users` table
    pub fn column(&self) -> &'static str {
        match self {
            UserField::FirstName => "first_name",
            UserField::LastName => "last_name",
            UserField::Nickname => "nickname",
            UserField::Password => "password",
            UserField::Email => "email",
            UserField::Country => "country",
        }
    }

    /// Whether listings may filter on this field
    pub fn is_filterable(&self) -> bool {
        !matches!(self, UserField::Password)
    }
}

impl fmt::Display for UserField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for UserField {
    type Err = UnknownUserField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserField::ALL
            .into_iter()
            .find(|field| field.column() == s)
            .ok_or_else(|| UnknownUserField(s.to_string()))
    }
}

/// Returned when a string does not name a [`UserField`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown user field: {0}")]
pub struct UnknownUserField(pub String);

/// User Aggregate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Storage identity, 0 until first stored
    id: i64,
    first_name: String,
    last_name: String,
    /// Unique among stored users
    nickname: String,
    password: String,
    email: String,
    country: String,
    meta: Meta<UserField>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: 0,
            first_name: String::new(),
            last_name: String::new(),
            nickname: String::new(),
            password: String::new(),
            email: String::new(),
            country: String::new(),
            meta: Meta::new(),
        }
    }
}

impl User {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Build a user with fresh metadata (version 0, no changes)
    pub fn new(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        nickname: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            nickname: nickname.into(),
            password: password.into(),
            email: email.into(),
            country: country.into(),
            meta: Meta::new(),
        }
    }

    /// Apply metadata loaded from storage without recording a change
    pub fn hydrate_meta(
        &mut self,
        version: u32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
        disabled: bool,
    ) {
        self.meta.hydrate(version, created_at, updated_at, disabled);
    }

    /// True when nothing identifies this user at all
    pub fn is_zero(&self) -> bool {
        self.id == 0
            && self.first_name.is_empty()
            && self.last_name.is_empty()
            && self.nickname.is_empty()
            && self.password.is_empty()
            && self.email.is_empty()
            && self.country.is_empty()
    }

    // =========================================================================
    // Setters (each records a change)
    // =========================================================================

    pub fn set_first_name(&mut self, first_name: impl Into<String>) {
        self.first_name = first_name.into();
        self.meta.register_change(UserField::FirstName);
    }

    pub fn set_last_name(&mut self, last_name: impl Into<String>) {
        self.last_name = last_name.into();
        self.meta.register_change(UserField::LastName);
    }

    pub fn set_nickname(&mut self, nickname: impl Into<String>) {
        self.nickname = nickname.into();
        self.meta.register_change(UserField::Nickname);
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
        self.meta.register_change(UserField::Password);
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.meta.register_change(UserField::Email);
    }

    pub fn set_country(&mut self, country: impl Into<String>) {
        self.country = country.into();
        self.meta.register_change(UserField::Country);
    }

    /// Assign `value` to `field` through the matching setter
    pub fn set(&mut self, field: UserField, value: impl Into<String>) {
        match field {
            UserField::FirstName => self.set_first_name(value),
            UserField::LastName => self.set_last_name(value),
            UserField::Nickname => self.set_nickname(value),
            UserField::Password => self.set_password(value),
            UserField::Email => self.set_email(value),
            UserField::Country => self.set_country(value),
        }
    }

    pub fn has_changes(&self) -> bool {
        self.meta.has_changes()
    }

    pub fn clear_changes(&mut self) {
        self.meta.clear_changes();
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// Current value of `field`
    pub fn get(&self, field: UserField) -> &str {
        match field {
            UserField::FirstName => &self.first_name,
            UserField::LastName => &self.last_name,
            UserField::Nickname => &self.nickname,
            UserField::Password => &self.password,
            UserField::Email => &self.email,
            UserField::Country => &self.country,
        }
    }

    pub fn meta(&self) -> &Meta<UserField> {
        &self.meta
    }

    pub fn version(&self) -> u32 {
        self.meta.version()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta.created_at()
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.meta.updated_at()
    }

    pub fn is_disabled(&self) -> bool {
        self.meta.is_disabled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(0, "Test", "Test", "testuser", "qwerty", "example@example.qqq", "uk")
    }

    #[test]
    fn test_user_new() {
        let user = sample_user();

        assert_eq!(user.id(), 0);
        assert_eq!(user.first_name(), "Test");
        assert_eq!(user.nickname(), "testuser");
        assert_eq!(user.country(), "uk");
        assert_eq!(user.version(), 0);
        assert!(!user.is_disabled());
        assert!(!user.has_changes());
    }

    #[test]
    fn test_setter_registers_change() {
        let mut user = sample_user();

        user.set_country("ab");

        assert_eq!(user.country(), "ab");
        assert!(user.has_changes());
        assert!(user.meta().is_changed(UserField::Country));
        assert!(!user.meta().is_changed(UserField::Email));
    }

    #[test]
    fn test_setter_registers_change_even_for_same_value() {
        let mut user = sample_user();

        user.set_country("uk");

        assert!(user.has_changes());
    }

    #[test]
    fn test_generic_setter_dispatches_to_field() {
        let mut user = sample_user();

        for field in UserField::ALL {
            user.set(field, format!("new-{}", field));
        }

        for field in UserField::ALL {
            assert_eq!(user.get(field), format!("new-{}", field));
        }
        assert_eq!(user.meta().changes().count(), UserField::ALL.len());
    }

    #[test]
    fn test_hydrate_meta_keeps_changes_empty() {
        let mut user = sample_user();
        let now = Utc::now();

        user.hydrate_meta(3, now, now, false);

        assert_eq!(user.version(), 3);
        assert!(!user.has_changes());
    }

    #[test]
    fn test_clear_changes() {
        let mut user = sample_user();
        user.set_email("other@example.qqq");
        user.set_nickname("other");

        user.clear_changes();

        assert!(!user.has_changes());
        assert_eq!(user.nickname(), "other");
    }

    #[test]
    fn test_is_zero() {
        assert!(User::default().is_zero());
        assert!(!sample_user().is_zero());
        assert!(!User::new(5, "", "", "", "", "", "").is_zero());
    }

    #[test]
    fn test_user_field_parsing() {
        assert_eq!("country".parse::<UserField>(), Ok(UserField::Country));
        assert_eq!("first_name".parse::<UserField>(), Ok(UserField::FirstName));
        assert_eq!(
            "id; DROP TABLE users".parse::<UserField>(),
            Err(UnknownUserField("id; DROP TABLE users".to_string()))
        );
    }

    #[test]
    fn test_password_is_not_filterable() {
        assert!(!UserField::Password.is_filterable());
        assert!(UserField::Nickname.is_filterable());
    }
}
