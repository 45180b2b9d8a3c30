//! Query Filter Composer
//!
//! Builds conjunctive equality filters over allow-listed user columns.
//! Values are always bound as positional parameters.

use std::collections::BTreeMap;

use crate::domain::{UnknownUserField, UserField};

/// Rejected filter key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error(transparent)]
    UnknownField(#[from] UnknownUserField),

    #[error("Filtering on {0} is not allowed")]
    NotFilterable(UserField),
}

/// Validated equality filter: every key is a filterable [`UserField`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    terms: BTreeMap<UserField, String>,
}

impl UserFilter {
    /// Filter matching every visible user
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality term, replacing any previous value for `field`
    pub fn with(mut self, field: UserField, value: impl Into<String>) -> Result<Self, FilterError> {
        if !field.is_filterable() {
            return Err(FilterError::NotFilterable(field));
        }
        self.terms.insert(field, value.into());
        Ok(self)
    }

    /// Validate raw `key -> value` terms against the allow-list
    pub fn from_terms<I, K, V>(terms: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        terms.into_iter().try_fold(Self::new(), |filter, (key, value)| {
            let field: UserField = key.as_ref().parse()?;
            filter.with(field, value)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Terms in a stable order
    pub fn terms(&self) -> impl Iterator<Item = (UserField, &str)> + '_ {
        self.terms.iter().map(|(field, value)| (*field, value.as_str()))
    }
}

/// SQL fragment plus the values for its placeholders, in placeholder order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterClause {
    pub sql: String,
    pub params: Vec<String>,
}

impl FilterClause {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

/// Compose `filter` into `col = $n AND ...`, numbering placeholders from
/// `first_placeholder`.
///
/// An empty filter yields an empty fragment; fixed predicates such as the
/// soft-delete check are the caller's to add.
pub fn compose(filter: &UserFilter, first_placeholder: usize) -> FilterClause {
    let mut expressions = Vec::with_capacity(filter.len());
    let mut params = Vec::with_capacity(filter.len());

    for (index, (field, value)) in filter.terms().enumerate() {
        expressions.push(format!("{} = ${}", field.column(), first_placeholder + index));
        params.push(value.to_string());
    }

    FilterClause {
        sql: expressions.join(" AND "),
        params,
    }
}
