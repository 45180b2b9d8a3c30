//! User Service
//!
//! Get/list/create/update/delete use cases over a [`UserStore`].

use std::collections::HashMap;

use crate::domain::{OperationContext, User};
use crate::store::{UserFilter, UserStore};

use super::{CreateUserParams, ServiceError, UpdateUserParams};

/// Orchestrates the user aggregate and the versioned store
#[derive(Debug, Clone)]
pub struct UserService<S> {
    store: S,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch a visible user
    pub async fn get_user(&self, ctx: &OperationContext, id: i64) -> Result<User, ServiceError> {
        let user = self
            .store
            .get(ctx, id)
            .await
            .map_err(|e| ServiceError::from_store("get user", e))?;

        if user.is_zero() {
            return Err(ServiceError::NotFound(id));
        }

        Ok(user)
    }

    /// List visible users matching every `field = value` term
    pub async fn list_users(
        &self,
        ctx: &OperationContext,
        terms: &HashMap<String, String>,
    ) -> Result<Vec<User>, ServiceError> {
        let filter = UserFilter::from_terms(terms.iter().map(|(k, v)| (k, v.clone())))?;

        self.store
            .list(ctx, &filter)
            .await
            .map_err(|e| ServiceError::from_store("list users", e))
    }

    /// Store a brand-new user at version 0
    pub async fn create_user(
        &self,
        ctx: &OperationContext,
        params: CreateUserParams,
    ) -> Result<User, ServiceError> {
        let user = User::new(
            0,
            params.first_name,
            params.last_name,
            params.nickname,
            params.password,
            params.email,
            params.country,
        );

        let created = self
            .store
            .store(ctx, &user, 0)
            .await
            .map_err(|e| ServiceError::from_store("create user", e))?;

        tracing::debug!(user_id = created.id(), "User created");
        Ok(created)
    }

    /// Apply the supplied fields and store them against `params.version`.
    ///
    /// Fields equal to the current value are skipped; if nothing is left the
    /// store is never called and [`ServiceError::NoChanges`] is returned.
    pub async fn update_user(
        &self,
        ctx: &OperationContext,
        params: UpdateUserParams,
    ) -> Result<User, ServiceError> {
        let mut user = self.get_user(ctx, params.id).await?;

        for (field, value) in params.requested() {
            if user.get(field) != value {
                user.set(field, value);
            }
        }

        if !user.has_changes() {
            tracing::debug!(user_id = params.id, "Update carries no changes, skipping store");
            return Err(ServiceError::NoChanges);
        }

        self.store
            .store(ctx, &user, params.version)
            .await
            .map_err(|e| {
                let err = ServiceError::from_store("update user", e);
                if err.is_conflict_error() {
                    tracing::warn!(
                        user_id = params.id,
                        expected_version = params.version,
                        error = %err,
                        "Update rejected"
                    );
                }
                err
            })
    }

    /// Soft delete; deleting a missing or already disabled user succeeds
    pub async fn delete_user(&self, ctx: &OperationContext, id: i64) -> Result<(), ServiceError> {
        self.store
            .delete(ctx, id)
            .await
            .map_err(|e| ServiceError::from_store("delete user", e))
    }
}
