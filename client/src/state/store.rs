//! Storefront store: session, loading flag, pickup point, delivery modal.
//!
//! SYSTEM CONTEXT
//! ==============
//! Pages and components hold a [`Store`] handed to them by whoever built the
//! app; there is no global instance, so independent stores (one per test,
//! one per tab) never share state except through the storage they are given.
//!
//! DESIGN
//! ======
//! The store is the only writer of the session keys in durable storage. Every
//! identity change goes through [`Store::set_user`] or [`Store::clear_user`],
//! which update memory and storage together. Mirroring is best-effort: a
//! failed storage write is logged and the in-memory state still changes.
//!
//! `logout` clears the local session on every path, including when the
//! server call fails and when the future is dropped before it resolves.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use super::session::Session;
use crate::net::api::AuthApi;
use crate::net::types::{ApiError, Credentials, LoginGrant};
use crate::util::storage::{
    AUTH_TOKEN_KEY, SELECTED_POINT_KEY, SESSION_KEYS, Storage, USER_EMAIL_KEY, USER_NAME_KEY, USER_ROLE_KEY,
    load_json, save_json,
};

/// Identity to commit with [`Store::set_user`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserCandidate {
    pub token: String,
    pub name: String,
    pub email: String,
    pub role: i64,
}

impl UserCandidate {
    /// Build a candidate from a login grant, falling back to the submitted
    /// email for any identity field the server left out.
    #[must_use]
    pub fn from_grant(grant: LoginGrant, submitted_email: &str) -> Self {
        Self {
            token: grant.token,
            name: grant.name.unwrap_or_else(|| submitted_email.to_owned()),
            email: grant.email.unwrap_or_else(|| submitted_email.to_owned()),
            role: grant.role,
        }
    }
}

/// Read-only view of every derived query, for display and logging.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoreSnapshot {
    pub logged_in: bool,
    pub name: String,
    pub email: String,
    pub role: Option<i64>,
    pub is_admin: bool,
    pub is_manager: bool,
    pub is_user: bool,
    pub is_loading: bool,
    pub selected_point: Option<Value>,
    pub show_delivery_modal: bool,
}

pub struct Store {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn Storage>,
    is_loading: bool,
    user: Session,
    selected_point: Option<Value>,
    show_delivery_modal: bool,
}

impl Store {
    /// Build a store, rehydrating the session and pickup point from `storage`.
    ///
    /// A persisted session whose role cannot be coerced is discarded: its
    /// keys are removed and the store starts logged out.
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn Storage>) -> Self {
        let user = match Session::rehydrate(storage.as_ref()) {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "discarding persisted session with malformed role");
                let mut user = Session::logged_out();
                clear_session(&mut user, storage.as_ref());
                user
            }
        };
        let selected_point = load_json::<Value>(storage.as_ref(), SELECTED_POINT_KEY).filter(|p| !p.is_null());
        tracing::debug!(logged_in = user.logged_in, has_point = selected_point.is_some(), "store rehydrated");

        Self { api, storage, is_loading: false, user, selected_point, show_delivery_modal: false }
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.user
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.user.logged_in
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user.name
    }

    #[must_use]
    pub fn user_email(&self) -> &str {
        &self.user.email
    }

    #[must_use]
    pub fn user_role(&self) -> Option<i64> {
        self.user.role
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    #[must_use]
    pub fn is_manager(&self) -> bool {
        self.user.is_manager()
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        self.user.is_user()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn selected_point(&self) -> Option<&Value> {
        self.selected_point.as_ref()
    }

    #[must_use]
    pub fn show_delivery_modal(&self) -> bool {
        self.show_delivery_modal
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            logged_in: self.user.logged_in,
            name: self.user.name.clone(),
            email: self.user.email.clone(),
            role: self.user.role,
            is_admin: self.is_admin(),
            is_manager: self.is_manager(),
            is_user: self.is_user(),
            is_loading: self.is_loading,
            selected_point: self.selected_point.clone(),
            show_delivery_modal: self.show_delivery_modal,
        }
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    pub fn start_loading(&mut self) {
        self.is_loading = true;
    }

    pub fn stop_loading(&mut self) {
        self.is_loading = false;
    }

    /// Commit `candidate` as the logged-in identity and persist it.
    ///
    /// The token is written as given; callers that need a non-empty token
    /// get one from [`Store::login`].
    pub fn set_user(&mut self, candidate: UserCandidate) {
        let UserCandidate { token, name, email, role } = candidate;
        let storage = self.storage.as_ref();
        persist(storage, AUTH_TOKEN_KEY, &token);
        persist(storage, USER_NAME_KEY, &name);
        persist(storage, USER_EMAIL_KEY, &email);
        persist(storage, USER_ROLE_KEY, &role.to_string());
        self.user = Session::logged_in(name, email, role);
    }

    /// Reset to the logged-out session and remove the session keys.
    pub fn clear_user(&mut self) {
        clear_session(&mut self.user, self.storage.as_ref());
    }

    /// Store the chosen pickup point and mirror it as JSON.
    ///
    /// `Value::Null` clears the selection.
    pub fn set_selected_point(&mut self, point: Value) {
        if point.is_null() {
            self.clear_selected_point();
            return;
        }
        if let Err(e) = save_json(self.storage.as_ref(), SELECTED_POINT_KEY, &point) {
            tracing::warn!(key = SELECTED_POINT_KEY, error = %e, "failed to persist selected point");
        }
        self.selected_point = Some(point);
    }

    pub fn clear_selected_point(&mut self) {
        self.selected_point = None;
        forget(self.storage.as_ref(), SELECTED_POINT_KEY);
    }

    pub fn set_show_delivery_modal(&mut self, show: bool) {
        self.show_delivery_modal = show;
    }

    // =========================================================================
    // ACTIONS
    // =========================================================================

    /// Authenticate with the server and commit the returned identity.
    ///
    /// Name and email fall back to the submitted email when the server omits
    /// them. State is untouched on any error.
    ///
    /// # Errors
    ///
    /// Returns transport errors unchanged, and
    /// [`ApiError::InvalidServerResponse`] when the payload has no usable
    /// token or role.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), ApiError> {
        let grant = match self.api.login(credentials).await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::debug!(error = %e, "login failed");
                return Err(e);
            }
        };
        let candidate = UserCandidate::from_grant(grant, &credentials.email);
        tracing::info!(email = %candidate.email, role = candidate.role, "logged in");
        self.set_user(candidate);
        Ok(())
    }

    /// Notify the server, then clear the local session regardless of outcome.
    pub async fn logout(&mut self) {
        let guard = ClearSessionOnDrop { user: &mut self.user, storage: self.storage.as_ref() };
        if let Err(e) = self.api.logout().await {
            tracing::warn!(error = %e, "logout notification failed; clearing local session anyway");
        }
        drop(guard);
        tracing::info!("logged out");
    }
}

/// Clears the session when dropped, so a cancelled `logout` still resets.
struct ClearSessionOnDrop<'a> {
    user: &'a mut Session,
    storage: &'a dyn Storage,
}

impl Drop for ClearSessionOnDrop<'_> {
    fn drop(&mut self) {
        clear_session(self.user, self.storage);
    }
}

fn clear_session(user: &mut Session, storage: &dyn Storage) {
    *user = Session::logged_out();
    for key in SESSION_KEYS {
        forget(storage, key);
    }
}

fn persist(storage: &dyn Storage, key: &str, value: &str) {
    if let Err(e) = storage.set(key, value) {
        tracing::warn!(key, error = %e, "failed to persist session value");
    }
}

fn forget(storage: &dyn Storage, key: &str) {
    if let Err(e) = storage.remove(key) {
        tracing::warn!(key, error = %e, "failed to remove stored value");
    }
}
