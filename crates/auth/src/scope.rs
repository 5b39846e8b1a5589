//! Request-scoped identity storage.
//!
//! Every request gets its own slot, created by [`ContextScope::run`] around
//! the whole request-handling future. The slot lives in a tokio task-local, so
//! two requests handled on the same worker thread never see each other's
//! identity, and the slot is torn down when the future completes, fails,
//! panics or is dropped.
//!
//! Tasks spawned from inside a request do not inherit the slot; pass the
//! `Arc<IdentityContext>` explicitly to them.

use std::cell::RefCell;
use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::{IdentityContext, UserId};

tokio::task_local! {
    static SLOT: RefCell<Option<Arc<IdentityContext>>>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// `bind` was called outside of [`ContextScope::run`].
    #[error("no request scope is active")]
    Detached,
}

/// Static accessors for the identity bound to the current request.
pub struct ContextScope;

impl ContextScope {
    /// Run `fut` inside a fresh, empty request slot.
    pub async fn run<F: Future>(fut: F) -> F::Output {
        SLOT.scope(RefCell::new(None), fut).await
    }

    /// Synchronous variant of [`run`](Self::run).
    pub fn run_sync<R>(f: impl FnOnce() -> R) -> R {
        SLOT.sync_scope(RefCell::new(None), f)
    }

    /// Whether a request slot is active on the current task.
    pub fn is_active() -> bool {
        SLOT.try_with(|_| ()).is_ok()
    }

    /// Bind `context` to the current request. Last write wins.
    pub fn bind(context: IdentityContext) -> Result<(), ScopeError> {
        SLOT.try_with(|slot| {
            let previous = slot.replace(Some(Arc::new(context)));
            if let Some(previous) = previous {
                tracing::warn!(
                    previous_user_id = %previous.user_id(),
                    "identity already bound for this request; overwriting"
                );
            }
        })
        .map_err(|_| ScopeError::Detached)
    }

    /// The identity bound to the current request, if any.
    pub fn current() -> Option<Arc<IdentityContext>> {
        SLOT.try_with(|slot| slot.borrow().clone()).ok().flatten()
    }

    /// Remove the binding. No-op when nothing is bound or no scope is active.
    pub fn clear() {
        let _ = SLOT.try_with(|slot| slot.borrow_mut().take());
    }

    pub fn current_user_id() -> Option<UserId> {
        Self::current().map(|c| c.user_id())
    }

    pub fn current_username() -> Option<String> {
        Self::current().map(|c| c.username().to_string())
    }

    pub fn current_real_name() -> Option<String> {
        Self::current().and_then(|c| c.real_name().map(str::to_string))
    }

    pub fn is_authenticated() -> bool {
        Self::current().is_some()
    }

    pub fn is_super_admin() -> bool {
        Self::current().is_some_and(|c| c.is_super_admin())
    }

    pub fn has_role(code: &str) -> bool {
        Self::current().is_some_and(|c| c.has_role(code))
    }

    pub fn has_any_role<S: AsRef<str>>(codes: &[S]) -> bool {
        Self::current().is_some_and(|c| c.has_any_role(codes))
    }

    pub fn has_all_roles<S: AsRef<str>>(codes: &[S]) -> bool {
        Self::current().is_some_and(|c| c.has_all_roles(codes))
    }

    pub fn has_permission(code: &str) -> bool {
        Self::current().is_some_and(|c| c.has_permission(code))
    }

    pub fn has_any_permission<S: AsRef<str>>(codes: &[S]) -> bool {
        Self::current().is_some_and(|c| c.has_any_permission(codes))
    }

    pub fn has_all_permissions<S: AsRef<str>>(codes: &[S]) -> bool {
        Self::current().is_some_and(|c| c.has_all_permissions(codes))
    }
}
