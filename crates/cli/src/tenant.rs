// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tenant resolution for drains.

use std::sync::Arc;

use crate::prefs::Prefs;
use crate::transport::{BoxFuture, RemoteError, RemoteStore};

/// Why no tenant is available.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TenantError {
    #[error("no session: run 'fieldsync login <token>' first")]
    NoSession,

    #[error("session has no organization membership")]
    NoMembership,

    #[error("tenant lookup failed: {0}")]
    Lookup(#[from] RemoteError),
}

/// Resolves the organization the current user writes into.
pub trait TenantResolver: Send + Sync {
    fn resolve(&self) -> BoxFuture<'_, Result<String, TenantError>>;
}

/// Resolves the tenant from the stored session token via the remote store.
pub struct SessionTenantResolver {
    prefs: Arc<Prefs>,
    remote: Arc<dyn RemoteStore>,
}

impl SessionTenantResolver {
    pub fn new(prefs: Arc<Prefs>, remote: Arc<dyn RemoteStore>) -> Self {
        SessionTenantResolver { prefs, remote }
    }
}

impl TenantResolver for SessionTenantResolver {
    fn resolve(&self) -> BoxFuture<'_, Result<String, TenantError>> {
        Box::pin(async move {
            let token = self.prefs.session_token().ok_or(TenantError::NoSession)?;
            self.remote
                .lookup_tenant(&token)
                .await?
                .ok_or(TenantError::NoMembership)
        })
    }
}

#[cfg(test)]
#[path = "tenant_tests.rs"]
mod tests;
