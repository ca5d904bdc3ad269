use std::sync::Arc;

use crate::rule::RateLimitScope;

/// Keys that select which counter of a scoped rule a call is charged to
///
/// IP rules always share a single counter. Account and connection rules need
/// the matching key, otherwise acquisition fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeKeys {
    api_key: Option<Arc<str>>,
    connection: Option<Arc<str>>,
}

impl ScopeKeys {
    /// No account or connection keys, only IP rules can be charged
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key_id: impl Into<Arc<str>>) -> Self {
        self.api_key = Some(api_key_id.into());
        self
    }

    pub fn with_connection(mut self, connection_id: impl Into<Arc<str>>) -> Self {
        self.connection = Some(connection_id.into());
        self
    }

    pub fn api_key(&self) -> Option<&Arc<str>> {
        self.api_key.as_ref()
    }

    pub fn connection(&self) -> Option<&Arc<str>> {
        self.connection.as_ref()
    }

    /// Counter key for a rule of the given scope
    pub(crate) fn key_for(&self, scope: RateLimitScope) -> Option<Arc<str>> {
        match scope {
            RateLimitScope::Ip => Some(Arc::from("")),
            RateLimitScope::ApiKey => self.api_key.clone(),
            RateLimitScope::Connection => self.connection.clone(),
        }
    }
}
