//! Identity collaborator: resolves a job's responsible-user identifier to a
//! profile link used as the PROV agent.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::IdentityError;
use crate::job::UserIdentity;

/// Resolves portal user identifiers.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Look up `user_id`. `Ok(None)` means the user is unknown.
    async fn resolve(&self, user_id: &str) -> Result<Option<UserIdentity>, IdentityError>;
}

/// Resolver backed by a fixed map of user id to profile link.
///
/// Used by the CLI (populated from configuration) and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    links: HashMap<String, Option<String>>,
}

impl StaticIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with a profile link.
    pub fn with_user(mut self, user_id: impl Into<String>, link: impl Into<String>) -> Self {
        self.links.insert(user_id.into(), Some(link.into()));
        self
    }

    /// Register a known user that has no profile link.
    pub fn with_unlinked_user(mut self, user_id: impl Into<String>) -> Self {
        self.links.insert(user_id.into(), None);
        self
    }
}

impl From<HashMap<String, String>> for StaticIdentityResolver {
    fn from(links: HashMap<String, String>) -> Self {
        Self {
            links: links.into_iter().map(|(k, v)| (k, Some(v))).collect(),
        }
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve(&self, user_id: &str) -> Result<Option<UserIdentity>, IdentityError> {
        Ok(self
            .links
            .get(user_id)
            .map(|link| UserIdentity::new(user_id, link.as_deref())))
    }
}
