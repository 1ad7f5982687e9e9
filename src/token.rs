//! Bearer token retrieval.
//!
//! The sync client asks for a token before every connection attempt, so a
//! provider may refresh or rotate it between attempts.

use std::fmt::Debug;

use async_trait::async_trait;

/// Source of the admin bearer token.
#[async_trait]
pub trait TokenProvider: Send + Sync + Debug {
    /// The current token, or `None` if the console is not authenticated.
    async fn token(&self) -> Option<String>;
}

/// A token fixed at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()).filter(|t| !t.is_empty()))
    }

    /// A provider that never has a token.
    pub fn none() -> Self {
        Self(None)
    }
}

impl From<Option<String>> for StaticToken {
    fn from(token: Option<String>) -> Self {
        Self(token.filter(|t| !t.is_empty()))
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the token from an environment variable on every attempt.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl TokenProvider for EnvToken {
    async fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.trim().is_empty())
    }
}
