use crate::domain::identity::Identity;
use crate::domain::ports::IdentityProvider;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// Resolves bearer tokens from a fixed table.
///
/// The table is a JSON object mapping each token to `{"id": .., "type": ..}`.
/// Token issuance lives in the external auth service; this only answers
/// "who is behind this token".
#[derive(Debug, Default, Clone)]
pub struct StaticTokenProvider {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenProvider {
    pub fn new(tokens: HashMap<String, Identity>) -> Self {
        Self { tokens }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let tokens: HashMap<String, Identity> = serde_json::from_slice(&bytes)?;
        Ok(Self::new(tokens))
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Identity>> {
        Ok(self.tokens.get(token).cloned())
    }
}
