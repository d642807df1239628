use crate::config::AuthConfig;
use crate::domain::ports::Authenticator;
use crate::error::{PainError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};

/// Authenticator backed by a fixed set of tokens and basic-auth pairs.
///
/// Stands in for the token service at the CLI boundary and in tests.
#[derive(Default, Clone)]
pub struct StaticAuthenticator {
    tokens: HashSet<String>,
    basic: HashMap<String, String>,
}

impl StaticAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.tokens.insert(token.into());
        self
    }

    pub fn with_basic(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.basic.insert(user.into(), password.into());
        self
    }
}

impl From<&AuthConfig> for StaticAuthenticator {
    fn from(config: &AuthConfig) -> Self {
        let tokens = config.tokens.iter().cloned().collect();
        let basic = config
            .basic
            .iter()
            .map(|pair| (pair.user.clone(), pair.password.clone()))
            .collect();
        Self { tokens, basic }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn check_token(&self, token: &str) -> Result<()> {
        if token.is_empty() {
            return Err(PainError::AuthorizationError(
                "Missing credential token".to_string(),
            ));
        }
        if !self.tokens.contains(token) {
            return Err(PainError::AuthorizationError("Token invalid".to_string()));
        }
        Ok(())
    }

    async fn check_basic_auth(&self, user: &str, password: &str) -> Result<()> {
        if user.is_empty() || password.is_empty() {
            return Err(PainError::AuthorizationError(
                "Basic auth must be set".to_string(),
            ));
        }
        match self.basic.get(user) {
            Some(expected) if expected == password => Ok(()),
            _ => Err(PainError::AuthorizationError(
                "Basic auth credentials invalid".to_string(),
            )),
        }
    }
}
