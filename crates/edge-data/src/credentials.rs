//! Credential collaborator.

/// Supplies the bearer token and owns what happens on authorization failure.
///
/// The search layer never handles sessions itself; it asks for a token before
/// every request and reports `401` responses back.
pub trait CredentialProvider: Send + Sync {
    /// Token for the `Authorization: Bearer` header, if a session exists.
    fn bearer_token(&self) -> Option<String>;

    /// Called after a `401`. Implementations typically drop the session and redirect.
    fn on_unauthorized(&self) {}
}

/// No session; requests go out anonymous.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

impl CredentialProvider for NoCredentials {
    fn bearer_token(&self) -> Option<String> {
        None
    }
}

/// A fixed token, e.g. from `TURBO_SEARCH_TOKEN`.
#[derive(Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticToken").field("token", &"<redacted>").finish()
    }
}

impl CredentialProvider for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        Some(self.token.clone())
    }

    fn on_unauthorized(&self) {
        tracing::warn!("static bearer token was rejected by the catalog API");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_token_is_redacted() {
        let token = StaticToken::new("secret");
        assert_eq!(token.bearer_token().as_deref(), Some("secret"));
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(NoCredentials.bearer_token(), None);
    }
}
