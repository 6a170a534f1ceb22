//! Login credential check
//!
//! There are no sessions or tokens; a login succeeds or fails and the
//! client keeps the result.

use crate::config::AuthConfig;

/// Decides whether a username/password pair is accepted.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Accepts exactly one configured username/password pair.
#[derive(Clone)]
pub struct StaticCredentials {
    username: String,
    password: String,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.username.clone(), config.password.clone())
    }
}

impl CredentialVerifier for StaticCredentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_credentials() {
        let verifier = StaticCredentials::from_config(&AuthConfig::default());
        assert!(verifier.verify("admin", "admin"));
        assert!(!verifier.verify("admin", "admin "));
        assert!(!verifier.verify("root", "admin"));
        assert!(!verifier.verify("", ""));
    }

    #[test]
    fn test_trait_object() {
        let verifier: Box<dyn CredentialVerifier> =
            Box::new(StaticCredentials::new("driller", "s3cret"));
        assert!(verifier.verify("driller", "s3cret"));
    }
}
