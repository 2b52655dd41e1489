//! Bootstrap environment: transport selection and credentials.
//!
//! Everything the fetchers need from the process environment is read
//! once into a [`BootstrapEnv`] and threaded explicitly from there, so
//! URL construction stays testable without mutating real environment
//! variables.

use std::str::FromStr;

/// Environment variable selecting the git transport (`git` or `https`).
pub const PROTOCOL_VAR: &str = "SLIPWAY_PROTOCOL";

/// Environment variable carrying a CI authentication token for HTTPS
/// clones. The token is redacted from every logged or reported URL.
pub const TOKEN_VAR: &str = "SLIPWAY_GIT_TOKEN";

/// Default git hosting site for `org/name` repository identifiers.
pub const DEFAULT_GIT_HOST: &str = "github.com";

/// Transport protocol for source-control fetches.
///
/// SSH needs no credential plumbing for users with registered keys but
/// fails in unauthenticated automation; HTTPS with an injected token
/// covers CI without long-lived SSH keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// SSH (`git@host:org/name`), the default.
    #[default]
    Git,
    /// HTTPS, optionally authenticated with a token.
    Https,
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "git" => Ok(Transport::Git),
            "https" => Ok(Transport::Https),
            _ => Err(format!(
                "invalid transport '{}'; expected 'git' or 'https'",
                s
            )),
        }
    }
}

/// Ambient context for a bootstrap run.
#[derive(Debug, Clone)]
pub struct BootstrapEnv {
    transport: Transport,
    token: Option<String>,
    host: String,
}

impl Default for BootstrapEnv {
    fn default() -> Self {
        BootstrapEnv::new(Transport::default())
    }
}

impl BootstrapEnv {
    /// Create an environment with the given transport, no token, and
    /// the default host.
    pub fn new(transport: Transport) -> Self {
        BootstrapEnv {
            transport,
            token: None,
            host: DEFAULT_GIT_HOST.to_string(),
        }
    }

    /// Read the environment from the current process.
    ///
    /// An unrecognized transport value is reported and falls back to
    /// the default rather than aborting the run.
    pub fn from_process() -> Self {
        let transport = match std::env::var(PROTOCOL_VAR) {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("{}: {}; using default", PROTOCOL_VAR, e);
                Transport::default()
            }),
            Err(_) => Transport::default(),
        };

        let token = std::env::var(TOKEN_VAR)
            .ok()
            .filter(|t| !t.is_empty());

        BootstrapEnv {
            transport,
            token,
            host: DEFAULT_GIT_HOST.to_string(),
        }
    }

    /// Set the authentication token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the git hosting site.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Get the selected transport.
    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Get the authentication token, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Get the git hosting site.
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_from_str() {
        assert_eq!("git".parse::<Transport>().unwrap(), Transport::Git);
        assert_eq!("https".parse::<Transport>().unwrap(), Transport::Https);
        assert_eq!("HTTPS".parse::<Transport>().unwrap(), Transport::Https);
        assert!("ssh".parse::<Transport>().is_err());
    }

    #[test]
    fn test_env_defaults() {
        let env = BootstrapEnv::default();
        assert_eq!(env.transport(), Transport::Git);
        assert!(env.token().is_none());
        assert_eq!(env.host(), DEFAULT_GIT_HOST);
    }

    #[test]
    fn test_env_builders() {
        let env = BootstrapEnv::new(Transport::Https)
            .with_token("s3cret")
            .with_host("git.example.com");

        assert_eq!(env.transport(), Transport::Https);
        assert_eq!(env.token(), Some("s3cret"));
        assert_eq!(env.host(), "git.example.com");
    }
}
