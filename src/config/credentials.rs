//! Provider credentials, read from the environment only.
//!
//! Secrets never live in the TOML file: `FR24_API_KEY` for Flightradar24,
//! and an optional `OPENSKY_USERNAME` / `OPENSKY_PASSWORD` pair for
//! authenticated OpenSky quotas.

use thiserror::Error;

use super::SourceKind;

pub const FR24_API_KEY_VAR: &str = "FR24_API_KEY";
pub const OPENSKY_USERNAME_VAR: &str = "OPENSKY_USERNAME";
pub const OPENSKY_PASSWORD_VAR: &str = "OPENSKY_PASSWORD";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("{var} is not set; the {source_kind} source requires it")]
    Missing {
        var: &'static str,
        source_kind: SourceKind,
    },

    #[error("{present} is set but {missing} is not; OpenSky credentials come as a pair")]
    Incomplete {
        present: &'static str,
        missing: &'static str,
    },
}

/// OpenSky basic-auth login.
#[derive(Clone, PartialEq, Eq)]
pub struct OpenSkyLogin {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for OpenSkyLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenSkyLogin")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub fr24_api_key: Option<String>,
    pub opensky: Option<OpenSkyLogin>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("fr24_api_key", &self.fr24_api_key.as_ref().map(|_| "<redacted>"))
            .field("opensky", &self.opensky)
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, CredentialError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read credentials through an arbitrary lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let opensky = match (read(OPENSKY_USERNAME_VAR), read(OPENSKY_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(OpenSkyLogin { username, password }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(CredentialError::Incomplete {
                    present: OPENSKY_USERNAME_VAR,
                    missing: OPENSKY_PASSWORD_VAR,
                })
            }
            (None, Some(_)) => {
                return Err(CredentialError::Incomplete {
                    present: OPENSKY_PASSWORD_VAR,
                    missing: OPENSKY_USERNAME_VAR,
                })
            }
        };

        Ok(Self {
            fr24_api_key: read(FR24_API_KEY_VAR),
            opensky,
        })
    }

    /// Fail unless everything `kind` needs is present.
    pub fn require_for(&self, kind: SourceKind) -> Result<(), CredentialError> {
        match kind {
            SourceKind::Flightradar24 if self.fr24_api_key.is_none() => {
                Err(CredentialError::Missing {
                    var: FR24_API_KEY_VAR,
                    source_kind: kind,
                })
            }
            _ => Ok(()),
        }
    }
}
