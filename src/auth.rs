//! Authentication strategies for the inventory endpoint.
//!
//! Each supported `auth_method` maps to one enum variant; adding a provider
//! means adding a variant here, not editing a dispatch chain. Credentials are
//! read from an explicit environment snapshot so tests never have to mutate
//! the process environment.

use crate::Result;
use crate::error::InventoryError;
use std::collections::BTreeMap;

pub const ENV_USERNAME: &str = "HTTP_USERNAME";
pub const ENV_PASSWORD: &str = "HTTP_PASSWORD";
pub const ENV_GITLAB_TOKEN: &str = "HTTP_GITLAB_TOKEN";

/// GitLab's personal-access-token header.
pub const GITLAB_TOKEN_HEADER: &str = "PRIVATE-TOKEN";

/// Snapshot of the relevant environment variables, keyed by name.
pub type EnvSnapshot = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMethod {
    #[default]
    None,
    Basic,
    Gitlab,
}

impl AuthMethod {
    /// Parse the `auth_method` option string.
    ///
    /// The host tool's option layer stringifies undefined options, so the
    /// literal "None" is accepted alongside "none" and the empty string.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "" | "none" | "None" => Ok(Self::None),
            "basic" => Ok(Self::Basic),
            "gitlab" => Ok(Self::Gitlab),
            other => Err(InventoryError::UnsupportedAuthMethod(other.to_string())),
        }
    }
}

/// Outbound request credentials: extra headers plus optional transport-level
/// basic auth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials {
    pub headers: Vec<(&'static str, String)>,
    pub basic: Option<(String, String)>,
}

/// Build the credentials for `method` from the environment snapshot.
pub fn produce_credentials(method: AuthMethod, env: &EnvSnapshot) -> Result<Credentials> {
    match method {
        AuthMethod::None => Ok(Credentials::default()),
        AuthMethod::Basic => {
            let username = require(env, ENV_USERNAME)?;
            let password = require(env, ENV_PASSWORD)?;
            Ok(Credentials {
                headers: Vec::new(),
                basic: Some((username, password)),
            })
        }
        AuthMethod::Gitlab => {
            // Prefer a personal access token; fall back to the basic pair.
            if let Some(token) = non_empty(env, ENV_GITLAB_TOKEN) {
                return Ok(Credentials {
                    headers: vec![(GITLAB_TOKEN_HEADER, token)],
                    basic: None,
                });
            }
            match (non_empty(env, ENV_USERNAME), non_empty(env, ENV_PASSWORD)) {
                (Some(username), Some(password)) => Ok(Credentials {
                    headers: Vec::new(),
                    basic: Some((username, password)),
                }),
                // Half a basic pair: name the variable that is actually absent.
                (Some(_), None) => Err(InventoryError::MissingCredential(ENV_PASSWORD)),
                (None, Some(_)) => Err(InventoryError::MissingCredential(ENV_USERNAME)),
                (None, None) => Err(InventoryError::MissingCredential(ENV_GITLAB_TOKEN)),
            }
        }
    }
}

fn require(env: &EnvSnapshot, key: &'static str) -> Result<String> {
    non_empty(env, key).ok_or(InventoryError::MissingCredential(key))
}

fn non_empty(env: &EnvSnapshot, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env(pairs: &[(&str, &str)]) -> EnvSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn none_method_yields_empty_credentials() {
        let creds = produce_credentials(AuthMethod::None, &env(&[])).unwrap();
        assert_eq!(creds, Credentials::default());
    }

    #[test]
    fn basic_reads_username_and_password() {
        let creds = produce_credentials(
            AuthMethod::Basic,
            &env(&[(ENV_USERNAME, "deploy"), (ENV_PASSWORD, "s3cret")]),
        )
        .unwrap();
        assert_eq!(creds.basic, Some(("deploy".into(), "s3cret".into())));
        assert!(creds.headers.is_empty());
    }

    #[test]
    fn basic_without_password_is_a_missing_credential() {
        let err =
            produce_credentials(AuthMethod::Basic, &env(&[(ENV_USERNAME, "deploy")])).unwrap_err();
        match err {
            InventoryError::MissingCredential(name) => assert_eq!(name, ENV_PASSWORD),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn gitlab_prefers_the_token_header() {
        let creds = produce_credentials(
            AuthMethod::Gitlab,
            &env(&[
                (ENV_GITLAB_TOKEN, "glpat-abc"),
                (ENV_USERNAME, "deploy"),
                (ENV_PASSWORD, "s3cret"),
            ]),
        )
        .unwrap();
        assert_eq!(creds.headers, vec![(GITLAB_TOKEN_HEADER, "glpat-abc".into())]);
        assert_eq!(creds.basic, None);
    }

    #[test]
    fn gitlab_falls_back_to_the_basic_pair() {
        let creds = produce_credentials(
            AuthMethod::Gitlab,
            &env(&[(ENV_USERNAME, "deploy"), (ENV_PASSWORD, "s3cret")]),
        )
        .unwrap();
        assert_eq!(creds.basic, Some(("deploy".into(), "s3cret".into())));
    }

    #[test]
    fn gitlab_with_no_credentials_names_the_token_variable() {
        let err = produce_credentials(AuthMethod::Gitlab, &env(&[])).unwrap_err();
        match err {
            InventoryError::MissingCredential(name) => assert_eq!(name, ENV_GITLAB_TOKEN),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn gitlab_with_half_a_basic_pair_names_the_absent_variable() {
        let err = produce_credentials(AuthMethod::Gitlab, &env(&[(ENV_USERNAME, "deploy")]))
            .unwrap_err();
        match err {
            InventoryError::MissingCredential(name) => assert_eq!(name, ENV_PASSWORD),
            other => panic!("unexpected error: {other}"),
        }

        let err = produce_credentials(AuthMethod::Gitlab, &env(&[(ENV_PASSWORD, "s3cret")]))
            .unwrap_err();
        match err {
            InventoryError::MissingCredential(name) => assert_eq!(name, ENV_USERNAME),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = AuthMethod::parse("kerberos").unwrap_err();
        match err {
            InventoryError::UnsupportedAuthMethod(name) => assert_eq!(name, "kerberos"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stringified_none_is_accepted() {
        assert_eq!(AuthMethod::parse("None").unwrap(), AuthMethod::None);
        assert_eq!(AuthMethod::parse("").unwrap(), AuthMethod::None);
    }
}
