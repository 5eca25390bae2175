use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use dashmap::DashMap;
use headers::{Authorization, Header, authorization::Basic};
use serde::Deserialize;

/// A resolved (identity, secret) pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// In-memory username -> password table.
pub struct UserStore {
    users: DashMap<String, String>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
        }
    }

    pub fn from_pairs<I, U, P>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (U, P)>,
        U: Into<String>,
        P: Into<String>,
    {
        let store = Self::new();
        for (user, pass) in pairs {
            store.insert(user, pass);
        }
        store
    }

    pub fn insert(&self, username: impl Into<String>, password: impl Into<String>) {
        self.users.insert(username.into(), password.into());
    }

    /// The authorization predicate: does this pair match a known user?
    pub fn verify(&self, credentials: &Credentials) -> bool {
        self.users
            .get(&credentials.username)
            .is_some_and(|password| *password == credentials.password)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Plaintext credential fallback for clients that cannot set headers.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialQuery {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Decode `Authorization: Basic ...`, if present and well formed.
pub fn basic_credentials(headers: &HeaderMap) -> Option<Credentials> {
    let mut values = headers.get_all(AUTHORIZATION).iter();
    let auth = Authorization::<Basic>::decode(&mut values).ok()?;
    Some(Credentials::new(auth.username(), auth.password()))
}

/// Header credentials first, then both query fields if non-empty.
pub fn resolve_credentials(headers: &HeaderMap, query: &CredentialQuery) -> Option<Credentials> {
    basic_credentials(headers).or_else(|| match (&query.username, &query.password) {
        (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
            Some(Credentials::new(user, pass))
        }
        _ => None,
    })
}

/// Caller that presented valid HTTP Basic credentials.
pub struct AuthenticatedUser {
    pub username: String,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credentials = basic_credentials(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("Missing authentication credentials".to_string()))?;

        if !state.users.verify(&credentials) {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        Ok(AuthenticatedUser {
            username: credentials.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn basic_header(user: &str, pass: &str) -> HeaderMap {
        let mut values = Vec::new();
        Authorization::basic(user, pass).encode(&mut values);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, values.remove(0));
        headers
    }

    #[test]
    fn test_verify() {
        let users = UserStore::from_pairs([("admin", "changeme")]);
        assert!(users.verify(&Credentials::new("admin", "changeme")));
        assert!(!users.verify(&Credentials::new("admin", "wrong")));
        assert!(!users.verify(&Credentials::new("nobody", "changeme")));
    }

    #[test]
    fn test_basic_header_decoded() {
        let creds = basic_credentials(&basic_header("admin", "changeme")).unwrap();
        assert_eq!(creds, Credentials::new("admin", "changeme"));
    }

    #[test]
    fn test_malformed_header_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic !!notbase64!!"));
        assert!(basic_credentials(&headers).is_none());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert!(basic_credentials(&headers).is_none());
    }

    #[test]
    fn test_query_fallback() {
        let query = CredentialQuery {
            username: Some("admin".to_string()),
            password: Some("changeme".to_string()),
        };
        let creds = resolve_credentials(&HeaderMap::new(), &query).unwrap();
        assert_eq!(creds.username, "admin");
    }

    #[test]
    fn test_header_wins_over_query() {
        let query = CredentialQuery {
            username: Some("other".to_string()),
            password: Some("pw".to_string()),
        };
        let creds = resolve_credentials(&basic_header("admin", "changeme"), &query).unwrap();
        assert_eq!(creds.username, "admin");
    }

    #[test]
    fn test_incomplete_query_is_no_credentials() {
        let query = CredentialQuery {
            username: Some("admin".to_string()),
            password: Some(String::new()),
        };
        assert!(resolve_credentials(&HeaderMap::new(), &query).is_none());
        assert!(resolve_credentials(&HeaderMap::new(), &CredentialQuery::default()).is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("admin", "changeme"));
        assert!(!rendered.contains("changeme"));
    }
}
