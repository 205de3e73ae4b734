//! OAuth2 refresh-token authentication for Google APIs.

use std::sync::Arc;

use reqwest::Client;
use tokio::sync::OnceCell;

use crate::error::{DriveError, Result};
use crate::models::{OauthCredentials, TokenResponse};

/// Google OAuth2 token endpoint.
const TOKEN_URL: &str = "https://accounts.google.com/o/oauth2/token";

/// Out-of-band redirect URI the refresh token was issued against.
const OOB_REDIRECT_URI: &str = "https://developers.google.com/oauthplayground";

/// A short-lived access credential obtained from the token endpoint.
///
/// Expiry is not tracked locally; the server will reject the token once it
/// lapses and a new `Authenticator` has to be built to fetch a fresh one.
#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    pub token_type: Option<String>,
    /// Client identity the token was issued to.
    pub client_id: String,
    pub redirect_uri: String,
}

/// Exchanges a long-lived refresh token for an access credential and
/// memoizes the result for the lifetime of the authenticator.
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<OauthCredentials>,
    http: Client,
    token_url: String,
    credential: Arc<OnceCell<Credential>>,
}

impl Authenticator {
    /// Create a new authenticator against the Google token endpoint.
    pub fn new(credentials: OauthCredentials) -> Self {
        Self::with_token_url(credentials, TOKEN_URL.to_string())
    }

    /// Create an authenticator against a custom token endpoint.
    /// Useful for tests and OAuth2-compatible emulators.
    pub fn with_token_url(credentials: OauthCredentials, token_url: String) -> Self {
        Self {
            credentials: Arc::new(credentials),
            http: Client::new(),
            token_url,
            credential: Arc::new(OnceCell::new()),
        }
    }

    /// Get the memoized credential, performing the token exchange on first
    /// use. Concurrent first callers share a single in-flight exchange; a
    /// failed exchange is not cached and the next caller retries it.
    pub async fn credential(&self) -> Result<&Credential> {
        self.credential
            .get_or_try_init(|| self.exchange_refresh_token())
            .await
    }

    /// Convenience accessor for the bearer token itself.
    pub async fn access_token(&self) -> Result<&str> {
        Ok(self.credential().await?.access_token.as_str())
    }

    async fn exchange_refresh_token(&self) -> Result<Credential> {
        let params = [
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| DriveError::AuthenticationError(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| DriveError::AuthenticationError(e.to_string()))?;

        // Error responses (invalid_grant etc.) come back as JSON without an
        // access_token field; surface the raw body for diagnosis.
        let token: TokenResponse = serde_json::from_str(&body).map_err(|_| {
            DriveError::AuthenticationError(format!("access_token not found in {body}"))
        })?;

        tracing::debug!(client_id = %self.credentials.client_id, "obtained access token");

        Ok(Credential {
            access_token: token.access_token,
            token_type: token.token_type,
            client_id: self.credentials.client_id.clone(),
            redirect_uri: OOB_REDIRECT_URI.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> OauthCredentials {
        OauthCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    #[tokio::test]
    async fn exchange_failure_carries_response_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let auth =
            Authenticator::with_token_url(credentials(), format!("{}/token", server.url()));
        let err = auth.credential().await.unwrap_err();

        match err {
            DriveError::AuthenticationError(msg) => {
                assert!(msg.contains("access_token not found"));
                assert!(msg.contains("invalid_grant"));
            }
            other => panic!("expected AuthenticationError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_exchange_is_not_cached_and_is_retried() {
        let mut server = mockito::Server::new_async().await;
        let failure = server
            .mock("POST", "/token")
            .with_status(500)
            .with_body(r#"{"error":"backend_error"}"#)
            .expect(1)
            .create_async()
            .await;

        let auth =
            Authenticator::with_token_url(credentials(), format!("{}/token", server.url()));

        let err = auth.credential().await.unwrap_err();
        assert!(matches!(err, DriveError::AuthenticationError(_)));
        failure.assert_async().await;
        failure.remove_async().await;

        // The failure must not stick: the next caller re-runs the exchange.
        let success = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok2"}"#)
            .expect(1)
            .create_async()
            .await;

        let credential = auth.credential().await.unwrap();
        assert_eq!(credential.access_token, "tok2");
        success.assert_async().await;
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_exchange() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok"}"#)
            .expect(1)
            .create_async()
            .await;

        let auth =
            Authenticator::with_token_url(credentials(), format!("{}/token", server.url()));

        let (first, second) = tokio::join!(auth.credential(), auth.credential());
        assert_eq!(first.unwrap().access_token, "tok");
        assert_eq!(second.unwrap().access_token, "tok");
        token_mock.assert_async().await;
    }

    #[tokio::test]
    async fn credential_is_memoized() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_body(r#"{"access_token":"tok","token_type":"Bearer","expires_in":3600}"#)
            .expect(1)
            .create_async()
            .await;

        let auth =
            Authenticator::with_token_url(credentials(), format!("{}/token", server.url()));

        let first = auth.credential().await.unwrap().access_token.clone();
        let second = auth.credential().await.unwrap();
        assert_eq!(first, "tok");
        assert_eq!(second.access_token, "tok");
        assert_eq!(second.client_id, "id");
        token_mock.assert_async().await;
    }
}
