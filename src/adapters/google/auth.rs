//! Google service-account credentials and OAuth access tokens.
//!
//! Tokens come from the JWT-bearer grant: an RS256 assertion signed with the
//! service account key is exchanged at `token_uri`. Setting `sub` makes the
//! token act as that user (domain-wide delegation, needed for Gmail).

use crate::adapters::http::ensure_success;
use crate::domain::ports::AccessTokenProvider;
use crate::utils::error::{BotError, Result};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

pub const SHEETS_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Refresh this long before Google's stated expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// 先讀本機檔案，沒有的話再讀 GOOGLE_SERVICE_ACCOUNT_JSON
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            if Path::new(path).exists() {
                let raw = std::fs::read_to_string(path)?;
                tracing::debug!("Loaded service account from {}", path);
                return Ok(serde_json::from_str(&raw)?);
            }
        }

        match std::env::var("GOOGLE_SERVICE_ACCOUNT_JSON") {
            Ok(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
            _ => Err(BotError::MissingConfigError {
                field: "google.service_account_file or GOOGLE_SERVICE_ACCOUNT_JSON".to_string(),
            }),
        }
    }

    pub fn token_uri(&self) -> &str {
        self.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI)
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct IssuedToken {
    value: String,
    expires_at: Instant,
}

/// Issues and reuses access tokens per (scope, subject) until shortly before expiry.
pub struct ServiceAccountTokens {
    client: Client,
    key: ServiceAccountKey,
    tokens: RwLock<HashMap<(String, Option<String>), IssuedToken>>,
}

impl ServiceAccountTokens {
    pub fn new(client: Client, key: ServiceAccountKey) -> Self {
        Self {
            client,
            key,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub fn signed_assertion(&self, scope: &str, subject: Option<&str>) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope,
            aud: self.key.token_uri(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
            sub: subject,
        };

        let signing_key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &signing_key)?)
    }

    async fn exchange(&self, scope: &str, subject: Option<&str>) -> Result<IssuedToken> {
        let assertion = self.signed_assertion(scope, subject)?;

        tracing::debug!(
            "Requesting Google token for scope {} (subject: {:?})",
            scope,
            subject
        );
        let response = self
            .client
            .post(self.key.token_uri())
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let response = match ensure_success("Google OAuth", response).await {
            Ok(response) => response,
            Err(BotError::UpstreamError { status, body, .. }) if status == 400 || status == 401 => {
                return Err(BotError::AuthError {
                    message: format!("token exchange rejected ({}): {}", status, body),
                });
            }
            Err(e) => return Err(e),
        };

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(3600));
        Ok(IssuedToken {
            value: token.access_token,
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        })
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountTokens {
    async fn access_token(&self, scope: &str, subject: Option<&str>) -> Result<String> {
        let key = (scope.to_string(), subject.map(str::to_string));

        {
            let tokens = self.tokens.read().await;
            if let Some(token) = tokens.get(&key) {
                if Instant::now() < token.expires_at {
                    return Ok(token.value.clone());
                }
            }
        }

        let issued = self.exchange(scope, subject).await?;
        let value = issued.value.clone();
        self.tokens.write().await.insert(key, issued);
        Ok(value)
    }
}

/// A fixed bearer token, e.g. from `gcloud auth print-access-token`.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenProvider for StaticToken {
    async fn access_token(&self, _scope: &str, _subject: Option<&str>) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_any_source_is_missing_config() {
        std::env::remove_var("GOOGLE_SERVICE_ACCOUNT_JSON");
        let err = ServiceAccountKey::load(Some("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, BotError::MissingConfigError { .. }));
    }

    #[test]
    fn test_token_uri_defaults_to_google() {
        let key: ServiceAccountKey = serde_json::from_value(serde_json::json!({
            "client_email": "bot@project.iam.gserviceaccount.com",
            "private_key": "not-a-key"
        }))
        .unwrap();
        assert_eq!(key.token_uri(), "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_invalid_private_key_fails_to_sign() {
        let key: ServiceAccountKey = serde_json::from_value(serde_json::json!({
            "client_email": "bot@project.iam.gserviceaccount.com",
            "private_key": "not-a-key"
        }))
        .unwrap();
        let tokens = ServiceAccountTokens::new(Client::new(), key);
        assert!(matches!(
            tokens.signed_assertion(SHEETS_READONLY_SCOPE, None),
            Err(BotError::JwtError(_))
        ));
    }

    #[tokio::test]
    async fn test_static_token_ignores_scope() {
        let provider = StaticToken("ya29.test".to_string());
        assert_eq!(
            provider.access_token(GMAIL_READONLY_SCOPE, Some("a@b.c")).await.unwrap(),
            "ya29.test"
        );
    }
}
