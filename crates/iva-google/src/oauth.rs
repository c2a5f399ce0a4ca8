//! Google OAuth2 for installed apps.
//!
//! Consent runs through the browser with a loopback redirect; tokens are
//! cached on disk and refreshed by `yup-oauth2`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use iva_core::error::IvaError;
use tokio::sync::OnceCell;
use tracing::info;
use yup_oauth2::{
    authenticator::DefaultAuthenticator, ApplicationSecret, InstalledFlowAuthenticator,
    InstalledFlowReturnMethod,
};

pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
pub const TASKS_SCOPE: &str = "https://www.googleapis.com/auth/tasks";

/// Something that can hand out a bearer token for Google APIs.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, IvaError>;
}

/// A fixed token. Useful for tests and for tokens minted elsewhere.
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String, IvaError> {
        Ok(self.0.clone())
    }
}

/// Read a client secrets file with either an `installed` or a `web` block.
pub async fn load_client_secrets(path: &Path) -> Result<ApplicationSecret, IvaError> {
    yup_oauth2::read_application_secret(path).await.map_err(|e| {
        IvaError::Google(format!("cannot read client secrets {}: {e}", path.display()))
    })
}

/// Token source backed by a client secrets file and an on-disk token cache.
///
/// The authenticator is built on first use, so a missing credentials file only
/// fails the request that needs Google.
pub struct GoogleAuth {
    credentials_path: PathBuf,
    token_path: PathBuf,
    scopes: Vec<String>,
    authenticator: OnceCell<DefaultAuthenticator>,
}

impl GoogleAuth {
    pub fn new(
        credentials_path: impl Into<PathBuf>,
        token_path: impl Into<PathBuf>,
        scopes: &[&str],
    ) -> Self {
        Self {
            credentials_path: credentials_path.into(),
            token_path: token_path.into(),
            scopes: scopes.iter().map(|s| s.to_string()).collect(),
            authenticator: OnceCell::new(),
        }
    }

    async fn build(&self) -> Result<DefaultAuthenticator, IvaError> {
        let secret = load_client_secrets(&self.credentials_path).await?;
        if let Some(parent) = self.token_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!(
            "Google auth ready, tokens cached at {}",
            self.token_path.display()
        );
        InstalledFlowAuthenticator::builder(secret, InstalledFlowReturnMethod::HTTPRedirect)
            .persist_tokens_to_disk(&self.token_path)
            .build()
            .await
            .map_err(|e| IvaError::Google(format!("cannot start Google authorization: {e}")))
    }
}

#[async_trait]
impl TokenSource for GoogleAuth {
    async fn access_token(&self) -> Result<String, IvaError> {
        let auth = self
            .authenticator
            .get_or_try_init(|| self.build())
            .await?;
        let token = auth
            .token(&self.scopes)
            .await
            .map_err(|e| IvaError::Google(format!("authorization failed: {e}")))?;
        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| IvaError::Google("Google returned no access token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_installed_secrets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(
            &path,
            r#"{"installed":{"client_id":"cid","client_secret":"cs",
                "auth_uri":"https://accounts.google.com/o/oauth2/auth",
                "token_uri":"https://oauth2.googleapis.com/token",
                "redirect_uris":["http://localhost"]}}"#,
        )
        .unwrap();

        let secret = load_client_secrets(&path).await.unwrap();
        assert_eq!(secret.client_id, "cid");
        assert_eq!(secret.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_on_first_token() {
        let dir = tempfile::tempdir().unwrap();
        let auth = GoogleAuth::new(
            dir.path().join("missing.json"),
            dir.path().join("token.json"),
            &[CALENDAR_SCOPE],
        );
        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, IvaError::Google(_)));
        assert!(err.to_string().contains("missing.json"), "{err}");
        assert!(!dir.path().join("token.json").exists());
    }

    #[tokio::test]
    async fn test_static_token() {
        assert_eq!(StaticToken("t".into()).access_token().await.unwrap(), "t");
    }
}
