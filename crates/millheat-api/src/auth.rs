// Mill API authentication
//
// Three-step token flow: registered API keys buy an authorization code,
// the code plus account credentials buy a token pair, and the refresh
// token buys a new pair before the access token lapses.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::client::MillClient;
use crate::error::Error;
use crate::models::{AuthCodeData, TokenGrant};

impl MillClient {
    /// Request an authorization code with the keys issued at API registration.
    ///
    /// `POST share/applyAuthCode` with `access_key` / `secret_token` headers.
    pub async fn apply_auth_code(
        &self,
        access_key: &SecretString,
        secret_token: &SecretString,
    ) -> Result<String, Error> {
        debug!("requesting authorization code");
        let builder = self
            .post("share/applyAuthCode")?
            .header("access_key", access_key.expose_secret())
            .header("secret_token", secret_token.expose_secret());

        let data: AuthCodeData = Self::send_required(builder, "share/applyAuthCode").await?;
        Ok(data.authorization_code)
    }

    /// Exchange an authorization code and account credentials for a token pair.
    ///
    /// `POST share/applyAccessToken?password=..&username=..` with the
    /// `Authorization_code` header.
    pub async fn apply_access_token(
        &self,
        authorization_code: &str,
        username: &str,
        password: &SecretString,
    ) -> Result<TokenGrant, Error> {
        debug!(username, "exchanging authorization code for tokens");
        let builder = self
            .post("share/applyAccessToken")?
            .query(&[("password", password.expose_secret()), ("username", username)])
            .header("Authorization_code", authorization_code);

        Self::send_required(builder, "share/applyAccessToken")
            .await
            .map_err(into_auth_error)
    }

    /// Exchange a still-valid refresh token for a new token pair.
    ///
    /// `POST share/refreshtoken?refreshtoken=..`
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenGrant, Error> {
        debug!("refreshing access token");
        let builder = self
            .post("share/refreshtoken")?
            .query(&[("refreshtoken", refresh_token)]);

        Self::send_required(builder, "share/refreshtoken").await
    }
}

/// Vendor-level rejections of the account are authentication failures.
fn into_auth_error(err: Error) -> Error {
    match err {
        Error::Api { code, message } => Error::Authentication {
            message: format!("token exchange rejected ({code}): {message}"),
        },
        Error::Http { status: 403, body } => Error::Authentication {
            message: format!("token exchange forbidden: {body}"),
        },
        other => other,
    }
}
