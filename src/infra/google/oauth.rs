//! Access-token acquisition for the installed-app OAuth flow.

use anyhow::{Result, anyhow, bail};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

use crate::error::TransportError;
use crate::fetch::{HttpClient, execute_json};

use super::credentials::{AuthorizedUser, ClientSecrets};

/// Read/write access to spreadsheets. Changing it invalidates saved tokens.
pub const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Environment variable holding a ready-made access token.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_ACCESS_TOKEN";

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

async fn post_token_request<C: HttpClient + ?Sized>(
    client: &C,
    token_url: &str,
    params: &[(&str, &str)],
) -> Result<TokenResponse> {
    let url = Url::parse(token_url).map_err(|e| anyhow!("Invalid token URL {token_url}: {e}"))?;
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();

    let mut req = Request::new(Method::POST, url);
    req.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    *req.body_mut() = Some(body.into());

    execute_json(client, req).await.map_err(|e| match e {
        TransportError::Api { status, body } => {
            anyhow!("Token request failed with status {}: {}", status, body)
        }
        other => anyhow!("Token request failed: {}", other),
    })
}

/// Exchanges a saved refresh token for a short-lived access token.
pub async fn refresh_access_token<C: HttpClient + ?Sized>(
    client: &C,
    user: &AuthorizedUser,
    token_url: &str,
) -> Result<String> {
    let token = post_token_request(
        client,
        token_url,
        &[
            ("client_id", user.client_id.as_str()),
            ("client_secret", user.client_secret.as_str()),
            ("refresh_token", user.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ],
    )
    .await?;

    debug!(expires_in = ?token.expires_in, "Access token refreshed");
    Ok(token.access_token)
}

/// URL the operator opens in a browser to grant spreadsheet access.
///
/// `access_type=offline` with `prompt=consent` makes Google return a refresh
/// token on every grant, not only the first one.
pub fn consent_url(secrets: &ClientSecrets) -> Result<Url> {
    let mut url = Url::parse(&secrets.auth_uri)?;
    url.query_pairs_mut()
        .append_pair("client_id", secrets.client_id.as_str())
        .append_pair("redirect_uri", secrets.redirect_uri())
        .append_pair("response_type", "code")
        .append_pair("scope", SCOPE)
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent");
    Ok(url)
}

/// Pulls the `code` parameter out of a pasted redirect URL, or returns the
/// input unchanged when it is already a bare code.
pub fn extract_code(input: &str) -> String {
    let input = input.trim();
    Url::parse(input)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "code")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_else(|| input.to_string())
}

/// Trades an authorization code for tokens and builds the [`AuthorizedUser`]
/// to persist.
pub async fn exchange_code<C: HttpClient + ?Sized>(
    client: &C,
    secrets: &ClientSecrets,
    code: &str,
) -> Result<(AuthorizedUser, String)> {
    let token = post_token_request(
        client,
        &secrets.token_uri,
        &[
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", secrets.redirect_uri()),
            ("grant_type", "authorization_code"),
        ],
    )
    .await?;

    let Some(refresh_token) = token.refresh_token else {
        bail!("token response did not include a refresh token");
    };

    Ok((
        AuthorizedUser::new(secrets, refresh_token),
        token.access_token,
    ))
}

/// Resolves an access token: `GOOGLE_ACCESS_TOKEN` first, then a refresh
/// using the saved `token.json`.
pub async fn access_token<C: HttpClient + ?Sized>(client: &C, token_path: &Path) -> Result<String> {
    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
        if !token.trim().is_empty() {
            info!("Using access token from {}", ACCESS_TOKEN_ENV);
            return Ok(token.trim().to_string());
        }
    }

    let Some(user) = AuthorizedUser::load_if_exists(token_path) else {
        bail!(
            "no saved credentials at '{}'; run the `authorize` command first",
            token_path.display()
        );
    };

    info!(path = %token_path.display(), "Refreshing access token from saved credentials");
    refresh_access_token(client, &user, TOKEN_URL).await
}
