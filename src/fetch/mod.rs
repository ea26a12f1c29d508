mod client;
mod basic;
pub mod auth;
#[cfg(test)]
pub(crate) mod testing;

pub use client::HttpClient;
pub use basic::BasicClient;

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::TransportError;

/// Sends `req` and decodes a JSON body, turning non-2xx statuses into
/// [`TransportError::Api`] with the response text attached.
pub async fn execute_json<C: HttpClient + ?Sized, T: DeserializeOwned>(
    client: &C,
    req: reqwest::Request,
) -> Result<T, TransportError> {
    let method = req.method().clone();
    let url = req.url().clone();

    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(%method, %url, status = status.as_u16(), "Response received");

    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TransportError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
