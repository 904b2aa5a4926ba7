//! Remote text services: translation and reformatting

pub mod lang;
mod reformat;
mod translate;

use std::time::Duration;

use reqwest::blocking::{Client, Response};

pub use lang::{cjk_ratio, choose_target};
pub use reformat::{ChatReformatter, REFORMAT_INSTRUCTION};
pub use translate::{NOT_CONFIGURED_MESSAGE, Translation, Translator};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotConfigured(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Blocking client with the configured timeout
pub(crate) fn http_client(timeout_secs: u64) -> Result<Client, ServiceError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .user_agent(concat!("readhelper/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Turn a non-2xx response into an error carrying the body
pub(crate) fn check_response(response: Response) -> Result<Response, ServiceError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().unwrap_or_default();
    Err(ServiceError::Status {
        status,
        body: body.trim().chars().take(200).collect(),
    })
}
