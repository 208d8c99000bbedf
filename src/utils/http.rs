// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::header::{COOKIE, HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::HttpConfig;
use crate::services::Session;

/// Header carrying the web application id expected by the media API.
const APP_ID_HEADER: &str = "x-ig-app-id";

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Create a client that carries the session identity on every request.
pub fn create_session_client(config: &HttpConfig, session: &Session) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();

    let app_id = HeaderValue::from_str(&config.app_id)
        .map_err(|e| AppError::config(format!("http.app_id is not a valid header: {e}")))?;
    headers.insert(HeaderName::from_static(APP_ID_HEADER), app_id);

    if let Some(cookie) = session.cookie() {
        let mut value = HeaderValue::from_str(&cookie)
            .map_err(|e| AppError::config(format!("auth.session_id is not a valid header: {e}")))?;
        value.set_sensitive(true);
        headers.insert(COOKIE, value);
    }

    let client = reqwest::Client::builder()
        .user_agent(session.identity())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}
