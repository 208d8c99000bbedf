// src/services/resolver.rs

//! Post metadata resolution.
//!
//! [`InstagramResolver`] turns a post URL into a [`MediaPost`] through the
//! media info endpoint. Requests that hit a login wall come back as
//! [`ResolveError::LoginRequired`]; everything else that goes wrong is an
//! unexpected failure the caller may retry later.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{MediaKind, MediaPost};
use crate::utils::url::post_identifier;

/// Default media API root.
pub const API_BASE: &str = "https://i.instagram.com/api/v1";

/// Shortcode alphabet, most significant digit first.
const SHORTCODE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Length of the suffix private post shortcodes carry after the media id.
const PRIVATE_SUFFIX_LEN: usize = 28;

/// Why a post could not be resolved.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The post is private or the session is required
    #[error("login required")]
    LoginRequired,

    #[error("post not found")]
    NotFound,

    #[error("unexpected status {0}")]
    Status(StatusCode),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot derive a media id from '{0}'")]
    InvalidUrl(String),

    #[error("unknown media type {0}")]
    UnknownMediaType(i64),

    #[error("response contained no media item")]
    EmptyResponse,
}

impl ResolveError {
    /// Short class name for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LoginRequired => "LoginRequired",
            Self::NotFound => "NotFound",
            Self::Status(_) => "Status",
            Self::Http(_) => "Http",
            Self::Decode(_) => "Decode",
            Self::InvalidUrl(_) => "InvalidUrl",
            Self::UnknownMediaType(_) => "UnknownMediaType",
            Self::EmptyResponse => "EmptyResponse",
        }
    }
}

/// Resolves a post URL into its metadata.
#[async_trait]
pub trait PostResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<MediaPost, ResolveError>;
}

/// Resolver backed by the media info API.
#[derive(Debug, Clone)]
pub struct InstagramResolver {
    client: Client,
    api_base: String,
}

impl InstagramResolver {
    /// Create a resolver; the client should already carry session headers.
    pub fn new(client: Client) -> Self {
        Self::with_api_base(client, API_BASE)
    }

    pub fn with_api_base(client: Client, api_base: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PostResolver for InstagramResolver {
    async fn resolve(&self, url: &str) -> Result<MediaPost, ResolveError> {
        let pk = post_identifier(url)
            .and_then(|code| media_pk_from_code(&code))
            .ok_or_else(|| ResolveError::InvalidUrl(url.to_string()))?;

        let endpoint = format!("{}/media/{}/info/", self.api_base, pk);
        log::debug!("Requesting {endpoint}");

        let response = self.client.get(&endpoint).send().await?;
        let status = response.status();
        let body = response.text().await?;

        parse_media_info(status, &body)
    }
}

/// Decode a post shortcode into its numeric media id.
pub fn media_pk_from_code(code: &str) -> Option<u64> {
    if code.is_empty() || !code.is_ascii() {
        return None;
    }

    let code = if code.len() > PRIVATE_SUFFIX_LEN {
        &code[..code.len() - PRIVATE_SUFFIX_LEN]
    } else {
        code
    };

    code.bytes().try_fold(0u64, |pk, byte| {
        let digit = SHORTCODE_ALPHABET.iter().position(|&c| c == byte)? as u64;
        pk.checked_mul(64)?.checked_add(digit)
    })
}

/// Classify a media info response and map its first item.
pub fn parse_media_info(status: StatusCode, body: &str) -> Result<MediaPost, ResolveError> {
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || is_login_wall(body)
    {
        return Err(ResolveError::LoginRequired);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ResolveError::NotFound);
    }
    if !status.is_success() {
        return Err(ResolveError::Status(status));
    }

    let info: MediaInfoResponse = serde_json::from_str(body)?;
    let item = info
        .items
        .into_iter()
        .next()
        .ok_or(ResolveError::EmptyResponse)?;
    item.into_post()
}

fn is_login_wall(body: &str) -> bool {
    serde_json::from_str::<ApiStatus>(body)
        .map(|s| s.message.as_deref() == Some("login_required") || s.require_login)
        .unwrap_or(false)
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    require_login: bool,
}

#[derive(Debug, Deserialize)]
struct MediaInfoResponse {
    #[serde(default)]
    items: Vec<MediaItem>,
}

#[derive(Debug, Deserialize)]
struct MediaItem {
    media_type: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    caption: Option<Caption>,
    #[serde(default)]
    image_versions2: Option<ImageVersions>,
    #[serde(default)]
    video_versions: Option<Vec<VideoVersion>>,
    user: User,
    #[serde(default)]
    carousel_media: Option<Vec<CarouselItem>>,
}

#[derive(Debug, Deserialize)]
struct Caption {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageVersions {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideoVersion {
    url: String,
}

#[derive(Debug, Deserialize)]
struct User {
    username: String,
}

#[derive(Debug, Deserialize)]
struct CarouselItem {
    #[serde(default)]
    image_versions2: Option<ImageVersions>,
    #[serde(default)]
    video_versions: Option<Vec<VideoVersion>>,
}

fn first_image(versions: Option<ImageVersions>) -> Option<String> {
    versions?.candidates.into_iter().next().map(|c| c.url)
}

fn first_video(versions: Option<Vec<VideoVersion>>) -> Option<String> {
    versions?.into_iter().next().map(|v| v.url)
}

impl MediaItem {
    fn into_post(self) -> Result<MediaPost, ResolveError> {
        let kind = MediaKind::from_code(self.media_type)
            .ok_or(ResolveError::UnknownMediaType(self.media_type))?;

        // Album items prefer their video, falling back to the still image
        let resources = self
            .carousel_media
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                first_video(item.video_versions).or_else(|| first_image(item.image_versions2))
            })
            .collect();

        Ok(MediaPost {
            kind,
            title: self.title,
            description: self.caption.and_then(|c| c.text),
            photo: first_image(self.image_versions2),
            video: first_video(self.video_versions),
            resources,
            account_name: self.user.username,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALBUM_RESPONSE: &str = r#"{
        "items": [{
            "media_type": 8,
            "title": "",
            "caption": {"text": "Two views"},
            "user": {"username": "harbour.views"},
            "carousel_media": [
                {"media_type": 1, "image_versions2": {"candidates": [
                    {"url": "https://cdn.example.test/1.jpg?x=1"},
                    {"url": "https://cdn.example.test/1_small.jpg"}
                ]}},
                {"media_type": 2,
                 "image_versions2": {"candidates": [{"url": "https://cdn.example.test/2.jpg"}]},
                 "video_versions": [{"url": "https://cdn.example.test/2.mp4"}]}
            ]
        }],
        "status": "ok"
    }"#;

    #[test]
    fn test_media_pk_from_code() {
        assert_eq!(media_pk_from_code("B1LbfVPlwIA"), Some(2110901750722920960));
        assert_eq!(media_pk_from_code("B-fKL9qpeab"), Some(2278584739065882267));
    }

    #[test]
    fn test_media_pk_from_private_code() {
        assert_eq!(
            media_pk_from_code("B8jnuB2HAbyc0q001y3F9CHRSoqEljK_dgkJjo0"),
            Some(2243811726252050162)
        );
    }

    #[test]
    fn test_media_pk_rejects_bad_input() {
        assert_eq!(media_pk_from_code(""), None);
        assert_eq!(media_pk_from_code("abc!"), None);
        assert_eq!(media_pk_from_code("ÄBC"), None);
    }

    #[test]
    fn test_parse_album() {
        let post = parse_media_info(StatusCode::OK, ALBUM_RESPONSE).unwrap();

        assert_eq!(post.kind, MediaKind::Album);
        assert_eq!(post.description.as_deref(), Some("Two views"));
        assert_eq!(post.account_name, "harbour.views");
        assert_eq!(post.photo, None);
        assert_eq!(
            post.resources,
            vec![
                "https://cdn.example.test/1.jpg?x=1",
                "https://cdn.example.test/2.mp4",
            ]
        );
    }

    #[test]
    fn test_parse_video_with_null_caption() {
        let body = r#"{"items": [{
            "media_type": 2,
            "caption": null,
            "user": {"username": "someone"},
            "image_versions2": {"candidates": [{"url": "https://cdn.example.test/t.jpg"}]},
            "video_versions": [{"url": "https://cdn.example.test/v.mp4"}]
        }]}"#;

        let post = parse_media_info(StatusCode::OK, body).unwrap();
        assert_eq!(post.kind, MediaKind::Video);
        assert_eq!(post.description, None);
        assert_eq!(post.photo.as_deref(), Some("https://cdn.example.test/t.jpg"));
        assert_eq!(post.video.as_deref(), Some("https://cdn.example.test/v.mp4"));
        assert!(post.resources.is_empty());
    }

    #[test]
    fn test_login_wall_classification() {
        let body = r#"{"message": "login_required", "status": "fail"}"#;
        assert!(matches!(
            parse_media_info(StatusCode::BAD_REQUEST, body),
            Err(ResolveError::LoginRequired)
        ));
        assert!(matches!(
            parse_media_info(StatusCode::FORBIDDEN, "<html></html>"),
            Err(ResolveError::LoginRequired)
        ));
    }

    #[test]
    fn test_other_failures_are_unexpected() {
        assert!(matches!(
            parse_media_info(StatusCode::NOT_FOUND, "{}"),
            Err(ResolveError::NotFound)
        ));
        assert!(matches!(
            parse_media_info(StatusCode::TOO_MANY_REQUESTS, r#"{"message": "Please wait"}"#),
            Err(ResolveError::Status(_))
        ));
        assert!(matches!(
            parse_media_info(StatusCode::OK, r#"{"items": []}"#),
            Err(ResolveError::EmptyResponse)
        ));
        assert!(matches!(
            parse_media_info(StatusCode::OK, "not json"),
            Err(ResolveError::Decode(_))
        ));
    }

    #[test]
    fn test_unknown_media_type() {
        let body = r#"{"items": [{"media_type": 5, "user": {"username": "x"}}]}"#;
        assert!(matches!(
            parse_media_info(StatusCode::OK, body),
            Err(ResolveError::UnknownMediaType(5))
        ));
    }
}
