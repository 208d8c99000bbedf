// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Derive the post identifier from a post URL: its last non-empty path segment.
///
/// Query strings, fragments and trailing slashes do not change the result.
/// A final `.` or `..` segment never names a post.
///
/// # Examples
/// ```
/// use harvester::utils::url::post_identifier;
///
/// assert_eq!(
///     post_identifier("https://example.test/p/ABC123/"),
///     Some("ABC123".to_string())
/// );
/// ```
pub fn post_identifier(url: &str) -> Option<String> {
    match Url::parse(url.trim()) {
        Ok(parsed) => last_segment(&parsed),
        Err(_) => last_raw_segment(url),
    }
}

/// Derive the on-disk file name for a resource locator.
///
/// The query string is stripped; only the basename of the path remains.
///
/// # Examples
/// ```
/// use harvester::utils::url::file_name;
///
/// assert_eq!(
///     file_name("https://cdn.example.test/v/t51/photo_1.jpg?stp=dst&_nc_ht=x"),
///     Some("photo_1.jpg".to_string())
/// );
/// ```
pub fn file_name(locator: &str) -> Option<String> {
    match Url::parse(locator.trim()) {
        Ok(parsed) => last_segment(&parsed),
        Err(_) => last_raw_segment(locator),
    }
}

/// Normalize a persisted cache line into an identifier.
///
/// Lines written by older runs may hold the full post URL instead of the
/// identifier; both forms map to the same key.
pub fn cache_key(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    if line.contains("://") {
        return post_identifier(line);
    }
    is_name(line).then(|| line.to_string())
}

fn last_segment(url: &Url) -> Option<String> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .filter(|segment| is_name(segment))
        .map(str::to_string)
}

fn last_raw_segment(raw: &str) -> Option<String> {
    let without_query = raw.trim().split(['?', '#']).next()?;
    without_query
        .split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .filter(|segment| is_name(segment))
        .map(str::to_string)
}

/// Dot segments would escape or alias the per-post directory.
fn is_name(segment: &str) -> bool {
    segment != "." && segment != ".."
}
