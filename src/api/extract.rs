//! Extractors whose rejections render as [`ApiError`] (400 + `{error}`)
//! instead of axum's plain-text defaults.

use axum::extract::FromRequest;
use axum::extract::FromRequestParts;

use super::error::ApiError;

/// `axum::Json` with [`ApiError`] rejections.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with [`ApiError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `axum::extract::Path` with [`ApiError`] rejections.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Parse an optional numeric query value.
pub fn parse_number<T: std::str::FromStr>(
    value: Option<&str>,
    name: &str,
) -> Result<Option<T>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::Validation(format!("{name} must be a number, got {raw:?}"))),
    }
}

/// Parse a `limit` value: defaults to `default`, must be >= 1, capped at `max`.
pub fn parse_limit(value: Option<&str>, default: usize, max: usize) -> Result<usize, ApiError> {
    match parse_number::<usize>(value, "limit")? {
        None => Ok(default.min(max)),
        Some(0) => Err(ApiError::Validation("limit must be >= 1".to_string())),
        Some(limit) => Ok(limit.min(max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None, 10, 500).unwrap(), 10);
        assert_eq!(parse_limit(Some("25"), 10, 500).unwrap(), 25);
        assert_eq!(parse_limit(Some("9999"), 10, 500).unwrap(), 500);
        assert!(parse_limit(Some("0"), 10, 500).is_err());
        assert!(parse_limit(Some("ten"), 10, 500).is_err());
    }

    #[test]
    fn test_parse_number_blank_is_absent() {
        assert_eq!(parse_number::<f64>(Some(" "), "minDepth").unwrap(), None);
        assert_eq!(parse_number::<f64>(Some("3000.5"), "minDepth").unwrap(), Some(3000.5));
    }
}
