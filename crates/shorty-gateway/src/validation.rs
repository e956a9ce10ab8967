use url::Url;

use crate::error::AppError;

/// Accepts absolute `http` / `https` URLs that name a host.
pub fn validate_url(raw: &str) -> Result<(), AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::BadRequest("URL cannot be empty".to_string()));
    }

    let parsed = Url::parse(raw)
        .map_err(|e| AppError::BadRequest(format!("invalid URL '{raw}': {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::BadRequest(format!(
            "URL scheme must be http or https: {}",
            parsed.scheme()
        )));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(AppError::BadRequest(format!("URL must have a host: {raw}")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("https://example.com/path?q=1#frag").is_ok());
        assert!(validate_url("HTTPS://EXAMPLE.COM").is_ok());
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(validate_url("ftp://example.com").is_err());
        assert!(validate_url("javascript:alert(1)").is_err());
    }

    #[test]
    fn rejects_relative_and_empty() {
        assert!(validate_url("").is_err());
        assert!(validate_url("   ").is_err());
        assert!(validate_url("example.com").is_err());
        assert!(validate_url("/s/abc").is_err());
    }
}
