use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::error::FetchError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const READ_TIMEOUT: Duration = Duration::from_secs(5 * 60);
const USER_AGENT: &str = concat!("appimage-update/", env!("CARGO_PKG_VERSION"));

/// Builds the blocking client used for one update attempt.
///
/// Connect and read timeouts are bounded so a stalled server surfaces as a
/// transport error instead of hanging the updater.
pub fn http_client() -> Result<Client, FetchError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(READ_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::Client)
}

/// Downloads the whole control file at `url`.
///
/// Any 2xx status is accepted; everything else is a
/// [`FetchError::Status`].
pub fn fetch_control(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let transport = |source| FetchError::Transport {
        url: url.to_owned(),
        source,
    };

    let response = client.get(url).send().map_err(transport)?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_owned(),
            status: status.as_u16(),
        });
    }

    let body = response.bytes().map_err(transport)?;
    debug!(url, bytes = body.len(), "fetched control file");
    Ok(body.to_vec())
}

/// Resolves the artifact URL advertised in a control header.
///
/// Absolute `http(s)`/`ftp` URLs are taken as-is; anything else is resolved
/// relative to the control file's own URL, mirroring how publishers place
/// the artifact next to its `.zsync`.
pub fn resolve_url(control_url: &str, header_url: &str) -> Result<String, FetchError> {
    if header_url.starts_with("http") || header_url.starts_with("ftp") {
        return Ok(header_url.to_owned());
    }

    let base = Url::parse(control_url).map_err(|source| FetchError::InvalidUrl {
        url: control_url.to_owned(),
        source,
    })?;
    let resolved = base
        .join(header_url)
        .map_err(|source| FetchError::InvalidUrl {
            url: header_url.to_owned(),
            source,
        })?;
    Ok(resolved.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_urls_pass_through() {
        let resolved = resolve_url(
            "https://example.org/releases/app.AppImage.zsync",
            "https://cdn.example.org/app.AppImage",
        )
        .unwrap();
        assert_eq!(resolved, "https://cdn.example.org/app.AppImage");
    }

    #[test]
    fn relative_urls_resolve_against_the_control_url() {
        let resolved = resolve_url(
            "https://example.org/releases/app.AppImage.zsync",
            "app.AppImage",
        )
        .unwrap();
        assert_eq!(resolved, "https://example.org/releases/app.AppImage");
    }

    #[test]
    fn unparsable_base_is_reported() {
        let err = resolve_url("not a url", "app.AppImage").unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }
}
