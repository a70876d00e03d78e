use url::Url;

/// Network and client metadata captured server-side for an ingest call.
///
/// Built by the HTTP layer from the socket, headers, GeoIP and UA parsing.
/// Request bodies never contribute to it.
#[derive(Debug, Clone, Default)]
pub struct ClientContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_type: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
}

/// Reduce a user-entered website address to the key used for per-website
/// rollups: lower-cased host without scheme or `www.`, plus any path without
/// its trailing slash.
///
/// `"HTTPS://www.Example.com/"` and `"example.com"` both become `"example.com"`.
/// Input that cannot be parsed as a URL is trimmed and lower-cased as-is.
pub fn normalize_website_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let Ok(parsed) = Url::parse(&with_scheme) else {
        return trimmed.trim_end_matches('/').to_lowercase();
    };
    let Some(host) = parsed.host_str() else {
        return trimmed.trim_end_matches('/').to_lowercase();
    };

    let host = host.trim_start_matches("www.");
    let path = parsed.path().trim_end_matches('/');
    format!("{host}{path}").to_lowercase()
}
