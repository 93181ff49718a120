//! Cache key construction
//!
//! Keys are readable strings rather than hashes: administrative clears match
//! on the host substring, so the host must appear verbatim in every key.

use reqwest::Method;

/// Key scoping a login session: `host:port:username`.
pub fn session_key(host: &str, port: u16, username: &str) -> String {
    format!("{}:{}:{}", host.to_ascii_lowercase(), port, username)
}

/// Key for a resolved site id: `mode|base_url|requested`.
pub fn site_key(auth_mode: &str, base_url: &str, requested: &str) -> String {
    format!("{}|{}|{}", auth_mode, base_url, requested)
}

/// Key for an endpoint payload: method, base URL and path with query.
///
/// Query parameters are sorted so equivalent requests share one entry.
pub fn endpoint_key(method: &Method, base_url: &str, path: &str) -> String {
    let (path, query) = match path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path, None),
    };

    let mut key = format!("{} {}{}", method, base_url.trim_end_matches('/'), path);
    if let Some(query) = query {
        let mut params: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
        params.sort_unstable();
        if !params.is_empty() {
            key.push('?');
            key.push_str(&params.join("&"));
        }
    }
    key
}
