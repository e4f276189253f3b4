//! Session cookie lookup and `Set-Cookie` rendering
//!
//! Every session cookie exists under two names: the plain base name and the
//! `__Secure-` prefixed variant that browsers only accept over HTTPS. The gate
//! clears both; login issues whichever one the deployment is configured for.

use hyper::header::COOKIE;
use hyper::HeaderMap;

/// Prefix browsers reserve for cookies set with the `Secure` attribute
pub const SECURE_PREFIX: &str = "__Secure-";

/// Default base name of the session cookie
pub const DEFAULT_SESSION_COOKIE: &str = "watson.session-token";

/// Both names a session cookie may be stored under, secure variant first
pub fn session_cookie_names(base: &str) -> [String; 2] {
    [format!("{SECURE_PREFIX}{base}"), base.to_string()]
}

/// Find a cookie value by exact name across all `Cookie` headers.
///
/// Returns the first non-empty match.
pub fn get_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.trim_matches('"'))
}

/// Instruction to expire a cookie on the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearCookie {
    pub name: String,
    pub path: String,
    pub max_age: u64,
}

impl ClearCookie {
    /// Expire `name` immediately at the root path
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: "/".to_string(),
            max_age: 0,
        }
    }

    /// Clear instructions for both names of a session cookie
    pub fn for_session(base: &str) -> Vec<ClearCookie> {
        session_cookie_names(base)
            .into_iter()
            .map(ClearCookie::new)
            .collect()
    }

    /// Render as a `Set-Cookie` header value
    pub fn header_value(&self) -> String {
        let mut value = format!("{}=; Path={}; Max-Age={}", self.name, self.path, self.max_age);
        if self.name.starts_with(SECURE_PREFIX) {
            value.push_str("; Secure");
        }
        value
    }
}

/// Render the `Set-Cookie` header carrying a freshly issued session token.
///
/// With `secure` set the cookie goes under the `__Secure-` name.
pub fn session_cookie(base: &str, token: &str, max_age: u64, secure: bool) -> String {
    if secure {
        format!(
            "{SECURE_PREFIX}{base}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}; Secure"
        )
    } else {
        format!("{base}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn headers(cookies: &[&'static str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for c in cookies {
            map.append(COOKIE, HeaderValue::from_static(c));
        }
        map
    }

    #[test]
    fn test_session_cookie_names() {
        let [secure, plain] = session_cookie_names("watson.session-token");
        assert_eq!(secure, "__Secure-watson.session-token");
        assert_eq!(plain, "watson.session-token");
    }

    #[test]
    fn test_get_cookie() {
        let map = headers(&["theme=dark; watson.session-token=abc.def.ghi; lang=en"]);
        assert_eq!(get_cookie(&map, "watson.session-token"), Some("abc.def.ghi"));
        assert_eq!(get_cookie(&map, "theme"), Some("dark"));
        assert_eq!(get_cookie(&map, "missing"), None);
    }

    #[test]
    fn test_get_cookie_exact_name_only() {
        let map = headers(&["__Secure-watson.session-token=secure"]);
        assert_eq!(get_cookie(&map, "watson.session-token"), None);
        assert_eq!(
            get_cookie(&map, "__Secure-watson.session-token"),
            Some("secure")
        );
    }

    #[test]
    fn test_get_cookie_across_headers_and_empty_values() {
        let map = headers(&["watson.session-token=", "watson.session-token=second"]);
        assert_eq!(get_cookie(&map, "watson.session-token"), Some("second"));
    }

    #[test]
    fn test_clear_cookie_header_value() {
        let clears = ClearCookie::for_session("watson.session-token");
        assert_eq!(clears.len(), 2);
        assert_eq!(
            clears[0].header_value(),
            "__Secure-watson.session-token=; Path=/; Max-Age=0; Secure"
        );
        assert_eq!(
            clears[1].header_value(),
            "watson.session-token=; Path=/; Max-Age=0"
        );
    }

    #[test]
    fn test_session_cookie() {
        assert_eq!(
            session_cookie("sid", "tok", 60, false),
            "sid=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=60"
        );
        assert!(session_cookie("sid", "tok", 60, true).starts_with("__Secure-sid=tok;"));
        assert!(session_cookie("sid", "tok", 60, true).ends_with("; Secure"));
    }
}
