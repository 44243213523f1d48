//! Header names and status codes the user agent acts on.

/// Header names, as lowercase [`http::HeaderName`]s.
///
/// Standard names are re-exported from [`http::header`]; the `Client-*`
/// names are diagnostics the user agent adds to responses itself.
pub mod headers {
    use http::header::HeaderName;

    pub use http::header::{
        AUTHORIZATION, CONTENT_LOCATION, CONTENT_TYPE, COOKIE, FROM, HOST, LOCATION,
        PROXY_AUTHENTICATE, PROXY_AUTHORIZATION, RANGE, REFERER, SET_COOKIE, USER_AGENT,
        WWW_AUTHENTICATE,
    };

    /// Non-fatal diagnostics attached to a returned response.
    pub const CLIENT_WARNING: HeaderName = HeaderName::from_static("client-warning");

    /// When the response was received, as seen by the client.
    pub const CLIENT_DATE: HeaderName = HeaderName::from_static("client-date");

    /// Legacy base URI header, honored before `Content-Location`.
    pub const CONTENT_BASE: HeaderName = HeaderName::from_static("content-base");
}

/// Redirect statuses the request loop follows.
pub const REDIRECT_STATUSES: [u16; 5] = [301, 302, 303, 307, 308];

/// Redirect statuses that turn a non-GET/HEAD request into a GET.
pub const METHOD_CHANGING_REDIRECTS: [u16; 2] = [302, 303];

/// Challenge from the origin server.
pub const UNAUTHORIZED: u16 = 401;
/// Challenge from a proxy.
pub const PROXY_AUTHENTICATION_REQUIRED: u16 = 407;
