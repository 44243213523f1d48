//! Ordered, case-insensitive, multi-valued header collection.
//!
//! [`Headers`] is owned by both [`Request`](crate::Request) and
//! [`Response`](crate::Response). Field names are matched case-insensitively
//! and remembered in a display case; serialization follows the conventional
//! "good practice" order of RFC 2616 section 4.2:
//!
//! 1. general headers (`Cache-Control`, `Date`, ...)
//! 2. request headers (`Accept`, `Host`, `User-Agent`, ...)
//! 3. response headers (`ETag`, `Location`, `Server`, ...)
//! 4. entity headers (`Content-Type`, `Last-Modified`, ...)
//! 5. everything else, alphabetically
//!
//! # Examples
//!
//! ```
//! use http_useragent::Headers;
//!
//! let mut headers = Headers::new();
//! headers.set("content-type", "text/plain").unwrap();
//! headers.push("X-Tag", "a").unwrap();
//! headers.push("x-tag", "b").unwrap();
//! headers.set("Date", "Thu, 03 Feb 1994 00:00:00 GMT").unwrap();
//!
//! assert_eq!(headers.get("CONTENT-TYPE").as_deref(), Some("text/plain"));
//! assert_eq!(headers.get("x-tag").as_deref(), Some("a, b"));
//! assert_eq!(
//!     headers.serialize("\n"),
//!     "Date: Thu, 03 Feb 1994 00:00:00 GMT\nContent-Type: text/plain\nX-Tag: a\nX-Tag: b\n"
//! );
//! ```

use crate::error::{AgentError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;
use std::time::SystemTime;

const GENERAL_HEADERS: &[&str] = &[
    "Cache-Control",
    "Connection",
    "Date",
    "Pragma",
    "Trailer",
    "Transfer-Encoding",
    "Upgrade",
    "Via",
    "Warning",
];

const REQUEST_HEADERS: &[&str] = &[
    "Accept",
    "Accept-Charset",
    "Accept-Encoding",
    "Accept-Language",
    "Authorization",
    "Expect",
    "From",
    "Host",
    "If-Match",
    "If-Modified-Since",
    "If-None-Match",
    "If-Range",
    "If-Unmodified-Since",
    "Max-Forwards",
    "Proxy-Authorization",
    "Range",
    "Referer",
    "TE",
    "User-Agent",
];

const RESPONSE_HEADERS: &[&str] = &[
    "Accept-Ranges",
    "Age",
    "ETag",
    "Location",
    "Proxy-Authenticate",
    "Retry-After",
    "Server",
    "Vary",
    "WWW-Authenticate",
];

const ENTITY_HEADERS: &[&str] = &[
    "Allow",
    "Content-Encoding",
    "Content-Language",
    "Content-Length",
    "Content-Location",
    "Content-MD5",
    "Content-Range",
    "Content-Type",
    "Expires",
    "Last-Modified",
];

/// Lowercase name -> (priority, display case) for every well-known field.
static FIELD_ORDER: LazyLock<HashMap<String, (usize, &'static str)>> = LazyLock::new(|| {
    GENERAL_HEADERS
        .iter()
        .chain(REQUEST_HEADERS)
        .chain(RESPONSE_HEADERS)
        .chain(ENTITY_HEADERS)
        .enumerate()
        .map(|(rank, name)| (name.to_ascii_lowercase(), (rank, *name)))
        .collect()
});

/// Prefix of bookkeeping keys hidden from iteration and serialization.
const INTERNAL_PREFIX: &str = "::";

/// One or more header values, accepted by the mutating operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderValues(pub Vec<String>);

impl From<&str> for HeaderValues {
    fn from(v: &str) -> Self {
        HeaderValues(vec![v.to_string()])
    }
}

impl From<String> for HeaderValues {
    fn from(v: String) -> Self {
        HeaderValues(vec![v])
    }
}

impl From<&String> for HeaderValues {
    fn from(v: &String) -> Self {
        HeaderValues(vec![v.clone()])
    }
}

impl From<Vec<String>> for HeaderValues {
    fn from(v: Vec<String>) -> Self {
        HeaderValues(v)
    }
}

impl From<Vec<&str>> for HeaderValues {
    fn from(v: Vec<&str>) -> Self {
        HeaderValues(v.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for HeaderValues {
    fn from(v: &[&str]) -> Self {
        HeaderValues(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderValues {
    fn from(v: [&str; N]) -> Self {
        HeaderValues(v.iter().map(|s| s.to_string()).collect())
    }
}

/// A normalized field name.
struct FieldName {
    key: String,
    display: String,
    /// Display case was given literally with a leading `:`.
    literal: bool,
}

/// Ordered, case-insensitive, multi-valued header collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Headers {
    /// Lowercase name -> values, in insertion order per field.
    fields: BTreeMap<String, Vec<String>>,
    /// Lowercase name -> display case, for fields outside the well-known table.
    display: HashMap<String, String>,
    /// Treat `_` in field names as `-`.
    translate_underscore: bool,
}

impl Default for Headers {
    fn default() -> Self {
        Self::new()
    }
}

impl Headers {
    /// Create an empty header collection.
    pub fn new() -> Self {
        Headers {
            fields: BTreeMap::new(),
            display: HashMap::new(),
            translate_underscore: true,
        }
    }

    /// Build from `(name, value)` pairs; repeated names accumulate.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<HeaderValues>,
    {
        let mut headers = Headers::new();
        for (name, value) in pairs {
            headers.push(name.as_ref(), value)?;
        }
        Ok(headers)
    }

    /// Keep `_` in field names instead of translating it to `-`.
    pub fn set_translate_underscore(&mut self, translate: bool) {
        self.translate_underscore = translate;
    }

    fn normalize(&self, name: &str) -> Result<FieldName> {
        if let Some(literal) = name.strip_prefix(':') {
            if literal.is_empty() {
                return Err(AgentError::InvalidArgument(
                    "header field name must not be empty".into(),
                ));
            }
            return Ok(FieldName {
                key: literal.to_ascii_lowercase(),
                display: literal.to_string(),
                literal: true,
            });
        }

        if name.is_empty() {
            return Err(AgentError::InvalidArgument(
                "header field name must not be empty".into(),
            ));
        }

        let name = if self.translate_underscore {
            name.replace('_', "-")
        } else {
            name.to_string()
        };
        let key = name.to_ascii_lowercase();
        let display = match FIELD_ORDER.get(&key) {
            Some((_, standard)) => standard.to_string(),
            None => capitalize_words(&name),
        };
        Ok(FieldName {
            key,
            display,
            literal: false,
        })
    }

    fn lookup_key(&self, name: &str) -> Option<String> {
        self.normalize(name).ok().map(|f| f.key)
    }

    fn remember_display(&mut self, field: &FieldName) {
        if FIELD_ORDER.contains_key(&field.key) && !field.literal {
            return;
        }
        if field.literal || !self.display.contains_key(&field.key) {
            self.display.insert(field.key.clone(), field.display.clone());
        }
    }

    /// All values of `name`, `, `-joined, or `None` when absent.
    pub fn get(&self, name: &str) -> Option<String> {
        let values = self.fields.get(&self.lookup_key(name)?)?;
        Some(values.join(", "))
    }

    /// Every value of `name` in insertion order.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.lookup_key(name)
            .and_then(|key| self.fields.get(&key))
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether `name` has at least one value.
    pub fn contains(&self, name: &str) -> bool {
        self.lookup_key(name)
            .is_some_and(|key| self.fields.contains_key(&key))
    }

    /// Replace all values of `name`, returning the previous ones.
    ///
    /// An empty value list removes the field.
    pub fn set(&mut self, name: &str, values: impl Into<HeaderValues>) -> Result<Vec<String>> {
        let field = self.normalize(name)?;
        let HeaderValues(values) = values.into();
        self.remember_display(&field);
        let old = if values.is_empty() {
            self.fields.remove(&field.key)
        } else {
            self.fields.insert(field.key, values)
        };
        Ok(old.unwrap_or_default())
    }

    /// Append values to `name`, creating the field if needed.
    pub fn push(&mut self, name: &str, values: impl Into<HeaderValues>) -> Result<()> {
        let field = self.normalize(name)?;
        let HeaderValues(values) = values.into();
        if values.is_empty() {
            return Ok(());
        }
        self.remember_display(&field);
        self.fields.entry(field.key).or_default().extend(values);
        Ok(())
    }

    /// Set `name` only when it currently has no value.
    pub fn init(&mut self, name: &str, values: impl Into<HeaderValues>) -> Result<()> {
        let field = self.normalize(name)?;
        if self.fields.contains_key(&field.key) {
            return Ok(());
        }
        let HeaderValues(values) = values.into();
        if values.is_empty() {
            return Ok(());
        }
        self.remember_display(&field);
        self.fields.insert(field.key, values);
        Ok(())
    }

    /// Remove every listed field, returning the removed values in order.
    pub fn remove(&mut self, names: &[&str]) -> Vec<String> {
        let mut removed = Vec::new();
        for name in names {
            if let Some(values) = self.lookup_key(name).and_then(|k| self.fields.remove(&k)) {
                removed.extend(values);
            }
        }
        removed
    }

    /// Remove all entity headers (`Allow`, `Content-*`, `Expires`,
    /// `Last-Modified`) and return them as a new collection.
    pub fn remove_content_headers(&mut self) -> Headers {
        let keys: Vec<String> = self
            .fields
            .keys()
            .filter(|k| {
                k.starts_with("content-") || ENTITY_HEADERS.iter().any(|e| e.eq_ignore_ascii_case(k))
            })
            .cloned()
            .collect();

        let mut removed = Headers::new();
        for key in keys {
            if let Some(values) = self.fields.remove(&key) {
                if let Some(display) = self.display.get(&key) {
                    removed.display.insert(key.clone(), display.clone());
                }
                removed.fields.insert(key, values);
            }
        }
        removed
    }

    /// Drop every field.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.display.clear();
    }

    /// Number of visible fields (not values).
    pub fn len(&self) -> usize {
        self.sorted_keys().len()
    }

    /// No visible field is set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible keys in serialization order.
    fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .fields
            .keys()
            .map(String::as_str)
            .filter(|k| !k.starts_with(INTERNAL_PREFIX))
            .collect();
        keys.sort_by_key(|k| (FIELD_ORDER.get(*k).map_or(usize::MAX, |(rank, _)| *rank), *k));
        keys
    }

    fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        match self.display.get(key) {
            Some(display) => display.as_str(),
            None => FIELD_ORDER.get(key).map_or(key, |(_, standard)| *standard),
        }
    }

    /// Display names of the visible fields in serialization order.
    pub fn field_names(&self) -> Vec<&str> {
        self.sorted_keys()
            .into_iter()
            .map(|k| self.display_name(k))
            .collect()
    }

    /// `(display name, value)` pairs, one per value, in serialization order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.sorted_keys().into_iter().flat_map(move |key| {
            let name = self.display_name(key);
            self.fields
                .get(key)
                .into_iter()
                .flatten()
                .map(move |v| (name, v.as_str()))
        })
    }

    /// Call `f` once per `(display name, value)` pair in serialization order.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &str),
    {
        for (name, value) in self.iter() {
            f(name, value);
        }
    }

    /// Render as `Name: value` lines, each terminated by `line_ending`.
    ///
    /// Values with embedded newlines are folded into continuation lines.
    pub fn serialize(&self, line_ending: &str) -> String {
        let mut out = String::new();
        self.for_each(|name, value| {
            out.push_str(name);
            out.push_str(": ");
            if value.contains('\n') {
                out.push_str(&fold_value(value, line_ending));
            } else {
                out.push_str(value);
            }
            out.push_str(line_ending);
        });
        out
    }

    /// Store a bookkeeping value that never shows up in iteration.
    pub fn set_internal(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(
            format!("{}{}", INTERNAL_PREFIX, key.to_ascii_lowercase()),
            vec![value.into()],
        );
    }

    /// Value stored by [`set_internal`](Self::set_internal).
    pub fn get_internal(&self, key: &str) -> Option<&str> {
        self.fields
            .get(&format!("{}{}", INTERNAL_PREFIX, key.to_ascii_lowercase()))
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Field for a name fixed at compile time, already in display case.
    fn known_field(name: &'static str) -> FieldName {
        let key = name.to_ascii_lowercase();
        let display = FIELD_ORDER
            .get(&key)
            .map_or(name, |(_, standard)| *standard)
            .to_string();
        FieldName {
            key,
            display,
            literal: false,
        }
    }

    /// Replace a field whose name cannot be invalid.
    pub(crate) fn set_known(&mut self, name: &'static str, value: impl Into<String>) {
        let field = Self::known_field(name);
        self.remember_display(&field);
        self.fields.insert(field.key, vec![value.into()]);
    }

    /// Append to a field whose name cannot be invalid.
    pub(crate) fn push_known(&mut self, name: &'static str, value: impl Into<String>) {
        let field = Self::known_field(name);
        self.remember_display(&field);
        self.fields.entry(field.key).or_default().push(value.into());
    }

    fn date_header(&self, name: &str) -> Option<SystemTime> {
        let value = self.get_all(name).into_iter().next()?;
        httpdate::parse_http_date(value.trim()).ok()
    }

    fn set_date_header(&mut self, name: &'static str, time: SystemTime) {
        self.set_known(name, httpdate::fmt_http_date(time));
    }

    /// `Date` as a timestamp.
    pub fn date(&self) -> Option<SystemTime> {
        self.date_header("Date")
    }

    /// Set `Date` in RFC 1123 format.
    pub fn set_date(&mut self, time: SystemTime) {
        self.set_date_header("Date", time);
    }

    /// `Expires` as a timestamp.
    pub fn expires(&self) -> Option<SystemTime> {
        self.date_header("Expires")
    }

    /// Set `Expires` in RFC 1123 format.
    pub fn set_expires(&mut self, time: SystemTime) {
        self.set_date_header("Expires", time);
    }

    /// `If-Modified-Since` as a timestamp.
    pub fn if_modified_since(&self) -> Option<SystemTime> {
        self.date_header("If-Modified-Since")
    }

    /// Set `If-Modified-Since` in RFC 1123 format.
    pub fn set_if_modified_since(&mut self, time: SystemTime) {
        self.set_date_header("If-Modified-Since", time);
    }

    /// `If-Unmodified-Since` as a timestamp.
    pub fn if_unmodified_since(&self) -> Option<SystemTime> {
        self.date_header("If-Unmodified-Since")
    }

    /// Set `If-Unmodified-Since` in RFC 1123 format.
    pub fn set_if_unmodified_since(&mut self, time: SystemTime) {
        self.set_date_header("If-Unmodified-Since", time);
    }

    /// `Last-Modified` as a timestamp.
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.date_header("Last-Modified")
    }

    /// Set `Last-Modified` in RFC 1123 format.
    pub fn set_last_modified(&mut self, time: SystemTime) {
        self.set_date_header("Last-Modified", time);
    }

    /// When the response reached the client; set by the user agent.
    pub fn client_date(&self) -> Option<SystemTime> {
        self.date_header("Client-Date")
    }

    /// Record when the response was received.
    pub fn set_client_date(&mut self, time: SystemTime) {
        self.set_date_header("Client-Date", time);
    }

    fn basic_auth(&self, name: &str) -> Option<(String, String)> {
        let value = self.get_all(name).into_iter().next()?;
        let encoded = value.trim_start().strip_prefix("Basic")?;
        if !encoded.starts_with(char::is_whitespace) {
            return None;
        }
        let decoded = STANDARD.decode(encoded.trim()).ok()?;
        let decoded = String::from_utf8_lossy(&decoded);
        Some(match decoded.split_once(':') {
            Some((user, password)) => (user.to_string(), password.to_string()),
            None => (decoded.to_string(), String::new()),
        })
    }

    fn set_basic_auth(&mut self, name: &'static str, user: &str, password: &str) -> Result<()> {
        if user.contains(':') {
            return Err(AgentError::InvalidArgument(
                "Basic authorization user name can't contain ':'".into(),
            ));
        }
        let encoded = STANDARD.encode(format!("{}:{}", user, password));
        self.set_known(name, format!("Basic {}", encoded));
        Ok(())
    }

    /// Decoded `(user, password)` of a `Basic` `Authorization` header.
    pub fn authorization_basic(&self) -> Option<(String, String)> {
        self.basic_auth("Authorization")
    }

    /// Set `Authorization: Basic`; `:` in `user` is rejected.
    pub fn set_authorization_basic(&mut self, user: &str, password: &str) -> Result<()> {
        self.set_basic_auth("Authorization", user, password)
    }

    /// Decoded `Proxy-Authorization: Basic` credentials.
    pub fn proxy_authorization_basic(&self) -> Option<(String, String)> {
        self.basic_auth("Proxy-Authorization")
    }

    /// Set `Proxy-Authorization: Basic`.
    pub fn set_proxy_authorization_basic(&mut self, user: &str, password: &str) -> Result<()> {
        self.set_basic_auth("Proxy-Authorization", user, password)
    }

    /// Lowercased media type of `Content-Type`, parameters stripped.
    pub fn content_type(&self) -> Option<String> {
        let value = self.get_all("Content-Type").into_iter().next()?;
        let media = value.split(';').next().unwrap_or_default().trim();
        if media.is_empty() {
            return None;
        }
        Some(media.to_ascii_lowercase())
    }

    /// Uppercased `charset` parameter of `Content-Type`.
    pub fn content_type_charset(&self) -> Option<String> {
        let value = self.get_all("Content-Type").into_iter().next()?;
        crate::protocol::split_header_words([value])
            .into_iter()
            .next()?
            .into_iter()
            .skip(1)
            .find(|(name, _)| name.eq_ignore_ascii_case("charset"))
            .and_then(|(_, charset)| charset)
            .filter(|charset| !charset.is_empty())
            .map(|charset| charset.to_ascii_uppercase())
    }

    /// `Content-Length`, if it parses.
    pub fn content_length(&self) -> Option<u64> {
        self.get_all("Content-Length")
            .into_iter()
            .next()
            .and_then(|v| v.trim().parse().ok())
    }

    /// `User-Agent` value.
    pub fn user_agent(&self) -> Option<String> {
        self.get("User-Agent")
    }

    /// `From`, the e-mail address of the requesting user.
    pub fn from_email(&self) -> Option<String> {
        self.get("From")
    }

    /// `Referer` value.
    pub fn referer(&self) -> Option<String> {
        self.get("Referer")
    }

    /// Set `Referer`, dropping any fragment.
    pub fn set_referer(&mut self, uri: &str) {
        let without_fragment = uri.split('#').next().unwrap_or(uri);
        self.set_known("Referer", without_fragment.to_string());
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize("\n"))
    }
}

/// Uppercase the first letter of every word, keeping the rest as given.
fn capitalize_words(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for c in name.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric() && c != '_';
    }
    out
}

/// Fold a multi-line value into header continuation lines.
fn fold_value(value: &str, line_ending: &str) -> String {
    let value = value.trim_end();
    let mut lines = value.split('\n');
    let mut out = String::from(lines.next().unwrap_or_default());
    for line in lines {
        if line.is_empty() || line == "\r" {
            continue;
        }
        out.push_str(line_ending);
        if !line.starts_with(' ') && !line.starts_with('\t') {
            out.push(' ');
        }
        out.push_str(line);
    }
    out
}
