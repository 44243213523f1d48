//! Entity-tag lists for `ETag`, `If-Match` and `If-None-Match`.
//!
//! Tags are kept in their normalized wire form: `"opaque"` for strong tags and
//! `W/"opaque"` for weak ones. Quoted tags are copied verbatim, escapes
//! included; bare tokens sent by sloppy servers are wrapped in quotes.

use super::header_words::{quote, scan_quoted};
use std::fmt;

/// Split one or more entity-tag list values into normalized tags.
///
/// # Examples
///
/// ```
/// use http_useragent::protocol::split_etag_list;
///
/// assert_eq!(split_etag_list([r#""foo", W/"bar""#]), vec![r#""foo""#, r#"W/"bar""#]);
/// assert_eq!(split_etag_list(["w/"]), vec![r#"W/"""#]);
/// assert!(split_etag_list([""]).is_empty());
/// ```
pub fn split_etag_list<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tags = Vec::new();

    for value in values {
        let mut rest = value.as_ref();

        loop {
            rest = rest.trim_start();
            let weak = rest.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("w/"));
            if weak {
                rest = rest[2..].trim_start();
            }
            let prefix = if weak { "W/" } else { "" };

            if rest.is_empty() {
                if weak {
                    tags.push("W/\"\"".to_string());
                }
                break;
            }

            if rest.starts_with(',') {
                if weak {
                    tags.push("W/\"\"".to_string());
                }
                rest = &rest[1..];
                continue;
            }

            if rest.starts_with('"') {
                let scan = scan_quoted(rest);
                if scan.terminated {
                    tags.push(format!("{}{}", prefix, &rest[..scan.consumed]));
                    rest = &rest[scan.consumed..];
                    continue;
                }
            }

            // bare token: quote it ourselves
            let end = rest
                .find(|c: char| c == ',' || c.is_whitespace())
                .unwrap_or(rest.len());
            tags.push(format!("{}{}", prefix, quote(&rest[..end])));
            rest = &rest[end..];
        }
    }

    tags
}

/// Join already formatted tags into one header value.
///
/// No escaping is applied; tags are expected to come from
/// [`split_etag_list`] or [`ETag`]'s `Display`.
#[inline]
pub fn join_etag_list<I, S>(tags: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tags.into_iter()
        .map(|t| t.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A single parsed entity tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ETag {
    weak: bool,
    opaque: String,
}

impl ETag {
    /// Strong tag with the given opaque content.
    pub fn strong(opaque: impl Into<String>) -> Self {
        ETag {
            weak: false,
            opaque: opaque.into(),
        }
    }

    /// Weak tag with the given opaque content.
    pub fn weak(opaque: impl Into<String>) -> Self {
        ETag {
            weak: true,
            opaque: opaque.into(),
        }
    }

    /// Parse one normalized tag as produced by [`split_etag_list`].
    pub fn parse(tag: &str) -> Option<Self> {
        let (weak, rest) = match tag.get(..2) {
            Some(p) if p.eq_ignore_ascii_case("w/") => (true, &tag[2..]),
            _ => (false, tag),
        };
        if !rest.starts_with('"') {
            return None;
        }
        let scan = scan_quoted(rest);
        if !scan.terminated || scan.consumed != rest.len() {
            return None;
        }
        Some(ETag {
            weak,
            opaque: scan.content,
        })
    }

    /// `true` for `W/"..."` tags.
    #[inline]
    pub fn is_weak(&self) -> bool {
        self.weak
    }

    /// The quoted part, without quotes or the `W/` prefix.
    #[inline]
    pub fn opaque(&self) -> &str {
        &self.opaque
    }

    /// Strong comparison: both strong and byte-identical.
    pub fn strong_eq(&self, other: &ETag) -> bool {
        !self.weak && !other.weak && self.opaque == other.opaque
    }

    /// Weak comparison: opaque contents match regardless of weakness.
    pub fn weak_eq(&self, other: &ETag) -> bool {
        self.opaque == other.opaque
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            f.write_str("W/")?;
        }
        f.write_str(&quote(&self.opaque))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_and_weak() {
        assert_eq!(
            split_etag_list([r#""foo", W/"bar""#]),
            vec![r#""foo""#, r#"W/"bar""#]
        );
    }

    #[test]
    fn test_lowercase_weak_marker() {
        assert_eq!(split_etag_list([r#"w/"x""#]), vec![r#"W/"x""#]);
        assert_eq!(split_etag_list(["w/"]), vec![r#"W/"""#]);
        assert_eq!(split_etag_list(["W/, \"a\""]), vec![r#"W/"""#, r#""a""#]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_etag_list([""]).is_empty());
        assert!(split_etag_list(["  ,  "]).is_empty());
        assert!(split_etag_list(Vec::<&str>::new()).is_empty());
    }

    #[test]
    fn test_bare_token_is_quoted() {
        assert_eq!(split_etag_list(["foo, W/bar"]), vec![r#""foo""#, r#"W/"bar""#]);
        assert_eq!(split_etag_list([r"a\b"]), vec![r#""a\\b""#]);
    }

    #[test]
    fn test_escapes_preserved_verbatim() {
        assert_eq!(split_etag_list([r#""a\"b""#]), vec![r#""a\"b""#]);
    }

    #[test]
    fn test_multiple_values() {
        assert_eq!(
            split_etag_list([r#""a""#, r#""b", "c""#]),
            vec![r#""a""#, r#""b""#, r#""c""#]
        );
    }

    #[test]
    fn test_join() {
        let tags = split_etag_list([r#""foo",W/"bar""#]);
        assert_eq!(join_etag_list(&tags), r#""foo", W/"bar""#);
        assert_eq!(join_etag_list(Vec::<String>::new()), "");
    }

    #[test]
    fn test_etag_parse_and_compare() {
        let strong = ETag::parse(r#""v1""#).unwrap();
        let weak = ETag::parse(r#"W/"v1""#).unwrap();
        assert!(!strong.is_weak());
        assert!(weak.is_weak());
        assert_eq!(weak.opaque(), "v1");
        assert!(!strong.strong_eq(&weak));
        assert!(strong.weak_eq(&weak));
        assert!(strong.strong_eq(&ETag::strong("v1")));
        assert!(ETag::parse("v1").is_none());
        assert!(ETag::parse(r#""v1" junk"#).is_none());
    }

    #[test]
    fn test_etag_display() {
        assert_eq!(ETag::weak("a\"b").to_string(), r#"W/"a\"b""#);
        assert_eq!(ETag::strong("x").to_string(), r#""x""#);
    }
}
