//! Structured header-value grammar.
//!
//! Many HTTP header values share one informal micro-grammar: a comma separated
//! list of *words*, each word a semicolon separated list of `name` or
//! `name=value` entries, where a value is either a bare token or a quoted
//! string with backslash escapes.
//!
//! # Header Formats
//!
//! | Header | Example |
//! |--------|---------|
//! | Content-Type | `text/html; charset=iso-8859-1` |
//! | Cache-Control | `no-cache, max-age=0` |
//! | WWW-Authenticate | `Basic realm="wally world"` |
//! | Set-Cookie2 | `foo="bar"; port="80,81"; discard` |
//!
//! # Examples
//!
//! ```
//! use http_useragent::protocol::{join_header_words, split_header_words};
//!
//! let words = split_header_words(["foo=\"bar\"; port=\"80,81\"; discard, bar=baz"]);
//! assert_eq!(words.len(), 2);
//! assert_eq!(words[0][2], ("discard".to_string(), None));
//!
//! // Serialization is canonical: needless quotes are dropped.
//! assert_eq!(
//!     join_header_words(&words),
//!     "foo=bar; port=\"80,81\"; discard, bar=baz"
//! );
//! ```
//!
//! [RFC 2616 Section 2.2]: https://datatracker.ietf.org/doc/html/rfc2616#section-2.2

/// One comma-separated unit of a structured header value.
///
/// Each entry is a `(name, value)` pair; `None` marks a bare attribute such as
/// `discard`, `Some("")` an explicitly empty one such as `foo=`.
pub type HeaderWord = Vec<(String, Option<String>)>;

/// Characters that force a value to be quoted on output, besides controls,
/// space and non-ASCII.
const SEPARATORS: &str = "()<>@,;:\\\"/[]?={}";

/// Lexical unit of a header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    /// Bare run of characters.
    Word(&'a str),
    /// Content of a quoted string with escapes resolved.
    Quoted(String),
    Semicolon,
    Comma,
    Equals,
}

/// Result of scanning a quoted string.
#[derive(Debug)]
pub(crate) struct QuotedScan {
    /// Bytes consumed, opening and (if present) closing quote included.
    pub consumed: usize,
    /// Content with backslash escapes resolved.
    pub content: String,
    /// Whether the closing quote was found.
    pub terminated: bool,
}

/// Scan a quoted string starting at the opening `"` of `input`.
///
/// An unterminated string runs to the end of input.
pub(crate) fn scan_quoted(input: &str) -> QuotedScan {
    debug_assert!(input.starts_with('"'));

    let mut content = String::new();
    let mut chars = input.char_indices().skip(1);

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => {
                return QuotedScan {
                    consumed: idx + 1,
                    content,
                    terminated: true,
                }
            }
            '\\' => match chars.next() {
                Some((_, escaped)) => content.push(escaped),
                None => break,
            },
            _ => content.push(c),
        }
    }

    QuotedScan {
        consumed: input.len(),
        content,
        terminated: false,
    }
}

fn is_word_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '=' | ';' | ',')
}

/// Left-to-right scanner over one header value. Never backtracks.
pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Tokenizer { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub(crate) fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest.find(|c: char| !keep(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    /// Consume `c` if it is the next character.
    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Next structural token. Words stop at whitespace, `=`, `;` and `,`,
    /// but a run of `=` directly in front of a word is part of that word.
    pub(crate) fn next_token(&mut self) -> Option<Token<'a>> {
        self.skip_whitespace();
        let c = self.peek()?;
        let token = match c {
            ';' => Token::Semicolon,
            ',' => Token::Comma,
            '=' => {
                let rest = self.rest();
                let word = rest.trim_start_matches('=');
                if !word.starts_with(is_word_char) {
                    self.pos += 1;
                    return Some(Token::Equals);
                }
                let end = rest.len() - word.len()
                    + word.find(|c: char| !is_word_char(c)).unwrap_or(word.len());
                self.pos += end;
                return Some(Token::Word(&rest[..end]));
            }
            _ => return Some(Token::Word(self.take_while(is_word_char))),
        };
        self.pos += c.len_utf8();
        Some(token)
    }

    /// Token in value position, right after `=`: a quoted string, or a bare
    /// run that may itself contain `=` and may be empty.
    pub(crate) fn next_value(&mut self) -> Token<'a> {
        self.skip_whitespace();
        if self.peek() == Some('"') {
            let scan = scan_quoted(self.rest());
            self.pos += scan.consumed;
            Token::Quoted(scan.content)
        } else {
            Token::Word(self.take_while(|c| !c.is_whitespace() && c != ';' && c != ','))
        }
    }
}

/// Split structured header values into words.
///
/// Repeated occurrences of one header are equivalent to a single `,`-joined
/// value, so all `values` are joined before parsing. Empty words are dropped and
/// malformed input never fails.
///
/// # Examples
///
/// ```
/// use http_useragent::protocol::split_header_words;
///
/// assert_eq!(
///     split_header_words(["foo"]),
///     vec![vec![("foo".to_string(), None)]]
/// );
/// assert_eq!(
///     split_header_words(["foo=bar", "bar=baz"]),
///     split_header_words(["foo=bar, bar=baz"])
/// );
/// assert!(split_header_words(["  ,, "]).is_empty());
/// ```
pub fn split_header_words<I, S>(values: I) -> Vec<HeaderWord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = values
        .into_iter()
        .map(|v| v.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",");

    let mut words = Vec::new();
    let mut current: HeaderWord = Vec::new();
    let mut tokens = Tokenizer::new(&joined);

    while let Some(token) = tokens.next_token() {
        match token {
            Token::Word(name) => {
                tokens.skip_whitespace();
                let value = if tokens.eat('=') {
                    match tokens.next_value() {
                        Token::Quoted(content) => Some(content),
                        Token::Word(raw) => Some(raw.trim_end().to_string()),
                        _ => Some(String::new()),
                    }
                } else {
                    None
                };
                current.push((name.to_string(), value));
            }
            Token::Comma => {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            // stray separators carry no entry
            Token::Semicolon | Token::Equals | Token::Quoted(_) => {}
        }
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Whether `value` has to be emitted as a quoted string.
fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|c| c.is_ascii_control() || c == ' ' || !c.is_ascii() || SEPARATORS.contains(c))
}

/// Render `value` as a quoted string, escaping `"` and `\`.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Join header words back into a single header value.
///
/// The inverse of [`split_header_words`] for canonical input: values are
/// quoted only when they must be.
///
/// # Examples
///
/// ```
/// use http_useragent::protocol::join_header_words;
///
/// let empty = vec![vec![("foo".to_string(), Some(String::new()))]];
/// assert_eq!(join_header_words(&empty), "foo=\"\"");
///
/// let bare = vec![vec![("foo".to_string(), None)]];
/// assert_eq!(join_header_words(&bare), "foo");
/// ```
pub fn join_header_words(words: &[HeaderWord]) -> String {
    words
        .iter()
        .filter(|word| !word.is_empty())
        .map(|word| {
            word.iter()
                .map(|(name, value)| match value {
                    None => name.clone(),
                    Some(v) if needs_quoting(v) => format!("{}={}", name, quote(v)),
                    Some(v) => format!("{}={}", name, v),
                })
                .collect::<Vec<_>>()
                .join("; ")
        })
        .collect::<Vec<_>>()
        .join(", ")
}
