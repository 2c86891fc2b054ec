//! Pattern matching of recorded requests.

use std::fmt;

use regex::Regex;

use crate::{Error, HttpRequest, Result, request::Multimap};

/// A single string pattern: a literal, optionally also usable as a regex.
///
/// A value matches when it equals the literal, or when the pattern compiled
/// as an anchored regex matches the whole value. Patterns that are neither a
/// usable literal nor a valid regex are rejected at construction.
#[derive(Clone)]
struct StringPattern {
    literal: String,
    regex: Option<Regex>,
}

impl StringPattern {
    fn new(field: &'static str, pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(Error::invalid_matcher(field, pattern, "pattern is empty"));
        }
        let regex = if is_plain_literal(pattern) {
            None
        } else {
            Some(
                Regex::new(&format!("^(?:{pattern})$"))
                    .map_err(|e| Error::invalid_matcher(field, pattern, e))?,
            )
        };
        Ok(Self {
            literal: pattern.to_string(),
            regex,
        })
    }

    fn matches(&self, value: &str) -> bool {
        self.literal == value || self.regex.as_ref().is_some_and(|r| r.is_match(value))
    }
}

fn is_plain_literal(pattern: &str) -> bool {
    !pattern.chars().any(|c| "\\.+*?()|[]{}^$".contains(c))
}

#[derive(Clone)]
struct MultimapPattern {
    entries: Vec<(StringPattern, Vec<StringPattern>)>,
    case_insensitive_names: bool,
}

impl MultimapPattern {
    fn new(field: &'static str, map: &Multimap, case_insensitive_names: bool) -> Result<Self> {
        let entries = map
            .iter()
            .map(|(name, values)| {
                let name = StringPattern::new(field, name)?;
                let values = values
                    .iter()
                    .map(|v| StringPattern::new(field, v))
                    .collect::<Result<Vec<_>>>()?;
                Ok((name, values))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            entries,
            case_insensitive_names,
        })
    }

    fn name_matches(&self, pattern: &StringPattern, name: &str) -> bool {
        if self.case_insensitive_names {
            pattern.literal.eq_ignore_ascii_case(name)
                || pattern.matches(&name.to_ascii_lowercase())
                || pattern.matches(name)
        } else {
            pattern.matches(name)
        }
    }

    /// Every pattern entry must find an actual entry with a matching name
    /// holding every pattern value.
    fn matches(&self, actual: &Multimap) -> bool {
        self.entries.iter().all(|(name, values)| {
            actual
                .iter()
                .filter(|(actual_name, _)| self.name_matches(name, actual_name))
                .any(|(_, actual_values)| {
                    values
                        .iter()
                        .all(|v| actual_values.iter().any(|a| v.matches(a)))
                })
        })
    }
}

/// A compiled request pattern.
///
/// Built from a sparse [`HttpRequest`]: unset fields match anything, set
/// fields must match. Methods compare case-insensitively; paths, header,
/// query parameter and cookie values match literally or as full regular
/// expressions; bodies compare exactly.
///
/// # Example
///
/// ```rust
/// use mockverify::{RequestMatcher, request};
///
/// let matcher = RequestMatcher::new(&request("/orders/\\d+"))?;
/// assert!(matcher.matches(&request("/orders/42")));
/// assert!(!matcher.matches(&request("/orders/new")));
/// # Ok::<(), mockverify::Error>(())
/// ```
#[derive(Clone)]
pub struct RequestMatcher {
    pattern: HttpRequest,
    method: Option<String>,
    path: Option<StringPattern>,
    query_string_parameters: MultimapPattern,
    headers: MultimapPattern,
    cookies: MultimapPattern,
}

impl fmt::Debug for RequestMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMatcher")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl RequestMatcher {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMatcher`] if a field holds an empty pattern or
    /// an invalid regular expression.
    pub fn new(pattern: &HttpRequest) -> Result<Self> {
        let method = match pattern.method() {
            Some("") => return Err(Error::invalid_matcher("method", "", "method is empty")),
            Some(m) => Some(m.to_ascii_uppercase()),
            None => None,
        };
        let path = pattern
            .path()
            .map(|p| StringPattern::new("path", p))
            .transpose()?;
        Ok(Self {
            method,
            path,
            query_string_parameters: MultimapPattern::new(
                "query parameter",
                pattern.query_string_parameters(),
                false,
            )?,
            headers: MultimapPattern::new("header", pattern.headers(), true)?,
            cookies: MultimapPattern::new("cookie", pattern.cookies(), false)?,
            pattern: pattern.clone(),
        })
    }

    /// Returns the pattern this matcher was compiled from.
    pub fn pattern(&self) -> &HttpRequest {
        &self.pattern
    }

    /// Returns true if the request satisfies every field set in the pattern.
    pub fn matches(&self, request: &HttpRequest) -> bool {
        if let Some(method) = &self.method {
            if !request
                .method()
                .is_some_and(|m| m.eq_ignore_ascii_case(method))
            {
                return false;
            }
        }
        if let Some(path) = &self.path {
            if !request.path().is_some_and(|p| path.matches(p)) {
                return false;
            }
        }
        if let Some(body) = self.pattern.body() {
            if request.body() != Some(body) {
                return false;
            }
        }
        if self.pattern.keep_alive().is_some() && self.pattern.keep_alive() != request.keep_alive()
        {
            return false;
        }
        if self.pattern.secure().is_some() && self.pattern.secure() != request.secure() {
            return false;
        }
        self.query_string_parameters
            .matches(request.query_string_parameters())
            && self.headers.matches(request.headers())
            && self.cookies.matches(request.cookies())
    }
}

impl TryFrom<&HttpRequest> for RequestMatcher {
    type Error = Error;

    fn try_from(pattern: &HttpRequest) -> Result<Self> {
        RequestMatcher::new(pattern)
    }
}
