use std::borrow::Borrow;

use crate::{HttpRequest, RequestMatcher, Result};

/// An ordered-subsequence assertion over recorded requests.
///
/// Succeeds when the expected requests appear in the log in the given
/// relative order, with any number of other requests in between. An empty
/// sequence always succeeds.
///
/// # Example
///
/// ```rust
/// use mockverify::{VerificationSequence, request};
///
/// let sequence = VerificationSequence::new()
///     .with_request(request("/login"))
///     .with_request(request("/checkout"));
/// assert_eq!(sequence.requests().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationSequence {
    requests: Vec<HttpRequest>,
}

impl VerificationSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the expected requests.
    pub fn with_requests(mut self, requests: impl IntoIterator<Item = HttpRequest>) -> Self {
        self.requests = requests.into_iter().collect();
        self
    }

    /// Append one expected request.
    pub fn with_request(mut self, request: HttpRequest) -> Self {
        self.requests.push(request);
        self
    }

    pub fn requests(&self) -> &[HttpRequest] {
        &self.requests
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub(crate) fn compile(&self) -> Result<Vec<RequestMatcher>> {
        self.requests.iter().map(RequestMatcher::new).collect()
    }
}

impl From<Vec<HttpRequest>> for VerificationSequence {
    fn from(requests: Vec<HttpRequest>) -> Self {
        VerificationSequence::new().with_requests(requests)
    }
}

/// Greedy left-to-right subsequence match.
///
/// Each expected matcher consumes the earliest unconsumed actual request it
/// matches; the scan for the next matcher resumes right after it. The first
/// matcher with no match ends the scan. Taking the earliest match never rules
/// out a solution a later choice could find, so no backtracking is needed.
///
/// Returns the indexes into `actual` used for each expected matcher, or
/// `None` if the sequence is not present.
pub(crate) fn find_subsequence<R: Borrow<HttpRequest>>(
    expected: &[RequestMatcher],
    actual: &[R],
) -> Option<Vec<usize>> {
    let mut cursor = 0;
    let mut positions = Vec::with_capacity(expected.len());
    for matcher in expected {
        let offset = actual[cursor..]
            .iter()
            .position(|r| matcher.matches(r.borrow()))?;
        positions.push(cursor + offset);
        cursor += offset + 1;
    }
    Some(positions)
}
