use std::borrow::Borrow;

use crate::{HttpRequest, RequestMatcher, Result, VerificationTimes};

/// A cardinality assertion: requests matching a pattern were received a
/// given number of times.
///
/// # Example
///
/// ```rust
/// use mockverify::{Verification, VerificationTimes, request};
///
/// let verification = Verification::new(request("/health"))
///     .with_times(VerificationTimes::at_least(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    request: HttpRequest,
    times: VerificationTimes,
}

impl Verification {
    /// Expect `request` at least once.
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            times: VerificationTimes::default(),
        }
    }

    pub fn with_times(mut self, times: VerificationTimes) -> Self {
        self.times = times;
        self
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn times(&self) -> VerificationTimes {
        self.times
    }

    pub(crate) fn compile(&self) -> Result<RequestMatcher> {
        RequestMatcher::new(&self.request)
    }
}

/// Number of requests in `actual` matching `matcher`.
pub(crate) fn count_matches<R: Borrow<HttpRequest>>(matcher: &RequestMatcher, actual: &[R]) -> usize {
    actual.iter().filter(|r| matcher.matches((*r).borrow())).count()
}
