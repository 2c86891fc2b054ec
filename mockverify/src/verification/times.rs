use std::fmt;

/// How many matching requests a cardinality verification expects.
///
/// # Example
///
/// ```rust
/// use mockverify::VerificationTimes;
///
/// assert!(VerificationTimes::at_least(2).matches(3));
/// assert!(!VerificationTimes::exactly(2).matches(3));
/// assert_eq!(VerificationTimes::between(1, 3).to_string(), "between 1 and 3 times");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VerificationTimes {
    at_least: u32,
    at_most: Option<u32>,
}

impl VerificationTimes {
    pub fn once() -> Self {
        Self::exactly(1)
    }

    pub fn exactly(count: u32) -> Self {
        Self {
            at_least: count,
            at_most: Some(count),
        }
    }

    pub fn at_least(count: u32) -> Self {
        Self {
            at_least: count,
            at_most: None,
        }
    }

    pub fn at_most(count: u32) -> Self {
        Self {
            at_least: 0,
            at_most: Some(count),
        }
    }

    /// Between `at_least` and `at_most` inclusive. The bounds are swapped if
    /// given in the wrong order.
    pub fn between(at_least: u32, at_most: u32) -> Self {
        Self {
            at_least: at_least.min(at_most),
            at_most: Some(at_least.max(at_most)),
        }
    }

    pub fn never() -> Self {
        Self::exactly(0)
    }

    pub fn lower_bound(&self) -> u32 {
        self.at_least
    }

    pub fn upper_bound(&self) -> Option<u32> {
        self.at_most
    }

    /// Returns true if `count` satisfies both bounds.
    pub fn matches(&self, count: usize) -> bool {
        count >= self.at_least as usize && self.at_most.is_none_or(|m| count <= m as usize)
    }

    /// Returns true if no larger count could ever satisfy these times.
    ///
    /// The request log only grows, so once this holds a retry is pointless.
    pub(crate) fn exceeded_by(&self, count: usize) -> bool {
        self.at_most.is_some_and(|m| count > m as usize)
    }
}

impl Default for VerificationTimes {
    fn default() -> Self {
        Self::at_least(1)
    }
}

fn times(count: u32) -> String {
    match count {
        1 => "once".to_string(),
        2 => "twice".to_string(),
        n => format!("{n} times"),
    }
}

impl fmt::Display for VerificationTimes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.at_least, self.at_most) {
            (0, Some(0)) => f.write_str("never"),
            (least, Some(most)) if least == most => write!(f, "exactly {}", times(least)),
            (least, None) => write!(f, "at least {}", times(least)),
            (0, Some(most)) => write!(f, "at most {}", times(most)),
            (least, Some(most)) => write!(f, "between {least} and {most} times"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_least_accepts_counts_from_the_bound() {
        let t = VerificationTimes::at_least(2);
        assert!(!t.matches(1));
        assert!(t.matches(2));
        assert!(t.matches(100));
    }

    #[test]
    fn exactly_accepts_only_the_bound() {
        let t = VerificationTimes::exactly(2);
        assert!(!t.matches(1));
        assert!(t.matches(2));
        assert!(!t.matches(3));
        assert!(t.exceeded_by(3));
        assert!(!t.exceeded_by(2));
    }

    #[test]
    fn never_accepts_only_zero() {
        assert!(VerificationTimes::never().matches(0));
        assert!(!VerificationTimes::never().matches(1));
    }

    #[test]
    fn between_normalizes_bounds() {
        let t = VerificationTimes::between(3, 1);
        assert_eq!(t, VerificationTimes::between(1, 3));
        assert!(t.matches(1) && t.matches(3));
        assert!(!t.matches(0) && !t.matches(4));
    }

    #[test]
    fn at_least_is_never_exceeded() {
        assert!(!VerificationTimes::at_least(1).exceeded_by(usize::MAX));
    }

    #[test]
    fn display() {
        assert_eq!(VerificationTimes::once().to_string(), "exactly once");
        assert_eq!(VerificationTimes::exactly(2).to_string(), "exactly twice");
        assert_eq!(VerificationTimes::exactly(3).to_string(), "exactly 3 times");
        assert_eq!(VerificationTimes::at_least(1).to_string(), "at least once");
        assert_eq!(VerificationTimes::at_least(4).to_string(), "at least 4 times");
        assert_eq!(VerificationTimes::at_most(2).to_string(), "at most twice");
        assert_eq!(VerificationTimes::never().to_string(), "never");
        assert_eq!(
            VerificationTimes::between(1, 3).to_string(),
            "between 1 and 3 times"
        );
    }
}
