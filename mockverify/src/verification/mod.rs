//! Cardinality and ordering assertions over the event log.

pub(crate) mod cardinality;
mod engine;
mod handle;
pub(crate) mod sequence;
mod times;

pub use cardinality::Verification;
pub use engine::VerificationEngine;
pub use handle::VerificationHandle;
pub use sequence::VerificationSequence;
pub use times::VerificationTimes;
