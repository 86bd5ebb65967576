//! Evaluate [`Policy`].
use crate::{record::Record, Policy};
use anyhow::Result;
mod default_evaluator;
pub use default_evaluator::DefaultEvaluator;

/// Evaluate [`Policy`].
pub trait Evaluator {
    /// Evaluate [`Policy`].
    ///
    /// The caller of this method needs to handle the internal state of `policy`,
    /// like training/evaluation mode of an [`Agent`](crate::Agent).
    fn evaluate<P: Policy + ?Sized>(&mut self, policy: &mut P) -> Result<Record>;
}
