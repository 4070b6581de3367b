//! Selection strategy for choosing among payment candidates.

use crate::scheme::PaymentCandidate;

/// Picks the payment candidate to execute when a challenge offers several.
pub trait PaymentSelector: Send + Sync {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate>;
}

/// Default selector: the first candidate.
///
/// Candidate order follows scheme-client registration order, then the
/// seller's preference order within each client, so "first" is already a
/// meaningful ranking.
pub struct FirstMatch;

impl PaymentSelector for FirstMatch {
    fn select<'a>(&self, candidates: &'a [PaymentCandidate]) -> Option<&'a PaymentCandidate> {
        candidates.first()
    }
}
