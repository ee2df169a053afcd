//! Round transition engine.
//!
//! Each domain moves independently through levels 0..=3. Promotion adds one level and
//! stops at 3; rejection resets to 0 and is a no-op at 0. The remote endpoint always
//! receives the full level triple, so untouched domains are echoed from the record.

mod client;
#[cfg(test)]
pub(crate) mod fake;

pub use client::{PortalApi, PortalClient};

use crate::error::ApiError;
use crate::model::{Candidate, Domain, RoundLevel, RoundLevels, StatusUpdate, Transition};
use tracing::{info, warn};

/// Why a transition was not submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionBlocked {
    #[error("{0} is already at the final round")]
    AtFinalRound(Domain),
    #[error("{0} is already at round 0")]
    AtRoundZero(Domain),
}

/// Compute the level triple after `transition`, or why it is not allowed.
pub fn plan_transition(
    levels: RoundLevels,
    domain: Domain,
    transition: Transition,
) -> Result<RoundLevels, TransitionBlocked> {
    let current = levels.get(domain);
    match transition {
        Transition::Promote => current
            .next()
            .map(|next| levels.with(domain, next))
            .ok_or(TransitionBlocked::AtFinalRound(domain)),
        Transition::Reject if current.is_zero() => Err(TransitionBlocked::AtRoundZero(domain)),
        Transition::Reject => Ok(levels.with(domain, RoundLevel::ZERO)),
    }
}

#[derive(Debug)]
pub enum TransitionOutcome {
    /// Not allowed from the current level; nothing was sent.
    Blocked(TransitionBlocked),
    Submitted { levels: RoundLevels },
    /// Sent, but the server or transport failed. Already logged.
    Failed {
        levels: RoundLevels,
        error: ApiError,
    },
}

impl TransitionOutcome {
    /// Whether a request reached the wire, which obliges the caller to re-fetch.
    pub fn was_sent(&self) -> bool {
        !matches!(self, TransitionOutcome::Blocked(_))
    }
}

/// Plan and, when allowed, submit one transition for `candidate`.
pub async fn submit_transition<A: PortalApi + ?Sized>(
    api: &A,
    token: &str,
    candidate: &Candidate,
    domain: Domain,
    transition: Transition,
) -> TransitionOutcome {
    let levels = match plan_transition(candidate.levels(), domain, transition) {
        Ok(levels) => levels,
        Err(blocked) => {
            info!(candidate = %candidate.id, %domain, ?transition, "transition not allowed: {blocked}");
            return TransitionOutcome::Blocked(blocked);
        }
    };

    let update = StatusUpdate::new(candidate.regno.clone(), levels);
    match api.update_status(token, &candidate.id, &update).await {
        Ok(()) => {
            info!(
                candidate = %candidate.id,
                %domain,
                ?transition,
                level = %levels.get(domain),
                "round status updated"
            );
            TransitionOutcome::Submitted { levels }
        }
        Err(error) => {
            warn!(
                candidate = %candidate.id,
                %domain,
                ?transition,
                transient = error.is_transient(),
                "round status update failed: {error}"
            );
            TransitionOutcome::Failed { levels, error }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::{candidate, FakePortal};
    use super::*;

    fn levels(t: u8, d: u8, m: u8) -> RoundLevels {
        RoundLevels {
            tech: RoundLevel::new(t).unwrap(),
            design: RoundLevel::new(d).unwrap(),
            management: RoundLevel::new(m).unwrap(),
        }
    }

    #[test]
    fn promote_increments_only_target_domain() {
        assert_eq!(
            plan_transition(levels(2, 1, 0), Domain::Tech, Transition::Promote),
            Ok(levels(3, 1, 0))
        );
        assert_eq!(
            plan_transition(levels(3, 1, 0), Domain::Tech, Transition::Promote),
            Err(TransitionBlocked::AtFinalRound(Domain::Tech))
        );
    }

    #[test]
    fn reject_is_a_hard_reset() {
        assert_eq!(
            plan_transition(levels(1, 2, 3), Domain::Design, Transition::Reject),
            Ok(levels(1, 0, 3))
        );
        assert_eq!(
            plan_transition(levels(1, 0, 3), Domain::Design, Transition::Reject),
            Err(TransitionBlocked::AtRoundZero(Domain::Design))
        );
        assert_eq!(
            plan_transition(levels(0, 0, 3), Domain::Management, Transition::Reject),
            Ok(levels(0, 0, 0))
        );
    }

    #[test]
    fn every_level_and_domain_respects_bounds() {
        for t in 0..=3 {
            for domain in Domain::ALL {
                let start = levels(0, 0, 0).with(domain, RoundLevel::new(t).unwrap());
                match plan_transition(start, domain, Transition::Promote) {
                    Ok(next) => assert_eq!(next.get(domain).get(), t + 1),
                    Err(_) => assert_eq!(t, 3),
                }
                match plan_transition(start, domain, Transition::Reject) {
                    Ok(next) => assert!(next.get(domain).is_zero() && t > 0),
                    Err(_) => assert_eq!(t, 0),
                }
            }
        }
    }

    #[tokio::test]
    async fn blocked_promotion_sends_nothing() {
        let api = FakePortal::default();
        let c = candidate("c1", "22BCE1234", levels(3, 0, 1));
        let out = submit_transition(&api, "tok", &c, Domain::Tech, Transition::Promote).await;
        assert!(matches!(out, TransitionOutcome::Blocked(_)));
        assert!(!out.was_sent());
        assert!(api.updates().is_empty());
    }

    #[tokio::test]
    async fn promotion_echoes_untouched_levels() {
        let api = FakePortal::default();
        let c = candidate("c1", "22BCE1234", levels(2, 1, 3));
        let out = submit_transition(&api, "tok", &c, Domain::Tech, Transition::Promote).await;
        assert!(matches!(out, TransitionOutcome::Submitted { .. }));

        let updates = api.updates();
        assert_eq!(updates.len(), 1);
        let (id, update) = &updates[0];
        assert_eq!(id, "c1");
        assert_eq!(update, &StatusUpdate::new(Some("22BCE1234".into()), levels(3, 1, 3)));
    }

    #[tokio::test]
    async fn rejection_from_round_two_submits_zero_for_that_domain() {
        let api = FakePortal::default();
        let c = candidate("c1", "22BCE1234", levels(1, 2, 0));
        submit_transition(&api, "tok", &c, Domain::Design, Transition::Reject).await;
        let updates = api.updates();
        let (_, update) = &updates[0];
        assert_eq!((update.tech, update.design, update.management), (1, 0, 0));
    }

    #[tokio::test]
    async fn server_failure_is_reported_not_raised() {
        let api = FakePortal::default();
        api.fail_updates(true);
        let c = candidate("c1", "22BCE1234", levels(0, 0, 0));
        let out = submit_transition(&api, "tok", &c, Domain::Management, Transition::Promote).await;
        assert!(out.was_sent());
        assert!(matches!(
            out,
            TransitionOutcome::Failed {
                error: ApiError::Status { status: 500, .. },
                ..
            }
        ));
    }
}
