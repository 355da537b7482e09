//! Decision aggregator: computes the next legal status from slot state
//!
//! The aggregator examines the current status and the full set of
//! decision slots to determine whether the request stays put, advances,
//! or terminates. It does NOT produce side effects; it's a pure
//! evaluation function, exhaustively testable independent of storage.

use deposit_types::{Decision, RequestKind, RequestStatus, Slots, StageName};

/// Evaluates the aggregation rule for a request kind
#[derive(Clone, Copy, Debug, Default)]
pub struct DecisionAggregator;

impl DecisionAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Compute the next status given the current status and slots.
    ///
    /// Legal deposit applies the unanimity rule: any rejection is
    /// fail-fast terminal, all approvals advance, otherwise the
    /// request keeps collecting. Reproduction evaluates only the
    /// currently-active stage. Terminal statuses are fixed points.
    pub fn aggregate(
        &self,
        kind: RequestKind,
        current: RequestStatus,
        slots: &Slots,
    ) -> RequestStatus {
        if current.is_terminal() {
            return current;
        }
        match kind {
            RequestKind::LegalDeposit => self.aggregate_unanimity(current, slots),
            RequestKind::Reproduction => self.aggregate_stages(current, slots),
        }
    }

    /// Unanimity rule: Rejected if any party rejected, Approved if all
    /// approved, otherwise still collecting.
    fn aggregate_unanimity(&self, current: RequestStatus, slots: &Slots) -> RequestStatus {
        let Some(parties) = slots.parties() else {
            return current;
        };
        if parties.iter().any(|p| p.decision == Decision::Rejected) {
            return RequestStatus::Rejected;
        }
        if !parties.is_empty() && parties.iter().all(|p| p.decision == Decision::Approved) {
            return RequestStatus::Approved;
        }
        RequestStatus::PendingApprovals
    }

    /// Sequential-stage rule: only the live stage's decision is
    /// consulted.
    fn aggregate_stages(&self, current: RequestStatus, slots: &Slots) -> RequestStatus {
        let Some(stages) = slots.stages() else {
            return current;
        };
        let decision_of = |name: StageName| {
            stages
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.decision)
                .unwrap_or(Decision::Pending)
        };

        match current {
            RequestStatus::Submitted | RequestStatus::ServiceReview => {
                match decision_of(StageName::Service) {
                    Decision::Rejected => RequestStatus::Rejected,
                    Decision::Approved => RequestStatus::ManagerReview,
                    Decision::Pending => RequestStatus::ServiceReview,
                }
            }
            RequestStatus::ManagerReview => match decision_of(StageName::Manager) {
                Decision::Rejected => RequestStatus::Rejected,
                Decision::Approved => RequestStatus::AwaitingPayment,
                Decision::Pending => RequestStatus::ManagerReview,
            },
            // AwaitingPayment advances only via payment confirmation,
            // which is not a slot decision.
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deposit_types::{ActorId, ActorRole, PartyApprovers, PartyRole, RequestId};

    fn make_deposit_slots() -> Slots {
        Slots::legal_deposit(
            &RequestId::new("req-1"),
            &PartyApprovers::new(
                ActorId::new("editor-1"),
                ActorId::new("printer-1"),
                ActorId::new("producer-1"),
            ),
        )
    }

    fn decide(slots: &mut Slots, role: ActorRole, decision: Decision) {
        slots.record_decision(&role, decision, None).unwrap();
    }

    #[test]
    fn test_all_pending_stays_collecting() {
        let agg = DecisionAggregator::new();
        let slots = make_deposit_slots();
        assert_eq!(
            agg.aggregate(
                RequestKind::LegalDeposit,
                RequestStatus::PendingApprovals,
                &slots
            ),
            RequestStatus::PendingApprovals
        );
    }

    #[test]
    fn test_partial_approval_stays_collecting() {
        let agg = DecisionAggregator::new();
        let mut slots = make_deposit_slots();
        decide(&mut slots, ActorRole::Party(PartyRole::Editor), Decision::Approved);
        decide(&mut slots, ActorRole::Party(PartyRole::Printer), Decision::Approved);

        assert_eq!(
            agg.aggregate(
                RequestKind::LegalDeposit,
                RequestStatus::PendingApprovals,
                &slots
            ),
            RequestStatus::PendingApprovals
        );
    }

    #[test]
    fn test_unanimity_approves() {
        let agg = DecisionAggregator::new();
        let mut slots = make_deposit_slots();
        for role in PartyRole::all() {
            decide(&mut slots, ActorRole::Party(role), Decision::Approved);
        }
        assert_eq!(
            agg.aggregate(
                RequestKind::LegalDeposit,
                RequestStatus::PendingApprovals,
                &slots
            ),
            RequestStatus::Approved
        );
    }

    #[test]
    fn test_single_rejection_is_fail_fast() {
        let agg = DecisionAggregator::new();
        let mut slots = make_deposit_slots();
        decide(&mut slots, ActorRole::Party(PartyRole::Editor), Decision::Approved);
        decide(&mut slots, ActorRole::Party(PartyRole::Printer), Decision::Rejected);

        // Producer still pending; rejection wins regardless
        assert_eq!(
            agg.aggregate(
                RequestKind::LegalDeposit,
                RequestStatus::PendingApprovals,
                &slots
            ),
            RequestStatus::Rejected
        );
    }

    #[test]
    fn test_service_approval_advances_to_manager() {
        let agg = DecisionAggregator::new();
        let mut slots = Slots::reproduction();
        decide(&mut slots, ActorRole::Stage(StageName::Service), Decision::Approved);

        assert_eq!(
            agg.aggregate(
                RequestKind::Reproduction,
                RequestStatus::ServiceReview,
                &slots
            ),
            RequestStatus::ManagerReview
        );
    }

    #[test]
    fn test_service_rejection_terminates() {
        let agg = DecisionAggregator::new();
        let mut slots = Slots::reproduction();
        decide(&mut slots, ActorRole::Stage(StageName::Service), Decision::Rejected);

        assert_eq!(
            agg.aggregate(
                RequestKind::Reproduction,
                RequestStatus::ServiceReview,
                &slots
            ),
            RequestStatus::Rejected
        );
    }

    #[test]
    fn test_manager_approval_awaits_payment() {
        let agg = DecisionAggregator::new();
        let mut slots = Slots::reproduction();
        decide(&mut slots, ActorRole::Stage(StageName::Service), Decision::Approved);
        decide(&mut slots, ActorRole::Stage(StageName::Manager), Decision::Approved);

        assert_eq!(
            agg.aggregate(
                RequestKind::Reproduction,
                RequestStatus::ManagerReview,
                &slots
            ),
            RequestStatus::AwaitingPayment
        );
    }

    #[test]
    fn test_manager_rejection_terminates() {
        let agg = DecisionAggregator::new();
        let mut slots = Slots::reproduction();
        decide(&mut slots, ActorRole::Stage(StageName::Service), Decision::Approved);
        decide(&mut slots, ActorRole::Stage(StageName::Manager), Decision::Rejected);

        assert_eq!(
            agg.aggregate(
                RequestKind::Reproduction,
                RequestStatus::ManagerReview,
                &slots
            ),
            RequestStatus::Rejected
        );
    }

    #[test]
    fn test_terminal_status_is_fixed_point() {
        let agg = DecisionAggregator::new();
        let slots = make_deposit_slots();
        for status in [
            RequestStatus::Approved,
            RequestStatus::Rejected,
            RequestStatus::Fulfilled,
        ] {
            assert_eq!(
                agg.aggregate(RequestKind::LegalDeposit, status, &slots),
                status
            );
        }
    }

    #[test]
    fn test_awaiting_payment_ignores_slots() {
        let agg = DecisionAggregator::new();
        let mut slots = Slots::reproduction();
        decide(&mut slots, ActorRole::Stage(StageName::Service), Decision::Approved);
        decide(&mut slots, ActorRole::Stage(StageName::Manager), Decision::Approved);

        assert_eq!(
            agg.aggregate(
                RequestKind::Reproduction,
                RequestStatus::AwaitingPayment,
                &slots
            ),
            RequestStatus::AwaitingPayment
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn arb_decision() -> impl Strategy<Value = Decision> {
            prop_oneof![
                Just(Decision::Pending),
                Just(Decision::Approved),
                Just(Decision::Rejected),
            ]
        }

        fn deposit_slots_with(decisions: [Decision; 3]) -> Slots {
            let mut slots = make_deposit_slots();
            for (role, decision) in PartyRole::all().into_iter().zip(decisions) {
                if !decision.is_pending() {
                    decide(&mut slots, ActorRole::Party(role), decision);
                }
            }
            slots
        }

        proptest! {
            /// Approved if and only if every party approved
            #[test]
            fn unanimity_invariant(decisions in [arb_decision(), arb_decision(), arb_decision()]) {
                let agg = DecisionAggregator::new();
                let slots = deposit_slots_with(decisions);
                let next = agg.aggregate(
                    RequestKind::LegalDeposit,
                    RequestStatus::PendingApprovals,
                    &slots,
                );
                let all_approved = decisions.iter().all(|d| *d == Decision::Approved);
                prop_assert_eq!(next == RequestStatus::Approved, all_approved);
            }

            /// Any rejection terminates, in whatever order it arrived
            #[test]
            fn fail_fast_invariant(decisions in [arb_decision(), arb_decision(), arb_decision()]) {
                let agg = DecisionAggregator::new();
                let slots = deposit_slots_with(decisions);
                let next = agg.aggregate(
                    RequestKind::LegalDeposit,
                    RequestStatus::PendingApprovals,
                    &slots,
                );
                if decisions.iter().any(|d| *d == Decision::Rejected) {
                    prop_assert_eq!(next, RequestStatus::Rejected);
                }
            }

            /// Aggregation is deterministic: same input, same output
            #[test]
            fn deterministic(decisions in [arb_decision(), arb_decision(), arb_decision()]) {
                let agg = DecisionAggregator::new();
                let slots = deposit_slots_with(decisions);
                let a = agg.aggregate(RequestKind::LegalDeposit, RequestStatus::PendingApprovals, &slots);
                let b = agg.aggregate(RequestKind::LegalDeposit, RequestStatus::PendingApprovals, &slots);
                prop_assert_eq!(a, b);
            }
        }
    }
}
