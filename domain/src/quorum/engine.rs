//! Quorum engine
//!
//! # Example
//!
//! ```
//! use gavel_domain::meeting::Convocation;
//! use gavel_domain::quorum::QuorumEngine;
//! use gavel_domain::roster::Roster;
//!
//! // Without a policy, quorum is simply not checked
//! let evaluation = QuorumEngine::evaluate(&Roster::default(), Convocation::First, None);
//! assert!(!evaluation.applied);
//! assert_eq!(evaluation.met, None);
//! ```

use crate::meeting::Convocation;
use crate::policy::{DenominatorKind, QuorumPolicy, ThresholdKind};
use crate::roster::Roster;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Outcome of a quorum check, with the numbers that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuorumEvaluation {
    /// False when no policy was associated; `met` is then `None`
    pub applied: bool,
    pub met: Option<bool>,
    pub numerator: Decimal,
    pub denominator: Decimal,
    pub ratio: Decimal,
    pub threshold: Option<Decimal>,
    pub threshold_kind: Option<ThresholdKind>,
    pub denominator_kind: Option<DenominatorKind>,
    pub convocation: Convocation,
    /// Attendance was presumed from the member roll
    pub used_fallback: bool,
    pub justification: String,
}

impl QuorumEvaluation {
    fn not_applied(convocation: Convocation, used_fallback: bool) -> Self {
        Self {
            applied: false,
            met: None,
            numerator: Decimal::ZERO,
            denominator: Decimal::ZERO,
            ratio: Decimal::ZERO,
            threshold: None,
            threshold_kind: None,
            denominator_kind: None,
            convocation,
            used_fallback,
            justification: "no quorum policy applies; quorum not checked".to_string(),
        }
    }

    /// Quorum does not block unless it was checked and failed
    pub fn is_blocking(&self) -> bool {
        self.met == Some(false)
    }
}

/// Stateless quorum evaluator
pub struct QuorumEngine;

impl QuorumEngine {
    /// Evaluate `policy` against a resolved roster
    pub fn evaluate(
        roster: &Roster,
        convocation: Convocation,
        policy: Option<&QuorumPolicy>,
    ) -> QuorumEvaluation {
        let Some(policy) = policy else {
            return QuorumEvaluation::not_applied(convocation, roster.used_fallback());
        };

        let numerator = roster.quorum_weight(policy.include_proxies, policy.count_remote);
        let denominator = match policy.denominator {
            DenominatorKind::EligibleMembers => roster.roll_weight(),
            DenominatorKind::PresentMembers => roster.recorded_presence_weight(),
            DenominatorKind::Custom => policy.custom_denominator.unwrap_or(Decimal::ZERO),
        };
        let threshold = policy.threshold_for(convocation);

        let (ratio, met) = if denominator <= Decimal::ZERO {
            (Decimal::ZERO, false)
        } else {
            // Overflow means the ratio is beyond any threshold
            let ratio = numerator
                .checked_div(denominator)
                .unwrap_or(Decimal::MAX);
            let met = match policy.threshold_kind {
                ThresholdKind::Ratio => ratio >= threshold,
                ThresholdKind::Absolute => numerator >= threshold,
            };
            (ratio, met)
        };

        let mut justification = format!(
            "{} quorum on {}: numerator {} / denominator {} = ratio {}, {} threshold {} -> {}",
            policy.denominator,
            convocation,
            numerator.normalize(),
            denominator.normalize(),
            ratio.round_dp(4).normalize(),
            match policy.threshold_kind {
                ThresholdKind::Ratio => "ratio",
                ThresholdKind::Absolute => "absolute",
            },
            threshold.normalize(),
            if met { "met" } else { "not met" }
        );
        if !policy.include_proxies {
            justification.push_str("; proxies excluded");
        }
        if !policy.count_remote {
            justification.push_str("; remote attendance excluded");
        }
        if roster.used_fallback() {
            justification.push_str("; attendance presumed from member roll (fallback)");
        }

        QuorumEvaluation {
            applied: true,
            met: Some(met),
            numerator,
            denominator,
            ratio,
            threshold: Some(threshold),
            threshold_kind: Some(policy.threshold_kind),
            denominator_kind: Some(policy.denominator),
            convocation,
            used_fallback: roster.used_fallback(),
            justification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{MeetingId, MemberId, PolicyId, TenantId};
    use crate::roster::{
        Attendance, AttendanceMode, Member, Proxy, ProxyResolver, RosterInput, RosterOptions,
    };

    const MEETING: MeetingId = MeetingId::new(1);

    fn members(count: u64) -> Vec<Member> {
        (1..=count)
            .map(|id| {
                Member::new(
                    MemberId::new(id),
                    TenantId::new(1),
                    format!("m{}", id),
                    Decimal::ONE,
                )
            })
            .collect()
    }

    fn attend(id: u64, mode: AttendanceMode) -> Attendance {
        Attendance::new(MEETING, MemberId::new(id), mode)
    }

    fn roster(members: &[Member], attendance: &[Attendance], proxies: &[Proxy]) -> Roster {
        ProxyResolver::new(RosterOptions::default())
            .resolve(RosterInput {
                members,
                attendance,
                proxies,
            })
            .unwrap()
    }

    fn policy(denominator: DenominatorKind, threshold: Decimal) -> QuorumPolicy {
        QuorumPolicy::new(PolicyId::new(1), TenantId::new(1), denominator, threshold)
    }

    #[test]
    fn test_six_of_ten_present_meets_half() {
        let roll = members(10);
        let attendance: Vec<_> = (1..=6).map(|id| attend(id, AttendanceMode::Present)).collect();
        let roster = roster(&roll, &attendance, &[]);

        let eval = QuorumEngine::evaluate(
            &roster,
            Convocation::First,
            Some(&policy(DenominatorKind::EligibleMembers, Decimal::new(5, 1))),
        );

        assert!(eval.applied);
        assert_eq!(eval.numerator, Decimal::from(6));
        assert_eq!(eval.denominator, Decimal::from(10));
        assert_eq!(eval.ratio, Decimal::new(6, 1));
        assert_eq!(eval.met, Some(true));
        assert!(eval.justification.contains("eligible_members"));
        assert!(eval.justification.contains("-> met"));
    }

    #[test]
    fn test_no_policy_is_not_applied() {
        let roll = members(3);
        let eval = QuorumEngine::evaluate(&roster(&roll, &[], &[]), Convocation::First, None);
        assert!(!eval.applied);
        assert_eq!(eval.met, None);
        assert!(!eval.is_blocking());
    }

    #[test]
    fn test_met_matches_ratio_against_threshold() {
        let roll = members(8);
        let threshold = Decimal::new(5, 1);
        for present in 0..=8u64 {
            let attendance: Vec<_> = (1..=present)
                .map(|id| attend(id, AttendanceMode::Present))
                .collect();
            let eval = QuorumEngine::evaluate(
                &roster(&roll, &attendance, &[]),
                Convocation::First,
                Some(&policy(DenominatorKind::EligibleMembers, threshold)),
            );
            let expected = Decimal::from(present) / Decimal::from(8) >= threshold;
            assert_eq!(eval.met, Some(expected), "present = {}", present);
        }
    }

    #[test]
    fn test_zero_denominator_is_not_met() {
        let roll = members(4);
        // Nobody recorded: present_members denominator is zero
        let eval = QuorumEngine::evaluate(
            &roster(&roll, &[], &[]),
            Convocation::First,
            Some(&policy(DenominatorKind::PresentMembers, Decimal::ZERO)),
        );
        assert_eq!(eval.denominator, Decimal::ZERO);
        assert_eq!(eval.ratio, Decimal::ZERO);
        assert_eq!(eval.met, Some(false));

        let custom = policy(DenominatorKind::Custom, Decimal::new(1, 1));
        let eval = QuorumEngine::evaluate(&roster(&roll, &[], &[]), Convocation::First, Some(&custom));
        assert_eq!(eval.met, Some(false));
    }

    #[test]
    fn test_tiny_custom_denominator_saturates() {
        let roll = vec![Member::new(
            MemberId::new(1),
            TenantId::new(1),
            "whale",
            Decimal::MAX,
        )];
        let attendance = vec![attend(1, AttendanceMode::Present)];
        let policy = policy(DenominatorKind::Custom, Decimal::new(5, 1))
            .with_custom_denominator(Decimal::new(1, 28));

        let eval = QuorumEngine::evaluate(
            &roster(&roll, &attendance, &[]),
            Convocation::First,
            Some(&policy),
        );
        assert_eq!(eval.ratio, Decimal::MAX);
        assert_eq!(eval.met, Some(true));
    }

    #[test]
    fn test_second_call_uses_lower_threshold() {
        let roll = members(10);
        let attendance: Vec<_> = (1..=3).map(|id| attend(id, AttendanceMode::Present)).collect();
        let roster = roster(&roll, &attendance, &[]);
        let policy = policy(DenominatorKind::EligibleMembers, Decimal::new(5, 1))
            .with_second_call(Decimal::new(25, 2));

        let first = QuorumEngine::evaluate(&roster, Convocation::First, Some(&policy));
        let second = QuorumEngine::evaluate(&roster, Convocation::Second, Some(&policy));
        assert_eq!(first.met, Some(false));
        assert_eq!(second.met, Some(true));
        assert_eq!(second.threshold, Some(Decimal::new(25, 2)));
    }

    #[test]
    fn test_proxy_and_remote_flags() {
        let roll = members(4);
        let attendance = vec![
            attend(1, AttendanceMode::Present),
            attend(2, AttendanceMode::Remote),
        ];
        let proxies = vec![Proxy::new(MEETING, MemberId::new(3), MemberId::new(1))];
        let roster = roster(&roll, &attendance, &proxies);
        let base = policy(DenominatorKind::EligibleMembers, Decimal::new(5, 1));

        let all = QuorumEngine::evaluate(&roster, Convocation::First, Some(&base));
        assert_eq!(all.numerator, Decimal::from(3));

        let no_proxies = base.clone().including_proxies(false);
        let eval = QuorumEngine::evaluate(&roster, Convocation::First, Some(&no_proxies));
        assert_eq!(eval.numerator, Decimal::from(2));
        assert!(eval.justification.contains("proxies excluded"));

        let no_remote = base.counting_remote(false);
        let eval = QuorumEngine::evaluate(&roster, Convocation::First, Some(&no_remote));
        assert_eq!(eval.numerator, Decimal::from(2));
    }

    #[test]
    fn test_absolute_threshold_compares_numerator() {
        let roll = members(10);
        let attendance: Vec<_> = (1..=4).map(|id| attend(id, AttendanceMode::Present)).collect();
        let policy = policy(DenominatorKind::EligibleMembers, Decimal::from(4)).absolute();
        let eval = QuorumEngine::evaluate(
            &roster(&roll, &attendance, &[]),
            Convocation::First,
            Some(&policy),
        );
        assert_eq!(eval.met, Some(true));
        assert_eq!(eval.threshold_kind, Some(ThresholdKind::Absolute));
    }

    #[test]
    fn test_fallback_is_flagged() {
        let roll = members(2);
        let roster = ProxyResolver::new(RosterOptions {
            fallback_all_active_when_unrecorded: true,
            ..RosterOptions::default()
        })
        .resolve(RosterInput {
            members: &roll,
            attendance: &[],
            proxies: &[],
        })
        .unwrap();
        let eval = QuorumEngine::evaluate(
            &roster,
            Convocation::First,
            Some(&policy(DenominatorKind::EligibleMembers, Decimal::new(5, 1))),
        );
        assert!(eval.used_fallback);
        assert_eq!(eval.met, Some(true));
        assert!(eval.justification.contains("fallback"));
    }
}
