//! Official results consolidation
//!
//! Source priority:
//!
//! 1. `manual` when the motion carries a consistent manual tally
//! 2. `evote` when at least one ballot was cast on the motion
//! 3. `none`, with an undetermined decision
//!
//! A recorded manual tally that is inconsistent is an error rather than a
//! silent fall-through to ballots. An all-zero tally counts as not recorded.
//!
//! Consolidation is idempotent: once a result is stored it is returned as-is.
//! Only [`OfficialResultsConsolidator::regenerate`] rewrites it.

use crate::core::error::GovernanceError;
use crate::majority::{BaseWeights, MajorityEngine, Tallies};
use crate::meeting::Meeting;
use crate::motion::{Ballot, Decision, DecisionReason, Motion, OfficialResult, ResultSource};
use crate::policy::{QuorumPolicy, VotePolicy};
use crate::quorum::QuorumEngine;
use crate::roster::Roster;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Everything a consolidation reads besides the motion itself
#[derive(Debug, Clone, Copy)]
pub struct ConsolidationContext<'a> {
    pub meeting: &'a Meeting,
    pub ballots: &'a [Ballot],
    pub roster: &'a Roster,
    pub quorum_policy: Option<&'a QuorumPolicy>,
    pub vote_policy: Option<&'a VotePolicy>,
}

/// Result of a consolidation attempt
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidation {
    pub result: OfficialResult,
    /// False when an already-stored result was returned untouched
    pub written: bool,
}

/// Selects the authoritative source and freezes the official result
pub struct OfficialResultsConsolidator;

impl OfficialResultsConsolidator {
    /// Compute the official result of `motion` without storing it
    pub fn compute(
        motion: &Motion,
        ctx: ConsolidationContext<'_>,
        at: DateTime<Utc>,
    ) -> Result<OfficialResult, GovernanceError> {
        let quorum = QuorumEngine::evaluate(ctx.roster, ctx.meeting.convocation, ctx.quorum_policy);

        let source = select_source(motion, ctx.ballots)?;
        let tallies = match source {
            ResultSource::Manual => motion
                .manual_tally
                .as_ref()
                .map(Tallies::from_manual)
                .unwrap_or_default(),
            ResultSource::Evote => Tallies::from_ballots(motion.id, ctx.ballots),
            ResultSource::None => Tallies::default(),
        };

        if source == ResultSource::None {
            return Ok(OfficialResult {
                source,
                for_weight: Decimal::ZERO,
                against: Decimal::ZERO,
                abstain: Decimal::ZERO,
                total: Decimal::ZERO,
                decision: Decision::Undetermined,
                reason: DecisionReason::NoData,
                base: None,
                base_weight: Decimal::ZERO,
                ratio: Decimal::ZERO,
                threshold: None,
                quorum_met: quorum.met,
                quorum_justification: Some(quorum.justification.clone()),
                justification: format!(
                    "source none: no manual tally and no ballot; undetermined; quorum: {}",
                    quorum.justification
                ),
                used_fallback: ctx.roster.used_fallback(),
                consolidated_at: at,
                regenerations: 0,
            });
        }

        let policy = ctx.vote_policy.ok_or(GovernanceError::MissingPolicy {
            motion: motion.id,
            missing: "vote",
        })?;
        let majority =
            MajorityEngine::evaluate(&tallies, BaseWeights::from_roster(ctx.roster), policy)?;

        Ok(OfficialResult {
            source,
            for_weight: tallies.for_weight,
            against: tallies.against,
            abstain: tallies.abstain,
            total: tallies.total,
            decision: majority.decision,
            reason: majority.reason,
            base: Some(majority.base),
            base_weight: majority.base_weight,
            ratio: majority.ratio,
            threshold: Some(majority.threshold),
            quorum_met: quorum.met,
            quorum_justification: Some(quorum.justification.clone()),
            justification: format!(
                "source {}: {}; quorum: {}",
                source, majority.justification, quorum.justification
            ),
            used_fallback: ctx.roster.used_fallback(),
            consolidated_at: at,
            regenerations: 0,
        })
    }

    /// Freeze the official result of a closed motion
    ///
    /// Returns the stored value unchanged when one already exists.
    pub fn consolidate(
        motion: &mut Motion,
        ctx: ConsolidationContext<'_>,
        at: DateTime<Utc>,
    ) -> Result<Consolidation, GovernanceError> {
        if !motion.is_closed() {
            return Err(GovernanceError::MotionNotClosed(motion.id));
        }
        if let Some(existing) = &motion.official {
            return Ok(Consolidation {
                result: existing.clone(),
                written: false,
            });
        }
        ctx.meeting.ensure_mutable()?;

        let result = Self::compute(motion, ctx, at)?;
        Ok(Consolidation {
            result: motion.record_official(result).clone(),
            written: true,
        })
    }

    /// Explicitly recompute and overwrite the official result
    pub fn regenerate(
        motion: &mut Motion,
        ctx: ConsolidationContext<'_>,
        at: DateTime<Utc>,
    ) -> Result<Consolidation, GovernanceError> {
        ctx.meeting.ensure_mutable()?;
        if !motion.is_closed() {
            return Err(GovernanceError::MotionNotClosed(motion.id));
        }
        let result = Self::compute(motion, ctx, at)?;
        Ok(Consolidation {
            result: motion.regenerate_official(result).clone(),
            written: true,
        })
    }

    /// Stored result if any, otherwise a provisional computation
    ///
    /// Never writes. The boolean is true when the value is provisional.
    pub fn current(
        motion: &Motion,
        ctx: ConsolidationContext<'_>,
        at: DateTime<Utc>,
    ) -> Result<(OfficialResult, bool), GovernanceError> {
        match &motion.official {
            Some(stored) => Ok((stored.clone(), false)),
            None => Ok((Self::compute(motion, ctx, at)?, true)),
        }
    }
}

fn select_source(motion: &Motion, ballots: &[Ballot]) -> Result<ResultSource, GovernanceError> {
    if let Some(tally) = motion.manual_tally.as_ref().filter(|t| !t.is_blank()) {
        tally.check(motion.id)?;
        return Ok(ResultSource::Manual);
    }
    if ballots.iter().any(|b| b.motion_id == motion.id) {
        return Ok(ResultSource::Evote);
    }
    Ok(ResultSource::None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::{MeetingId, MemberId, MotionId, PolicyId, TenantId, UserId};
    use crate::motion::{BallotChoice, ManualTally};
    use crate::policy::{DenominatorKind, MajorityBase};
    use crate::roster::{
        Attendance, AttendanceMode, Member, ProxyResolver, RosterInput, RosterOptions,
    };

    const MEETING: MeetingId = MeetingId::new(1);
    const MOTION: MotionId = MotionId::new(1);

    struct Fixture {
        meeting: Meeting,
        roster: Roster,
        quorum: QuorumPolicy,
        vote: VotePolicy,
        ballots: Vec<Ballot>,
    }

    impl Fixture {
        fn new() -> Self {
            let members: Vec<Member> = (1..=10)
                .map(|id| {
                    Member::new(
                        MemberId::new(id),
                        TenantId::new(1),
                        format!("m{}", id),
                        Decimal::ONE,
                    )
                })
                .collect();
            let attendance: Vec<Attendance> = (1..=6)
                .map(|id| Attendance::new(MEETING, MemberId::new(id), AttendanceMode::Present))
                .collect();
            let roster = ProxyResolver::new(RosterOptions::default())
                .resolve(RosterInput {
                    members: &members,
                    attendance: &attendance,
                    proxies: &[],
                })
                .unwrap();
            Self {
                meeting: Meeting::new(MEETING, TenantId::new(1), "AGM"),
                roster,
                quorum: QuorumPolicy::new(
                    PolicyId::new(1),
                    TenantId::new(1),
                    DenominatorKind::EligibleMembers,
                    Decimal::new(5, 1),
                ),
                vote: VotePolicy::new(
                    PolicyId::new(2),
                    TenantId::new(1),
                    MajorityBase::Expressed,
                    Decimal::new(5, 1),
                ),
                ballots: Vec::new(),
            }
        }

        fn ctx(&self) -> ConsolidationContext<'_> {
            ConsolidationContext {
                meeting: &self.meeting,
                ballots: &self.ballots,
                roster: &self.roster,
                quorum_policy: Some(&self.quorum),
                vote_policy: Some(&self.vote),
            }
        }

        fn cast(&mut self, member: u64, choice: BallotChoice) {
            self.ballots
                .push(Ballot::new(MOTION, MemberId::new(member), choice, Decimal::ONE));
        }
    }

    fn closed_motion() -> Motion {
        let mut motion = Motion::new(MOTION, MEETING, "Approve accounts");
        motion.mark_opened(UserId::new(1), Utc::now()).unwrap();
        motion.mark_closed(UserId::new(1), Utc::now()).unwrap();
        motion
    }

    #[test]
    fn test_evote_source() {
        let mut fx = Fixture::new();
        fx.cast(1, BallotChoice::For);
        fx.cast(2, BallotChoice::For);
        fx.cast(3, BallotChoice::Against);
        fx.cast(4, BallotChoice::Blank);

        let mut motion = closed_motion();
        let out = OfficialResultsConsolidator::consolidate(&mut motion, fx.ctx(), Utc::now())
            .unwrap();
        assert!(out.written);
        assert_eq!(out.result.source, ResultSource::Evote);
        assert_eq!(out.result.for_weight, Decimal::from(2));
        assert_eq!(out.result.total, Decimal::from(4));
        assert_eq!(out.result.base_weight, Decimal::from(3));
        assert_eq!(out.result.decision, Decision::Adopted);
        assert_eq!(out.result.quorum_met, Some(true));
        assert_eq!(motion.official.as_ref(), Some(&out.result));
    }

    #[test]
    fn test_manual_tally_takes_priority_over_ballots() {
        let mut fx = Fixture::new();
        fx.cast(1, BallotChoice::For);

        let mut motion = closed_motion();
        motion.manual_tally = Some(ManualTally::new(
            Decimal::from(20),
            Decimal::from(4),
            Decimal::from(14),
            Decimal::from(2),
        ));
        let out = OfficialResultsConsolidator::consolidate(&mut motion, fx.ctx(), Utc::now())
            .unwrap();
        assert_eq!(out.result.source, ResultSource::Manual);
        assert_eq!(out.result.decision, Decision::Rejected);
        assert_eq!(out.result.against, Decimal::from(14));
    }

    #[test]
    fn test_inconsistent_manual_tally_is_refused() {
        let fx = Fixture::new();
        let mut motion = closed_motion();
        motion.manual_tally = Some(ManualTally::new(
            Decimal::from(20),
            Decimal::from(12),
            Decimal::from(5),
            Decimal::from(2),
        ));

        let err = OfficialResultsConsolidator::consolidate(&mut motion, fx.ctx(), Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            GovernanceError::InconsistentManualTally {
                total: Decimal::from(20),
                sum: Decimal::from(19)
            }
        );
        assert!(motion.official.is_none());
    }

    #[test]
    fn test_negative_manual_count_is_refused() {
        let fx = Fixture::new();
        let mut motion = closed_motion();
        // Sums to the total, but only through a negative count
        motion.manual_tally = Some(ManualTally::new(
            Decimal::ONE,
            Decimal::TWO,
            Decimal::NEGATIVE_ONE,
            Decimal::ZERO,
        ));

        let err = OfficialResultsConsolidator::consolidate(&mut motion, fx.ctx(), Utc::now())
            .unwrap_err();
        assert_eq!(err.kind(), "negative_manual_tally");
        assert!(motion.official.is_none());
    }

    #[test]
    fn test_no_data_is_undetermined() {
        let fx = Fixture::new();
        let mut motion = closed_motion();
        let out = OfficialResultsConsolidator::consolidate(&mut motion, fx.ctx(), Utc::now())
            .unwrap();
        assert_eq!(out.result.source, ResultSource::None);
        assert_eq!(out.result.decision, Decision::Undetermined);
        assert_eq!(out.result.reason, DecisionReason::NoData);
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let mut fx = Fixture::new();
        fx.cast(1, BallotChoice::For);
        fx.cast(2, BallotChoice::Against);

        let mut motion = closed_motion();
        let at = Utc::now();
        let first = OfficialResultsConsolidator::consolidate(&mut motion, fx.ctx(), at).unwrap();
        let stored = motion.official.clone();

        let later = at + chrono::Duration::seconds(30);
        let second = OfficialResultsConsolidator::consolidate(&mut motion, fx.ctx(), later)
            .unwrap();
        assert!(!second.written);
        assert_eq!(first.result, second.result);
        assert_eq!(
            serde_json::to_string(&stored).unwrap(),
            serde_json::to_string(&motion.official).unwrap()
        );
    }

    #[test]
    fn test_stored_result_survives_new_ballots_until_regenerated() {
        let mut fx = Fixture::new();
        fx.cast(1, BallotChoice::Against);
        let mut motion = closed_motion();
        OfficialResultsConsolidator::consolidate(&mut motion, fx.ctx(), Utc::now()).unwrap();

        fx.cast(2, BallotChoice::For);
        fx.cast(3, BallotChoice::For);
        let (current, provisional) =
            OfficialResultsConsolidator::current(&motion, fx.ctx(), Utc::now()).unwrap();
        assert!(!provisional);
        assert_eq!(current.decision, Decision::Rejected);

        let regen =
            OfficialResultsConsolidator::regenerate(&mut motion, fx.ctx(), Utc::now()).unwrap();
        assert_eq!(regen.result.decision, Decision::Adopted);
        assert_eq!(regen.result.regenerations, 1);
    }

    #[test]
    fn test_open_motion_is_not_consolidated() {
        let fx = Fixture::new();
        let mut motion = Motion::new(MOTION, MEETING, "Open");
        motion.mark_opened(UserId::new(1), Utc::now()).unwrap();
        assert_eq!(
            OfficialResultsConsolidator::consolidate(&mut motion, fx.ctx(), Utc::now()),
            Err(GovernanceError::MotionNotClosed(MOTION))
        );
        let (_, provisional) =
            OfficialResultsConsolidator::current(&motion, fx.ctx(), Utc::now()).unwrap();
        assert!(provisional);
        assert!(motion.official.is_none());
    }

    #[test]
    fn test_validated_meeting_refuses_regeneration() {
        let mut fx = Fixture::new();
        fx.cast(1, BallotChoice::For);
        fx.meeting.validated_at = Some(Utc::now());
        let mut motion = closed_motion();
        assert_eq!(
            OfficialResultsConsolidator::regenerate(&mut motion, fx.ctx(), Utc::now()),
            Err(GovernanceError::MeetingValidatedLocked { meeting: MEETING })
        );
    }

    #[test]
    fn test_missing_vote_policy() {
        let mut fx = Fixture::new();
        fx.cast(1, BallotChoice::For);
        let mut motion = closed_motion();
        let ctx = ConsolidationContext {
            vote_policy: None,
            ..fx.ctx()
        };
        assert_eq!(
            OfficialResultsConsolidator::consolidate(&mut motion, ctx, Utc::now()),
            Err(GovernanceError::MissingPolicy {
                motion: MOTION,
                missing: "vote"
            })
        );
    }
}
