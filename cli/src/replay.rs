//! Scenario replay
//!
//! Drives one scenario through the use cases the way a meeting operator
//! would: set up the meeting, launch it, record attendance and proxies, then
//! open, vote and close each motion in turn. Setup failures abort the replay;
//! a rejected ballot, attendance row or proxy is kept as a failure and the
//! meeting carries on.

use gavel_application::{
    AddMotionInput, AddMotionUseCase, AssignPresidentUseCase, AssignProxyUseCase,
    CastBallotInput, CastBallotUseCase, CloseMotionUseCase, CommandError, CreateMeetingInput,
    CreateMeetingUseCase, GetMeetingReportUseCase, GovernanceContext, GovernanceStore,
    LaunchMeetingUseCase, MeetingReport, OpenMotionUseCase, RecordAttendanceUseCase,
    RecordManualTallyInput, RecordManualTallyUseCase, TransitionMeetingUseCase,
    ValidateMeetingUseCase,
};
use gavel_domain::{
    ActorContext, MeetingId, MeetingStatus, MemberId, MotionId, PolicyId, Role, TenantId, UserId,
};
use gavel_infrastructure::scenario::{Scenario, ScenarioBallot, ScenarioMotion};
use tracing::{info, warn};

/// Operator account the replay acts as
const OPERATOR: UserId = UserId::new(1);

/// A command the engine refused during replay
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayFailure {
    pub step: String,
    pub error: CommandError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayOutcome {
    pub meeting: MeetingId,
    pub report: MeetingReport,
    pub failures: Vec<ReplayFailure>,
}

pub struct ScenarioReplay<S: GovernanceStore + 'static> {
    ctx: GovernanceContext<S>,
    validate: bool,
}

impl<S: GovernanceStore + 'static> ScenarioReplay<S> {
    pub fn new(ctx: GovernanceContext<S>) -> Self {
        Self {
            ctx,
            validate: false,
        }
    }

    /// Validate the meeting once it is closed
    pub fn validating(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub async fn run(&self, scenario: &Scenario) -> Result<ReplayOutcome, CommandError> {
        let tenant = scenario.tenant_id();
        let operator = ActorContext::new(OPERATOR, Role::Operator, tenant);
        let mut failures = Vec::new();

        self.load_reference_data(scenario, tenant).await?;

        let meeting = CreateMeetingUseCase::new(self.ctx.clone())
            .execute(
                &operator,
                CreateMeetingInput::new(&scenario.meeting.title)
                    .with_policies(
                        scenario.meeting.quorum_policy.map(PolicyId::new),
                        scenario.meeting.vote_policy.map(PolicyId::new),
                    )
                    .with_convocation(scenario.meeting.convocation),
            )
            .await?
            .id;

        let mut motions = Vec::with_capacity(scenario.motions.len());
        for motion in &scenario.motions {
            let mut input = AddMotionInput::new(meeting, &motion.title);
            input.quorum_policy = motion.quorum_policy.map(PolicyId::new);
            input.vote_policy = motion.vote_policy.map(PolicyId::new);
            let added = AddMotionUseCase::new(self.ctx.clone())
                .execute(&operator, input)
                .await?;
            motions.push(added.id);
        }

        if let Some(president) = scenario.meeting.president {
            AssignPresidentUseCase::new(self.ctx.clone())
                .execute(&operator, meeting, MemberId::new(president))
                .await?;
        }

        LaunchMeetingUseCase::new(self.ctx.clone())
            .execute(&operator, meeting)
            .await?;

        let attendance = RecordAttendanceUseCase::new(self.ctx.clone());
        for row in &scenario.attendance {
            let result = attendance
                .execute(&operator, meeting, MemberId::new(row.member), row.mode)
                .await;
            note(&mut failures, format!("attendance of member {}", row.member), result);
        }

        let proxies = AssignProxyUseCase::new(self.ctx.clone());
        for proxy in &scenario.proxies {
            let result = proxies
                .execute(
                    &operator,
                    meeting,
                    MemberId::new(proxy.giver),
                    MemberId::new(proxy.receiver),
                )
                .await;
            note(
                &mut failures,
                format!("proxy {} -> {}", proxy.giver, proxy.receiver),
                result,
            );
        }

        for (motion, spec) in motions.iter().zip(&scenario.motions) {
            self.vote(&operator, meeting, *motion, spec, &mut failures)
                .await?;
        }

        TransitionMeetingUseCase::new(self.ctx.clone())
            .execute(&operator, meeting, MeetingStatus::Closed)
            .await?;

        if self.validate {
            let president = ActorContext::new(
                UserId::new(scenario.meeting.president.unwrap_or(OPERATOR.get())),
                Role::President,
                tenant,
            );
            let result = ValidateMeetingUseCase::new(self.ctx.clone())
                .execute(&president, meeting)
                .await;
            note(&mut failures, "validation".to_string(), result);
        }

        let report = GetMeetingReportUseCase::new(self.ctx.clone())
            .execute(&operator, meeting)
            .await?;
        info!(
            "Replayed {}: {} motions, {} refused commands",
            meeting,
            report.motions.len(),
            failures.len()
        );

        Ok(ReplayOutcome {
            meeting,
            report,
            failures,
        })
    }

    async fn load_reference_data(
        &self,
        scenario: &Scenario,
        tenant: TenantId,
    ) -> Result<(), CommandError> {
        let store = &self.ctx.store;
        for member in &scenario.members {
            store.insert_member(member.to_member(tenant)).await?;
        }
        for policy in &scenario.quorum_policies {
            store.insert_quorum_policy(policy.to_policy(tenant)).await?;
        }
        for policy in &scenario.vote_policies {
            store.insert_vote_policy(policy.to_policy(tenant)).await?;
        }
        Ok(())
    }

    /// Open, vote and close one motion
    ///
    /// Only a failure to close aborts; a motion left open would block the
    /// meeting from closing anyway.
    async fn vote(
        &self,
        operator: &ActorContext,
        meeting: MeetingId,
        motion: MotionId,
        spec: &ScenarioMotion,
        failures: &mut Vec<ReplayFailure>,
    ) -> Result<(), CommandError> {
        let opened = OpenMotionUseCase::new(self.ctx.clone())
            .execute(operator, meeting, motion)
            .await;
        note(failures, format!("opening {}", motion), opened);

        let cast = CastBallotUseCase::new(self.ctx.clone());
        for ballot in &spec.ballots {
            let (actor, input) = ballot_command(operator, meeting, motion, ballot);
            let result = cast.execute(&actor, input).await;
            note(
                failures,
                format!("ballot of member {} on {}", ballot.member, motion),
                result,
            );
        }

        if let Some(tally) = &spec.manual_tally {
            let result = RecordManualTallyUseCase::new(self.ctx.clone())
                .execute(
                    operator,
                    RecordManualTallyInput {
                        meeting,
                        motion,
                        total: tally.total,
                        for_weight: tally.for_weight,
                        against: tally.against,
                        abstain: tally.abstain,
                    },
                )
                .await;
            note(failures, format!("manual tally on {}", motion), result);
        }

        match CloseMotionUseCase::new(self.ctx.clone())
            .execute(operator, meeting, motion)
            .await
        {
            Ok(_) => Ok(()),
            // Closing consolidates; a motion whose result cannot be computed
            // stays open and the replay stops here.
            Err(e) => {
                warn!("Could not close {}: {}", motion, e);
                Err(e)
            }
        }
    }
}

/// Electronic ballots are cast by the voter (or proxy holder), manual ones
/// by the operator
fn ballot_command(
    operator: &ActorContext,
    meeting: MeetingId,
    motion: MotionId,
    ballot: &ScenarioBallot,
) -> (ActorContext, CastBallotInput) {
    let mut input = CastBallotInput::new(
        meeting,
        motion,
        MemberId::new(ballot.member),
        ballot.choice,
    );
    if let Some(holder) = ballot.cast_by {
        input = input.by_proxy(MemberId::new(holder));
    }
    if ballot.manual {
        return (operator.clone(), input.manual());
    }
    let caster = ballot.cast_by.unwrap_or(ballot.member);
    let voter = ActorContext::new(UserId::new(caster), Role::Voter, operator.tenant_id);
    (voter, input)
}

fn note<T>(failures: &mut Vec<ReplayFailure>, step: String, result: Result<T, CommandError>) {
    if let Err(error) = result {
        warn!("Refused {}: {}", step, error);
        failures.push(ReplayFailure { step, error });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gavel_application::GovernanceEvent;
    use gavel_domain::{Decision, MotionStatus, ResultSource};
    use gavel_infrastructure::{BroadcastEventBus, InMemoryGovernanceStore, ScenarioLoader};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    const AGM: &str = r#"
[meeting]
title = "Annual general meeting"
quorum_policy = 1
vote_policy = 1
president = 1

[[members]]
id = 1
name = "Ada"

[[members]]
id = 2
name = "Brook"

[[members]]
id = 3
name = "Cyd"

[[members]]
id = 4
name = "Dee"

[[quorum_policies]]
id = 1
threshold = "0.5"

[[vote_policies]]
id = 1
threshold = "0.5"

[[attendance]]
member = 1
mode = "present"

[[attendance]]
member = 2
mode = "present"

[[attendance]]
member = 3
mode = "proxy"

[[proxies]]
giver = 3
receiver = 1

[[motions]]
title = "Approve the accounts"
ballots = [
    { member = 1, choice = "for" },
    { member = 2, choice = "against" },
    { member = 3, choice = "for", cast_by = 1 },
]

[[motions]]
title = "Elect the board"
manual_tally = { total = 3, for = 1, against = 2, abstain = 0 }
"#;

    fn replay(validate: bool) -> ScenarioReplay<InMemoryGovernanceStore> {
        let ctx = GovernanceContext::new(Arc::new(InMemoryGovernanceStore::new()));
        ScenarioReplay::new(ctx).validating(validate)
    }

    #[tokio::test]
    async fn test_replay_closes_every_motion() {
        let scenario = ScenarioLoader::parse(AGM).unwrap();
        let outcome = replay(false).run(&scenario).await.unwrap();

        assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
        let report = &outcome.report;
        assert_eq!(report.status, MeetingStatus::Closed);
        assert_eq!(report.quorum.met, Some(true));
        assert_eq!(report.attendance.represented, 1);

        let accounts = report.motions[0].result.as_ref().unwrap();
        assert_eq!(report.motions[0].status, MotionStatus::Closed);
        assert_eq!(accounts.source, ResultSource::Evote);
        assert_eq!(accounts.for_weight, Decimal::TWO);
        assert_eq!(accounts.decision, Decision::Adopted);
        assert!(!report.motions[0].provisional);

        let board = report.motions[1].result.as_ref().unwrap();
        assert_eq!(board.source, ResultSource::Manual);
        assert_eq!(board.decision, Decision::Rejected);
    }

    #[tokio::test]
    async fn test_replay_validates_on_request() {
        let scenario = ScenarioLoader::parse(AGM).unwrap();
        let outcome = replay(true).run(&scenario).await.unwrap();

        assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
        assert_eq!(outcome.report.status, MeetingStatus::Validated);
        assert!(outcome.report.validated);
    }

    #[tokio::test]
    async fn test_refused_ballots_are_reported_and_replay_continues() {
        let mut scenario = ScenarioLoader::parse(AGM).unwrap();
        // Member 4 never attended; member 3 must vote through the proxy holder
        scenario.motions[0].ballots.push(ScenarioBallot {
            member: 4,
            choice: gavel_domain::BallotChoice::For,
            cast_by: None,
            manual: false,
        });
        scenario.motions[0].ballots[2].cast_by = None;

        let outcome = replay(false).run(&scenario).await.unwrap();

        assert_eq!(outcome.failures.len(), 2);
        assert!(
            outcome
                .failures
                .iter()
                .all(|f| f.error.kind() == "not_eligible")
        );
        let accounts = outcome.report.motions[0].result.as_ref().unwrap();
        assert_eq!(accounts.for_weight, Decimal::ONE);
        assert_eq!(outcome.report.status, MeetingStatus::Closed);
    }

    #[tokio::test]
    async fn test_events_follow_the_replay() {
        let scenario = ScenarioLoader::parse(AGM).unwrap();
        let bus = Arc::new(BroadcastEventBus::new(64));
        let mut rx = bus.subscribe();
        let ctx = GovernanceContext::new(Arc::new(InMemoryGovernanceStore::new()))
            .with_events(bus.clone());

        ScenarioReplay::new(ctx).run(&scenario).await.unwrap();

        let mut closed = 0;
        while let Ok(event) = rx.try_recv() {
            if matches!(event, GovernanceEvent::MotionClosed { .. }) {
                closed += 1;
            }
        }
        assert_eq!(closed, 2);
    }
}
