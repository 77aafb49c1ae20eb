//! Raw TOML scenario data types
//!
//! A scenario describes one meeting end to end: the member roll, policies,
//! attendance, proxies and every motion with its ballots or manual tally.
//!
//! ```toml
//! [meeting]
//! title = "Annual general meeting"
//! quorum_policy = 1
//! vote_policy = 1
//! president = 1
//!
//! [[members]]
//! id = 1
//! name = "Ada"
//!
//! [[quorum_policies]]
//! id = 1
//! threshold = 0.5
//!
//! [[vote_policies]]
//! id = 1
//! threshold = 0.5
//!
//! [[attendance]]
//! member = 1
//! mode = "present"
//!
//! [[motions]]
//! title = "Approve the accounts"
//! ballots = [{ member = 1, choice = "for" }]
//! ```

use gavel_domain::{
    AttendanceMode, BallotChoice, Convocation, DenominatorKind, MajorityBase, ManualTally, Member,
    MemberId, PolicyId, QuorumPolicy, TenantId, ThresholdKind, TieRule, VotePolicy,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioMeeting {
    pub title: String,
    #[serde(default)]
    pub quorum_policy: Option<u64>,
    #[serde(default)]
    pub vote_policy: Option<u64>,
    #[serde(default)]
    pub convocation: Convocation,
    /// Chair recorded before validation
    #[serde(default)]
    pub president: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioMember {
    pub id: u64,
    pub name: String,
    #[serde(default = "default_weight")]
    pub weight: Decimal,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl ScenarioMember {
    pub fn to_member(&self, tenant: TenantId) -> Member {
        let member = Member::new(MemberId::new(self.id), tenant, &self.name, self.weight);
        if self.active { member } else { member.inactive() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioQuorumPolicy {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub denominator: DenominatorKind,
    #[serde(default)]
    pub custom_denominator: Option<Decimal>,
    pub threshold: Decimal,
    #[serde(default)]
    pub threshold_kind: ThresholdKind,
    #[serde(default)]
    pub second_call_threshold: Option<Decimal>,
    #[serde(default = "default_true")]
    pub include_proxies: bool,
    #[serde(default = "default_true")]
    pub count_remote: bool,
}

impl ScenarioQuorumPolicy {
    pub fn to_policy(&self, tenant: TenantId) -> QuorumPolicy {
        let mut policy = QuorumPolicy::new(
            PolicyId::new(self.id),
            tenant,
            self.denominator,
            self.threshold,
        )
        .including_proxies(self.include_proxies)
        .counting_remote(self.count_remote);
        policy.name = self.name.clone();
        policy.custom_denominator = self.custom_denominator;
        policy.threshold_kind = self.threshold_kind;
        policy.second_call_threshold = self.second_call_threshold;
        policy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioVotePolicy {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub base: MajorityBase,
    pub threshold: Decimal,
    #[serde(default)]
    pub abstention_as_against: bool,
    #[serde(default)]
    pub tie_rule: TieRule,
}

impl ScenarioVotePolicy {
    pub fn to_policy(&self, tenant: TenantId) -> VotePolicy {
        let mut policy = VotePolicy::new(PolicyId::new(self.id), tenant, self.base, self.threshold)
            .with_abstention_as_against(self.abstention_as_against)
            .with_tie_rule(self.tie_rule);
        policy.name = self.name.clone();
        policy
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioAttendance {
    pub member: u64,
    pub mode: AttendanceMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioProxy {
    pub giver: u64,
    pub receiver: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioBallot {
    /// Member whose vote this is
    pub member: u64,
    pub choice: BallotChoice,
    /// Proxy holder casting on the member's behalf
    #[serde(default)]
    pub cast_by: Option<u64>,
    /// Entered by the operator instead of electronically
    #[serde(default)]
    pub manual: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioTally {
    pub total: Decimal,
    #[serde(rename = "for")]
    pub for_weight: Decimal,
    pub against: Decimal,
    pub abstain: Decimal,
}

impl ScenarioTally {
    pub fn to_tally(&self) -> ManualTally {
        ManualTally::new(self.total, self.for_weight, self.against, self.abstain)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioMotion {
    pub title: String,
    #[serde(default)]
    pub quorum_policy: Option<u64>,
    #[serde(default)]
    pub vote_policy: Option<u64>,
    #[serde(default)]
    pub ballots: Vec<ScenarioBallot>,
    #[serde(default)]
    pub manual_tally: Option<ScenarioTally>,
}

/// Complete scenario file (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default = "default_tenant")]
    pub tenant: u64,
    pub meeting: ScenarioMeeting,
    #[serde(default)]
    pub members: Vec<ScenarioMember>,
    #[serde(default)]
    pub quorum_policies: Vec<ScenarioQuorumPolicy>,
    #[serde(default)]
    pub vote_policies: Vec<ScenarioVotePolicy>,
    #[serde(default)]
    pub attendance: Vec<ScenarioAttendance>,
    #[serde(default)]
    pub proxies: Vec<ScenarioProxy>,
    #[serde(default)]
    pub motions: Vec<ScenarioMotion>,
}

impl Scenario {
    pub fn tenant_id(&self) -> TenantId {
        TenantId::new(self.tenant)
    }

    /// Structural problems: duplicate ids and dangling references
    ///
    /// Business rules (proxy chains, ceilings, eligibility) are left to the
    /// engine so replay reports them like any other command failure.
    pub fn check_references(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let members = unique_ids("member", self.members.iter().map(|m| m.id), &mut problems);
        let quorum = unique_ids(
            "quorum policy",
            self.quorum_policies.iter().map(|p| p.id),
            &mut problems,
        );
        let vote = unique_ids(
            "vote policy",
            self.vote_policies.iter().map(|p| p.id),
            &mut problems,
        );

        let mut check = |what: &str, id: Option<u64>, known: &BTreeSet<u64>| {
            if let Some(id) = id
                && !known.contains(&id)
            {
                problems.push(format!("{} references unknown id {}", what, id));
            }
        };

        check("meeting.quorum_policy", self.meeting.quorum_policy, &quorum);
        check("meeting.vote_policy", self.meeting.vote_policy, &vote);
        check("meeting.president", self.meeting.president, &members);
        for row in &self.attendance {
            check("attendance.member", Some(row.member), &members);
        }
        for proxy in &self.proxies {
            check("proxies.giver", Some(proxy.giver), &members);
            check("proxies.receiver", Some(proxy.receiver), &members);
        }
        for (i, motion) in self.motions.iter().enumerate() {
            let label = format!("motions[{}]", i);
            check(&format!("{}.quorum_policy", label), motion.quorum_policy, &quorum);
            check(&format!("{}.vote_policy", label), motion.vote_policy, &vote);
            for ballot in &motion.ballots {
                check(&format!("{}.ballots.member", label), Some(ballot.member), &members);
                check(&format!("{}.ballots.cast_by", label), ballot.cast_by, &members);
            }
        }

        problems
    }
}

fn unique_ids(
    what: &str,
    ids: impl Iterator<Item = u64>,
    problems: &mut Vec<String>,
) -> BTreeSet<u64> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            problems.push(format!("duplicate {} id {}", what, id));
        }
    }
    seen
}

fn default_weight() -> Decimal {
    Decimal::ONE
}

fn default_true() -> bool {
    true
}

fn default_tenant() -> u64 {
    1
}
