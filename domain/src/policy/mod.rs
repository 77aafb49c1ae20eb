//! Quorum and vote policies
//!
//! Policies are plain configuration rows owned by a tenant. A motion may
//! override the policies of its meeting; resolution of the effective policy
//! happens in [`crate::motion::Motion::effective_quorum_policy`] and
//! [`crate::motion::Motion::effective_vote_policy`].

use crate::core::ids::{PolicyId, TenantId};
use crate::meeting::Convocation;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the quorum numerator is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenominatorKind {
    /// Base weight of every active member of the tenant
    #[default]
    EligibleMembers,
    /// Weight of members with any non-absent attendance row
    PresentMembers,
    /// Externally supplied fixed value
    Custom,
}

impl DenominatorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenominatorKind::EligibleMembers => "eligible_members",
            DenominatorKind::PresentMembers => "present_members",
            DenominatorKind::Custom => "custom",
        }
    }
}

impl fmt::Display for DenominatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a quorum threshold is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKind {
    /// Fraction between 0 and 1 compared with numerator / denominator
    #[default]
    Ratio,
    /// Minimum numerator weight
    Absolute,
}

/// Quorum policy row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    pub id: PolicyId,
    pub tenant_id: TenantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub denominator: DenominatorKind,
    #[serde(default)]
    pub custom_denominator: Option<Decimal>,
    pub threshold: Decimal,
    #[serde(default)]
    pub threshold_kind: ThresholdKind,
    /// Replaces `threshold` on a second convocation
    #[serde(default)]
    pub second_call_threshold: Option<Decimal>,
    #[serde(default = "default_true")]
    pub include_proxies: bool,
    #[serde(default = "default_true")]
    pub count_remote: bool,
}

impl QuorumPolicy {
    pub fn new(
        id: PolicyId,
        tenant_id: TenantId,
        denominator: DenominatorKind,
        threshold: Decimal,
    ) -> Self {
        Self {
            id,
            tenant_id,
            name: String::new(),
            denominator,
            custom_denominator: None,
            threshold,
            threshold_kind: ThresholdKind::Ratio,
            second_call_threshold: None,
            include_proxies: true,
            count_remote: true,
        }
    }

    pub fn with_second_call(mut self, threshold: Decimal) -> Self {
        self.second_call_threshold = Some(threshold);
        self
    }

    pub fn with_custom_denominator(mut self, value: Decimal) -> Self {
        self.denominator = DenominatorKind::Custom;
        self.custom_denominator = Some(value);
        self
    }

    pub fn absolute(mut self) -> Self {
        self.threshold_kind = ThresholdKind::Absolute;
        self
    }

    pub fn including_proxies(mut self, include: bool) -> Self {
        self.include_proxies = include;
        self
    }

    pub fn counting_remote(mut self, count: bool) -> Self {
        self.count_remote = count;
        self
    }

    /// Threshold in force for the given convocation
    pub fn threshold_for(&self, convocation: Convocation) -> Decimal {
        match (convocation, self.second_call_threshold) {
            (Convocation::Second, Some(second)) => second,
            _ => self.threshold,
        }
    }
}

/// What the "for" weight of a motion is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MajorityBase {
    /// for + against (+ abstain when abstention counts as against)
    #[default]
    Expressed,
    /// Weight of every active member on the roll
    TotalMembers,
    /// Weight of every eligible (present or represented) member
    Present,
}

impl MajorityBase {
    pub fn as_str(&self) -> &'static str {
        match self {
            MajorityBase::Expressed => "expressed",
            MajorityBase::TotalMembers => "total_members",
            MajorityBase::Present => "present",
        }
    }
}

impl fmt::Display for MajorityBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome when the ratio lands exactly on the threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieRule {
    #[default]
    Adopt,
    Reject,
}

/// Vote policy row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotePolicy {
    pub id: PolicyId,
    pub tenant_id: TenantId,
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

impl VotePolicy {
    pub fn new(id: PolicyId, tenant_id: TenantId, base: MajorityBase, threshold: Decimal) -> Self {
        Self {
            id,
            tenant_id,
            name: String::new(),
            base,
            threshold,
            abstention_as_against: false,
            tie_rule: TieRule::Adopt,
        }
    }

    pub fn with_abstention_as_against(mut self, enabled: bool) -> Self {
        self.abstention_as_against = enabled;
        self
    }

    pub fn with_tie_rule(mut self, rule: TieRule) -> Self {
        self.tie_rule = rule;
        self
    }
}

fn default_true() -> bool {
    true
}
