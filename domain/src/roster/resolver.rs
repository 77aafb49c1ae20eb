//! Proxy resolution
//!
//! [`ProxyResolver`] turns the member roll, attendance rows and proxy rows of
//! a meeting into a [`Roster`]: for every active member, whether a ballot
//! from them counts, how much weight it carries, and who (if anyone) may cast
//! it on their behalf.
//!
//! Resolution is a pure function of its input. It is recomputed on demand and
//! never cached between calls.
//!
//! # Delegation rules
//!
//! - No self-delegation ([`GovernanceError::InvalidProxy`])
//! - Depth is exactly one: a giver cannot hold received proxies and a receiver
//!   cannot have delegated away their own vote
//!   ([`GovernanceError::ProxyChainNotAllowed`])
//! - A receiver holds at most `proxy_ceiling` active proxies
//!   ([`GovernanceError::ProxyCeilingExceeded`])
//! - A giver who attends personally votes directly; their proxy stays dormant

use super::member::{Attendance, AttendanceMode, Member};
use super::proxy::Proxy;
use crate::core::error::GovernanceError;
use crate::core::ids::MemberId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default number of simultaneous active proxies one receiver may hold
pub const DEFAULT_PROXY_CEILING: usize = 10;

/// Tunables for roster resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterOptions {
    pub proxy_ceiling: usize,
    /// Presume every active member present when no attendance was recorded
    pub fallback_all_active_when_unrecorded: bool,
}

impl Default for RosterOptions {
    fn default() -> Self {
        Self {
            proxy_ceiling: DEFAULT_PROXY_CEILING,
            fallback_all_active_when_unrecorded: false,
        }
    }
}

/// How a member came to be eligible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "path")]
pub enum EligibilityPath {
    Direct,
    Remote,
    Proxy { holder: MemberId },
    Ineligible,
}

/// Resolved standing of one member for one meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMember {
    pub member_id: MemberId,
    pub base_weight: Decimal,
    /// Weight counted for this member's own ballot (zero when ineligible)
    pub effective_weight: Decimal,
    /// Own effective weight plus every represented giver's weight
    pub carried_weight: Decimal,
    pub eligible: bool,
    pub attendance: AttendanceMode,
    pub path: EligibilityPath,
    /// Member allowed to cast this member's ballot by proxy
    pub proxy_holder: Option<MemberId>,
    /// Givers this member currently represents
    pub represents: Vec<MemberId>,
}

/// Input rows for one meeting
#[derive(Debug, Clone, Copy)]
pub struct RosterInput<'a> {
    pub members: &'a [Member],
    pub attendance: &'a [Attendance],
    pub proxies: &'a [Proxy],
}

/// Per-member resolution of a meeting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    members: BTreeMap<MemberId, ResolvedMember>,
    used_fallback: bool,
}

impl Roster {
    pub fn get(&self, member: MemberId) -> Option<&ResolvedMember> {
        self.members.get(&member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedMember> {
        self.members.values()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether attendance was presumed rather than recorded
    pub fn used_fallback(&self) -> bool {
        self.used_fallback
    }

    pub fn is_eligible(&self, member: MemberId) -> bool {
        self.get(member).is_some_and(|m| m.eligible)
    }

    /// Base weight of every active member on the roll
    pub fn roll_weight(&self) -> Decimal {
        self.iter().map(|m| m.base_weight).sum()
    }

    /// Weight of every eligible (attending or represented) member
    pub fn eligible_weight(&self) -> Decimal {
        self.iter()
            .filter(|m| m.eligible)
            .map(|m| m.effective_weight)
            .sum()
    }

    /// Base weight of members with any attendance row other than absent
    pub fn recorded_presence_weight(&self) -> Decimal {
        self.iter()
            .filter(|m| m.attendance.is_recorded_presence())
            .map(|m| m.base_weight)
            .sum()
    }

    /// Weight counted toward quorum
    pub fn quorum_weight(&self, include_proxies: bool, count_remote: bool) -> Decimal {
        self.iter()
            .filter(|m| match m.path {
                EligibilityPath::Direct => true,
                EligibilityPath::Remote => count_remote,
                EligibilityPath::Proxy { holder } => {
                    include_proxies
                        && (count_remote
                            || self
                                .get(holder)
                                .is_some_and(|h| h.path == EligibilityPath::Direct))
                }
                EligibilityPath::Ineligible => false,
            })
            .map(|m| m.effective_weight)
            .sum()
    }
}

/// Resolves delegated voting power for a meeting
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyResolver {
    options: RosterOptions,
}

impl ProxyResolver {
    pub fn new(options: RosterOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RosterOptions {
        &self.options
    }

    /// Check a set of proxies against the delegation rules
    ///
    /// Revoked proxies are ignored.
    pub fn check_delegations(&self, proxies: &[Proxy]) -> Result<(), GovernanceError> {
        let active: Vec<&Proxy> = proxies.iter().filter(|p| p.is_active()).collect();

        let mut givers = BTreeSet::new();
        for proxy in &active {
            if proxy.giver == proxy.receiver {
                return Err(self_delegation(proxy.giver));
            }
            if !givers.insert(proxy.giver) {
                return Err(GovernanceError::InvalidProxy {
                    reason: format!("{} has more than one active proxy", proxy.giver),
                });
            }
        }

        let mut held: BTreeMap<MemberId, usize> = BTreeMap::new();
        for proxy in &active {
            if givers.contains(&proxy.receiver) {
                return Err(GovernanceError::ProxyChainNotAllowed {
                    giver: proxy.giver,
                    receiver: proxy.receiver,
                    reason: "receiver has delegated their own vote".to_string(),
                });
            }
            let count = held.entry(proxy.receiver).or_default();
            *count += 1;
            if *count > self.options.proxy_ceiling {
                return Err(GovernanceError::ProxyCeilingExceeded {
                    receiver: proxy.receiver,
                    ceiling: self.options.proxy_ceiling,
                });
            }
        }

        Ok(())
    }

    /// Validate assigning `candidate` on top of the existing proxies
    ///
    /// An active proxy from the same giver is treated as replaced.
    pub fn validate_assignment(
        &self,
        candidate: &Proxy,
        existing: &[Proxy],
    ) -> Result<(), GovernanceError> {
        if candidate.giver == candidate.receiver {
            return Err(self_delegation(candidate.giver));
        }

        let others: Vec<Proxy> = existing
            .iter()
            .filter(|p| {
                p.is_active() && p.meeting_id == candidate.meeting_id && p.giver != candidate.giver
            })
            .cloned()
            .collect();

        if others.iter().any(|p| p.receiver == candidate.giver) {
            return Err(GovernanceError::ProxyChainNotAllowed {
                giver: candidate.giver,
                receiver: candidate.receiver,
                reason: "giver already holds delegated power".to_string(),
            });
        }
        if others.iter().any(|p| p.giver == candidate.receiver) {
            return Err(GovernanceError::ProxyChainNotAllowed {
                giver: candidate.giver,
                receiver: candidate.receiver,
                reason: "receiver has delegated their own vote".to_string(),
            });
        }

        let mut prospective = others;
        prospective.push(candidate.clone());
        self.check_delegations(&prospective)
    }

    /// Resolve the roster of a meeting
    pub fn resolve(&self, input: RosterInput<'_>) -> Result<Roster, GovernanceError> {
        let active_members: BTreeMap<MemberId, &Member> = input
            .members
            .iter()
            .filter(|m| m.active)
            .map(|m| (m.id, m))
            .collect();

        let recorded: BTreeMap<MemberId, AttendanceMode> = input
            .attendance
            .iter()
            .map(|a| (a.member_id, a.mode))
            .collect();

        let used_fallback = self.options.fallback_all_active_when_unrecorded
            && recorded.is_empty()
            && !active_members.is_empty();

        let mode_of = |member: MemberId| -> AttendanceMode {
            if used_fallback {
                AttendanceMode::Present
            } else {
                recorded.get(&member).copied().unwrap_or_default()
            }
        };

        self.check_delegations(input.proxies)?;
        let delegations: BTreeMap<MemberId, MemberId> = input
            .proxies
            .iter()
            .filter(|p| p.is_active())
            .map(|p| (p.giver, p.receiver))
            .collect();

        let mut members = BTreeMap::new();
        for (&id, member) in &active_members {
            let attendance = mode_of(id);
            let path = match attendance {
                AttendanceMode::Present => EligibilityPath::Direct,
                AttendanceMode::Remote => EligibilityPath::Remote,
                _ => match delegations.get(&id) {
                    Some(&holder)
                        if active_members.contains_key(&holder)
                            && mode_of(holder).is_attending() =>
                    {
                        EligibilityPath::Proxy { holder }
                    }
                    _ => EligibilityPath::Ineligible,
                },
            };
            let eligible = path != EligibilityPath::Ineligible;
            let effective_weight = if eligible {
                member.weight
            } else {
                Decimal::ZERO
            };
            let proxy_holder = match path {
                EligibilityPath::Proxy { holder } => Some(holder),
                _ => None,
            };

            members.insert(
                id,
                ResolvedMember {
                    member_id: id,
                    base_weight: member.weight,
                    effective_weight,
                    carried_weight: effective_weight,
                    eligible,
                    attendance,
                    path,
                    proxy_holder,
                    represents: Vec::new(),
                },
            );
        }

        let represented: Vec<(MemberId, MemberId, Decimal)> = members
            .values()
            .filter_map(|m| m.proxy_holder.map(|h| (h, m.member_id, m.effective_weight)))
            .collect();
        for (holder, giver, weight) in represented {
            if let Some(entry) = members.get_mut(&holder) {
                entry.represents.push(giver);
                entry.carried_weight += weight;
            }
        }

        Ok(Roster {
            members,
            used_fallback,
        })
    }
}

fn self_delegation(member: MemberId) -> GovernanceError {
    GovernanceError::InvalidProxy {
        reason: format!("{} cannot delegate to themselves", member),
    }
}
