//! Acting identity and capability model
//!
//! Roles form a closed set and map to capabilities through a static table.
//! Authorization happens once, at the boundary of each use case; the engines
//! below it never look at roles.

use super::ids::{TenantId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Operator role within a tenant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Operator,
    President,
    Assessor,
    Voter,
    Auditor,
}

/// Something an actor may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageMeetings,
    ControlMotions,
    RecordAttendance,
    ManageProxies,
    CastBallot,
    EnterManualVotes,
    ValidateMeeting,
    RegenerateResults,
    ReadResults,
}

impl Role {
    /// Capability table for this role
    pub fn capabilities(&self) -> &'static [Capability] {
        use Capability::*;
        match self {
            Role::Admin => &[
                ManageMeetings,
                ControlMotions,
                RecordAttendance,
                ManageProxies,
                CastBallot,
                EnterManualVotes,
                ValidateMeeting,
                RegenerateResults,
                ReadResults,
            ],
            Role::Operator => &[
                ManageMeetings,
                ControlMotions,
                RecordAttendance,
                ManageProxies,
                EnterManualVotes,
                ReadResults,
            ],
            Role::President => &[ControlMotions, ValidateMeeting, ReadResults],
            Role::Assessor => &[RecordAttendance, EnterManualVotes, ReadResults],
            Role::Voter => &[CastBallot, ReadResults],
            Role::Auditor => &[RegenerateResults, ReadResults],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Operator => "operator",
            Role::President => "president",
            Role::Assessor => "assessor",
            Role::Voter => "voter",
            Role::Auditor => "auditor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "operator" => Ok(Role::Operator),
            "president" | "chair" => Ok(Role::President),
            "assessor" => Ok(Role::Assessor),
            "voter" => Ok(Role::Voter),
            "auditor" => Ok(Role::Auditor),
            other => Err(format!(
                "Unknown role: {}. Valid: admin, operator, president, assessor, voter, auditor",
                other
            )),
        }
    }
}

/// Raised at the use-case boundary when the actor lacks a capability
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("role '{role}' is not allowed to {capability:?}")]
pub struct AccessDenied {
    pub role: Role,
    pub capability: Capability,
}

/// Who is acting, passed explicitly into every use case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorContext {
    pub user_id: UserId,
    pub role: Role,
    pub tenant_id: TenantId,
}

impl ActorContext {
    pub fn new(user_id: UserId, role: Role, tenant_id: TenantId) -> Self {
        Self {
            user_id,
            role,
            tenant_id,
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.capabilities().contains(&capability)
    }

    pub fn authorize(&self, capability: Capability) -> Result<(), AccessDenied> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(AccessDenied {
                role: self.role,
                capability,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> ActorContext {
        ActorContext::new(UserId::new(1), role, TenantId::new(1))
    }

    #[test]
    fn test_admin_has_every_capability() {
        let admin = actor(Role::Admin);
        assert!(admin.can(Capability::RegenerateResults));
        assert!(admin.can(Capability::CastBallot));
        assert!(admin.authorize(Capability::ValidateMeeting).is_ok());
    }

    #[test]
    fn test_voter_cannot_control_motions() {
        let err = actor(Role::Voter)
            .authorize(Capability::ControlMotions)
            .unwrap_err();
        assert_eq!(err.role, Role::Voter);
        assert_eq!(err.capability, Capability::ControlMotions);
    }

    #[test]
    fn test_only_president_and_admin_validate() {
        let validators: Vec<Role> = [
            Role::Admin,
            Role::Operator,
            Role::President,
            Role::Assessor,
            Role::Voter,
            Role::Auditor,
        ]
        .into_iter()
        .filter(|r| r.capabilities().contains(&Capability::ValidateMeeting))
        .collect();
        assert_eq!(validators, vec![Role::Admin, Role::President]);
    }

    #[test]
    fn test_parse_role() {
        assert_eq!("Chair".parse::<Role>().ok(), Some(Role::President));
        assert_eq!("operator".parse::<Role>().ok(), Some(Role::Operator));
        assert!("janitor".parse::<Role>().is_err());
    }
}
