//! Members and attendance

use crate::core::ids::{MeetingId, MemberId, TenantId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Voting member of a tenant's assembly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub tenant_id: TenantId,
    pub display_name: String,
    pub active: bool,
    /// Base voting weight (never negative)
    pub weight: Decimal,
}

impl Member {
    pub fn new(
        id: MemberId,
        tenant_id: TenantId,
        display_name: impl Into<String>,
        weight: Decimal,
    ) -> Self {
        Self {
            id,
            tenant_id,
            display_name: display_name.into(),
            active: true,
            weight: weight.max(Decimal::ZERO),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// How a member attends a given meeting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceMode {
    Present,
    Remote,
    /// Not attending, represented through a proxy
    Proxy,
    Excused,
    #[default]
    Absent,
}

impl AttendanceMode {
    /// Physically or remotely in the room, able to cast a ballot directly
    pub fn is_attending(&self) -> bool {
        matches!(self, AttendanceMode::Present | AttendanceMode::Remote)
    }

    /// Has any attendance row other than plain absence
    pub fn is_recorded_presence(&self) -> bool {
        !matches!(self, AttendanceMode::Absent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceMode::Present => "present",
            AttendanceMode::Remote => "remote",
            AttendanceMode::Proxy => "proxy",
            AttendanceMode::Excused => "excused",
            AttendanceMode::Absent => "absent",
        }
    }
}

impl fmt::Display for AttendanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attendance row for one member at one meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendance {
    pub meeting_id: MeetingId,
    pub member_id: MemberId,
    pub mode: AttendanceMode,
    pub recorded_at: DateTime<Utc>,
}

impl Attendance {
    pub fn new(meeting_id: MeetingId, member_id: MemberId, mode: AttendanceMode) -> Self {
        Self {
            meeting_id,
            member_id,
            mode,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_weight_is_clamped() {
        let m = Member::new(MemberId::new(1), TenantId::new(1), "Ada", Decimal::from(-3));
        assert_eq!(m.weight, Decimal::ZERO);
        assert!(m.active);
        assert!(!m.inactive().active);
    }

    #[test]
    fn test_attendance_modes() {
        assert!(AttendanceMode::Remote.is_attending());
        assert!(!AttendanceMode::Proxy.is_attending());
        assert!(AttendanceMode::Excused.is_recorded_presence());
        assert!(!AttendanceMode::Absent.is_recorded_presence());
        assert_eq!(AttendanceMode::default(), AttendanceMode::Absent);
    }
}
