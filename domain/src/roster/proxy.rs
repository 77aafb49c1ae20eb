//! Proxy delegations

use crate::core::ids::{MeetingId, MemberId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a delegation covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyScope {
    /// Every motion of the meeting
    #[default]
    Meeting,
}

/// Delegation of one member's voting weight to another for a meeting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proxy {
    pub meeting_id: MeetingId,
    pub giver: MemberId,
    pub receiver: MemberId,
    #[serde(default)]
    pub scope: ProxyScope,
    pub granted_at: DateTime<Utc>,
    /// `None` while the delegation is active
    #[serde(default)]
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Proxy {
    pub fn new(meeting_id: MeetingId, giver: MemberId, receiver: MemberId) -> Self {
        Self {
            meeting_id,
            giver,
            receiver,
            scope: ProxyScope::Meeting,
            granted_at: Utc::now(),
            revoked_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }

    pub fn revoke(&mut self, at: DateTime<Utc>) {
        if self.revoked_at.is_none() {
            self.revoked_at = Some(at);
        }
    }
}
