//! Member roll, attendance and proxy delegation
//!
//! The roster is the input every other engine consumes: it answers "who may
//! vote, with what weight, and through whom" for one meeting.

pub mod member;
pub mod proxy;
pub mod resolver;

pub use member::{Attendance, AttendanceMode, Member};
pub use proxy::{Proxy, ProxyScope};
pub use resolver::{
    DEFAULT_PROXY_CEILING, EligibilityPath, ProxyResolver, ResolvedMember, Roster, RosterInput,
    RosterOptions,
};
