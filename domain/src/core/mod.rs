//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: typed identifiers for tenants, members, meetings, motions, policies
//! - [`actor::ActorContext`]: who is acting, with the role/capability table
//! - [`error::GovernanceError`]: the full error taxonomy

pub mod actor;
pub mod error;
pub mod ids;
