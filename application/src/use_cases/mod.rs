//! Use cases (one struct per operator action)
//!
//! - [`setup`]: meetings, motions and the chair
//! - [`attendance`]: attendance and proxies
//! - [`voting`]: ballots and manual tallies
//! - [`lifecycle`]: meeting status transitions, launch and validation
//! - [`motions`]: opening and closing motions
//! - [`results`]: official results, quorum and reports

pub mod attendance;
pub mod lifecycle;
pub mod motions;
pub mod results;
pub mod setup;
pub mod shared;
pub mod voting;

#[cfg(test)]
pub(crate) mod testing;
