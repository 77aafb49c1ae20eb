//! Governance store adapters.

mod memory;

pub use memory::InMemoryGovernanceStore;
