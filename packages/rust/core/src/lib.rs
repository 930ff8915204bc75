//! Core orchestration and domain logic for PrepAgent.
//!
//! Knowledge store → context builders → plan generator / chat session →
//! stream aggregator. [`assistant::Assistant`] owns the state and ties the
//! pieces together for the front end.

pub mod aggregator;
pub mod assistant;
pub mod conversation;
pub mod knowledge;
pub mod plan;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
