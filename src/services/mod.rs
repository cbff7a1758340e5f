//! Domain services. Each holds the shared store handle and exposes the
//! operations the HTTP layer calls.

pub mod account;
pub mod ai;
pub mod attendance;
pub mod audit;
pub mod dashboard;
pub mod leave;
