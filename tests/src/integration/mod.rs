//! Cross-subsystem integration flows.

pub mod exchange_flows;
pub mod verification_flows;
