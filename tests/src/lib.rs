//! # Dataspace Exchange Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── verification_flows.rs   # DAT verification through inbound dispatch
//!     └── exchange_flows.rs       # Requests between connectors over the wire
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dx-tests
//! cargo test -p dx-tests integration::exchange_flows
//! ```

pub mod integration;
