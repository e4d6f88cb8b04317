//! Mock Provider Servers
//!
//! Local stand-ins for remote endpoints so integration tests never leave
//! the machine.

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod realtime_mock;

pub use realtime_mock::{Handshake, RealtimeMock, Script, Step};
