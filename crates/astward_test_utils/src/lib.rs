//! Astward Test Utilities
//!
//! In-process doubles for exercising the client stack without a network.
//!
//! # Usage
//!
//! ```rust,ignore
//! use astward_protocol::ProtocolVersion;
//! use astward_test_utils::{FakeServer, LogCapture};
//!
//! let server = FakeServer::new(ProtocolVersion::V41);
//! server.set_catalog(vec![("sqli", Some(0x4))]);
//! // hand `Arc::new(server.clone())` to the client as its transport,
//! // then inspect `server.projects()` and `server.requests()`
//! ```

pub mod logs;
pub mod server;

pub use logs::LogCapture;
pub use server::{
    FakePolicy, FakeProject, FakeScanResult, FakeServer, FakeSettings, FakeStage, Failure,
};
