//! Application layer containing the core business logic orchestration.
//!
//! Command vectors are decoded by `codec`, resolved through the `dispatch`
//! table into typed `request`s, and executed by the `PainEngine`.

pub mod codec;
pub mod dispatch;
pub mod engine;
pub mod request;
