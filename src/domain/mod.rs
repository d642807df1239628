//! Domain layer: ledger types, the fee rule, and the ports the engine drives.

pub mod account;
pub mod fee;
pub mod ports;
pub mod transaction;
