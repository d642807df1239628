//! CSV adapters for the command-line boundary.

pub mod account_reader;
pub mod balance_writer;
pub mod command_reader;
