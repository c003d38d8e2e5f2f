//! Inbound adapters that translate operator input into domain calls.
//!
//! The command-line console lives under [`cli`]; it depends only on the
//! domain and receives its driven adapters from the binary.

pub mod cli;
