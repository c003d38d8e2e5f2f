//! Typed client and command-line console for the chatbot management platform.
//!
//! The crate is laid out hexagonally: [`domain`] holds the request pipeline
//! and its ports, [`outbound`] provides the reqwest transport and the
//! credential file store, and [`inbound`] exposes the pipeline as a CLI.

pub mod config;
pub mod domain;
pub mod inbound;
pub mod outbound;

pub use config::ConsoleSettings;
