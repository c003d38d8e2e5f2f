//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed [`HttpTransport`](crate::domain::ports::HttpTransport)
//! - **storage**: file-backed [`KeyValueStore`](crate::domain::ports::KeyValueStore)
//!   holding the persisted credential slot
//!
//! Adapters translate between domain types and wire or disk formats. They
//! contain no pipeline logic.

pub mod http;
pub mod storage;
