//! Domain ports defining the edges of the hexagon.
//!
//! The request pipeline talks to two driven adapters: the HTTP transport and
//! the key-value storage holding the credential. Each trait exposes strongly
//! typed errors so adapters map their failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod http_transport;
mod key_value_store;

#[cfg(test)]
pub use http_transport::MockHttpTransport;
pub use http_transport::{HttpTransport, TransportError, TransportRequest, TransportResponse};
#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{InMemoryKeyValueStore, KeyValueStore, KeyValueStoreError};
