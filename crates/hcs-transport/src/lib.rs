//! Read transports for the HCS object layer.
//!
//! Topic metadata and message history can be read two ways:
//! - [`StreamingTransport`] subscribes directly to consensus nodes
//! - [`RestTransport`] pages through a mirror node's REST API
//!
//! Both normalize into the same [`hcs_types::TopicInfo`] and
//! [`hcs_types::TopicMessage`] values. [`select_transport`] picks one once,
//! from whether the runtime supports direct queries.

pub mod error;
pub mod rest;
pub mod select;
pub mod streaming;
pub mod traits;

pub use error::{TransportError, TransportResult};
pub use rest::{RestConfig, RestTransport};
pub use select::select_transport;
pub use streaming::StreamingTransport;
pub use traits::{MessageQuery, ReadTransport, TransportKind};
