//! Client-side access to the RabbitMQ management HTTP API.
//!
//! [`ManagementApi`] is the seam the collector talks to; it is a trait so the
//! cycle logic can be driven by an in-memory broker in tests.
//! [`HttpManagementClient`] is the production implementation over reqwest.
//!
//! Responses are decoded into the typed [`Snapshot`] model, where every
//! statistic the broker may omit (version dependent) is an `Option`.

pub mod api;
pub mod error;
pub mod http;
pub mod snapshot;

pub use api::{fetch_snapshot, ManagementApi};
pub use error::{ClientError, ClientResult};
pub use http::{HttpManagementClient, ManagementEndpoint};
pub use snapshot::{
    Connection, CountedStat, MessageStats, Node, ObjectTotals, Overview, PeekedMessage, Queue,
    QueueTotals, RateDetails, Snapshot,
};
