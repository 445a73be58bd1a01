//! Room Access Gateway: typed data model, error taxonomy and HTTP client
//! for the chat platform's room-administration API.
//!
//! The [`RoomGateway`] trait is the seam the reconciliation engine is built
//! against; [`AdminApiClient`] is the production implementation.

pub mod client;
pub mod error;
pub mod gateway;
pub mod types;

pub use client::AdminApiClient;
pub use error::{GatewayError, ReasonCode};
pub use gateway::RoomGateway;
pub use types::{
    BotIdentity, RoomAttributes, RoomDetail, RoomSystemInfo, StreamFilter, StreamOrigin,
    StreamPage, StreamPrivacy, StreamScope, StreamStatus, StreamSummary,
    StreamSummaryAttributes, StreamTypeFilter,
};
