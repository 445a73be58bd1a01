//! Trait contract the reconciliation engine consumes.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{BotIdentity, RoomAttributes, RoomDetail, StreamFilter, StreamPage};

#[async_trait]
/// Thin facade over the remote room-administration API.
///
/// Every call can fail with a [`GatewayError`] carrying a machine-readable
/// reason; the engine drives its recovery decisions off those reasons, not
/// off transport details.
pub trait RoomGateway: Send + Sync {
    /// Identity of the acting bot account. Called once at engine construction.
    async fn session_identity(&self) -> Result<BotIdentity, GatewayError>;

    /// One page of rooms matching `filter`, starting at `skip`.
    async fn list_rooms(
        &self,
        filter: &StreamFilter,
        skip: u64,
        limit: u64,
    ) -> Result<StreamPage, GatewayError>;

    /// Full current state of one room.
    async fn room_detail(&self, stream_id: &str) -> Result<RoomDetail, GatewayError>;

    /// Applies the present fields of `attributes` to the room and returns
    /// the resulting state.
    async fn apply_settings(
        &self,
        stream_id: &str,
        attributes: &RoomAttributes,
    ) -> Result<RoomDetail, GatewayError>;

    async fn add_member(&self, user_id: u64, stream_id: &str) -> Result<(), GatewayError>;

    async fn remove_member(&self, user_id: u64, stream_id: &str) -> Result<(), GatewayError>;

    async fn promote_owner(&self, user_id: u64, stream_id: &str) -> Result<(), GatewayError>;

    async fn demote_owner(&self, user_id: u64, stream_id: &str) -> Result<(), GatewayError>;
}
