//! Bulk driver: feeds sequences of rooms through the reconciler without
//! letting one room's failure abort the batch.

use roomctl_gateway::{GatewayError, RoomAttributes, RoomGateway, StreamFilter, StreamSummary};

use crate::reconcile::{RoomReconciler, UpdateOutcome};

/// Page size for the admin stream-list traversal.
pub const LIST_PAGE_LIMIT: u64 = 100;

impl<G: RoomGateway> RoomReconciler<G> {
    /// Reconciles every identifier in order, one room at a time. A room's
    /// failure is recorded as a `Failed` outcome and the batch continues;
    /// an interrupt signal ends the batch between rooms.
    pub async fn update_many<I>(
        &self,
        stream_ids: I,
        desired: &RoomAttributes,
        pre_check: bool,
    ) -> Vec<UpdateOutcome>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut outcomes = Vec::new();
        for stream_id in stream_ids {
            let stream_id = stream_id.as_ref();
            if self.interrupted() {
                tracing::warn!("interrupt received, ending batch early");
                break;
            }
            tracing::info!(stream_id, "updating room");
            outcomes.push(self.reconcile(stream_id, desired, pre_check).await);
        }
        outcomes
    }

    /// Reconciles rooms previously listed from the gateway.
    pub async fn update_rooms(
        &self,
        streams: &[StreamSummary],
        desired: &RoomAttributes,
        pre_check: bool,
    ) -> Vec<UpdateOutcome> {
        let mut outcomes = Vec::new();
        for stream in streams {
            if self.interrupted() {
                tracing::warn!("interrupt received, ending batch early");
                break;
            }
            tracing::info!(
                stream_id = %stream.id,
                room_name = stream.attributes.room_name.as_deref().unwrap_or(""),
                "updating room"
            );
            outcomes.push(self.reconcile(&stream.id, desired, pre_check).await);
        }
        outcomes
    }

    /// Updates every room matching `filter`, narrowed to the modifiable
    /// subset (active rooms of internal origin). Only those can actually be
    /// written; use [`Self::update_rooms_by_filter_override`] to try others.
    pub async fn update_rooms_by_filter(
        &self,
        filter: StreamFilter,
        desired: &RoomAttributes,
        pre_check: bool,
    ) -> Result<Vec<UpdateOutcome>, GatewayError> {
        self.update_rooms_matching(&filter.into_modifiable(), desired, pre_check)
            .await
    }

    /// Updates every room matching `filter` exactly as given. Rooms outside
    /// the modifiable subset are expected to fail remotely.
    pub async fn update_rooms_by_filter_override(
        &self,
        filter: StreamFilter,
        desired: &RoomAttributes,
        pre_check: bool,
    ) -> Result<Vec<UpdateOutcome>, GatewayError> {
        self.update_rooms_matching(&filter, desired, pre_check).await
    }

    /// Updates all modifiable rooms.
    pub async fn update_all_rooms(
        &self,
        desired: &RoomAttributes,
        pre_check: bool,
    ) -> Result<Vec<UpdateOutcome>, GatewayError> {
        self.update_rooms_matching(&StreamFilter::modifiable_rooms(), desired, pre_check)
            .await
    }

    // Lazy forward-only page walk: each page is fetched on demand and rooms
    // are reconciled as they arrive. A listing failure aborts the batch; a
    // room failure does not.
    async fn update_rooms_matching(
        &self,
        filter: &StreamFilter,
        desired: &RoomAttributes,
        pre_check: bool,
    ) -> Result<Vec<UpdateOutcome>, GatewayError> {
        let mut outcomes = Vec::new();
        let mut skip = 0_u64;
        'pages: loop {
            let page = self.gateway().list_rooms(filter, skip, LIST_PAGE_LIMIT).await?;
            if page.streams.is_empty() {
                break;
            }
            let fetched = page.streams.len() as u64;
            for stream in &page.streams {
                if self.interrupted() {
                    tracing::warn!("interrupt received, ending batch early");
                    break 'pages;
                }
                tracing::info!(
                    stream_id = %stream.id,
                    room_name = stream.attributes.room_name.as_deref().unwrap_or(""),
                    "updating room"
                );
                outcomes.push(self.reconcile(&stream.id, desired, pre_check).await);
            }
            if fetched < LIST_PAGE_LIMIT {
                break;
            }
            skip += fetched;
        }
        Ok(outcomes)
    }
}
