//! The reconciliation engine: one room, one desired-settings record, one
//! outcome, with bounded permission recovery around the update call.

use tokio::sync::watch;

use roomctl_core::normalize_stream_id;
use roomctl_gateway::{
    BotIdentity, GatewayError, ReasonCode, RoomAttributes, RoomDetail, RoomGateway,
};

use crate::fields::{
    is_modified, SKIP_REASON_UNCHANGED, STATUS_FAILURE, STATUS_SKIPPED, STATUS_SUCCESS,
};

#[derive(Debug, Clone, PartialEq)]
/// Result of one reconciliation attempt. Created per room, consumed by the
/// bulk driver for aggregation, never persisted beyond the run.
pub enum UpdateOutcome {
    Updated(RoomDetail),
    Skipped { detail: RoomDetail, reason: String },
    Failed { reason: String },
}

impl UpdateOutcome {
    /// Status label used in CSV result columns.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Updated(_) => STATUS_SUCCESS,
            Self::Skipped { .. } => STATUS_SKIPPED,
            Self::Failed { .. } => STATUS_FAILURE,
        }
    }

    /// Reason for skip/failure outcomes; successes carry none.
    pub fn report_reason(&self) -> Option<&str> {
        match self {
            Self::Updated(_) => None,
            Self::Skipped { reason, .. } | Self::Failed { reason } => Some(reason),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

// Recovery progresses strictly forward: a direct update, then a promoted
// retry, then a join-promote retry. Dispatch is keyed on the normalized
// reason code of the previous failure, never on error nesting.
enum RecoveryStage {
    Direct,
    PromoteRetry,
    JoinPromoteRetry,
}

/// Elevation acquired for one room while completing an update. Tracked as an
/// explicit value so the success path releases exactly what was taken; a
/// failed retry after elevation intentionally leaves it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Elevation {
    joined: bool,
    promoted: bool,
}

/// Applies desired settings to rooms, elevating the bot around the update
/// call when ownership or membership is missing and restoring the bot's
/// original relationship with the room afterwards.
pub struct RoomReconciler<G> {
    gateway: G,
    bot: BotIdentity,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<G: RoomGateway> RoomReconciler<G> {
    /// Fetches the acting bot's identity and builds the engine around it.
    pub async fn connect(gateway: G) -> Result<Self, GatewayError> {
        let bot = gateway.session_identity().await?;
        tracing::info!(bot_id = bot.id, username = %bot.username, "room reconciler ready");
        Ok(Self {
            gateway,
            bot,
            shutdown: None,
        })
    }

    /// Installs a cooperative interrupt signal checked between rooms.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn bot(&self) -> &BotIdentity {
        &self.bot
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub(crate) fn interrupted(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|signal| *signal.borrow())
            .unwrap_or(false)
    }

    /// Reconciles one room against `desired`.
    ///
    /// With `pre_check` the current state is fetched first and an unchanged
    /// room is skipped without a write, so repeating a reconciliation with
    /// identical settings never issues a second update call.
    pub async fn reconcile(
        &self,
        stream_id: &str,
        desired: &RoomAttributes,
        pre_check: bool,
    ) -> UpdateOutcome {
        let stream_id = normalize_stream_id(stream_id);
        match self.try_reconcile(&stream_id, desired, pre_check).await {
            Ok(outcome) => outcome,
            Err(error) => UpdateOutcome::Failed {
                reason: error.reason_text(),
            },
        }
    }

    async fn try_reconcile(
        &self,
        stream_id: &str,
        desired: &RoomAttributes,
        pre_check: bool,
    ) -> Result<UpdateOutcome, GatewayError> {
        if pre_check {
            let current = self.gateway.room_detail(stream_id).await?;
            if !is_modified(&current.room_attributes, desired) {
                tracing::info!(stream_id, "current room settings match, skipping");
                return Ok(UpdateOutcome::Skipped {
                    detail: current,
                    reason: SKIP_REASON_UNCHANGED.to_string(),
                });
            }
        }

        let mut stage = RecoveryStage::Direct;
        loop {
            stage = match stage {
                RecoveryStage::Direct => {
                    match self.gateway.apply_settings(stream_id, desired).await {
                        Ok(detail) => {
                            tracing::info!(stream_id, "room updated");
                            return Ok(UpdateOutcome::Updated(detail));
                        }
                        Err(error)
                            if error.permission_reason() == Some(ReasonCode::NotRoomOwner) =>
                        {
                            tracing::debug!(stream_id, "bot is not an owner, attempting promotion");
                            RecoveryStage::PromoteRetry
                        }
                        Err(error) => return Err(self.log_terminal(stream_id, error)),
                    }
                }
                RecoveryStage::PromoteRetry => {
                    match self.gateway.promote_owner(self.bot.id, stream_id).await {
                        Ok(()) => {
                            tracing::debug!(stream_id, "bot promoted to owner");
                            let detail = self
                                .apply_elevated(
                                    stream_id,
                                    desired,
                                    Elevation {
                                        joined: false,
                                        promoted: true,
                                    },
                                )
                                .await?;
                            return Ok(UpdateOutcome::Updated(detail));
                        }
                        Err(error)
                            if error.permission_reason() == Some(ReasonCode::NotRoomMember) =>
                        {
                            tracing::debug!(stream_id, "bot is not a member, joining first");
                            RecoveryStage::JoinPromoteRetry
                        }
                        Err(error) => return Err(self.log_terminal(stream_id, error)),
                    }
                }
                RecoveryStage::JoinPromoteRetry => {
                    self.join_room(stream_id).await?;
                    match self.gateway.promote_owner(self.bot.id, stream_id).await {
                        Ok(()) => tracing::debug!(stream_id, "bot promoted to owner"),
                        Err(error) => return Err(self.log_terminal(stream_id, error)),
                    }
                    let detail = self
                        .apply_elevated(
                            stream_id,
                            desired,
                            Elevation {
                                joined: true,
                                promoted: true,
                            },
                        )
                        .await?;
                    return Ok(UpdateOutcome::Updated(detail));
                }
            };
        }
    }

    /// Retries the update while elevated, then restores the bot's original
    /// relationship with the room. A failure of the retried update leaves
    /// the elevation in place and surfaces the failure unchanged.
    async fn apply_elevated(
        &self,
        stream_id: &str,
        desired: &RoomAttributes,
        elevation: Elevation,
    ) -> Result<RoomDetail, GatewayError> {
        let detail = match self.gateway.apply_settings(stream_id, desired).await {
            Ok(detail) => detail,
            Err(error) => return Err(self.log_terminal(stream_id, error)),
        };
        tracing::info!(stream_id, "room updated after elevation");
        self.release_elevation(stream_id, elevation).await?;
        Ok(detail)
    }

    async fn join_room(&self, stream_id: &str) -> Result<(), GatewayError> {
        match self.gateway.add_member(self.bot.id, stream_id).await {
            Ok(()) => {
                tracing::debug!(stream_id, "bot added to room");
                Ok(())
            }
            Err(error)
                if error.permission_reason() == Some(ReasonCode::MultilateralJoinForbidden) =>
            {
                // The surrounding update will still fail; the missing
                // entitlement is what the operator needs to act on.
                tracing::error!(
                    stream_id,
                    bot_id = self.bot.id,
                    "bot may not join multilateral rooms, enable the entitlement for this account"
                );
                Ok(())
            }
            Err(error) => Err(self.log_terminal(stream_id, error)),
        }
    }

    /// Releases elevation in reverse order of acquisition. Leaving the room
    /// also drops ownership, so a joined bot only needs removal; demotion
    /// blocked because the bot became the sole owner is expected and logged.
    async fn release_elevation(
        &self,
        stream_id: &str,
        elevation: Elevation,
    ) -> Result<(), GatewayError> {
        if elevation.joined {
            self.gateway.remove_member(self.bot.id, stream_id).await?;
            tracing::debug!(stream_id, "bot removed from room");
            return Ok(());
        }
        if elevation.promoted {
            match self.gateway.demote_owner(self.bot.id, stream_id).await {
                Ok(()) => tracing::debug!(stream_id, "bot demoted from owner"),
                Err(error)
                    if error.permission_reason() == Some(ReasonCode::LastOwnerDemotion) =>
                {
                    tracing::error!(
                        stream_id,
                        bot_id = self.bot.id,
                        "bot is the only owner, leaving ownership in place"
                    );
                }
                Err(error) => return Err(self.log_terminal(stream_id, error)),
            }
        }
        Ok(())
    }

    fn log_terminal(&self, stream_id: &str, error: GatewayError) -> GatewayError {
        tracing::error!(stream_id, reason = %error.reason_text(), "unable to update room");
        error
    }
}
