//! Error taxonomy for admin-API calls.
//!
//! The remote API reports every denial as a structured JSON body carrying a
//! human-readable `message`. Recovery decisions in the engine key off the
//! message, so known messages are normalized into [`ReasonCode`] values here
//! and everything unrecognized stays [`ReasonCode::Other`].

use serde::Deserialize;
use thiserror::Error;

use roomctl_core::single_line;

/// Remote message sent when the acting user does not own the room.
pub const MSG_NOT_ROOM_OWNER: &str = "Only room owners can perform this action.";
/// Remote message sent when the acting user may not join multilateral rooms.
pub const MSG_MULTILATERAL_JOIN_FORBIDDEN: &str =
    "This person is not permitted to join multilateral rooms.";
/// Remote message sent when demotion would leave the room without an owner.
pub const MSG_LAST_OWNER_DEMOTION: &str = "Unable to demote last owner of the chatroom.";
/// Remote message sent when the acting user may not own public rooms.
pub const MSG_PUBLIC_ROOM_OWNER_NOT_ENTITLED: &str =
    "User is not entitled to be a public room owner";

// The membership message embeds the failing user's numeric id, so matching
// is on the stable prefix/suffix shape: "User {id} is not a member of the room".
const NOT_ROOM_MEMBER_PREFIX: &str = "User ";
const NOT_ROOM_MEMBER_SUFFIX: &str = "is not a member of the room";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Machine-readable classification of a remote denial message.
pub enum ReasonCode {
    NotRoomMember,
    NotRoomOwner,
    MultilateralJoinForbidden,
    LastOwnerDemotion,
    PublicRoomOwnerNotEntitled,
    Other,
}

impl ReasonCode {
    /// Classifies a raw remote error message.
    pub fn from_message(message: &str) -> Self {
        let message = message.trim();
        if message == MSG_NOT_ROOM_OWNER {
            Self::NotRoomOwner
        } else if message == MSG_MULTILATERAL_JOIN_FORBIDDEN {
            Self::MultilateralJoinForbidden
        } else if message == MSG_LAST_OWNER_DEMOTION {
            Self::LastOwnerDemotion
        } else if message == MSG_PUBLIC_ROOM_OWNER_NOT_ENTITLED {
            Self::PublicRoomOwnerNotEntitled
        } else if message.starts_with(NOT_ROOM_MEMBER_PREFIX)
            && message.ends_with(NOT_ROOM_MEMBER_SUFFIX)
        {
            Self::NotRoomMember
        } else {
            Self::Other
        }
    }

    /// Stable label used in tracing fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRoomMember => "not_room_member",
            Self::NotRoomOwner => "not_room_owner",
            Self::MultilateralJoinForbidden => "multilateral_join_forbidden",
            Self::LastOwnerDemotion => "last_owner_demotion",
            Self::PublicRoomOwnerNotEntitled => "public_room_owner_not_entitled",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Error)]
/// Failure surface for every gateway call.
pub enum GatewayError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {message}")]
    Permission { reason: ReasonCode, message: String },
    #[error("admin api error (status {status}): {message}")]
    Remote { status: u16, message: String },
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("validation error: {0}")]
    Validation(String),
}

impl GatewayError {
    /// Permission reason when this error is a classified denial.
    pub fn permission_reason(&self) -> Option<ReasonCode> {
        match self {
            Self::Permission { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Human-readable reason suitable for per-room reports.
    pub fn reason_text(&self) -> String {
        match self {
            Self::Permission { message, .. } => message.clone(),
            Self::Remote { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    message: Option<String>,
}

/// Turns a non-success response into the matching [`GatewayError`].
///
/// `resource` names what was being addressed (usually the stream id) so
/// `NotFound` errors stay attributable.
pub(crate) fn classify_remote_error(status: u16, body: &str, resource: &str) -> GatewayError {
    let message = serde_json::from_str::<RemoteErrorBody>(body)
        .ok()
        .and_then(|decoded| decoded.message)
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());

    if let Some(message) = &message {
        let reason = ReasonCode::from_message(message);
        if reason != ReasonCode::Other {
            return GatewayError::Permission {
                reason,
                message: message.clone(),
            };
        }
    }
    if status == 404 {
        return GatewayError::NotFound(resource.to_string());
    }
    GatewayError::Remote {
        status,
        message: message.unwrap_or_else(|| truncate_for_error(body, 320)),
    }
}

fn truncate_for_error(body: &str, max_chars: usize) -> String {
    let flattened = single_line(body);
    if flattened.chars().count() <= max_chars {
        return flattened;
    }
    let truncated: String = flattened.chars().take(max_chars).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_reason_code_classifies_known_messages() {
        assert_eq!(
            ReasonCode::from_message(MSG_NOT_ROOM_OWNER),
            ReasonCode::NotRoomOwner
        );
        assert_eq!(
            ReasonCode::from_message(MSG_MULTILATERAL_JOIN_FORBIDDEN),
            ReasonCode::MultilateralJoinForbidden
        );
        assert_eq!(
            ReasonCode::from_message(MSG_LAST_OWNER_DEMOTION),
            ReasonCode::LastOwnerDemotion
        );
        assert_eq!(
            ReasonCode::from_message(MSG_PUBLIC_ROOM_OWNER_NOT_ENTITLED),
            ReasonCode::PublicRoomOwnerNotEntitled
        );
    }

    #[test]
    fn unit_reason_code_matches_member_message_with_embedded_id() {
        assert_eq!(
            ReasonCode::from_message("User 349026222344891 is not a member of the room"),
            ReasonCode::NotRoomMember
        );
    }

    #[test]
    fn unit_reason_code_unknown_messages_stay_other() {
        assert_eq!(ReasonCode::from_message("quota exceeded"), ReasonCode::Other);
        assert_eq!(ReasonCode::from_message(""), ReasonCode::Other);
    }

    #[test]
    fn unit_classify_remote_error_prefers_permission_over_status() {
        let body = format!("{{\"code\":403,\"message\":\"{MSG_NOT_ROOM_OWNER}\"}}");
        let error = classify_remote_error(403, &body, "abc");
        assert_eq!(error.permission_reason(), Some(ReasonCode::NotRoomOwner));
        assert_eq!(error.reason_text(), MSG_NOT_ROOM_OWNER);
    }

    #[test]
    fn unit_classify_remote_error_maps_404_to_not_found() {
        let error = classify_remote_error(404, "{\"message\":\"No stream found\"}", "abc");
        assert!(matches!(error, GatewayError::NotFound(resource) if resource == "abc"));
    }

    #[test]
    fn unit_classify_remote_error_falls_back_to_body_text() {
        let error = classify_remote_error(500, "upstream exploded", "abc");
        match error {
            GatewayError::Remote { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
