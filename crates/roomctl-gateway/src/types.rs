//! Wire types for the room-administration API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Room settings, both as a desired-change record and as the attribute half
/// of a fetched room. Absent fields mean "leave unchanged" on writes.
pub struct RoomAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members_can_invite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discoverable: Option<bool>,
    // One-directional on the remote side: once true it cannot go back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy_protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_history: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned_message_id: Option<String>,

    // Read-only attributes the API returns but never accepts on update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_pod: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi_lateral_room: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
}

impl RoomAttributes {
    /// True when no modifiable field is present.
    pub fn is_empty_update(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.members_can_invite.is_none()
            && self.discoverable.is_none()
            && self.copy_protected.is_none()
            && self.view_history.is_none()
            && self.pinned_message_id.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// System metadata for a room. Read-only context, never written back.
pub struct RoomSystemInfo {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_user_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Full room state as returned by the detail and update endpoints.
pub struct RoomDetail {
    pub room_attributes: RoomAttributes,
    pub room_system_info: RoomSystemInfo,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Room activity status filter value.
pub enum StreamStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Whether the room was created inside the operator's own organization.
pub enum StreamOrigin {
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Membership visibility classification of a room.
pub enum StreamScope {
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
/// Public/private classification of a room.
pub enum StreamPrivacy {
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Stream-type entry inside a [`StreamFilter`]; the tooling only ever asks
/// for rooms.
pub struct StreamTypeFilter {
    #[serde(rename = "type")]
    pub kind: String,
}

impl StreamTypeFilter {
    pub fn room() -> Self {
        Self {
            kind: "ROOM".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Admin stream-list filter.
pub struct StreamFilter {
    pub stream_types: Vec<StreamTypeFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StreamStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<StreamOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<StreamScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy: Option<StreamPrivacy>,
}

impl Default for StreamFilter {
    fn default() -> Self {
        Self::rooms()
    }
}

impl StreamFilter {
    /// Filter matching every room regardless of state.
    pub fn rooms() -> Self {
        Self {
            stream_types: vec![StreamTypeFilter::room()],
            status: None,
            origin: None,
            scope: None,
            privacy: None,
        }
    }

    /// Filter matching only rooms the bot can actually modify: active rooms
    /// created inside the operator's own organization.
    pub fn modifiable_rooms() -> Self {
        Self {
            status: Some(StreamStatus::Active),
            origin: Some(StreamOrigin::Internal),
            ..Self::rooms()
        }
    }

    /// Narrows an arbitrary filter to the modifiable subset while keeping
    /// its scope/privacy selection.
    pub fn into_modifiable(mut self) -> Self {
        self.stream_types = vec![StreamTypeFilter::room()];
        self.status = Some(StreamStatus::Active);
        self.origin = Some(StreamOrigin::Internal);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// Attributes carried on a stream-list entry.
pub struct StreamSummaryAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// One entry of an admin stream-list page.
pub struct StreamSummary {
    pub id: String,
    #[serde(default)]
    pub attributes: StreamSummaryAttributes,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
/// One page of the admin stream-list endpoint. The listing is a forward-only
/// traversal: pages are fetched on demand and never revisited.
pub struct StreamPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default)]
    pub streams: Vec<StreamSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
/// The acting bot account, fetched once per session.
pub struct BotIdentity {
    pub id: u64,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_room_attributes_serializes_only_present_fields() {
        let attrs = RoomAttributes {
            members_can_invite: Some(false),
            ..Default::default()
        };
        let encoded = serde_json::to_value(&attrs).expect("encode");
        assert_eq!(
            encoded,
            serde_json::json!({ "membersCanInvite": false })
        );
    }

    #[test]
    fn unit_stream_filter_encodes_screaming_case_values() {
        let filter = StreamFilter::modifiable_rooms();
        let encoded = serde_json::to_value(&filter).expect("encode");
        assert_eq!(
            encoded,
            serde_json::json!({
                "streamTypes": [{ "type": "ROOM" }],
                "status": "ACTIVE",
                "origin": "INTERNAL",
            })
        );
    }

    #[test]
    fn unit_into_modifiable_keeps_scope_and_privacy() {
        let filter = StreamFilter {
            scope: Some(StreamScope::External),
            privacy: Some(StreamPrivacy::Private),
            status: Some(StreamStatus::Inactive),
            ..StreamFilter::rooms()
        }
        .into_modifiable();
        assert_eq!(filter.status, Some(StreamStatus::Active));
        assert_eq!(filter.origin, Some(StreamOrigin::Internal));
        assert_eq!(filter.scope, Some(StreamScope::External));
        assert_eq!(filter.privacy, Some(StreamPrivacy::Private));
    }

    #[test]
    fn unit_room_detail_decodes_camel_case_payload() {
        let detail: RoomDetail = serde_json::from_value(serde_json::json!({
            "roomAttributes": {
                "name": "ops",
                "membersCanInvite": true,
                "multiLateralRoom": false,
            },
            "roomSystemInfo": {
                "id": "abc",
                "creationDate": 1_690_000_000_000_u64,
                "createdByUserId": 42,
                "active": true,
            },
        }))
        .expect("decode");
        assert_eq!(detail.room_system_info.id, "abc");
        assert_eq!(detail.room_attributes.members_can_invite, Some(true));
        assert_eq!(detail.room_attributes.multi_lateral_room, Some(false));
    }
}
