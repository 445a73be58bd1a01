//! Reqwest-backed implementation of [`RoomGateway`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use roomctl_core::normalize_stream_id;

use crate::error::{classify_remote_error, GatewayError};
use crate::gateway::RoomGateway;
use crate::types::{BotIdentity, RoomAttributes, RoomDetail, StreamFilter, StreamPage};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

#[derive(Clone)]
/// HTTP client for the room-administration API, authenticated with the
/// session token of a service account that has user-provisioning rights.
pub struct AdminApiClient {
    http: reqwest::Client,
    api_base: String,
    session_token: String,
}

impl AdminApiClient {
    pub fn new(
        api_base: String,
        session_token: String,
        request_timeout_ms: Option<u64>,
    ) -> Result<Self, GatewayError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("roomctl-admin-bot"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let timeout_ms = request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS).max(1);
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            session_token: session_token.trim().to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: String,
        resource: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .http
            .get(url)
            .header("sessionToken", &self.session_token)
            .send()
            .await?;
        self.decode_response(operation, resource, response).await
    }

    async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        operation: &str,
        url: String,
        body: &B,
        resource: &str,
    ) -> Result<T, GatewayError> {
        let response = self
            .http
            .post(url)
            .header("sessionToken", &self.session_token)
            .json(body)
            .send()
            .await?;
        self.decode_response(operation, resource, response).await
    }

    /// Membership calls return an acknowledgement body the tooling ignores.
    async fn post_ack<B: Serialize + ?Sized>(
        &self,
        operation: &str,
        url: String,
        body: &B,
        resource: &str,
    ) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(url)
            .header("sessionToken", &self.session_token)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(operation, stream_id = resource, "admin api call succeeded");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_remote_error(status.as_u16(), &body, resource))
    }

    async fn decode_response<T: DeserializeOwned>(
        &self,
        operation: &str,
        resource: &str,
        response: reqwest::Response,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if status.is_success() {
            tracing::debug!(operation, stream_id = resource, "admin api call succeeded");
            let body = response.text().await?;
            return serde_json::from_str(&body).map_err(GatewayError::Decode);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_remote_error(status.as_u16(), &body, resource))
    }

    fn membership_url(&self, stream_id: &str, action: &str) -> String {
        format!(
            "{}/pod/v1/room/{}/membership/{}",
            self.api_base, stream_id, action
        )
    }
}

#[async_trait]
impl RoomGateway for AdminApiClient {
    async fn session_identity(&self) -> Result<BotIdentity, GatewayError> {
        self.get_json(
            "sessioninfo",
            format!("{}/pod/v2/sessioninfo", self.api_base),
            "session",
        )
        .await
    }

    async fn list_rooms(
        &self,
        filter: &StreamFilter,
        skip: u64,
        limit: u64,
    ) -> Result<StreamPage, GatewayError> {
        self.post_json(
            "admin streams list",
            format!(
                "{}/pod/v2/admin/streams/list?skip={}&limit={}",
                self.api_base, skip, limit
            ),
            filter,
            "stream list",
        )
        .await
    }

    async fn room_detail(&self, stream_id: &str) -> Result<RoomDetail, GatewayError> {
        let stream_id = normalize_stream_id(stream_id);
        self.get_json(
            "room info",
            format!("{}/pod/v3/room/{}/info", self.api_base, stream_id),
            &stream_id,
        )
        .await
    }

    async fn apply_settings(
        &self,
        stream_id: &str,
        attributes: &RoomAttributes,
    ) -> Result<RoomDetail, GatewayError> {
        let stream_id = normalize_stream_id(stream_id);
        self.post_json(
            "room update",
            format!("{}/pod/v3/room/{}/update", self.api_base, stream_id),
            attributes,
            &stream_id,
        )
        .await
    }

    async fn add_member(&self, user_id: u64, stream_id: &str) -> Result<(), GatewayError> {
        let stream_id = normalize_stream_id(stream_id);
        self.post_ack(
            "membership add",
            self.membership_url(&stream_id, "add"),
            &json!({ "id": user_id }),
            &stream_id,
        )
        .await
    }

    async fn remove_member(&self, user_id: u64, stream_id: &str) -> Result<(), GatewayError> {
        let stream_id = normalize_stream_id(stream_id);
        self.post_ack(
            "membership remove",
            self.membership_url(&stream_id, "remove"),
            &json!({ "id": user_id }),
            &stream_id,
        )
        .await
    }

    async fn promote_owner(&self, user_id: u64, stream_id: &str) -> Result<(), GatewayError> {
        let stream_id = normalize_stream_id(stream_id);
        self.post_ack(
            "membership promote",
            self.membership_url(&stream_id, "promoteOwner"),
            &json!({ "id": user_id }),
            &stream_id,
        )
        .await
    }

    async fn demote_owner(&self, user_id: u64, stream_id: &str) -> Result<(), GatewayError> {
        let stream_id = normalize_stream_id(stream_id);
        self.post_ack(
            "membership demote",
            self.membership_url(&stream_id, "demoteOwner"),
            &json!({ "id": user_id }),
            &stream_id,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::error::{ReasonCode, MSG_NOT_ROOM_OWNER};

    fn test_client(base_url: &str) -> AdminApiClient {
        AdminApiClient::new(base_url.to_string(), "session-token".to_string(), Some(2_000))
            .expect("client")
    }

    #[tokio::test]
    async fn functional_session_identity_fetches_bot_info() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/pod/v2/sessioninfo")
                .header("sessionToken", "session-token");
            then.status(200)
                .json_body(json!({ "id": 7_777, "username": "roomctl-bot" }));
        });

        let identity = test_client(&server.base_url())
            .session_identity()
            .await
            .expect("identity");
        mock.assert();
        assert_eq!(identity.id, 7_777);
        assert_eq!(identity.username, "roomctl-bot");
    }

    #[tokio::test]
    async fn functional_list_rooms_sends_filter_and_pagination() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/pod/v2/admin/streams/list")
                .query_param("skip", "0")
                .query_param("limit", "50")
                .json_body(json!({
                    "streamTypes": [{ "type": "ROOM" }],
                    "status": "ACTIVE",
                    "origin": "INTERNAL",
                }));
            then.status(200).json_body(json!({
                "count": 1,
                "skip": 0,
                "limit": 50,
                "streams": [{ "id": "abc", "attributes": { "roomName": "ops" } }],
            }));
        });

        let page = test_client(&server.base_url())
            .list_rooms(&StreamFilter::modifiable_rooms(), 0, 50)
            .await
            .expect("page");
        mock.assert();
        assert_eq!(page.streams.len(), 1);
        assert_eq!(page.streams[0].id, "abc");
        assert_eq!(page.streams[0].attributes.room_name.as_deref(), Some("ops"));
    }

    #[tokio::test]
    async fn functional_apply_settings_normalizes_id_and_decodes_detail() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/pod/v3/room/ab-c_d/update")
                .json_body(json!({ "discoverable": true }));
            then.status(200).json_body(json!({
                "roomAttributes": { "discoverable": true },
                "roomSystemInfo": { "id": "ab-c_d", "active": true },
            }));
        });

        let desired = RoomAttributes {
            discoverable: Some(true),
            ..Default::default()
        };
        let detail = test_client(&server.base_url())
            .apply_settings("ab+c/d==", &desired)
            .await
            .expect("detail");
        mock.assert();
        assert_eq!(detail.room_system_info.id, "ab-c_d");
        assert_eq!(detail.room_attributes.discoverable, Some(true));
    }

    #[tokio::test]
    async fn regression_owner_denial_is_classified_as_permission_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/pod/v3/room/abc/update");
            then.status(403)
                .json_body(json!({ "code": 403, "message": MSG_NOT_ROOM_OWNER }));
        });

        let desired = RoomAttributes {
            discoverable: Some(true),
            ..Default::default()
        };
        let error = test_client(&server.base_url())
            .apply_settings("abc", &desired)
            .await
            .expect_err("denied");
        assert_eq!(error.permission_reason(), Some(ReasonCode::NotRoomOwner));
    }

    #[tokio::test]
    async fn regression_missing_room_maps_to_not_found() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/pod/v3/room/gone/info");
            then.status(404)
                .json_body(json!({ "code": 404, "message": "No stream found" }));
        });

        let error = test_client(&server.base_url())
            .room_detail("gone")
            .await
            .expect_err("missing");
        assert!(matches!(error, GatewayError::NotFound(resource) if resource == "gone"));
    }

    #[tokio::test]
    async fn functional_membership_calls_post_bot_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/pod/v1/room/abc/membership/promoteOwner")
                .json_body(json!({ "id": 7_777 }));
            then.status(200)
                .json_body(json!({ "format": "TEXT", "message": "Member promoted to owner" }));
        });

        test_client(&server.base_url())
            .promote_owner(7_777, "abc")
            .await
            .expect("promoted");
        mock.assert();
    }
}
