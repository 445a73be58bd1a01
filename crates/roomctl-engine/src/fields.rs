//! Field descriptors shared by the modification predicate, the CSV column
//! mapping and the CLI settings mapping.
//!
//! Each modifiable room setting is described by one [`FieldSpec`] whose
//! [`FieldKind`] carries the parse/validate behavior for that column. This
//! is a closed set: adding a setting means adding one table entry.

use roomctl_core::{normalize_stream_id, parse_bool_cell};
use roomctl_gateway::{GatewayError, RoomAttributes, RoomDetail};

/// Mandatory identifier column of every CSV row.
pub const COL_STREAM_ID: &str = "streamId";
/// Result column appended to CSV output rows.
pub const COL_STATUS: &str = "status";
/// Result column appended to CSV output rows; empty for successes.
pub const COL_REASON: &str = "reason";
/// Suffix marking exported columns that cannot be written back.
pub const NON_MODIFIABLE_SUFFIX: &str = " (X)";

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const STATUS_SKIPPED: &str = "SKIPPED";
pub const STATUS_FAILURE: &str = "FAILURE";

/// Skip reason reported when the pre-check found nothing to change.
pub const SKIP_REASON_UNCHANGED: &str = "Current room settings matched";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Modifiable room settings addressable from CSV columns and CLI flags.
pub enum RoomField {
    Name,
    Description,
    MembersCanInvite,
    Discoverable,
    CopyProtected,
    ViewHistory,
    PinnedMessageId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Parse/validate strategy for one field.
pub enum FieldKind {
    /// Plain two-way boolean.
    Bool,
    /// Boolean that can only ever be switched on; `false` input is dropped
    /// with a warning because the remote side cannot clear it.
    OneWayBool,
    /// Free-form string; the explicit-empty spelling clears it.
    PlainString,
    /// String that must not be cleared; explicit-empty input is dropped.
    RequiredString,
    /// Identifier string normalized to its URL-safe form before use.
    EncodedString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One column of the modifiable-settings table.
pub struct FieldSpec {
    pub column: &'static str,
    pub field: RoomField,
    pub kind: FieldKind,
}

/// Modifiable columns in canonical CSV order (after `streamId`).
pub const MODIFIABLE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        column: "name",
        field: RoomField::Name,
        kind: FieldKind::RequiredString,
    },
    FieldSpec {
        column: "description",
        field: RoomField::Description,
        kind: FieldKind::PlainString,
    },
    FieldSpec {
        column: "membersCanInvite",
        field: RoomField::MembersCanInvite,
        kind: FieldKind::Bool,
    },
    FieldSpec {
        column: "discoverable",
        field: RoomField::Discoverable,
        kind: FieldKind::Bool,
    },
    FieldSpec {
        column: "copyProtected",
        field: RoomField::CopyProtected,
        kind: FieldKind::OneWayBool,
    },
    FieldSpec {
        column: "viewHistory",
        field: RoomField::ViewHistory,
        kind: FieldKind::Bool,
    },
    FieldSpec {
        column: "pinnedMessageId",
        field: RoomField::PinnedMessageId,
        kind: FieldKind::EncodedString,
    },
];

/// Read-only columns included in extended exports, in canonical order.
pub const NON_MODIFIABLE_COLUMNS: &[&str] = &[
    "public",
    "readOnly",
    "crossPod",
    "multiLateralRoom",
    "active",
    "keywords",
    "createdByUserId",
    "creationDate",
];

#[derive(Debug, Clone, PartialEq)]
/// Parsed value of one cell, typed per [`FieldKind`].
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Text(_) => None,
        }
    }

    fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value.clone()),
            Self::Bool(_) => None,
        }
    }
}

impl RoomField {
    /// Writes a parsed value into the desired-settings record.
    pub fn assign(self, attrs: &mut RoomAttributes, value: &FieldValue) {
        match self {
            Self::Name => attrs.name = value.as_text(),
            Self::Description => attrs.description = value.as_text(),
            Self::MembersCanInvite => attrs.members_can_invite = value.as_bool(),
            Self::Discoverable => attrs.discoverable = value.as_bool(),
            Self::CopyProtected => attrs.copy_protected = value.as_bool(),
            Self::ViewHistory => attrs.view_history = value.as_bool(),
            Self::PinnedMessageId => attrs.pinned_message_id = value.as_text(),
        }
    }
}

enum CellValue {
    Unset,
    ExplicitEmpty,
    Text(String),
}

// Empty cell = leave unchanged; literal "" or '' = explicit empty string.
fn classify_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        CellValue::Unset
    } else if trimmed == "\"\"" || trimmed == "''" {
        CellValue::ExplicitEmpty
    } else {
        CellValue::Text(trimmed.to_string())
    }
}

/// Parses one cell according to its field descriptor. `Ok(None)` means the
/// field stays unchanged; malformed booleans are validation errors.
pub fn parse_cell(
    spec: &FieldSpec,
    raw: &str,
    stream_id: &str,
) -> Result<Option<FieldValue>, GatewayError> {
    let value = match classify_cell(raw) {
        CellValue::Unset => return Ok(None),
        CellValue::ExplicitEmpty => String::new(),
        CellValue::Text(text) => text,
    };
    match spec.kind {
        FieldKind::Bool | FieldKind::OneWayBool => {
            let parsed = parse_bool_cell(&value).map_err(|error| {
                GatewayError::Validation(format!("column {}: {error}", spec.column))
            })?;
            if spec.kind == FieldKind::OneWayBool && !parsed {
                tracing::warn!(
                    stream_id,
                    column = spec.column,
                    "setting can only be switched on, ignoring"
                );
                return Ok(None);
            }
            Ok(Some(FieldValue::Bool(parsed)))
        }
        FieldKind::RequiredString => {
            if value.is_empty() {
                tracing::warn!(
                    stream_id,
                    column = spec.column,
                    "column cannot be empty, ignoring"
                );
                return Ok(None);
            }
            Ok(Some(FieldValue::Text(value)))
        }
        FieldKind::PlainString => Ok(Some(FieldValue::Text(value))),
        FieldKind::EncodedString => Ok(Some(FieldValue::Text(normalize_stream_id(&value)))),
    }
}

/// Builds a desired-settings record from one CSV row. Columns outside the
/// modifiable table (including extended `" (X)"` columns) are ignored.
pub fn row_to_attributes(
    headers: &[String],
    cells: &[String],
    stream_id: &str,
) -> Result<RoomAttributes, GatewayError> {
    let mut attrs = RoomAttributes::default();
    for (header, cell) in headers.iter().zip(cells.iter()) {
        let Some(spec) = MODIFIABLE_FIELDS.iter().find(|spec| spec.column == header) else {
            continue;
        };
        if let Some(value) = parse_cell(spec, cell, stream_id)? {
            spec.field.assign(&mut attrs, &value);
        }
    }
    Ok(attrs)
}

fn differs<T: PartialEq>(current: &Option<T>, desired: &Option<T>) -> bool {
    matches!(desired, Some(value) if current.as_ref() != Some(value))
}

fn pinned_differs(current: &Option<String>, desired: &Option<String>) -> bool {
    match desired {
        None => false,
        Some(desired) => {
            let desired = normalize_stream_id(desired);
            match current {
                None => true,
                Some(current) => normalize_stream_id(current) != desired,
            }
        }
    }
}

/// The modification predicate: true iff at least one field present in
/// `desired` differs from `current`. Absent fields never trigger a
/// difference, so an all-absent record is never "modified".
pub fn is_modified(current: &RoomAttributes, desired: &RoomAttributes) -> bool {
    differs(&current.name, &desired.name)
        || differs(&current.description, &desired.description)
        || differs(&current.members_can_invite, &desired.members_can_invite)
        || differs(&current.discoverable, &desired.discoverable)
        || differs(&current.copy_protected, &desired.copy_protected)
        || differs(&current.view_history, &desired.view_history)
        || pinned_differs(&current.pinned_message_id, &desired.pinned_message_id)
}

/// CSV header row for exports.
pub fn export_headers(extended: bool) -> Vec<String> {
    let mut headers = vec![COL_STREAM_ID.to_string()];
    headers.extend(MODIFIABLE_FIELDS.iter().map(|spec| spec.column.to_string()));
    if extended {
        headers.extend(
            NON_MODIFIABLE_COLUMNS
                .iter()
                .map(|column| format!("{column}{NON_MODIFIABLE_SUFFIX}")),
        );
    }
    headers
}

fn bool_cell(value: Option<bool>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

fn text_cell(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Serializes one room into the export column order of [`export_headers`].
pub fn detail_to_csv_fields(detail: &RoomDetail, extended: bool) -> Vec<String> {
    let attrs = &detail.room_attributes;
    let system = &detail.room_system_info;
    let mut fields = vec![
        system.id.clone(),
        text_cell(&attrs.name),
        text_cell(&attrs.description),
        bool_cell(attrs.members_can_invite),
        bool_cell(attrs.discoverable),
        bool_cell(attrs.copy_protected),
        bool_cell(attrs.view_history),
        text_cell(&attrs.pinned_message_id),
    ];
    if extended {
        fields.push(bool_cell(attrs.public));
        fields.push(bool_cell(attrs.read_only));
        fields.push(bool_cell(attrs.cross_pod));
        fields.push(bool_cell(attrs.multi_lateral_room));
        fields.push(bool_cell(system.active));
        fields.push(
            attrs
                .keywords
                .as_ref()
                .map(|keywords| keywords.join(";"))
                .unwrap_or_default(),
        );
        fields.push(
            system
                .created_by_user_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
        );
        fields.push(
            system
                .creation_date
                .map(|date| date.to_string())
                .unwrap_or_default(),
        );
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(column: &str) -> &'static FieldSpec {
        MODIFIABLE_FIELDS
            .iter()
            .find(|spec| spec.column == column)
            .expect("known column")
    }

    #[test]
    fn unit_is_modified_all_absent_is_never_modified() {
        let current = RoomAttributes {
            name: Some("ops".to_string()),
            members_can_invite: Some(true),
            ..Default::default()
        };
        assert!(!is_modified(&current, &RoomAttributes::default()));
    }

    #[test]
    fn unit_is_modified_detects_present_difference() {
        let current = RoomAttributes {
            members_can_invite: Some(true),
            ..Default::default()
        };
        let desired = RoomAttributes {
            members_can_invite: Some(false),
            ..Default::default()
        };
        assert!(is_modified(&current, &desired));
    }

    #[test]
    fn unit_is_modified_equal_present_fields_do_not_differ() {
        let current = RoomAttributes {
            discoverable: Some(true),
            description: Some(String::new()),
            ..Default::default()
        };
        let desired = current.clone();
        assert!(!is_modified(&current, &desired));
    }

    #[test]
    fn unit_is_modified_compares_pinned_ids_after_normalization() {
        let current = RoomAttributes {
            pinned_message_id: Some("ab+c/d==".to_string()),
            ..Default::default()
        };
        let desired = RoomAttributes {
            pinned_message_id: Some("ab-c_d".to_string()),
            ..Default::default()
        };
        assert!(!is_modified(&current, &desired));
    }

    #[test]
    fn unit_parse_cell_empty_means_unset() {
        assert_eq!(parse_cell(spec("discoverable"), "  ", "s").expect("parse"), None);
    }

    #[test]
    fn unit_parse_cell_explicit_empty_clears_plain_strings() {
        let parsed = parse_cell(spec("description"), "\"\"", "s").expect("parse");
        assert_eq!(parsed, Some(FieldValue::Text(String::new())));
    }

    #[test]
    fn unit_parse_cell_required_string_rejects_explicit_empty() {
        assert_eq!(parse_cell(spec("name"), "''", "s").expect("parse"), None);
    }

    #[test]
    fn unit_parse_cell_one_way_bool_drops_false_and_keeps_true() {
        assert_eq!(parse_cell(spec("copyProtected"), "false", "s").expect("parse"), None);
        assert_eq!(
            parse_cell(spec("copyProtected"), "YES", "s").expect("parse"),
            Some(FieldValue::Bool(true))
        );
    }

    #[test]
    fn unit_parse_cell_bad_boolean_is_a_validation_error() {
        let error = parse_cell(spec("viewHistory"), "maybe", "s").expect_err("invalid");
        assert!(matches!(error, GatewayError::Validation(_)));
    }

    #[test]
    fn unit_parse_cell_encodes_pinned_message_id() {
        let parsed = parse_cell(spec("pinnedMessageId"), "ab+c/d=", "s").expect("parse");
        assert_eq!(parsed, Some(FieldValue::Text("ab-c_d".to_string())));
    }

    #[test]
    fn functional_row_to_attributes_maps_known_columns_only() {
        let headers: Vec<String> = [
            "streamId",
            "name",
            "membersCanInvite",
            "public (X)",
            "unknown",
        ]
        .iter()
        .map(|header| header.to_string())
        .collect();
        let cells: Vec<String> = ["abc", "ops", "yes", "true", "zzz"]
            .iter()
            .map(|cell| cell.to_string())
            .collect();
        let attrs = row_to_attributes(&headers, &cells, "abc").expect("attrs");
        assert_eq!(attrs.name.as_deref(), Some("ops"));
        assert_eq!(attrs.members_can_invite, Some(true));
        assert_eq!(attrs.public, None);
    }

    #[test]
    fn unit_export_headers_appends_extended_columns_with_suffix() {
        let headers = export_headers(true);
        assert_eq!(headers[0], COL_STREAM_ID);
        assert!(headers.contains(&"pinnedMessageId".to_string()));
        assert!(headers.contains(&"multiLateralRoom (X)".to_string()));
        assert_eq!(headers.len(), 1 + MODIFIABLE_FIELDS.len() + NON_MODIFIABLE_COLUMNS.len());
    }

    #[test]
    fn unit_detail_to_csv_fields_matches_header_width() {
        let detail = RoomDetail::default();
        assert_eq!(detail_to_csv_fields(&detail, false).len(), export_headers(false).len());
        assert_eq!(detail_to_csv_fields(&detail, true).len(), export_headers(true).len());
    }
}
