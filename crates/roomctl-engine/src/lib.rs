//! Room-update reconciliation engine and bulk driver.
//!
//! [`RoomReconciler`] decides whether a room needs updating, applies the
//! desired settings through a [`roomctl_gateway::RoomGateway`], and recovers
//! from ownership/membership denials by temporarily elevating the bot around
//! a single update call. The bulk driver and CSV layer feed sequences of
//! rooms through it without letting one room's failure abort the batch.

pub mod bulk;
pub mod csv_io;
pub mod fields;
pub mod reconcile;

pub use bulk::LIST_PAGE_LIMIT;
pub use csv_io::CsvRunReport;
pub use fields::{
    detail_to_csv_fields, export_headers, is_modified, row_to_attributes, FieldKind, FieldSpec,
    RoomField, COL_REASON, COL_STATUS, COL_STREAM_ID, SKIP_REASON_UNCHANGED,
};
pub use reconcile::{RoomReconciler, UpdateOutcome};
