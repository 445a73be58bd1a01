//! CSV export/import around the reconciler.
//!
//! Export writes one row per room in the canonical column layout; import
//! replays a (possibly edited) export and writes each row back with
//! `status` and `reason` result columns appended.

use std::io::{Read, Write};

use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};

use roomctl_core::normalize_stream_id;
use roomctl_gateway::{GatewayError, RoomAttributes, RoomGateway, StreamFilter};

use crate::bulk::LIST_PAGE_LIMIT;
use crate::fields::{
    detail_to_csv_fields, export_headers, row_to_attributes, COL_REASON, COL_STATUS,
    COL_STREAM_ID,
};
use crate::reconcile::{RoomReconciler, UpdateOutcome};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
/// Per-run tally of a CSV import.
pub struct CsvRunReport {
    pub rows: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Rows without a stream id; logged and left out of the output, never
    /// counted as failures.
    pub missing_id: usize,
}

impl<G: RoomGateway> RoomReconciler<G> {
    /// Exports every room matching `filter` to CSV. The output can be edited
    /// and fed back through [`Self::update_rooms_from_csv`].
    pub async fn export_rooms_csv<W: Write>(
        &self,
        filter: &StreamFilter,
        out: W,
        extended: bool,
    ) -> Result<usize> {
        let mut writer = WriterBuilder::new().from_writer(out);
        writer
            .write_record(export_headers(extended))
            .context("failed to write csv header")?;

        let mut exported = 0_usize;
        let mut skip = 0_u64;
        'pages: loop {
            let page = self
                .gateway()
                .list_rooms(filter, skip, LIST_PAGE_LIMIT)
                .await
                .context("failed to list rooms for export")?;
            if page.streams.is_empty() {
                break;
            }
            let fetched = page.streams.len() as u64;
            for stream in &page.streams {
                if self.interrupted() {
                    tracing::warn!("interrupt received, ending export early");
                    break 'pages;
                }
                tracing::debug!(stream_id = %stream.id, "writing room to csv");
                let detail = self
                    .gateway()
                    .room_detail(&stream.id)
                    .await
                    .with_context(|| format!("failed to fetch room {}", stream.id))?;
                writer
                    .write_record(detail_to_csv_fields(&detail, extended))
                    .context("failed to write csv row")?;
                exported += 1;
            }
            if fetched < LIST_PAGE_LIMIT {
                break;
            }
            skip += fetched;
        }
        writer.flush().context("failed to flush csv output")?;
        tracing::info!(exported, "finished exporting rooms to csv");
        Ok(exported)
    }

    /// Replays a CSV file through the reconciler.
    ///
    /// Each row's settings come from its cells unless `global_settings` is
    /// supplied, in which case every row gets the same record. When `output`
    /// is present, every processed row is written back in its input layout
    /// with `status` and `reason` appended; rows in the canonical export
    /// layout that reached the room carry its resulting state, so the result
    /// file doubles as a fresh export.
    pub async fn update_rooms_from_csv<R: Read, W: Write>(
        &self,
        input: R,
        output: Option<W>,
        global_settings: Option<&RoomAttributes>,
        pre_check: bool,
    ) -> Result<CsvRunReport> {
        let mut reader = ReaderBuilder::new().from_reader(input);
        let headers: Vec<String> = reader
            .headers()
            .context("failed to read csv header")?
            .iter()
            .map(str::to_string)
            .collect();
        let Some(id_index) = headers.iter().position(|header| header == COL_STREAM_ID) else {
            bail!("input csv has no {COL_STREAM_ID} column");
        };

        // When the input uses the canonical export layout, result rows can
        // mirror the room's state after the run instead of echoing the input.
        let canonical_layout = if headers == export_headers(false) {
            Some(false)
        } else if headers == export_headers(true) {
            Some(true)
        } else {
            None
        };

        let mut writer = output.map(|out| WriterBuilder::new().from_writer(out));
        if let Some(writer) = writer.as_mut() {
            let mut out_headers = headers.clone();
            out_headers.push(COL_STATUS.to_string());
            out_headers.push(COL_REASON.to_string());
            writer
                .write_record(&out_headers)
                .context("failed to write csv header")?;
        }

        let mut report = CsvRunReport::default();
        for (index, record) in reader.records().enumerate() {
            let row = index + 1;
            if self.interrupted() {
                tracing::warn!(row, "interrupt received, ending csv run early");
                break;
            }
            let record = record.with_context(|| format!("failed to read csv row {row}"))?;
            report.rows += 1;

            let raw_id = record.get(id_index).unwrap_or("").trim();
            if raw_id.is_empty() {
                tracing::warn!(row, "row has no stream id, skipping");
                report.missing_id += 1;
                continue;
            }
            let stream_id = normalize_stream_id(raw_id);

            let outcome = match self.row_settings(&headers, &record, &stream_id, global_settings)
            {
                Ok(desired) => {
                    tracing::info!(row, stream_id = %stream_id, "processing csv row");
                    self.reconcile(&stream_id, &desired, pre_check).await
                }
                Err(error) => UpdateOutcome::Failed {
                    reason: error.reason_text(),
                },
            };
            match &outcome {
                UpdateOutcome::Updated(_) => report.succeeded += 1,
                UpdateOutcome::Skipped { .. } => report.skipped += 1,
                UpdateOutcome::Failed { reason } => {
                    report.failed += 1;
                    tracing::error!(row, stream_id = %stream_id, reason = %reason, "csv row failed");
                }
            }

            if let Some(writer) = writer.as_mut() {
                let mut cells = match (&outcome, canonical_layout) {
                    (UpdateOutcome::Updated(detail), Some(extended))
                    | (UpdateOutcome::Skipped { detail, .. }, Some(extended)) => {
                        detail_to_csv_fields(detail, extended)
                    }
                    _ => {
                        let mut cells: Vec<String> =
                            record.iter().map(str::to_string).collect();
                        cells.resize(headers.len(), String::new());
                        cells
                    }
                };
                cells.push(outcome.status_label().to_string());
                cells.push(outcome.report_reason().unwrap_or("").to_string());
                writer
                    .write_record(&cells)
                    .context("failed to write csv row")?;
            }
        }
        if let Some(writer) = writer.as_mut() {
            writer.flush().context("failed to flush csv output")?;
        }
        tracing::info!(
            rows = report.rows,
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            missing_id = report.missing_id,
            "finished csv run"
        );
        Ok(report)
    }

    fn row_settings(
        &self,
        headers: &[String],
        record: &csv::StringRecord,
        stream_id: &str,
        global_settings: Option<&RoomAttributes>,
    ) -> Result<RoomAttributes, GatewayError> {
        if let Some(global) = global_settings {
            return Ok(global.clone());
        }
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        row_to_attributes(headers, &cells, stream_id)
    }
}
