//! Foundational low-level utilities shared across roomctl crates.
//!
//! Provides stream-identifier normalization and the text/boolean cell
//! parsing shared by the CSV layer and the CLI flag mapping.

pub mod stream_id;
pub mod text_utils;

pub use stream_id::normalize_stream_id;
pub use text_utils::{parse_bool_cell, single_line, BoolCellError};
