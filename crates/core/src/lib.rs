//! Core library for govstats
//!
//! This crate implements the **Functional Core** of the govstats application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! - **`govstats_core`** (this crate): decoding, the table model, filtering and
//!   the chunk file format
//! - **`govstats`**: HTTP, orchestration, the CLI and terminal output (the
//!   Imperative Shell)
//!
//! Decoders and filters are pure: they take a response body or a table and
//! return a new value. The only I/O in this crate is [`chunk`], which owns the
//! on-disk layout of the listing files.
//!
//! # Module Organization
//!
//! - [`format`]: the three response encodings and the dispatch tables over them
//! - [`listing`]: decoders for one page of the statistics-table listing
//! - [`stats_data`]: decoders for a single statistics table
//! - [`table`]: the uniform [`StatsTable`] model
//! - [`filter`]: match/combine filtering of a table
//! - [`chunk`]: numbered listing files, written and reloaded
//! - [`state`]: validated fetch inputs and the cancellation token
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use govstats_core::{decode_listing, ResponseFormat};
//!
//! let body = std::fs::read_to_string("page.json")?;
//! let (page, count) = decode_listing(ResponseFormat::Keyed, &body)?;
//!
//! for summary in &page {
//!     println!("{} {}", summary.id, summary.title);
//! }
//! ```

pub mod chunk;
pub mod error;
pub mod filter;
pub mod format;
mod json;
pub mod listing;
pub mod state;
pub mod stats_data;
pub mod table;
mod xml;

pub use error::{ChunkError, DecodeError, FilterError, ValidationError};
pub use filter::{filter_table, CombineMode, FilterSpec, MatchMode};
pub use format::{decode_listing, decode_table, ResponseFormat};
pub use listing::{Page, StatTableSummary};
pub use state::{CancelFlag, FetchState};
pub use table::{Cell, StatsTable, UNIT_COLUMN, VALUE_COLUMN};
