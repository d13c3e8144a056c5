//! Chunked listing files on the filesystem
//!
//! The listing of every statistics table is written as a series of numbered
//! CSV files, `list_of_stats_data_ids_<n>.csv`, each starting with the
//! [`LISTING_HEADER`]. This module writes them and reads them back.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ChunkError, ValidationError};
use crate::listing::{Page, StatTableSummary};
use crate::table::{Cell, StatsTable};

/// Header row of every listing chunk file
pub const LISTING_HEADER: [&str; 3] = ["統計表ID", "統計名", "表題"];

/// Default number of data rows per chunk file
pub const DEFAULT_CHUNK_SIZE: usize = 100;

const FILE_PREFIX: &str = "list_of_stats_data_ids_";
const FILE_EXTENSION: &str = "csv";

/// Name of the `n`-th chunk file (1-based)
pub fn chunk_file_name(n: usize) -> String {
    format!("{FILE_PREFIX}{n}.{FILE_EXTENSION}")
}

/// Index of a chunk file from its name, if it is one
fn chunk_index(name: &str) -> Option<usize> {
    name.strip_prefix(FILE_PREFIX)?
        .strip_suffix(&format!(".{FILE_EXTENSION}"))?
        .parse()
        .ok()
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ChunkError + '_ {
    move |source| ChunkError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Buffers listing rows and flushes them into numbered chunk files
#[derive(Debug)]
pub struct ChunkWriter {
    dir: PathBuf,
    chunk_size: usize,
    buffer: Vec<StatTableSummary>,
    next_index: usize,
    files: Vec<PathBuf>,
    records: usize,
}

impl ChunkWriter {
    /// Prepare `dir` for a new listing
    ///
    /// # Arguments
    /// * `dir` - Output directory, created if missing and emptied if present
    /// * `chunk_size` - Number of data rows per file (at least 1)
    pub fn create(dir: impl Into<PathBuf>, chunk_size: usize) -> Result<Self, ChunkError> {
        let dir = dir.into();
        if chunk_size == 0 {
            return Err(ValidationError::InvalidChunkSize.into());
        }

        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        clear_dir(&dir)?;

        Ok(Self {
            dir,
            chunk_size,
            buffer: Vec::with_capacity(chunk_size),
            next_index: 1,
            files: Vec::new(),
            records: 0,
        })
    }

    /// Buffer one row, flushing a file once the buffer holds `chunk_size` rows
    pub fn push(&mut self, summary: StatTableSummary) -> Result<(), ChunkError> {
        self.buffer.push(summary);
        self.records += 1;
        if self.buffer.len() >= self.chunk_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Buffer every row of a page in order
    pub fn push_page(&mut self, page: Page) -> Result<(), ChunkError> {
        for summary in page {
            self.push(summary)?;
        }
        Ok(())
    }

    /// Write whatever is left in the buffer
    ///
    /// # Returns
    /// The paths of every file written, in order
    pub fn finish(mut self) -> Result<Vec<PathBuf>, ChunkError> {
        if !self.buffer.is_empty() {
            self.flush()?;
        }
        Ok(self.files)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Number of rows pushed so far
    pub fn records(&self) -> usize {
        self.records
    }

    fn flush(&mut self) -> Result<(), ChunkError> {
        let path = self.dir.join(chunk_file_name(self.next_index));
        let csv_error = |source| ChunkError::Csv {
            path: path.display().to_string(),
            source,
        };

        let mut writer = csv::Writer::from_path(&path).map_err(csv_error)?;
        writer.write_record(LISTING_HEADER).map_err(csv_error)?;
        for summary in self.buffer.drain(..) {
            writer
                .write_record([&summary.id, &summary.name, &summary.title])
                .map_err(csv_error)?;
        }
        writer.flush().map_err(io_error(&path))?;

        self.files.push(path);
        self.next_index += 1;
        Ok(())
    }
}

fn clear_dir(dir: &Path) -> Result<(), ChunkError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(io_error(&path))?;
        } else {
            fs::remove_file(&path).map_err(io_error(&path))?;
        }
    }
    Ok(())
}

/// Chunk files in `dir`, ordered by their numeric suffix
pub fn chunk_files(dir: &Path) -> Result<Vec<PathBuf>, ChunkError> {
    let mut files: Vec<(usize, PathBuf)> = fs::read_dir(dir)
        .map_err(io_error(dir))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name();
            chunk_index(name.to_str()?).map(|n| (n, entry.path()))
        })
        .collect();
    files.sort_by_key(|(n, _)| *n);
    Ok(files.into_iter().map(|(_, path)| path).collect())
}

/// Reload every chunk file in `dir` into a three-column table
pub fn load_summaries(dir: &Path) -> Result<StatsTable, ChunkError> {
    let files = chunk_files(dir)?;
    if files.is_empty() {
        return Err(ChunkError::Empty(dir.display().to_string()));
    }

    let mut table = StatsTable::new(LISTING_HEADER.iter().map(|h| h.to_string()).collect());
    for path in files {
        let csv_error = |source| ChunkError::Csv {
            path: path.display().to_string(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&path)
            .map_err(csv_error)?;

        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            table.push_row(record.iter().map(Cell::from).collect());
        }
    }
    Ok(table)
}
