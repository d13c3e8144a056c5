//! Session state shared by the fetch operations
//!
//! [`FetchState`] carries the validated credential, the selected response
//! format and the cancellation token. The token is the only piece of state
//! observed from outside a running listing fetch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ValidationError;
use crate::format::ResponseFormat;

/// Number of digits in a statistics table ID
pub const STATS_DATA_ID_DIGITS: usize = 10;

/// Cooperative cancellation token
///
/// Clones share the same flag, so a clone handed to a signal handler or
/// another task cancels the fetch that polls the original.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the next run starts fresh
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Validated inputs for a listing or table fetch
#[derive(Debug, Clone)]
pub struct FetchState {
    pub app_id: String,
    pub format: ResponseFormat,
    pub cancel: CancelFlag,
}

impl FetchState {
    /// Validate the credential and format selection
    ///
    /// Both are checked here so that no request is issued with a missing or
    /// malformed credential.
    pub fn new(
        app_id: Option<&str>,
        format: Option<ResponseFormat>,
    ) -> Result<Self, ValidationError> {
        let app_id = validate_app_id(app_id.unwrap_or_default())?;
        let format = format.ok_or(ValidationError::MissingFormat)?;

        Ok(Self {
            app_id,
            format,
            cancel: CancelFlag::new(),
        })
    }

    /// Replace the cancellation token with one owned by the caller
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Check an application ID: non-empty, lowercase ASCII letters and digits only
pub fn validate_app_id(app_id: &str) -> Result<String, ValidationError> {
    let app_id = app_id.trim();

    if app_id.is_empty() {
        return Err(ValidationError::MissingAppId);
    }

    if !app_id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(ValidationError::InvalidAppId(app_id.to_string()));
    }

    Ok(app_id.to_string())
}

/// Check a statistics table ID: exactly ten decimal digits
pub fn validate_stats_data_id(id: &str) -> Result<String, ValidationError> {
    let id = id.trim();

    if id.len() != STATS_DATA_ID_DIGITS || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidStatsDataId {
            id: id.to_string(),
            expected: STATS_DATA_ID_DIGITS,
        });
    }

    Ok(id.to_string())
}

/// Check a listing page size; `startPosition` only advances when it is positive
pub fn validate_page_size(page_size: usize) -> Result<usize, ValidationError> {
    if page_size == 0 {
        return Err(ValidationError::InvalidPageSize);
    }
    Ok(page_size)
}
