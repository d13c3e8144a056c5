//! Raw response dumps for payloads that fail to decode

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::WrapErr;
use govstats_core::{DecodeError, ResponseFormat};
use log::{error, warn};

use crate::prelude::*;

/// Default dump directory, under the user's cache dir
pub fn default_dump_dir() -> Option<PathBuf> {
    dirs_next::cache_dir().map(|dir| dir.join("govstats"))
}

/// Where the last undecodable response of `format` is kept inside `dir`
pub fn dump_path(dir: &Path, format: ResponseFormat) -> PathBuf {
    dir.join(f!("last_response.{}", format.extension()))
}

/// Save `body` into `dir` for later inspection, returning the file written
pub fn dump_raw_response_in(dir: &Path, format: ResponseFormat, body: &str) -> Option<PathBuf> {
    let path = dump_path(dir, format);

    match fs::create_dir_all(dir).and_then(|_| fs::write(&path, body)) {
        Ok(()) => Some(path),
        Err(e) => {
            warn!("Could not save raw response to {}: {}", path.display(), e);
            None
        }
    }
}

/// Run `decode` over `body`, dumping the body into `dump_dir` when it fails
///
/// With no dump directory the failure is still logged and returned.
pub fn decode_or_dump<T>(
    dump_dir: Option<&Path>,
    format: ResponseFormat,
    body: &str,
    decode: impl FnOnce(&str) -> std::result::Result<T, DecodeError>,
) -> Result<T> {
    decode(body).or_else(|err| {
        let saved = dump_dir
            .and_then(|dir| dump_raw_response_in(dir, format, body))
            .map(|p| f!(" (raw response saved to {})", p.display()))
            .unwrap_or_default();
        error!("Failed to decode {} response: {}{}", format, err, saved);

        Err(err).wrap_err_with(|| f!("Failed to decode {} response{}", format, saved))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_dump_path_uses_format_extension() {
        let path = dump_path(Path::new("/tmp/govstats"), ResponseFormat::Keyed);
        assert_eq!(path, PathBuf::from("/tmp/govstats/last_response.json"));
    }

    #[test]
    fn test_decode_or_dump_passes_success_through() {
        let tmp = TempDir::new().unwrap();

        let value =
            decode_or_dump(Some(tmp.path()), ResponseFormat::Delimited, "body", |b| Ok(b.len()))
                .unwrap();

        assert_eq!(value, 4);
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_decode_or_dump_saves_undecodable_body() {
        // Arrange
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("dumps");
        let body = "\"RESULT\"\n\"STATUS\",\"0\"\nno marker here";

        // Act
        let err = decode_or_dump::<()>(Some(&dir), ResponseFormat::Delimited, body, |_| {
            Err(DecodeError::MarkerNotFound("STAT_INF"))
        })
        .unwrap_err();

        // Assert
        let saved = dir.join("last_response.csv");
        assert_eq!(fs::read_to_string(&saved).unwrap(), body);
        assert!(err.to_string().contains(&saved.display().to_string()));
    }

    #[test]
    fn test_decode_or_dump_keeps_decode_error_as_source() {
        let err = decode_or_dump::<()>(None, ResponseFormat::Delimited, "no marker", |_| {
            Err(DecodeError::MarkerNotFound("STAT_INF"))
        })
        .unwrap_err();

        assert!(err.to_string().starts_with("Failed to decode csv response"));
        assert!(err.downcast_ref::<DecodeError>().is_some());
    }
}
