use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use colored::Colorize;
use govstats_core::{FetchState, ResponseFormat};
use serde::{Deserialize, Serialize};

use crate::diagnostics::default_dump_dir;
use crate::prelude::{eprintln, *};

/// Credit text the portal's terms of use require before any API use
pub const CREDIT_NOTICE: &str = "このサービスは、政府統計総合窓口(e-Stat)のAPI機能を使用していますが、サービスの内容は国によって保証されたものではありません。";

/// Response format as selected on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Tagged-element markup
    #[default]
    Xml,
    /// Key-value pairs
    Json,
    /// Comma-delimited text
    Csv,
}

impl From<Format> for ResponseFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Xml => ResponseFormat::Markup,
            Format::Json => ResponseFormat::Keyed,
            Format::Csv => ResponseFormat::Delimited,
        }
    }
}

/// Label language of API responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
pub enum Lang {
    /// Japanese
    #[default]
    #[value(name = "J", alias = "j")]
    J,
    /// English
    #[value(name = "E", alias = "e")]
    E,
}

impl Lang {
    pub fn as_param(self) -> &'static str {
        match self {
            Lang::J => "J",
            Lang::E => "E",
        }
    }
}

impl FromStr for Lang {
    type Err = color_eyre::eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "J" | "j" => Ok(Lang::J),
            "E" | "e" => Ok(Lang::E),
            other => Err(eyre!("Unknown language '{}', expected J or E", other)),
        }
    }
}

/// e-Stat configuration from environment variables
#[derive(Debug, Clone)]
pub struct EStatConfig {
    pub app_id: Option<String>,
    pub format: ResponseFormat,
    pub lang: Lang,
    pub base_url: String,
    pub ids_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Where undecodable responses are saved; `None` disables the dump
    pub dump_dir: Option<PathBuf>,
}

impl Default for EStatConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            format: ResponseFormat::Markup,
            lang: Lang::J,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            ids_dir: PathBuf::from(Self::DEFAULT_IDS_DIR),
            output_dir: PathBuf::from(Self::DEFAULT_OUTPUT_DIR),
            dump_dir: default_dump_dir(),
        }
    }
}

impl EStatConfig {
    /// Default e-Stat API base URL (version 3.0)
    pub const DEFAULT_BASE_URL: &'static str = "http://api.e-stat.go.jp/rest/3.0/app";

    /// Default directory for listing chunk files
    pub const DEFAULT_IDS_DIR: &'static str = "./__stats_data_ids__";

    /// Default directory for exported tables
    pub const DEFAULT_OUTPUT_DIR: &'static str = "./__output__";

    /// Timeout applied to every request
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// Load configuration from environment variables
    /// Uses ESTAT_APP_ID, ESTAT_FORMAT, ESTAT_LANG and ESTAT_BASE_URL for the API
    /// Uses GOVSTATS_IDS_DIR, GOVSTATS_OUTPUT_DIR and GOVSTATS_DUMP_DIR for output locations
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let format = match std::env::var("ESTAT_FORMAT") {
            Ok(value) => ResponseFormat::from_str(&value)
                .map_err(|e| eyre!("Invalid ESTAT_FORMAT: {}", e))?,
            Err(_) => defaults.format,
        };
        let lang = match std::env::var("ESTAT_LANG") {
            Ok(value) => value.parse()?,
            Err(_) => defaults.lang,
        };

        Ok(Self {
            app_id: std::env::var("ESTAT_APP_ID").ok(),
            format,
            lang,
            base_url: std::env::var("ESTAT_BASE_URL").unwrap_or(defaults.base_url),
            ids_dir: std::env::var("GOVSTATS_IDS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.ids_dir),
            output_dir: std::env::var("GOVSTATS_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            dump_dir: std::env::var("GOVSTATS_DUMP_DIR")
                .map(PathBuf::from)
                .ok()
                .or(defaults.dump_dir),
        })
    }

    /// Apply CLI overrides to the configuration
    pub fn with_overrides(
        mut self,
        app_id: Option<String>,
        format: Option<ResponseFormat>,
        lang: Option<Lang>,
        base_url: Option<String>,
    ) -> Self {
        if let Some(app_id) = app_id {
            self.app_id = Some(app_id);
        }
        if let Some(format) = format {
            self.format = format;
        }
        if let Some(lang) = lang {
            self.lang = lang;
        }
        if let Some(url) = base_url {
            self.base_url = url;
        }
        self
    }

    /// Replace the diagnostic dump directory
    pub fn with_dump_dir(mut self, dump_dir: Option<PathBuf>) -> Self {
        self.dump_dir = dump_dir;
        self
    }

    /// Environment configuration with the global flags applied on top
    pub fn from_global(global: &crate::Global) -> Result<Self> {
        Ok(Self::from_env()?.with_overrides(
            global.app_id.clone(),
            global.format.map(ResponseFormat::from),
            global.lang,
            global.base_url.clone(),
        ))
    }

    /// Validate the credential and format before any request is made
    pub fn fetch_state(&self) -> Result<FetchState> {
        FetchState::new(self.app_id.as_deref(), Some(self.format))
            .map_err(|e| eyre!("Invalid configuration: {}", e))
    }
}

/// Show the e-Stat credit notice
pub fn print_credit() {
    eprintln!("{}", CREDIT_NOTICE.dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_overrides_replaces_only_given_values() {
        // Arrange
        let config = EStatConfig::default();

        // Act
        let config = config.with_overrides(
            Some("abc123".into()),
            Some(ResponseFormat::Keyed),
            None,
            Some("http://localhost:1234".into()),
        );

        // Assert
        assert_eq!(config.app_id.as_deref(), Some("abc123"));
        assert_eq!(config.format, ResponseFormat::Keyed);
        assert_eq!(config.lang, Lang::J);
        assert_eq!(config.base_url, "http://localhost:1234");
        assert_eq!(config.ids_dir, PathBuf::from(EStatConfig::DEFAULT_IDS_DIR));
    }

    #[test]
    fn test_with_dump_dir() {
        let config = EStatConfig::default().with_dump_dir(Some("/tmp/dumps".into()));
        assert_eq!(config.dump_dir, Some(PathBuf::from("/tmp/dumps")));

        let config = config.with_dump_dir(None);
        assert_eq!(config.dump_dir, None);
    }

    #[test]
    fn test_fetch_state_rejects_missing_app_id() {
        let config = EStatConfig::default();

        let err = config.fetch_state().unwrap_err();

        assert!(err.to_string().contains("Application ID is not set"));
    }

    #[test]
    fn test_format_maps_to_response_format() {
        assert_eq!(ResponseFormat::from(Format::Xml), ResponseFormat::Markup);
        assert_eq!(ResponseFormat::from(Format::Json), ResponseFormat::Keyed);
        assert_eq!(ResponseFormat::from(Format::Csv), ResponseFormat::Delimited);
    }

    #[test]
    fn test_lang_parse() {
        assert_eq!("e".parse::<Lang>().unwrap(), Lang::E);
        assert_eq!("J".parse::<Lang>().unwrap().as_param(), "J");
        assert!("X".parse::<Lang>().is_err());
    }
}
