//! Response formats offered by the e-Stat API
//!
//! Every format-dependent decision (endpoint path, decoder, file extension)
//! is answered by a single `match` on [`ResponseFormat`] in this module, so
//! the rest of the code never branches on format names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{DecodeError, ValidationError};
use crate::listing::{decode_delimited, decode_keyed, decode_markup, Page};
use crate::stats_data::{decode_delimited_table, decode_keyed_table, decode_markup_table};
use crate::table::StatsTable;

/// Signature shared by the three listing decoders
pub type ListingDecoder = fn(&str) -> Result<(Page, usize), DecodeError>;

/// Signature shared by the three table decoders
pub type TableDecoder = fn(&str) -> Result<StatsTable, DecodeError>;

/// Encoding of an API response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Tagged-element markup (XML)
    Markup,
    /// Nested key-value payload (JSON)
    Keyed,
    /// Comma-delimited text (CSV)
    Delimited,
}

impl ResponseFormat {
    pub const ALL: [ResponseFormat; 3] = [Self::Markup, Self::Keyed, Self::Delimited];

    /// Path of the listing endpoint, relative to the API base URL
    pub fn listing_endpoint(self) -> &'static str {
        match self {
            Self::Markup => "getStatsList",
            Self::Keyed => "json/getStatsList",
            Self::Delimited => "getSimpleStatsList",
        }
    }

    /// Path of the single-table endpoint, relative to the API base URL
    pub fn table_endpoint(self) -> &'static str {
        match self {
            Self::Markup => "getStatsData",
            Self::Keyed => "json/getStatsData",
            Self::Delimited => "getSimpleStatsData",
        }
    }

    pub fn listing_decoder(self) -> ListingDecoder {
        match self {
            Self::Markup => decode_markup,
            Self::Keyed => decode_keyed,
            Self::Delimited => decode_delimited,
        }
    }

    pub fn table_decoder(self) -> TableDecoder {
        match self {
            Self::Markup => decode_markup_table,
            Self::Keyed => decode_keyed_table,
            Self::Delimited => decode_delimited_table,
        }
    }

    /// File extension used when dumping a raw response for diagnostics
    pub fn extension(self) -> &'static str {
        match self {
            Self::Markup => "xml",
            Self::Keyed => "json",
            Self::Delimited => "csv",
        }
    }

    /// Human readable description, as shown in summaries
    pub fn description(self) -> &'static str {
        match self {
            Self::Markup => "タグ構造のデータ",
            Self::Keyed => "キーと値のペアのデータ",
            Self::Delimited => "カンマ区切りのデータ",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ResponseFormat {
    type Err = ValidationError;

    /// Accepts both the format names and the wire names (`xml`, `json`, `csv`)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markup" | "xml" => Ok(Self::Markup),
            "keyed" | "json" => Ok(Self::Keyed),
            "delimited" | "csv" => Ok(Self::Delimited),
            other => Err(ValidationError::UnknownFormat(other.to_string())),
        }
    }
}

/// Decode one listing page in the given format
pub fn decode_listing(format: ResponseFormat, body: &str) -> Result<(Page, usize), DecodeError> {
    (format.listing_decoder())(body)
}

/// Decode a full statistics table in the given format
pub fn decode_table(format: ResponseFormat, body: &str) -> Result<StatsTable, DecodeError> {
    (format.table_decoder())(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_are_distinct_per_format() {
        let listing: Vec<_> = ResponseFormat::ALL
            .iter()
            .map(|f| f.listing_endpoint())
            .collect();
        let tables: Vec<_> = ResponseFormat::ALL
            .iter()
            .map(|f| f.table_endpoint())
            .collect();

        assert_eq!(
            listing,
            vec!["getStatsList", "json/getStatsList", "getSimpleStatsList"]
        );
        assert_eq!(
            tables,
            vec!["getStatsData", "json/getStatsData", "getSimpleStatsData"]
        );
    }

    #[test]
    fn test_from_str_accepts_wire_names() {
        assert_eq!("xml".parse::<ResponseFormat>().unwrap(), ResponseFormat::Markup);
        assert_eq!("JSON".parse::<ResponseFormat>().unwrap(), ResponseFormat::Keyed);
        assert_eq!(
            "delimited".parse::<ResponseFormat>().unwrap(),
            ResponseFormat::Delimited
        );
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "yaml".parse::<ResponseFormat>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownFormat(ref s) if s == "yaml"));
    }

    #[test]
    fn test_decode_listing_dispatches_by_format() {
        let body = "\"STAT_INF\"\nTABLE_INF,STAT_NAME,TITLE\n0001,国勢調査,人口\n";
        let (page, count) = decode_listing(ResponseFormat::Delimited, body).unwrap();

        assert_eq!(count, 1);
        assert_eq!(page.get("0001").unwrap().name, "国勢調査");
    }
}
