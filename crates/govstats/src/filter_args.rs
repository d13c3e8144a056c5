use govstats_core::{CombineMode, FilterSpec, MatchMode};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// How keywords are compared with cells
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchModeArg {
    /// No filtering (default)
    #[default]
    None,
    /// Cell contains the keyword, ignoring case
    Substring,
    /// Cell equals the keyword
    Exact,
}

impl From<MatchModeArg> for MatchMode {
    fn from(m: MatchModeArg) -> Self {
        match m {
            MatchModeArg::None => MatchMode::None,
            MatchModeArg::Substring => MatchMode::Substring,
            MatchModeArg::Exact => MatchMode::Exact,
        }
    }
}

/// How several keywords are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineArg {
    /// Keep rows matching any keyword
    Or,
    /// Keep rows matching every keyword
    And,
}

impl From<CombineArg> for CombineMode {
    fn from(c: CombineArg) -> Self {
        match c {
            CombineArg::Or => CombineMode::Or,
            CombineArg::And => CombineMode::And,
        }
    }
}

/// Row filter options shared by the commands that print tables
#[derive(Debug, Clone, Default, clap::Args, Serialize, Deserialize)]
pub struct FilterArgs {
    /// Match mode for keywords
    #[arg(long, value_enum, default_value = "none")]
    pub match_mode: MatchModeArg,

    /// Keyword to filter by (can be repeated: -k 東京 -k 大阪)
    #[arg(long = "keyword", short = 'k', value_name = "KEYWORD")]
    pub keywords: Vec<String>,

    /// How to combine several keywords
    #[arg(long, value_enum)]
    pub combine: Option<CombineArg>,
}

impl FilterArgs {
    /// Validated filter, or `None` when no filtering was requested
    pub fn to_spec(&self) -> Result<Option<FilterSpec>> {
        if self.match_mode == MatchModeArg::None
            && self.keywords.is_empty()
            && self.combine.is_none()
        {
            return Ok(None);
        }

        FilterSpec::new(
            self.match_mode.into(),
            self.keywords.clone(),
            self.combine.map(CombineMode::from),
        )
        .map(Some)
        .map_err(|e| eyre!("Invalid filter: {}", e))
    }
}
