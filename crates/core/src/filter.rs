//! Row filtering over a [`StatsTable`]
//!
//! A row matches when its stringified cells satisfy the keywords under the
//! selected [`MatchMode`] and [`CombineMode`]. Filtering never mutates the
//! input table.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::FilterError;
use crate::table::{Cell, StatsTable};

/// How a keyword is compared with a cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// No filtering selected; rejected by [`FilterSpec::new`]
    #[default]
    None,
    /// Case-insensitive containment
    Substring,
    /// Case-sensitive equality
    Exact,
}

impl MatchMode {
    pub fn description(self) -> &'static str {
        match self {
            Self::None => "なし",
            Self::Substring => "部分一致",
            Self::Exact => "完全一致",
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Substring => "substring",
            Self::Exact => "exact",
        };
        f.write_str(name)
    }
}

impl FromStr for MatchMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "substring" | "partial" => Ok(Self::Substring),
            "exact" => Ok(Self::Exact),
            _ => Err(FilterError::UnknownMatchMode(s.to_string())),
        }
    }
}

/// How several keywords are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineMode {
    /// Any keyword matches some cell
    Or,
    /// Every keyword matches some cell
    And,
}

impl CombineMode {
    pub fn description(self) -> &'static str {
        match self {
            Self::Or => "OR抽出",
            Self::And => "AND抽出",
        }
    }
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Or => "or",
            Self::And => "and",
        })
    }
}

impl FromStr for CombineMode {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "or" => Ok(Self::Or),
            "and" => Ok(Self::And),
            _ => Err(FilterError::UnknownCombineMode(s.to_string())),
        }
    }
}

/// A validated filter configuration
#[derive(Debug, Clone, Serialize)]
pub struct FilterSpec {
    match_mode: MatchMode,
    keywords: Vec<String>,
    combine: CombineMode,
    #[serde(skip)]
    matcher: Matcher,
}

impl PartialEq for FilterSpec {
    fn eq(&self, other: &Self) -> bool {
        self.match_mode == other.match_mode
            && self.keywords == other.keywords
            && self.combine == other.combine
    }
}

impl FilterSpec {
    /// Validate a filter configuration
    ///
    /// - `MatchMode::None` is rejected.
    /// - At least one non-empty keyword is required.
    /// - More than one keyword requires a combine mode.
    /// - A single keyword always combines with `Or`.
    pub fn new(
        match_mode: MatchMode,
        keywords: Vec<String>,
        combine: Option<CombineMode>,
    ) -> Result<Self, FilterError> {
        if match_mode == MatchMode::None {
            return Err(FilterError::MatchModeRequired);
        }
        if keywords.is_empty() {
            return Err(FilterError::NoKeywords);
        }
        if keywords.iter().any(|k| k.is_empty()) {
            return Err(FilterError::EmptyKeyword);
        }

        let combine = match (keywords.len(), combine) {
            (1, _) => CombineMode::Or,
            (_, Some(combine)) => combine,
            (n, None) => return Err(FilterError::CombineModeRequired(n)),
        };
        let matcher = Matcher::compile(match_mode, combine, &keywords)?;

        Ok(Self {
            match_mode,
            keywords,
            combine,
            matcher,
        })
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn combine(&self) -> CombineMode {
        self.combine
    }

    /// Whether a row, given as stringified cells, satisfies the filter
    pub fn matches(&self, cells: &[String]) -> bool {
        match &self.matcher {
            Matcher::AnyPattern(re) => cells.iter().any(|c| re.is_match(c)),
            Matcher::AllPatterns(res) => res.iter().all(|re| cells.iter().any(|c| re.is_match(c))),
            Matcher::AnyExact => cells.iter().any(|c| self.keywords.contains(c)),
            Matcher::AllExact => self.keywords.iter().all(|k| cells.contains(k)),
        }
    }
}

/// Compiled form of the keywords
#[derive(Debug, Clone)]
enum Matcher {
    /// Substring OR, or a single substring keyword
    AnyPattern(Regex),
    /// Substring AND: each pattern must hit some cell
    AllPatterns(Vec<Regex>),
    AnyExact,
    AllExact,
}

impl Matcher {
    fn compile(
        match_mode: MatchMode,
        combine: CombineMode,
        keywords: &[String],
    ) -> Result<Self, FilterError> {
        let matcher = match (match_mode, combine) {
            (MatchMode::Exact, CombineMode::Or) => Matcher::AnyExact,
            (MatchMode::Exact, CombineMode::And) => Matcher::AllExact,
            (_, CombineMode::Or) => {
                let pattern = keywords
                    .iter()
                    .map(|k| regex::escape(k))
                    .collect::<Vec<_>>()
                    .join("|");
                Matcher::AnyPattern(case_insensitive(&pattern)?)
            }
            (_, CombineMode::And) => Matcher::AllPatterns(
                keywords
                    .iter()
                    .map(|k| case_insensitive(&regex::escape(k)))
                    .collect::<Result<_, _>>()?,
            ),
        };
        Ok(matcher)
    }
}

fn case_insensitive(pattern: &str) -> Result<Regex, FilterError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| FilterError::InvalidPattern(e.to_string()))
}

/// Return a new table holding only the rows that satisfy `spec`
pub fn filter_table(table: &StatsTable, spec: &FilterSpec) -> StatsTable {
    table.retain_rows(|row| {
        let cells: Vec<String> = row.iter().map(Cell::to_string).collect();
        spec.matches(&cells)
    })
}
