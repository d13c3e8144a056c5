//! Terminal rendering of statistics tables

use colored::Colorize;
use govstats_core::{Cell, FilterSpec, StatsTable};
use serde::Serialize;

use crate::prelude::{println, *};

fn render_cell(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.bright_white().to_string(),
        Cell::Number(_) => cell.to_string().bright_yellow().to_string(),
        Cell::Null => "NaN".dimmed().to_string(),
    }
}

/// Build a printable table of at most `limit` rows
pub fn build_table(table: &StatsTable, limit: Option<usize>) -> prettytable::Table {
    let mut out = new_table();

    out.set_titles(prettytable::Row::new(
        table
            .columns()
            .iter()
            .map(|c| prettytable::Cell::new(&c.bold().cyan().to_string()))
            .collect(),
    ));

    let rows = table.rows().iter().take(limit.unwrap_or(usize::MAX));
    for row in rows {
        out.add_row(prettytable::Row::new(
            row.iter()
                .map(|cell| prettytable::Cell::new(&render_cell(cell)))
                .collect(),
        ));
    }

    out
}

/// Print a table, noting how many rows were left out
pub fn print_stats_table(table: &StatsTable, limit: Option<usize>) {
    if table.is_empty() {
        println!("No rows to display.");
        return;
    }

    build_table(table, limit).printstd();

    if let Some(limit) = limit.filter(|l| *l < table.len()) {
        println!(
            "{}",
            f!("... showing {} of {} rows", limit, table.len()).dimmed()
        );
    }
}

/// Rows as a JSON array of column-keyed objects
pub fn format_records_json(table: &StatsTable, limit: Option<usize>) -> Result<String> {
    let shown = match limit {
        Some(limit) => table.head(limit),
        None => table.clone(),
    };
    serde_json::to_string_pretty(&shown.records())
        .map_err(|e| eyre!("Failed to serialize output: {}", e))
}

/// What a table display was produced from
#[derive(Debug, Serialize)]
pub struct DisplaySummary {
    pub source_label: String,
    pub source: String,
    pub format: Option<String>,
    pub match_mode: String,
    pub keywords: Vec<String>,
    pub combine: Option<String>,
    pub rows: usize,
}

impl DisplaySummary {
    /// Label shown for a single statistics table
    pub const TABLE_LABEL: &'static str = "統計表ID";

    /// Label shown for the saved listing
    pub const LISTING_LABEL: &'static str = "統計表一覧の保存先";

    /// Summary of one fetched statistics table
    pub fn for_table(id: impl Into<String>, filter: Option<&FilterSpec>, rows: usize) -> Self {
        Self::new(Self::TABLE_LABEL, id, filter, rows)
    }

    /// Summary of the listing reloaded from `dir`
    pub fn for_listing(dir: &std::path::Path, filter: Option<&FilterSpec>, rows: usize) -> Self {
        Self::new(Self::LISTING_LABEL, dir.display().to_string(), filter, rows)
    }

    fn new(
        source_label: &str,
        source: impl Into<String>,
        filter: Option<&FilterSpec>,
        rows: usize,
    ) -> Self {
        Self {
            source_label: source_label.to_string(),
            source: source.into(),
            format: None,
            match_mode: filter
                .map(|s| s.match_mode().description())
                .unwrap_or(govstats_core::MatchMode::None.description())
                .to_string(),
            keywords: filter.map(|s| s.keywords().to_vec()).unwrap_or_default(),
            combine: filter.map(|s| s.combine().description().to_string()),
            rows,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

/// Summary lines printed after a table
pub fn format_summary(summary: &DisplaySummary) -> String {
    let none = "なし".to_string();
    let mut out = String::new();

    out.push_str(&f!(
        "{}: {}\n",
        summary.source_label.bold(),
        summary.source
    ));
    if let Some(format) = &summary.format {
        out.push_str(&f!("{}: {}\n", "データの取得形式".bold(), format));
    }
    out.push_str(&f!("{}: {}\n", "検索方法".bold(), summary.match_mode));
    let keywords = if summary.keywords.is_empty() {
        none.clone()
    } else {
        summary.keywords.join(", ")
    };
    out.push_str(&f!("{}: {}\n", "抽出するキーワード".bold(), keywords));
    out.push_str(&f!(
        "{}: {}\n",
        "抽出方法".bold(),
        summary.combine.as_ref().unwrap_or(&none)
    ));
    out.push_str(&f!(
        "{}: {}\n",
        "表示件数".bold(),
        summary.rows.to_string().bright_yellow()
    ));

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use govstats_core::{CombineMode, MatchMode};

    fn sample() -> StatsTable {
        let mut table = StatsTable::new(vec!["地域".into(), "値".into()]);
        table.push_row(vec![Cell::from("東京"), Cell::Number(1.0)]);
        table.push_row(vec![Cell::from("大阪"), Cell::Null]);
        table.push_row(vec![Cell::from("愛知"), Cell::Number(2.5)]);
        table
    }

    #[test]
    fn test_build_table_respects_limit() {
        let table = build_table(&sample(), Some(2));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_format_records_json() {
        let json = format_records_json(&sample(), Some(2)).unwrap();

        assert!(json.contains("\"地域\": \"東京\""));
        assert!(json.contains("\"値\": null"));
        assert!(!json.contains("愛知"));
    }

    #[test]
    fn test_format_summary_without_filter() {
        colored::control::set_override(false);
        let summary = DisplaySummary::for_table("0003448237", None, 3).with_format("xml");

        let text = format_summary(&summary);

        assert!(text.contains("統計表ID: 0003448237"));
        assert!(text.contains("データの取得形式: xml"));
        assert!(text.contains("検索方法: なし"));
        assert!(text.contains("抽出するキーワード: なし"));
        assert!(text.contains("抽出方法: なし"));
        assert!(text.contains("表示件数: 3"));
    }

    #[test]
    fn test_format_summary_with_filter() {
        colored::control::set_override(false);
        let spec = FilterSpec::new(
            MatchMode::Substring,
            vec!["東京".into(), "大阪".into()],
            Some(CombineMode::And),
        )
        .unwrap();
        let summary = DisplaySummary::for_table("0003448237", Some(&spec), 1);

        let text = format_summary(&summary);

        assert!(text.contains("検索方法: 部分一致"));
        assert!(text.contains("抽出するキーワード: 東京, 大阪"));
        assert!(text.contains("抽出方法: AND抽出"));
    }

    #[test]
    fn test_format_summary_for_listing_labels_directory() {
        colored::control::set_override(false);
        let summary =
            DisplaySummary::for_listing(std::path::Path::new("./__stats_data_ids__"), None, 250);

        let text = format_summary(&summary);

        assert!(text.contains("統計表一覧の保存先: ./__stats_data_ids__"));
        assert!(!text.contains("統計表ID"));
        assert!(!text.contains("データの取得形式"));
        assert!(text.contains("表示件数: 250"));
    }
}
