//! Decoders for one page of the statistics-table listing
//!
//! Each decoder turns the raw body of a `getStatsList` style response into a
//! [`Page`] plus the number of records the response carried. A record count of
//! zero is what ends a paginated fetch.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::json;
use crate::xml::{self, ResultStatus};

/// Keys that may carry the statistics name in keyed records, highest
/// precedence first
pub const NAME_KEYS: [&str; 2] = ["STATISTICS_NAME", "STAT_NAME"];

/// Marker that precedes the header row in delimited listings
pub const LISTING_MARKER: &str = "STAT_INF";

/// One statistics table, as listed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatTableSummary {
    pub id: String,
    pub name: String,
    pub title: String,
}

impl StatTableSummary {
    /// Build a summary, cleansing the title
    pub fn new(id: impl Into<String>, name: impl Into<String>, title: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            title: cleanse_title(title),
        }
    }
}

/// Ordered mapping from table id to summary, in response order
///
/// Inserting an id that is already present replaces its name and title but
/// keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    entries: Vec<StatTableSummary>,
    positions: HashMap<String, usize>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, summary: StatTableSummary) {
        match self.positions.get(&summary.id) {
            Some(&at) => self.entries[at] = summary,
            None => {
                self.positions.insert(summary.id.clone(), self.entries.len());
                self.entries.push(summary);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&StatTableSummary> {
        self.positions.get(id).map(|&at| &self.entries[at])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StatTableSummary> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|s| s.id.as_str()).collect()
    }
}

impl IntoIterator for Page {
    type Item = StatTableSummary;
    type IntoIter = std::vec::IntoIter<StatTableSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Page {
    type Item = &'a StatTableSummary;
    type IntoIter = std::slice::Iter<'a, StatTableSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<StatTableSummary> for Page {
    fn from_iter<I: IntoIterator<Item = StatTableSummary>>(iter: I) -> Self {
        let mut page = Page::new();
        for summary in iter {
            page.insert(summary);
        }
        page
    }
}

/// Replace half-width and full-width commas with the ideographic comma
pub fn cleanse_title(title: &str) -> String {
    title.replace([',', '，'], "、")
}

/// Statistics name of a keyed record, following [`NAME_KEYS`] precedence
pub fn select_name(record: &Value) -> String {
    NAME_KEYS
        .iter()
        .find_map(|key| record.get(key).filter(|v| !v.is_null()))
        .map(json::text_of)
        .unwrap_or_default()
}

pub(crate) fn strip_bom(body: &str) -> &str {
    body.trim_start_matches('\u{feff}')
}

/// `STATUS` and `ERROR_MSG` of a delimited body's result section
pub(crate) fn delimited_status<'a>(lines: &[&'a str]) -> (Option<u32>, &'a str) {
    let field = |name: &str| {
        lines.iter().copied().find_map(|line| {
            let (key, value) = line.split_once(',')?;
            (key.trim().trim_matches('"') == name).then(|| value.trim().trim_matches('"'))
        })
    };
    let status = field("STATUS").and_then(|s| s.parse::<u32>().ok());
    (status, field("ERROR_MSG").unwrap_or_default())
}

/// Error for a delimited body without its marker line
///
/// Error responses carry no data section, only the result lines, so an API
/// error is reported in preference to the missing marker.
pub(crate) fn missing_marker(lines: &[&str], marker: &'static str) -> DecodeError {
    let (status, message) = delimited_status(lines);
    match json::status_to_result(status, message) {
        Err(err) => err,
        Ok(()) => DecodeError::MarkerNotFound(marker),
    }
}

/// `TABLE_INF` record being assembled from markup events
#[derive(Debug, Default)]
struct MarkupRecord {
    depth: usize,
    id: String,
    name: Option<String>,
    title: Option<String>,
    capturing: Option<&'static str>,
}

impl MarkupRecord {
    fn open_child(&mut self, name: &str) {
        match name {
            "STAT_NAME" if self.name.is_none() => {
                self.name = Some(String::new());
                self.capturing = Some("STAT_NAME");
            }
            "TITLE" if self.title.is_none() => {
                self.title = Some(String::new());
                self.capturing = Some("TITLE");
            }
            _ => self.capturing = None,
        }
    }

    fn push_text(&mut self, depth: usize, text: &str) {
        if depth != self.depth + 1 {
            return;
        }
        let target = match self.capturing {
            Some("STAT_NAME") => self.name.as_mut(),
            Some("TITLE") => self.title.as_mut(),
            _ => None,
        };
        if let Some(target) = target {
            target.push_str(text);
        }
    }

    fn into_summary(self) -> StatTableSummary {
        StatTableSummary::new(
            self.id,
            self.name.unwrap_or_default(),
            &self.title.unwrap_or_default(),
        )
    }
}

/// Decode a markup (XML) listing page
///
/// Every `TABLE_INF` element is a record; its `id` attribute is the table id
/// and the text of its first `STAT_NAME` and `TITLE` children are the name and
/// title.
pub fn decode_markup(body: &str) -> Result<(Page, usize), DecodeError> {
    let mut reader = Reader::from_str(strip_bom(body));
    reader.config_mut().trim_text(true);

    let mut page = Page::new();
    let mut count = 0;
    let mut path: Vec<String> = Vec::new();
    let mut status = ResultStatus::default();
    let mut open: Option<MarkupRecord> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = xml::name_of(&e);
                let depth = path.len() + 1;

                match open.as_mut() {
                    Some(record) if depth == record.depth + 1 => record.open_child(&name),
                    Some(_) => {}
                    None if name == "TABLE_INF" => {
                        open = Some(MarkupRecord {
                            depth,
                            id: xml::attribute(&e, "id")?.unwrap_or_default(),
                            ..Default::default()
                        });
                    }
                    None => {}
                }
                path.push(name);
            }
            Event::Empty(e) => {
                if open.is_none() && e.name().as_ref() == b"TABLE_INF" {
                    let id = xml::attribute(&e, "id")?.unwrap_or_default();
                    page.insert(StatTableSummary::new(id, "", ""));
                    count += 1;
                }
            }
            Event::Text(t) => {
                let text = xml::text(&t)?;
                if let Some(record) = open.as_mut() {
                    record.push_text(path.len(), &text);
                }
                status.observe(&path, &text);
            }
            Event::CData(c) => {
                let text = xml::cdata(c);
                if let Some(record) = open.as_mut() {
                    record.push_text(path.len(), &text);
                }
            }
            Event::End(_) => {
                let depth = path.len();
                let closes_record = open.as_ref().is_some_and(|r| r.depth == depth);
                if closes_record {
                    if let Some(record) = open.take() {
                        page.insert(record.into_summary());
                        count += 1;
                    }
                } else if let Some(record) = open.as_mut() {
                    if depth == record.depth + 1 {
                        record.capturing = None;
                    }
                }
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if open.is_some() {
        return Err(DecodeError::Xml("unterminated TABLE_INF element".into()));
    }
    status.check()?;

    Ok((page, count))
}

/// Decode a keyed (JSON) listing page
///
/// Records live under `GET_STATS_LIST.DATALIST_INF.TABLE_INF` as a single
/// object or an array. A "no data" status without a data list decodes to an
/// empty page.
pub fn decode_keyed(body: &str) -> Result<(Page, usize), DecodeError> {
    let root: Value = serde_json::from_str(strip_bom(body))?;
    let envelope = json::descend(&root, &["GET_STATS_LIST"])?;
    let status = json::check_result(envelope)?;

    let Some(datalist) = envelope.get("DATALIST_INF") else {
        if status == Some(json::STATUS_NO_DATA) {
            return Ok((Page::new(), 0));
        }
        return Err(DecodeError::MissingField(
            "GET_STATS_LIST.DATALIST_INF".to_string(),
        ));
    };

    let records = match datalist.get("TABLE_INF") {
        Some(value) => json::one_or_many(value, "GET_STATS_LIST.DATALIST_INF.TABLE_INF")?,
        None => Vec::new(),
    };

    let page = records
        .iter()
        .map(|record| {
            StatTableSummary::new(
                record.get("@id").map(json::text_of).unwrap_or_default(),
                select_name(record),
                &record.get("TITLE").map(json::text_of).unwrap_or_default(),
            )
        })
        .collect();

    Ok((page, records.len()))
}

/// Decode a delimited (CSV) listing page
///
/// The first line containing [`LISTING_MARKER`] is the marker; the line after
/// it is the header and the remaining lines are records.
pub fn decode_delimited(body: &str) -> Result<(Page, usize), DecodeError> {
    let lines: Vec<&str> = strip_bom(body).lines().collect();
    let Some(marker) = lines.iter().position(|line| line.contains(LISTING_MARKER)) else {
        if delimited_status(&lines).0 == Some(json::STATUS_NO_DATA) {
            return Ok((Page::new(), 0));
        }
        return Err(missing_marker(&lines, LISTING_MARKER));
    };

    let csv_text = lines[marker + 1..].join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);
    let (id_at, name_at, title_at) = (column("TABLE_INF"), column("STAT_NAME"), column("TITLE"));

    let mut page = Page::new();
    let mut count = 0;
    for record in reader.records() {
        let record = record?;
        let field = |at: Option<usize>| at.and_then(|i| record.get(i)).unwrap_or_default();
        page.insert(StatTableSummary::new(
            field(id_at),
            field(name_at),
            field(title_at),
        ));
        count += 1;
    }

    Ok((page, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markup_listing(records: &[(&str, &str, &str)]) -> String {
        let tables: String = records
            .iter()
            .map(|(id, name, title)| {
                format!(
                    "<TABLE_INF id=\"{id}\"><STAT_NAME code=\"00200521\">{name}</STAT_NAME>\
                     <GOV_ORG code=\"00200\">総務省</GOV_ORG><TITLE no=\"1\">{title}</TITLE></TABLE_INF>"
                )
            })
            .collect();
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <GET_STATS_LIST><RESULT><STATUS>0</STATUS><ERROR_MSG>正常に終了しました。</ERROR_MSG></RESULT>\
             <DATALIST_INF><NUMBER>{}</NUMBER>{tables}</DATALIST_INF></GET_STATS_LIST>",
            records.len()
        )
    }

    fn keyed_listing(records: &[(&str, &str, &str)]) -> String {
        let tables: Vec<Value> = records
            .iter()
            .map(|(id, name, title)| {
                serde_json::json!({
                    "@id": id,
                    "STAT_NAME": {"@code": "00200521", "$": "ignored"},
                    "STATISTICS_NAME": name,
                    "TITLE": {"@no": "1", "$": title},
                })
            })
            .collect();
        serde_json::json!({
            "GET_STATS_LIST": {
                "RESULT": {"STATUS": 0, "ERROR_MSG": "正常に終了しました。"},
                "DATALIST_INF": {"NUMBER": records.len(), "TABLE_INF": tables}
            }
        })
        .to_string()
    }

    fn delimited_listing(records: &[(&str, &str, &str)]) -> String {
        let mut body = String::from(
            "\"RESULT\"\n\"STATUS\",\"0\"\n\"STAT_INF\"\n\"TABLE_INF\",\"STAT_CODE\",\"STAT_NAME\",\"TITLE\"\n",
        );
        for (id, name, title) in records {
            body.push_str(&format!("\"{id}\",\"00200521\",\"{name}\",\"{title}\"\n"));
        }
        body
    }

    const RECORDS: [(&str, &str, &str); 3] = [
        ("0003448237", "国勢調査", "男女別人口"),
        ("0003448238", "国勢調査", "年齢別人口"),
        ("0000010101", "社会・人口統計体系", "基礎データ"),
    ];

    // ============================================================================
    // Page tests
    // ============================================================================

    #[test]
    fn test_page_preserves_insertion_order() {
        let page: Page = RECORDS
            .iter()
            .map(|(id, name, title)| StatTableSummary::new(*id, *name, title))
            .collect();

        assert_eq!(page.ids(), vec!["0003448237", "0003448238", "0000010101"]);
    }

    #[test]
    fn test_page_duplicate_id_replaces_in_place() {
        let mut page = Page::new();
        page.insert(StatTableSummary::new("a", "first", "t1"));
        page.insert(StatTableSummary::new("b", "second", "t2"));
        page.insert(StatTableSummary::new("a", "replaced", "t3"));

        assert_eq!(page.len(), 2);
        assert_eq!(page.ids(), vec!["a", "b"]);
        assert_eq!(page.get("a").unwrap().name, "replaced");
    }

    // ============================================================================
    // Decoder tests
    // ============================================================================

    #[test]
    fn test_all_formats_preserve_count_and_order() {
        let bodies = [
            (markup_listing(&RECORDS), decode_markup as fn(&str) -> Result<(Page, usize), DecodeError>),
            (keyed_listing(&RECORDS), decode_keyed),
            (delimited_listing(&RECORDS), decode_delimited),
        ];

        for (body, decode) in bodies {
            let (page, count) = decode(&body).unwrap();
            assert_eq!(count, 3);
            assert_eq!(page.ids(), vec!["0003448237", "0003448238", "0000010101"]);

            let first = page.get("0003448237").unwrap();
            assert_eq!(first.name, "国勢調査");
            assert_eq!(first.title, "男女別人口");
        }
    }

    #[test]
    fn test_all_formats_empty_page() {
        let (page, count) = decode_markup(&markup_listing(&[])).unwrap();
        assert_eq!((page.len(), count), (0, 0));

        let (page, count) = decode_keyed(&keyed_listing(&[])).unwrap();
        assert_eq!((page.len(), count), (0, 0));

        let (page, count) = decode_delimited(&delimited_listing(&[])).unwrap();
        assert_eq!((page.len(), count), (0, 0));
    }

    #[test]
    fn test_title_commas_are_cleansed_in_all_formats() {
        // Delimited titles are quoted so the embedded comma survives the CSV layer
        let records = [("0001", "統計", "人口,世帯，年齢")];

        let (page, _) = decode_markup(&markup_listing(&records)).unwrap();
        assert_eq!(page.get("0001").unwrap().title, "人口、世帯、年齢");

        let (page, _) = decode_keyed(&keyed_listing(&records)).unwrap();
        assert_eq!(page.get("0001").unwrap().title, "人口、世帯、年齢");

        let (page, _) = decode_delimited(&delimited_listing(&records)).unwrap();
        assert_eq!(page.get("0001").unwrap().title, "人口、世帯、年齢");
    }

    #[test]
    fn test_markup_missing_children_default_to_empty() {
        let body = "<GET_STATS_LIST><DATALIST_INF>\
                    <TABLE_INF id=\"1\"><TITLE>only title</TITLE></TABLE_INF>\
                    <TABLE_INF id=\"2\"/>\
                    </DATALIST_INF></GET_STATS_LIST>";

        let (page, count) = decode_markup(body).unwrap();

        assert_eq!(count, 2);
        assert_eq!(page.get("1").unwrap().name, "");
        assert_eq!(page.get("1").unwrap().title, "only title");
        assert_eq!(page.get("2").unwrap().title, "");
    }

    #[test]
    fn test_markup_ignores_grandchild_stat_name() {
        let body = "<R><TABLE_INF id=\"1\"><SUB><STAT_NAME>deep</STAT_NAME></SUB>\
                    <STAT_NAME>direct</STAT_NAME></TABLE_INF></R>";

        let (page, _) = decode_markup(body).unwrap();

        assert_eq!(page.get("1").unwrap().name, "direct");
    }

    #[test]
    fn test_markup_unescapes_entities() {
        let body = "<R><TABLE_INF id=\"1\"><STAT_NAME>A &amp; B</STAT_NAME></TABLE_INF></R>";

        let (page, _) = decode_markup(body).unwrap();

        assert_eq!(page.get("1").unwrap().name, "A & B");
    }

    #[test]
    fn test_markup_malformed_is_error() {
        let body = "<GET_STATS_LIST><TABLE_INF id=\"1\"><TITLE>x</STAT_NAME>";
        assert!(decode_markup(body).is_err());
    }

    #[test]
    fn test_markup_api_error_status() {
        let body = "<GET_STATS_LIST><RESULT><STATUS>100</STATUS>\
                    <ERROR_MSG>認証に失敗しました。</ERROR_MSG></RESULT></GET_STATS_LIST>";

        let err = decode_markup(body).unwrap_err();

        assert!(matches!(
            err,
            DecodeError::Api { status: 100, ref message } if message == "認証に失敗しました。"
        ));
    }

    #[test]
    fn test_keyed_single_object_record() {
        let body = serde_json::json!({
            "GET_STATS_LIST": {
                "RESULT": {"STATUS": 0},
                "DATALIST_INF": {"TABLE_INF": {"@id": "42", "STATISTICS_NAME": "単独", "TITLE": "一件"}}
            }
        })
        .to_string();

        let (page, count) = decode_keyed(&body).unwrap();

        assert_eq!(count, 1);
        assert_eq!(page.get("42").unwrap().name, "単独");
    }

    #[test]
    fn test_keyed_no_data_status_is_empty_page() {
        let body = r#"{"GET_STATS_LIST":{"RESULT":{"STATUS":1,"ERROR_MSG":"該当データはありません。"}}}"#;

        let (page, count) = decode_keyed(body).unwrap();

        assert!(page.is_empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_keyed_missing_envelope_is_error() {
        let err = decode_keyed(r#"{"SOMETHING_ELSE": {}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingField(ref f) if f == "GET_STATS_LIST"));
    }

    #[test]
    fn test_keyed_invalid_json_is_error() {
        assert!(matches!(decode_keyed("{not json"), Err(DecodeError::Json(_))));
    }

    // ============================================================================
    // Name precedence tests
    // ============================================================================

    #[test]
    fn test_select_name_prefers_statistics_name() {
        let record = serde_json::json!({
            "STATISTICS_NAME": "preferred",
            "STAT_NAME": {"@code": "1", "$": "fallback"}
        });
        assert_eq!(select_name(&record), "preferred");
    }

    #[test]
    fn test_select_name_falls_back_to_stat_name() {
        let record = serde_json::json!({"STAT_NAME": {"@code": "1", "$": "fallback"}});
        assert_eq!(select_name(&record), "fallback");

        let record = serde_json::json!({"STATISTICS_NAME": null, "STAT_NAME": "plain"});
        assert_eq!(select_name(&record), "plain");
    }

    #[test]
    fn test_select_name_absent() {
        assert_eq!(select_name(&serde_json::json!({"TITLE": "t"})), "");
    }

    // ============================================================================
    // Delimited marker tests
    // ============================================================================

    #[test]
    fn test_delimited_marker_on_first_line() {
        let body = "STAT_INF\nTABLE_INF,STAT_NAME,TITLE\n7,name,title\n";

        let (page, count) = decode_delimited(body).unwrap();

        assert_eq!(count, 1);
        assert_eq!(page.get("7").unwrap().title, "title");
    }

    #[test]
    fn test_delimited_missing_marker_is_error() {
        let body = "TABLE_INF,STAT_NAME,TITLE\n7,name,title\n";

        let err = decode_delimited(body).unwrap_err();

        assert!(matches!(err, DecodeError::MarkerNotFound("STAT_INF")));
    }

    #[test]
    fn test_delimited_error_body_reports_status() {
        let body = "\"RESULT\"\n\"STATUS\",\"100\"\n\"ERROR_MSG\",\"認証に失敗しました。\"\n";

        let err = decode_delimited(body).unwrap_err();

        assert!(matches!(err, DecodeError::Api { status: 100, .. }));
    }

    #[test]
    fn test_delimited_no_data_status_is_empty_page() {
        let body = "\"RESULT\"\n\"STATUS\",\"1\"\n\"ERROR_MSG\",\"該当データはありません。\"\n";

        let (page, count) = decode_delimited(body).unwrap();

        assert!(page.is_empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_delimited_handles_bom_and_crlf() {
        let body = "\u{feff}\"STAT_INF\"\r\nTABLE_INF,STAT_NAME,TITLE\r\n9,n,t\r\n";

        let (page, _) = decode_delimited(body).unwrap();

        assert_eq!(page.get("9").unwrap().name, "n");
    }

    #[test]
    fn test_cleanse_title() {
        assert_eq!(cleanse_title("a,b，c、d"), "a、b、c、d");
        assert_eq!(cleanse_title("no commas"), "no commas");
    }
}
