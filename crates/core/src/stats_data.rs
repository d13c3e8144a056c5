//! Decoders for a single statistics table (`getStatsData` responses)
//!
//! All three produce a [`StatsTable`] whose classification columns carry
//! display names, whose unit column is [`UNIT_COLUMN`] and whose value column
//! [`VALUE_COLUMN`] holds only numbers or nulls.

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::Value;

use crate::error::DecodeError;
use crate::json;
use crate::listing::{missing_marker, strip_bom};
use crate::table::{Cell, StatsTable, UNIT_COLUMN, VALUE_COLUMN};
use crate::xml::{self, ResultStatus};

/// Marker that precedes the header row in delimited tables
pub const TABLE_MARKER: &str = "VALUE";

/// One classification (`CLASS_OBJ`): its display name and code→name map
#[derive(Debug, Default, Clone)]
struct Classification {
    name: String,
    codes: HashMap<String, String>,
}

impl Classification {
    fn translate(&self, code: &str) -> String {
        self.codes
            .get(code)
            .cloned()
            .unwrap_or_else(|| code.to_string())
    }
}

fn finish(records: Vec<Vec<(String, Cell)>>) -> StatsTable {
    let mut table = StatsTable::from_records(records);
    table.coerce_numeric(VALUE_COLUMN);
    table
}

/// Decode a markup (XML) table
pub fn decode_markup_table(body: &str) -> Result<StatsTable, DecodeError> {
    let mut reader = Reader::from_str(strip_bom(body));
    reader.config_mut().trim_text(true);

    let mut classes: HashMap<String, Classification> = HashMap::new();
    let mut current_class: Option<String> = None;
    let mut raw_values: Vec<(Vec<(String, String)>, String)> = Vec::new();
    let mut in_value = false;
    let mut path: Vec<String> = Vec::new();
    let mut status = ResultStatus::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = xml::name_of(&e);
                match name.as_str() {
                    "CLASS_OBJ" => {
                        let id = xml::attribute(&e, "id")?.unwrap_or_default();
                        let display = xml::attribute(&e, "name")?.unwrap_or_else(|| id.clone());
                        classes.entry(id.clone()).or_default().name = display;
                        current_class = Some(id);
                    }
                    "CLASS" => read_class(&e, current_class.as_deref(), &mut classes)?,
                    "VALUE" => {
                        raw_values.push((xml::attributes(&e)?, String::new()));
                        in_value = true;
                    }
                    _ => {}
                }
                path.push(name);
            }
            Event::Empty(e) => match e.name().as_ref() {
                b"CLASS" => read_class(&e, current_class.as_deref(), &mut classes)?,
                b"VALUE" => raw_values.push((xml::attributes(&e)?, String::new())),
                b"CLASS_OBJ" => {
                    let id = xml::attribute(&e, "id")?.unwrap_or_default();
                    let display = xml::attribute(&e, "name")?.unwrap_or_else(|| id.clone());
                    classes.entry(id).or_default().name = display;
                }
                _ => {}
            },
            Event::Text(t) => {
                let text = xml::text(&t)?;
                if in_value {
                    if let Some((_, value)) = raw_values.last_mut() {
                        value.push_str(&text);
                    }
                }
                status.observe(&path, &text);
            }
            Event::End(e) => {
                match e.name().as_ref() {
                    b"CLASS_OBJ" => current_class = None,
                    b"VALUE" => in_value = false,
                    _ => {}
                }
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    status.check()?;

    let records = raw_values
        .into_iter()
        .map(|(attributes, text)| {
            let mut record: Vec<(String, Cell)> = attributes
                .into_iter()
                .map(|(key, value)| match classes.get(&key) {
                    Some(class) => (class.name.clone(), Cell::Text(class.translate(&value))),
                    None if key == "unit" => (UNIT_COLUMN.to_string(), Cell::Text(value)),
                    None => (key, Cell::Text(value)),
                })
                .collect();
            record.push((VALUE_COLUMN.to_string(), Cell::Text(text.trim().to_string())));
            record
        })
        .collect();

    Ok(finish(records))
}

fn read_class(
    e: &quick_xml::events::BytesStart<'_>,
    class_id: Option<&str>,
    classes: &mut HashMap<String, Classification>,
) -> Result<(), DecodeError> {
    let Some(class_id) = class_id else {
        return Ok(());
    };
    let Some(code) = xml::attribute(e, "code")? else {
        return Ok(());
    };
    let name = xml::attribute(e, "name")?.unwrap_or_else(|| code.clone());
    classes
        .entry(class_id.to_string())
        .or_default()
        .codes
        .insert(code, name);
    Ok(())
}

/// Decode a keyed (JSON) table
///
/// `@<id>` keys of a value record are classification codes: both the key and
/// the code are translated. `@unit` becomes the unit column and `$` the value
/// column; any other key is kept verbatim.
pub fn decode_keyed_table(body: &str) -> Result<StatsTable, DecodeError> {
    let root: Value = serde_json::from_str(strip_bom(body))?;
    let envelope = json::descend(&root, &["GET_STATS_DATA"])?;
    json::check_result(envelope)?;

    let class_objs = json::descend(envelope, &["STATISTICAL_DATA", "CLASS_INF", "CLASS_OBJ"])?;
    let class_objs = json::one_or_many(
        class_objs,
        "GET_STATS_DATA.STATISTICAL_DATA.CLASS_INF.CLASS_OBJ",
    )?;
    let values = json::descend(envelope, &["STATISTICAL_DATA", "DATA_INF", "VALUE"])?;
    let values = json::one_or_many(values, "GET_STATS_DATA.STATISTICAL_DATA.DATA_INF.VALUE")?;

    let mut classes: HashMap<String, Classification> = HashMap::new();
    for obj in class_objs {
        let id = obj.get("@id").map(json::text_of).unwrap_or_default();
        let name = obj
            .get("@name")
            .map(json::text_of)
            .unwrap_or_else(|| id.clone());

        let mut codes = HashMap::new();
        if let Some(class) = obj.get("CLASS") {
            for entry in json::one_or_many(class, "CLASS_OBJ.CLASS")? {
                let code = entry.get("@code").map(json::text_of).unwrap_or_default();
                let display = entry
                    .get("@name")
                    .map(json::text_of)
                    .unwrap_or_else(|| code.clone());
                codes.insert(code, display);
            }
        }
        classes.insert(id, Classification { name, codes });
    }

    let records = values
        .into_iter()
        .map(|value| {
            let Some(map) = value.as_object() else {
                return Vec::new();
            };
            map.iter()
                .map(|(key, raw)| {
                    let text = json::text_of(raw);
                    let class = key.strip_prefix('@').and_then(|id| classes.get(id));
                    match (key.as_str(), class) {
                        (_, Some(class)) => (class.name.clone(), Cell::Text(class.translate(&text))),
                        ("@unit", None) => (UNIT_COLUMN.to_string(), Cell::Text(text)),
                        ("$", None) => (VALUE_COLUMN.to_string(), Cell::Text(text)),
                        (_, None) => (key.clone(), Cell::Text(text)),
                    }
                })
                .collect()
        })
        .collect();

    Ok(finish(records))
}

/// Decode a delimited (CSV) table
///
/// The line reading `VALUE` (quotes ignored) is the marker and the next line
/// is the header. A `<x>_code` column that is followed by another column is
/// dropped, keeping the name column after it.
pub fn decode_delimited_table(body: &str) -> Result<StatsTable, DecodeError> {
    let lines: Vec<&str> = strip_bom(body).lines().collect();
    let marker = lines
        .iter()
        .position(|line| line.trim().replace('"', "") == TABLE_MARKER)
        .ok_or_else(|| missing_marker(&lines, TABLE_MARKER))?;

    let csv_text = lines[marker + 1..].join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(DecodeError::MissingField(format!(
            "header line after '{TABLE_MARKER}'"
        )));
    }

    let mut kept: Vec<(usize, String)> = Vec::new();
    let mut i = 0;
    while i < headers.len() {
        let column = &headers[i];
        if column.ends_with("_code") && i + 1 < headers.len() {
            kept.push((i + 1, headers[i + 1].clone()));
            i += 2;
            continue;
        }
        let display = match column.as_str() {
            "unit" => UNIT_COLUMN.to_string(),
            "value" => VALUE_COLUMN.to_string(),
            _ => column.clone(),
        };
        kept.push((i, display));
        i += 1;
    }

    let mut table = StatsTable::new(kept.iter().map(|(_, name)| name.clone()).collect());
    for record in reader.records() {
        let record = record?;
        let row = kept
            .iter()
            .map(|(at, _)| match record.get(*at) {
                Some(field) => Cell::Text(field.to_string()),
                None => Cell::Null,
            })
            .collect();
        table.push_row(row);
    }
    table.coerce_numeric(VALUE_COLUMN);

    Ok(table)
}
