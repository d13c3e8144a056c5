//! Small helpers over `quick_xml` events shared by the markup decoders

use quick_xml::events::{BytesCData, BytesStart, BytesText};

use crate::error::DecodeError;

/// Element name as an owned string
pub(crate) fn name_of(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// All attributes of an element, unescaped, in document order
pub(crate) fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, DecodeError> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

/// A single attribute by name
pub(crate) fn attribute(e: &BytesStart<'_>, key: &str) -> Result<Option<String>, DecodeError> {
    Ok(attributes(e)?
        .into_iter()
        .find_map(|(k, v)| (k == key).then_some(v)))
}

pub(crate) fn text(t: &BytesText<'_>) -> Result<String, DecodeError> {
    Ok(t.unescape()?.into_owned())
}

pub(crate) fn cdata(c: BytesCData<'_>) -> String {
    String::from_utf8_lossy(&c.into_inner()).into_owned()
}

/// Tracks `RESULT/STATUS` and `RESULT/ERROR_MSG` while a document is scanned
#[derive(Debug, Default)]
pub(crate) struct ResultStatus {
    status: Option<u32>,
    message: String,
}

impl ResultStatus {
    /// Feed the text found at `path`
    pub(crate) fn observe(&mut self, path: &[String], text: &str) {
        let n = path.len();
        if n < 2 || path[n - 2] != "RESULT" {
            return;
        }
        match path[n - 1].as_str() {
            "STATUS" => self.status = text.trim().parse().ok(),
            "ERROR_MSG" => self.message.push_str(text),
            _ => {}
        }
    }

    /// Fail when the API reported an error status (100 and above)
    pub(crate) fn check(&self) -> Result<(), DecodeError> {
        crate::json::status_to_result(self.status, &self.message)
    }
}
