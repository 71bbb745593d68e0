use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::document::ID;
use crate::prelude::*;

/// Fields, which are used as identifier (in this order), if a record
/// has no `_id`.
const ID_FIELDS: [&str; 2] = ["id", "identifier"];

#[inline]
fn local_name(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.local_name().as_ref()).into_owned()
}

#[derive(Debug, Default)]
struct RecordBuilder {
    fields: Map<String, Value>,
}

impl RecordBuilder {
    fn from_start(start: &BytesStart<'_>) -> DateprepResult<Self> {
        let mut builder = Self::default();

        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let value = attr.unescape_value()?.into_owned();
            builder.push(local_name(attr.key), value);
        }

        Ok(builder)
    }

    /// Adds a field value; repeated fields are collected into an array.
    fn push(&mut self, name: String, value: String) {
        match self.fields.get_mut(&name) {
            Some(Value::Array(values)) => values.push(Value::String(value)),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, Value::String(value)]);
            }
            None => {
                self.fields.insert(name, Value::String(value));
            }
        }
    }

    fn finish(mut self, position: usize) -> Document {
        let id = match self.fields.remove(ID) {
            Some(Value::String(id)) => Some(id),
            _ => ID_FIELDS
                .iter()
                .find_map(|key| self.fields.get(*key))
                .and_then(Value::as_str)
                .map(String::from),
        };

        Document::from_parts(
            id.unwrap_or_else(|| position.to_string()),
            self.fields,
        )
    }
}

/// Reads the records of an XML metadata file.
///
/// Every child element of the root element is a record. The attributes
/// and the child elements of a record become string fields; the text
/// of deeper nested elements is added to the enclosing field.
pub(crate) fn read_records<R: BufRead>(
    inner: R,
) -> DateprepResult<Vec<Document>> {
    let mut reader = Reader::from_reader(inner);
    let mut buf = Vec::new();
    let mut records = vec![];

    let mut depth = 0usize;
    let mut record: Option<RecordBuilder> = None;
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                depth += 1;
                match depth {
                    2 => record = Some(RecordBuilder::from_start(&e)?),
                    3 => field = Some((local_name(e.name()), String::new())),
                    _ => {}
                }
            }
            Event::Empty(e) => match depth + 1 {
                2 => {
                    let builder = RecordBuilder::from_start(&e)?;
                    records.push(builder.finish(records.len() + 1));
                }
                3 => {
                    if let Some(ref mut builder) = record {
                        builder.push(local_name(e.name()), String::new());
                    }
                }
                _ => {}
            },
            Event::Text(e) => {
                if let Some((_, ref mut text)) = field {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::CData(e) => {
                if let Some((_, ref mut text)) = field {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                match depth {
                    2 => {
                        if let Some(builder) = record.take() {
                            records.push(builder.finish(records.len() + 1));
                        }
                    }
                    3 => {
                        if let (Some(builder), Some((name, text))) =
                            (record.as_mut(), field.take())
                        {
                            builder.push(name, text.trim().to_string());
                        }
                    }
                    _ => {}
                }

                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }

        buf.clear();
    }

    Ok(records)
}

/// Reads the records of the XML metadata file at `path`.
pub(crate) fn read_file<P: AsRef<Path>>(
    path: P,
) -> DateprepResult<Vec<Document>> {
    read_records(BufReader::new(File::open(path)?))
}
