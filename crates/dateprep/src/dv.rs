//! Derivation of the dependent variable (publication year) from the
//! bibliographic metadata.

use std::fmt::{self, Display};
use std::sync::OnceLock;

use comfy_table::{Row, Table, presets};
use regex::Regex;
use serde_json::Value;

use crate::prelude::*;

/// The collection holding the raw bibliographic metadata.
pub(crate) const METADATA: &str = "metadata";

/// The collection holding the derived dependent variable.
pub(crate) const DV: &str = "dv";

pub(crate) const DATE: &str = "date";
pub(crate) const LANGUAGE: &str = "language";
pub(crate) const ERROR_TAG: &str = "ERROR: ";

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^[^0-9]*([0-9]{4}).*$").unwrap())
}

fn valid_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]{4}").unwrap())
}

/// Normalizes a free-text date to the first run of four digits, if it
/// is preceded by non-digits only. Any other input is tagged with
/// [ERROR_TAG] and kept verbatim.
pub(crate) fn normalize_date(raw: &str) -> String {
    match year_re().captures(raw) {
        Some(caps) => caps[1].to_string(),
        None => format!("{ERROR_TAG}{raw}"),
    }
}

/// Projects a metadata record onto its identifier and normalized date.
/// Records without a date are kept without one.
pub(crate) fn derive_document(doc: &Document) -> Document {
    let derived = Document::new(doc.id());

    match doc.get(DATE) {
        Some(Value::String(raw)) => derived.with(DATE, normalize_date(raw)),
        Some(other) => {
            derived.with(DATE, normalize_date(&other.to_string()))
        }
        None => derived,
    }
}

/// Whether the metadata record is written in `language`. Records with
/// several languages match any of them.
fn has_language(doc: &Document, language: &str) -> bool {
    match doc.get(LANGUAGE) {
        Some(Value::String(value)) => value == language,
        Some(Value::Array(values)) => {
            values.iter().any(|value| value.as_str() == Some(language))
        }
        _ => false,
    }
}

/// Returns the metadata records the dependent variable is derived
/// from. Without a language every record is selected.
fn select_metadata<S: Store>(
    store: &S,
    language: Option<&str>,
) -> DateprepResult<Vec<Document>> {
    let mut docs = store.find(METADATA)?;
    if let Some(language) = language {
        docs.retain(|doc| has_language(doc, language));
    }

    Ok(docs)
}

/// Whether the dependent variable has been derived for every selected
/// metadata record.
pub(crate) fn is_derived<S: Store>(
    store: &S,
    language: Option<&str>,
) -> DateprepResult<bool> {
    if !store.has_collection(DV)? {
        return Ok(false);
    }

    let expected = match language {
        None => store.count(METADATA)?,
        Some(_) => select_metadata(store, language)?.len(),
    };

    Ok(store.count(DV)? >= expected)
}

/// Derives the dependent variable of every selected metadata record
/// and upserts it into the [DV] collection. Returns the number of
/// written records.
pub(crate) fn derive<S: Store>(
    store: &mut S,
    language: Option<&str>,
    quiet: bool,
) -> DateprepResult<usize> {
    const PBAR_DERIVE: &str = "Deriving dates: {human_pos} ({percent}%) | \
        elapsed: {elapsed_precise}{msg}";

    let metadata = select_metadata(store, language)?;
    if let Some(language) = language {
        log::info!(
            "derive dates of {} records (language = {language})",
            metadata.len()
        );
    }

    let pbar = ProgressBarBuilder::new(PBAR_DERIVE, quiet)
        .len(metadata.len() as u64)
        .build();

    let derived: Vec<Document> = metadata
        .iter()
        .inspect(|_| pbar.inc(1))
        .map(derive_document)
        .collect();

    pbar.finish_using_style();
    store.upsert(DV, &derived)
}

/// Counts of empty, missing, erroneous and valid dates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Diagnostics {
    pub(crate) empty: usize,
    pub(crate) missing: usize,
    pub(crate) erroneous: usize,
    pub(crate) valid: usize,
}

impl Diagnostics {
    pub(crate) fn scan<'a, I>(docs: I) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
    {
        docs.into_iter().fold(Self::default(), |mut acc, doc| {
            match doc.get(DATE) {
                None => acc.missing += 1,
                Some(Value::String(date)) => {
                    if date.is_empty() {
                        acc.empty += 1;
                    } else if date.starts_with(ERROR_TAG.trim_end()) {
                        acc.erroneous += 1;
                    } else if valid_re().is_match(date) {
                        acc.valid += 1;
                    }
                }
                Some(_) => {}
            }

            acc
        })
    }

    /// Scans the [DV] collection of the store.
    pub(crate) fn from_store<S: Store>(store: &S) -> DateprepResult<Self> {
        Ok(Self::scan(&store.find(DV)?))
    }

    #[inline]
    pub(crate) fn empty_or_missing(&self) -> usize {
        self.empty + self.missing
    }

    pub(crate) fn to_table(self) -> Table {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_header(Row::from(vec!["date", "count"]));

        for (label, count) in [
            ("empty", self.empty),
            ("nonexistent", self.missing),
            ("empty & nonexistent", self.empty_or_missing()),
            ("erroneous", self.erroneous),
            ("valid", self.valid),
        ] {
            table.add_row(vec![label.to_string(), count.to_string()]);
        }

        table
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_table())
    }
}
