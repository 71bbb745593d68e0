use std::collections::BTreeMap;

use polars::prelude::*;
use serde_json::Value;

use super::SparseTable;
use crate::prelude::*;

/// The collection holding the date distributions.
pub(crate) const DATE: &str = "date";

pub(crate) const DISTRIBUTION: &str = "distribution";
pub(crate) const FIRST_RANGE: &str = "firstrange";

/// Fields of a date document, which aren't part of the base set.
const EXCLUDED: [&str; 4] = [DISTRIBUTION, FIRST_RANGE, "firstraw", "raw"];

/// Suffix of the one-hot columns of the first mentioned era.
const FIRST_SUFFIX: &str = "-1st";

#[inline]
pub(crate) fn first_era_column(label: &str) -> String {
    format!("{label}{FIRST_SUFFIX}")
}

/// Whether a document has a date distribution.
#[inline]
fn has_distribution(doc: &Document) -> bool {
    matches!(doc.get(DISTRIBUTION), Some(Value::Object(_)))
}

/// Builds the base set: the identifier and the scalar attributes of
/// every document with a date distribution. An attribute column is
/// numeric, if all present values are numbers.
pub(crate) fn base_frame(docs: &[Document]) -> PolarsResult<DataFrame> {
    let mut table: SparseTable<Value> = SparseTable::default();

    for doc in docs.iter().filter(|doc| has_distribution(doc)) {
        let row: BTreeMap<String, Value> = doc
            .fields()
            .iter()
            .filter(|(key, _)| !EXCLUDED.contains(&key.as_str()))
            .filter(|(_, value)| {
                !matches!(
                    value,
                    Value::Null | Value::Array(_) | Value::Object(_)
                )
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        table.push(doc.id(), row);
    }

    let mut columns = vec![table.id_column()];
    for name in table.names() {
        let values = table.values(name);
        let numeric = values.iter().flatten().all(Value::is_number);

        let column = if numeric {
            let values: Vec<Option<f64>> = values
                .iter()
                .map(|value| value.as_ref().and_then(Value::as_f64))
                .collect();
            Column::new(name.as_str().into(), values)
        } else {
            let values: Vec<Option<String>> = values
                .into_iter()
                .map(|value| {
                    value.map(|value| match value {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                })
                .collect();
            Column::new(name.as_str().into(), values)
        };

        columns.push(column);
    }

    DataFrame::new(columns)
}

/// Flattens the date distributions and the first mentioned era of every
/// document with a distribution.
///
/// Every era label becomes a probability column; an era which wasn't
/// scored for a document reads `0.0`. Every first-era label becomes a
/// boolean column `<label>-1st`, which is `true` for the documents with
/// that label only. A label needn't occur as an era of any
/// distribution.
pub(crate) fn date_features(docs: &[Document]) -> PolarsResult<DataFrame> {
    let mut eras: SparseTable<f64> = SparseTable::default();
    let mut firsts: SparseTable<bool> = SparseTable::default();

    for doc in docs {
        let Some(Value::Object(distribution)) = doc.get(DISTRIBUTION) else {
            continue;
        };

        let mut row = BTreeMap::new();
        for (era, value) in distribution.iter() {
            match value.as_f64() {
                Some(p) => {
                    if !(0.0..=1.0).contains(&p) {
                        log::warn!(
                            "probability of era '{era}' out of range \
                            (id = {}, p = {p})",
                            doc.id()
                        );
                    }

                    row.insert(era.clone(), p);
                }
                None => {
                    log::warn!(
                        "skip non-numeric probability of era '{era}' \
                        (id = {})",
                        doc.id()
                    );
                }
            }
        }

        eras.push(doc.id(), row);

        let mut row = BTreeMap::new();
        match doc.get_str(FIRST_RANGE) {
            Some(label) => {
                row.insert(first_era_column(label), true);
            }
            None => {
                log::warn!("missing first-era label (id = {})", doc.id());
            }
        }

        firsts.push(doc.id(), row);
    }

    let mut columns = vec![eras.id_column()];
    for era in eras.names() {
        columns.push(Column::new(
            era.as_str().into(),
            eras.values_or(era, 0.0),
        ));
    }

    for name in firsts.names() {
        // An era named like a first-era column takes precedence.
        if eras.names().contains(name) {
            log::warn!("skip first-era column '{name}'");
            continue;
        }

        columns.push(Column::new(
            name.as_str().into(),
            firsts.values_or(name, false),
        ));
    }

    log::info!(
        "date features: {} documents, {} eras, {} first-era labels",
        eras.len(),
        eras.names().len(),
        firsts.names().len()
    );

    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use serde_json::json;

    use super::*;
    use crate::document::ID;

    type TestResult = anyhow::Result<()>;

    fn documents() -> Vec<Document> {
        vec![
            Document::new("a")
                .with(
                    DISTRIBUTION,
                    json!({"1840-1860": 0.25, "pre-1839": 0.75}),
                )
                .with(FIRST_RANGE, "pre-1839")
                .with("firstraw", 1824)
                .with("range", "1919-1922")
                .with("raw", "1919"),
            Document::new("b")
                .with(DISTRIBUTION, json!({"1900-1910": 0.5}))
                .with(FIRST_RANGE, "1900-1910")
                .with("range", "1902-1906"),
            Document::new("c").with("range", "1888-1895"),
            Document::new("d")
                .with(DISTRIBUTION, json!({"1840-1860": 1.0}))
                .with(FIRST_RANGE, "1861-1876")
                .with("range", "1840-1860"),
        ]
    }

    fn names(df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    #[test]
    fn base_frame_projection() -> TestResult {
        let df = base_frame(&documents())?;

        assert_eq!(names(&df), [ID, "range"]);
        assert_eq!(df.height(), 3);

        let range: Vec<_> = df.column("range")?.str()?.into_iter().collect();
        assert_eq!(
            range,
            [Some("1919-1922"), Some("1902-1906"), Some("1840-1860")]
        );

        Ok(())
    }

    #[test]
    fn base_frame_attribute_types() -> TestResult {
        let docs = vec![
            Document::new("a")
                .with(DISTRIBUTION, json!({}))
                .with("pages", 120)
                .with("volume", 2)
                .with("tags", json!(["x"])),
            Document::new("b")
                .with(DISTRIBUTION, json!({}))
                .with("pages", 98.5)
                .with("volume", "II"),
            Document::new("c").with(DISTRIBUTION, json!({})),
        ];

        let df = base_frame(&docs)?;
        assert_eq!(names(&df), [ID, "pages", "volume"]);

        let pages: Vec<_> = df.column("pages")?.f64()?.into_iter().collect();
        assert_eq!(pages, [Some(120.0), Some(98.5), None]);

        let volume: Vec<_> = df.column("volume")?.str()?.into_iter().collect();
        assert_eq!(volume, [Some("2"), Some("II"), None]);

        Ok(())
    }

    #[test]
    fn date_features_flatten() -> TestResult {
        let df = date_features(&documents())?;

        assert_eq!(
            names(&df),
            [
                ID,
                "1840-1860",
                "1900-1910",
                "pre-1839",
                "1861-1876-1st",
                "1900-1910-1st",
                "pre-1839-1st",
            ]
        );
        assert_eq!(df.height(), 3);

        let p: Vec<_> = df.column("1900-1910")?.f64()?.into_iter().collect();
        assert_eq!(p, [Some(0.0), Some(0.5), Some(0.0)]);

        let p: Vec<_> = df.column("1840-1860")?.f64()?.into_iter().collect();
        assert_eq!(p, [Some(0.25), Some(0.0), Some(1.0)]);

        let first: Vec<_> =
            df.column("1861-1876-1st")?.bool()?.into_iter().collect();
        assert_eq!(first, [Some(false), Some(false), Some(true)]);

        let mut total = 0.0;
        for name in ["1840-1860", "1900-1910", "pre-1839"] {
            total += df.column(name)?.f64()?.get(0).unwrap_or_default();
        }
        assert_relative_eq!(total, 1.0);

        Ok(())
    }

    #[test]
    fn date_features_one_hot() -> TestResult {
        let mut docs = documents();
        docs.push(
            Document::new("e").with(DISTRIBUTION, json!({"pre-1839": 0.1})),
        );

        let df = date_features(&docs)?;
        let firsts: Vec<_> = names(&df)
            .into_iter()
            .filter(|name| name.ends_with(FIRST_SUFFIX))
            .collect();

        for idx in 0..df.height() {
            let mut count = 0;
            for name in firsts.iter() {
                if df.column(name)?.bool()?.get(idx) == Some(true) {
                    count += 1;
                }
            }

            let expected = if idx == 3 { 0 } else { 1 };
            assert_eq!(count, expected, "row {idx}");
        }

        Ok(())
    }

    #[test]
    fn date_features_probabilities() -> TestResult {
        let docs = vec![
            Document::new("a")
                .with(DISTRIBUTION, json!({"1900-1910": 0.5, "x": "n/a"}))
                .with(FIRST_RANGE, "1900-1910"),
            Document::new("b")
                .with(DISTRIBUTION, json!({"1880-1890": 0.2}))
                .with(FIRST_RANGE, "1880-1890"),
        ];

        let df = date_features(&docs)?;
        assert!(df.column("x").is_err());

        for name in ["1880-1890", "1900-1910"] {
            for p in df.column(name)?.f64()?.into_iter() {
                let p = p.unwrap();
                assert!((0.0..=1.0).contains(&p));
            }
        }

        let p = df.column("1880-1890")?.f64()?.get(0);
        assert_eq!(p, Some(0.0));

        let docs = vec![Document::new("a")
            .with(DISTRIBUTION, json!({"1900-1910": 0.5}))
            .with(FIRST_RANGE, "1900-1910")];
        let df = date_features(&docs)?;
        assert!(df.column("1880-1890").is_err());

        Ok(())
    }

    #[test]
    fn date_features_empty() -> TestResult {
        let df = date_features(&[Document::new("a")])?;
        assert_eq!(names(&df), [ID]);
        assert_eq!(df.height(), 0);

        Ok(())
    }
}
