use serde_json::{Map, Value};

use crate::prelude::*;

/// The field holding the document identifier.
pub(crate) const ID: &str = "_id";

/// A JSON document of a collection, identified by `_id`.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Document {
    id: String,
    fields: Map<String, Value>,
}

impl Document {
    pub(crate) fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub(crate) fn from_parts<S: Into<String>>(
        id: S,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Adds a field and returns the document.
    pub(crate) fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub(crate) fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    #[inline]
    pub(crate) fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[inline]
    pub(crate) fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

impl TryFrom<Value> for Document {
    type Error = DateprepError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = value else {
            bail!("document must be a JSON object");
        };

        let id = match fields.remove(ID) {
            Some(Value::String(id)) => id,
            Some(Value::Number(id)) => id.to_string(),
            Some(_) => bail!("invalid document identifier"),
            None => bail!("missing document identifier"),
        };

        Ok(Self { id, fields })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    type TestResult = anyhow::Result<()>;

    #[test]
    fn document_try_from_value() -> TestResult {
        let doc = Document::try_from(json!({
            "_id": "loc.ark+=13960=t02z1nt02",
            "range": "1919-1922",
        }))?;

        assert_eq!(doc.id(), "loc.ark+=13960=t02z1nt02");
        assert_eq!(doc.get_str("range"), Some("1919-1922"));
        assert!(doc.get(ID).is_none());

        let doc = Document::try_from(json!({"_id": 17, "x": 1.5}))?;
        assert_eq!(doc.id(), "17");

        Ok(())
    }

    #[test]
    fn document_try_from_invalid() {
        assert!(Document::try_from(json!([1, 2])).is_err());
        assert!(Document::try_from(json!({"x": 1})).is_err());
        assert!(Document::try_from(json!({"_id": [1]})).is_err());
    }
}
