pub(crate) type DateprepResult<T> = Result<T, DateprepError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err(DateprepError::Other(format!($($arg)*)));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub(crate) enum DateprepError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error("unable to connect to store '{location}': {reason}")]
    StoreUnavailable { location: String, reason: String },

    #[error(
        "collections '{}' don't exist in '{database}' database",
        .missing.join("&")
    )]
    MissingCollections {
        database: String,
        missing: Vec<String>,
    },

    #[error("collection '{collection}' doesn't exist in '{database}' database")]
    UnknownCollection { database: String, collection: String },

    #[error(
        "failed to insert '{collection}' collection into '{database}' \
        database: {reason}"
    )]
    Ingestion {
        database: String,
        collection: String,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

impl DateprepError {
    #[inline]
    pub(crate) fn other<T: ToString>(s: T) -> Self {
        Self::Other(s.to_string())
    }
}
