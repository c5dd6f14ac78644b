use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// The URL could not be interpreted at all.
    #[error("invalid url for connection `{name}`: {reason}")]
    MalformedUrl { name: String, reason: String },

    #[error("unsupported database scheme `{scheme}` for connection `{name}`")]
    UnsupportedScheme { name: String, scheme: String },

    #[error("cannot open connection `{name}`: {source}")]
    Open {
        name: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Statement preparation or execution failed; shows the driver's message.
    #[error("{0}")]
    Query(#[from] rusqlite::Error),

    #[error("connection `{0}` is unusable after a panic")]
    Poisoned(String),
}

pub type Result<T> = std::result::Result<T, DbError>;
