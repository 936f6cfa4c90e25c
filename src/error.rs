use thiserror::Error;

/// Fatal pipeline errors. A card without a price element is deliberately not
/// represented here: it produces a record with price 0 instead of failing
/// the run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("page markup is empty or not parseable")]
    MalformedInput,

    #[error("product card {container}: required {field} element not found")]
    MissingField {
        field: &'static str,
        container: usize,
    },

    #[error("price batch write failed")]
    Persistence(#[from] rusqlite::Error),
}
