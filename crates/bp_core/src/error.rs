use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The listing page could not be retrieved.
    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    /// The language model failed to produce a post.
    #[error("Generation error: {0}")]
    Generation(String),

    /// A post with this url is already stored.
    #[error("Duplicate post url: {0}")]
    DuplicateKey(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Errors caused by something outside this process (source site, LLM provider).
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Fetch(_) | Error::Generation(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
