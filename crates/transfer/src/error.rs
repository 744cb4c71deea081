use thiserror::Error;

/// Errors raised while fetching the control file or preparing the client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP client could not be constructed.
    #[error("failed to construct HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The server answered the control-file request with a non-2xx status.
    #[error("control file download failed for {url}: status {status}")]
    Status {
        /// URL of the control file.
        url: String,
        /// Status the server returned.
        status: u16,
    },

    /// The request never completed (timeout, connection failure, body error).
    #[error("control file download failed for {url}: {source}")]
    Transport {
        /// URL of the control file.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// A URL could not be parsed or resolved against the control file's URL.
    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
        /// Parser diagnostic.
        #[source]
        source: url::ParseError,
    },
}
