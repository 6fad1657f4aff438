use thiserror::Error;

/// Represents errors that can occur in the switchboard library
#[derive(Error, Debug)]
pub enum Error {
    /// No provider is registered, so there is nothing to dispatch to
    #[error("No provider available: register at least one provider before chatting")]
    NoProvider,

    /// Error during serialization or deserialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error during HTTP request
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Couldn't parse base url")]
    BaseUrl(#[from] url::ParseError),

    /// Rate limit exceeded
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The backend rejected the request
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response stream was malformed or the backend reported a failure mid-stream
    #[error("Stream error: {0}")]
    Stream(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// A Result type that uses our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Api {
            status: 400,
            message: "bad model".into(),
        };
        assert_eq!(err.to_string(), "API error (400): bad model");
        assert_eq!(
            Error::RateLimit("slow down".into()).to_string(),
            "Rate limit exceeded: slow down"
        );
    }

    #[test]
    fn test_serde_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
