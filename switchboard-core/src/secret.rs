use std::fmt;

/// A wrapper type for sensitive information like API keys
///
/// `Secret<T>` hides the inner value in debug output and display implementations
/// so provider configs can be logged without leaking credentials.
///
/// # Examples
///
/// ```
/// use switchboard_core::Secret;
///
/// let api_key = Secret::new("sk-live-123");
/// assert_eq!(format!("{}", api_key), "••••••");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>(T);

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("••••••")
    }
}

impl<T> Secret<T> {
    /// Creates a new Secret wrapper around a value
    pub fn new(value: T) -> Self {
        Secret(value)
    }

    /// Gets a reference to the inner value
    ///
    /// Only providers should call this, at the moment the credential goes into
    /// a request header.
    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Secret<String> {
    /// Returns true when no credential was supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Secret(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Secret(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_debug() {
        let secret = Secret::new("api-key-123");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
    }

    #[test]
    fn test_secret_display() {
        let secret = Secret::new("api-key-123");
        assert_eq!(format!("{}", secret), "••••••");
    }

    #[test]
    fn test_secret_expose() {
        let secret: Secret<String> = "api-key-123".into();
        assert_eq!(secret.expose(), "api-key-123");
        assert!(!secret.is_empty());
        assert!(Secret::<String>::default().is_empty());
    }
}
