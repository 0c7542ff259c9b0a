use std::fmt;

/// A wrapper that keeps credentials out of logs and formatted output.
///
/// Staff passwords travel through the access layer on their way to the
/// identity store. Wrapping them in `Secret` means a `Debug` of the
/// surrounding request, or a `tracing` field, prints `[REDACTED]`.
/// The value is reachable only through [`expose_secret`](Self::expose_secret).
///
/// # Examples
///
/// ```
/// use patient_access::Secret;
///
/// let password = Secret::new("correct horse".to_string());
/// assert_eq!(format!("{:?}", password), "[REDACTED]");
/// assert_eq!(password.expose_secret(), "correct horse");
/// ```
// No Clone/Copy/Default: a credential should have one owner on its way to the store.
pub struct Secret<T> {
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the wrapped value.
    ///
    /// Only the store adapter that hashes the credential should call this.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
