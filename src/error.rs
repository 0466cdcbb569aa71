/// An error that can occur in this crate.
///
/// There are three broad categories:
///
/// * A selection referenced a continent, country or city that does not exist
/// in the location catalog. This should not happen when selections are built
/// from catalog-derived options, but it is handled as a recoverable error
/// rather than a fault in the render loop.
/// * The active time zone identifier could not be rendered by the platform's
/// time zone facilities.
/// * A serialized artifact (the catalog asset, a persisted selection) could
/// not be decoded.
///
/// This crate follows the "one error type" pattern: every fallible operation
/// returns this type, and callers that need to branch use the `is_*`
/// predicates rather than matching on structure.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
}

#[derive(Clone, Debug)]
enum ErrorKind {
    /// A catalog lookup failed at the named level (continent, country or
    /// city), along with the key that missed.
    NotFound { level: &'static str, key: String },
    /// A time zone identifier was rejected by the platform's time zone
    /// database, or its output could not be interpreted.
    Format { timezone: String, reason: String },
    /// A serialized artifact failed to decode.
    Parse { what: &'static str, reason: String },
    /// A free-form error not covered by the categories above.
    Adhoc(String),
}

impl Error {
    pub(crate) fn not_found(level: &'static str, key: &str) -> Error {
        Error {
            kind: ErrorKind::NotFound { level, key: key.to_string() },
        }
    }

    pub(crate) fn format(
        timezone: &str,
        reason: impl core::fmt::Display,
    ) -> Error {
        Error {
            kind: ErrorKind::Format {
                timezone: timezone.to_string(),
                reason: reason.to_string(),
            },
        }
    }

    pub(crate) fn parse(
        what: &'static str,
        reason: impl core::fmt::Display,
    ) -> Error {
        Error {
            kind: ErrorKind::Parse { what, reason: reason.to_string() },
        }
    }

    pub(crate) fn adhoc(message: String) -> Error {
        Error { kind: ErrorKind::Adhoc(message) }
    }

    /// Returns true when this error came from a catalog lookup that missed.
    ///
    /// # Example
    ///
    /// ```
    /// use world_clock::{resolve, Catalog, Selection};
    ///
    /// let catalog = Catalog::bundled();
    /// let sel = Selection::new("Atlantis", "Atlantis", "Atlantis");
    /// assert!(resolve(catalog, &sel).unwrap_err().is_not_found());
    /// ```
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::NotFound { .. })
    }

    /// Returns true when this error came from rendering a time in a zone the
    /// platform does not recognize.
    pub fn is_format(&self) -> bool {
        matches!(self.kind, ErrorKind::Format { .. })
    }

    /// Returns true when this error came from decoding a serialized artifact.
    pub fn is_parse(&self) -> bool {
        matches!(self.kind, ErrorKind::Parse { .. })
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self.kind {
            ErrorKind::NotFound { level, ref key } => {
                write!(f, "{level} \"{key}\" not found in location catalog")
            }
            ErrorKind::Format { ref timezone, ref reason } => {
                write!(
                    f,
                    "failed to render time in zone \"{timezone}\": {reason}"
                )
            }
            ErrorKind::Parse { what, ref reason } => {
                write!(f, "failed to parse {what}: {reason}")
            }
            ErrorKind::Adhoc(ref message) => f.write_str(message),
        }
    }
}

impl std::error::Error for Error {}

/// Constructs an adhoc `Error` from `format!` style arguments.
macro_rules! err {
    ($($tt:tt)*) => {{
        crate::error::Error::adhoc(format!($($tt)*))
    }}
}

pub(crate) use err;
