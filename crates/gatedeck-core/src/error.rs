// ── Core error types ──
//
// One variant per failure class of the dump pipeline. Every variant keeps
// the underlying `gatedeck_api::Error` as its source, so callers can still
// ask whether a failure was a timeout or a refused connection.

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::dump::DumpStage;

/// Boxed error accepted by the aggregator and returned by state writers.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A client could not be built. Raised before any network call.
    #[error("{stage}: {source}")]
    Config {
        stage: DumpStage,
        #[source]
        source: gatedeck_api::Error,
    },

    /// Login was rejected or the managed API was unreachable.
    #[error("authenticating with Konnect: {source}")]
    Auth {
        #[source]
        source: gatedeck_api::Error,
    },

    /// No single control plane matched, or the lookup call failed.
    #[error("resolving control plane: {message}")]
    Resolution {
        message: String,
        #[source]
        source: Option<gatedeck_api::Error>,
    },

    /// A collection read failed. The whole fetch is abandoned.
    #[error("fetching {collection}: {source}")]
    Fetch {
        collection: String,
        #[source]
        source: gatedeck_api::Error,
    },

    /// The state writer failed. Surfaced as-is.
    #[error("writing state: {source}")]
    Serialization {
        #[source]
        source: BoxError,
    },

    /// Several independent validation failures.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ErrorArray),
}

impl CoreError {
    /// The API error underneath, if this failure came from a client.
    pub fn api_error(&self) -> Option<&gatedeck_api::Error> {
        match self {
            Self::Config { source, .. } | Self::Auth { source } | Self::Fetch { source, .. } => {
                Some(source)
            }
            Self::Resolution { source, .. } => source.as_ref(),
            Self::Serialization { .. } | Self::Validation(_) => None,
        }
    }

    /// The pipeline stage that failed.
    pub fn stage(&self) -> Option<DumpStage> {
        match self {
            Self::Config { stage, .. } => Some(*stage),
            Self::Auth { .. } => Some(DumpStage::Authenticate),
            Self::Resolution { .. } => Some(DumpStage::ResolveControlPlane),
            Self::Fetch { .. } => Some(DumpStage::FetchState),
            Self::Serialization { .. } => Some(DumpStage::WriteState),
            Self::Validation(_) => None,
        }
    }
}

// ── Error aggregator ─────────────────────────────────────────────────

/// An ordered collection of independent failures.
///
/// Used where every failure is worth reporting at once (multi-field
/// config validation). Fetching is fail-fast and never aggregates.
///
/// Renders as `nil` when empty, otherwise a count header followed by one
/// tab-indented line per error, in insertion order:
///
/// ```text
/// 2 errors occurred:
/// 	first
/// 	second
/// ```
#[derive(Debug, Default)]
pub struct ErrorArray {
    errors: Vec<BoxError>,
}

impl ErrorArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: impl Into<BoxError>) {
        self.errors.push(error.into());
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn StdError + Send + Sync + 'static)> {
        self.errors.iter().map(|e| &**e)
    }

    /// `Ok(())` when nothing was collected, the array itself otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ErrorArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.errors.is_empty() {
            return f.write_str("nil");
        }
        writeln!(f, "{} errors occurred:", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "\t{error}")?;
        }
        Ok(())
    }
}

impl StdError for ErrorArray {}

impl<E: Into<BoxError>> Extend<E> for ErrorArray {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.errors.extend(iter.into_iter().map(Into::into));
    }
}
