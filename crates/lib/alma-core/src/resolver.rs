//! Astronomical name resolution.

use std::{error::Error, fmt, future::Future, pin::Pin};

use alma_store::{ResolutionReason, ResolvedCoordinate};
use tracing::debug;

use crate::parsers::SesameParser;

pub type ResolveFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResolvedCoordinate, ResolutionFailure>> + Send + 'a>>;

/// Turns an object name into J2000 coordinates.
pub trait NameResolver: Send + Sync {
    fn resolve<'a>(&'a self, name: &'a str) -> ResolveFuture<'a>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionFailure {
    NotFound { name: String },
    ServiceUnavailable { message: String },
}

impl ResolutionFailure {
    #[must_use]
    pub const fn reason(&self) -> ResolutionReason {
        match self {
            Self::NotFound { .. } => ResolutionReason::NotFound,
            Self::ServiceUnavailable { .. } => ResolutionReason::ServiceUnavailable,
        }
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { name } => write!(f, "Could not resolve '{name}' - not found by the Sesame name resolver"),
            Self::ServiceUnavailable { message } => {
                write!(f, "name resolver unavailable: {message}")
            }
        }
    }
}

impl Error for ResolutionFailure {}

impl From<reqwest::Error> for ResolutionFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::ServiceUnavailable {
            message: err.to_string(),
        }
    }
}

/// CDS Sesame resolver (`-ox` XML output).
#[derive(Clone)]
pub struct SesameResolver {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl SesameResolver {
    /// `endpoint` is the full resolver path, e.g. `.../nph-sesame/-ox/SNV`.
    #[must_use]
    pub const fn new(client: reqwest::Client, endpoint: reqwest::Url) -> Self {
        Self { client, endpoint }
    }

    async fn lookup(&self, name: &str) -> Result<ResolvedCoordinate, ResolutionFailure> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ResolutionFailure::NotFound {
                name: name.to_string(),
            });
        }
        let mut url = self.endpoint.clone();
        url.set_query(Some(trimmed));
        debug!(name = trimmed, "resolving object name");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionFailure::ServiceUnavailable {
                message: format!("HTTP {status}"),
            });
        }
        let body = response.text().await?;
        match SesameParser::parse(&body) {
            Ok(Some(coordinate)) => Ok(coordinate),
            Ok(None) => Err(ResolutionFailure::NotFound {
                name: trimmed.to_string(),
            }),
            Err(err) => Err(ResolutionFailure::ServiceUnavailable {
                message: err.to_string(),
            }),
        }
    }
}

impl NameResolver for SesameResolver {
    fn resolve<'a>(&'a self, name: &'a str) -> ResolveFuture<'a> {
        Box::pin(self.lookup(name))
    }
}
