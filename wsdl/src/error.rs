use std::path::PathBuf;
use thiserror::Error;
use url::Url;

use crate::resolved::Unsupported;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Unable to parse provided URL")]
    UrlParseError(#[from] url::ParseError),

    #[error("Unable to convert provided path")]
    PathConversionError(Option<std::io::Error>),

    #[error("Unable to read file {path}")]
    FileReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Unable to get {url} from server")]
    ReqwestError { url: Url, source: reqwest::Error },

    #[error("Unable to build HTTP client")]
    HttpClientError(#[source] reqwest::Error),

    #[error("Unsupported URL scheme {0}")]
    UnsupportedScheme(String),

    #[error("Error parsing XML input {url}")]
    XmlParseError { url: Url, source: quick_xml::Error },

    #[error("Malformed document {url}: {message}")]
    MalformedDocument { url: Url, message: String },

    #[error("Unresolved reference to {0}")]
    UnresolvedReference(String),

    #[error("Unsupported construct: {0}")]
    UnsupportedConstruct(Unsupported),
}

/// Coarse classification of [`Error`], mirroring the pipeline stage that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Load,
    Parse,
    UnresolvedReference,
    UnsupportedConstruct,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UrlParseError(_)
            | Error::PathConversionError(_)
            | Error::FileReadError { .. }
            | Error::ReqwestError { .. }
            | Error::HttpClientError(_)
            | Error::UnsupportedScheme(_) => ErrorKind::Load,

            Error::XmlParseError { .. } | Error::MalformedDocument { .. } => ErrorKind::Parse,

            Error::UnresolvedReference(_) => ErrorKind::UnresolvedReference,
            Error::UnsupportedConstruct(_) => ErrorKind::UnsupportedConstruct,
        }
    }

    pub(crate) fn malformed(url: &Url, message: impl Into<String>) -> Self {
        Error::MalformedDocument {
            url: url.clone(),
            message: message.into(),
        }
    }
}
