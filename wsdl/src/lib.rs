use std::{path::Path, time::Duration};
use url::Url;

mod parser;

pub mod error;
pub mod loader;
pub mod resolved;
pub mod resolver;
pub mod types;
pub mod xml;

pub use loader::{DefaultFetcher, Fetch, MemoryFetcher};
pub use resolver::{resolve, UnsupportedPolicy};

/// Namespace URIs the loader and resolver give meaning to.
pub mod ns {
    pub const XSD: &str = "http://www.w3.org/2001/XMLSchema";
    pub const XSD_2000: &str = "http://www.w3.org/2000/10/XMLSchema";
    pub const XSD_1999: &str = "http://www.w3.org/1999/XMLSchema";
    pub const WSDL: &str = "http://schemas.xmlsoap.org/wsdl/";
    pub const SOAP11_BINDING: &str = "http://schemas.xmlsoap.org/wsdl/soap/";
    pub const SOAP12_BINDING: &str = "http://schemas.xmlsoap.org/wsdl/soap12/";
    pub const SOAP_ENCODING: &str = "http://schemas.xmlsoap.org/soap/encoding/";
    pub const XML: &str = crate::xml::XML_NAMESPACE;
}

/// Turns a URL or a local path into an absolute URL.
pub fn location<S: AsRef<str>>(location: S) -> Result<Url, error::Error> {
    match Url::parse(location.as_ref()) {
        // single letters are Windows drive prefixes, not schemes
        Ok(url) if url.scheme().len() > 1 => Ok(url),
        Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
            let path = Path::new(location.as_ref())
                .canonicalize()
                .map_err(|err| error::Error::PathConversionError(Some(err)))?;

            Url::from_file_path(&path).map_err(|()| error::Error::PathConversionError(None))
        }
        Err(err) => Err(err.into()),
    }
}

pub fn parse<S: AsRef<str>>(
    url: S,
) -> Result<(types::Definition, types::Namespaces), error::Error> {
    parse_with_timeout(url, None)
}

pub fn parse_with_timeout<S: AsRef<str>>(
    url: S,
    timeout: Option<Duration>,
) -> Result<(types::Definition, types::Namespaces), error::Error> {
    let fetcher = DefaultFetcher::new(timeout)?;
    parse_with(url, &fetcher)
}

pub fn parse_with<S: AsRef<str>>(
    url: S,
    fetch: &dyn Fetch,
) -> Result<(types::Definition, types::Namespaces), error::Error> {
    loader::load(location(url)?, fetch)
}
