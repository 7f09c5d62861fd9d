use reqwest::blocking::Client;
use std::{
    collections::{HashMap, HashSet},
    time::Duration,
};
use tracing::{debug, info};
use url::Url;

use super::{
    error, parser,
    types::{Definition, Namespaces},
    xml,
};

/// Retrieves the raw bytes of a document.
pub trait Fetch {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, error::Error>;
}

/// Reads `file://` locations from disk and `http(s)://` locations over the network.
#[derive(Debug, Clone)]
pub struct DefaultFetcher {
    client: Client,
}

/// Serves documents from memory, keyed by absolute URL.
#[derive(Debug, Default, Clone)]
pub struct MemoryFetcher {
    documents: HashMap<Url, Vec<u8>>,
}

impl DefaultFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, error::Error> {
        let mut builder = Client::builder();

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(error::Error::HttpClientError)?;

        Ok(Self { client })
    }
}

impl Fetch for DefaultFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, error::Error> {
        match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| error::Error::PathConversionError(None))?;

                std::fs::read(&path).map_err(|source| error::Error::FileReadError { path, source })
            }

            "http" | "https" => {
                let reqwest_error = |source| error::Error::ReqwestError {
                    url: url.clone(),
                    source,
                };

                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .and_then(|response| response.error_for_status())
                    .map_err(reqwest_error)?;

                Ok(response.bytes().map_err(reqwest_error)?.to_vec())
            }

            other => Err(error::Error::UnsupportedScheme(other.into())),
        }
    }
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: Url, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(url, contents);
        self
    }

    pub fn insert(&mut self, url: Url, contents: impl Into<Vec<u8>>) {
        self.documents.insert(url, contents.into());
    }
}

impl Fetch for MemoryFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, error::Error> {
        self.documents.get(url).cloned().ok_or_else(|| {
            error::Error::FileReadError {
                path: url.path().into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "document not registered"),
            }
        })
    }
}

/// A document as loaded: its location plus the namespace it adopted, if it declares none.
type Visit = (Option<String>, Url);

struct Loader<'a> {
    fetch: &'a dyn Fetch,
    namespaces: Namespaces,
    definition: Definition,
    visited: HashSet<Visit>,
    loaded: Vec<Visit>,
}

impl<'a> Loader<'a> {
    fn new(fetch: &'a dyn Fetch) -> Self {
        Self {
            fetch,
            namespaces: Namespaces::default(),
            definition: Definition::default(),
            visited: HashSet::new(),
            loaded: Vec::new(),
        }
    }

    fn load_url(
        &mut self,
        mut url: Url,
        namespace: Option<String>,
        chameleon: Option<&str>,
    ) -> Result<(), error::Error> {
        url.set_fragment(None);

        let requested = (chameleon.map(ToOwned::to_owned), url.clone());
        if self.visited.contains(&requested) {
            debug!(%url, ?namespace, "skipping document that is already loaded");
            return Ok(());
        }

        let bytes = self.fetch.fetch(&url)?;
        let root = xml::parse(&bytes, &url)?;

        // only a schema without a target namespace takes on the includer's
        let adopted = chameleon
            .filter(|_| root.name == "schema" && root.attribute("targetNamespace").is_none())
            .map(ToOwned::to_owned);

        let visit = (adopted, url.clone());
        self.visited.insert(requested);
        if !self.visited.insert(visit.clone()) {
            debug!(%url, ?namespace, "skipping document that is already loaded");
            return Ok(());
        }

        info!(%url, adopted = ?visit.0, "loading document");
        self.loaded.push(visit);

        let parsed = parser::parse(&root, &url, &mut self.namespaces, chameleon)?;
        self.definition.merge(parsed.definition);

        for reference in parsed.references {
            let location = url.join(&reference.location)?;
            self.load_url(location, reference.namespace, reference.chameleon.as_deref())?;
        }

        Ok(())
    }
}

/// Loads the document at `url` and every document it transitively imports or includes.
pub fn load(url: Url, fetch: &dyn Fetch) -> Result<(Definition, Namespaces), error::Error> {
    let mut loader = Loader::new(fetch);
    loader.load_url(url, None, None)?;

    let chameleons = loader
        .loaded
        .iter()
        .filter(|(adopted, _)| adopted.is_some())
        .count();

    debug!(
        documents = loader.loaded.len(),
        chameleons,
        schemas = loader.definition.schemas.len(),
        "finished loading"
    );

    Ok((loader.definition, loader.namespaces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolved::SymbolSpace, types::SchemaItem};

    const XSD: &str = "http://www.w3.org/2001/XMLSchema";

    fn schema(namespace: &str, body: &str) -> String {
        format!(
            r#"<xs:schema xmlns:xs="{}" targetNamespace="{}">{}</xs:schema>"#,
            XSD, namespace, body
        )
    }

    #[test]
    fn mutual_imports_terminate_without_duplicates() {
        let a = Url::parse("file:///schemas/a.xsd").unwrap();
        let b = Url::parse("file:///schemas/nested/b.xsd").unwrap();

        let fetcher = MemoryFetcher::new()
            .with_document(
                a.clone(),
                schema(
                    "urn:a",
                    r#"<xs:import namespace="urn:b" schemaLocation="nested/b.xsd"/>
                       <xs:import namespace="urn:a" schemaLocation="a.xsd"/>
                       <xs:complexType name="A"/>"#,
                ),
            )
            .with_document(
                b.clone(),
                schema(
                    "urn:b",
                    r#"<xs:import namespace="urn:a" schemaLocation="../a.xsd"/>
                       <xs:complexType name="B"/>"#,
                ),
            );

        let (definition, _) = load(a.clone(), &fetcher).unwrap();

        assert_eq!(definition.documents, vec![a, b]);
        assert_eq!(definition.schemas.len(), 2);

        let types = definition
            .schemas
            .iter()
            .flat_map(|schema| schema.items.iter())
            .filter(|item| matches!(item, SchemaItem::ComplexType(_)))
            .count();
        assert_eq!(types, 2);
    }

    #[test]
    fn chameleon_include_adopts_namespace() {
        let main = Url::parse("file:///main.xsd").unwrap();
        let common = Url::parse("file:///common.xsd").unwrap();

        let fetcher = MemoryFetcher::new()
            .with_document(
                main.clone(),
                schema("urn:main", r#"<xs:include schemaLocation="common.xsd"/>"#),
            )
            .with_document(
                common,
                format!(
                    r#"<xs:schema xmlns:xs="{}"><xs:complexType name="Shared"/></xs:schema>"#,
                    XSD
                ),
            );

        let (definition, namespaces) = load(main, &fetcher).unwrap();
        assert_eq!(definition.schemas[1].target_namespace, "urn:main");

        match &definition.schemas[1].items[0] {
            SchemaItem::ComplexType(complex) => {
                let name = complex.name.as_ref().unwrap();
                assert_eq!(name.namespace(&namespaces), "urn:main");
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[test]
    fn chameleon_include_is_loaded_once_per_namespace() {
        let a = Url::parse("file:///a.xsd").unwrap();
        let b = Url::parse("file:///b.xsd").unwrap();
        let common = Url::parse("file:///common.xsd").unwrap();

        let fetcher = MemoryFetcher::new()
            .with_document(
                a.clone(),
                schema(
                    "urn:a",
                    r#"<xs:include schemaLocation="common.xsd"/>
                       <xs:import namespace="urn:b" schemaLocation="b.xsd"/>"#,
                ),
            )
            .with_document(
                b.clone(),
                format!(
                    r#"<xs:schema xmlns:xs="{}" xmlns:tns="urn:b" targetNamespace="urn:b">
                         <xs:include schemaLocation="common.xsd"/>
                         <xs:include schemaLocation="common.xsd"/>
                         <xs:element name="UsesShared" type="tns:Shared"/>
                       </xs:schema>"#,
                    XSD
                ),
            )
            .with_document(
                common.clone(),
                format!(
                    r#"<xs:schema xmlns:xs="{}"><xs:complexType name="Shared"/></xs:schema>"#,
                    XSD
                ),
            );

        let (definition, namespaces) = load(a.clone(), &fetcher).unwrap();
        assert_eq!(definition.documents, vec![a, common.clone(), b, common]);

        let model = crate::resolve(&definition, &namespaces, crate::UnsupportedPolicy::Abort).unwrap();
        assert!(model.find(SymbolSpace::Type, "urn:a", "Shared").is_some());
        assert!(model.find(SymbolSpace::Type, "urn:b", "Shared").is_some());
        assert!(model.find(SymbolSpace::Element, "urn:b", "UsesShared").is_some());
    }

    #[test]
    fn missing_import_is_a_load_error() {
        let main = Url::parse("file:///main.xsd").unwrap();
        let fetcher = MemoryFetcher::new().with_document(
            main.clone(),
            schema("urn:main", r#"<xs:import schemaLocation="gone.xsd"/>"#),
        );

        let error = load(main, &fetcher).unwrap_err();
        assert_eq!(error.kind(), crate::error::ErrorKind::Load);
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let fetcher = DefaultFetcher::new(Some(Duration::from_secs(1))).unwrap();
        let err = fetcher
            .fetch(&Url::parse("ftp://example.com/service.wsdl").unwrap())
            .unwrap_err();

        assert!(matches!(err, error::Error::UnsupportedScheme(scheme) if scheme == "ftp"));
    }
}
