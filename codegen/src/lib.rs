use std::time::Duration;

use soapgen_wsdl::{
    self as wsdl,
    resolved::ResolvedModel,
    types::{Definition, Namespaces},
    Fetch, UnsupportedPolicy,
};

mod codegen;
mod declarations;
mod header;
mod operations;
mod transport;

pub mod error;
pub mod names;
pub mod output;

pub use error::Error;
pub use names::{RustNames, Sanitizer};
pub use output::{Section, Sections};

/// Options for one generation run.
pub struct Config {
    package: String,
    sanitizer: Box<dyn Sanitizer>,
    policy: UnsupportedPolicy,
    timeout: Option<Duration>,
    request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            package: "myservice".into(),
            sanitizer: Box::new(RustNames),
            policy: UnsupportedPolicy::Degrade,
            timeout: Some(Duration::from_secs(30)),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.sanitizer = Box::new(sanitizer);
        self
    }

    pub fn with_policy(mut self, policy: UnsupportedPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bound on each document fetch. `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Timeout baked into the generated client.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn policy(&self) -> UnsupportedPolicy {
        self.policy
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

pub fn from_url<S: AsRef<str>>(url: S, config: &Config) -> Result<Sections, Error> {
    let (definition, namespaces) = wsdl::parse_with_timeout(url, config.timeout)?;
    from_definition(&definition, &namespaces, config)
}

pub fn from_url_with<S: AsRef<str>>(
    url: S,
    fetch: &dyn Fetch,
    config: &Config,
) -> Result<Sections, Error> {
    let (definition, namespaces) = wsdl::parse_with(url, fetch)?;
    from_definition(&definition, &namespaces, config)
}

pub fn from_definition(
    definition: &Definition,
    namespaces: &Namespaces,
    config: &Config,
) -> Result<Sections, Error> {
    let model = wsdl::resolve(definition, namespaces, config.policy)?;
    Ok(from_model(&model, config))
}

pub fn from_model(model: &ResolvedModel, config: &Config) -> Sections {
    let names = names::IdentifierTable::allocate(model, config.sanitizer.as_ref());

    let context = codegen::Context {
        model,
        names: &names,
        config,
    };

    Sections::render(&context)
}
