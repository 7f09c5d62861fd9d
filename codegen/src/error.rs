use soapgen_wsdl::error as wsdl;
use thiserror::Error;

use super::output::Section;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error reading WSDL")]
    Wsdl(#[from] wsdl::Error),

    #[error("Generated {section} section is not valid Rust")]
    Syntax {
        section: Section,
        source: syn::Error,
    },

    #[error("Unable to assemble output, the {0} section failed")]
    Assembly(Section),
}
