use std::fmt;

use proc_macro2::TokenStream;
use quote::ToTokens;
use soapgen_wsdl::resolved::Unsupported;
use tracing::debug;

use super::{
    codegen::Context, declarations::declarations, error::Error, header::header,
    operations::operations, transport::transport,
};

/// The independently retrievable parts of the generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Header,
    Types,
    Operations,
    Soap,
}

struct Rendered {
    file: syn::File,
    text: String,
}

/// Rendered sections, each succeeding or failing on its own.
pub struct Sections {
    sections: Vec<(Section, Result<Rendered, Error>)>,
    unsupported: Vec<Unsupported>,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Header,
        Section::Types,
        Section::Operations,
        Section::Soap,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::Types => "types",
            Section::Operations => "operations",
            Section::Soap => "soap",
        }
    }

    fn emit(self, context: &Context) -> TokenStream {
        match self {
            Section::Header => header(context),
            Section::Types => declarations(context),
            Section::Operations => operations(context),
            Section::Soap => transport(context),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn render(section: Section, tokens: TokenStream) -> Result<Rendered, Error> {
    let file = syn::parse2::<syn::File>(tokens).map_err(|source| Error::Syntax { section, source })?;
    let text = prettyplease::unparse(&file);

    debug!(%section, bytes = text.len(), "rendered section");

    Ok(Rendered { file, text })
}

impl Sections {
    pub(crate) fn render(context: &Context) -> Self {
        let sections = Section::ALL
            .iter()
            .map(|&section| (section, render(section, section.emit(context))))
            .collect();

        Self {
            sections,
            unsupported: context.model.unsupported().to_vec(),
        }
    }

    /// Source text of one section. See [`Sections::error`] for why a section failed.
    pub fn get(&self, section: Section) -> Result<&str, Error> {
        match self.sections.iter().find(|(candidate, _)| *candidate == section) {
            Some((_, Ok(rendered))) => Ok(rendered.text.as_str()),
            _ => Err(Error::Assembly(section)),
        }
    }

    pub fn error(&self, section: Section) -> Option<&Error> {
        self.sections
            .iter()
            .find(|(candidate, _)| *candidate == section)
            .and_then(|(_, rendered)| rendered.as_ref().err())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Section, Result<&str, &Error>)> + '_ {
        self.sections.iter().map(|(section, rendered)| {
            (
                *section,
                rendered.as_ref().map(|rendered| rendered.text.as_str()),
            )
        })
    }

    /// Constructs replaced by a supported approximation while resolving.
    pub fn unsupported(&self) -> &[Unsupported] {
        &self.unsupported
    }

    fn rendered(&self) -> Result<Vec<&Rendered>, Error> {
        self.sections
            .iter()
            .map(|(section, rendered)| rendered.as_ref().map_err(|_| Error::Assembly(*section)))
            .collect()
    }

    /// All sections concatenated in header, types, operations, soap order.
    pub fn assemble(&self) -> Result<String, Error> {
        Ok(self
            .rendered()?
            .iter()
            .map(|rendered| rendered.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// The assembled output as tokens, for expansion inside a module.
    pub fn into_tokens(self) -> Result<TokenStream, Error> {
        let mut tokens = TokenStream::new();

        for rendered in self.rendered()? {
            rendered.file.to_tokens(&mut tokens);
        }

        Ok(tokens)
    }
}
