extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use soapgen_codegen::{self as codegen, Config};
use std::{error::Error as _, path::Path};
use syn::{
    parse::{Parse, ParseStream},
    parse_macro_input, Ident, LitStr, Token,
};

struct Input {
    module: Ident,
    location: LitStr,
}

impl Parse for Input {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let module = input.parse()?;
        input.parse::<Token![,]>()?;
        let location = input.parse()?;
        input.parse::<Option<Token![,]>>()?;

        Ok(Self { module, location })
    }
}

/// Relative paths are resolved against the invoking crate.
fn resolve_location(location: String) -> String {
    if location.contains("://") || Path::new(&location).is_absolute() {
        return location;
    }

    match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => Path::new(&dir).join(location).to_string_lossy().into_owned(),
        Err(_) => location,
    }
}

fn describe(error: &codegen::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();

    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    message
}

/// `soapgen!(module_name, "service.wsdl")` expands to `pub mod module_name`
/// holding the generated client.
#[proc_macro]
pub fn soapgen(input: TokenStream) -> TokenStream {
    let Input { module, location } = parse_macro_input!(input as Input);

    let config = Config::default().with_package(module.to_string());
    let generated = codegen::from_url(resolve_location(location.value()), &config)
        .and_then(codegen::Sections::into_tokens);

    match generated {
        Ok(tokens) => quote! {
            pub mod #module {
                #tokens
            }
        }
        .into(),

        Err(err) => syn::Error::new(location.span(), describe(&err))
            .to_compile_error()
            .into(),
    }
}
