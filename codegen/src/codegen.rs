use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use soapgen_wsdl::resolved::{Builtin, ResolvedModel, TypeRef};

use super::{names::IdentifierTable, Config};

/// Everything an emitter reads from.
pub struct Context<'a> {
    pub model: &'a ResolvedModel,
    pub names: &'a IdentifierTable,
    pub config: &'a Config,
}

pub trait Codegen {
    fn codegen(&self, context: &Context) -> TokenStream;
}

pub fn codegen_all(all: &[impl Codegen], context: &Context) -> Vec<TokenStream> {
    all.iter().map(|item| item.codegen(context)).collect()
}

/// Builds an identifier from an allocated name, which may be raw.
pub fn ident(name: &str) -> Ident {
    match name.strip_prefix("r#") {
        Some(raw) => Ident::new_raw(raw, Span::call_site()),
        None => Ident::new(name, Span::call_site()),
    }
}

fn builtin_ty(builtin: Builtin) -> TokenStream {
    match builtin {
        Builtin::String => quote! { String },
        Builtin::Boolean => quote! { bool },
        Builtin::I8 => quote! { i8 },
        Builtin::I16 => quote! { i16 },
        Builtin::I32 => quote! { i32 },
        Builtin::I64 => quote! { i64 },
        Builtin::U8 => quote! { u8 },
        Builtin::U16 => quote! { u16 },
        Builtin::U32 => quote! { u32 },
        Builtin::U64 => quote! { u64 },
        Builtin::F32 => quote! { f32 },
        Builtin::F64 => quote! { f64 },
    }
}

pub fn type_ref(ty: TypeRef, context: &Context) -> TokenStream {
    match ty {
        TypeRef::Builtin(builtin) => builtin_ty(builtin),
        TypeRef::Declared(idx) => {
            let name = ident(&context.names.declaration(idx).ident);
            quote! { #name }
        }
    }
}

/// One `#[doc]` attribute per line so prettyplease puts each on its own line.
pub fn doc_attributes(documentation: Option<&str>) -> TokenStream {
    let lines = documentation
        .into_iter()
        .flat_map(str::lines)
        .map(|line| format!(" {}", line.trim_end()));

    quote! { #(#[doc = #lines])* }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_identifiers_round_trip() {
        assert_eq!(ident("r#type").to_string(), "r#type");
        assert_eq!(ident("GetInfo").to_string(), "GetInfo");
    }

    #[test]
    fn documentation_lines_become_attributes() {
        let tokens = doc_attributes(Some("first\nsecond")).to_string();
        assert_eq!(tokens.matches("doc").count(), 2);
        assert!(doc_attributes(None).is_empty());
    }
}
