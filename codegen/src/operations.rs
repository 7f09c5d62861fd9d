use proc_macro2::TokenStream;
use quote::quote;
use soapgen_wsdl::resolved::{ResolvedOperation, ResolvedPortType, TypeRef};

use super::codegen::{doc_attributes, ident, type_ref, Context};

pub fn operations(context: &Context) -> TokenStream {
    let port_types = context
        .model
        .port_types()
        .iter()
        .enumerate()
        .map(|(position, port_type)| port_type_codegen(position, port_type, context));

    quote! { #(#port_types)* }
}

fn operation_docs(operation: &ResolvedOperation, context: &Context) -> TokenStream {
    let mut lines = Vec::new();

    if let Some(documentation) = &operation.documentation {
        lines.push(documentation.clone());
    }

    let faults: Vec<String> = operation
        .faults
        .iter()
        .map(|fault| match fault {
            TypeRef::Declared(idx) => format!("`{}`", context.names.declaration(*idx).ident),
            TypeRef::Builtin(_) => "`String`".to_owned(),
        })
        .collect();

    if operation.style.as_deref() == Some("rpc") {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("The binding declares rpc style; the request is sent document-literal.".to_owned());
    }

    if !faults.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("Declared faults: {}.", faults.join(", ")));
    }

    let docs = lines.join("\n");
    doc_attributes(Some(docs.as_str()).filter(|docs| !docs.is_empty()))
}

fn operation_codegen(
    operation: &ResolvedOperation,
    method: &str,
    context: &Context,
) -> TokenStream {
    let method = ident(method);
    let docs = operation_docs(operation, context);
    let action = &operation.soap_action;
    let input = type_ref(TypeRef::Declared(operation.input), context);

    match operation.output {
        Some(output) => {
            let output = type_ref(output, context);

            quote! {
                #docs
                pub fn #method(&self, request: &#input) -> Result<#output, SoapError> {
                    self.client.call(#action, request)
                }
            }
        }

        None => quote! {
            #docs
            pub fn #method(&self, request: &#input) -> Result<(), SoapError> {
                self.client.send(#action, request)
            }
        },
    }
}

fn port_type_codegen(
    position: usize,
    port_type: &ResolvedPortType,
    context: &Context,
) -> TokenStream {
    let names = context.names.port_type(position);
    let name = ident(&names.ident.ident);
    let docs = doc_attributes(port_type.documentation.as_deref());

    let methods = port_type
        .operations
        .iter()
        .zip(&names.operations)
        .map(|(operation, method)| operation_codegen(operation, method, context));

    let url = match &port_type.address {
        Some(address) => quote! {
            let url = if url.is_empty() { #address } else { url };
        },
        None => quote! {},
    };

    quote! {
        #docs
        pub struct #name {
            client: SoapClient,
        }

        impl #name {
            pub fn new(
                url: &str,
                insecure_tls: bool,
                auth: Option<BasicAuth>,
                headers: impl IntoIterator<Item = HttpHeader>,
            ) -> Result<Self, SoapError> {
                #url

                Ok(Self {
                    client: SoapClient::new(url, insecure_tls, auth, headers.into_iter().collect())?,
                })
            }

            #(#methods)*
        }
    }
}
