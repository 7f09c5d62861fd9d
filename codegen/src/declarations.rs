use proc_macro2::TokenStream;
use quote::quote;
use soapgen_wsdl::{
    ns,
    resolved::{Member, MemberKind, Origin, Shape, TypeIdx},
};

use super::codegen::{codegen_all, doc_attributes, ident, type_ref, Codegen, Context};

pub fn declarations(context: &Context) -> TokenStream {
    let order: Vec<TypeIdx> = context.model.declarations().map(|(idx, _)| idx).collect();
    let items = codegen_all(&order, context);

    quote! { #(#items)* }
}

fn wire_name(member: &Member, context: &Context) -> String {
    match member.kind {
        MemberKind::Element => member.name.name.clone(),
        MemberKind::Attribute if member.name.is_in(context.model.namespaces(), ns::XML) => {
            format!("@xml:{}", member.name.name)
        }
        MemberKind::Attribute => format!("@{}", member.name.name),
        MemberKind::Text => "$text".into(),
    }
}

fn field(member: &Member, name: &str, context: &Context) -> TokenStream {
    let name = ident(name);
    let wire = wire_name(member, context);
    let docs = doc_attributes(member.documentation.as_deref());

    let inner = type_ref(member.ty, context);
    let inner = if member.boxed {
        quote! { Box<#inner> }
    } else {
        inner
    };

    let (ty, serde) = if member.repeated {
        (
            quote! { Vec<#inner> },
            quote! { #[serde(rename = #wire, default, skip_serializing_if = "Vec::is_empty")] },
        )
    } else if member.optional || member.boxed {
        (
            quote! { Option<#inner> },
            quote! { #[serde(rename = #wire, default, skip_serializing_if = "Option::is_none")] },
        )
    } else {
        (inner, quote! { #[serde(rename = #wire)] })
    };

    quote! {
        #docs
        #serde
        pub #name: #ty,
    }
}

fn xml_element(name: &proc_macro2::Ident, idx: TypeIdx, context: &Context) -> TokenStream {
    let identifier = context.names.declaration(idx);
    let namespace = &identifier.namespace;
    let local_name = &identifier.local_name;

    quote! {
        impl XmlElement for #name {
            const NAMESPACE: &'static str = #namespace;
            const NAME: &'static str = #local_name;
        }
    }
}

impl Codegen for TypeIdx {
    fn codegen(&self, context: &Context) -> TokenStream {
        let idx = *self;
        let declaration = context.model.declaration(idx);
        let identifier = context.names.declaration(idx);

        let name = ident(&identifier.ident);
        let local_name = &identifier.local_name;
        let docs = doc_attributes(declaration.documentation.as_deref());

        let element = match declaration.origin {
            Origin::Element | Origin::Type => xml_element(&name, idx, context),
            Origin::Anonymous => quote! {},
        };

        match &declaration.shape {
            Shape::Struct(members) => {
                let fields = members
                    .iter()
                    .zip(context.names.members(idx))
                    .map(|(member, field_name)| field(member, field_name, context));

                quote! {
                    #docs
                    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
                    #[serde(rename = #local_name)]
                    pub struct #name {
                        #(#fields)*
                    }

                    #element
                }
            }

            Shape::Newtype { ty, boxed } => {
                let inner = type_ref(*ty, context);
                let inner = if *boxed {
                    quote! { Option<Box<#inner>> }
                } else {
                    inner
                };

                quote! {
                    #docs
                    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
                    #[serde(transparent)]
                    pub struct #name(pub #inner);

                    #element
                }
            }

            Shape::Enumeration(values) => {
                let variants = values
                    .iter()
                    .zip(context.names.members(idx))
                    .enumerate()
                    .map(|(position, (value, variant))| {
                        let variant = ident(variant);
                        let default = if position == 0 {
                            quote! { #[default] }
                        } else {
                            quote! {}
                        };

                        quote! {
                            #default
                            #[serde(rename = #value)]
                            #variant,
                        }
                    });

                quote! {
                    #docs
                    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
                    pub enum #name {
                        #(#variants)*
                    }
                }
            }

            Shape::Alias(target) => {
                let target = type_ref(*target, context);

                quote! {
                    #docs
                    pub type #name = #target;
                }
            }
        }
    }
}
