use proc_macro2::TokenStream;
use quote::quote;

use super::codegen::Context;

pub fn header(context: &Context) -> TokenStream {
    let package = format!(
        " Generated SOAP client for the `{}` package.",
        context.config.package()
    );

    let documents = context
        .model
        .namespaces()
        .namespaces()
        .iter()
        .filter(|namespace| !namespace.is_empty())
        .map(|namespace| format!(" - `{}`", namespace));

    quote! {
        #![doc = #package]
        #![doc = ""]
        #![doc = " Namespaces:"]
        #(#![doc = #documents])*
        #![allow(dead_code, non_camel_case_types, non_snake_case, clippy::all)]

        use serde::{Deserialize, Serialize};
        use serde::de::DeserializeOwned;
        use std::time::Duration;

        // keeps the imports used when a section is empty
        const _: Option<Duration> = None;
        fn _assert_serde<T: Serialize + DeserializeOwned>() {}

        /// Qualified name of a type that can be sent as a SOAP body.
        pub trait XmlElement {
            const NAMESPACE: &'static str;
            const NAME: &'static str;
        }
    }
}
