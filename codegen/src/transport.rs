use proc_macro2::TokenStream;
use quote::quote;

use super::codegen::Context;

const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// The SOAP 1.1 client every port type delegates to.
pub fn transport(context: &Context) -> TokenStream {
    let timeout = context.config.request_timeout().as_secs();

    quote! {
        pub const SOAP_ENVELOPE_NAMESPACE: &str = #SOAP_ENVELOPE_NAMESPACE;

        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct BasicAuth {
            pub login: String,
            pub password: String,
        }

        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct HttpHeader {
            pub name: String,
            pub value: String,
        }

        #[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
        pub struct SoapFault {
            #[serde(rename = "faultcode", default)]
            pub code: String,
            #[serde(rename = "faultstring", default)]
            pub message: String,
            #[serde(rename = "faultactor", default)]
            pub actor: Option<String>,
        }

        #[derive(Debug)]
        pub enum SoapError {
            Http(reqwest::Error),
            /// A non-success HTTP status whose body holds no SOAP fault.
            Status(u16),
            Xml(String),
            Fault(SoapFault),
        }

        impl std::fmt::Display for SoapError {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    SoapError::Http(err) => write!(f, "HTTP request failed: {}", err),
                    SoapError::Status(status) => write!(f, "HTTP request failed with status {}", status),
                    SoapError::Xml(message) => write!(f, "Invalid SOAP message: {}", message),
                    SoapError::Fault(fault) => write!(f, "SOAP fault {}: {}", fault.code, fault.message),
                }
            }
        }

        impl std::error::Error for SoapError {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                match self {
                    SoapError::Http(err) => Some(err),
                    _ => None,
                }
            }
        }

        #[derive(Deserialize)]
        struct FaultEnvelope {
            #[serde(rename = "Body")]
            body: FaultBody,
        }

        #[derive(Deserialize)]
        struct FaultBody {
            #[serde(rename = "Fault", default)]
            fault: Option<SoapFault>,
        }

        #[derive(Deserialize)]
        struct ResponseEnvelope<T> {
            #[serde(rename = "Body")]
            body: ResponseBody<T>,
        }

        #[derive(Deserialize)]
        struct ResponseBody<T> {
            #[serde(rename = "$value")]
            payload: T,
        }

        /// Wraps `request` in a SOAP envelope, qualifying its root element.
        pub fn encode_request<T: Serialize + XmlElement>(request: &T) -> Result<String, SoapError> {
            let payload = quick_xml::se::to_string_with_root(T::NAME, request)
                .map_err(|err| SoapError::Xml(err.to_string()))?;

            let open = format!("<{}", T::NAME);
            let payload = match payload.strip_prefix(&open) {
                Some(rest) => format!(
                    "{} xmlns=\"{}\"{}",
                    open,
                    quick_xml::escape::escape(T::NAMESPACE),
                    rest
                ),
                None => payload,
            };

            Ok(format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><soap:Envelope xmlns:soap=\"{}\"><soap:Body>{}</soap:Body></soap:Envelope>",
                SOAP_ENVELOPE_NAMESPACE, payload
            ))
        }

        /// Fails with the body's `Fault`, if there is one.
        pub fn check_fault(response: &str) -> Result<(), SoapError> {
            if response.trim().is_empty() {
                return Ok(());
            }

            let envelope: FaultEnvelope = quick_xml::de::from_str(response)
                .map_err(|err| SoapError::Xml(err.to_string()))?;

            match envelope.body.fault {
                Some(fault) => Err(SoapError::Fault(fault)),
                None => Ok(()),
            }
        }

        pub fn decode_response<T: DeserializeOwned>(response: &str) -> Result<T, SoapError> {
            check_fault(response)?;

            let envelope: ResponseEnvelope<T> = quick_xml::de::from_str(response)
                .map_err(|err| SoapError::Xml(err.to_string()))?;

            Ok(envelope.body.payload)
        }

        #[derive(Debug, Clone)]
        pub struct SoapClient {
            url: String,
            auth: Option<BasicAuth>,
            headers: Vec<HttpHeader>,
            http: reqwest::blocking::Client,
        }

        impl SoapClient {
            pub fn new(
                url: &str,
                insecure_tls: bool,
                auth: Option<BasicAuth>,
                headers: Vec<HttpHeader>,
            ) -> Result<Self, SoapError> {
                let http = reqwest::blocking::Client::builder()
                    .danger_accept_invalid_certs(insecure_tls)
                    .timeout(Duration::from_secs(#timeout))
                    .build()
                    .map_err(SoapError::Http)?;

                Ok(Self {
                    url: url.to_owned(),
                    auth,
                    headers,
                    http,
                })
            }

            pub fn call<Req, Resp>(&self, action: &str, request: &Req) -> Result<Resp, SoapError>
            where
                Req: Serialize + XmlElement,
                Resp: DeserializeOwned,
            {
                let response = self.post(action, request)?;
                decode_response(&response)
            }

            /// One-way call: only a fault in the reply is an error.
            pub fn send<Req>(&self, action: &str, request: &Req) -> Result<(), SoapError>
            where
                Req: Serialize + XmlElement,
            {
                let response = self.post(action, request)?;
                check_fault(&response)
            }

            fn post<Req>(&self, action: &str, request: &Req) -> Result<String, SoapError>
            where
                Req: Serialize + XmlElement,
            {
                let envelope = encode_request(request)?;

                let mut builder = self
                    .http
                    .post(&self.url)
                    .header("Content-Type", "text/xml; charset=utf-8")
                    .header("SOAPAction", format!("\"{}\"", action))
                    .body(envelope);

                if let Some(auth) = &self.auth {
                    builder = builder.basic_auth(&auth.login, Some(&auth.password));
                }

                for header in &self.headers {
                    builder = builder.header(header.name.as_str(), header.value.as_str());
                }

                let response = builder.send().map_err(SoapError::Http)?;
                let status = response.status();
                let body = response.text().map_err(SoapError::Http)?;

                if !status.is_success() {
                    return Err(match check_fault(&body) {
                        Err(SoapError::Fault(fault)) => SoapError::Fault(fault),
                        _ => SoapError::Status(status.as_u16()),
                    });
                }

                Ok(body)
            }
        }
    }
}
