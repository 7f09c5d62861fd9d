use std::{
    net::TcpListener,
    time::{Duration, Instant},
};

use pretty_assertions::assert_eq;
use soapgen_wsdl::{
    self as wsdl,
    error::ErrorKind,
    resolved::{Shape, SymbolSpace, TypeRef},
    UnsupportedPolicy,
};

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[test]
fn self_and_mutual_imports_load_each_document_once() {
    let (definition, namespaces) = wsdl::parse(fixture("cycle/a.wsdl")).unwrap();

    let documents: Vec<&str> = definition
        .documents
        .iter()
        .map(|url| url.path().rsplit('/').next().unwrap_or_default())
        .collect();
    assert_eq!(documents, vec!["a.wsdl", "b.xsd"]);

    let model = wsdl::resolve(&definition, &namespaces, UnsupportedPolicy::Abort).unwrap();
    let leaf = model.find(SymbolSpace::Type, "urn:b", "Leaf").unwrap();
    let root = model.find(SymbolSpace::Element, "urn:a", "Root").unwrap();

    assert_eq!(
        model
            .declarations()
            .filter(|(_, declaration)| declaration.name.name == "Leaf")
            .count(),
        1
    );

    match &model.declaration(leaf).shape {
        Shape::Struct(members) => {
            assert_eq!(members[1].ty, TypeRef::Declared(root));
            assert!(members[1].boxed);
        }
        other => panic!("unexpected shape {:?}", other),
    }
}

#[test]
fn missing_documents_are_load_errors() {
    let err = wsdl::parse(fixture("does-not-exist.wsdl")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Load);
}

#[test]
fn malformed_xml_is_a_parse_error() {
    let err = wsdl::parse(fixture("broken.wsdl")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn wsdl2_is_rejected() {
    let err = wsdl::parse(fixture("wsdl2.wsdl")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.to_string().contains("WSDL 2.0"));
}

#[test]
fn stalled_remote_documents_time_out() {
    // connections are queued by the OS but never answered
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/service.wsdl", listener.local_addr().unwrap());

    let started = Instant::now();
    let err = wsdl::parse_with_timeout(url, Some(Duration::from_millis(300))).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Load);
    assert!(started.elapsed() < Duration::from_secs(10));
}
