//! End-to-end round trips through the facade and both field engines.

use encbox::{Algorithm, Credential, CredentialRegistry, Crypto};
use encbox_fields::{json, xml, FieldError};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

fn crypto() -> Crypto {
    let registry = CredentialRegistry::builder()
        .credential(
            Credential::new("primary", Algorithm::Aes, vec![0u8; 32]).unwrap(),
            true,
        )
        .unwrap()
        .credential(
            Credential::new("legacy", Algorithm::TripleDes, vec![0x11u8; 24]).unwrap(),
            false,
        )
        .unwrap()
        .build();
    Crypto::new(registry)
}

fn paths(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

#[test]
fn xml_field_encryption_end_to_end() {
    let crypto = crypto();
    let doc = "<r><a>secret</a><b>visible</b></r>";

    let sealed = xml::encrypt(&crypto, doc, &paths(&["/r/a"]), None).unwrap();
    assert!(sealed.contains("visible"), "unselected fields stay readable");
    assert!(!sealed.contains("secret"), "selected fields must not leak");

    let open = xml::decrypt(&crypto, &sealed, &paths(&["/r/a"]), None).unwrap();
    assert!(open.contains("<a>secret</a>"));
    assert!(open.contains("<b>visible</b>"));
}

#[test]
fn json_typed_field_encryption_end_to_end() {
    let crypto = crypto();
    let doc = r#"{"x": 42, "y": "keep"}"#;

    let sealed = json::encrypt(&crypto, doc, &paths(&["$.x"]), None).unwrap();
    let value: Value = serde_json::from_str(&sealed).unwrap();
    assert!(value["x"].is_string());
    assert_eq!(value["y"], "keep");

    let open = json::decrypt(&crypto, &sealed, &paths(&["$.x"]), None).unwrap();
    let value: Value = serde_json::from_str(&open).unwrap();
    assert_eq!(value["x"], 42);
}

#[test]
fn json_root_scalar_end_to_end() {
    let crypto = crypto();

    let sealed = json::encrypt(&crypto, r#""hello""#, &paths(&["$"]), None).unwrap();
    let value: Value = serde_json::from_str(&sealed).unwrap();
    assert!(value.is_string());
    assert_ne!(value, "hello");

    let open = json::decrypt(&crypto, &sealed, &paths(&["$"]), None).unwrap();
    let value: Value = serde_json::from_str(&open).unwrap();
    assert_eq!(value, "hello");
}

#[test]
fn named_credential_round_trips_across_engines() {
    let crypto = crypto();
    let doc = r#"{"ssn": "123-45-6789"}"#;

    let sealed = json::encrypt(&crypto, doc, &paths(&["$.ssn"]), Some("legacy")).unwrap();
    // The wrong credential aborts rather than yielding wrong plaintext: the
    // legacy envelopes carry 8-byte IVs, which AES rejects outright.
    let err = json::decrypt(&crypto, &sealed, &paths(&["$.ssn"]), Some("primary")).unwrap_err();
    assert!(matches!(err, FieldError::Crypto { .. }));

    let open = json::decrypt(&crypto, &sealed, &paths(&["$.ssn"]), Some("legacy")).unwrap();
    let value: Value = serde_json::from_str(&open).unwrap();
    assert_eq!(value["ssn"], "123-45-6789");
}

#[test]
fn mixed_paths_and_formats_round_trip() {
    let crypto = crypto();
    let doc = r#"{"user": {"name": "alice", "pin": 9876}, "items": [{"sku": "a"}, {"sku": "b"}]}"#;
    let selectors = paths(&["$.user.pin", "$.items[*].sku"]);

    let sealed = json::encrypt(&crypto, doc, &selectors, None).unwrap();
    let value: Value = serde_json::from_str(&sealed).unwrap();
    assert!(value["user"]["pin"].is_string());
    assert!(value["items"][0]["sku"].is_string());
    assert_eq!(value["user"]["name"], "alice");

    let open = json::decrypt(&crypto, &sealed, &selectors, None).unwrap();
    let value: Value = serde_json::from_str(&open).unwrap();
    assert_eq!(value["user"]["pin"], 9876);
    assert_eq!(value["items"][1]["sku"], "b");
}

#[test]
fn decrypt_pass_over_untouched_document_is_identity() {
    let crypto = crypto();
    let doc = r#"{"a": "one", "b": 2}"#;
    let out = json::decrypt(&crypto, doc, &paths(&["$.a", "$.b"]), None).unwrap();
    let before: Value = serde_json::from_str(doc).unwrap();
    let after: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(before, after);
}

#[test]
fn cancellation_surfaces_before_any_output() {
    let crypto = crypto();
    let token = CancellationToken::new();
    token.cancel();

    let err = xml::encrypt_with_cancel(
        &crypto,
        "<r><a>x</a></r>",
        &paths(&["/r/a"]),
        None,
        &token,
    )
    .unwrap_err();
    assert!(matches!(err, FieldError::Canceled));

    let err = json::decrypt_with_cancel(
        &crypto,
        r#"{"a": "x"}"#,
        &paths(&["$.a"]),
        None,
        &token,
    )
    .unwrap_err();
    assert!(matches!(err, FieldError::Canceled));
}
