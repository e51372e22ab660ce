use fieldvault_crypto::{
    generate_random_key, EnvelopeCipher, FieldCiphertext, LocalKeyProvider, PassthroughFieldCipher,
};
use fieldvault_engine::{
    mask_value, CollectionRule, EncryptionConfig, EngineSettings, FieldEngine,
    DATA_MASKING_REQUIRED, ORIGINAL_ATTRIBUTES,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;

fn masking_engine(rule: CollectionRule) -> FieldEngine {
    FieldEngine::new(
        EngineSettings::default(),
        EncryptionConfig::new().with_collection("users", rule),
        Arc::new(PassthroughFieldCipher),
    )
}

fn is_ciphertext(value: &Value) -> bool {
    matches!(value, Value::String(s) if FieldCiphertext::is_marked(s))
}

#[test]
fn email_masks_keep_the_domain() {
    assert_eq!(
        mask_value(&json!("john.doe@example.com")),
        json!("********@example.com")
    );
}

#[test]
fn non_email_strings_mask_to_their_length() {
    assert_eq!(mask_value(&json!("secret123")), json!("*********"));
    assert_eq!(mask_value(&json!("")), json!(""));
}

#[test]
fn non_strings_mask_to_their_stringified_length() {
    assert_eq!(mask_value(&json!(12345)), json!("*****"));
    assert_eq!(mask_value(&json!(true)), json!("****"));
}

#[test]
fn at_sign_alone_does_not_make_an_email() {
    // No dotted domain, or whitespace: plain length mask.
    assert_eq!(mask_value(&json!("a@b")), json!("***"));
    assert_eq!(mask_value(&json!("not an@email .com")), json!("*****************"));
}

#[tokio::test]
async fn masking_archives_the_encrypted_value() {
    let engine = masking_engine(CollectionRule::auto().with_include_fields(["email"]));
    let doc = json!({
        "email": "john.doe@example.com",
        DATA_MASKING_REQUIRED: true
    });

    let encrypted = engine.encrypt("users", &doc).await.unwrap();

    // Display position is masked plaintext; the archive holds ciphertext.
    assert_eq!(encrypted["email"], json!("********@example.com"));
    assert!(is_ciphertext(&encrypted[ORIGINAL_ATTRIBUTES]["email"]));
}

#[tokio::test]
async fn masking_requires_the_document_flag() {
    let engine = masking_engine(CollectionRule::auto().with_include_fields(["email"]));
    let doc = json!({"email": "john.doe@example.com"});

    let encrypted = engine.encrypt("users", &doc).await.unwrap();

    assert!(is_ciphertext(&encrypted["email"]));
    assert!(encrypted.get(ORIGINAL_ATTRIBUTES).is_none());
}

#[tokio::test]
async fn masking_is_idempotent_across_passes() {
    let engine = masking_engine(CollectionRule::auto().with_include_fields(["email", "ssn"]));
    let doc = json!({
        "email": "john.doe@example.com",
        "ssn": "111-11-1111",
        DATA_MASKING_REQUIRED: true
    });

    let first = engine.encrypt("users", &doc).await.unwrap();
    let second = engine.encrypt("users", &first).await.unwrap();

    assert_eq!(second, first);
}

#[tokio::test]
async fn nested_fields_archive_under_nested_paths() {
    let engine = masking_engine(CollectionRule::auto().with_include_fields(["contact.email"]));
    let doc = json!({
        "contact": {"email": "a.b@example.com"},
        DATA_MASKING_REQUIRED: true
    });

    let encrypted = engine.encrypt("users", &doc).await.unwrap();

    assert_eq!(encrypted["contact"]["email"], json!("***@example.com"));
    assert!(is_ciphertext(
        &encrypted[ORIGINAL_ATTRIBUTES]["contact"]["email"]
    ));
}

#[tokio::test]
async fn wildcard_fields_mask_every_match() {
    let engine = masking_engine(CollectionRule::auto().with_include_fields(["items.*.ssn"]));
    let doc = json!({
        "items": [{"ssn": "111-11-1111"}, {"ssn": "22-2"}],
        DATA_MASKING_REQUIRED: true
    });

    let encrypted = engine.encrypt("users", &doc).await.unwrap();

    assert_eq!(encrypted["items"][0]["ssn"], json!("***********"));
    assert_eq!(encrypted["items"][1]["ssn"], json!("****"));
    assert!(is_ciphertext(
        &encrypted[ORIGINAL_ATTRIBUTES]["items"][0]["ssn"]
    ));
    assert!(is_ciphertext(
        &encrypted[ORIGINAL_ATTRIBUTES]["items"][1]["ssn"]
    ));
}

#[tokio::test]
async fn masked_document_recovers_through_original_attributes() {
    let cipher = Arc::new(EnvelopeCipher::new(Arc::new(LocalKeyProvider::new(
        generate_random_key(),
    ))));
    cipher.provision(["users"]).await.unwrap();
    // Auto mode: on decrypt, original_attributes is a top-level field
    // like any other, so the archived values come back as plaintext.
    let engine = FieldEngine::new(
        EngineSettings::default(),
        EncryptionConfig::new().with_collection("users", CollectionRule::auto()),
        cipher,
    );

    let doc = json!({
        "email": "john.doe@example.com",
        "age": 30,
        DATA_MASKING_REQUIRED: true
    });

    let encrypted = engine.encrypt("users", &doc).await.unwrap();
    assert_eq!(encrypted["email"], json!("********@example.com"));

    let decrypted = engine.decrypt("users", encrypted).await.unwrap();
    assert_eq!(
        decrypted[ORIGINAL_ATTRIBUTES]["email"],
        json!("john.doe@example.com")
    );
    assert_eq!(decrypted[ORIGINAL_ATTRIBUTES]["age"], json!(30));
    // The display position stays masked; recovery goes through the archive.
    assert_eq!(decrypted["email"], json!("********@example.com"));
}

#[tokio::test]
async fn original_attributes_itself_is_never_masked() {
    let engine = masking_engine(CollectionRule::auto());
    let doc = json!({
        "ssn": "111-11-1111",
        DATA_MASKING_REQUIRED: true
    });

    let first = engine.encrypt("users", &doc).await.unwrap();
    // Second pass over a document that now carries original_attributes:
    // auto mode selects it as a top-level field, but it must not be
    // archived inside itself.
    let second = engine.encrypt("users", &first).await.unwrap();

    assert!(second[ORIGINAL_ATTRIBUTES].get(ORIGINAL_ATTRIBUTES).is_none());
}
