use fieldvault_crypto::{
    generate_random_key, Algorithm, EnvelopeCipher, FieldCipher, FieldCiphertext, KdfParams,
    KeyProvider, LocalKeyProvider, PassthroughFieldCipher, Salt,
};
use std::sync::Arc;

fn fast_kdf_params() -> KdfParams {
    KdfParams {
        memory_cost: 1024,
        time_cost: 1,
        parallelism: 1,
    }
}

#[tokio::test]
async fn create_and_lookup_data_key() {
    let provider = LocalKeyProvider::new(generate_random_key());

    assert!(provider.get_key_by_alt_name("users").await.unwrap().is_none());

    let handle = provider.create_data_key("users").await.unwrap();
    assert_eq!(handle.key_alt_name, "users");

    let found = provider.get_key_by_alt_name("users").await.unwrap().unwrap();
    assert_eq!(found, handle);
}

#[tokio::test]
async fn create_data_key_is_idempotent() {
    let provider = LocalKeyProvider::new(generate_random_key());

    let first = provider.create_data_key("users").await.unwrap();
    let second = provider.create_data_key("users").await.unwrap();

    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn data_key_unwraps_consistently() {
    let provider = LocalKeyProvider::new(generate_random_key());
    provider.create_data_key("users").await.unwrap();

    let first = provider.data_key("users").await.unwrap();
    let second = provider.data_key("users").await.unwrap();

    assert_eq!(first.as_bytes(), second.as_bytes());
}

#[tokio::test]
async fn unknown_alt_name_fails() {
    let provider = LocalKeyProvider::new(generate_random_key());
    assert!(provider.data_key("missing").await.is_err());
}

#[tokio::test]
async fn distinct_collections_get_distinct_keys() {
    let provider = LocalKeyProvider::new(generate_random_key());
    provider.create_data_key("users").await.unwrap();
    provider.create_data_key("documents").await.unwrap();

    let users = provider.data_key("users").await.unwrap();
    let documents = provider.data_key("documents").await.unwrap();

    assert_ne!(users.as_bytes(), documents.as_bytes());
}

#[test]
fn passphrase_derivation_is_deterministic() {
    let salt = Salt::from_bytes([3u8; 16]);
    let params = fast_kdf_params();

    let first = fieldvault_crypto::derive_key("vault passphrase", &salt, &params).unwrap();
    let second = fieldvault_crypto::derive_key("vault passphrase", &salt, &params).unwrap();
    assert_eq!(first.as_bytes(), second.as_bytes());

    let other = fieldvault_crypto::derive_key("other passphrase", &salt, &params).unwrap();
    assert_ne!(first.as_bytes(), other.as_bytes());
}

#[tokio::test]
async fn passphrase_provider_encrypts_and_decrypts() {
    let salt = Salt::from_bytes([3u8; 16]);
    let provider =
        LocalKeyProvider::from_passphrase("vault passphrase", &salt, &fast_kdf_params()).unwrap();

    let cipher = EnvelopeCipher::new(Arc::new(provider));
    cipher.provision(["users"]).await.unwrap();
    let ct = cipher
        .encrypt("hello", "users", Algorithm::Randomized)
        .await
        .unwrap();
    assert_eq!(cipher.decrypt(&ct).await.unwrap(), "hello");
}

#[tokio::test]
async fn envelope_cipher_roundtrip() {
    let provider = Arc::new(LocalKeyProvider::new(generate_random_key()));
    let cipher = EnvelopeCipher::new(provider);
    cipher.provision(["users", "documents"]).await.unwrap();

    let ct = cipher
        .encrypt("n:1234", "users", Algorithm::Randomized)
        .await
        .unwrap();
    assert_eq!(ct.key_ref, "users");
    assert_eq!(cipher.decrypt(&ct).await.unwrap(), "n:1234");
}

#[tokio::test]
async fn provision_is_idempotent() {
    let provider = Arc::new(LocalKeyProvider::new(generate_random_key()));
    let cipher = EnvelopeCipher::new(Arc::clone(&provider) as Arc<dyn KeyProvider>);

    cipher.provision(["users"]).await.unwrap();
    let before = provider.get_key_by_alt_name("users").await.unwrap().unwrap();

    cipher.provision(["users"]).await.unwrap();
    let after = provider.get_key_by_alt_name("users").await.unwrap().unwrap();

    assert_eq!(before.id, after.id);
}

#[tokio::test]
async fn marked_string_roundtrip() {
    let provider = Arc::new(LocalKeyProvider::new(generate_random_key()));
    let cipher = EnvelopeCipher::new(provider);
    cipher.provision(["users"]).await.unwrap();

    let ct = cipher
        .encrypt("secret", "users", Algorithm::Randomized)
        .await
        .unwrap();

    let marked = ct.to_marked_string();
    assert!(FieldCiphertext::is_marked(&marked));

    let parsed = FieldCiphertext::from_marked_string(&marked).unwrap();
    assert_eq!(parsed, ct);
    assert_eq!(cipher.decrypt(&parsed).await.unwrap(), "secret");
}

#[test]
fn ordinary_strings_are_not_marked() {
    assert!(!FieldCiphertext::is_marked("john.doe@example.com"));
    assert!(!FieldCiphertext::is_marked("fv1$nope"));
    assert!(FieldCiphertext::from_marked_string("plain").is_err());
    assert!(FieldCiphertext::from_marked_string("$fv1$").is_err());
    assert!(FieldCiphertext::from_marked_string("$fv1$users").is_err());
}

#[tokio::test]
async fn passthrough_roundtrip() {
    let cipher = PassthroughFieldCipher;
    let ct = cipher
        .encrypt("b:true", "users", Algorithm::Randomized)
        .await
        .unwrap();
    let marked = ct.to_marked_string();
    let parsed = FieldCiphertext::from_marked_string(&marked).unwrap();
    assert_eq!(cipher.decrypt(&parsed).await.unwrap(), "b:true");
}
