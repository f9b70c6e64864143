//! Tests for ECDSA keys, deterministic signing, and encodings

use num_bigint::BigUint;
use num_traits::{Num, One};
use rand::rngs::StdRng;
use rand::SeedableRng;

use txcore::codec::hash256;
use txcore::ecdsa::{PrivateKey, PublicKey, Signature};
use txcore::error::ProtocolError;
use txcore::secp256k1;

fn hex_int(s: &str) -> BigUint {
    BigUint::from_str_radix(s, 16).unwrap()
}

#[test]
fn test_private_key_one_yields_generator() {
    let key = PrivateKey::new(BigUint::one()).unwrap();
    assert_eq!(*key.public_key().point(), secp256k1::generator());
}

#[test]
fn test_known_public_key() {
    // 12345 * G
    let key = PrivateKey::new(BigUint::from(12345u32)).unwrap();
    let point = key.public_key();
    assert_eq!(
        hex::encode(point.sec(true)),
        "03f01d6b9018ab421dd410404cb869072065522bf85734008f105cf385a023a80f"
    );
    assert_eq!(
        hex::encode(point.sec(false)),
        "04f01d6b9018ab421dd410404cb869072065522bf85734008f105cf385a023a80f\
         0eba29d0f0c5408ed681984dc525982abefccd9f7ff01dd26da4999cf3f6a295"
    );
    assert_eq!(
        point.address(false, false),
        "1Fy668EHkFwsrBQJfZsXYVgsGzKDaZhUEj"
    );
}

#[test]
fn test_deterministic_signature_vector() {
    let key = PrivateKey::new(BigUint::from(12345u32)).unwrap();
    let z = BigUint::from_bytes_be(&hash256(b"Programming Bitcoin!"));
    let signature = key.sign(&z).unwrap();
    assert_eq!(
        *signature.r(),
        hex_int("8eeacac05e4c29e793b5287ed044637132ce9ead7fded533e7441d87a8dc9c23")
    );
    assert_eq!(
        *signature.s(),
        hex_int("36674f81f10c7fb347c1224bd546813ea24ada6f642c02f2248516e3aa8cb303")
    );
    assert!(signature.is_low_s());
    assert!(key.public_key().verify(&z, &signature).unwrap());
    // Reproducible: same key, same message, same signature.
    assert_eq!(key.sign(&z).unwrap(), signature);
}

#[test]
fn test_der_round_trip_and_vector() {
    let key = PrivateKey::new(BigUint::from(12345u32)).unwrap();
    let z = BigUint::from_bytes_be(&hash256(b"Programming Bitcoin!"));
    let signature = key.sign(&z).unwrap();
    let der = signature.der();
    assert_eq!(
        hex::encode(&der),
        "30450221008eeacac05e4c29e793b5287ed044637132ce9ead7fded533e7441d87a8dc9c23\
         022036674f81f10c7fb347c1224bd546813ea24ada6f642c02f2248516e3aa8cb303"
    );
    assert_eq!(Signature::parse_der(&der).unwrap(), signature);
}

#[test]
fn test_der_rejects_malformed() {
    assert!(matches!(
        Signature::parse_der(&[]),
        Err(ProtocolError::InvalidSignature(_))
    ));
    assert!(matches!(
        Signature::parse_der(&[0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01]),
        Err(ProtocolError::InvalidSignature(_))
    ));
    // Wrong outer tag
    assert!(matches!(
        Signature::parse_der(&[0x31, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x01]),
        Err(ProtocolError::InvalidSignature(_))
    ));
}

#[test]
fn test_bit_flips_break_verification() {
    let key = PrivateKey::new(hex_int(
        "8b387de39861728c92ec9f589c303b1038ff60eb3963b12cd212263a1d1e0f00",
    ))
    .unwrap();
    let pubkey = key.public_key();
    let z = BigUint::from_bytes_be(&hash256(b"transfer 1 coin"));
    let signature = key.sign(&z).unwrap();
    assert!(pubkey.verify(&z, &signature).unwrap());

    let flipped_z = &z ^ BigUint::one();
    assert!(!pubkey.verify(&flipped_z, &signature).unwrap());

    let flipped_r = Signature::new(signature.r() ^ BigUint::one(), signature.s().clone());
    assert!(!pubkey.verify(&z, &flipped_r).unwrap());

    let flipped_s = Signature::new(signature.r().clone(), signature.s() ^ BigUint::one());
    assert!(!pubkey.verify(&z, &flipped_s).unwrap());
}

#[test]
fn test_sec_round_trip_both_forms() {
    let key = PrivateKey::new(hex_int(
        "8b387de39861728c92ec9f589c303b1038ff60eb3963b12cd212263a1d1e0f00",
    ))
    .unwrap();
    let point = key.public_key();
    assert_eq!(
        hex::encode(point.sec(true)),
        "02028d003eab2e428d11983f3e97c3fa0addf3b42740df0d211795ffb3be2f6c52"
    );
    for compressed in [true, false] {
        let parsed = PublicKey::parse_sec(&point.sec(compressed)).unwrap();
        assert_eq!(parsed.point(), point.point());
    }
}

#[test]
fn test_sec_rejects_bad_encodings() {
    assert!(matches!(
        PublicKey::parse_sec(&[]),
        Err(ProtocolError::InvalidPointEncoding(_))
    ));
    assert!(matches!(
        PublicKey::parse_sec(&[0x05; 33]),
        Err(ProtocolError::InvalidPointEncoding(_))
    ));
    // Right prefix, wrong length
    assert!(matches!(
        PublicKey::parse_sec(&[0x02; 20]),
        Err(ProtocolError::InvalidPointEncoding(_))
    ));
}

#[test]
fn test_address_and_wif_vectors() {
    let key = PrivateKey::new(hex_int(
        "8b387de39861728c92ec9f589c303b1038ff60eb3963b12cd212263a1d1e0f00",
    ))
    .unwrap();
    assert_eq!(
        key.public_key().address(true, true),
        "myaG9adYquJLehBrPYi1W92CbBqfTsGCWL"
    );
    assert_eq!(
        key.wif(true, true),
        "cSFL16hhMmRHYEqabKjeEFVEQisFGYvUaxNrgUBvbWCbfCCDY8aM"
    );
}

#[test]
fn test_generated_keys_sign_and_verify() {
    let mut rng = StdRng::seed_from_u64(7);
    let key = PrivateKey::generate(&mut rng);
    let signature = txcore::sign(&key, b"generated key message").unwrap();
    assert!(txcore::verify(&key.public_key(), b"generated key message", &signature).unwrap());
    assert!(!txcore::verify(&key.public_key(), b"different message", &signature).unwrap());
}

#[test]
fn test_distinct_messages_use_distinct_nonces() {
    // Nonce reuse would show up as identical r values.
    let key = PrivateKey::new(BigUint::from(999u32)).unwrap();
    let sig_a = txcore::sign(&key, b"message a").unwrap();
    let sig_b = txcore::sign(&key, b"message b").unwrap();
    assert_ne!(sig_a.r(), sig_b.r());
}
