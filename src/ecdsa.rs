//! ECDSA signing and verification over secp256k1
//!
//! Signing uses deterministic nonces per RFC 6979 (HMAC-SHA256 V/K chains),
//! so signing the same message with the same key is reproducible and nonces
//! never repeat across distinct messages. Produced signatures are normalized
//! to low-s form; verification accepts any s in range but exposes
//! [`Signature::is_low_s`] so callers can enforce canonical encodings.

use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use num_traits::{One, Zero};
use rand::{CryptoRng, RngCore};
use sha2::Sha256;

use crate::codec::{biguint_to_be32, encode_base58_checksum, hash160, hash256};
use crate::constants::{
    ADDRESS_VERSION_MAINNET, ADDRESS_VERSION_TESTNET, WIF_VERSION_MAINNET, WIF_VERSION_TESTNET,
};
use crate::curve::CurvePoint;
use crate::error::{ProtocolError, Result};
use crate::secp256k1::{self, SECP256K1};

type HmacSha256 = Hmac<Sha256>;

const DER_SEQUENCE: u8 = 0x30;
const DER_INTEGER: u8 = 0x02;

/// An ECDSA signature (r, s), both in [1, n-1].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    r: BigUint,
    s: BigUint,
}

impl Signature {
    pub fn new(r: BigUint, s: BigUint) -> Self {
        Signature { r, s }
    }

    pub fn r(&self) -> &BigUint {
        &self.r
    }

    pub fn s(&self) -> &BigUint {
        &self.s
    }

    /// Canonical signatures keep s in the lower half of the group order;
    /// the mirrored (r, n-s) pair verifies too, so high-s encodings are
    /// malleable and flagged here.
    pub fn is_low_s(&self) -> bool {
        self.s <= secp256k1::order() >> 1u32
    }

    /// DER encoding: SEQUENCE of two INTEGERs, big-endian magnitudes with a
    /// leading zero byte whenever the high bit is set.
    pub fn der(&self) -> Vec<u8> {
        fn encode_integer(value: &BigUint) -> Vec<u8> {
            let mut bytes = value.to_bytes_be();
            if bytes[0] & 0x80 != 0 {
                bytes.insert(0, 0x00);
            }
            let mut out = vec![DER_INTEGER, bytes.len() as u8];
            out.extend_from_slice(&bytes);
            out
        }
        let mut body = encode_integer(&self.r);
        body.extend_from_slice(&encode_integer(&self.s));
        let mut out = vec![DER_SEQUENCE, body.len() as u8];
        out.extend_from_slice(&body);
        out
    }

    /// Parse a DER-encoded signature. Any structural deviation fails with
    /// `InvalidSignature`; no silent coercion.
    pub fn parse_der(bytes: &[u8]) -> Result<Self> {
        fn bad(msg: &str) -> ProtocolError {
            ProtocolError::InvalidSignature(format!("DER: {}", msg))
        }
        if bytes.len() < 6 {
            return Err(bad("too short"));
        }
        if bytes[0] != DER_SEQUENCE {
            return Err(bad("missing sequence tag"));
        }
        if bytes[1] as usize != bytes.len() - 2 {
            return Err(bad("sequence length mismatch"));
        }
        let mut pos = 2;
        let mut read_integer = |label: &str| -> Result<BigUint> {
            if bytes.len() < pos + 2 {
                return Err(bad(&format!("{} header truncated", label)));
            }
            if bytes[pos] != DER_INTEGER {
                return Err(bad(&format!("missing {} integer tag", label)));
            }
            let len = bytes[pos + 1] as usize;
            if len == 0 {
                return Err(bad(&format!("empty {}", label)));
            }
            if bytes.len() < pos + 2 + len {
                return Err(bad(&format!("{} body truncated", label)));
            }
            let value = BigUint::from_bytes_be(&bytes[pos + 2..pos + 2 + len]);
            pos += 2 + len;
            Ok(value)
        };
        let r = read_integer("r")?;
        let s = read_integer("s")?;
        if pos != bytes.len() {
            return Err(bad("trailing bytes"));
        }
        Ok(Signature { r, s })
    }
}

/// A verification key: the curve point k*G for some secret scalar k.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    point: CurvePoint,
}

impl PublicKey {
    pub fn from_point(point: CurvePoint) -> Self {
        PublicKey { point }
    }

    pub fn point(&self) -> &CurvePoint {
        &self.point
    }

    /// Verify a signature over message hash z:
    /// valid iff u*G + v*P has x-coordinate r, with u = z/s, v = r/s mod n.
    /// Out-of-range r or s simply verifies false.
    pub fn verify(&self, z: &BigUint, signature: &Signature) -> Result<bool> {
        let n = secp256k1::order();
        let one = BigUint::one();
        if signature.r < one || signature.r >= *n || signature.s < one || signature.s >= *n {
            return Ok(false);
        }
        let s_inv = signature.s.modpow(&(n - BigUint::from(2u8)), n);
        let u = (z * &s_inv) % n;
        let v = (&signature.r * &s_inv) % n;
        let total = secp256k1::generator().mul(&u)?.add(&self.point.mul(&v)?)?;
        match total.x() {
            Some(x) => Ok(x.value() % n == signature.r),
            None => Ok(false),
        }
    }

    /// SEC encoding: 0x04 + x + y uncompressed, or 0x02/0x03 + x compressed
    /// with the prefix carrying y's parity.
    pub fn sec(&self, compressed: bool) -> Vec<u8> {
        let (x, y) = match (self.point.x(), self.point.y()) {
            (Some(x), Some(y)) => (x, y),
            // The identity has no affine encoding; it is never a valid key.
            _ => return vec![0x00],
        };
        let x_bytes = biguint_to_be32(x.value());
        if compressed {
            let parity = if y.value().bit(0) { 0x03 } else { 0x02 };
            let mut out = vec![parity];
            out.extend_from_slice(&x_bytes);
            out
        } else {
            let mut out = vec![0x04];
            out.extend_from_slice(&x_bytes);
            out.extend_from_slice(&biguint_to_be32(y.value()));
            out
        }
    }

    /// Parse a SEC-encoded key. Compressed forms recover y from the curve
    /// equation via a modular square root (p = 3 mod 4 on secp256k1).
    pub fn parse_sec(bytes: &[u8]) -> Result<Self> {
        match bytes.first() {
            Some(&0x04) => {
                if bytes.len() != 65 {
                    return Err(ProtocolError::InvalidPointEncoding(format!(
                        "uncompressed SEC key must be 65 bytes, got {}",
                        bytes.len()
                    )));
                }
                let x = BigUint::from_bytes_be(&bytes[1..33]);
                let y = BigUint::from_bytes_be(&bytes[33..65]);
                Ok(PublicKey {
                    point: secp256k1::point(x, y)?,
                })
            }
            Some(&(prefix @ (0x02 | 0x03))) => {
                if bytes.len() != 33 {
                    return Err(ProtocolError::InvalidPointEncoding(format!(
                        "compressed SEC key must be 33 bytes, got {}",
                        bytes.len()
                    )));
                }
                let x = secp256k1::field_element(BigUint::from_bytes_be(&bytes[1..33]));
                // y^2 = x^3 + a*x + b
                let params = &*SECP256K1;
                let a = params.field_element(params.a.clone());
                let b = params.field_element(params.b.clone());
                let alpha = x.mul(&x)?.mul(&x)?.add(&a.mul(&x)?)?.add(&b)?;
                let beta = alpha.sqrt()?;
                let want_odd = prefix == 0x03;
                let beta_is_odd = beta.value().bit(0);
                let y = if want_odd == beta_is_odd {
                    beta
                } else {
                    params.field_element(&params.prime - beta.value())
                };
                Ok(PublicKey {
                    point: secp256k1::point(x.value().clone(), y.value().clone())?,
                })
            }
            Some(other) => Err(ProtocolError::InvalidPointEncoding(format!(
                "unrecognized SEC prefix byte 0x{:02x}",
                other
            ))),
            None => Err(ProtocolError::InvalidPointEncoding(
                "empty SEC encoding".to_string(),
            )),
        }
    }

    /// HASH160 of the SEC encoding, the payload of a p2pkh locking script.
    pub fn hash160(&self, compressed: bool) -> [u8; 20] {
        hash160(&self.sec(compressed))
    }

    /// Base58check pay-to-pubkey-hash address.
    pub fn address(&self, compressed: bool, testnet: bool) -> String {
        let version = if testnet {
            ADDRESS_VERSION_TESTNET
        } else {
            ADDRESS_VERSION_MAINNET
        };
        let mut payload = vec![version];
        payload.extend_from_slice(&self.hash160(compressed));
        encode_base58_checksum(&payload)
    }
}

/// A secret scalar in [1, n-1].
#[derive(Clone)]
pub struct PrivateKey {
    secret: BigUint,
    point: CurvePoint,
}

impl PrivateKey {
    /// Wrap an existing secret, range-checking it against the group order.
    pub fn new(secret: BigUint) -> Result<Self> {
        if secret.is_zero() || secret >= *secp256k1::order() {
            return Err(ProtocolError::InvalidSignature(
                "private key scalar outside [1, n-1]".to_string(),
            ));
        }
        let point = secp256k1::generator().mul(&secret)?;
        Ok(PrivateKey { secret, point })
    }

    /// Draw a key uniformly from [1, n-1] via rejection sampling over a
    /// caller-supplied cryptographically secure source.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Self {
        loop {
            let mut bytes = [0u8; 32];
            rng.fill_bytes(&mut bytes);
            let candidate = BigUint::from_bytes_be(&bytes);
            if !candidate.is_zero() && candidate < *secp256k1::order() {
                let point = secp256k1::generator()
                    .mul(&candidate)
                    .expect("scalar multiple of G stays on the curve");
                return PrivateKey {
                    secret: candidate,
                    point,
                };
            }
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            point: self.point.clone(),
        }
    }

    /// Sign a message hash z. The nonce comes from RFC 6979; a fresh
    /// candidate is drawn from the HMAC chain in the (practically
    /// unreachable) cases r = 0 or s = 0. s is normalized to low-s form.
    pub fn sign(&self, z: &BigUint) -> Result<Signature> {
        let n = secp256k1::order();
        let mut nonces = Rfc6979::new(&self.secret, z);
        loop {
            let k = nonces.next_nonce();
            let r_point = secp256k1::generator().mul(&k)?;
            let r = match r_point.x() {
                Some(x) => x.value() % n,
                None => continue,
            };
            if r.is_zero() {
                continue;
            }
            let k_inv = k.modpow(&(n - BigUint::from(2u8)), n);
            let mut s = ((z + &r * &self.secret) * k_inv) % n;
            if s.is_zero() {
                continue;
            }
            if s > n >> 1u32 {
                s = n - s;
            }
            return Ok(Signature::new(r, s));
        }
    }

    /// Wallet import format for the secret scalar.
    pub fn wif(&self, compressed: bool, testnet: bool) -> String {
        let version = if testnet {
            WIF_VERSION_TESTNET
        } else {
            WIF_VERSION_MAINNET
        };
        let mut payload = vec![version];
        payload.extend_from_slice(&biguint_to_be32(&self.secret));
        if compressed {
            payload.push(0x01);
        }
        encode_base58_checksum(&payload)
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret scalar.
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}

/// RFC 6979 deterministic nonce chain for one (secret, z) pair.
///
/// The first call walks the full V/K initialization; later calls perform the
/// retry update from section 3.2.h.3 so repeated draws never repeat.
struct Rfc6979 {
    k: [u8; 32],
    v: [u8; 32],
    secret_bytes: [u8; 32],
    z_bytes: [u8; 32],
    initialized: bool,
}

impl Rfc6979 {
    fn new(secret: &BigUint, z: &BigUint) -> Self {
        let n = secp256k1::order();
        let mut z = z.clone();
        if z > *n {
            z -= n;
        }
        Rfc6979 {
            k: [0u8; 32],
            v: [1u8; 32],
            secret_bytes: biguint_to_be32(secret),
            z_bytes: biguint_to_be32(&z),
            initialized: false,
        }
    }

    fn hmac(key: &[u8], parts: &[&[u8]]) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
        for part in parts {
            mac.update(part);
        }
        mac.finalize().into_bytes().into()
    }

    fn next_nonce(&mut self) -> BigUint {
        let n = secp256k1::order();
        if !self.initialized {
            self.k = Self::hmac(
                &self.k,
                &[&self.v, &[0x00], &self.secret_bytes, &self.z_bytes],
            );
            self.v = Self::hmac(&self.k, &[&self.v]);
            self.k = Self::hmac(
                &self.k,
                &[&self.v, &[0x01], &self.secret_bytes, &self.z_bytes],
            );
            self.v = Self::hmac(&self.k, &[&self.v]);
            self.initialized = true;
        } else {
            // Retry update: a previous candidate produced r = 0 or s = 0.
            self.k = Self::hmac(&self.k, &[&self.v, &[0x00]]);
            self.v = Self::hmac(&self.k, &[&self.v]);
        }
        loop {
            self.v = Self::hmac(&self.k, &[&self.v]);
            let candidate = BigUint::from_bytes_be(&self.v);
            if !candidate.is_zero() && candidate < *n {
                return candidate;
            }
            self.k = Self::hmac(&self.k, &[&self.v, &[0x00]]);
            self.v = Self::hmac(&self.k, &[&self.v]);
        }
    }
}

/// Sign raw message bytes: z is the double-SHA-256 digest as an integer.
pub fn sign(key: &PrivateKey, message: &[u8]) -> Result<Signature> {
    let z = BigUint::from_bytes_be(&hash256(message));
    key.sign(&z)
}

/// Verify a signature over raw message bytes.
pub fn verify(pubkey: &PublicKey, message: &[u8], signature: &Signature) -> Result<bool> {
    let z = BigUint::from_bytes_be(&hash256(message));
    pubkey.verify(&z, signature)
}
