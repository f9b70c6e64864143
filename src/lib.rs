//! # txcore
//!
//! The cryptographic and transaction-validation core of a Bitcoin-protocol
//! library: finite-field arithmetic, secp256k1 point arithmetic, ECDSA key
//! generation/signing/verification, binary serialization primitives, and the
//! script execution engine used to validate legacy transactions.
//!
//! Everything here is a pure computation over immutable values. No
//! networking, no UTXO database, no mining, no wallet UX: collaborators call
//! in with byte buffers and get back validation results or signatures.
//! Because nothing is mutated after construction, every operation is safe to
//! call concurrently as long as each thread owns its inputs; validating
//! unrelated transactions in parallel is the caller's prerogative.
//!
//! ## Layers
//!
//! - [`field`]: modular arithmetic over a prime field
//! - [`curve`]: elliptic-curve points over any field/curve pair
//! - [`secp256k1`]: the production curve constants
//! - [`ecdsa`]: keys, deterministic signing (RFC 6979), verification,
//!   SEC/DER encodings
//! - [`codec`]: varints, little-endian integers, digests, base58check
//! - [`script`]: the stack-machine interpreter for locking/unlocking pairs
//! - [`transaction`]: wire parsing, signature hashes, per-input validation
//!
//! ## Security caveat
//!
//! Scalar multiplication and modular exponentiation here are not
//! constant-time. A deployment signing with long-lived secret keys needs
//! hardened, blinded arithmetic underneath; this crate prioritizes being a
//! faithful, reviewable statement of the validation rules.
//!
//! ## Usage
//!
//! ```rust
//! use num_bigint::BigUint;
//! use txcore::ecdsa::PrivateKey;
//!
//! let key = PrivateKey::new(BigUint::from(12345u32)).unwrap();
//! let signature = txcore::sign(&key, b"message bytes").unwrap();
//! assert!(txcore::verify(&key.public_key(), b"message bytes", &signature).unwrap());
//! ```

pub mod codec;
pub mod constants;
pub mod curve;
pub mod ecdsa;
pub mod error;
pub mod field;
pub mod script;
pub mod secp256k1;
pub mod transaction;

pub use ecdsa::{sign, verify, PrivateKey, PublicKey, Signature};
pub use error::{ProtocolError, Result};
pub use transaction::{
    OutPoint, PrevOutLookup, Transaction, TxInput, TxOutput, UtxoSet, ValidationResult,
};

/// Parse a transaction from raw wire bytes.
pub fn parse_transaction(bytes: &[u8]) -> Result<Transaction> {
    Transaction::parse(bytes)
}

/// Validate a transaction against a previous-output lookup.
pub fn validate_transaction(
    tx: &Transaction,
    lookup: &impl PrevOutLookup,
) -> Result<ValidationResult> {
    tx.verify(lookup)
}
