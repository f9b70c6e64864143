//! Transaction parsing, serialization, signature hashing, and validation
//!
//! Wire layout (legacy, pre-segwit): 4-byte LE version, varint input count,
//! inputs, varint output count, outputs, 4-byte LE locktime. Previous
//! transaction ids are stored here in display order (byte-reversed relative
//! to the wire), matching the convention used for txids everywhere else.

use std::collections::HashMap;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::codec::{encode_varint, hash256, ByteReader};
use crate::constants::{SEQUENCE_FINAL, SIGHASH_ALL};
use crate::ecdsa::PrivateKey;
use crate::error::{ProtocolError, Result};
use crate::script::{verify_script, Cmd, Script};

/// Reference to a previous transaction output. `txid` is in display order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: [u8; 32],
    pub index: u32,
}

/// One transaction input: the outpoint being spent, the unlocking script
/// proving the spend, and the sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    pub prev_txid: [u8; 32],
    pub prev_index: u32,
    pub script_sig: Script,
    pub sequence: u32,
}

impl TxInput {
    /// An input with an empty unlocking script, to be signed later.
    pub fn new(prev_txid: [u8; 32], prev_index: u32) -> Self {
        TxInput {
            prev_txid,
            prev_index,
            script_sig: Script::default(),
            sequence: SEQUENCE_FINAL,
        }
    }

    fn parse(reader: &mut ByteReader) -> Result<Self> {
        let mut prev_txid = [0u8; 32];
        prev_txid.copy_from_slice(reader.read_bytes(32)?);
        prev_txid.reverse();
        let prev_index = reader.read_u32_le()?;
        let script_sig = Script::parse(reader)?;
        let sequence = reader.read_u32_le()?;
        Ok(TxInput {
            prev_txid,
            prev_index,
            script_sig,
            sequence,
        })
    }

    fn serialize(&self, out: &mut Vec<u8>) -> Result<()> {
        let mut wire_txid = self.prev_txid;
        wire_txid.reverse();
        out.extend_from_slice(&wire_txid);
        out.extend_from_slice(&self.prev_index.to_le_bytes());
        out.extend_from_slice(&self.script_sig.serialize()?);
        out.extend_from_slice(&self.sequence.to_le_bytes());
        Ok(())
    }
}

/// One transaction output: an amount in the smallest unit and the locking
/// script guarding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub amount: u64,
    pub script_pubkey: Script,
}

impl TxOutput {
    pub fn new(amount: u64, script_pubkey: Script) -> Self {
        TxOutput {
            amount,
            script_pubkey,
        }
    }

    fn parse(reader: &mut ByteReader) -> Result<Self> {
        let amount = reader.read_u64_le()?;
        let script_pubkey = Script::parse(reader)?;
        Ok(TxOutput {
            amount,
            script_pubkey,
        })
    }

    fn serialize(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.amount.to_le_bytes());
        out.extend_from_slice(&self.script_pubkey.serialize()?);
        Ok(())
    }
}

/// Collaborator interface: maps an outpoint to the output it created.
/// Supplied by whatever tracks unspent outputs; validation only needs the
/// locking script and amount.
pub trait PrevOutLookup {
    fn prev_output(&self, txid: &[u8; 32], index: u32) -> Option<&TxOutput>;
}

/// In-memory previous-output map, sufficient for tests and fee computation.
pub type UtxoSet = HashMap<OutPoint, TxOutput>;

impl PrevOutLookup for UtxoSet {
    fn prev_output(&self, txid: &[u8; 32], index: u32) -> Option<&TxOutput> {
        self.get(&OutPoint {
            txid: *txid,
            index,
        })
    }
}

/// Outcome of full-transaction validation. Invalidity is data, not an
/// error: it names the first failing input and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid { input: usize, reason: String },
}

/// A parsed or programmatically built transaction. Immutable once
/// constructed except for signing, which fills in unlocking scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    pub locktime: u32,
}

impl Transaction {
    pub fn new(version: u32, inputs: Vec<TxInput>, outputs: Vec<TxOutput>, locktime: u32) -> Self {
        Transaction {
            version,
            inputs,
            outputs,
            locktime,
        }
    }

    /// Parse a transaction from raw bytes, rejecting trailing garbage.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let tx = Self::parse_from(&mut reader)?;
        if reader.remaining() != 0 {
            return Err(ProtocolError::MalformedTransaction(format!(
                "{} trailing bytes after transaction",
                reader.remaining()
            )));
        }
        Ok(tx)
    }

    fn parse_from(reader: &mut ByteReader) -> Result<Self> {
        let version = reader.read_u32_le()?;
        let input_count = reader.read_varint()?;
        let mut inputs = Vec::new();
        for _ in 0..input_count {
            inputs.push(TxInput::parse(reader)?);
        }
        let output_count = reader.read_varint()?;
        let mut outputs = Vec::new();
        for _ in 0..output_count {
            outputs.push(TxOutput::parse(reader)?);
        }
        let locktime = reader.read_u32_le()?;
        Ok(Transaction {
            version,
            inputs,
            outputs,
            locktime,
        })
    }

    /// Serialize to the exact wire byte sequence.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&encode_varint(self.inputs.len() as u64));
        for input in &self.inputs {
            input.serialize(&mut out)?;
        }
        out.extend_from_slice(&encode_varint(self.outputs.len() as u64));
        for output in &self.outputs {
            output.serialize(&mut out)?;
        }
        out.extend_from_slice(&self.locktime.to_le_bytes());
        Ok(out)
    }

    /// The transaction hash in display order.
    pub fn hash(&self) -> Result<[u8; 32]> {
        let mut digest = hash256(&self.serialize()?);
        digest.reverse();
        Ok(digest)
    }

    /// Hex transaction id (display order).
    pub fn id(&self) -> Result<String> {
        let hash = self.hash()?;
        let mut out = String::with_capacity(64);
        for byte in hash {
            out.push_str(&format!("{:02x}", byte));
        }
        Ok(out)
    }

    /// Legacy SIGHASH_ALL signature hash for one input: every input's
    /// unlocking script is blanked, the signed input gets the previous
    /// output's locking script instead, and the serialization plus a 4-byte
    /// hash type is double-SHA-256 digested. Recomputed independently per
    /// input.
    pub fn sig_hash(&self, input_index: usize, prev_script_pubkey: &Script) -> Result<BigUint> {
        if input_index >= self.inputs.len() {
            return Err(ProtocolError::MalformedTransaction(format!(
                "signature hash for input {} of {}",
                input_index,
                self.inputs.len()
            )));
        }
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&encode_varint(self.inputs.len() as u64));
        for (i, input) in self.inputs.iter().enumerate() {
            let substitute = if i == input_index {
                prev_script_pubkey.clone()
            } else {
                Script::default()
            };
            let modified = TxInput {
                prev_txid: input.prev_txid,
                prev_index: input.prev_index,
                script_sig: substitute,
                sequence: input.sequence,
            };
            modified.serialize(&mut out)?;
        }
        out.extend_from_slice(&encode_varint(self.outputs.len() as u64));
        for output in &self.outputs {
            output.serialize(&mut out)?;
        }
        out.extend_from_slice(&self.locktime.to_le_bytes());
        out.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
        Ok(BigUint::from_bytes_be(&hash256(&out)))
    }

    /// Whether this is the block-subsidy transaction: a single input
    /// spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].prev_txid == [0u8; 32]
            && self.inputs[0].prev_index == 0xffffffff
    }

    /// Validate one input's script pair. Proof failures come back as
    /// `Ok(false)`; structural errors propagate.
    pub fn verify_input(&self, input_index: usize, lookup: &impl PrevOutLookup) -> Result<bool> {
        let input = self.inputs.get(input_index).ok_or_else(|| {
            ProtocolError::MalformedTransaction(format!(
                "verify for input {} of {}",
                input_index,
                self.inputs.len()
            ))
        })?;
        let prev = match lookup.prev_output(&input.prev_txid, input.prev_index) {
            Some(prev) => prev,
            None => return Ok(false),
        };
        let z = self.sig_hash(input_index, &prev.script_pubkey)?;
        match verify_script(&input.script_sig, &prev.script_pubkey, &z) {
            Ok(valid) => Ok(valid),
            Err(e) if e.is_validation_failure() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Validate every input in ascending order, stopping at the first
    /// failure. Distinguishes "valid", "invalid because input K failed",
    /// and hard structural errors, which propagate as `Err`.
    pub fn verify(&self, lookup: &impl PrevOutLookup) -> Result<ValidationResult> {
        if self.is_coinbase() {
            return Ok(ValidationResult::Valid);
        }
        for (i, input) in self.inputs.iter().enumerate() {
            let prev = match lookup.prev_output(&input.prev_txid, input.prev_index) {
                Some(prev) => prev,
                None => {
                    return Ok(ValidationResult::Invalid {
                        input: i,
                        reason: "previous output not found".to_string(),
                    })
                }
            };
            let z = self.sig_hash(i, &prev.script_pubkey)?;
            match verify_script(&input.script_sig, &prev.script_pubkey, &z) {
                Ok(true) => {}
                Ok(false) => {
                    return Ok(ValidationResult::Invalid {
                        input: i,
                        reason: "script evaluated to false".to_string(),
                    })
                }
                Err(e) if e.is_validation_failure() => {
                    return Ok(ValidationResult::Invalid {
                        input: i,
                        reason: e.to_string(),
                    })
                }
                Err(e) => return Err(e),
            }
        }
        Ok(ValidationResult::Valid)
    }

    /// Fee in the smallest unit: input total minus output total. Requires
    /// every previous output to be resolvable.
    pub fn fee(&self, lookup: &impl PrevOutLookup) -> Result<i64> {
        let mut input_total: i64 = 0;
        for (i, input) in self.inputs.iter().enumerate() {
            let prev = lookup
                .prev_output(&input.prev_txid, input.prev_index)
                .ok_or_else(|| {
                    ProtocolError::MalformedTransaction(format!(
                        "fee: previous output for input {} not found",
                        i
                    ))
                })?;
            input_total += prev.amount as i64;
        }
        let output_total: i64 = self.outputs.iter().map(|o| o.amount as i64).sum();
        Ok(input_total - output_total)
    }

    /// Sign one input with SIGHASH_ALL, installing `<DER sig + hash type>
    /// <SEC pubkey>` as the unlocking script.
    pub fn sign_input(
        &mut self,
        input_index: usize,
        key: &PrivateKey,
        prev_script_pubkey: &Script,
    ) -> Result<()> {
        let z = self.sig_hash(input_index, prev_script_pubkey)?;
        let signature = key.sign(&z)?;
        let mut sig_bytes = signature.der();
        sig_bytes.push(SIGHASH_ALL as u8);
        let sec = key.public_key().sec(true);
        self.inputs[input_index].script_sig =
            Script::new(vec![Cmd::Push(sig_bytes), Cmd::Push(sec)]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_input_tx() -> Transaction {
        Transaction::new(
            1,
            vec![TxInput::new([0x11; 32], 0)],
            vec![TxOutput::new(5000, Script::default())],
            0,
        )
    }

    #[test]
    fn test_round_trip() {
        let tx = single_input_tx();
        let bytes = tx.serialize().unwrap();
        let parsed = Transaction::parse(&bytes).unwrap();
        assert_eq!(parsed, tx);
        assert_eq!(parsed.serialize().unwrap(), bytes);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = single_input_tx().serialize().unwrap();
        bytes.push(0x00);
        assert!(matches!(
            Transaction::parse(&bytes),
            Err(ProtocolError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_truncation_rejected() {
        let bytes = single_input_tx().serialize().unwrap();
        assert!(matches!(
            Transaction::parse(&bytes[..bytes.len() - 1]),
            Err(ProtocolError::UnexpectedEndOfInput(_))
        ));
    }

    #[test]
    fn test_coinbase_detection() {
        let coinbase = Transaction::new(
            1,
            vec![TxInput::new([0u8; 32], 0xffffffff)],
            vec![TxOutput::new(50_0000_0000, Script::default())],
            0,
        );
        assert!(coinbase.is_coinbase());
        assert!(!single_input_tx().is_coinbase());
        let lookup = UtxoSet::new();
        assert_eq!(coinbase.verify(&lookup).unwrap(), ValidationResult::Valid);
    }

    #[test]
    fn test_missing_prevout_is_invalid_not_error() {
        let tx = single_input_tx();
        let lookup = UtxoSet::new();
        assert_eq!(
            tx.verify(&lookup).unwrap(),
            ValidationResult::Invalid {
                input: 0,
                reason: "previous output not found".to_string(),
            }
        );
    }
}
