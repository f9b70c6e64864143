//! Script parsing, serialization, and the stack-based execution engine
//!
//! A script is an ordered list of commands: opcodes or literal data pushes.
//! Validation concatenates the spending input's unlocking script with the
//! previous output's locking script and executes the pair against one owned
//! stack. Execution follows a closed opcode dispatch: anything outside the
//! supported set fails with `UnsupportedOpcode`, never silently succeeds.

use std::collections::VecDeque;
use std::ops::Add;

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::codec::{encode_varint, hash160, hash256, sha256, ByteReader};
use crate::constants::*;
use crate::ecdsa::{PublicKey, Signature};
use crate::error::{ProtocolError, Result};

/// One script command: an opcode byte or a literal push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cmd {
    Op(u8),
    Push(Vec<u8>),
}

/// An ordered command sequence, parsed from or serialized to the wire
/// push-length encoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    cmds: Vec<Cmd>,
}

impl Script {
    pub fn new(cmds: Vec<Cmd>) -> Self {
        Script { cmds }
    }

    pub fn cmds(&self) -> &[Cmd] {
        &self.cmds
    }

    /// Parse a script from its varint-length-prefixed wire form.
    pub fn parse(reader: &mut ByteReader) -> Result<Self> {
        let length = reader.read_varint()?;
        if length as usize > MAX_SCRIPT_SIZE {
            return Err(ProtocolError::MalformedTransaction(format!(
                "script of {} bytes exceeds maximum",
                length
            )));
        }
        let mut cmds = Vec::new();
        let mut count = 0u64;
        while count < length {
            let current = reader.read_byte()?;
            count += 1;
            match current {
                // Literal push: the opcode byte is the element length.
                1..=75 => {
                    let n = current as u64;
                    cmds.push(Cmd::Push(reader.read_bytes(n as usize)?.to_vec()));
                    count += n;
                }
                OP_PUSHDATA1 => {
                    let n = reader.read_byte()? as u64;
                    cmds.push(Cmd::Push(reader.read_bytes(n as usize)?.to_vec()));
                    count += n + 1;
                }
                OP_PUSHDATA2 => {
                    let n = reader.read_u16_le()? as u64;
                    cmds.push(Cmd::Push(reader.read_bytes(n as usize)?.to_vec()));
                    count += n + 2;
                }
                op => cmds.push(Cmd::Op(op)),
            }
        }
        if count != length {
            return Err(ProtocolError::MalformedTransaction(
                "script parsing overran its declared length".to_string(),
            ));
        }
        Ok(Script { cmds })
    }

    /// Serialize without the length prefix.
    pub fn raw_serialize(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for cmd in &self.cmds {
            match cmd {
                Cmd::Op(op) => out.push(*op),
                Cmd::Push(data) => {
                    let length = data.len();
                    if length <= 75 {
                        out.push(length as u8);
                    } else if length < 0x100 {
                        out.push(OP_PUSHDATA1);
                        out.push(length as u8);
                    } else if length <= MAX_ELEMENT_SIZE {
                        out.push(OP_PUSHDATA2);
                        out.extend_from_slice(&(length as u16).to_le_bytes());
                    } else {
                        return Err(ProtocolError::MalformedTransaction(format!(
                            "push element of {} bytes exceeds maximum",
                            length
                        )));
                    }
                    out.extend_from_slice(data);
                }
            }
        }
        Ok(out)
    }

    /// Serialize with the varint length prefix used inside transactions.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let raw = self.raw_serialize()?;
        let mut out = encode_varint(raw.len() as u64);
        out.extend_from_slice(&raw);
        Ok(out)
    }

    /// Execute this command sequence against an empty stack. `z` is the
    /// signature hash of the enclosing transaction input, consumed by the
    /// signature-check opcodes.
    ///
    /// Succeeds iff the terminal stack holds exactly one truthy element.
    /// Proof failures surface as `Ok(false)` or a validation-failure error;
    /// either way the caller treats the input as unspendable.
    pub fn evaluate(&self, z: &BigUint) -> Result<bool> {
        let mut cmds: VecDeque<Cmd> = self.cmds.iter().cloned().collect();
        let mut stack: Vec<Vec<u8>> = Vec::new();
        let mut op_count = 0usize;
        while let Some(cmd) = cmds.pop_front() {
            match cmd {
                Cmd::Push(data) => {
                    if data.len() > MAX_ELEMENT_SIZE {
                        return Ok(false);
                    }
                    stack.push(data);
                    // BIP16: a push followed by exactly OP_HASH160 <hash>
                    // OP_EQUAL is a pay-to-script-hash pattern. Check the
                    // commitment, then re-execute the pushed redeem script.
                    if is_p2sh_tail(&cmds) {
                        cmds.pop_front();
                        let expected = match cmds.pop_front() {
                            Some(Cmd::Push(h160)) => h160,
                            _ => unreachable!("pattern checked by is_p2sh_tail"),
                        };
                        cmds.pop_front();
                        let redeem_bytes = stack.pop().expect("pushed above");
                        if hash160(&redeem_bytes).as_slice() != expected.as_slice() {
                            return Ok(false);
                        }
                        let mut raw = encode_varint(redeem_bytes.len() as u64);
                        raw.extend_from_slice(&redeem_bytes);
                        // The redeem bytes came off the stack, so they are
                        // attacker-controlled: undecodable ones fail the
                        // spend rather than aborting validation.
                        let redeem = match Script::parse(&mut ByteReader::new(&raw)) {
                            Ok(redeem) => redeem,
                            Err(_) => return Ok(false),
                        };
                        cmds.extend(redeem.cmds);
                    }
                }
                Cmd::Op(op) => {
                    op_count += 1;
                    if op_count > MAX_SCRIPT_OPS {
                        return Err(ProtocolError::ScriptVerifyFailed(
                            "operation limit exceeded".to_string(),
                        ));
                    }
                    if !execute_opcode(op, &mut stack, z)? {
                        return Ok(false);
                    }
                }
            }
            if stack.len() > MAX_STACK_SIZE {
                return Err(ProtocolError::ScriptVerifyFailed(
                    "stack size limit exceeded".to_string(),
                ));
            }
        }
        Ok(stack.len() == 1 && is_truthy(&stack[0]))
    }

    /// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn is_p2pkh(&self) -> bool {
        matches!(
            self.cmds.as_slice(),
            [Cmd::Op(OP_DUP), Cmd::Op(OP_HASH160), Cmd::Push(hash), Cmd::Op(OP_EQUALVERIFY), Cmd::Op(OP_CHECKSIG)]
                if hash.len() == 20
        )
    }

    /// `OP_HASH160 <20 bytes> OP_EQUAL`
    pub fn is_p2sh(&self) -> bool {
        matches!(
            self.cmds.as_slice(),
            [Cmd::Op(OP_HASH160), Cmd::Push(hash), Cmd::Op(OP_EQUAL)] if hash.len() == 20
        )
    }
}

impl Add for Script {
    type Output = Script;

    fn add(mut self, other: Script) -> Script {
        self.cmds.extend(other.cmds);
        self
    }
}

impl Add for &Script {
    type Output = Script;

    fn add(self, other: &Script) -> Script {
        let mut cmds = self.cmds.clone();
        cmds.extend(other.cmds.iter().cloned());
        Script { cmds }
    }
}

/// Evaluate an unlocking/locking script pair against signature hash z.
pub fn verify_script(script_sig: &Script, script_pubkey: &Script, z: &BigUint) -> Result<bool> {
    (script_sig + script_pubkey).evaluate(z)
}

/// Standard pay-to-pubkey-hash locking script for a key hash.
pub fn p2pkh_script(h160: &[u8; 20]) -> Script {
    Script::new(vec![
        Cmd::Op(OP_DUP),
        Cmd::Op(OP_HASH160),
        Cmd::Push(h160.to_vec()),
        Cmd::Op(OP_EQUALVERIFY),
        Cmd::Op(OP_CHECKSIG),
    ])
}

/// Standard pay-to-script-hash locking script for a script hash.
pub fn p2sh_script(h160: &[u8; 20]) -> Script {
    Script::new(vec![
        Cmd::Op(OP_HASH160),
        Cmd::Push(h160.to_vec()),
        Cmd::Op(OP_EQUAL),
    ])
}

fn is_p2sh_tail(cmds: &VecDeque<Cmd>) -> bool {
    cmds.len() == 3
        && matches!(cmds[0], Cmd::Op(OP_HASH160))
        && matches!(&cmds[1], Cmd::Push(hash) if hash.len() == 20)
        && matches!(cmds[2], Cmd::Op(OP_EQUAL))
}

/// Script-number encoding: sign-magnitude little-endian, empty for zero.
pub fn encode_num(num: i64) -> Vec<u8> {
    if num == 0 {
        return Vec::new();
    }
    let negative = num < 0;
    let mut abs_num = num.unsigned_abs();
    let mut result = Vec::new();
    while abs_num > 0 {
        result.push((abs_num & 0xff) as u8);
        abs_num >>= 8;
    }
    let top = *result.last().expect("nonzero value has at least one byte");
    if top & 0x80 != 0 {
        // Top bit occupied by the magnitude: add a sign byte.
        result.push(if negative { 0x80 } else { 0x00 });
    } else if negative {
        *result.last_mut().expect("nonempty") |= 0x80;
    }
    result
}

/// Inverse of [`encode_num`]. Magnitudes beyond `i64` saturate instead of
/// overflowing; opcode operands are bounded to 4 bytes before reaching here.
pub fn decode_num(element: &[u8]) -> i64 {
    if element.is_empty() {
        return 0;
    }
    let mut big_endian = element.to_vec();
    big_endian.reverse();
    let negative = big_endian[0] & 0x80 != 0;
    let mut result = (big_endian[0] & 0x7f) as i64;
    for &byte in &big_endian[1..] {
        result = result.saturating_mul(256).saturating_add(byte as i64);
    }
    if negative {
        -result
    } else {
        result
    }
}

/// Protocol boolean: false iff the element is empty or all zero bytes,
/// allowing a lone sign bit (0x80) in the final position (negative zero).
fn is_truthy(element: &[u8]) -> bool {
    for (i, &byte) in element.iter().enumerate() {
        if byte != 0 {
            if i == element.len() - 1 && byte == 0x80 {
                return false;
            }
            return true;
        }
    }
    false
}

fn pop(stack: &mut Vec<Vec<u8>>, op: &str) -> Result<Vec<u8>> {
    stack
        .pop()
        .ok_or_else(|| ProtocolError::StackUnderflow(format!("{} on empty stack", op)))
}

/// Pop a script number, enforcing the consensus 4-byte bound on numeric
/// operands so decoding can never overflow.
fn pop_num(stack: &mut Vec<Vec<u8>>, op: &str) -> Result<i64> {
    let element = pop(stack, op)?;
    if element.len() > 4 {
        return Err(ProtocolError::ScriptVerifyFailed(format!(
            "{} numeric operand of {} bytes",
            op,
            element.len()
        )));
    }
    Ok(decode_num(&element))
}

fn require(stack: &[Vec<u8>], needed: usize, op: &str) -> Result<()> {
    if stack.len() < needed {
        return Err(ProtocolError::StackUnderflow(format!(
            "{} needs {} stack elements, {} present",
            op,
            needed,
            stack.len()
        )));
    }
    Ok(())
}

/// Execute one opcode. `Ok(false)` means the script as a whole fails;
/// structural problems (underflow, unknown opcode) surface as errors.
fn execute_opcode(op: u8, stack: &mut Vec<Vec<u8>>, z: &BigUint) -> Result<bool> {
    match op {
        OP_0 => {
            stack.push(encode_num(0));
            Ok(true)
        }

        OP_1NEGATE => {
            stack.push(encode_num(-1));
            Ok(true)
        }

        // OP_1 through OP_16
        OP_1..=OP_16 => {
            stack.push(encode_num((op - OP_1 + 1) as i64));
            Ok(true)
        }

        OP_NOP => Ok(true),

        OP_VERIFY => {
            let element = pop(stack, "OP_VERIFY")?;
            if !is_truthy(&element) {
                return Err(ProtocolError::ScriptVerifyFailed(
                    "OP_VERIFY on falsy element".to_string(),
                ));
            }
            Ok(true)
        }

        OP_RETURN => Ok(false),

        OP_2DROP => {
            require(stack, 2, "OP_2DROP")?;
            stack.pop();
            stack.pop();
            Ok(true)
        }

        OP_2DUP => {
            require(stack, 2, "OP_2DUP")?;
            let top = stack[stack.len() - 1].clone();
            let second = stack[stack.len() - 2].clone();
            stack.push(second);
            stack.push(top);
            Ok(true)
        }

        OP_DROP => {
            pop(stack, "OP_DROP")?;
            Ok(true)
        }

        OP_DUP => {
            require(stack, 1, "OP_DUP")?;
            let top = stack[stack.len() - 1].clone();
            stack.push(top);
            Ok(true)
        }

        OP_SWAP => {
            require(stack, 2, "OP_SWAP")?;
            let len = stack.len();
            stack.swap(len - 1, len - 2);
            Ok(true)
        }

        OP_EQUAL => {
            let a = pop(stack, "OP_EQUAL")?;
            let b = pop(stack, "OP_EQUAL")?;
            stack.push(if a == b { encode_num(1) } else { encode_num(0) });
            Ok(true)
        }

        OP_EQUALVERIFY => {
            let a = pop(stack, "OP_EQUALVERIFY")?;
            let b = pop(stack, "OP_EQUALVERIFY")?;
            if a != b {
                return Err(ProtocolError::ScriptVerifyFailed(
                    "OP_EQUALVERIFY elements differ".to_string(),
                ));
            }
            Ok(true)
        }

        OP_NOT => {
            let value = pop_num(stack, "OP_NOT")?;
            stack.push(if value == 0 { encode_num(1) } else { encode_num(0) });
            Ok(true)
        }

        OP_ADD => {
            let a = pop_num(stack, "OP_ADD")?;
            let b = pop_num(stack, "OP_ADD")?;
            stack.push(encode_num(a + b));
            Ok(true)
        }

        OP_SHA256 => {
            let element = pop(stack, "OP_SHA256")?;
            stack.push(sha256(&element).to_vec());
            Ok(true)
        }

        OP_HASH160 => {
            let element = pop(stack, "OP_HASH160")?;
            stack.push(hash160(&element).to_vec());
            Ok(true)
        }

        OP_HASH256 => {
            let element = pop(stack, "OP_HASH256")?;
            stack.push(hash256(&element).to_vec());
            Ok(true)
        }

        OP_CHECKSIG => {
            let valid = check_signature(stack, z)?;
            stack.push(if valid { encode_num(1) } else { encode_num(0) });
            Ok(true)
        }

        OP_CHECKSIGVERIFY => {
            if !check_signature(stack, z)? {
                return Err(ProtocolError::ScriptVerifyFailed(
                    "OP_CHECKSIGVERIFY signature invalid".to_string(),
                ));
            }
            Ok(true)
        }

        // Closed default: disabled and unimplemented opcodes fail loudly.
        other => Err(ProtocolError::UnsupportedOpcode(other)),
    }
}

/// Pop a pubkey and a DER signature (with trailing sighash byte) and verify
/// against z. Undecodable keys or signatures verify false rather than
/// aborting: those bytes are attacker-controlled.
fn check_signature(stack: &mut Vec<Vec<u8>>, z: &BigUint) -> Result<bool> {
    let pubkey_bytes = pop(stack, "OP_CHECKSIG")?;
    let mut signature_bytes = pop(stack, "OP_CHECKSIG")?;
    if signature_bytes.is_empty() {
        return Ok(false);
    }
    // Last byte is the sighash type, not part of the DER structure.
    signature_bytes.pop();
    let pubkey = match PublicKey::parse_sec(&pubkey_bytes) {
        Ok(pk) => pk,
        Err(_) => return Ok(false),
    };
    let signature = match Signature::parse_der(&signature_bytes) {
        Ok(sig) => sig,
        Err(_) => return Ok(false),
    };
    pubkey.verify(z, &signature)
}
