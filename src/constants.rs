//! Protocol constants: opcode bytes, sighash types, execution limits

/// Push an empty byte string (numeric zero)
pub const OP_0: u8 = 0x00;

/// Next byte is the push length
pub const OP_PUSHDATA1: u8 = 0x4c;

/// Next two bytes (little-endian) are the push length
pub const OP_PUSHDATA2: u8 = 0x4d;

/// Push the number -1
pub const OP_1NEGATE: u8 = 0x4f;

/// Push the number 1; OP_2 through OP_16 follow consecutively
pub const OP_1: u8 = 0x51;

/// Push the number 16
pub const OP_16: u8 = 0x60;

/// No operation
pub const OP_NOP: u8 = 0x61;

/// Fail unless top of stack is truthy
pub const OP_VERIFY: u8 = 0x69;

/// Unconditional failure (data-carrier outputs)
pub const OP_RETURN: u8 = 0x6a;

/// Drop the top two stack items
pub const OP_2DROP: u8 = 0x6d;

/// Duplicate the top two stack items
pub const OP_2DUP: u8 = 0x6e;

/// Drop the top stack item
pub const OP_DROP: u8 = 0x75;

/// Duplicate the top stack item
pub const OP_DUP: u8 = 0x76;

/// Swap the top two stack items
pub const OP_SWAP: u8 = 0x7c;

/// Pop two items, push equality as a boolean
pub const OP_EQUAL: u8 = 0x87;

/// OP_EQUAL followed by OP_VERIFY
pub const OP_EQUALVERIFY: u8 = 0x88;

/// Boolean negation of the top item
pub const OP_NOT: u8 = 0x91;

/// Pop two script numbers, push their sum
pub const OP_ADD: u8 = 0x93;

/// Replace top item with its SHA-256 digest
pub const OP_SHA256: u8 = 0xa8;

/// Replace top item with RIPEMD160(SHA256(item))
pub const OP_HASH160: u8 = 0xa9;

/// Replace top item with SHA256(SHA256(item))
pub const OP_HASH256: u8 = 0xaa;

/// Pop pubkey and signature, push signature validity
pub const OP_CHECKSIG: u8 = 0xac;

/// OP_CHECKSIG followed by OP_VERIFY
pub const OP_CHECKSIGVERIFY: u8 = 0xad;

/// Sighash type covering all inputs and outputs
pub const SIGHASH_ALL: u32 = 1;

/// Maximum serialized script length
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum stack size during script execution
pub const MAX_STACK_SIZE: usize = 1000;

/// Maximum number of non-push operations per script
pub const MAX_SCRIPT_OPS: usize = 201;

/// Maximum size of a pushed stack element
pub const MAX_ELEMENT_SIZE: usize = 520;

/// Sequence number marking a final input
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Lock times below this are block heights, above it UNIX timestamps
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Address version byte: mainnet pay-to-pubkey-hash
pub const ADDRESS_VERSION_MAINNET: u8 = 0x00;

/// Address version byte: testnet pay-to-pubkey-hash
pub const ADDRESS_VERSION_TESTNET: u8 = 0x6f;

/// WIF version byte: mainnet
pub const WIF_VERSION_MAINNET: u8 = 0x80;

/// WIF version byte: testnet
pub const WIF_VERSION_TESTNET: u8 = 0xef;
