//! Error types for the validation core

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("incompatible field: {0}")]
    IncompatibleField(String),

    #[error("division by zero element")]
    DivisionByZero,

    #[error("point not on curve: {0}")]
    PointNotOnCurve(String),

    #[error("invalid point encoding: {0}")]
    InvalidPointEncoding(String),

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("unexpected end of input: {0}")]
    UnexpectedEndOfInput(String),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("stack underflow: {0}")]
    StackUnderflow(String),

    #[error("unsupported opcode: 0x{0:02x}")]
    UnsupportedOpcode(u8),

    #[error("script verify failed: {0}")]
    ScriptVerifyFailed(String),
}

impl ProtocolError {
    /// Whether this error means "the spending proof is bad" rather than
    /// "the caller handed us structurally broken data". Script and signature
    /// failures are expected for attacker-controlled input and are reported
    /// as an invalid validation result instead of propagating.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            ProtocolError::StackUnderflow(_)
                | ProtocolError::UnsupportedOpcode(_)
                | ProtocolError::ScriptVerifyFailed(_)
                | ProtocolError::InvalidSignature(_)
                | ProtocolError::InvalidPointEncoding(_)
                | ProtocolError::PointNotOnCurve(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
