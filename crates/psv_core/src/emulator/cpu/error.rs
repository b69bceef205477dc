//! Faults raised by the semantic routines.

use std::fmt;
use thiserror::Error;

/// Encoding-variant tag, using the reference manual's names for the
/// alternative bit layouts of a mnemonic. Chosen by the dispatcher and never
/// re-derived inside a semantic routine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, enum_iterator::Sequence)]
pub enum Encoding {
    T1,
    T2,
    T3,
    T4,
    A1,
    A2,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::T1 => "T1",
            Encoding::T2 => "T2",
            Encoding::T3 => "T3",
            Encoding::T4 => "T4",
            Encoding::A1 => "A1",
            Encoding::A2 => "A2",
        })
    }
}

/// A failure produced while executing one opcode.
///
/// Fatal for the current instruction; no architectural effect has been
/// committed when one of these is returned. The dispatcher decides whether
/// the guest thread dies or the fault is logged and skipped.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum OpcodeError {
    /// The bit pattern is UNDEFINED, UNPREDICTABLE, or actually encodes a
    /// different mnemonic that the dispatcher should have routed elsewhere.
    #[error("{mnemonic} ({encoding}) error: {reason} ({predicate})")]
    Rejected {
        mnemonic: &'static str,
        encoding: Encoding,
        /// Source text of the validation predicate that fired.
        predicate: &'static str,
        reason: &'static str,
    },

    /// A declared mnemonic or encoding without an implementation.
    #[error("{mnemonic} ({encoding}) is not implemented")]
    NotImplemented {
        mnemonic: &'static str,
        encoding: Encoding,
    },

    /// The dispatcher delivered an encoding variant this mnemonic does not
    /// have.
    #[error("{mnemonic} has no {encoding} encoding")]
    BadEncoding {
        mnemonic: &'static str,
        encoding: Encoding,
    },

    /// A well-formed instruction whose operand combination is unsupported,
    /// discovered after the condition check.
    #[error("{mnemonic} ({encoding}): {reason}")]
    Unsupported {
        mnemonic: &'static str,
        encoding: Encoding,
        reason: String,
    },

    /// Catch-all sink for opcode patterns with no handler at all.
    #[error("unknown/illegal opcode: {hw1:#06x} {hw0:#06x}")]
    Unknown { hw1: u16, hw0: u16 },
}

/// Outcome of one semantic routine.
pub type ExecResult = Result<(), OpcodeError>;

/// Converts an encoding-validation predicate into a decode failure carrying
/// the predicate text and the reference manual's reason ("UNPREDICTABLE",
/// the name of the aliasing instruction, ...).
macro_rules! reject {
    ($cond:expr, $mnemonic:expr, $encoding:expr, $reason:expr) => {
        if $cond {
            return Err($crate::emulator::cpu::error::OpcodeError::Rejected {
                mnemonic: $mnemonic,
                encoding: $encoding,
                predicate: stringify!($cond),
                reason: $reason,
            });
        }
    };
}
pub(crate) use reject;

#[inline]
pub(crate) fn not_implemented(mnemonic: &'static str, encoding: Encoding) -> ExecResult {
    Err(OpcodeError::NotImplemented { mnemonic, encoding })
}

#[inline]
pub(crate) fn bad_encoding(mnemonic: &'static str, encoding: Encoding) -> ExecResult {
    Err(OpcodeError::BadEncoding { mnemonic, encoding })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_formats_predicate_and_reason() {
        let err = OpcodeError::Rejected {
            mnemonic: "LDR_IMM",
            encoding: Encoding::T4,
            predicate: "n == 15",
            reason: "LDR (literal)",
        };
        let text = err.to_string();
        assert!(text.contains("LDR_IMM"));
        assert!(text.contains("T4"));
        assert!(text.contains("n == 15"));
        assert!(text.contains("LDR (literal)"));
    }

    #[test]
    fn unknown_carries_both_halfwords() {
        let err = OpcodeError::Unknown {
            hw1: 0xF7F0,
            hw0: 0xA000,
        };
        assert_eq!(err.to_string(), "unknown/illegal opcode: 0xf7f0 0xa000");
    }
}
