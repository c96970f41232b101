//! Hard-error type for codec operations.
//!
//! Conditions here always abort the current parse/serialize; recoverable
//! conditions go through [`crate::diagnostics::Warning`] instead.

use thiserror::Error;

/// The error type for all fallible `mnl-codec` operations.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CodecError {
    /// Ran out of input bytes while reading a fixed-size or length-prefixed field.
    #[error("truncated input: needed {needed} more byte(s) at offset {offset}")]
    Truncated {
        /// Byte offset at which the read was attempted.
        offset: usize,
        /// Number of additional bytes that were needed.
        needed: usize,
    },

    /// A command id outside the valid `0..NUMBER_OF_COMMANDS` range was read
    /// outside of a subroutine-parsing context (where it would instead be
    /// reinterpreted as end-of-subroutine).
    #[error("invalid command id 0x{command_id:04X} (table has {table_len} entries)")]
    InvalidCommandId {
        /// The out-of-range command id.
        command_id: u16,
        /// Number of entries in the metadata table that was consulted.
        table_len: usize,
    },

    /// A parameter-type nibble outside the registry's range was read outside
    /// of a subroutine-parsing context.
    #[error("invalid parameter type 0x{parameter_type:X}")]
    InvalidParameterType {
        /// The out-of-range parameter type nibble.
        parameter_type: u8,
    },

    /// A command's argument count did not match its metadata's parameter count on serialize.
    #[error(
        "command 0x{command_id:04X} has {actual} argument(s), metadata declares {expected}"
    )]
    ArgumentCountMismatch {
        /// The command id being serialized.
        command_id: u16,
        /// The parameter count declared by the command's metadata.
        expected: usize,
        /// The number of arguments actually supplied.
        actual: usize,
    },

    /// A command-parameter metadata record declared (or was given) more
    /// parameters than its fixed 16-byte record can hold.
    #[error("parameter count {count} exceeds the 16-byte record's maximum of {max}")]
    ParameterCountOutOfRange {
        /// The parameter count that didn't fit.
        count: usize,
        /// The maximum a 16-byte record can hold.
        max: usize,
    },

    /// `compress` was called on an empty buffer, which the reference encoder's
    /// `num_blocks_minus_one` scheme cannot represent without sign wraparound.
    #[error("cannot compress an empty buffer (undefined in the reference encoder)")]
    EmptyInput,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CodecError>;

impl CodecError {
    /// Build a [`CodecError::Truncated`].
    pub fn truncated(offset: usize, needed: usize) -> Self {
        Self::Truncated { offset, needed }
    }
}
