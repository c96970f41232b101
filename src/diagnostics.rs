//! Non-fatal warning side channel.
//!
//! Some malformed-but-recoverable conditions (declared vs. actual size
//! mismatches, an offset-table length that doesn't satisfy an expected
//! modulus, extra bytes between header sections) are not hard errors: the
//! reference implementation's `warnings.warn(...)` keeps going and produces
//! a best-effort result. [`Diagnostics`] plays that role here.

use std::fmt;

/// A single recoverable parse/serialize anomaly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A compressed block's declared size didn't match the number of bytes
    /// actually consumed decoding it.
    BlockSizeMismatch {
        /// Index of the block (0-based) within the compressed stream.
        block_index: usize,
        /// Size recorded in the block header.
        declared: u16,
        /// Size actually consumed.
        actual: usize,
    },
    /// A compressed stream's declared uncompressed size didn't match the
    /// number of bytes actually produced.
    UncompressedSizeMismatch {
        /// Size recorded in the stream header.
        declared: u32,
        /// Size actually produced.
        actual: usize,
    },
    /// The FEvent offset table's length-in-triples didn't satisfy `% 3 == 1`
    /// once converted from the on-wire word count.
    FeventOffsetTableLengthNotCongruent {
        /// The length-in-words-derived value that should have been `≡ 1 (mod 3)`.
        length: u32,
    },
    /// There were leftover bytes between a script header's section 2 and
    /// section 3 that weren't accounted for by section 2's declared layout.
    ExtraBytesBetweenSections {
        /// Index of the script being parsed.
        script_index: usize,
        /// Cursor position where parsing of section 2 ended.
        parsed_end: usize,
        /// Section 3's declared start offset.
        section3_offset: usize,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockSizeMismatch {
                block_index,
                declared,
                actual,
            } => write!(
                f,
                "compressed block {block_index}: declared size {declared} doesn't match actual size {actual}"
            ),
            Self::UncompressedSizeMismatch { declared, actual } => write!(
                f,
                "declared uncompressed size {declared} doesn't match actual size {actual}"
            ),
            Self::FeventOffsetTableLengthNotCongruent { length } => write!(
                f,
                "FEvent offset table length ({length}) % 3 is not 1, but rather {}",
                length % 3
            ),
            Self::ExtraBytesBetweenSections {
                script_index,
                parsed_end,
                section3_offset,
            } => write!(
                f,
                "script {script_index}: {} extra byte(s) between header sections 2 and 3 (parsed to {parsed_end}, section 3 starts at {section3_offset})",
                section3_offset.saturating_sub(*parsed_end)
            ),
        }
    }
}

/// Collects [`Warning`]s emitted during a parse or serialize, mirroring each
/// one to the `log` facade as it's recorded.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it at `warn` level.
    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// Borrow the warnings recorded so far.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Whether any warnings were recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Consume the collector, returning the recorded warnings.
    pub fn into_vec(self) -> Vec<Warning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_records_in_order() {
        let mut diag = Diagnostics::new();
        diag.push(Warning::UncompressedSizeMismatch {
            declared: 10,
            actual: 9,
        });
        diag.push(Warning::FeventOffsetTableLengthNotCongruent { length: 5 });
        assert_eq!(diag.warnings().len(), 2);
        assert!(!diag.is_empty());
    }

    #[test]
    fn display_is_human_readable() {
        let w = Warning::FeventOffsetTableLengthNotCongruent { length: 5 };
        assert_eq!(
            w.to_string(),
            "FEvent offset table length (5) % 3 is not 1, but rather 2"
        );
    }
}
