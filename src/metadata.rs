//! Command-parameter metadata (component C): the fixed 16-byte record that
//! tells the script codec how many arguments a command takes, whether it
//! produces a result, and the primitive type of each non-variable argument.

use crate::error::{CodecError, Result};

/// Size in bytes of one [`CommandParameterMetadata`] record on disk.
pub const RECORD_SIZE: usize = 16;

/// Maximum number of parameter types a record can hold: one flags/count byte
/// leaves 15 payload bytes, each packing two 4-bit nibbles.
pub const MAX_PARAMETER_COUNT: usize = (RECORD_SIZE - 1) * 2;

/// Per-command parameter layout: whether the command writes a result
/// variable, and the primitive type nibble of each of its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParameterMetadata {
    has_return_value: bool,
    parameter_types: Vec<u8>,
}

impl CommandParameterMetadata {
    /// Build a record directly. `parameter_types.len()` is only checked
    /// against [`MAX_PARAMETER_COUNT`] on [`to_bytes`](Self::to_bytes), not
    /// here, to mirror the reference's permissive constructor; every entry
    /// is masked to a 4-bit nibble on serialization regardless of its value.
    pub fn new(has_return_value: bool, parameter_types: Vec<u8>) -> Self {
        Self {
            has_return_value,
            parameter_types,
        }
    }

    /// Whether this command writes a result into a [`crate::script::Variable`].
    pub fn has_return_value(&self) -> bool {
        self.has_return_value
    }

    /// The parameter-type nibble of each argument, in order.
    pub fn parameter_types(&self) -> &[u8] {
        &self.parameter_types
    }

    /// Parse one 16-byte record: a flags/count byte followed by 15 bytes of
    /// nibble-packed parameter types (low nibble first).
    ///
    /// The flags byte's low 7 bits can declare up to 127, but the record only
    /// has room for [`MAX_PARAMETER_COUNT`]; a declared count past that is
    /// rejected with [`CodecError::ParameterCountOutOfRange`] rather than
    /// indexed out of bounds.
    pub fn from_bytes(data: &[u8; RECORD_SIZE]) -> Result<Self> {
        let param_metadata = data[0];
        let has_return_value = param_metadata & 0x80 != 0;
        let number_of_parameters = (param_metadata & 0x7F) as usize;
        if number_of_parameters > MAX_PARAMETER_COUNT {
            return Err(CodecError::ParameterCountOutOfRange {
                count: number_of_parameters,
                max: MAX_PARAMETER_COUNT,
            });
        }

        let mut parameter_types = Vec::with_capacity(number_of_parameters);
        for i in 0..number_of_parameters {
            let raw_byte = data[1 + i / 2];
            parameter_types.push((raw_byte >> ((i % 2) * 4)) & 0x0F);
        }

        Ok(Self {
            has_return_value,
            parameter_types,
        })
    }

    /// Serialize back to the fixed 16-byte record.
    ///
    /// A parameter-type nibble past `0xF` is masked down, since this is an
    /// in-memory invariant (every value this crate itself produces via
    /// [`from_bytes`](Self::from_bytes) already fits) rather than untrusted
    /// input. A parameter count past [`MAX_PARAMETER_COUNT`] has nowhere to
    /// go in the 16-byte record at all, so it's rejected instead.
    pub fn to_bytes(&self) -> Result<[u8; RECORD_SIZE]> {
        if self.parameter_types.len() > MAX_PARAMETER_COUNT {
            return Err(CodecError::ParameterCountOutOfRange {
                count: self.parameter_types.len(),
                max: MAX_PARAMETER_COUNT,
            });
        }

        let mut out = [0u8; RECORD_SIZE];
        out[0] = ((self.has_return_value as u8) << 7) | (self.parameter_types.len() as u8);
        for (i, &parameter_type) in self.parameter_types.iter().enumerate() {
            out[1 + i / 2] |= (parameter_type & 0x0F) << ((i % 2) * 4);
        }
        Ok(out)
    }
}

/// Width in bytes and signedness of the primitive codec used for a literal
/// argument of parameter-type nibble `parameter_type`.
pub fn parameter_type_width(parameter_type: u8) -> Result<(usize, bool)> {
    crate::consts::PARAMETER_TYPE_WIDTHS
        .get(parameter_type as usize)
        .copied()
        .ok_or(CodecError::InvalidParameterType { parameter_type })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_no_parameters() {
        let meta = CommandParameterMetadata::new(false, vec![]);
        let bytes = meta.to_bytes().unwrap();
        assert_eq!(bytes, [0u8; RECORD_SIZE]);
        assert_eq!(CommandParameterMetadata::from_bytes(&bytes).unwrap(), meta);
    }

    #[test]
    fn round_trip_with_return_value_and_odd_parameter_count() {
        let meta = CommandParameterMetadata::new(true, vec![0x1, 0x2, 0x3]);
        let bytes = meta.to_bytes().unwrap();
        // flags byte: bit7 set, count=3
        assert_eq!(bytes[0], 0x80 | 0x03);
        // nibble 0 and 1 packed into byte 1, nibble 2 alone in low nibble of byte 2
        assert_eq!(bytes[1], 0x21);
        assert_eq!(bytes[2], 0x03);
        assert_eq!(CommandParameterMetadata::from_bytes(&bytes).unwrap(), meta);
    }

    #[test]
    fn round_trip_max_parameter_count() {
        let types: Vec<u8> = (0..MAX_PARAMETER_COUNT as u8).map(|i| i % 16).collect();
        let meta = CommandParameterMetadata::new(false, types);
        let bytes = meta.to_bytes().unwrap();
        assert_eq!(CommandParameterMetadata::from_bytes(&bytes).unwrap(), meta);
    }

    #[test]
    fn to_bytes_rejects_parameter_count_past_record_capacity() {
        let meta = CommandParameterMetadata::new(false, vec![0u8; MAX_PARAMETER_COUNT + 1]);
        assert!(matches!(
            meta.to_bytes(),
            Err(CodecError::ParameterCountOutOfRange { .. })
        ));
    }

    #[test]
    fn from_bytes_rejects_declared_count_past_record_capacity() {
        let mut data = [0u8; RECORD_SIZE];
        data[0] = (MAX_PARAMETER_COUNT + 1) as u8;
        assert!(matches!(
            CommandParameterMetadata::from_bytes(&data),
            Err(CodecError::ParameterCountOutOfRange { .. })
        ));
    }

    #[test]
    fn parameter_type_width_rejects_out_of_range() {
        assert!(parameter_type_width(0xFF).is_err());
        assert!(parameter_type_width(0x0).is_ok());
    }
}
