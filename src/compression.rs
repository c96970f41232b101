//! Block-segmented LZ77+RLE compression codec (component B).
//!
//! Each compressed stream is a varint-prefixed sequence of 512-byte blocks.
//! Every block is a sequence of up to 256 "commands bytes", each packing
//! four 2-bit operation slots (terminator / literal / LZ77 back-reference /
//! RLE run), read LSB-first. LZ77 back-references are found and resolved
//! against the single continuous uncompressed stream, not a per-block
//! window — see `DESIGN.md`'s note on block independence.

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{CodecError, Result};
use crate::varint::{read_varint, write_varint};

const BLOCK_SIZE: usize = 512;
const MAX_LZ77_OFFSET: usize = 0xFFF;
const MAX_LZ77_LENGTH: usize = 17;
const MAX_RLE_COUNT: usize = 257;

const OP_TERMINATOR: u8 = 0b00;
const OP_LITERAL: u8 = 0b01;
const OP_BACKREF: u8 = 0b10;
const OP_RLE: u8 = 0b11;

/// Decompress a complete LZ77+RLE stream, reporting recoverable size
/// mismatches through `diagnostics` instead of failing.
pub fn decompress(data: &[u8], diagnostics: &mut Diagnostics) -> Result<Vec<u8>> {
    let mut pos = 0usize;
    let uncompressed_size = read_varint(data, &mut pos)?;
    let num_blocks = read_varint(data, &mut pos)? + 1;

    let mut output = Vec::with_capacity(uncompressed_size as usize);

    for block_index in 0..num_blocks as usize {
        let size_bytes = data
            .get(pos..pos + 2)
            .ok_or_else(|| CodecError::truncated(pos, 2))?;
        let declared_size = u16::from_le_bytes([size_bytes[0], size_bytes[1]]);
        pos += 2;
        let block_start = pos;

        decompress_block(data, &mut pos, &mut output)?;

        let actual_size = pos - block_start;
        if actual_size != declared_size as usize {
            diagnostics.push(Warning::BlockSizeMismatch {
                block_index,
                declared: declared_size,
                actual: actual_size,
            });
        }
    }

    if output.len() != uncompressed_size as usize {
        diagnostics.push(Warning::UncompressedSizeMismatch {
            declared: uncompressed_size,
            actual: output.len(),
        });
    }

    Ok(output)
}

/// Decode a single block's commands into `output`, stopping at a terminator
/// slot or after 256 commands bytes, whichever comes first.
fn decompress_block(data: &[u8], pos: &mut usize, output: &mut Vec<u8>) -> Result<()> {
    for _ in 0..256 {
        let mut commands_byte = *data
            .get(*pos)
            .ok_or_else(|| CodecError::truncated(*pos, 1))?;
        *pos += 1;

        for _ in 0..4 {
            match commands_byte & 0b11 {
                OP_TERMINATOR => return Ok(()),
                OP_LITERAL => {
                    let byte = *data
                        .get(*pos)
                        .ok_or_else(|| CodecError::truncated(*pos, 1))?;
                    *pos += 1;
                    output.push(byte);
                }
                OP_BACKREF => {
                    let bytes = data
                        .get(*pos..*pos + 2)
                        .ok_or_else(|| CodecError::truncated(*pos, 2))?;
                    let (d1, d2) = (bytes[0], bytes[1]);
                    *pos += 2;
                    let offset = d1 as usize | (((d2 & 0xF0) as usize) << 4);
                    let length = (d2 & 0x0F) as usize + 2;
                    copy_backreference(output, offset, length)?;
                }
                OP_RLE => {
                    let bytes = data
                        .get(*pos..*pos + 2)
                        .ok_or_else(|| CodecError::truncated(*pos, 2))?;
                    let (count, value) = (bytes[0], bytes[1]);
                    *pos += 2;
                    output.resize(output.len() + count as usize + 2, value);
                }
                _ => unreachable!("2-bit field can't exceed 0b11"),
            }
            commands_byte >>= 2;
        }
    }
    Ok(())
}

/// Copy `length` bytes from `offset` bytes before the end of `output`,
/// byte-by-byte so that a byte written earlier in this same copy is visible
/// to a later byte of it (standard LZ77 overlapping-copy semantics).
fn copy_backreference(output: &mut Vec<u8>, offset: usize, length: usize) -> Result<()> {
    let start = output
        .len()
        .checked_sub(offset)
        .ok_or_else(|| CodecError::truncated(output.len(), offset))?;
    for i in 0..length {
        let byte = output[start + i];
        output.push(byte);
    }
    Ok(())
}

/// Compress `data` into an LZ77+RLE stream using 512-byte blocks.
///
/// Matches the reference encoder's tie-breaks exactly: among equal-length
/// LZ77 candidates the largest offset wins, and a tie between the best LZ77
/// match and the best RLE run favors RLE.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(CodecError::EmptyInput);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&write_varint(data.len() as u32));
    let num_blocks = data.len().div_ceil(BLOCK_SIZE);
    out.extend_from_slice(&write_varint((num_blocks - 1) as u32));

    for block_number in 0..num_blocks {
        compress_block(data, block_number, &mut out);
    }

    Ok(out)
}

fn compress_block(data: &[u8], block_number: usize, out: &mut Vec<u8>) {
    let block_start = block_number * BLOCK_SIZE;
    let block_size = (data.len() - block_start).min(BLOCK_SIZE);

    let compressed_block_position = out.len();
    out.extend_from_slice(&[0u8, 0u8]); // placeholder size, patched below

    let mut block_offset = 0usize;
    // Tracks the slot index (0-3) last filled within a commands byte, across
    // the whole block, not just the final group. The reference encoder's
    // trailing-padding quirk keys off this alone, regardless of which op
    // occupied that slot.
    let mut last_slot: Option<usize> = None;

    while block_offset < block_size {
        let commands_byte_position = out.len();
        out.push(0);
        let mut commands_byte = 0u8;

        for slot in 0..4 {
            if block_offset >= block_size {
                break;
            }
            let current_pos = block_start + block_offset;
            let first_byte = data[current_pos];

            let (lz_len, lz_offset) = find_best_lz77_match(data, current_pos, block_offset, block_size);
            let rle_count = find_rle_run(data, current_pos, block_offset, block_size);

            let best_length = lz_len.max(rle_count);
            let op = if best_length <= 1 {
                out.push(first_byte);
                OP_LITERAL
            } else if lz_len > rle_count {
                out.push((lz_offset & 0xFF) as u8);
                out.push(((lz_len - 2) as u8) | (((lz_offset & 0xF00) >> 4) as u8));
                OP_BACKREF
            } else {
                out.push((rle_count - 2) as u8);
                out.push(first_byte);
                OP_RLE
            };

            commands_byte |= op << (slot * 2);
            block_offset += best_length;
            last_slot = Some(slot);
        }

        out[commands_byte_position] = commands_byte;
    }

    if last_slot == Some(3) {
        out.push(0x00);
    }

    let block_end = out.len();
    let patched_size = (block_end - compressed_block_position - 2) as u16;
    out[compressed_block_position..compressed_block_position + 2]
        .copy_from_slice(&patched_size.to_le_bytes());
}

/// Find the longest LZ77 match ending within the current block, preferring
/// the largest offset among matches of equal length.
fn find_best_lz77_match(
    data: &[u8],
    current_pos: usize,
    block_offset: usize,
    block_size: usize,
) -> (usize, usize) {
    let mut best_length = 0usize;
    let mut best_offset = 0usize;

    let max_offset = current_pos.min(MAX_LZ77_OFFSET);
    for offset in (1..=max_offset).rev() {
        let mut length = 0usize;
        while length < MAX_LZ77_LENGTH
            && length < offset
            && block_offset + length < block_size
            && data[current_pos + length] == data[current_pos - offset + length]
        {
            length += 1;
        }
        if length > best_length {
            best_length = length;
            best_offset = offset;
        }
    }

    (best_length, best_offset)
}

/// Find the length of the run of `data[current_pos]` starting there, bounded
/// by the remaining block size and the format's maximum run length.
fn find_rle_run(data: &[u8], current_pos: usize, block_offset: usize, block_size: usize) -> usize {
    let first_byte = data[current_pos];
    let mut count = 1usize;
    while block_offset + count < block_size && count < MAX_RLE_COUNT {
        if data[current_pos + count] != first_byte {
            break;
        }
        count += 1;
    }
    count
}
