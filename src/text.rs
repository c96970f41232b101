//! Text and language table codec (component E): per-language text blobs,
//! optionally carrying a textbox-size prefix for dialog strings.

use crate::consts::DIALOG_STRUCTURED_ENTRY_RANGE;
use crate::error::{CodecError, Result};
use crate::varint::Reader;

/// Read a self-describing offset table: `u32` offsets are read one at a
/// time until the cursor reaches the first offset read (which is therefore
/// the byte length of the offset table itself). Used by both
/// [`TextTable`] and [`LanguageTable`].
fn read_self_describing_offset_table(reader: &mut Reader<'_>) -> Result<Vec<u32>> {
    let mut offsets = Vec::new();
    loop {
        let stop = match offsets.first() {
            Some(&first) => reader.position() >= first as usize,
            None => false,
        };
        if stop {
            break;
        }
        offsets.push(reader.read_u32()?);
    }
    Ok(offsets)
}

fn slice_between<'a>(data: &'a [u8], offsets: &[u32], i: usize) -> &'a [u8] {
    let start = offsets[i] as usize;
    let end = offsets
        .get(i + 1)
        .map(|&next| next as usize)
        .unwrap_or(data.len());
    &data[start..end]
}

/// One language's array of strings, optionally paired with a per-string
/// textbox size (dialog variant only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTable {
    strings: Vec<Vec<u8>>,
    is_dialog: bool,
    textbox_sizes: Option<Vec<(u8, u8)>>,
}

impl TextTable {
    /// Build a text table directly from its strings and (for the dialog
    /// variant) per-string textbox sizes.
    pub fn new(strings: Vec<Vec<u8>>, is_dialog: bool, textbox_sizes: Option<Vec<(u8, u8)>>) -> Self {
        Self {
            strings,
            is_dialog,
            textbox_sizes,
        }
    }

    /// The table's raw string payloads, in order.
    pub fn strings(&self) -> &[Vec<u8>] {
        &self.strings
    }

    /// Whether this is a dialog-variant table (each string prefixed by a
    /// 2-byte textbox size on the wire).
    pub fn is_dialog(&self) -> bool {
        self.is_dialog
    }

    /// Per-string `(width, height)` textbox sizes, present only for the
    /// dialog variant.
    pub fn textbox_sizes(&self) -> Option<&[(u8, u8)]> {
        self.textbox_sizes.as_deref()
    }

    /// Parse a text table from its offset-prefixed byte layout.
    pub fn from_bytes(data: &[u8], is_dialog: bool) -> Result<Self> {
        let mut reader = Reader::new(data);
        let offsets = read_self_describing_offset_table(&mut reader)?;

        let mut strings = Vec::with_capacity(offsets.len());
        let mut textbox_sizes = is_dialog.then(Vec::new);
        for i in 0..offsets.len() {
            let mut slice = slice_between(data, &offsets, i);
            if is_dialog {
                if slice.len() < 2 {
                    return Err(CodecError::truncated(offsets[i] as usize, 2 - slice.len()));
                }
                textbox_sizes.as_mut().unwrap().push((slice[0], slice[1]));
                slice = &slice[2..];
            }
            strings.push(slice.to_vec());
        }

        Ok(Self {
            strings,
            is_dialog,
            textbox_sizes,
        })
    }

    /// Serialize back to the offset-prefixed byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut offsets_raw = Vec::new();
        let mut strings_raw = Vec::new();

        let base_offset = self.strings.len() * 4;
        for (i, string) in self.strings.iter().enumerate() {
            let offset = base_offset + strings_raw.len();
            offsets_raw.extend_from_slice(&(offset as u32).to_le_bytes());
            if self.is_dialog {
                let (width, height) = self.textbox_sizes.as_ref().unwrap()[i];
                strings_raw.push(width);
                strings_raw.push(height);
            }
            strings_raw.extend_from_slice(string);
        }

        offsets_raw.extend_from_slice(&strings_raw);
        offsets_raw
    }
}

/// One slot of a [`LanguageTable`]: either genuinely absent (zero-length on
/// the wire), a structured [`TextTable`], or an opaque byte blob this crate
/// doesn't interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguagePayload {
    /// No data at all for this language slot.
    Absent,
    /// A parsed text table.
    Structured(TextTable),
    /// Bytes preserved as-is: either a non-dialog table's trailing slot, or
    /// a dialog table's slot outside the known structured-entry range.
    Opaque(Vec<u8>),
}

/// The per-language array of text tables carried by a dialog or
/// non-dialog FEvent chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTable {
    index: Option<usize>,
    text_tables: Vec<LanguagePayload>,
}

impl LanguageTable {
    /// Build a language table directly from its payload slots.
    pub fn new(text_tables: Vec<LanguagePayload>, index: Option<usize>) -> Self {
        Self { index, text_tables }
    }

    /// The table's slot within its FEvent offset table, if known.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Record the table's slot within its FEvent offset table.
    pub fn set_index(&mut self, index: usize) {
        self.index = Some(index);
    }

    /// The table's per-language payload slots, in order.
    pub fn text_tables(&self) -> &[LanguagePayload] {
        &self.text_tables
    }

    /// Parse a language table. `is_dialog` selects which slot indices are
    /// treated as structured [`TextTable`]s: all but the last slot for a
    /// non-dialog table, or the fixed [`DIALOG_STRUCTURED_ENTRY_RANGE`] for
    /// a dialog table.
    pub fn from_bytes(data: &[u8], is_dialog: bool) -> Result<Self> {
        let mut reader = Reader::new(data);
        let offsets = read_self_describing_offset_table(&mut reader)?;

        let mut text_tables = Vec::with_capacity(offsets.len());
        let last = offsets.len().saturating_sub(1);
        for i in 0..offsets.len() {
            let slice = slice_between(data, &offsets, i);
            let is_structured = if is_dialog {
                DIALOG_STRUCTURED_ENTRY_RANGE.contains(&i)
            } else {
                i != last
            };

            text_tables.push(if slice.is_empty() {
                LanguagePayload::Absent
            } else if is_structured {
                LanguagePayload::Structured(TextTable::from_bytes(slice, is_dialog)?)
            } else {
                LanguagePayload::Opaque(slice.to_vec())
            });
        }

        Ok(Self {
            index: None,
            text_tables,
        })
    }

    /// Serialize back to the offset-prefixed byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut offsets_raw = Vec::new();
        let mut tables_raw = Vec::new();

        let base_offset = self.text_tables.len() * 4;
        for text_table in &self.text_tables {
            let offset = base_offset + tables_raw.len();
            offsets_raw.extend_from_slice(&(offset as u32).to_le_bytes());
            match text_table {
                LanguagePayload::Structured(table) => tables_raw.extend_from_slice(&table.to_bytes()),
                LanguagePayload::Opaque(bytes) => tables_raw.extend_from_slice(bytes),
                LanguagePayload::Absent => {}
            }
        }

        offsets_raw.extend_from_slice(&tables_raw);
        offsets_raw
    }
}
