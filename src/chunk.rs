//! FEvent chunk discriminator (component G): each of the three offsets in a
//! FEvent offset table triple points at either a [`Script`] or a
//! [`LanguageTable`], distinguished by a magic value at the start of the
//! chunk's bytes.

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::script::{CommandMetadataTable, Script};
use crate::text::LanguageTable;

/// Magic `u32` identifying a dialog-variant [`LanguageTable`] chunk; any
/// other leading value (or too few bytes to hold one) is read as a script.
pub const LANGUAGE_TABLE_DIALOG_MAGIC: u32 = crate::consts::LANGUAGE_TABLE_DIALOG_MAGIC;

/// One parsed FEvent chunk, as identified by [`parse_fevent_chunk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FEventChunk {
    /// A script subroutine container.
    Script(Script),
    /// A dialog language table.
    LanguageTable(LanguageTable),
}

impl FEventChunk {
    /// Serialize the chunk back to bytes.
    pub fn to_bytes(&self, table: &CommandMetadataTable<'_>) -> Result<Vec<u8>> {
        match self {
            Self::Script(script) => script.to_bytes(table),
            Self::LanguageTable(language_table) => Ok(language_table.to_bytes()),
        }
    }
}

/// Identify and parse one FEvent offset-table slot's bytes.
///
/// Returns `None` for a zero-length slot (an offset-table entry with no
/// data, i.e. back-to-back with the next offset). Otherwise reads a
/// leading `u32`: [`LANGUAGE_TABLE_DIALOG_MAGIC`] means a dialog
/// [`LanguageTable`]; anything else is parsed as a [`Script`].
pub fn parse_fevent_chunk(
    table: &CommandMetadataTable<'_>,
    index: usize,
    data: &[u8],
    diagnostics: &mut Diagnostics,
) -> Result<Option<FEventChunk>> {
    if data.is_empty() {
        return Ok(None);
    }

    let leading = data
        .get(0..4)
        .map(|bytes| u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));

    if leading == Some(LANGUAGE_TABLE_DIALOG_MAGIC) {
        let mut language_table = LanguageTable::from_bytes(data, true)?;
        language_table.set_index(index);
        Ok(Some(FEventChunk::LanguageTable(language_table)))
    } else {
        Ok(Some(FEventChunk::Script(Script::from_bytes(
            table,
            index,
            data,
            diagnostics,
        )?)))
    }
}
