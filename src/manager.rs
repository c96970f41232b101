//! Container manager (component F): ties the compression, metadata, script,
//! text, and chunk codecs together into whole-file load/save operations
//! over the fixed set of overlay and FEvent files this format spans.

use crate::chunk::{parse_fevent_chunk, FEventChunk};
use crate::consts;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{CodecError, Result};
use crate::metadata::CommandParameterMetadata;
use crate::script::CommandMetadataTable;
use crate::varint::Reader;

/// Which of the four command-parameter metadata tables an operation
/// targets. The base game only has one (`mnllib.managers.load_overlay6`);
/// the other three generalize the same codec to the battle, menu, and shop
/// command sets this format also defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandTableKind {
    /// The base FEvent command table, in overlay 6.
    FEvent,
    /// The battle command table, in overlay 12.
    Battle,
    /// The menu command table, in overlay 123.
    Menu,
    /// The shop command table, in overlay 124.
    Shop,
}

impl CommandTableKind {
    fn address_and_count(self) -> (usize, usize) {
        match self {
            Self::FEvent => (
                consts::FEVENT_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS,
                consts::FEVENT_NUMBER_OF_COMMANDS,
            ),
            Self::Battle => (
                consts::BATTLE_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS,
                consts::BATTLE_NUMBER_OF_COMMANDS,
            ),
            Self::Menu => (
                consts::MENU_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS,
                consts::MENU_NUMBER_OF_COMMANDS,
            ),
            Self::Shop => (
                consts::SHOP_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS,
                consts::SHOP_NUMBER_OF_COMMANDS,
            ),
        }
    }
}

/// All four command-parameter metadata tables this format defines.
#[derive(Debug, Clone, Default)]
pub struct CommandMetadataSet {
    fevent: Vec<CommandParameterMetadata>,
    battle: Vec<CommandParameterMetadata>,
    menu: Vec<CommandParameterMetadata>,
    shop: Vec<CommandParameterMetadata>,
}

impl CommandMetadataSet {
    fn slot(&self, kind: CommandTableKind) -> &[CommandParameterMetadata] {
        match kind {
            CommandTableKind::FEvent => &self.fevent,
            CommandTableKind::Battle => &self.battle,
            CommandTableKind::Menu => &self.menu,
            CommandTableKind::Shop => &self.shop,
        }
    }

    fn slot_mut(&mut self, kind: CommandTableKind) -> &mut Vec<CommandParameterMetadata> {
        match kind {
            CommandTableKind::FEvent => &mut self.fevent,
            CommandTableKind::Battle => &mut self.battle,
            CommandTableKind::Menu => &mut self.menu,
            CommandTableKind::Shop => &mut self.shop,
        }
    }

    /// Borrow one of the four tables as a [`CommandMetadataTable`] for use
    /// by the script codec.
    pub fn table(&self, kind: CommandTableKind) -> CommandMetadataTable<'_> {
        CommandMetadataTable::new(self.slot(kind))
    }
}

/// The output of [`Manager::save_all`]: one freshly-serialized buffer per
/// file this format spans.
#[derive(Debug, Clone)]
pub struct ManagerBytes {
    /// Overlay 3: the FEvent offset table and footer.
    pub overlay3: Vec<u8>,
    /// Overlay 6: the base FEvent command-parameter metadata table.
    pub overlay6: Vec<u8>,
    /// Overlay 12: the battle command-parameter metadata table.
    pub overlay12: Vec<u8>,
    /// Overlay 123: the menu command-parameter metadata table.
    pub overlay123: Vec<u8>,
    /// Overlay 124: the shop command-parameter metadata table.
    pub overlay124: Vec<u8>,
    /// `FEvent.dat`: the script/language-table chunks and trailing footer.
    pub fevent: Vec<u8>,
}

fn read_u32_at(data: &[u8], address: usize) -> Result<u32> {
    let mut reader = Reader::new(data);
    reader.seek(address);
    reader.read_u32()
}

/// Ties the compression, metadata, script, text, and chunk codecs together
/// into whole-file load/save operations.
///
/// Parsing always builds into fresh locals and only assigns into `self`
/// once a load operation succeeds in full, so a failed load never leaves a
/// manager half-updated.
#[derive(Debug, Clone, Default)]
pub struct Manager {
    fevent_offset_table: Vec<(u32, u32, u32)>,
    fevent_footer_offset: usize,
    fevent_footer: Vec<u8>,
    fevent_chunks: Vec<[Option<FEventChunk>; 3]>,
    command_metadata: CommandMetadataSet,
    overlay3_raw: Vec<u8>,
    overlay6_raw: Vec<u8>,
    overlay12_raw: Vec<u8>,
    overlay123_raw: Vec<u8>,
    overlay124_raw: Vec<u8>,
}

impl Manager {
    /// The FEvent offset table: one `(script, language table a, language
    /// table b)` offset triple per entry.
    pub fn fevent_offset_table(&self) -> &[(u32, u32, u32)] {
        &self.fevent_offset_table
    }

    /// The parsed FEvent chunks, one triple per offset-table entry.
    pub fn fevent_chunks(&self) -> &[[Option<FEventChunk>; 3]] {
        &self.fevent_chunks
    }

    /// Mutable access to the parsed FEvent chunks, for building a modified
    /// script set before calling [`Manager::save_fevent`].
    pub fn fevent_chunks_mut(&mut self) -> &mut Vec<[Option<FEventChunk>; 3]> {
        &mut self.fevent_chunks
    }

    /// The bytes following the last FEvent chunk.
    pub fn fevent_footer(&self) -> &[u8] {
        &self.fevent_footer
    }

    /// The four command-parameter metadata tables.
    pub fn command_metadata(&self) -> &CommandMetadataSet {
        &self.command_metadata
    }

    /// Mutable access to the four command-parameter metadata tables.
    pub fn command_metadata_mut(&mut self) -> &mut CommandMetadataSet {
        &mut self.command_metadata
    }

    /// Load the FEvent offset table and footer offset from overlay 3.
    pub fn load_overlay3(&mut self, overlay3: &[u8], diagnostics: &mut Diagnostics) -> Result<()> {
        let raw_length = read_u32_at(overlay3, consts::FEVENT_OFFSET_TABLE_LENGTH_ADDRESS)?;
        let length = raw_length / 4 - 1;
        if length % 3 != 1 {
            diagnostics.push(Warning::FeventOffsetTableLengthNotCongruent { length });
        }

        let mut reader = Reader::new(overlay3);
        reader.seek(consts::FEVENT_OFFSET_TABLE_ADDRESS);
        let mut fevent_offset_table = Vec::with_capacity(length as usize / 3);
        for _ in 0..(length / 3) {
            fevent_offset_table.push((
                reader.read_u32()?,
                reader.read_u32()?,
                reader.read_u32()?,
            ));
        }
        let fevent_footer_offset = reader.read_u32()? as usize;

        self.fevent_offset_table = fevent_offset_table;
        self.fevent_footer_offset = fevent_footer_offset;
        self.overlay3_raw = overlay3.to_vec();
        Ok(())
    }

    /// Splice a freshly-serialized FEvent offset table and footer offset
    /// into the original overlay 3 bytes this manager was loaded from.
    pub fn save_overlay3(&self) -> Result<Vec<u8>> {
        let mut raw = self.overlay3_raw.clone();

        let old_raw_length =
            read_u32_at(&self.overlay3_raw, consts::FEVENT_OFFSET_TABLE_LENGTH_ADDRESS)?;
        let old_length = (old_raw_length / 4 - 1) as usize;
        let remove_start = consts::FEVENT_OFFSET_TABLE_LENGTH_ADDRESS;
        let remove_end = consts::FEVENT_OFFSET_TABLE_ADDRESS + old_length * 4;

        let mut replacement = Vec::new();
        replacement.extend_from_slice(
            &(((self.fevent_offset_table.len() as u32) * 3 + 2) * 4).to_le_bytes(),
        );
        for &(a, b, c) in &self.fevent_offset_table {
            replacement.extend_from_slice(&a.to_le_bytes());
            replacement.extend_from_slice(&b.to_le_bytes());
            replacement.extend_from_slice(&c.to_le_bytes());
        }
        replacement.extend_from_slice(&(self.fevent_footer_offset as u32).to_le_bytes());

        raw.splice(remove_start..remove_end, replacement);
        Ok(raw)
    }

    fn overlay_raw(&self, kind: CommandTableKind) -> &[u8] {
        match kind {
            CommandTableKind::FEvent => &self.overlay6_raw,
            CommandTableKind::Battle => &self.overlay12_raw,
            CommandTableKind::Menu => &self.overlay123_raw,
            CommandTableKind::Shop => &self.overlay124_raw,
        }
    }

    fn overlay_raw_mut(&mut self, kind: CommandTableKind) -> &mut Vec<u8> {
        match kind {
            CommandTableKind::FEvent => &mut self.overlay6_raw,
            CommandTableKind::Battle => &mut self.overlay12_raw,
            CommandTableKind::Menu => &mut self.overlay123_raw,
            CommandTableKind::Shop => &mut self.overlay124_raw,
        }
    }

    /// Load one of the four command-parameter metadata tables from its
    /// overlay, retaining a copy of the overlay's bytes so a later save can
    /// write the table back in place.
    pub fn load_command_metadata(&mut self, kind: CommandTableKind, overlay: &[u8]) -> Result<()> {
        let (address, count) = kind.address_and_count();
        let mut entries = Vec::with_capacity(count);
        let mut pos = address;
        for _ in 0..count {
            let record: [u8; 16] = overlay
                .get(pos..pos + 16)
                .ok_or_else(|| CodecError::truncated(pos, 16))?
                .try_into()
                .expect("slice length checked above");
            entries.push(CommandParameterMetadata::from_bytes(&record)?);
            pos += 16;
        }
        *self.command_metadata.slot_mut(kind) = entries;
        *self.overlay_raw_mut(kind) = overlay.to_vec();
        Ok(())
    }

    /// Write one of the four command-parameter metadata tables back into a
    /// copy of the original overlay bytes it was loaded from.
    pub fn save_command_metadata(&self, kind: CommandTableKind) -> Result<Vec<u8>> {
        let (address, _count) = kind.address_and_count();
        let mut out = self.overlay_raw(kind).to_vec();
        let mut pos = address;
        for entry in self.command_metadata.slot(kind) {
            out[pos..pos + 16].copy_from_slice(&entry.to_bytes()?);
            pos += 16;
        }
        Ok(out)
    }

    /// Parse every FEvent chunk referenced by the offset table already
    /// loaded via [`Manager::load_overlay3`], plus the trailing footer.
    pub fn load_fevent(&mut self, fevent: &[u8], diagnostics: &mut Diagnostics) -> Result<()> {
        let flat: Vec<u32> = self
            .fevent_offset_table
            .iter()
            .flat_map(|&(a, b, c)| [a, b, c])
            .collect();
        let table = self.command_metadata.table(CommandTableKind::FEvent);

        let mut chunks = Vec::with_capacity(self.fevent_offset_table.len());
        let mut index = 0usize;
        for _ in 0..self.fevent_offset_table.len() {
            let mut triple: [Option<FEventChunk>; 3] = [None, None, None];
            for slot in &mut triple {
                let offset = flat[index] as usize;
                let length = if index + 1 < flat.len() {
                    (flat[index + 1] as usize).saturating_sub(offset)
                } else {
                    0
                };
                let data = fevent
                    .get(offset..offset + length)
                    .ok_or_else(|| CodecError::truncated(offset, length))?;
                *slot = parse_fevent_chunk(&table, index, data, diagnostics)?;
                index += 1;
            }
            chunks.push(triple);
        }

        let fevent_footer = fevent
            .get(self.fevent_footer_offset..)
            .ok_or_else(|| CodecError::truncated(self.fevent_footer_offset, 0))?
            .to_vec();

        self.fevent_chunks = chunks;
        self.fevent_footer = fevent_footer;
        Ok(())
    }

    /// Serialize every FEvent chunk back to bytes, recomputing the FEvent
    /// offset table and footer offset from the current chunk layout.
    pub fn save_fevent(&mut self) -> Result<Vec<u8>> {
        let table = self.command_metadata.table(CommandTableKind::FEvent);

        let mut out = Vec::new();
        let mut fevent_offset_table = Vec::with_capacity(self.fevent_chunks.len());
        for triple in &self.fevent_chunks {
            let mut offsets = [0u32; 3];
            for (i, chunk) in triple.iter().enumerate() {
                offsets[i] = out.len() as u32;
                if let Some(chunk) = chunk {
                    out.extend_from_slice(&chunk.to_bytes(&table)?);
                }
            }
            fevent_offset_table.push((offsets[0], offsets[1], offsets[2]));
        }

        self.fevent_offset_table = fevent_offset_table;
        self.fevent_footer_offset = out.len();
        out.extend_from_slice(&self.fevent_footer);
        Ok(out)
    }

    /// Load the FEvent offset table, all four command-metadata tables, and
    /// every FEvent chunk, in the order the reference loader uses.
    pub fn load_all(
        overlay3: &[u8],
        overlay6: &[u8],
        overlay12: &[u8],
        overlay123: &[u8],
        overlay124: &[u8],
        fevent: &[u8],
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let mut manager = Self::default();
        manager.load_overlay3(overlay3, diagnostics)?;
        manager.load_command_metadata(CommandTableKind::FEvent, overlay6)?;
        manager.load_command_metadata(CommandTableKind::Battle, overlay12)?;
        manager.load_command_metadata(CommandTableKind::Menu, overlay123)?;
        manager.load_command_metadata(CommandTableKind::Shop, overlay124)?;
        manager.load_fevent(fevent, diagnostics)?;
        Ok(manager)
    }

    /// Serialize everything back to bytes: the FEvent file first (so its
    /// freshly recomputed offset table is available for overlay 3), then
    /// each command-metadata overlay, then overlay 3 itself.
    ///
    /// Takes `&self` by cloning internally, mirroring the reference
    /// (`save_fevent(); save_overlay6(); save_overlay3()` in that order,
    /// each depending on state the previous step just recomputed) without
    /// requiring callers to hold a mutable manager just to save it.
    pub fn save_all(&self) -> Result<ManagerBytes> {
        let mut working = self.clone();
        let fevent = working.save_fevent()?;
        let overlay6 = working.save_command_metadata(CommandTableKind::FEvent)?;
        let overlay12 = working.save_command_metadata(CommandTableKind::Battle)?;
        let overlay123 = working.save_command_metadata(CommandTableKind::Menu)?;
        let overlay124 = working.save_command_metadata(CommandTableKind::Shop)?;
        let overlay3 = working.save_overlay3()?;

        Ok(ManagerBytes {
            overlay3,
            overlay6,
            overlay12,
            overlay123,
            overlay124,
            fevent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{Script, ScriptHeader, Subroutine};

    fn empty_overlay(min_len: usize) -> Vec<u8> {
        vec![0u8; min_len]
    }

    fn build_overlay3(triples: &[(u32, u32, u32)], footer_offset: u32) -> Vec<u8> {
        let length_address = consts::FEVENT_OFFSET_TABLE_LENGTH_ADDRESS;
        let mut overlay3 = empty_overlay(length_address + 4 + triples.len() * 12 + 4 + 16);
        let raw_length = (triples.len() as u32 * 3 + 2) * 4;
        overlay3[length_address..length_address + 4].copy_from_slice(&raw_length.to_le_bytes());
        let mut pos = consts::FEVENT_OFFSET_TABLE_ADDRESS;
        for &(a, b, c) in triples {
            overlay3[pos..pos + 4].copy_from_slice(&a.to_le_bytes());
            overlay3[pos + 4..pos + 8].copy_from_slice(&b.to_le_bytes());
            overlay3[pos + 8..pos + 12].copy_from_slice(&c.to_le_bytes());
            pos += 12;
        }
        overlay3[pos..pos + 4].copy_from_slice(&footer_offset.to_le_bytes());
        overlay3
    }

    #[test]
    fn load_overlay3_reads_offset_table_and_footer() {
        let overlay3 = build_overlay3(&[(0, 10, 20)], 30);
        let mut manager = Manager::default();
        let mut diag = Diagnostics::new();
        manager.load_overlay3(&overlay3, &mut diag).unwrap();
        assert_eq!(manager.fevent_offset_table(), &[(0, 10, 20)]);
        assert!(diag.is_empty());
    }

    #[test]
    fn load_overlay3_warns_on_non_congruent_length() {
        // length (raw_length/4 - 1) = 2, which is not ≡ 1 (mod 3).
        let length_address = consts::FEVENT_OFFSET_TABLE_LENGTH_ADDRESS;
        let mut overlay3 = empty_overlay(length_address + 4 + 8 + 4);
        let raw_length = 3u32 * 4;
        overlay3[length_address..length_address + 4].copy_from_slice(&raw_length.to_le_bytes());
        let mut manager = Manager::default();
        let mut diag = Diagnostics::new();
        manager.load_overlay3(&overlay3, &mut diag).unwrap();
        assert!(!diag.is_empty());
    }

    #[test]
    fn overlay3_round_trip_preserves_surrounding_bytes() {
        let mut overlay3 = build_overlay3(&[(1, 2, 3), (4, 5, 6)], 100);
        overlay3.extend_from_slice(b"trailing-bytes-untouched");

        let mut manager = Manager::default();
        let mut diag = Diagnostics::new();
        manager.load_overlay3(&overlay3, &mut diag).unwrap();

        let saved = manager.save_overlay3().unwrap();
        assert_eq!(saved, overlay3);
    }

    #[test]
    fn command_metadata_round_trip() {
        let (address, count) = CommandTableKind::FEvent.address_and_count();
        let overlay6 = empty_overlay(address + count * 16);

        let mut manager = Manager::default();
        manager
            .load_command_metadata(CommandTableKind::FEvent, &overlay6)
            .unwrap();
        assert_eq!(manager.command_metadata().slot(CommandTableKind::FEvent).len(), count);

        let saved = manager.save_command_metadata(CommandTableKind::FEvent).unwrap();
        assert_eq!(saved.len(), overlay6.len());
    }

    #[test]
    fn fevent_round_trip_single_empty_script() {
        let entries = vec![CommandParameterMetadata::new(false, vec![]); 1];
        let mut manager = Manager::default();
        *manager.command_metadata_mut().slot_mut(CommandTableKind::FEvent) = entries;

        let header = ScriptHeader::new(
            [0u8; 12],
            vec![],
            vec![],
            0,
            vec![],
            0,
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            Subroutine::new(vec![], vec![]),
        );
        let script = Script::new(0, header, vec![Subroutine::new(vec![], vec![])]);
        manager
            .fevent_chunks_mut()
            .push([Some(FEventChunk::Script(script)), None, None]);

        let fevent_bytes = manager.save_fevent().unwrap();

        let mut reloaded = Manager::default();
        reloaded.command_metadata = manager.command_metadata().clone();
        reloaded.fevent_offset_table = manager.fevent_offset_table().to_vec();
        reloaded.fevent_footer_offset = manager.fevent_footer_offset;
        let mut diag = Diagnostics::new();
        reloaded.load_fevent(&fevent_bytes, &mut diag).unwrap();

        assert_eq!(reloaded.fevent_chunks().len(), 1);
        assert!(matches!(
            reloaded.fevent_chunks()[0][0],
            Some(FEventChunk::Script(_))
        ));
    }
}
