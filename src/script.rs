//! FEvent script codec (component D): commands, subroutines, the script
//! header, and the top-level [`Script`] chunk.

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{CodecError, Result};
use crate::metadata::{parameter_type_width, CommandParameterMetadata};
use crate::varint::{
    read_length_plus_one_prefixed_u32_array, read_length_prefixed_quintuple_u32_array,
    read_length_prefixed_u16_array, write_length_plus_one_prefixed_u32_array,
    write_length_prefixed_quintuple_u32_array, write_length_prefixed_u16_array, Reader,
};

/// A borrowed view of one command-parameter metadata table, keeping the
/// script codec decoupled from [`crate::manager::Manager`] so it can be
/// exercised without constructing a full manager.
#[derive(Debug, Clone, Copy)]
pub struct CommandMetadataTable<'a> {
    entries: &'a [CommandParameterMetadata],
}

impl<'a> CommandMetadataTable<'a> {
    /// Wrap a slice of per-command metadata, indexed by command id.
    pub fn new(entries: &'a [CommandParameterMetadata]) -> Self {
        Self { entries }
    }

    /// Look up a command's metadata by id.
    pub fn get(&self, command_id: u16) -> Option<&'a CommandParameterMetadata> {
        self.entries.get(command_id as usize)
    }

    /// Number of commands this table describes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A reference to one of a script's numbered variable slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    number: u16,
}

impl Variable {
    /// Wrap a raw variable slot number.
    pub fn new(number: u16) -> Self {
        Self { number }
    }

    /// The raw slot number.
    pub fn number(&self) -> u16 {
        self.number
    }

    fn read(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self::new(reader.read_u16()?))
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.number.to_le_bytes());
    }
}

/// One command argument: either a literal value of the parameter's declared
/// primitive type, or a reference to a variable slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// An inline literal, sign-extended to `i64` regardless of its on-wire
    /// width; the width used to re-encode it comes from the command's
    /// metadata, not from this value.
    Literal(i64),
    /// A reference to a variable slot instead of an inline value.
    Variable(Variable),
}

fn read_literal(reader: &mut Reader<'_>, width: usize, signed: bool) -> Result<i64> {
    let bytes = reader.read_bytes(width)?;
    let mut buf = [0u8; 8];
    buf[..width].copy_from_slice(bytes);
    let unsigned = u64::from_le_bytes(buf);
    if signed {
        let shift = 64 - width * 8;
        Ok(((unsigned << shift) as i64) >> shift)
    } else {
        Ok(unsigned as i64)
    }
}

fn write_literal(out: &mut Vec<u8>, value: i64, width: usize) {
    let bytes = (value as u64).to_le_bytes();
    out.extend_from_slice(&bytes[..width]);
}

/// One decoded command: an id into a [`CommandMetadataTable`], its
/// arguments, and an optional result variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    command_id: u16,
    arguments: Vec<Argument>,
    result_variable: Option<Variable>,
}

impl Command {
    /// Build a command directly; useful for tests and script construction.
    pub fn new(
        command_id: u16,
        arguments: Vec<Argument>,
        result_variable: Option<Variable>,
    ) -> Self {
        Self {
            command_id,
            arguments,
            result_variable,
        }
    }

    /// The command's id into its metadata table.
    pub fn command_id(&self) -> u16 {
        self.command_id
    }

    /// The command's arguments, in declared parameter order.
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// The command's result variable, if it produces one.
    pub fn result_variable(&self) -> Option<Variable> {
        self.result_variable
    }

    fn read(reader: &mut Reader<'_>, table: &CommandMetadataTable<'_>) -> Result<Self> {
        let command_id = reader.read_u16()?;
        if command_id as usize >= table.len() {
            return Err(CodecError::InvalidCommandId {
                command_id,
                table_len: table.len(),
            });
        }
        let param_variables_bitfield = reader.read_u32()?;

        let param_metadata = table.get(command_id).expect("checked above");
        let result_variable = if param_metadata.has_return_value() {
            Some(Variable::read(reader)?)
        } else {
            None
        };

        let mut arguments = Vec::with_capacity(param_metadata.parameter_types().len());
        for (i, &parameter_type) in param_metadata.parameter_types().iter().enumerate() {
            if param_variables_bitfield & (1 << i) != 0 {
                arguments.push(Argument::Variable(Variable::read(reader)?));
            } else {
                let (width, signed) = parameter_type_width(parameter_type)?;
                arguments.push(Argument::Literal(read_literal(reader, width, signed)?));
            }
        }

        Ok(Self {
            command_id,
            arguments,
            result_variable,
        })
    }

    fn write(&self, out: &mut Vec<u8>, table: &CommandMetadataTable<'_>) -> Result<()> {
        let mut param_variables_bitfield = 0u32;
        for (i, argument) in self.arguments.iter().enumerate() {
            if matches!(argument, Argument::Variable(_)) {
                param_variables_bitfield |= 1 << i;
            }
        }
        out.extend_from_slice(&self.command_id.to_le_bytes());
        out.extend_from_slice(&param_variables_bitfield.to_le_bytes());

        if let Some(result_variable) = self.result_variable {
            result_variable.write(out);
        }

        let param_metadata = table.get(self.command_id).ok_or(CodecError::InvalidCommandId {
            command_id: self.command_id,
            table_len: table.len(),
        })?;
        if param_metadata.parameter_types().len() != self.arguments.len() {
            return Err(CodecError::ArgumentCountMismatch {
                command_id: self.command_id,
                expected: param_metadata.parameter_types().len(),
                actual: self.arguments.len(),
            });
        }
        for (&parameter_type, argument) in
            param_metadata.parameter_types().iter().zip(&self.arguments)
        {
            match argument {
                Argument::Variable(variable) => variable.write(out),
                Argument::Literal(value) => {
                    let (width, _signed) = parameter_type_width(parameter_type)?;
                    write_literal(out, *value, width);
                }
            }
        }

        Ok(())
    }
}

/// A sequence of commands, plus any trailing bytes that failed to parse as a
/// further command (the command stream has no explicit length prefix or
/// terminator, so the end is discovered by parse failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subroutine {
    commands: Vec<Command>,
    footer: Vec<u8>,
}

impl Subroutine {
    /// Build a subroutine directly from its commands and trailing footer bytes.
    pub fn new(commands: Vec<Command>, footer: Vec<u8>) -> Self {
        Self { commands, footer }
    }

    /// The subroutine's decoded commands.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Trailing bytes that didn't parse as a command.
    pub fn footer(&self) -> &[u8] {
        &self.footer
    }

    /// Parse commands from `data` until a command fails to parse, at which
    /// point the remaining bytes become the footer.
    ///
    /// Only truncation and an out-of-range command id are treated as
    /// "this is where the command stream ends" — matching the reference,
    /// which only catches `struct.error` (truncation) and
    /// `InvalidCommandIDError` around this loop. An invalid parameter-type
    /// nibble is *not* caught here and propagates as a hard error, exactly
    /// as in the reference.
    pub fn from_bytes(data: &[u8], table: &CommandMetadataTable<'_>) -> Result<Self> {
        let mut reader = Reader::new(data);
        let mut commands = Vec::new();
        while !reader.is_empty() {
            let checkpoint = reader.position();
            match Command::read(&mut reader, table) {
                Ok(command) => commands.push(command),
                Err(CodecError::InvalidParameterType { parameter_type }) => {
                    return Err(CodecError::InvalidParameterType { parameter_type });
                }
                Err(_) => {
                    reader.seek(checkpoint);
                    break;
                }
            }
        }
        let footer = reader.read_to_end().to_vec();
        Ok(Self { commands, footer })
    }

    /// Serialize the commands followed by the footer bytes.
    pub fn to_bytes(&self, table: &CommandMetadataTable<'_>) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        for command in &self.commands {
            command.write(&mut out, table)?;
        }
        out.extend_from_slice(&self.footer);
        Ok(out)
    }
}

/// The fixed-layout header preceding a script's subroutines: three section
/// offsets, a handful of opaque/typed arrays, and the subroutine offset
/// table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHeader {
    unk_0x00: [u8; 12],
    offsets_unk1: Vec<u8>,
    array1: Vec<u32>,
    var1: u32,
    array2: Vec<u32>,
    var2: u32,
    array3: Vec<u16>,
    section1_unk1: Vec<u8>,
    array4: Vec<(u32, u32, u32, u32, u32)>,
    array5: Vec<u16>,
    subroutine_table: Vec<u16>,
    post_table_subroutine: Subroutine,
}

#[allow(clippy::too_many_arguments)]
impl ScriptHeader {
    /// Build a header directly from its fields (used by tests and by
    /// [`Script::to_bytes`] to rewrite the subroutine table before encoding).
    pub fn new(
        unk_0x00: [u8; 12],
        offsets_unk1: Vec<u8>,
        array1: Vec<u32>,
        var1: u32,
        array2: Vec<u32>,
        var2: u32,
        array3: Vec<u16>,
        section1_unk1: Vec<u8>,
        array4: Vec<(u32, u32, u32, u32, u32)>,
        array5: Vec<u16>,
        subroutine_table: Vec<u16>,
        post_table_subroutine: Subroutine,
    ) -> Self {
        Self {
            unk_0x00,
            offsets_unk1,
            array1,
            var1,
            array2,
            var2,
            array3,
            section1_unk1,
            array4,
            array5,
            subroutine_table,
            post_table_subroutine,
        }
    }

    /// Per-subroutine byte offsets, relative to the start of the
    /// subroutines blob (right after the header).
    pub fn subroutine_table(&self) -> &[u16] {
        &self.subroutine_table
    }

    fn from_reader(
        reader: &mut Reader<'_>,
        index: usize,
        table: &CommandMetadataTable<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let mut unk_0x00 = [0u8; 12];
        unk_0x00.copy_from_slice(reader.read_bytes(12)?);

        let section1_offset = reader.read_u32()? as usize;
        let section2_offset = reader.read_u32()? as usize;
        let section3_offset = reader.read_u32()? as usize;

        let offsets_unk1_len = section1_offset
            .checked_sub(reader.position())
            .ok_or_else(|| CodecError::truncated(reader.position(), 0))?;
        let offsets_unk1 = reader.read_bytes(offsets_unk1_len)?.to_vec();

        let array1 = read_length_plus_one_prefixed_u32_array(reader)?;
        let var1 = reader.read_u32()?;
        let array2 = read_length_plus_one_prefixed_u32_array(reader)?;
        let var2 = reader.read_u32()?;
        let array3 = read_length_prefixed_u16_array(reader)?;

        let section1_unk1_len = section2_offset
            .checked_sub(reader.position())
            .ok_or_else(|| CodecError::truncated(reader.position(), 0))?;
        let section1_unk1 = reader.read_bytes(section1_unk1_len)?.to_vec();

        let array4 = read_length_prefixed_quintuple_u32_array(reader)?;

        if reader.position() != section3_offset {
            diagnostics.push(Warning::ExtraBytesBetweenSections {
                script_index: index,
                parsed_end: reader.position(),
                section3_offset,
            });
            reader.seek(section3_offset);
        }

        let array5 = read_length_prefixed_u16_array(reader)?;

        let mut subroutine_table: Vec<u16> = Vec::new();
        let mut post_table_subroutine = Subroutine::new(Vec::new(), Vec::new());
        loop {
            let relative_position = reader.position() - section3_offset;
            let continue_reading = match subroutine_table.first() {
                Some(&first) => relative_position < first as usize,
                None => true,
            };
            if !continue_reading {
                break;
            }

            let offset = reader.read_u16()?;
            if let Some(&last) = subroutine_table.last() {
                if offset < last {
                    reader.seek(reader.position() - 2);
                    let first = subroutine_table[0] as usize;
                    let remaining = (first + section3_offset)
                        .checked_sub(reader.position())
                        .ok_or_else(|| CodecError::truncated(reader.position(), 0))?;
                    let post_table_bytes = reader.read_bytes(remaining)?;
                    post_table_subroutine = Subroutine::from_bytes(post_table_bytes, table)?;
                    break;
                }
            }
            subroutine_table.push(offset);
        }

        let subroutine_base_offset = reader.position() - section3_offset;
        let subroutine_table = subroutine_table
            .into_iter()
            .map(|offset| offset - subroutine_base_offset as u16)
            .collect();

        Ok(Self {
            unk_0x00,
            offsets_unk1,
            array1,
            var1,
            array2,
            var2,
            array3,
            section1_unk1,
            array4,
            array5,
            subroutine_table,
            post_table_subroutine,
        })
    }

    fn to_bytes(&self, table: &CommandMetadataTable<'_>) -> Result<Vec<u8>> {
        let mut out = Vec::new();

        out.extend_from_slice(&self.unk_0x00);

        let section1_offset = 0x18 + self.offsets_unk1.len();
        let section2_offset = section1_offset
            + (2 + self.array1.len()) * 4
            + (2 + self.array2.len()) * 4
            + (1 + self.array3.len()) * 2
            + self.section1_unk1.len();
        let section3_offset = section2_offset + 4 + self.array4.len() * 20;
        let post_table_subroutine_raw = self.post_table_subroutine.to_bytes(table)?;
        let header_end_offset = section3_offset
            + 2
            + self.array5.len() * 2
            + self.subroutine_table.len() * 2
            + post_table_subroutine_raw.len();

        out.extend_from_slice(&(section1_offset as u32).to_le_bytes());
        out.extend_from_slice(&(section2_offset as u32).to_le_bytes());
        out.extend_from_slice(&(section3_offset as u32).to_le_bytes());
        out.extend_from_slice(&self.offsets_unk1);

        write_length_plus_one_prefixed_u32_array(&mut out, &self.array1);
        out.extend_from_slice(&self.var1.to_le_bytes());
        write_length_plus_one_prefixed_u32_array(&mut out, &self.array2);
        out.extend_from_slice(&self.var2.to_le_bytes());
        write_length_prefixed_u16_array(&mut out, &self.array3);
        out.extend_from_slice(&self.section1_unk1);

        write_length_prefixed_quintuple_u32_array(&mut out, &self.array4);

        out.extend_from_slice(&(self.array5.len() as u16).to_le_bytes());
        for v in &self.array5 {
            out.extend_from_slice(&v.to_le_bytes());
        }

        let subroutine_base_offset = (header_end_offset - section3_offset) as u16;
        for &offset in &self.subroutine_table {
            out.extend_from_slice(&(offset + subroutine_base_offset).to_le_bytes());
        }
        out.extend_from_slice(&post_table_subroutine_raw);

        Ok(out)
    }
}

/// A full FEvent script chunk: a header plus the subroutines it indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    index: usize,
    header: ScriptHeader,
    subroutines: Vec<Subroutine>,
}

impl Script {
    /// Build a script directly from a header and its subroutines.
    pub fn new(index: usize, header: ScriptHeader, subroutines: Vec<Subroutine>) -> Self {
        Self {
            index,
            header,
            subroutines,
        }
    }

    /// The script's index within its FEvent offset table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The script's decoded subroutines.
    pub fn subroutines(&self) -> &[Subroutine] {
        &self.subroutines
    }

    /// Parse a complete script chunk.
    pub fn from_bytes(
        table: &CommandMetadataTable<'_>,
        index: usize,
        data: &[u8],
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let mut reader = Reader::new(data);
        let header = ScriptHeader::from_reader(&mut reader, index, table, diagnostics)?;

        let subroutine_base_offset = reader.position();
        let mut subroutines = Vec::with_capacity(header.subroutine_table.len());
        for (i, &offset) in header.subroutine_table.iter().enumerate() {
            let start = subroutine_base_offset + offset as usize;
            let end = header
                .subroutine_table
                .get(i + 1)
                .map(|&next| subroutine_base_offset + next as usize)
                .unwrap_or(data.len());
            let slice = data
                .get(start..end)
                .ok_or_else(|| CodecError::truncated(start, end.saturating_sub(start)))?;
            subroutines.push(Subroutine::from_bytes(slice, table)?);
        }

        Ok(Self {
            index,
            header,
            subroutines,
        })
    }

    /// Serialize the script back to bytes, recomputing the subroutine table
    /// from the current subroutine boundaries.
    pub fn to_bytes(&self, table: &CommandMetadataTable<'_>) -> Result<Vec<u8>> {
        let mut subroutines_raw = Vec::new();
        let mut subroutine_table = Vec::with_capacity(self.subroutines.len());
        for subroutine in &self.subroutines {
            subroutine_table.push(subroutines_raw.len() as u16);
            subroutines_raw.extend_from_slice(&subroutine.to_bytes(table)?);
        }

        let mut header = self.header.clone();
        header.subroutine_table = subroutine_table;

        let mut out = header.to_bytes(table)?;
        out.extend_from_slice(&subroutines_raw);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_table(types_per_command: &[(bool, &[u8])]) -> Vec<CommandParameterMetadata> {
        types_per_command
            .iter()
            .map(|&(has_return, types)| CommandParameterMetadata::new(has_return, types.to_vec()))
            .collect()
    }

    #[test]
    fn command_round_trip_literal_and_variable_arguments() {
        let entries = flat_table(&[(true, &[0x0, 0x2])]);
        let table = CommandMetadataTable::new(&entries);

        let command = Command::new(
            0,
            vec![Argument::Literal(7), Argument::Variable(Variable::new(3))],
            Some(Variable::new(9)),
        );
        let mut bytes = Vec::new();
        command.write(&mut bytes, &table).unwrap();

        let mut reader = Reader::new(&bytes);
        let parsed = Command::read(&mut reader, &table).unwrap();
        assert_eq!(parsed, command);
        assert!(reader.is_empty());
    }

    #[test]
    fn command_read_rejects_out_of_range_id() {
        let entries = flat_table(&[(false, &[])]);
        let table = CommandMetadataTable::new(&entries);
        let data = [0xFFu8, 0xFF, 0, 0, 0, 0];
        let mut reader = Reader::new(&data);
        let err = Command::read(&mut reader, &table).unwrap_err();
        assert!(matches!(err, CodecError::InvalidCommandId { .. }));
    }

    #[test]
    fn subroutine_captures_footer_on_garbage() {
        let entries = flat_table(&[(false, &[])]);
        let table = CommandMetadataTable::new(&entries);

        let mut data = Vec::new();
        let command = Command::new(0, vec![], None);
        command.write(&mut data, &table).unwrap();
        let footer = vec![0xDE, 0xAD, 0xBE];
        data.extend_from_slice(&footer);

        let subroutine = Subroutine::from_bytes(&data, &table).unwrap();
        assert_eq!(subroutine.commands().len(), 1);
        assert_eq!(subroutine.footer(), footer.as_slice());

        let rebuilt = subroutine.to_bytes(&table).unwrap();
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn subroutine_of_pure_garbage_has_no_commands() {
        let entries = flat_table(&[(false, &[])]);
        let table = CommandMetadataTable::new(&entries);
        let garbage = vec![0x01, 0x02, 0x03];
        let subroutine = Subroutine::from_bytes(&garbage, &table).unwrap();
        assert!(subroutine.commands().is_empty());
        assert_eq!(subroutine.footer(), garbage.as_slice());
    }

    #[test]
    fn subroutine_propagates_invalid_parameter_type_instead_of_treating_it_as_footer() {
        // Command 0 declares a parameter type (0xFF) outside the registry's
        // range; unlike an out-of-range command id or plain truncation, this
        // is not swallowed into a footer capture.
        let entries = flat_table(&[(false, &[0xFF])]);
        let table = CommandMetadataTable::new(&entries);
        let data = [0x00u8, 0x00, 0x00, 0x00, 0x00, 0x00];
        let err = Subroutine::from_bytes(&data, &table).unwrap_err();
        assert!(matches!(err, CodecError::InvalidParameterType { .. }));
    }

    fn sample_header(subroutine_count: u16) -> ScriptHeader {
        ScriptHeader::new(
            [0u8; 12],
            vec![],
            vec![1, 2],
            100,
            vec![3],
            200,
            vec![10, 20],
            vec![],
            vec![(1, 2, 3, 4, 5)],
            vec![7, 8, 9],
            (0..subroutine_count).collect(),
            Subroutine::new(vec![], vec![]),
        )
    }

    #[test]
    fn script_round_trip_empty_subroutines() {
        let entries = flat_table(&[(false, &[0x0])]);
        let table = CommandMetadataTable::new(&entries);

        let subroutines = vec![
            Subroutine::new(vec![Command::new(0, vec![Argument::Literal(1)], None)], vec![]),
            Subroutine::new(vec![], vec![0xAA, 0xBB]),
        ];
        let script = Script::new(0, sample_header(0), subroutines);

        let bytes = script.to_bytes(&table).unwrap();
        let mut diag = Diagnostics::new();
        let parsed = Script::from_bytes(&table, 0, &bytes, &mut diag).unwrap();

        assert_eq!(parsed.subroutines().len(), 2);
        assert_eq!(parsed.subroutines()[0].commands().len(), 1);
        assert_eq!(parsed.subroutines()[1].footer(), &[0xAA, 0xBB]);
    }
}
