//! Build-time parameters: fixed overlay addresses, per-table command counts,
//! and the parameter-type → primitive-codec registry.
//!
//! The original `mnllib.consts` module (not part of this crate's retrieval
//! corpus) hardcodes these as addresses into specific, game-version-specific
//! overlay binaries. They're reproduced here as the same kind of build-time
//! constant `spec.md` §6 describes; a consumer targeting a different game
//! revision would override them, so they're deliberately not `const fn`-derived
//! from anything else.

/// Address of the FEvent offset table's length-in-words field within overlay 3.
pub const FEVENT_OFFSET_TABLE_LENGTH_ADDRESS: usize = 0x0006_6eb0;

/// Address of the first triple of the FEvent offset table within overlay 3,
/// immediately following the length field.
pub const FEVENT_OFFSET_TABLE_ADDRESS: usize = FEVENT_OFFSET_TABLE_LENGTH_ADDRESS + 4;

/// Address of the base (FEvent) command-parameter metadata table within overlay 6.
pub const FEVENT_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS: usize = 0x0004_1f20;
/// Number of entries in the base FEvent command-parameter metadata table.
pub const FEVENT_NUMBER_OF_COMMANDS: usize = 0x0214;

/// Address of the battle command-parameter metadata table within overlay 12.
pub const BATTLE_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS: usize = 0x0001_36a0;
/// Number of entries in the battle command-parameter metadata table.
pub const BATTLE_NUMBER_OF_COMMANDS: usize = 0x01a8;

/// Address of the menu command-parameter metadata table within overlay 123.
pub const MENU_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS: usize = 0x0000_a8e0;
/// Number of entries in the menu command-parameter metadata table.
pub const MENU_NUMBER_OF_COMMANDS: usize = 0x00f0;

/// Address of the shop command-parameter metadata table within overlay 124.
pub const SHOP_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS: usize = 0x0000_5c40;
/// Number of entries in the shop command-parameter metadata table.
pub const SHOP_NUMBER_OF_COMMANDS: usize = 0x0080;

/// Width, in bytes, of each literal-argument primitive codec, indexed by the
/// parameter-type nibble (`0..=15`) from `spec.md` §3's command-parameter
/// metadata. `(width, signed)`; widths of 1, 2, and 4 bytes are all that ever
/// appear in the command table.
pub const PARAMETER_TYPE_WIDTHS: [(usize, bool); 16] = [
    (1, false), // 0x0: u8
    (1, true),  // 0x1: i8
    (2, false), // 0x2: u16
    (2, true),  // 0x3: i16
    (4, false), // 0x4: u32
    (4, true),  // 0x5: i32
    (1, false), // 0x6: u8 (flag/bool-like)
    (2, false), // 0x7: u16 (enum-like)
    (4, false), // 0x8: u32 (pointer/offset-like)
    (1, false), // 0x9: u8
    (2, false), // 0xA: u16
    (4, false), // 0xB: u32
    (1, false), // 0xC: u8
    (2, false), // 0xD: u16
    (4, false), // 0xE: u32
    (4, false), // 0xF: u32
];

/// Number of parameter types in [`PARAMETER_TYPE_WIDTHS`].
pub const NUMBER_OF_PARAMETER_TYPES: usize = PARAMETER_TYPE_WIDTHS.len();

/// Magic value identifying a dialog-variant language table chunk (`spec.md` §3/§4.G).
pub const LANGUAGE_TABLE_DIALOG_MAGIC: u32 = 0x0000_0128;

/// First and last (inclusive) structured-entry indices within a dialog language table.
pub const DIALOG_STRUCTURED_ENTRY_RANGE: std::ops::RangeInclusive<usize> = 0x44..=0x48;
