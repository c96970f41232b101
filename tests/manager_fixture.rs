//! Invariant 1 (`spec.md` §8): `save_all(load_all(files)) == files`, exercised
//! against an in-memory synthetic overlay/FEvent fixture since this crate
//! ships no binary fixture corpus of its own.

use mnl_codec::consts;
use mnl_codec::diagnostics::Diagnostics;
use mnl_codec::manager::Manager;
use mnl_codec::metadata::CommandParameterMetadata;
use mnl_codec::script::{CommandMetadataTable, Script, ScriptHeader, Subroutine};

fn zero_filled_overlay(address: usize, count: usize) -> Vec<u8> {
    vec![0u8; address + count * 16]
}

fn build_overlay3(triples: &[(u32, u32, u32)], footer_offset: u32, trailer: &[u8]) -> Vec<u8> {
    let length_address = consts::FEVENT_OFFSET_TABLE_LENGTH_ADDRESS;
    let mut overlay3 = vec![0u8; length_address + 4 + triples.len() * 12 + 4];
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
    overlay3.extend_from_slice(trailer);
    overlay3
}

#[test]
fn round_trip_preserves_every_file_byte_for_byte() {
    let fevent_entries = vec![CommandParameterMetadata::new(false, vec![])];
    let table = CommandMetadataTable::new(&fevent_entries);

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
    let script_bytes = script.to_bytes(&table).unwrap();
    let script_len = script_bytes.len() as u32;

    let mut fevent = script_bytes;
    fevent.extend_from_slice(b"TAIL");

    let overlay3 = build_overlay3(&[(0, script_len, script_len)], script_len, b"surrounding-bytes");

    let overlay6 = zero_filled_overlay(
        consts::FEVENT_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS,
        consts::FEVENT_NUMBER_OF_COMMANDS,
    );
    let overlay12 = zero_filled_overlay(
        consts::BATTLE_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS,
        consts::BATTLE_NUMBER_OF_COMMANDS,
    );
    let overlay123 = zero_filled_overlay(
        consts::MENU_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS,
        consts::MENU_NUMBER_OF_COMMANDS,
    );
    let overlay124 = zero_filled_overlay(
        consts::SHOP_COMMAND_PARAMETER_METADATA_TABLE_ADDRESS,
        consts::SHOP_NUMBER_OF_COMMANDS,
    );

    let mut diagnostics = Diagnostics::new();
    let manager = Manager::load_all(
        &overlay3,
        &overlay6,
        &overlay12,
        &overlay123,
        &overlay124,
        &fevent,
        &mut diagnostics,
    )
    .unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(manager.fevent_footer(), b"TAIL");

    let saved = manager.save_all().unwrap();
    assert_eq!(saved.overlay3, overlay3);
    assert_eq!(saved.overlay6, overlay6);
    assert_eq!(saved.overlay12, overlay12);
    assert_eq!(saved.overlay123, overlay123);
    assert_eq!(saved.overlay124, overlay124);
    assert_eq!(saved.fevent, fevent);
}
