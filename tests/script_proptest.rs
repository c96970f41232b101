//! Invariant 5 (`spec.md` §8): `Script::from_bytes(Script::to_bytes(s)) == s`
//! for any syntactically valid script (commands whose ids and argument
//! counts match a fixed metadata table). Arguments are always generated as
//! variable references rather than literals: the variable-vs-literal
//! encoding choice is independent per argument slot and is already covered,
//! together with literal width/signedness, by `script.rs`'s own unit tests.

use mnl_codec::diagnostics::Diagnostics;
use mnl_codec::metadata::CommandParameterMetadata;
use mnl_codec::script::{Argument, Command, CommandMetadataTable, Script, ScriptHeader, Subroutine, Variable};
use proptest::prelude::*;

fn metadata_table() -> Vec<CommandParameterMetadata> {
    vec![
        CommandParameterMetadata::new(false, vec![]),
        CommandParameterMetadata::new(true, vec![0x0, 0x2]),
        CommandParameterMetadata::new(false, vec![0x4]),
    ]
}

fn command_strategy() -> impl Strategy<Value = Command> {
    let table = metadata_table();
    let len = table.len();
    (0usize..len).prop_flat_map(move |idx| {
        let meta = table[idx].clone();
        let arity = meta.parameter_types().len();
        let has_return = meta.has_return_value();
        (
            proptest::collection::vec(any::<u16>(), arity),
            proptest::option::of(any::<u16>()),
        )
            .prop_map(move |(vars, result)| {
                let arguments = vars
                    .into_iter()
                    .map(|v| Argument::Variable(Variable::new(v)))
                    .collect();
                let result_variable = if has_return { result.map(Variable::new) } else { None };
                Command::new(idx as u16, arguments, result_variable)
            })
    })
}

fn subroutine_strategy() -> impl Strategy<Value = Subroutine> {
    proptest::collection::vec(command_strategy(), 0..4).prop_map(|commands| Subroutine::new(commands, vec![]))
}

fn script_strategy() -> impl Strategy<Value = Script> {
    (
        proptest::collection::vec(any::<u32>(), 0..3),
        any::<u32>(),
        proptest::collection::vec(any::<u32>(), 0..3),
        any::<u32>(),
        proptest::collection::vec(any::<u16>(), 0..3),
        proptest::collection::vec(any::<u16>(), 0..3),
        proptest::collection::vec(subroutine_strategy(), 1..4),
    )
        .prop_map(|(array1, var1, array2, var2, array3, array5, subroutines)| {
            let header = ScriptHeader::new(
                [0u8; 12],
                vec![],
                array1,
                var1,
                array2,
                var2,
                array3,
                vec![],
                vec![],
                array5,
                vec![],
                Subroutine::new(vec![], vec![]),
            );
            Script::new(0, header, subroutines)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn round_trip(script in script_strategy()) {
        let entries = metadata_table();
        let table = CommandMetadataTable::new(&entries);

        let bytes = script.to_bytes(&table).unwrap();
        let mut diagnostics = Diagnostics::new();
        let parsed = Script::from_bytes(&table, script.index(), &bytes, &mut diagnostics).unwrap();

        prop_assert_eq!(parsed.subroutines(), script.subroutines());
        prop_assert_eq!(parsed.index(), script.index());
        prop_assert!(diagnostics.is_empty());
    }
}
