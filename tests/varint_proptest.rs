//! Invariant 4 (`spec.md` §8): `read_varint(write_varint(v)) == v` for every
//! varint-encodable `v < 2^30`.

use mnl_codec::varint::{read_varint, write_varint};
use proptest::prelude::*;

proptest! {
    #[test]
    fn round_trip(v in 0u32..(1u32 << 30)) {
        let bytes = write_varint(v);
        let mut pos = 0;
        let decoded = read_varint(&bytes, &mut pos).unwrap();
        prop_assert_eq!(decoded, v);
        prop_assert_eq!(pos, bytes.len());
    }
}
