//! Property tests for the planning and decoding layers.

use hicstraw::format::matrix::blocks_for_region;
use hicstraw::format::{decode_records, Header};
use proptest::prelude::*;

prop_compose! {
    /// An ordered bin rectangle with modest extents, plus grid geometry.
    fn region_and_grid()(
        col_lo in 0i32..150,
        col_span in 0i32..50,
        row_lo in 0i32..150,
        row_span in 0i32..50,
        block_bin_count in 1i32..32,
        block_column_count in 1i32..64,
    ) -> ([i32; 4], i32, i32) {
        (
            [col_lo, col_lo + col_span, row_lo, row_lo + row_span],
            block_bin_count,
            block_column_count,
        )
    }
}

proptest! {
    #[test]
    fn every_bin_pair_in_the_region_is_covered(
        (region, bbc, bcc) in region_and_grid()
    ) {
        let blocks = blocks_for_region(&region, bbc, bcc, false);
        for col in region[0]..=region[1] {
            for row in region[2]..=region[3] {
                let id = (row / bbc) * bcc + (col / bbc);
                prop_assert!(
                    blocks.contains(&id),
                    "bin ({}, {}) maps to block {} outside the selection",
                    col, row, id
                );
            }
        }
    }

    #[test]
    fn intra_selection_covers_both_orientations(
        (region, bbc, bcc) in region_and_grid()
    ) {
        let intra = blocks_for_region(&region, bbc, bcc, true);
        let straight = blocks_for_region(&region, bbc, bcc, false);
        let swapped_region = [region[2], region[3], region[0], region[1]];
        let mirrored = blocks_for_region(&swapped_region, bbc, bcc, false);
        prop_assert!(straight.is_subset(&intra));
        prop_assert!(mirrored.is_subset(&intra));
        prop_assert_eq!(intra.len(), straight.union(&mirrored).count());
    }

    #[test]
    fn selection_is_insensitive_to_mirroring_for_squares(
        lo in 0i32..100,
        span in 0i32..40,
        bbc in 1i32..32,
        bcc in 1i32..64,
    ) {
        // a square region on the diagonal gains nothing from the mirror
        let region = [lo, lo + span, lo, lo + span];
        prop_assert_eq!(
            blocks_for_region(&region, bbc, bcc, true),
            blocks_for_region(&region, bbc, bcc, false)
        );
    }

    #[test]
    fn block_decoding_is_total_on_arbitrary_payloads(
        version in prop_oneof![Just(6), Just(8)],
        payload in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        // never panics; either records or a typed error
        let _ = decode_records(version, &payload);
    }

    #[test]
    fn header_decoding_is_total_on_arbitrary_bytes(
        buf in proptest::collection::vec(any::<u8>(), 0..256),
    ) {
        let _ = Header::decode(&buf);
    }
}
