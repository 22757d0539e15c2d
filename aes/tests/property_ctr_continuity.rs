//! Property 2: CTR keystream continuity.
//!
//! Encrypting a buffer in arbitrary pieces with one cipher state produces
//! the same bytes as encrypting it in a single call.

use kpio_aes::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn split_ctr_matches_single_call(
        key in proptest::collection::vec(any::<u8>(), 16),
        iv in any::<[u8; 16]>(),
        data in proptest::collection::vec(any::<u8>(), 0..300),
        cuts in proptest::collection::vec(0usize..300, 0..8),
    ) {
        let mut whole = Aes::new(&key, Some(&iv), Direction::Encrypt).unwrap();
        let mut expected = vec![0u8; data.len()];
        whole.ctr_encrypt(&mut expected, &data).unwrap();

        let mut points: Vec<usize> = cuts.into_iter().map(|c| c % (data.len() + 1)).collect();
        points.push(0);
        points.push(data.len());
        points.sort_unstable();

        let mut pieces = Aes::new(&key, Some(&iv), Direction::Encrypt).unwrap();
        let mut out = vec![0u8; data.len()];
        for w in points.windows(2) {
            pieces.ctr_encrypt(&mut out[w[0]..w[1]], &data[w[0]..w[1]]).unwrap();
        }
        prop_assert_eq!(out, expected);
        prop_assert_eq!(pieces.iv(), whole.iv());
    }

    #[test]
    fn cbc_chaining_matches_single_call(
        key in proptest::collection::vec(any::<u8>(), 32),
        iv in any::<[u8; 16]>(),
        blocks in 0usize..10,
        split in 0usize..10,
        seed in any::<u8>(),
    ) {
        let data: Vec<u8> = (0..blocks * BLOCK_SIZE)
            .map(|i| (i as u8).wrapping_mul(seed))
            .collect();
        let split = split.min(blocks) * BLOCK_SIZE;

        let mut whole = Aes::new(&key, Some(&iv), Direction::Encrypt).unwrap();
        let mut expected = vec![0u8; data.len()];
        whole.cbc_encrypt(&mut expected, &data).unwrap();

        let mut pieces = Aes::new(&key, Some(&iv), Direction::Encrypt).unwrap();
        let mut out = vec![0u8; data.len()];
        pieces.cbc_encrypt(&mut out[..split], &data[..split]).unwrap();
        pieces.cbc_encrypt(&mut out[split..], &data[split..]).unwrap();
        prop_assert_eq!(out, expected);
    }
}
