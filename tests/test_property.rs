use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use layerfs::layer::data::BufferLayer;
use layerfs::metadata::Metadata;
use layerfs::{Address, Memory};

/// Writes random bytes at random offsets into a `BufferLayer`, then reads
/// each span back and checks it round-trips, for a number of deterministic
/// seeds.
#[test]
fn buffer_layer_random_writes_round_trip() {
    for seed in 0u64..8 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let len = 1 + (rng.next_u32() as usize % 0x10000);

        let mut memory = Memory::new();
        memory
            .add_layer(Box::new(BufferLayer::new("D", vec![0u8; len], Metadata::new())))
            .unwrap();

        let mut expected = vec![0u8; len];
        for _ in 0..32 {
            let max_span = len.min(64);
            let span_len = 1 + (rng.next_u32() as usize % max_span);
            let offset = rng.random_range(0..=(len - span_len));
            let mut bytes = vec![0u8; span_len];
            rng.fill_bytes(&mut bytes);

            memory.write("D", Address::from_usize(offset), &bytes).unwrap();
            expected[offset..offset + span_len].copy_from_slice(&bytes);

            let readback = memory.read("D", Address::from_usize(offset), span_len, false).unwrap();
            assert_eq!(readback, bytes);
        }

        let whole = memory.read("D", Address::ZERO, len, false).unwrap();
        assert_eq!(whole, expected);
    }
}
