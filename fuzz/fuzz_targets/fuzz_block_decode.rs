#![no_main]

use libfuzzer_sys::fuzz_target;

use btcb_types::{Block, Reader};

fuzz_target!(|data: &[u8]| {
    // Typed block decoding must reject malformed input, never panic.
    let mut reader = Reader::new(data);
    if let Ok(block) = Block::decode_typed(&mut reader) {
        let consumed = data.len() - reader.remaining();
        let mut encoded = Vec::new();
        block.encode_typed(&mut encoded);
        assert_eq!(&encoded[..], &data[..consumed]);
    }
});
