#![no_main]

use libfuzzer_sys::fuzz_target;

use btcb_store::{AccountInfo, BlockInfo, PendingInfo, PendingKey, UncheckedKey};
use btcb_types::{Decode, Vote};

fuzz_target!(|data: &[u8]| {
    // Every stored row layout must decode or fail cleanly.
    let _ = AccountInfo::from_bytes(data);
    let _ = PendingKey::from_bytes(data);
    let _ = PendingInfo::from_bytes(data);
    let _ = BlockInfo::from_bytes(data);
    let _ = UncheckedKey::from_bytes(data);
    let _ = Vote::from_bytes(data);
});
