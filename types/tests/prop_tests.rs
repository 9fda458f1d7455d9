use proptest::prelude::*;

use btcb_types::{
    Amount, Block, BlockHash, Decode, Encode, PublicKey, Reader, SendBlock, Signature, StateBlock,
};

fn state_block(seed: [u8; 32], balance: u128, work: u64) -> StateBlock {
    StateBlock::new(
        PublicKey(seed),
        BlockHash::new(seed),
        PublicKey(seed),
        Amount::new(balance),
        BlockHash::ZERO,
        work,
    )
}

proptest! {
    /// BlockHash::is_zero is true only for all-zero bytes.
    #[test]
    fn block_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Encoded hash order equals typed order.
    #[test]
    fn block_hash_byte_order_matches_ord(
        a in prop::array::uniform32(0u8..),
        b in prop::array::uniform32(0u8..),
    ) {
        let (ha, hb) = (BlockHash::new(a), BlockHash::new(b));
        prop_assert_eq!(ha.to_bytes().cmp(&hb.to_bytes()), ha.cmp(&hb));
    }

    /// Encoded account order equals typed order.
    #[test]
    fn account_byte_order_matches_ord(
        a in prop::array::uniform32(0u8..),
        b in prop::array::uniform32(0u8..),
    ) {
        let (aa, ab) = (PublicKey(a), PublicKey(b));
        prop_assert_eq!(aa.to_bytes().cmp(&ab.to_bytes()), aa.cmp(&ab));
    }

    /// Amount encoding is big-endian, so byte order equals numeric order.
    #[test]
    fn amount_byte_order_matches_numeric(a in any::<u128>(), b in any::<u128>()) {
        let (ea, eb) = (Amount::new(a).to_bytes(), Amount::new(b).to_bytes());
        prop_assert_eq!(ea.cmp(&eb), a.cmp(&b));
        prop_assert_eq!(Amount::from_bytes(&ea).unwrap().raw(), a);
    }

    /// Amount: checked_sub returns None when b > a.
    #[test]
    fn amount_checked_sub_underflow(a in 0u128..1_000_000, b in 0u128..1_000_000) {
        let result = Amount::new(a).checked_sub(Amount::new(b));
        if b > a {
            prop_assert!(result.is_none());
        } else {
            prop_assert_eq!(result, Some(Amount::new(a - b)));
        }
    }

    /// Amount: abs_diff is symmetric.
    #[test]
    fn amount_abs_diff_symmetric(a in any::<u128>(), b in any::<u128>()) {
        let (x, y) = (Amount::new(a), Amount::new(b));
        prop_assert_eq!(x.abs_diff(y), y.abs_diff(x));
        prop_assert_eq!(x.abs_diff(y).raw(), a.abs_diff(b));
    }

    /// Block hash covers hashable fields only.
    #[test]
    fn state_hash_ignores_signature_and_work(
        seed in prop::array::uniform32(0u8..),
        balance in any::<u128>(),
        work_a in any::<u64>(),
        work_b in any::<u64>(),
        sig in prop::collection::vec(any::<u8>(), 64),
    ) {
        let a = state_block(seed, balance, work_a);
        let mut b = state_block(seed, balance, work_b);
        b.signature = Signature(sig.try_into().unwrap());
        prop_assert_eq!(a.hash(), b.hash());
    }

    /// Changing the balance changes the hash.
    #[test]
    fn send_hash_covers_balance(balance in 0u128..u128::MAX) {
        let a = SendBlock::new(BlockHash::from_u64(1), PublicKey::from_u64(2), Amount::new(balance), 0);
        let b = SendBlock::new(BlockHash::from_u64(1), PublicKey::from_u64(2), Amount::new(balance + 1), 0);
        prop_assert_ne!(a.hash(), b.hash());
    }

    /// Typed block decoding never panics on arbitrary input.
    #[test]
    fn typed_decode_total(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
        let mut reader = Reader::new(&bytes);
        let _ = Block::decode_typed(&mut reader);
    }
}
