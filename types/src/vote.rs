//! Representative votes.

use crate::block::{Block, BlockType};
use crate::codec::{Decode, Encode, Reader};
use crate::error::CodecError;
use crate::hash::{blake2b_256_multi, BlockHash};
use crate::keys::{Account, Signature};

const VOTE_HASH_PREFIX: &[u8] = b"vote ";

/// One thing a vote is cast for: a full block, or only its hash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VoteBlock {
    Block(Box<Block>),
    Hash(BlockHash),
}

impl VoteBlock {
    pub fn hash(&self) -> BlockHash {
        match self {
            Self::Block(block) => block.hash(),
            Self::Hash(hash) => *hash,
        }
    }
}

impl From<Block> for VoteBlock {
    fn from(block: Block) -> Self {
        Self::Block(Box::new(block))
    }
}

impl From<BlockHash> for VoteBlock {
    fn from(hash: BlockHash) -> Self {
        Self::Hash(hash)
    }
}

impl Encode for VoteBlock {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Block(block) => block.encode_typed(out),
            Self::Hash(hash) => {
                out.push(BlockType::NotABlock as u8);
                hash.encode(out);
            }
        }
    }
}

impl Decode for VoteBlock {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        match BlockType::from_u8(reader.read_u8()?)? {
            BlockType::NotABlock => Ok(Self::Hash(BlockHash::decode(reader)?)),
            block_type => Ok(Self::Block(Box::new(Block::decode_variant(
                block_type, reader,
            )?))),
        }
    }
}

/// A signed statement by `account` endorsing `blocks`, ordered against the
/// same voter's other votes by `sequence`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vote {
    pub account: Account,
    pub signature: Signature,
    pub sequence: u64,
    pub blocks: Vec<VoteBlock>,
}

impl Vote {
    /// The digest the voter signs.
    pub fn hash(&self) -> BlockHash {
        let hashes: Vec<BlockHash> = self.blocks.iter().map(VoteBlock::hash).collect();
        let sequence = self.sequence.to_le_bytes();
        let mut parts: Vec<&[u8]> = Vec::with_capacity(hashes.len() + 2);
        parts.push(VOTE_HASH_PREFIX);
        parts.extend(hashes.iter().map(|h| h.as_bytes().as_slice()));
        parts.push(&sequence);
        BlockHash::new(blake2b_256_multi(&parts))
    }
}

impl Encode for Vote {
    fn encode(&self, out: &mut Vec<u8>) {
        self.account.encode(out);
        self.signature.encode(out);
        out.extend_from_slice(&self.sequence.to_le_bytes());
        for block in &self.blocks {
            block.encode(out);
        }
    }
}

impl Decode for Vote {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let account = Account::decode(reader)?;
        let signature = Signature::decode(reader)?;
        let sequence = reader.read_u64_le()?;
        let mut blocks = Vec::new();
        while !reader.is_empty() {
            blocks.push(VoteBlock::decode(reader)?);
        }
        if blocks.is_empty() {
            return Err(CodecError::EmptyVote);
        }
        Ok(Self {
            account,
            signature,
            sequence,
            blocks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::block::SendBlock;

    fn sample(sequence: u64) -> Vote {
        let send = SendBlock::new(
            BlockHash::from_u64(1),
            Account::from_u64(2),
            Amount::new(3),
            4,
        );
        Vote {
            account: Account::from_u64(9),
            signature: Signature([7u8; 64]),
            sequence,
            blocks: vec![Block::from(send).into(), BlockHash::from_u64(5).into()],
        }
    }

    #[test]
    fn encoding_restores_mixed_entries() {
        let vote = sample(3);
        assert_eq!(Vote::from_bytes(&vote.to_bytes()).unwrap(), vote);
    }

    #[test]
    fn sequence_is_little_endian_after_signature() {
        let bytes = sample(1).to_bytes();
        assert_eq!(bytes[96], 1);
        assert_eq!(&bytes[97..104], &[0u8; 7]);
    }

    #[test]
    fn hash_depends_on_entry_hashes_and_sequence_only() {
        let vote = sample(3);
        let mut as_hashes = vote.clone();
        as_hashes.blocks = vote.blocks.iter().map(|b| b.hash().into()).collect();
        as_hashes.signature = Signature::ZERO;
        assert_eq!(as_hashes.hash(), vote.hash());
        assert_ne!(sample(4).hash(), vote.hash());
    }

    #[test]
    fn vote_without_entries_is_rejected() {
        let mut vote = sample(1);
        vote.blocks.clear();
        assert_eq!(Vote::from_bytes(&vote.to_bytes()), Err(CodecError::EmptyVote));
    }
}
