//! Block variants of the block-lattice.
//!
//! The variant set is closed: send, receive, open, change and state. Each
//! variant carries its own hashable-field struct; the hash covers those
//! fields only, never the signature or the work token.

use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::codec::{Decode, Encode, Reader};
use crate::error::CodecError;
use crate::hash::{blake2b_256_multi, BlockHash};
use crate::keys::{Account, Signature};

/// Type tag written in front of a block wherever the variant is not implied
/// by the table it is stored in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BlockType {
    Invalid = 0,
    NotABlock = 1,
    Send = 2,
    Receive = 3,
    Open = 4,
    Change = 5,
    State = 6,
}

impl BlockType {
    pub fn from_u8(tag: u8) -> Result<Self, CodecError> {
        match tag {
            0 => Ok(Self::Invalid),
            1 => Ok(Self::NotABlock),
            2 => Ok(Self::Send),
            3 => Ok(Self::Receive),
            4 => Ok(Self::Open),
            5 => Ok(Self::Change),
            6 => Ok(Self::State),
            other => Err(CodecError::UnknownBlockType(other)),
        }
    }

    /// Encoded size of a block of this type, excluding any type tag.
    pub fn size(self) -> usize {
        match self {
            Self::Send => SendBlock::SIZE,
            Self::Receive => ReceiveBlock::SIZE,
            Self::Open => OpenBlock::SIZE,
            Self::Change => ChangeBlock::SIZE,
            Self::State => StateBlock::SIZE,
            Self::Invalid | Self::NotABlock => 0,
        }
    }
}

const SIGNATURE_SIZE: usize = 64;
const WORK_SIZE: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendHashables {
    pub previous: BlockHash,
    pub destination: Account,
    pub balance: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendBlock {
    pub hashables: SendHashables,
    pub signature: Signature,
    pub work: u64,
}

impl SendBlock {
    pub const SIZE: usize = 32 + 32 + 16 + SIGNATURE_SIZE + WORK_SIZE;

    pub fn new(previous: BlockHash, destination: Account, balance: Amount, work: u64) -> Self {
        Self {
            hashables: SendHashables {
                previous,
                destination,
                balance,
            },
            signature: Signature::ZERO,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        let h = &self.hashables;
        BlockHash::new(blake2b_256_multi(&[
            h.previous.as_bytes(),
            h.destination.as_bytes(),
            &h.balance.raw().to_be_bytes(),
        ]))
    }
}

impl Encode for SendBlock {
    fn encode(&self, out: &mut Vec<u8>) {
        self.hashables.previous.encode(out);
        self.hashables.destination.encode(out);
        self.hashables.balance.encode(out);
        self.signature.encode(out);
        out.extend_from_slice(&self.work.to_le_bytes());
    }
}

impl Decode for SendBlock {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            hashables: SendHashables {
                previous: BlockHash::decode(reader)?,
                destination: Account::decode(reader)?,
                balance: Amount::decode(reader)?,
            },
            signature: Signature::decode(reader)?,
            work: reader.read_u64_le()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveHashables {
    pub previous: BlockHash,
    pub source: BlockHash,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiveBlock {
    pub hashables: ReceiveHashables,
    pub signature: Signature,
    pub work: u64,
}

impl ReceiveBlock {
    pub const SIZE: usize = 32 + 32 + SIGNATURE_SIZE + WORK_SIZE;

    pub fn new(previous: BlockHash, source: BlockHash, work: u64) -> Self {
        Self {
            hashables: ReceiveHashables { previous, source },
            signature: Signature::ZERO,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash::new(blake2b_256_multi(&[
            self.hashables.previous.as_bytes(),
            self.hashables.source.as_bytes(),
        ]))
    }
}

impl Encode for ReceiveBlock {
    fn encode(&self, out: &mut Vec<u8>) {
        self.hashables.previous.encode(out);
        self.hashables.source.encode(out);
        self.signature.encode(out);
        out.extend_from_slice(&self.work.to_le_bytes());
    }
}

impl Decode for ReceiveBlock {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            hashables: ReceiveHashables {
                previous: BlockHash::decode(reader)?,
                source: BlockHash::decode(reader)?,
            },
            signature: Signature::decode(reader)?,
            work: reader.read_u64_le()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenHashables {
    pub source: BlockHash,
    pub representative: Account,
    pub account: Account,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenBlock {
    pub hashables: OpenHashables,
    pub signature: Signature,
    pub work: u64,
}

impl OpenBlock {
    pub const SIZE: usize = 32 + 32 + 32 + SIGNATURE_SIZE + WORK_SIZE;

    pub fn new(source: BlockHash, representative: Account, account: Account, work: u64) -> Self {
        Self {
            hashables: OpenHashables {
                source,
                representative,
                account,
            },
            signature: Signature::ZERO,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        let h = &self.hashables;
        BlockHash::new(blake2b_256_multi(&[
            h.source.as_bytes(),
            h.representative.as_bytes(),
            h.account.as_bytes(),
        ]))
    }
}

impl Encode for OpenBlock {
    fn encode(&self, out: &mut Vec<u8>) {
        self.hashables.source.encode(out);
        self.hashables.representative.encode(out);
        self.hashables.account.encode(out);
        self.signature.encode(out);
        out.extend_from_slice(&self.work.to_le_bytes());
    }
}

impl Decode for OpenBlock {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            hashables: OpenHashables {
                source: BlockHash::decode(reader)?,
                representative: Account::decode(reader)?,
                account: Account::decode(reader)?,
            },
            signature: Signature::decode(reader)?,
            work: reader.read_u64_le()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeHashables {
    pub previous: BlockHash,
    pub representative: Account,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeBlock {
    pub hashables: ChangeHashables,
    pub signature: Signature,
    pub work: u64,
}

impl ChangeBlock {
    pub const SIZE: usize = 32 + 32 + SIGNATURE_SIZE + WORK_SIZE;

    pub fn new(previous: BlockHash, representative: Account, work: u64) -> Self {
        Self {
            hashables: ChangeHashables {
                previous,
                representative,
            },
            signature: Signature::ZERO,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        BlockHash::new(blake2b_256_multi(&[
            self.hashables.previous.as_bytes(),
            self.hashables.representative.as_bytes(),
        ]))
    }
}

impl Encode for ChangeBlock {
    fn encode(&self, out: &mut Vec<u8>) {
        self.hashables.previous.encode(out);
        self.hashables.representative.encode(out);
        self.signature.encode(out);
        out.extend_from_slice(&self.work.to_le_bytes());
    }
}

impl Decode for ChangeBlock {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            hashables: ChangeHashables {
                previous: BlockHash::decode(reader)?,
                representative: Account::decode(reader)?,
            },
            signature: Signature::decode(reader)?,
            work: reader.read_u64_le()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateHashables {
    pub account: Account,
    pub previous: BlockHash,
    pub representative: Account,
    pub balance: Amount,
    /// Destination account for sends, source hash for receives, zero otherwise.
    pub link: BlockHash,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateBlock {
    pub hashables: StateHashables,
    pub signature: Signature,
    pub work: u64,
}

impl StateBlock {
    pub const SIZE: usize = 32 + 32 + 32 + 16 + 32 + SIGNATURE_SIZE + WORK_SIZE;

    pub fn new(
        account: Account,
        previous: BlockHash,
        representative: Account,
        balance: Amount,
        link: BlockHash,
        work: u64,
    ) -> Self {
        Self {
            hashables: StateHashables {
                account,
                previous,
                representative,
                balance,
                link,
            },
            signature: Signature::ZERO,
            work,
        }
    }

    pub fn hash(&self) -> BlockHash {
        let mut preamble = [0u8; 32];
        preamble[31] = BlockType::State as u8;
        let h = &self.hashables;
        BlockHash::new(blake2b_256_multi(&[
            &preamble,
            h.account.as_bytes(),
            h.previous.as_bytes(),
            h.representative.as_bytes(),
            &h.balance.raw().to_be_bytes(),
            h.link.as_bytes(),
        ]))
    }
}

impl Encode for StateBlock {
    fn encode(&self, out: &mut Vec<u8>) {
        self.hashables.account.encode(out);
        self.hashables.previous.encode(out);
        self.hashables.representative.encode(out);
        self.hashables.balance.encode(out);
        self.hashables.link.encode(out);
        self.signature.encode(out);
        out.extend_from_slice(&self.work.to_be_bytes());
    }
}

impl Decode for StateBlock {
    fn decode(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            hashables: StateHashables {
                account: Account::decode(reader)?,
                previous: BlockHash::decode(reader)?,
                representative: Account::decode(reader)?,
                balance: Amount::decode(reader)?,
                link: BlockHash::decode(reader)?,
            },
            signature: Signature::decode(reader)?,
            work: reader.read_u64_be()?,
        })
    }
}

/// A block of any variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Send(SendBlock),
    Receive(ReceiveBlock),
    Open(OpenBlock),
    Change(ChangeBlock),
    State(StateBlock),
}

impl Block {
    pub fn block_type(&self) -> BlockType {
        match self {
            Self::Send(_) => BlockType::Send,
            Self::Receive(_) => BlockType::Receive,
            Self::Open(_) => BlockType::Open,
            Self::Change(_) => BlockType::Change,
            Self::State(_) => BlockType::State,
        }
    }

    pub fn hash(&self) -> BlockHash {
        match self {
            Self::Send(b) => b.hash(),
            Self::Receive(b) => b.hash(),
            Self::Open(b) => b.hash(),
            Self::Change(b) => b.hash(),
            Self::State(b) => b.hash(),
        }
    }

    /// Predecessor on the account chain; zero for open blocks and for state
    /// blocks that open an account.
    pub fn previous(&self) -> BlockHash {
        match self {
            Self::Send(b) => b.hashables.previous,
            Self::Receive(b) => b.hashables.previous,
            Self::Open(_) => BlockHash::ZERO,
            Self::Change(b) => b.hashables.previous,
            Self::State(b) => b.hashables.previous,
        }
    }

    /// The value a block competes on: its previous hash, or the account for
    /// the first block of a chain.
    pub fn root(&self) -> BlockHash {
        match self {
            Self::Open(b) => BlockHash::new(*b.hashables.account.as_bytes()),
            Self::State(b) if b.hashables.previous.is_zero() => {
                BlockHash::new(*b.hashables.account.as_bytes())
            }
            other => other.previous(),
        }
    }

    /// Source send block for receives and opens. State blocks report their
    /// link, which only names a source when the block is a receive.
    pub fn source(&self) -> Option<BlockHash> {
        match self {
            Self::Receive(b) => Some(b.hashables.source),
            Self::Open(b) => Some(b.hashables.source),
            Self::State(b) => Some(b.hashables.link),
            Self::Send(_) | Self::Change(_) => None,
        }
    }

    pub fn representative(&self) -> Option<Account> {
        match self {
            Self::Open(b) => Some(b.hashables.representative),
            Self::Change(b) => Some(b.hashables.representative),
            Self::State(b) => Some(b.hashables.representative),
            Self::Send(_) | Self::Receive(_) => None,
        }
    }

    /// Balance after this block, for the variants that carry one.
    pub fn balance(&self) -> Option<Amount> {
        match self {
            Self::Send(b) => Some(b.hashables.balance),
            Self::State(b) => Some(b.hashables.balance),
            _ => None,
        }
    }

    /// Owning account, for the variants that name it.
    pub fn account(&self) -> Option<Account> {
        match self {
            Self::Open(b) => Some(b.hashables.account),
            Self::State(b) => Some(b.hashables.account),
            _ => None,
        }
    }

    pub fn signature(&self) -> &Signature {
        match self {
            Self::Send(b) => &b.signature,
            Self::Receive(b) => &b.signature,
            Self::Open(b) => &b.signature,
            Self::Change(b) => &b.signature,
            Self::State(b) => &b.signature,
        }
    }

    pub fn set_signature(&mut self, signature: Signature) {
        match self {
            Self::Send(b) => b.signature = signature,
            Self::Receive(b) => b.signature = signature,
            Self::Open(b) => b.signature = signature,
            Self::Change(b) => b.signature = signature,
            Self::State(b) => b.signature = signature,
        }
    }

    pub fn work(&self) -> u64 {
        match self {
            Self::Send(b) => b.work,
            Self::Receive(b) => b.work,
            Self::Open(b) => b.work,
            Self::Change(b) => b.work,
            Self::State(b) => b.work,
        }
    }

    pub fn set_work(&mut self, work: u64) {
        match self {
            Self::Send(b) => b.work = work,
            Self::Receive(b) => b.work = work,
            Self::Open(b) => b.work = work,
            Self::Change(b) => b.work = work,
            Self::State(b) => b.work = work,
        }
    }

    /// Decode a block whose variant is known from context (e.g. its table).
    pub fn decode_variant(
        block_type: BlockType,
        reader: &mut Reader<'_>,
    ) -> Result<Self, CodecError> {
        Ok(match block_type {
            BlockType::Send => Self::Send(SendBlock::decode(reader)?),
            BlockType::Receive => Self::Receive(ReceiveBlock::decode(reader)?),
            BlockType::Open => Self::Open(OpenBlock::decode(reader)?),
            BlockType::Change => Self::Change(ChangeBlock::decode(reader)?),
            BlockType::State => Self::State(StateBlock::decode(reader)?),
            other => return Err(CodecError::UnknownBlockType(other as u8)),
        })
    }

    /// Type tag followed by the variant encoding.
    pub fn encode_typed(&self, out: &mut Vec<u8>) {
        out.push(self.block_type() as u8);
        self.encode(out);
    }

    pub fn decode_typed(reader: &mut Reader<'_>) -> Result<Self, CodecError> {
        let block_type = BlockType::from_u8(reader.read_u8()?)?;
        Self::decode_variant(block_type, reader)
    }
}

impl Encode for Block {
    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            Self::Send(b) => b.encode(out),
            Self::Receive(b) => b.encode(out),
            Self::Open(b) => b.encode(out),
            Self::Change(b) => b.encode(out),
            Self::State(b) => b.encode(out),
        }
    }
}

impl From<SendBlock> for Block {
    fn from(block: SendBlock) -> Self {
        Self::Send(block)
    }
}

impl From<ReceiveBlock> for Block {
    fn from(block: ReceiveBlock) -> Self {
        Self::Receive(block)
    }
}

impl From<OpenBlock> for Block {
    fn from(block: OpenBlock) -> Self {
        Self::Open(block)
    }
}

impl From<ChangeBlock> for Block {
    fn from(block: ChangeBlock) -> Self {
        Self::Change(block)
    }
}

impl From<StateBlock> for Block {
    fn from(block: StateBlock) -> Self {
        Self::State(block)
    }
}
