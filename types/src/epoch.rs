//! Schema epoch tags for accounts, pending entries and state blocks.

use serde::{Deserialize, Serialize};

/// Which generation of the account/pending schema a row belongs to.
///
/// The epoch is never stored inside a row; it is implied by the physical
/// sub-table the row lives in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Epoch {
    #[default]
    Epoch0,
    Epoch1,
}
