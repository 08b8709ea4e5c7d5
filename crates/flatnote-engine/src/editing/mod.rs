//! Editing operations on the block document.
//!
//! Content edits are expressed as [`Cmd`]s, compiled to xi-rope deltas and
//! applied by the [`Editor`], which owns the [`Document`](crate::models::Document).
//! Each edit returns a [`Patch`] describing what changed so a host can
//! update its view without diffing.

pub mod commands;
pub mod editor;
pub mod host;
pub mod keys;
pub mod mentions;
pub mod patch;

pub use commands::Cmd;
pub use editor::{Editor, EditorOptions};
pub use host::{DocumentSink, TargetNavigator};
pub use keys::{merge_blocks, split_block};
pub use patch::Patch;

use std::ops::Range;

use crate::models::{BlockId, BlockType};
use crate::suggest::TriggerKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Unknown block: {0}")]
    UnknownBlock(BlockId),
    #[error("Block {0} does not hold editable text")]
    NotEditable(BlockId),
    #[error("Offset {offset} is out of bounds for block {block} of length {len}")]
    OffsetOutOfBounds {
        block: BlockId,
        offset: usize,
        len: usize,
    },
    #[error("Invalid range {range:?} in block {block}")]
    InvalidRange { block: BlockId, range: Range<usize> },
    #[error("Block {block} is {actual}, expected {expected}")]
    WrongBlockType {
        block: BlockId,
        expected: BlockType,
        actual: BlockType,
    },
    #[error("No {0:?} suggestion is active")]
    NoActiveTrigger(TriggerKind),
}
