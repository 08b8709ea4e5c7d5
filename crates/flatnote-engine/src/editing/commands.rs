use std::ops::Range;

use xi_rope::delta::Builder;
use xi_rope::{Delta, Rope, RopeInfo};

use crate::editing::EditError;
use crate::models::{Block, BlockId};
use crate::text::{byte_range, char_len};

/// Content edit within one block. Offsets are character offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    InsertText {
        block: BlockId,
        at: usize,
        text: String,
    },
    DeleteRange {
        block: BlockId,
        range: Range<usize>,
    },
    ReplaceRange {
        block: BlockId,
        range: Range<usize>,
        text: String,
    },
    /// Backspace inside a block. A mention right before `at` goes as a whole.
    DeleteBackward { block: BlockId, at: usize },
    /// Delete key inside a block. A mention right after `at` goes as a whole.
    DeleteForward { block: BlockId, at: usize },
}

impl Cmd {
    pub fn block(&self) -> &BlockId {
        match self {
            Cmd::InsertText { block, .. }
            | Cmd::DeleteRange { block, .. }
            | Cmd::ReplaceRange { block, .. }
            | Cmd::DeleteBackward { block, .. }
            | Cmd::DeleteForward { block, .. } => block,
        }
    }
}

/// The character range a command replaces and the text it puts there
pub(crate) fn edit_span(block: &Block, cmd: &Cmd) -> Result<(Range<usize>, String), EditError> {
    let len = block.len();
    let check = |offset: usize| {
        if offset > len {
            Err(EditError::OffsetOutOfBounds {
                block: block.id.clone(),
                offset,
                len,
            })
        } else {
            Ok(offset)
        }
    };
    let check_range = |range: &Range<usize>| {
        check(range.end)?;
        if range.start > range.end {
            return Err(EditError::InvalidRange {
                block: block.id.clone(),
                range: range.clone(),
            });
        }
        Ok(range.clone())
    };

    Ok(match cmd {
        Cmd::InsertText { at, text, .. } => (check(*at)?..*at, text.clone()),
        Cmd::DeleteRange { range, .. } => (check_range(range)?, String::new()),
        Cmd::ReplaceRange { range, text, .. } => (check_range(range)?, text.clone()),
        Cmd::DeleteBackward { at, .. } => {
            let at = check(*at)?;
            let range = match block.valid_mentions().find(|m| m.end == at) {
                Some(m) => m.range(),
                None => at.saturating_sub(1)..at,
            };
            (range, String::new())
        }
        Cmd::DeleteForward { at, .. } => {
            let at = check(*at)?;
            let range = match block.valid_mentions().find(|m| m.start == at) {
                Some(m) => m.range(),
                None => at..(at + 1).min(len),
            };
            (range, String::new())
        }
    })
}

/// Compile a command against the block's current content into a byte delta
pub(crate) fn compile_command(block: &Block, cmd: &Cmd) -> Result<Delta<RopeInfo>, EditError> {
    let (range, text) = edit_span(block, cmd)?;
    let bytes = byte_range(&block.content, &range);

    let mut builder = Builder::new(block.content.len());
    if text.is_empty() {
        builder.delete(bytes);
    } else {
        builder.replace(bytes, Rope::from(text.as_str()));
    }
    Ok(builder.build())
}

/// Caret offset after the command has been applied
pub(crate) fn caret_after(block: &Block, cmd: &Cmd) -> Result<usize, EditError> {
    let (range, text) = edit_span(block, cmd)?;
    Ok(range.start + char_len(&text))
}
