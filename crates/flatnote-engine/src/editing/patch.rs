use std::ops::Range;

use crate::models::BlockId;
use crate::suggest::Trigger;

/// Result of applying a command
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub block: BlockId,
    /// Character ranges of the new content that were written
    pub changed: Vec<Range<usize>>,
    pub new_selection: Range<usize>,
    pub version: u64,
    /// Mentions removed because the edit touched their text
    pub dropped_mentions: usize,
    /// Suggestion trigger live after the edit
    pub trigger: Option<Trigger>,
}
