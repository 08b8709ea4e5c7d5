pub mod convert;
pub mod cursor;
pub mod editing;
pub mod io;
pub mod models;
pub mod suggest;
pub mod text;
pub mod tree;

// Re-export key types for easier usage
pub use convert::{ConvertOptions, blocks_to_tree, tree_to_blocks};
pub use cursor::{Caret, Navigation, NavigationSettings, VerticalDirection};
pub use editing::{Cmd, EditError, Editor, EditorOptions, Patch};
pub use io::*;
pub use models::{
    Block, BlockId, BlockType, Document, Link, Mark, MarkKind, MediaKind, MediaRef, Mention,
    TablePayload, TextAlign,
};
pub use suggest::{MentionTarget, Trigger, TriggerKind, TriggerSettings};
pub use tree::{TextMark, TreeNode, format_tree};
