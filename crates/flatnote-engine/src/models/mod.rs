pub mod block;
pub mod document;
pub mod inline;
pub mod table;

pub use block::{
    Block, BlockId, BlockType, ListKind, MediaKind, MediaRef, Mention, UnknownBlockType,
};
pub use document::Document;
pub use inline::{
    Annotation, InlineEmoji, Link, Mark, MarkAttrs, MarkKind, TextAlign, emoji_display_text,
};
pub use table::{LEGACY_CELL_DELIMITER, TablePayload, TableRow};
