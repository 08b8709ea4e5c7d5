//! Conversion between the flat block model and the rich-document tree.
//!
//! ```rust
//! use flatnote_engine::convert::{ConvertOptions, blocks_to_tree, tree_to_blocks};
//! use flatnote_engine::models::{Block, BlockType};
//!
//! let blocks = vec![
//!     Block::new(BlockType::H1, "Groceries"),
//!     Block::new(BlockType::Todo, "Milk"),
//!     Block::new(BlockType::Todo, "Eggs"),
//! ];
//! let options = ConvertOptions::default();
//!
//! let tree = blocks_to_tree(&blocks, &options);
//! let back = tree_to_blocks(Some(&tree), &options);
//!
//! assert_eq!(back.len(), 3);
//! assert_eq!(back[2].content, "Eggs");
//! ```

pub mod from_tree;
pub mod offsets;
pub mod to_tree;

pub use from_tree::tree_to_blocks;
pub use offsets::{
    FlatInline, Span, accumulate_offsets, annotated_nodes, flatten_inline, inline_nodes,
    split_by_ranges, styled_text_nodes,
};
pub use to_tree::blocks_to_tree;

use crate::models::LEGACY_CELL_DELIMITER;

/// Tunables shared by both conversion directions
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Cell delimiter of the legacy table string shape
    pub legacy_cell_delimiter: char,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            legacy_cell_delimiter: LEGACY_CELL_DELIMITER,
        }
    }
}
