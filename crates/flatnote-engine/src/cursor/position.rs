//! Mapping between linear character offsets and caret positions.
//!
//! A block renders as a row of text leaves. Mention leaves are atomic: their
//! characters count toward the offset, but a caret never lands inside them.
//! [`InlineSnapshot`] precomputes that leaf list once so the mapping is a pure
//! function of it.

use crate::convert::{Span, split_by_ranges};
use crate::models::{Block, Mention};
use crate::text::char_len;

/// One rendered leaf of inline content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leaf {
    /// Length in characters
    pub len: usize,
    /// False for leaves inside an atomic annotation
    pub editable: bool,
}

impl Leaf {
    pub fn editable(len: usize) -> Self {
        Self {
            len,
            editable: true,
        }
    }

    pub fn atomic(len: usize) -> Self {
        Self {
            len,
            editable: false,
        }
    }
}

/// Concrete caret placement within a block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretPosition {
    /// Inside the eligible leaf `index`, `offset` characters from its start
    Leaf { index: usize, offset: usize },
    /// Block has no eligible leaf; caret sits before all content
    BlockStart,
    /// Block has no eligible leaf; caret sits after all content
    BlockEnd,
}

/// Immutable leaf list of one block's inline content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineSnapshot {
    leaves: Vec<Leaf>,
    len: usize,
}

impl InlineSnapshot {
    pub fn new(leaves: Vec<Leaf>) -> Self {
        let len = leaves.iter().map(|l| l.len).sum();
        Self { leaves, len }
    }

    /// Leaves for a block: text between valid mentions is editable, each
    /// mention span is one atomic leaf.
    pub fn from_block(block: &Block) -> Self {
        if !block.block_type.supports_mentions() {
            let len = block.len();
            return Self::new(if len > 0 { vec![Leaf::editable(len)] } else { Vec::new() });
        }

        let ranges: Vec<_> = block.valid_mentions().map(Mention::range).collect();
        let leaves = split_by_ranges(&block.content, &ranges)
            .into_iter()
            .map(|span| match span {
                Span::Gap(text) => Leaf::editable(char_len(text)),
                Span::Range { text, .. } => Leaf::atomic(char_len(text)),
            })
            .collect();
        Self::new(leaves)
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    /// Total content length in characters, atomic leaves included
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Resolve a linear offset to a caret position.
    ///
    /// Walks eligible leaves with a counter that also consumes atomic
    /// lengths. At an exact leaf boundary the start of the next eligible
    /// leaf wins over the end of the current one. Offset 0 before a leading
    /// atomic leaf is the block start, and any target past the last eligible
    /// leaf is the block end.
    pub fn offset_to_position(&self, target: usize) -> CaretPosition {
        if target == 0 && !self.leaves.first().is_some_and(|l| l.editable) {
            return CaretPosition::BlockStart;
        }

        let mut counter = 0;
        for (index, leaf) in self.leaves.iter().enumerate() {
            if !leaf.editable {
                counter += leaf.len;
                continue;
            }
            let end = counter + leaf.len;
            if end >= target {
                if end == target {
                    if let Some(next) = self.next_eligible(index + 1) {
                        return CaretPosition::Leaf {
                            index: next,
                            offset: 0,
                        };
                    }
                }
                return CaretPosition::Leaf {
                    index,
                    offset: target.saturating_sub(counter),
                };
            }
            counter = end;
        }
        CaretPosition::BlockEnd
    }

    /// Inverse of [`offset_to_position`](Self::offset_to_position)
    pub fn position_to_offset(&self, position: CaretPosition) -> usize {
        match position {
            CaretPosition::BlockStart => 0,
            CaretPosition::BlockEnd => self.len,
            CaretPosition::Leaf { index, offset } => {
                let before: usize = self.leaves.iter().take(index).map(|l| l.len).sum();
                let leaf_len = self.leaves.get(index).map_or(0, |l| l.len);
                (before + offset.min(leaf_len)).min(self.len)
            }
        }
    }

    /// The offset a caret requested at `offset` actually lands on
    pub fn resolve(&self, offset: usize) -> usize {
        self.position_to_offset(self.offset_to_position(offset))
    }

    /// Whether `offset` is content offset 0. A caret just past a leading
    /// mention is not at the start.
    pub fn is_at_start(&self, offset: usize) -> bool {
        offset == 0
    }

    pub fn is_at_end(&self, offset: usize) -> bool {
        offset >= self.len
    }

    /// Every offset a caret can occupy, ascending and deduplicated
    pub fn caret_stops(&self) -> Vec<usize> {
        let mut stops: Vec<usize> = (0..=self.len).map(|o| self.resolve(o)).collect();
        stops.dedup();
        stops
    }

    fn next_eligible(&self, from: usize) -> Option<usize> {
        (from..self.leaves.len()).find(|&i| self.leaves[i].editable)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockType;
    use rstest::rstest;

    fn hi_bo() -> InlineSnapshot {
        let block = Block::text("Hi @Bo!").with_mentions(vec![Mention::new("n1", "@Bo", 3)]);
        InlineSnapshot::from_block(&block)
    }

    #[test]
    fn test_from_block_marks_mentions_atomic() {
        assert_eq!(
            hi_bo().leaves(),
            &[Leaf::editable(3), Leaf::atomic(3), Leaf::editable(1)]
        );
        assert_eq!(hi_bo().len(), 7);
    }

    #[test]
    fn test_caret_never_lands_inside_whole_block_mention() {
        let block = Block::text("ab").with_mentions(vec![Mention::new("n1", "ab", 0)]);
        let snapshot = InlineSnapshot::from_block(&block);

        assert_eq!(snapshot.offset_to_position(1), CaretPosition::BlockEnd);
        assert_eq!(snapshot.resolve(1), 2);
        assert_eq!(snapshot.offset_to_position(0), CaretPosition::BlockStart);
        assert_eq!(snapshot.resolve(0), 0);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(2, 2)]
    #[case(3, 6)]
    #[case(4, 6)]
    #[case(5, 6)]
    #[case(6, 6)]
    #[case(7, 7)]
    #[case(99, 7)]
    fn test_resolve_skips_over_mention(#[case] requested: usize, #[case] landed: usize) {
        assert_eq!(hi_bo().resolve(requested), landed);
    }

    #[test]
    fn test_exact_boundary_prefers_next_leaf_start() {
        let snapshot = InlineSnapshot::new(vec![Leaf::editable(2), Leaf::editable(3)]);
        assert_eq!(
            snapshot.offset_to_position(2),
            CaretPosition::Leaf {
                index: 1,
                offset: 0
            }
        );
        assert_eq!(
            snapshot.offset_to_position(5),
            CaretPosition::Leaf {
                index: 1,
                offset: 3
            }
        );
    }

    #[test]
    fn test_caret_stops() {
        assert_eq!(hi_bo().caret_stops(), vec![0, 1, 2, 6, 7]);
        assert_eq!(InlineSnapshot::default().caret_stops(), vec![0]);
    }

    fn edge_mentions() -> InlineSnapshot {
        let block = Block::text("@Bo hi @Al").with_mentions(vec![
            Mention::new("b", "@Bo", 0),
            Mention::new("a", "@Al", 7),
        ]);
        InlineSnapshot::from_block(&block)
    }

    #[test]
    fn test_caret_stops_around_edge_mentions() {
        assert_eq!(edge_mentions().caret_stops(), vec![0, 3, 4, 5, 6, 7, 10]);

        let trailing = Block::text("Hi @Bo").with_mentions(vec![Mention::new("n", "@Bo", 3)]);
        let snapshot = InlineSnapshot::from_block(&trailing);
        assert_eq!(snapshot.caret_stops(), vec![0, 1, 2, 3, 6]);
        assert_eq!(snapshot.offset_to_position(6), CaretPosition::BlockEnd);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 3)]
    #[case(3, 3)]
    #[case(7, 7)]
    #[case(8, 10)]
    #[case(10, 10)]
    fn test_resolve_with_edge_mentions(#[case] requested: usize, #[case] landed: usize) {
        assert_eq!(edge_mentions().resolve(requested), landed);
    }

    #[test]
    fn test_start_and_end_are_content_boundaries() {
        let snapshot = edge_mentions();

        assert!(snapshot.is_at_start(0));
        assert!(!snapshot.is_at_start(3));
        assert!(snapshot.is_at_end(10));
        assert!(!snapshot.is_at_end(7));
    }

    #[test]
    fn test_empty_block() {
        let snapshot = InlineSnapshot::from_block(&Block::empty());
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.offset_to_position(0), CaretPosition::BlockStart);
        assert!(snapshot.is_at_start(0));
        assert!(snapshot.is_at_end(0));
    }

    #[test]
    fn test_code_block_is_one_editable_leaf() {
        let mut block = Block::new(BlockType::Code, "@Bo");
        block.mentions = vec![Mention::new("n", "@Bo", 0)];
        assert_eq!(InlineSnapshot::from_block(&block).leaves(), &[Leaf::editable(3)]);
    }

    #[test]
    fn test_position_to_offset_inverts() {
        for snapshot in [hi_bo(), edge_mentions()] {
            for stop in snapshot.caret_stops() {
                let position = snapshot.offset_to_position(stop);
                assert_eq!(snapshot.position_to_offset(position), stop);
            }
        }
    }
}
