//! Structural keys: the ones that can create, merge or delete blocks, and
//! the arrow keys that move focus between them.

use crate::cursor::{
    Caret, InlineSnapshot, Navigation, PendingTransfer, TextMeasure, VerticalDirection,
    VerticalPlan, arrow_left, arrow_right, plan_vertical,
};
use crate::editing::{EditError, Editor};
use crate::models::{Annotation, Block, BlockType};
use crate::text::byte_offset;

/// Append `cur` to `prev`, carrying its mentions and formatting over.
/// Returns the join offset, where `cur`'s content now starts inside `prev`.
pub fn merge_blocks(prev: &mut Block, cur: Block) -> usize {
    let join = prev.len();
    prev.content.push_str(&cur.content);
    prev.mentions
        .extend(cur.mentions.into_iter().map(|m| m.shifted(join)));
    prev.marks.extend(cur.marks.iter().map(|m| m.shifted(join)));
    prev.links.extend(cur.links.iter().map(|l| l.shifted(join)));
    prev.emojis.extend(cur.emojis.iter().map(|e| e.shifted(join)));
    prev.normalize();
    join
}

/// Divide ranges at `at`. Atomic ones straddling it are dropped, the others
/// are cut into both halves.
fn split_ranges<A: Annotation>(items: Vec<A>, at: usize, atomic: bool) -> (Vec<A>, Vec<A>) {
    let mut before = Vec::new();
    let mut after = Vec::new();
    for item in items {
        let range = item.range();
        if range.end <= at {
            before.push(item);
        } else if range.start >= at {
            let mut moved = item;
            moved.set_range(range.start - at..range.end - at);
            after.push(moved);
        } else if atomic {
            log::debug!("split at {at} cuts through an atomic range {range:?}, dropping it");
        } else {
            let mut head = item.clone();
            head.set_range(range.start..at);
            let mut tail = item;
            tail.set_range(0..range.end - at);
            before.push(head);
            after.push(tail);
        }
    }
    (before, after)
}

/// Split `block` at character offset `at`. `block` keeps the text before
/// the split; the returned block holds the rest. List blocks continue as
/// the same list type, a todo continues unchecked, everything else
/// continues as plain text. Mentions and emoji straddling the split are
/// dropped; marks and links are cut in two.
pub fn split_block(block: &mut Block, at: usize) -> Block {
    let at = at.min(block.len());
    let tail = block.content.split_off(byte_offset(&block.content, at));

    let (mentions, tail_mentions) = split_ranges(std::mem::take(&mut block.mentions), at, true);
    let (emojis, tail_emojis) = split_ranges(std::mem::take(&mut block.emojis), at, true);
    let (marks, tail_marks) = split_ranges(std::mem::take(&mut block.marks), at, false);
    let (links, tail_links) = split_ranges(std::mem::take(&mut block.links), at, false);
    block.mentions = mentions;
    block.emojis = emojis;
    block.marks = marks;
    block.links = links;

    let continued = if block.block_type.is_list() {
        block.block_type
    } else {
        BlockType::Text
    };
    let mut next = Block::new(continued, tail);
    next.mentions = tail_mentions;
    next.emojis = tail_emojis;
    next.marks = tail_marks;
    next.links = tail_links;
    next.normalize();
    next
}

impl Editor {
    fn moved(&mut self, caret: Caret) -> Navigation {
        self.move_caret(caret.clone());
        Navigation::Moved(caret)
    }

    /// Backspace at a block boundary.
    ///
    /// An empty block is deleted when others remain. At content offset 0,
    /// an opaque previous block (divider, table, media) is deleted; a
    /// text-bearing one absorbs this block, and the caret lands on the join
    /// point. Anywhere else, including just after a leading mention, the
    /// text region handles it.
    pub fn backspace(&mut self, caret: &Caret) -> Result<Navigation, EditError> {
        let (index, block) = self.editable(&caret.block)?;

        if block.is_empty() && self.document.len() > 1 {
            let id = block.id.clone();
            self.document.remove(&id);
            let blocks = self.document.blocks();
            let focus = blocks[..index]
                .iter()
                .rev()
                .find(|b| b.block_type.is_text_bearing())
                .map(|prev| Caret::new(prev.id.clone(), prev.len()))
                .or_else(|| {
                    blocks
                        .iter()
                        .find(|b| b.block_type.is_text_bearing())
                        .map(|first| Caret::new(first.id.clone(), 0))
                });
            return Ok(match focus {
                Some(focus) => self.moved(focus),
                None => {
                    self.caret = None;
                    self.trigger = None;
                    Navigation::Suppressed
                }
            });
        }

        if index == 0 || !InlineSnapshot::from_block(block).is_at_start(caret.offset) {
            return Ok(Navigation::Native);
        }

        let prev = &self.document.blocks()[index - 1];
        if !prev.block_type.is_text_bearing() {
            let prev_id = prev.id.clone();
            self.document.remove(&prev_id);
            return Ok(self.moved(caret.clone()));
        }

        let prev_id = prev.id.clone();
        let Some((_, cur)) = self.document.remove(&caret.block) else {
            return Err(EditError::UnknownBlock(caret.block.clone()));
        };
        let join = self
            .document
            .update(&prev_id, |p| merge_blocks(p, cur))
            .ok_or_else(|| EditError::UnknownBlock(prev_id.clone()))?;
        Ok(self.moved(Caret::new(prev_id, join)))
    }

    /// Delete at the end of a block: pulls the next block's content in, or
    /// deletes the next block when it is opaque.
    pub fn delete_forward(&mut self, caret: &Caret) -> Result<Navigation, EditError> {
        let (index, block) = self.editable(&caret.block)?;
        if !InlineSnapshot::from_block(block).is_at_end(caret.offset) {
            return Ok(Navigation::Native);
        }
        let Some(next) = self.document.block_at(index + 1) else {
            return Ok(Navigation::Native);
        };
        let next_id = next.id.clone();

        if !next.block_type.is_text_bearing() {
            self.document.remove(&next_id);
            return Ok(self.moved(caret.clone()));
        }

        let Some((_, next)) = self.document.remove(&next_id) else {
            return Err(EditError::UnknownBlock(next_id));
        };
        let join = self
            .document
            .update(&caret.block, |b| merge_blocks(b, next))
            .ok_or_else(|| EditError::UnknownBlock(caret.block.clone()))?;
        Ok(self.moved(Caret::new(caret.block.clone(), join)))
    }

    /// Enter: split the block at the caret and focus the new block.
    ///
    /// Enter in an empty list item turns it back into plain text instead.
    /// Code blocks take the newline natively.
    pub fn enter(&mut self, caret: &Caret) -> Result<Navigation, EditError> {
        let (index, block) = self.editable(&caret.block)?;
        if block.block_type == BlockType::Code {
            return Ok(Navigation::Native);
        }
        if block.block_type.is_list() && block.is_empty() {
            let id = block.id.clone();
            self.document.update(&id, |b| b.retype(BlockType::Text));
            return Ok(self.moved(Caret::new(id, 0)));
        }

        let at = InlineSnapshot::from_block(block).resolve(caret.offset);
        let created = self
            .document
            .update(&caret.block, |b| split_block(b, at))
            .ok_or_else(|| EditError::UnknownBlock(caret.block.clone()))?;
        let focus = Caret::new(created.id.clone(), 0);
        self.document.insert(index + 1, created);
        Ok(self.moved(focus))
    }

    /// ArrowLeft at a block start moves to the end of the previous block.
    pub fn arrow_left(&mut self, caret: &Caret) -> Navigation {
        match arrow_left(self.document.blocks(), caret) {
            Navigation::Moved(to) => self.moved(to),
            other => other,
        }
    }

    /// ArrowRight at a block end moves to the start of the next block.
    pub fn arrow_right(&mut self, caret: &Caret) -> Navigation {
        match arrow_right(self.document.blocks(), caret) {
            Navigation::Moved(to) => self.moved(to),
            other => other,
        }
    }

    /// First phase of ArrowUp/ArrowDown. A returned transfer must be
    /// finished with [`complete_transfer`](Self::complete_transfer) once the
    /// host has laid out the target block.
    pub fn plan_arrow(
        &self,
        caret: &Caret,
        direction: VerticalDirection,
        measure: &impl TextMeasure,
    ) -> VerticalPlan {
        plan_vertical(
            self.document.blocks(),
            caret,
            direction,
            measure,
            &self.options.navigation,
        )
    }

    pub fn complete_transfer(
        &mut self,
        pending: &PendingTransfer,
        measure: &impl TextMeasure,
    ) -> Navigation {
        match pending.land(self.document.blocks(), measure, &self.options.navigation) {
            Navigation::Moved(to) => self.moved(to),
            other => other,
        }
    }

    /// ArrowUp/ArrowDown with both phases run against the same layout.
    pub fn arrow_vertical(
        &mut self,
        caret: &Caret,
        direction: VerticalDirection,
        measure: &impl TextMeasure,
    ) -> Navigation {
        match self.plan_arrow(caret, direction, measure) {
            VerticalPlan::Transfer(pending) => self.complete_transfer(&pending, measure),
            VerticalPlan::Stay(navigation) => navigation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::MonospaceMeasure;
    use crate::models::{BlockId, Document, InlineEmoji, Link, Mark, MarkKind, Mention};
    use pretty_assertions::assert_eq;

    fn editor_with(blocks: Vec<Block>) -> Editor {
        Editor::new(Document::new(blocks))
    }

    fn summary(editor: &Editor) -> Vec<(BlockType, String)> {
        editor
            .blocks()
            .iter()
            .map(|b| (b.block_type, b.content.clone()))
            .collect()
    }

    fn moved_to(nav: Navigation) -> Caret {
        match nav {
            Navigation::Moved(caret) => caret,
            other => panic!("expected a move, got {other:?}"),
        }
    }

    // ============ Merge and split tests ============

    #[test]
    fn test_merge_shifts_mentions_by_join_offset() {
        let mut prev = Block::text("Hello ");
        let cur = Block::text("World").with_mentions(vec![Mention::new("n", "World", 0)]);

        let join = merge_blocks(&mut prev, cur);

        assert_eq!(join, 6);
        assert_eq!(prev.content, "Hello World");
        assert_eq!(prev.mentions, vec![Mention::new("n", "World", 6)]);
        assert_eq!(prev.mentions[0].range(), 6..11);
    }

    #[test]
    fn test_split_partitions_mentions() {
        let mut block = Block::text("@A mid @B").with_mentions(vec![
            Mention::new("a", "@A", 0),
            Mention::new("b", "@B", 7),
        ]);
        let tail = split_block(&mut block, 3);

        assert_eq!(block.content, "@A ");
        assert_eq!(block.mentions, vec![Mention::new("a", "@A", 0)]);
        assert_eq!(tail.content, "mid @B");
        assert_eq!(tail.mentions, vec![Mention::new("b", "@B", 4)]);
        assert_eq!(tail.block_type, BlockType::Text);
    }

    #[test]
    fn test_split_through_mention_drops_it() {
        let mut block = Block::text("x @Bob").with_mentions(vec![Mention::new("b", "@Bob", 2)]);
        let tail = split_block(&mut block, 4);
        assert!(block.mentions.is_empty());
        assert!(tail.mentions.is_empty());
        assert_eq!(tail.content, "ob");
    }

    #[test]
    fn test_merge_and_split_carry_formatting() {
        let mut prev = Block::text("Hi ").with_marks(vec![Mark::new(MarkKind::Bold, 0..3)]);
        let cur = Block::text("there")
            .with_marks(vec![Mark::new(MarkKind::Bold, 0..2)])
            .with_links(vec![Link::new("/t", 0..5)]);

        assert_eq!(merge_blocks(&mut prev, cur), 3);
        assert_eq!(prev.marks, vec![Mark::new(MarkKind::Bold, 0..5)]);
        assert_eq!(prev.links, vec![Link::new("/t", 3..8)]);

        let tail = split_block(&mut prev, 4);

        assert_eq!((prev.content.as_str(), tail.content.as_str()), ("Hi t", "here"));
        assert_eq!(prev.marks, vec![Mark::new(MarkKind::Bold, 0..4)]);
        assert_eq!(prev.links, vec![Link::new("/t", 3..4)]);
        assert_eq!(tail.marks, vec![Mark::new(MarkKind::Bold, 0..1)]);
        assert_eq!(tail.links, vec![Link::new("/t", 0..4)]);
    }

    #[test]
    fn test_split_through_emoji_drops_it() {
        let mut attrs = serde_json::Map::new();
        attrs.insert("name".to_string(), serde_json::json!("ok"));
        let mut block = Block::text("a :ok:").with_emojis(vec![InlineEmoji::new(attrs, 2)]);
        assert_eq!(block.emojis.len(), 1);

        let tail = split_block(&mut block, 4);

        assert!(block.emojis.is_empty());
        assert!(tail.emojis.is_empty());
        assert_eq!(tail.content, "k:");
    }

    #[test]
    fn test_split_continues_lists() {
        let mut todo = Block::new(BlockType::Todo, "ab").with_checked(true);
        let tail = split_block(&mut todo, 1);
        assert_eq!(tail.block_type, BlockType::Todo);
        assert_eq!(tail.checked, Some(false));

        let mut heading = Block::new(BlockType::H1, "ab");
        assert_eq!(split_block(&mut heading, 2).block_type, BlockType::Text);
    }

    // ============ Backspace tests ============

    #[test]
    fn test_backspace_merges_into_previous() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::Text, "Hello "),
            Block::with_id("b", BlockType::Text, "World")
                .with_mentions(vec![Mention::new("n", "World", 0)]),
        ]);

        let caret = moved_to(editor.backspace(&Caret::new("b", 0)).unwrap());

        assert_eq!(caret, Caret::new("a", 6));
        assert_eq!(summary(&editor), vec![(BlockType::Text, "Hello World".to_string())]);
        assert_eq!(editor.blocks()[0].mentions[0].range(), 6..11);
    }

    #[test]
    fn test_backspace_in_empty_block_deletes_it() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::Text, "abc"),
            Block::with_id("b", BlockType::Text, ""),
        ]);
        let caret = moved_to(editor.backspace(&Caret::new("b", 0)).unwrap());
        assert_eq!(caret, Caret::new("a", 3));
        assert_eq!(editor.document().len(), 1);
    }

    #[test]
    fn test_backspace_in_empty_first_block_focuses_new_first() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::Text, ""),
            Block::with_id("b", BlockType::Text, "next"),
        ]);
        let caret = moved_to(editor.backspace(&Caret::new("a", 0)).unwrap());
        assert_eq!(caret, Caret::new("b", 0));
    }

    #[test]
    fn test_backspace_in_only_block_is_native() {
        let mut editor = editor_with(vec![Block::with_id("a", BlockType::Text, "")]);
        assert_eq!(editor.backspace(&Caret::new("a", 0)).unwrap(), Navigation::Native);
        assert_eq!(editor.document().len(), 1);
    }

    #[test]
    fn test_backspace_after_divider_removes_divider() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::Text, "x"),
            Block::with_id("d", BlockType::Divider, ""),
            Block::with_id("b", BlockType::Text, "y"),
        ]);
        let caret = moved_to(editor.backspace(&Caret::new("b", 0)).unwrap());
        assert_eq!(caret, Caret::new("b", 0));
        assert_eq!(
            summary(&editor),
            vec![
                (BlockType::Text, "x".to_string()),
                (BlockType::Text, "y".to_string())
            ]
        );
    }

    #[test]
    fn test_backspace_mid_block_is_native() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::Text, "x"),
            Block::with_id("b", BlockType::Text, "yz"),
        ]);
        assert_eq!(editor.backspace(&Caret::new("b", 1)).unwrap(), Navigation::Native);
    }

    #[test]
    fn test_backspace_after_leading_mention_is_native() {
        let mut editor = editor_with(vec![
            Block::with_id("p", BlockType::Text, "x"),
            Block::with_id("a", BlockType::Text, "@Bo hi")
                .with_mentions(vec![Mention::new("n", "@Bo", 0)]),
        ]);

        assert_eq!(editor.backspace(&Caret::new("a", 3)).unwrap(), Navigation::Native);
        assert_eq!(editor.document().len(), 2);

        let caret = moved_to(editor.backspace(&Caret::new("a", 0)).unwrap());
        assert_eq!(caret, Caret::new("p", 1));
        assert_eq!(summary(&editor), vec![(BlockType::Text, "x@Bo hi".to_string())]);
        assert_eq!(editor.blocks()[0].mentions, vec![Mention::new("n", "@Bo", 1)]);
    }

    // ============ Delete tests ============

    #[test]
    fn test_delete_at_end_pulls_next_block_in() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::H2, "Ab"),
            Block::with_id("b", BlockType::Text, "cd"),
        ]);
        let caret = moved_to(editor.delete_forward(&Caret::new("a", 2)).unwrap());
        assert_eq!(caret, Caret::new("a", 2));
        assert_eq!(summary(&editor), vec![(BlockType::H2, "Abcd".to_string())]);
    }

    #[test]
    fn test_delete_before_table_removes_table() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::Text, "Ab"),
            Block::with_id("t", BlockType::Table, ""),
        ]);
        editor.delete_forward(&Caret::new("a", 2)).unwrap();
        assert_eq!(editor.document().len(), 1);
        assert_eq!(
            editor.delete_forward(&Caret::new("a", 2)).unwrap(),
            Navigation::Native
        );
    }

    #[test]
    fn test_delete_before_trailing_mention_is_native() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::Text, "Hi @Bo")
                .with_mentions(vec![Mention::new("n", "@Bo", 3)]),
            Block::with_id("b", BlockType::Text, "next"),
        ]);

        assert_eq!(editor.delete_forward(&Caret::new("a", 3)).unwrap(), Navigation::Native);
        assert_eq!(editor.document().len(), 2);

        let caret = moved_to(editor.delete_forward(&Caret::new("a", 6)).unwrap());
        assert_eq!(caret, Caret::new("a", 6));
        assert_eq!(summary(&editor), vec![(BlockType::Text, "Hi @Bonext".to_string())]);
        assert_eq!(editor.blocks()[0].mentions, vec![Mention::new("n", "@Bo", 3)]);
    }

    // ============ Enter tests ============

    #[test]
    fn test_enter_splits_and_focuses_new_block() {
        let mut editor = editor_with(vec![Block::with_id("a", BlockType::Quote, "Hello World")]);
        let caret = moved_to(editor.enter(&Caret::new("a", 5)).unwrap());

        assert_eq!(
            summary(&editor),
            vec![
                (BlockType::Quote, "Hello".to_string()),
                (BlockType::Text, " World".to_string())
            ]
        );
        assert_eq!(caret, Caret::new(editor.blocks()[1].id.clone(), 0));
        assert_eq!(editor.caret(), Some(&caret));
    }

    #[test]
    fn test_enter_in_list_continues_list() {
        let mut editor = editor_with(vec![Block::with_id("a", BlockType::BulletList, "one")]);
        editor.enter(&Caret::new("a", 3)).unwrap();
        assert_eq!(
            summary(&editor),
            vec![
                (BlockType::BulletList, "one".to_string()),
                (BlockType::BulletList, String::new())
            ]
        );
    }

    #[test]
    fn test_enter_in_empty_list_item_leaves_the_list() {
        let mut editor = editor_with(vec![Block::with_id("a", BlockType::Todo, "")]);
        let caret = moved_to(editor.enter(&Caret::new("a", 0)).unwrap());
        assert_eq!(caret, Caret::new("a", 0));
        assert_eq!(editor.blocks()[0].block_type, BlockType::Text);
        assert_eq!(editor.blocks()[0].checked, None);
        assert_eq!(editor.document().len(), 1);
    }

    #[test]
    fn test_enter_in_code_is_native() {
        let mut editor = editor_with(vec![Block::with_id("a", BlockType::Code, "fn x()")]);
        assert_eq!(editor.enter(&Caret::new("a", 2)).unwrap(), Navigation::Native);
    }

    #[test]
    fn test_keys_on_unknown_block() {
        let mut editor = editor_with(vec![Block::text("x")]);
        assert_eq!(
            editor.enter(&Caret::new("nope", 0)),
            Err(EditError::UnknownBlock(BlockId::from("nope")))
        );
    }

    // ============ Arrow tests ============

    #[test]
    fn test_arrows_move_focus_between_blocks() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::Text, "abcdefgh"),
            Block::with_id("d", BlockType::Divider, ""),
            Block::with_id("b", BlockType::Text, "0123456789"),
        ]);
        let measure = MonospaceMeasure::layout(editor.blocks(), 10, 10.0, 20.0);

        let nav = editor.arrow_vertical(&Caret::new("a", 4), VerticalDirection::Down, &measure);
        assert_eq!(nav, Navigation::Moved(Caret::new("b", 4)));
        assert_eq!(editor.caret(), Some(&Caret::new("b", 4)));

        assert_eq!(
            editor.arrow_left(&Caret::new("b", 0)),
            Navigation::Moved(Caret::new("a", 8))
        );
        assert_eq!(editor.arrow_right(&Caret::new("a", 3)), Navigation::Native);
    }

    #[test]
    fn test_arrow_right_before_trailing_mention_stays_in_block() {
        let mut editor = editor_with(vec![
            Block::with_id("a", BlockType::Text, "Hi @Bo")
                .with_mentions(vec![Mention::new("n", "@Bo", 3)]),
            Block::with_id("b", BlockType::Text, "next"),
        ]);

        assert_eq!(editor.focus(Caret::new("a", 6)).unwrap(), Caret::new("a", 6));
        assert_eq!(editor.arrow_right(&Caret::new("a", 3)), Navigation::Native);
        assert_eq!(
            editor.arrow_right(&Caret::new("a", 6)),
            Navigation::Moved(Caret::new("b", 0))
        );
        assert_eq!(
            editor.arrow_left(&Caret::new("b", 0)),
            Navigation::Moved(Caret::new("a", 6))
        );
    }
}
