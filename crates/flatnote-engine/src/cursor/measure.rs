//! Text geometry, injected by the host.
//!
//! The navigation engine never inspects a live rendering surface. Everything
//! it needs to know about layout comes through [`TextMeasure`]; any query may
//! answer `None` (block not rendered yet, layout not settled), in which case
//! the key event is suppressed.

use std::ops::Range;

use crate::models::{Block, BlockId};
use crate::text::char_len;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

pub trait TextMeasure {
    /// Bounding box of the whole rendered block
    fn block_rect(&self, block: &BlockId) -> Option<Rect>;

    /// Line height of the block's text
    fn line_height(&self, block: &BlockId) -> Option<f64>;

    /// Box of a character range; a collapsed range gives the caret box.
    fn range_rect(&self, block: &BlockId, range: Range<usize>) -> Option<Rect>;
}

#[derive(Debug, Clone)]
struct BlockLayout {
    id: BlockId,
    top: f64,
    /// Character length of each visual line
    lines: Vec<usize>,
}

impl BlockLayout {
    /// Visual (line, column) of a character offset. An offset at a soft wrap
    /// belongs to the start of the following line.
    fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        let mut consumed = 0;
        for (line, &len) in self.lines.iter().enumerate() {
            let is_last = line + 1 == self.lines.len();
            if offset < consumed + len || (offset == consumed + len && is_last) {
                return Some((line, offset - consumed));
            }
            consumed += len;
        }
        None
    }
}

/// Fixed-pitch layout: every character is `char_width` wide, lines hard-wrap
/// at `columns` characters and at `\n`, blocks stack top to bottom.
///
/// Suits terminal hosts, and gives tests deterministic geometry.
#[derive(Debug, Clone)]
pub struct MonospaceMeasure {
    char_width: f64,
    line_height: f64,
    columns: usize,
    layouts: Vec<BlockLayout>,
}

impl MonospaceMeasure {
    pub fn layout(blocks: &[Block], columns: usize, char_width: f64, line_height: f64) -> Self {
        let columns = columns.max(1);
        let mut top = 0.0;
        let layouts = blocks
            .iter()
            .map(|block| {
                let lines = wrap_lines(&block.content, columns);
                let layout = BlockLayout {
                    id: block.id.clone(),
                    top,
                    lines,
                };
                top += layout.lines.len() as f64 * line_height;
                layout
            })
            .collect();

        Self {
            char_width,
            line_height,
            columns,
            layouts,
        }
    }

    fn find(&self, id: &BlockId) -> Option<&BlockLayout> {
        self.layouts.iter().find(|l| &l.id == id)
    }

    fn caret_rect(&self, layout: &BlockLayout, offset: usize) -> Option<Rect> {
        let (line, col) = layout.locate(offset)?;
        Some(Rect::new(
            col as f64 * self.char_width,
            layout.top + line as f64 * self.line_height,
            0.0,
            self.line_height,
        ))
    }
}

/// Visual line lengths. Each `\n` counts toward the line it ends.
fn wrap_lines(content: &str, columns: usize) -> Vec<usize> {
    let mut lines = Vec::new();
    let mut segments = content.split('\n').peekable();
    while let Some(segment) = segments.next() {
        let newline = usize::from(segments.peek().is_some());
        let mut remaining = char_len(segment);
        while remaining > columns {
            lines.push(columns);
            remaining -= columns;
        }
        lines.push(remaining + newline);
    }
    lines
}

impl TextMeasure for MonospaceMeasure {
    fn block_rect(&self, block: &BlockId) -> Option<Rect> {
        let layout = self.find(block)?;
        Some(Rect::new(
            0.0,
            layout.top,
            self.columns as f64 * self.char_width,
            layout.lines.len() as f64 * self.line_height,
        ))
    }

    fn line_height(&self, block: &BlockId) -> Option<f64> {
        self.find(block).map(|_| self.line_height)
    }

    fn range_rect(&self, block: &BlockId, range: Range<usize>) -> Option<Rect> {
        let layout = self.find(block)?;
        let start = self.caret_rect(layout, range.start)?;
        if range.is_empty() {
            return Some(start);
        }
        let end = self.caret_rect(layout, range.end)?;
        if start.y == end.y {
            Some(Rect::new(start.x, start.y, end.x - start.x, self.line_height))
        } else {
            Some(Rect::new(
                0.0,
                start.y,
                self.columns as f64 * self.char_width,
                end.bottom() - start.y,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_lines() {
        assert_eq!(wrap_lines("", 4), vec![0]);
        assert_eq!(wrap_lines("abcdefghij", 4), vec![4, 4, 2]);
        assert_eq!(wrap_lines("ab\ncd", 4), vec![3, 2]);
        assert_eq!(wrap_lines("abcd", 4), vec![4]);
    }

    #[test]
    fn test_blocks_stack_vertically() {
        let blocks = vec![Block::text("abcdefghij"), Block::text("x")];
        let measure = MonospaceMeasure::layout(&blocks, 4, 10.0, 20.0);

        assert_eq!(
            measure.block_rect(&blocks[0].id),
            Some(Rect::new(0.0, 0.0, 40.0, 60.0))
        );
        assert_eq!(
            measure.block_rect(&blocks[1].id),
            Some(Rect::new(0.0, 60.0, 40.0, 20.0))
        );
    }

    #[test]
    fn test_caret_rects() {
        let blocks = vec![Block::text("abcdefghij")];
        let measure = MonospaceMeasure::layout(&blocks, 4, 10.0, 20.0);
        let id = &blocks[0].id;

        assert_eq!(measure.range_rect(id, 0..0), Some(Rect::new(0.0, 0.0, 0.0, 20.0)));
        // soft wrap boundary goes to the next line
        assert_eq!(measure.range_rect(id, 4..4), Some(Rect::new(0.0, 20.0, 0.0, 20.0)));
        assert_eq!(measure.range_rect(id, 10..10), Some(Rect::new(20.0, 40.0, 0.0, 20.0)));
        assert_eq!(measure.range_rect(id, 11..11), None);
        assert_eq!(measure.range_rect(id, 1..3), Some(Rect::new(10.0, 0.0, 20.0, 20.0)));
    }

    #[test]
    fn test_unknown_block_has_no_geometry() {
        let measure = MonospaceMeasure::layout(&[], 4, 10.0, 20.0);
        let id = BlockId::from("nope");
        assert_eq!(measure.block_rect(&id), None);
        assert_eq!(measure.line_height(&id), None);
    }
}
