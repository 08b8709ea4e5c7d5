//! Caret travel across block boundaries.
//!
//! Each block is edited in its own text region, so arrow keys at the edge
//! of one region have to hand the caret to the neighbouring region by hand.
//! Vertical moves keep the caret's horizontal position; horizontal moves
//! land on the neighbour's far boundary.
//!
//! Vertical transfer happens in two phases because geometry of the target
//! is only trustworthy once the host has laid it out after the focus change:
//! [`plan_vertical`] reads the source block and yields a [`PendingTransfer`],
//! and [`PendingTransfer::land`] reads the target after layout.

use crate::cursor::measure::{Rect, TextMeasure};
use crate::cursor::position::InlineSnapshot;
use crate::models::{Block, BlockId};

/// Caret location in the document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Caret {
    pub block: BlockId,
    pub offset: usize,
}

impl Caret {
    pub fn new(block: impl Into<BlockId>, offset: usize) -> Self {
        Self {
            block: block.into(),
            offset,
        }
    }
}

/// Outcome of a navigation key
#[derive(Debug, Clone, PartialEq)]
pub enum Navigation {
    /// Focus moved; place the caret here
    Moved(Caret),
    /// Not at a block edge; let the text region handle the key itself
    Native,
    /// Geometry unavailable; swallow the key
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalDirection {
    Up,
    Down,
}

/// Tunables of the edge-line heuristics
#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSettings {
    /// Blocks shorter than this many line heights count as single-line
    pub single_line_factor: f64,
    /// Extra slack, as a fraction of line height, when testing whether the
    /// caret sits on the edge line
    pub edge_padding_factor: f64,
    /// Blocks longer than this are not scanned when their start lies
    /// outside the landing line
    pub long_block_chars: usize,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            single_line_factor: 1.8,
            edge_padding_factor: 0.25,
            long_block_chars: 2000,
        }
    }
}

impl NavigationSettings {
    fn edge_band(&self, line_height: f64) -> f64 {
        line_height * (1.0 + self.edge_padding_factor)
    }
}

/// Vertical move waiting for the target block to be laid out
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransfer {
    pub target: BlockId,
    pub direction: VerticalDirection,
    /// Caret x captured in the source block
    pub x: f64,
}

/// First phase of a vertical move
#[derive(Debug, Clone, PartialEq)]
pub enum VerticalPlan {
    Transfer(PendingTransfer),
    Stay(Navigation),
}

fn find<'a>(blocks: &'a [Block], id: &BlockId) -> Option<(usize, &'a Block)> {
    blocks.iter().enumerate().find(|(_, b)| &b.id == id)
}

/// Nearest block in `direction` that can hold a caret. Dividers, tables and
/// media are stepped over.
fn neighbour(blocks: &[Block], index: usize, forward: bool) -> Option<&Block> {
    if forward {
        blocks[index + 1..].iter().find(|b| b.block_type.is_text_bearing())
    } else {
        blocks[..index]
            .iter()
            .rev()
            .find(|b| b.block_type.is_text_bearing())
    }
}

/// Whether the caret sits on the block's first (`Up`) or last (`Down`)
/// rendered line. `None` when geometry is missing.
pub fn is_on_edge_line(
    block: &Block,
    offset: usize,
    direction: VerticalDirection,
    measure: &impl TextMeasure,
    settings: &NavigationSettings,
) -> Option<bool> {
    if block.is_empty() {
        return Some(true);
    }
    let rect = measure.block_rect(&block.id)?;
    let line_height = measure.line_height(&block.id)?;
    if rect.height < settings.single_line_factor * line_height {
        return Some(true);
    }

    // the whole caret box has to fit inside the band at the edge
    let caret = measure.range_rect(&block.id, offset..offset)?;
    let band = settings.edge_band(line_height);
    Some(match direction {
        VerticalDirection::Up => caret.bottom() - rect.top() < band,
        VerticalDirection::Down => rect.bottom() - caret.top() < band,
    })
}

/// Decide whether ArrowUp/ArrowDown leaves the current block and, if so,
/// capture the caret x for landing.
pub fn plan_vertical(
    blocks: &[Block],
    caret: &Caret,
    direction: VerticalDirection,
    measure: &impl TextMeasure,
    settings: &NavigationSettings,
) -> VerticalPlan {
    let Some((index, block)) = find(blocks, &caret.block) else {
        return VerticalPlan::Stay(Navigation::Suppressed);
    };

    match is_on_edge_line(block, caret.offset, direction, measure, settings) {
        None => return VerticalPlan::Stay(Navigation::Suppressed),
        Some(false) => return VerticalPlan::Stay(Navigation::Native),
        Some(true) => {}
    }

    let Some(target) = neighbour(blocks, index, direction == VerticalDirection::Down) else {
        return VerticalPlan::Stay(Navigation::Native);
    };

    let x = measure
        .range_rect(&block.id, caret.offset..caret.offset)
        .or_else(|| measure.block_rect(&block.id))
        .map(|r| r.x);
    match x {
        Some(x) => VerticalPlan::Transfer(PendingTransfer {
            target: target.id.clone(),
            direction,
            x,
        }),
        None => VerticalPlan::Stay(Navigation::Suppressed),
    }
}

impl PendingTransfer {
    /// Second phase: pick the offset on the target's edge line closest to
    /// the captured x. Call only after the target has been laid out.
    pub fn land(
        &self,
        blocks: &[Block],
        measure: &impl TextMeasure,
        settings: &NavigationSettings,
    ) -> Navigation {
        let Some((_, block)) = find(blocks, &self.target) else {
            return Navigation::Suppressed;
        };
        let snapshot = InlineSnapshot::from_block(block);
        let boundary = match self.direction {
            VerticalDirection::Up => snapshot.len(),
            VerticalDirection::Down => 0,
        };
        let moved = |offset| Navigation::Moved(Caret::new(block.id.clone(), offset));

        if block.is_empty() {
            return moved(0);
        }
        let (Some(rect), Some(line_height)) =
            (measure.block_rect(&block.id), measure.line_height(&block.id))
        else {
            return Navigation::Suppressed;
        };

        let band = settings.edge_band(line_height);
        let (band_top, band_bottom) = match self.direction {
            VerticalDirection::Up => (rect.bottom() - band, rect.bottom()),
            VerticalDirection::Down => (rect.top(), rect.top() + band),
        };
        let in_band = |r: &Rect| r.top() >= band_top && r.bottom() <= band_bottom;

        if block.len() > settings.long_block_chars {
            let start_in_band = measure
                .range_rect(&block.id, 0..0)
                .is_some_and(|r| in_band(&r));
            if !start_in_band {
                log::debug!(
                    "block {} has {} chars, landing on its boundary",
                    block.id,
                    block.len()
                );
                return moved(boundary);
            }
        }

        let mut best: Option<(usize, f64)> = None;
        for stop in snapshot.caret_stops() {
            let Some(r) = measure.range_rect(&block.id, stop..stop) else {
                continue;
            };
            if !in_band(&r) {
                if self.direction == VerticalDirection::Down && r.top() > band_bottom {
                    break;
                }
                continue;
            }
            let distance = (r.x - self.x).abs();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((stop, distance));
            }
        }

        moved(best.map_or(boundary, |(stop, _)| stop))
    }
}

/// Both phases in one call, for hosts whose layout is already settled.
pub fn arrow_vertical(
    blocks: &[Block],
    caret: &Caret,
    direction: VerticalDirection,
    measure: &impl TextMeasure,
    settings: &NavigationSettings,
) -> Navigation {
    match plan_vertical(blocks, caret, direction, measure, settings) {
        VerticalPlan::Transfer(pending) => pending.land(blocks, measure, settings),
        VerticalPlan::Stay(navigation) => navigation,
    }
}

/// ArrowLeft: at the block start, jump to the end of the previous block.
pub fn arrow_left(blocks: &[Block], caret: &Caret) -> Navigation {
    let Some((index, block)) = find(blocks, &caret.block) else {
        return Navigation::Suppressed;
    };
    if !InlineSnapshot::from_block(block).is_at_start(caret.offset) {
        return Navigation::Native;
    }
    match neighbour(blocks, index, false) {
        Some(prev) => Navigation::Moved(Caret::new(prev.id.clone(), prev.len())),
        None => Navigation::Native,
    }
}

/// ArrowRight: at the block end, jump to the start of the next block.
pub fn arrow_right(blocks: &[Block], caret: &Caret) -> Navigation {
    let Some((index, block)) = find(blocks, &caret.block) else {
        return Navigation::Suppressed;
    };
    if !InlineSnapshot::from_block(block).is_at_end(caret.offset) {
        return Navigation::Native;
    }
    match neighbour(blocks, index, true) {
        Some(next) => Navigation::Moved(Caret::new(next.id.clone(), 0)),
        None => Navigation::Native,
    }
}
