use std::ops::Range;

use xi_rope::delta::{DeltaElement, Transformer};
use xi_rope::{Delta, Rope, RopeInfo};

use crate::convert::ConvertOptions;
use crate::cursor::{Caret, InlineSnapshot, NavigationSettings};
use crate::editing::commands::{caret_after, compile_command};
use crate::editing::mentions::{revalidate, transform_mentions, transform_ranges};
use crate::editing::{Cmd, DocumentSink, EditError, Patch, TargetNavigator};
use crate::models::{
    Annotation, Block, BlockId, BlockType, Document, Link, Mark, MarkKind, MediaRef, Mention,
    TablePayload, TextAlign,
};
use crate::suggest::{
    CommandAction, CommandItem, MentionTarget, Trigger, TriggerKind, TriggerSettings,
    detect_trigger, filter_commands, filter_targets,
};
use crate::text::{byte_offset, char_offset};

/// Tunables of the editor controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorOptions {
    pub navigation: NavigationSettings,
    pub triggers: TriggerSettings,
    pub convert: ConvertOptions,
}

/// A trigger occurrence the user dismissed
#[derive(Debug, Clone, PartialEq)]
struct Dismissed {
    block: BlockId,
    start: usize,
    trigger: char,
}

/// Controller owning the document being edited.
///
/// Every input event maps to one `&mut self` call that finishes all of its
/// bookkeeping before returning: the content edit, mention transform and
/// revalidation, then trigger detection. Hosts never mutate the document
/// directly.
#[derive(Debug, Clone)]
pub struct Editor {
    pub(crate) document: Document,
    pub(crate) options: EditorOptions,
    pub(crate) caret: Option<Caret>,
    pub(crate) trigger: Option<Trigger>,
    dismissed: Option<Dismissed>,
}

impl Editor {
    pub fn new(document: Document) -> Self {
        Self::with_options(document, EditorOptions::default())
    }

    pub fn with_options(document: Document, options: EditorOptions) -> Self {
        Self {
            document,
            options,
            caret: None,
            trigger: None,
            dismissed: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn blocks(&self) -> &[Block] {
        self.document.blocks()
    }

    pub fn version(&self) -> u64 {
        self.document.version()
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Where the caret currently is, if any block has focus
    pub fn caret(&self) -> Option<&Caret> {
        self.caret.as_ref()
    }

    /// The live suggestion trigger, if any
    pub fn trigger(&self) -> Option<&Trigger> {
        self.trigger.as_ref()
    }

    pub(crate) fn locate(&self, id: &BlockId) -> Result<(usize, &Block), EditError> {
        let index = self
            .document
            .index_of(id)
            .ok_or_else(|| EditError::UnknownBlock(id.clone()))?;
        Ok((index, &self.document.blocks()[index]))
    }

    pub(crate) fn editable(&self, id: &BlockId) -> Result<(usize, &Block), EditError> {
        let (index, block) = self.locate(id)?;
        if !block.block_type.is_text_bearing() {
            return Err(EditError::NotEditable(id.clone()));
        }
        Ok((index, block))
    }

    /// Move focus to `caret`. The offset is resolved so that it never sits
    /// inside a mention. A live trigger the caret has left is dropped.
    pub fn focus(&mut self, caret: Caret) -> Result<Caret, EditError> {
        let (_, block) = self.editable(&caret.block)?;
        let resolved = Caret::new(
            caret.block.clone(),
            InlineSnapshot::from_block(block).resolve(caret.offset),
        );

        if let Some(trigger) = &self.trigger {
            let range = trigger.range();
            let inside = trigger.block == resolved.block
                && resolved.offset > range.start
                && resolved.offset <= range.end;
            if !inside {
                self.trigger = None;
            }
        }
        self.caret = Some(resolved.clone());
        Ok(resolved)
    }

    /// Focus left the editor: drops the caret and cancels any suggestion.
    pub fn blur(&mut self) {
        self.cancel_suggestion();
        self.caret = None;
    }

    pub(crate) fn move_caret(&mut self, caret: Caret) {
        if self.trigger.as_ref().is_some_and(|t| t.block != caret.block) {
            self.trigger = None;
        }
        self.caret = Some(caret);
    }

    /// Apply a content edit to one block.
    pub fn apply(&mut self, cmd: Cmd) -> Result<Patch, EditError> {
        let (_, block) = self.editable(cmd.block())?;
        let id = block.id.clone();

        let delta = compile_command(block, &cmd)?;
        let caret = caret_after(block, &cmd)?;
        let old_content = block.content.clone();
        let new_content = delta.apply(&Rope::from(old_content.as_str())).to_string();

        let moved = transform_mentions(&block.mentions, &delta, &old_content, &new_content);
        let (mentions, dropped_mentions) = revalidate(moved, &new_content);
        let marks = transform_ranges(&block.marks, &delta, &old_content, &new_content);
        let links = transform_ranges(&block.links, &delta, &old_content, &new_content);
        let emojis = transform_ranges(&block.emojis, &delta, &old_content, &new_content);
        let changed = changed_ranges(&delta, &new_content);

        self.document.update(&id, |b| {
            b.content = new_content;
            b.mentions = mentions;
            b.marks = marks;
            b.links = links;
            b.emojis = emojis;
            b.normalize();
        });
        self.transform_dismissed(&id, &delta, &old_content);
        self.caret = Some(Caret::new(id.clone(), caret));
        self.trigger = self.detect(&id, caret);

        Ok(Patch {
            block: id,
            changed,
            new_selection: caret..caret,
            version: self.document.version(),
            dropped_mentions,
            trigger: self.trigger.clone(),
        })
    }

    fn detect(&self, id: &BlockId, caret: usize) -> Option<Trigger> {
        let block = self.document.get(id)?;
        let trigger = detect_trigger(block, caret, &self.options.triggers)?;
        let dismissed = self
            .dismissed
            .as_ref()
            .is_some_and(|d| d.block == trigger.block && d.start == trigger.start);
        if dismissed {
            log::debug!("trigger at {} in {} was dismissed", trigger.start, trigger.block);
            return None;
        }
        Some(trigger)
    }

    /// Follow a dismissed trigger through an edit; forget it once its
    /// trigger character is gone.
    fn transform_dismissed(&mut self, id: &BlockId, delta: &Delta<RopeInfo>, old_content: &str) {
        let Some(dismissed) = self.dismissed.as_mut().filter(|d| &d.block == id) else {
            return;
        };
        let Some(block) = self.document.get(id) else {
            self.dismissed = None;
            return;
        };

        let byte = Transformer::new(delta).transform(byte_offset(old_content, dismissed.start), true);
        let start = char_offset(&block.content, byte);
        if block.content.chars().nth(start) == Some(dismissed.trigger) {
            dismissed.start = start;
        } else {
            self.dismissed = None;
        }
    }

    /// Set the checked state of a todo block.
    pub fn set_checked(&mut self, id: &BlockId, checked: bool) -> Result<(), EditError> {
        let (_, block) = self.locate(id)?;
        if block.block_type != BlockType::Todo {
            return Err(EditError::WrongBlockType {
                block: id.clone(),
                expected: BlockType::Todo,
                actual: block.block_type,
            });
        }
        self.document.update(id, |b| b.checked = Some(checked));
        Ok(())
    }

    /// Change a text-bearing block's type in place.
    pub fn retype(&mut self, id: &BlockId, block_type: BlockType) -> Result<(), EditError> {
        self.editable(id)?;
        self.document.update(id, |b| b.retype(block_type));
        Ok(())
    }

    // ============ Formatting ============

    /// Block whose inline content may carry formatting, with `range` checked
    /// against it
    fn formattable(&self, id: &BlockId, range: &Range<usize>) -> Result<&Block, EditError> {
        let (_, block) = self.editable(id)?;
        if !block.block_type.supports_mentions() {
            return Err(EditError::WrongBlockType {
                block: id.clone(),
                expected: BlockType::Text,
                actual: block.block_type,
            });
        }
        if range.start >= range.end || range.end > block.len() {
            return Err(EditError::InvalidRange {
                block: id.clone(),
                range: range.clone(),
            });
        }
        Ok(block)
    }

    /// Bold, italic, ... over `range`: removed when the whole range already
    /// has it, added otherwise. Returns whether the range now has the mark.
    pub fn toggle_mark(
        &mut self,
        id: &BlockId,
        range: Range<usize>,
        kind: MarkKind,
    ) -> Result<bool, EditError> {
        let block = self.formattable(id, &range)?;
        let covered = block
            .marks
            .iter()
            .any(|m| m.kind == kind && m.start <= range.start && range.end <= m.end);

        self.document.update(id, |b| {
            let (same, mut others): (Vec<Mark>, Vec<Mark>) =
                b.marks.drain(..).partition(|m| m.kind == kind);
            if covered {
                others.extend(same.iter().flat_map(|m| clip_out(m, &range)));
            } else {
                others.extend(same);
                others.push(Mark::new(kind, range.clone()));
            }
            b.marks = others;
            b.normalize_formatting();
        });
        Ok(!covered)
    }

    /// Link `range` to `href`, replacing any link it overlaps. `None`
    /// unlinks the range.
    pub fn set_link(
        &mut self,
        id: &BlockId,
        range: Range<usize>,
        href: Option<&str>,
    ) -> Result<(), EditError> {
        self.formattable(id, &range)?;
        self.document.update(id, |b| {
            let mut links: Vec<Link> = b.links.iter().flat_map(|l| clip_out(l, &range)).collect();
            if let Some(href) = href.filter(|h| !h.is_empty()) {
                links.push(Link::new(href, range.clone()));
            }
            b.links = links;
            b.normalize_formatting();
        });
        Ok(())
    }

    /// Align a paragraph, heading or quote. `None` restores the default.
    pub fn set_text_align(&mut self, id: &BlockId, align: Option<TextAlign>) -> Result<(), EditError> {
        let (_, block) = self.locate(id)?;
        let alignable = matches!(
            block.block_type,
            BlockType::Text | BlockType::H1 | BlockType::H2 | BlockType::H3 | BlockType::Quote
        );
        if !alignable {
            return Err(EditError::WrongBlockType {
                block: id.clone(),
                expected: BlockType::Text,
                actual: block.block_type,
            });
        }
        self.document.update(id, |b| b.text_align = align);
        Ok(())
    }

    /// Hand the current block sequence to a persistence collaborator.
    pub fn save<S: DocumentSink>(&self, sink: &mut S) -> Result<(), S::Error> {
        sink.persist(self.document.blocks())
    }

    /// Follow the mention under `offset`, if there is one.
    pub fn activate_mention(
        &self,
        id: &BlockId,
        offset: usize,
        navigator: &mut impl TargetNavigator,
    ) -> Result<bool, EditError> {
        let (_, block) = self.locate(id)?;
        match block.valid_mentions().find(|m| m.range().contains(&offset)) {
            Some(mention) => {
                navigator.navigate_to(&mention.target_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // ============ Suggestions ============

    /// Targets matching the live mention query
    pub fn mention_candidates<'a>(&self, targets: &'a [MentionTarget]) -> Vec<&'a MentionTarget> {
        match &self.trigger {
            Some(t) if t.kind == TriggerKind::Mention => {
                filter_targets(targets, &t.query, self.options.triggers.max_mention_results)
            }
            _ => Vec::new(),
        }
    }

    /// Commands matching the live command query
    pub fn command_candidates(&self) -> Vec<&'static CommandItem> {
        match &self.trigger {
            Some(t) if t.kind == TriggerKind::Command => filter_commands(&t.query),
            _ => Vec::new(),
        }
    }

    fn live_trigger(&self, kind: TriggerKind) -> Result<Trigger, EditError> {
        self.trigger
            .clone()
            .filter(|t| t.kind == kind)
            .ok_or(EditError::NoActiveTrigger(kind))
    }

    /// Replace the trigger and query with a mention of `target`, followed by
    /// a space.
    pub fn select_target(&mut self, target: &MentionTarget) -> Result<Patch, EditError> {
        let trigger = self.live_trigger(TriggerKind::Mention)?;
        let label = format!("{}{}", self.options.triggers.mention_trigger, target.title);
        let mention = Mention::new(target.id.clone(), label.clone(), trigger.start);

        let mut patch = self.apply(Cmd::ReplaceRange {
            block: trigger.block.clone(),
            range: trigger.range(),
            text: format!("{label} "),
        })?;
        self.document.update(&trigger.block, |b| {
            b.mentions.push(mention);
            b.normalize_mentions();
        });
        self.trigger = None;

        patch.version = self.document.version();
        patch.trigger = None;
        Ok(patch)
    }

    /// Remove the trigger and query, then run the command.
    ///
    /// Retyping keeps focus in place. Inserting a divider, table or media
    /// block adds a fresh text block after it and focuses that; an empty
    /// current block is replaced by the inserted block rather than kept.
    pub fn select_command(&mut self, item: &CommandItem) -> Result<Caret, EditError> {
        let trigger = self.live_trigger(TriggerKind::Command)?;
        let id = trigger.block.clone();
        self.apply(Cmd::DeleteRange {
            block: id.clone(),
            range: trigger.range(),
        })?;
        self.trigger = None;
        let caret = Caret::new(id.clone(), trigger.start);

        let inserted = match item.action {
            CommandAction::Retype(block_type) => {
                self.retype(&id, block_type)?;
                self.caret = Some(caret.clone());
                return Ok(caret);
            }
            CommandAction::StartMention => {
                let text = self.options.triggers.mention_trigger.to_string();
                self.apply(Cmd::InsertText {
                    block: id.clone(),
                    at: trigger.start,
                    text,
                })?;
                return Ok(Caret::new(id, trigger.start + 1));
            }
            CommandAction::InsertDivider => Block::new(BlockType::Divider, ""),
            CommandAction::InsertTable { rows, cols } => {
                Block::new(BlockType::Table, "").with_table(TablePayload::empty(rows, cols))
            }
            CommandAction::InsertMedia(kind) => {
                Block::new(kind.block_type(), "").with_media(MediaRef {
                    kind,
                    ..MediaRef::default()
                })
            }
        };

        Ok(self.insert_structural(&id, inserted))
    }

    /// Insert a non-text block at the current block, followed by a fresh
    /// text block that receives focus.
    fn insert_structural(&mut self, current: &BlockId, inserted: Block) -> Caret {
        let replace_current = self.document.get(current).is_some_and(|b| b.is_empty());
        let index = self.document.index_of(current).unwrap_or(0);

        let follow = Block::empty();
        let caret = Caret::new(follow.id.clone(), 0);
        self.document.insert(index + 1, inserted);
        self.document.insert(index + 2, follow);
        if replace_current {
            self.document.remove(current);
        }
        self.caret = Some(caret.clone());
        caret
    }

    /// Escape: close the suggestion without touching content. The same
    /// trigger occurrence stays closed while its character survives.
    pub fn cancel_suggestion(&mut self) {
        if let Some(trigger) = self.trigger.take() {
            let trigger_char = match trigger.kind {
                TriggerKind::Mention => self.options.triggers.mention_trigger,
                TriggerKind::Command => self.options.triggers.command_trigger,
            };
            self.dismissed = Some(Dismissed {
                block: trigger.block,
                start: trigger.start,
                trigger: trigger_char,
            });
        }
    }
}

/// What is left of `item` outside `cut`: nothing, one piece or two.
fn clip_out<A: Annotation>(item: &A, cut: &Range<usize>) -> Vec<A> {
    let range = item.range();
    if range.end <= cut.start || cut.end <= range.start {
        return vec![item.clone()];
    }
    [range.start..cut.start, cut.end..range.end]
        .into_iter()
        .filter(|piece| piece.start < piece.end)
        .map(|piece| {
            let mut kept = item.clone();
            kept.set_range(piece);
            kept
        })
        .collect()
}

/// Character ranges of `new_content` written by `delta`. A pure deletion
/// shows up as an empty range at the point of deletion.
fn changed_ranges(delta: &Delta<RopeInfo>, new_content: &str) -> Vec<Range<usize>> {
    let mut changed = Vec::new();
    let mut old_pos = 0;
    let mut new_pos = 0;

    for op in &delta.els {
        match op {
            DeltaElement::Copy(from, to) => {
                if *from > old_pos && !ends_with_insert(&changed, new_pos) {
                    changed.push(new_pos..new_pos);
                }
                new_pos += to - from;
                old_pos = *to;
            }
            DeltaElement::Insert(inserted) => {
                changed.push(new_pos..new_pos + inserted.len());
                new_pos += inserted.len();
            }
        }
    }
    if old_pos < delta.base_len && !ends_with_insert(&changed, new_pos) {
        changed.push(new_pos..new_pos);
    }

    changed
        .into_iter()
        .map(|r| char_offset(new_content, r.start)..char_offset(new_content, r.end))
        .collect()
}

fn ends_with_insert(changed: &[Range<usize>], new_pos: usize) -> bool {
    changed.last().is_some_and(|r| r.end == new_pos)
}
