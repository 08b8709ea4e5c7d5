//! Keeping mention and formatting ranges attached to their text across
//! edits.

use xi_rope::delta::Transformer;
use xi_rope::{Delta, RopeInfo};

use crate::models::{Annotation, Mention};
use crate::text::{byte_offset, char_offset};

/// Carry annotation ranges of `old_content` through `delta`.
///
/// The start sticks after text inserted at it. The end sticks before text
/// inserted at it unless [`Annotation::grows_at_end`], so typing right after
/// bold text stays bold but typing after a mention or link stays outside.
/// Ranges come back in `new_content` character offsets and are not yet
/// checked against the new content.
pub fn transform_ranges<A: Annotation>(
    items: &[A],
    delta: &Delta<RopeInfo>,
    old_content: &str,
    new_content: &str,
) -> Vec<A> {
    let mut transformer = Transformer::new(delta);
    items
        .iter()
        .map(|item| {
            let range = item.range();
            let start = transformer.transform(byte_offset(old_content, range.start), true);
            let end =
                transformer.transform(byte_offset(old_content, range.end), item.grows_at_end());
            let mut moved = item.clone();
            moved.set_range(char_offset(new_content, start)..char_offset(new_content, end.max(start)));
            moved
        })
        .collect()
}

/// [`transform_ranges`] for mentions, which never grow
pub fn transform_mentions(
    mentions: &[Mention],
    delta: &Delta<RopeInfo>,
    old_content: &str,
    new_content: &str,
) -> Vec<Mention> {
    transform_ranges(mentions, delta, old_content, new_content)
}

/// Keep only mentions whose slice of `content` still equals their label.
/// Returns the survivors and the number dropped.
pub fn revalidate(mentions: Vec<Mention>, content: &str) -> (Vec<Mention>, usize) {
    let before = mentions.len();
    let kept: Vec<Mention> = mentions
        .into_iter()
        .filter(|m| {
            let valid = m.is_valid_in(content);
            if !valid {
                log::debug!("dropping mention {:?}, its text was edited", m.label);
            }
            valid
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Link, Mark, MarkKind};
    use xi_rope::Rope;
    use xi_rope::delta::Builder;

    fn edit(content: &str, range: std::ops::Range<usize>, text: &str) -> (Delta<RopeInfo>, String) {
        let mut builder = Builder::new(content.len());
        builder.replace(range, Rope::from(text));
        let delta = builder.build();
        let new = delta.apply(&Rope::from(content)).to_string();
        (delta, new)
    }

    #[test]
    fn test_insert_before_mention_shifts_it() {
        let old = "Hi @Bo!";
        let (delta, new) = edit(old, 0..0, "Oh, ");
        let moved = transform_mentions(&[Mention::new("n", "@Bo", 3)], &delta, old, &new);
        assert_eq!(moved, vec![Mention::new("n", "@Bo", 7)]);
        assert_eq!(revalidate(moved, &new).1, 0);
    }

    #[test]
    fn test_insert_at_edges_stays_outside() {
        let old = "@Bo";
        let (delta, new) = edit(old, 0..0, "x");
        let moved = transform_mentions(&[Mention::new("n", "@Bo", 0)], &delta, old, &new);
        assert_eq!(moved, vec![Mention::new("n", "@Bo", 1)]);

        let (delta, new) = edit(old, 3..3, "y");
        let moved = transform_mentions(&[Mention::new("n", "@Bo", 0)], &delta, old, &new);
        assert_eq!(moved, vec![Mention::new("n", "@Bo", 0)]);
        assert_eq!(new, "@Boy");
    }

    #[test]
    fn test_edit_inside_mention_invalidates_it() {
        let old = "Hi @Bo!";
        let (delta, new) = edit(old, 4..5, "J");
        let moved = transform_mentions(&[Mention::new("n", "@Bo", 3)], &delta, old, &new);
        let (kept, dropped) = revalidate(moved, &new);
        assert!(kept.is_empty());
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_marks_grow_at_end_links_do_not() {
        let old = "bold link";
        let (delta, new) = edit(old, 4..4, "er");
        let marks = transform_ranges(&[Mark::new(MarkKind::Bold, 0..4)], &delta, old, &new);
        assert_eq!(marks, vec![Mark::new(MarkKind::Bold, 0..6)]);

        let (delta, new) = edit(old, 9..9, "s");
        let links = transform_ranges(&[Link::new("/l", 5..9)], &delta, old, &new);
        assert_eq!(links, vec![Link::new("/l", 5..9)]);
        assert_eq!(new, "bold links");
    }

    #[test]
    fn test_deleting_marked_text_empties_the_mark() {
        let old = "a bc d";
        let (delta, new) = edit(old, 2..4, "");
        let marks = transform_ranges(&[Mark::new(MarkKind::Code, 2..4)], &delta, old, &new);
        assert_eq!(marks, vec![Mark::new(MarkKind::Code, 2..2)]);
        assert!(!marks[0].is_valid_in(&new));
    }

    #[test]
    fn test_multibyte_text_before_mention() {
        let old = "é @Bo";
        let (delta, new) = edit(old, 0..0, "ü");
        let moved = transform_mentions(&[Mention::new("n", "@Bo", 2)], &delta, old, &new);
        assert_eq!(moved, vec![Mention::new("n", "@Bo", 3)]);
    }
}
