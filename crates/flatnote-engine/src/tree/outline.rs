use std::fmt::Write;

use super::{TextMark, TreeNode};
use crate::models::emoji_display_text;

/// Render a tree as an indented, one-node-per-line outline.
///
/// Used by the CLI `export --outline` view and by snapshot tests, where a
/// stable human-readable shape reads better than nested JSON.
pub fn format_tree(node: &TreeNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0);
    out
}

fn write_node(out: &mut String, node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{indent}{}", node.kind());

    match node {
        TreeNode::Heading { level, align, .. } => {
            let _ = write!(out, " level={level}");
            if let Some(align) = align {
                let _ = write!(out, " align={}", align.as_str());
            }
        }
        TreeNode::Paragraph {
            align: Some(align), ..
        } => {
            let _ = write!(out, " align={}", align.as_str());
        }
        TreeNode::TaskItem { checked, .. } => {
            let _ = write!(out, " checked={checked}");
        }
        TreeNode::CodeBlock {
            language: Some(language),
            ..
        } => {
            let _ = write!(out, " language={language}");
        }
        TreeNode::Text { text, marks } => {
            let _ = write!(out, " {text:?}");
            let names: Vec<String> = marks.iter().map(mark_name).collect();
            if !names.is_empty() {
                let _ = write!(out, " [{}]", names.join(", "));
            }
        }
        TreeNode::Emoji { attrs } => {
            let _ = write!(out, " {:?}", emoji_display_text(attrs));
        }
        TreeNode::Mention { id, label } => {
            let _ = write!(out, " id={id} label={label:?}");
        }
        TreeNode::Media { src, title, .. } => {
            let _ = write!(out, " src={src:?}");
            if let Some(title) = title {
                let _ = write!(out, " title={title:?}");
            }
        }
        TreeNode::Asset { asset_id, media_type, .. } => {
            let _ = write!(out, " asset={asset_id} type={media_type}");
        }
        TreeNode::Other { text: Some(text), .. } => {
            let _ = write!(out, " {text:?}");
        }
        _ => {}
    }
    out.push('\n');

    for child in node.children() {
        write_node(out, child, depth + 1);
    }
}

fn mark_name(mark: &TextMark) -> String {
    match mark {
        TextMark::Link { href, .. } => format!("link={href}"),
        TextMark::Format { kind, .. } => kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MarkKind, TextAlign};

    #[test]
    fn test_format_tree_outline() {
        let tree = TreeNode::Doc(vec![
            TreeNode::heading(1, vec![TreeNode::text("Title")]),
            TreeNode::paragraph(vec![
                TreeNode::text("Hi "),
                TreeNode::mention("n1", "@Bo"),
            ]),
            TreeNode::HorizontalRule,
        ]);

        assert_eq!(
            format_tree(&tree),
            "doc\n  heading level=1\n    text \"Title\"\n  paragraph\n    text \"Hi \"\n    mention id=n1 label=\"@Bo\"\n  horizontalRule\n"
        );
    }

    #[test]
    fn test_outline_shows_marks_and_align() {
        let tree = TreeNode::Paragraph {
            align: Some(TextAlign::Right),
            content: vec![TreeNode::styled(
                "go",
                vec![TextMark::link("/x"), TextMark::format(MarkKind::Italic)],
            )],
        };

        assert_eq!(
            format_tree(&tree),
            "paragraph align=right\n  text \"go\" [link=/x, italic]\n"
        );
    }
}
