use crate::models::{BlockType, MediaKind};

/// Menu grouping of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Style,
    Insert,
    Upload,
}

/// What selecting a command does to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Change the current block's type in place
    Retype(BlockType),
    InsertDivider,
    InsertTable { rows: usize, cols: usize },
    InsertMedia(MediaKind),
    /// Type the mention trigger so that target picking starts
    StartMention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandItem {
    pub id: &'static str,
    pub label: &'static str,
    pub group: CommandGroup,
    pub action: CommandAction,
}

const fn item(
    id: &'static str,
    label: &'static str,
    group: CommandGroup,
    action: CommandAction,
) -> CommandItem {
    CommandItem {
        id,
        label,
        group,
        action,
    }
}

/// The command menu, in display order
pub const COMMANDS: &[CommandItem] = &[
    item("text", "Text", CommandGroup::Style, CommandAction::Retype(BlockType::Text)),
    item("h1", "Heading 1", CommandGroup::Style, CommandAction::Retype(BlockType::H1)),
    item("h2", "Heading 2", CommandGroup::Style, CommandAction::Retype(BlockType::H2)),
    item("h3", "Heading 3", CommandGroup::Style, CommandAction::Retype(BlockType::H3)),
    item(
        "bullet-list",
        "Bullet List",
        CommandGroup::Style,
        CommandAction::Retype(BlockType::BulletList),
    ),
    item(
        "numbered-list",
        "Numbered List",
        CommandGroup::Style,
        CommandAction::Retype(BlockType::NumberedList),
    ),
    item("todo", "To-do List", CommandGroup::Style, CommandAction::Retype(BlockType::Todo)),
    item("quote", "Blockquote", CommandGroup::Style, CommandAction::Retype(BlockType::Quote)),
    item("code", "Code Block", CommandGroup::Style, CommandAction::Retype(BlockType::Code)),
    item("divider", "Divider", CommandGroup::Insert, CommandAction::InsertDivider),
    item(
        "table",
        "Table",
        CommandGroup::Insert,
        CommandAction::InsertTable { rows: 3, cols: 3 },
    ),
    item("mention", "Mention", CommandGroup::Insert, CommandAction::StartMention),
    item("image", "Image", CommandGroup::Upload, CommandAction::InsertMedia(MediaKind::Image)),
    item("video", "Video", CommandGroup::Upload, CommandAction::InsertMedia(MediaKind::Video)),
    item("audio", "Audio", CommandGroup::Upload, CommandAction::InsertMedia(MediaKind::Audio)),
];

/// Commands whose label contains `query`, case-insensitively
pub fn filter_commands(query: &str) -> Vec<&'static CommandItem> {
    let query = query.to_lowercase();
    COMMANDS
        .iter()
        .filter(|c| c.label.to_lowercase().contains(&query))
        .collect()
}

pub fn find_command(id: &str) -> Option<&'static CommandItem> {
    COMMANDS.iter().find(|c| c.id == id)
}
