//! Fixed token-sequence to editor-command mapping.
//!
//! The mapping is data (a const table), not control flow, so the whole
//! surface can be tested exhaustively. Unmapped sequences, including the
//! empty one, resolve to no command and are dropped silently.

use crate::engine::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorCommand {
    PreviousTab,
    NextTab,
    DocumentStart,
    DocumentEnd,
    CloseActiveDocument,
    Cut,
    Copy,
    Paste,
    Undo,
    Redo,
}

impl EditorCommand {
    pub fn describe(self) -> &'static str {
        match self {
            EditorCommand::PreviousTab => "Previous tab",
            EditorCommand::NextTab => "Next tab",
            EditorCommand::DocumentStart => "Top of document",
            EditorCommand::DocumentEnd => "Bottom of document",
            EditorCommand::CloseActiveDocument => "Close",
            EditorCommand::Cut => "Cut",
            EditorCommand::Copy => "Copy",
            EditorCommand::Paste => "Paste",
            EditorCommand::Undo => "Undo",
            EditorCommand::Redo => "Redo",
        }
    }
}

/// Receiver for dispatched commands, implemented by the host integration.
/// All commands are no-argument and act on the host's active target.
pub trait CommandSink: Send {
    fn execute(&mut self, command: EditorCommand);
}

/// Default sink for standalone use: records nothing, logs at debug.
#[derive(Debug, Default)]
pub struct LoggingCommandSink;

impl CommandSink for LoggingCommandSink {
    fn execute(&mut self, command: EditorCommand) {
        tracing::debug!(?command, "editor command (no host attached)");
    }
}

use Direction::{Down, Left, Right, Up};

pub const COMMAND_TABLE: [(&[Direction], EditorCommand); 10] = [
    (&[Left], EditorCommand::PreviousTab),
    (&[Right], EditorCommand::NextTab),
    (&[Up], EditorCommand::DocumentStart),
    (&[Down], EditorCommand::DocumentEnd),
    (&[Down, Right], EditorCommand::CloseActiveDocument),
    (&[Down, Left], EditorCommand::Cut),
    (&[Up, Left], EditorCommand::Copy),
    (&[Right, Down], EditorCommand::Paste),
    (&[Left, Right], EditorCommand::Undo),
    (&[Right, Left], EditorCommand::Redo),
];

/// Exact-match lookup of a finalized token sequence. Pure and total: every
/// input has a defined (possibly empty) outcome and no cross-call state.
pub fn command_for(tokens: &[Direction]) -> Option<EditorCommand> {
    COMMAND_TABLE
        .iter()
        .find_map(|(sequence, command)| (*sequence == tokens).then_some(*command))
}

/// Static help text listing every mapped gesture, shown by the host's
/// About entry.
pub fn about_text() -> String {
    let mut text = String::from("Mouse gestures:\n");
    for (sequence, command) in COMMAND_TABLE {
        let gesture = sequence
            .iter()
            .map(|dir| dir.label())
            .collect::<Vec<_>>()
            .join(", ");
        text.push_str(&format!("{}: {}\n", gesture, command.describe()));
    }
    text
}
