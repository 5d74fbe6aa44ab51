//! Line-oriented command parsing for the interactive editor.

use cg_core::LockAxis;
use cg_editor::Operation;
use cg_editor::ops::{Delete, MoveToGrid, MoveToPixel, Resize, SetColor, SetOpacity, SetText};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a number: {0}")]
    NotANumber(String),

    #[error("Unknown command: {0}. Type 'help' for available commands.")]
    Unknown(String),
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    List,
    Grid,
    Find(String),
    Info(String),
    /// A layout edit built from command arguments.
    Edit(Operation),
    /// Raw wire JSON: one operation or an array of them.
    Apply(String),
    Snapshot,
    Undo,
    Redo,
    History,
    Save,
    Reload,
    Exit,
    Empty,
}

const MOVE_USAGE: &str = "move <element-id> <grid-id> [alignment] [--lock-h|--lock-v]";
const MOVEPX_USAGE: &str = "movepx <element-id> <x> <y>";
const RESIZE_USAGE: &str = "resize <element-id> <width> <height>";
const OPACITY_USAGE: &str = "opacity <element-id> <value 0-1>";
const FILL_USAGE: &str = "fill <element-id> <red> <green> <blue> [alpha]";
const TEXT_USAGE: &str = "text <element-id> <new text>";
const DELETE_USAGE: &str = "delete <element-id> [reason]";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (cmd, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(c, r)| (c, r.trim()));
        let args: Vec<&str> = rest.split_whitespace().collect();

        let cmd = match cmd.to_ascii_lowercase().as_str() {
            "" => Command::Empty,
            "help" | "?" => Command::Help,
            "list" | "ls" => Command::List,
            "grid" => Command::Grid,
            "find" => Command::Find(one(&args, "find <grid-id>  (e.g., find C-5)")?),
            "info" => Command::Info(one(&args, "info <element-id>")?),
            "move" => parse_move(&args)?,
            "movepx" => {
                let [id, x, y] = exact::<3>(&args, MOVEPX_USAGE)?;
                Command::Edit(Operation::MoveToPixel(MoveToPixel {
                    element_id: id.to_string(),
                    x: number(x)?,
                    y: number(y)?,
                }))
            }
            "resize" => {
                let [id, w, h] = exact::<3>(&args, RESIZE_USAGE)?;
                Command::Edit(Operation::Resize(Resize {
                    element_id: id.to_string(),
                    width: number(w)?,
                    height: number(h)?,
                }))
            }
            "opacity" => {
                let [id, v] = exact::<2>(&args, OPACITY_USAGE)?;
                Command::Edit(Operation::SetOpacity(SetOpacity {
                    element_id: id.to_string(),
                    opacity: number(v)?,
                }))
            }
            "fill" => parse_fill(&args)?,
            "text" => {
                let (id, text) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::Usage(TEXT_USAGE))?;
                Command::Edit(Operation::SetText(SetText {
                    element_id: id.to_string(),
                    new_text: text.trim().to_string(),
                }))
            }
            "delete" | "rm" => {
                let (id, reason) = rest
                    .split_once(char::is_whitespace)
                    .map_or((rest, ""), |(id, r)| (id, r.trim()));
                if id.is_empty() {
                    return Err(CommandError::Usage(DELETE_USAGE));
                }
                Command::Edit(Operation::Delete(Delete {
                    element_id: id.to_string(),
                    reason: (!reason.is_empty()).then(|| reason.to_string()),
                }))
            }
            "apply" => {
                if rest.is_empty() {
                    return Err(CommandError::Usage(
                        "apply <json>  (e.g., apply {\"function\": \"delete_element\", \"args\": {\"elementId\": \"b6658a97\"}})",
                    ));
                }
                Command::Apply(rest.to_string())
            }
            "snapshot" => Command::Snapshot,
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "history" => Command::History,
            "save" => Command::Save,
            "reload" => Command::Reload,
            "exit" | "quit" | "q" => Command::Exit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(cmd)
    }
}

fn one(args: &[&str], usage: &'static str) -> Result<String, CommandError> {
    match args {
        [a] => Ok((*a).to_string()),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn exact<'a, const N: usize>(args: &[&'a str], usage: &'static str) -> Result<[&'a str; N], CommandError> {
    args.try_into().map_err(|_| CommandError::Usage(usage))
}

fn number(s: &str) -> Result<f64, CommandError> {
    s.parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| CommandError::NotANumber(s.to_string()))
}

fn parse_move(args: &[&str]) -> Result<Command, CommandError> {
    let mut lock_axis = None;
    let mut positional = Vec::with_capacity(3);
    for arg in args {
        match *arg {
            "--lock-h" => lock_axis = Some(LockAxis::Horizontal),
            "--lock-v" => lock_axis = Some(LockAxis::Vertical),
            flag if flag.starts_with("--") => return Err(CommandError::Usage(MOVE_USAGE)),
            value => positional.push(value),
        }
    }
    let (id, cell, alignment) = match positional.as_slice() {
        [id, cell] => (id, cell, None),
        [id, cell, align] => (id, cell, Some(align.to_string())),
        _ => return Err(CommandError::Usage(MOVE_USAGE)),
    };
    Ok(Command::Edit(Operation::MoveToGrid(MoveToGrid {
        element_id: id.to_string(),
        grid_cell: cell.to_ascii_uppercase(),
        alignment,
        lock_axis,
    })))
}

fn parse_fill(args: &[&str]) -> Result<Command, CommandError> {
    let (id, channels) = match args {
        [id, r, g, b] => (id, [r, g, b, &"1"]),
        [id, r, g, b, a] => (id, [r, g, b, a]),
        _ => return Err(CommandError::Usage(FILL_USAGE)),
    };
    let [red, green, blue, alpha] = [
        number(channels[0])?,
        number(channels[1])?,
        number(channels[2])?,
        number(channels[3])?,
    ];
    Ok(Command::Edit(Operation::SetFill(SetColor {
        element_id: id.to_string(),
        red,
        green,
        blue,
        alpha: Some(alpha),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(line: &str) -> Result<Command, CommandError> {
        line.parse()
    }

    #[test]
    fn aliases() {
        assert_eq!(parse("ls"), Ok(Command::List));
        assert_eq!(parse("?"), Ok(Command::Help));
        assert_eq!(parse("  Q "), Ok(Command::Exit));
        assert_eq!(parse(""), Ok(Command::Empty));
    }

    #[test]
    fn move_with_flags() {
        assert_eq!(
            parse("move b6658a97 d-8 --lock-h"),
            Ok(Command::Edit(Operation::MoveToGrid(MoveToGrid {
                element_id: "b6658a97".into(),
                grid_cell: "D-8".into(),
                alignment: None,
                lock_axis: Some(LockAxis::Horizontal),
            })))
        );
        let Ok(Command::Edit(Operation::MoveToGrid(mv))) = parse("move b66 C-5 top-left") else {
            panic!("expected a grid move");
        };
        assert_eq!(mv.alignment.as_deref(), Some("top-left"));
        assert_eq!(parse("move b66"), Err(CommandError::Usage(MOVE_USAGE)));
        assert_eq!(parse("move b66 C-5 --lock-x"), Err(CommandError::Usage(MOVE_USAGE)));
    }

    #[test]
    fn numeric_args() {
        assert_eq!(
            parse("resize c0ffee01 200 80.5"),
            Ok(Command::Edit(Operation::Resize(Resize {
                element_id: "c0ffee01".into(),
                width: 200.0,
                height: 80.5,
            })))
        );
        assert_eq!(parse("movepx a 1 x"), Err(CommandError::NotANumber("x".into())));
        assert_eq!(parse("opacity a NaN"), Err(CommandError::NotANumber("NaN".into())));
        assert_eq!(parse("opacity a"), Err(CommandError::Usage(OPACITY_USAGE)));
    }

    #[test]
    fn free_text_arguments() {
        assert_eq!(
            parse("text b66  Summer   Sale "),
            Ok(Command::Edit(Operation::SetText(SetText {
                element_id: "b66".into(),
                new_text: "Summer   Sale".into(),
            })))
        );
        assert_eq!(
            parse("delete c0ffee01 off brand"),
            Ok(Command::Edit(Operation::Delete(Delete {
                element_id: "c0ffee01".into(),
                reason: Some("off brand".into()),
            })))
        );
        let Ok(Command::Edit(Operation::Delete(d))) = parse("rm c0ffee01") else {
            panic!("expected a delete");
        };
        assert_eq!(d.reason, None);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(
            parse("annotate").unwrap_err().to_string(),
            "Unknown command: annotate. Type 'help' for available commands."
        );
    }
}
