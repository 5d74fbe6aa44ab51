//! Command line arguments

use clap::Parser;
use std::path::PathBuf;

/// Grid-addressed editor for canvas documents
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// canvas document to edit
    #[arg(default_value = "canvas-data.json")]
    pub document: PathBuf,

    /// directory for undo snapshots (defaults to the document's directory)
    #[arg(long)]
    pub history_dir: Option<PathBuf>,

    /// JSON file overriding layout defaults (image size, default cell, ...)
    #[arg(long)]
    pub defaults: Option<PathBuf>,

    /// display debug logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_canvas_data() {
        let args = CliArgs::parse_from(["cg"]);
        assert_eq!(args.document, PathBuf::from("canvas-data.json"));
        assert!(!args.verbose);
    }

    #[test]
    fn accepts_history_dir() {
        let args = CliArgs::parse_from(["cg", "doc.json", "--history-dir", "snaps", "-v"]);
        assert_eq!(args.history_dir, Some(PathBuf::from("snaps")));
        assert!(args.verbose);
    }
}
