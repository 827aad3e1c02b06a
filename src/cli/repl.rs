//! Line commands of the interactive session

use std::path::PathBuf;

pub const HELP: &str = "\
Type an instruction to build or change the app, or a command:
  :history               list versions, newest first
  :restore <version>     check out a version (newer ones are kept)
  :show [path]           print a file (default: the primary file)
  :files                 list files in the working copy
  :edit <path> <file>    replace a file with the contents of a local file
  :checkpoint [label]    record the working copy as a version
  :export <file>         write all files into one text bundle
  :help                  this text
  :quit                  leave the session";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Instruction(String),
    History,
    Restore(String),
    Show(Option<String>),
    Files,
    Edit { path: String, source: PathBuf },
    Checkpoint(String),
    Export(PathBuf),
    Help,
    Quit,
    Empty,
    /// A `:command` that is unknown or missing its argument
    Invalid(String),
}

pub fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }

    let Some(command) = line.strip_prefix(':') else {
        return ReplCommand::Instruction(line.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (command, ""),
    };

    match (name, rest) {
        ("history" | "h", _) => ReplCommand::History,
        ("files" | "ls", _) => ReplCommand::Files,
        ("help" | "?", _) => ReplCommand::Help,
        ("quit" | "q" | "exit", _) => ReplCommand::Quit,
        ("show" | "cat", "") => ReplCommand::Show(None),
        ("show" | "cat", path) => ReplCommand::Show(Some(path.to_string())),
        ("checkpoint" | "save", label) => ReplCommand::Checkpoint(label.to_string()),
        ("restore" | "undo", "") => ReplCommand::Invalid("usage: :restore <version>".to_string()),
        ("restore" | "undo", id) => ReplCommand::Restore(id.to_string()),
        ("export", "") => ReplCommand::Invalid("usage: :export <file>".to_string()),
        ("export", file) => ReplCommand::Export(PathBuf::from(file)),
        ("edit", args) => match args.split_once(char::is_whitespace) {
            Some((path, source)) => ReplCommand::Edit {
                path: path.to_string(),
                source: PathBuf::from(source.trim()),
            },
            None => ReplCommand::Invalid("usage: :edit <path> <file>".to_string()),
        },
        (other, _) => ReplCommand::Invalid(format!("unknown command :{other} (try :help)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_an_instruction() {
        assert_eq!(
            parse_line("  add a dark mode toggle "),
            ReplCommand::Instruction("add a dark mode toggle".to_string())
        );
        assert_eq!(parse_line("   "), ReplCommand::Empty);
    }

    #[test]
    fn test_commands_with_arguments() {
        assert_eq!(
            parse_line(":restore v2-1700000000000"),
            ReplCommand::Restore("v2-1700000000000".to_string())
        );
        assert_eq!(
            parse_line(":show src/index.css"),
            ReplCommand::Show(Some("src/index.css".to_string()))
        );
        assert_eq!(parse_line(":show"), ReplCommand::Show(None));
        assert_eq!(
            parse_line(":checkpoint before refactor"),
            ReplCommand::Checkpoint("before refactor".to_string())
        );
        assert_eq!(
            parse_line(":edit src/App.jsx ./App.jsx"),
            ReplCommand::Edit {
                path: "src/App.jsx".to_string(),
                source: PathBuf::from("./App.jsx"),
            }
        );
    }

    #[test]
    fn test_missing_arguments_and_unknown_commands() {
        assert!(matches!(parse_line(":restore"), ReplCommand::Invalid(_)));
        assert!(matches!(parse_line(":export"), ReplCommand::Invalid(_)));
        assert!(matches!(parse_line(":edit only-path"), ReplCommand::Invalid(_)));
        assert!(matches!(parse_line(":frobnicate"), ReplCommand::Invalid(_)));
        assert_eq!(parse_line(":q"), ReplCommand::Quit);
    }
}
