//! Keyboard command handling for the console front end.
//!
//! Each stdin line is one command. Parsing is separate from the reader
//! thread so the key map can be tested without a terminal.

use crate::app::{AppMessage, UserCommand};
use log::{debug, warn};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;

pub const HELP: &str = "\
n next | p previous | s skip | <enter> toggle pause | pause | resume | x stop | start
d delete | r rotate | h flip horizontal | v flip vertical | 0 reset view
b skip break | c clear history | f <folder> choose folder | ? status | q quit
settings open settings | set <key> <value> edit one | done apply and close";

/// Maps one input line to a message. Unknown input yields `None`.
pub fn parse_command(line: &str) -> Option<AppMessage> {
    let line = line.trim();
    if let Some(folder) = line.strip_prefix("f ") {
        let folder = folder.trim();
        return (!folder.is_empty())
            .then(|| AppMessage::User(UserCommand::ChooseFolder(PathBuf::from(folder))));
    }
    if let Some(rest) = line.strip_prefix("set ") {
        let (key, value) = rest.trim().split_once(' ')?;
        return Some(AppMessage::User(UserCommand::SetSetting {
            key: key.to_string(),
            value: value.trim().to_string(),
        }));
    }

    let command = match line {
        "n" | "next" => UserCommand::Next,
        "p" | "prev" | "previous" => UserCommand::Previous,
        "s" | "skip" => UserCommand::Skip,
        "" => UserCommand::TogglePause,
        "pause" => UserCommand::Pause,
        "resume" => UserCommand::Resume,
        "x" | "stop" => UserCommand::Stop,
        "start" => UserCommand::Start,
        "d" | "delete" => UserCommand::Delete,
        "r" | "rotate" => UserCommand::Rotate,
        "h" => UserCommand::FlipHorizontal,
        "v" => UserCommand::FlipVertical,
        "0" | "reset" => UserCommand::ResetTransform,
        "b" => UserCommand::SkipBreak,
        "c" => UserCommand::ClearHistory,
        "?" | "status" => UserCommand::Status,
        "settings" => UserCommand::OpenSettings,
        "done" | "apply" => UserCommand::CloseSettings,
        "q" | "quit" => return Some(AppMessage::Quit),
        _ => return None,
    };
    Some(AppMessage::User(command))
}

/// Reads commands from stdin on a dedicated thread.
///
/// End of input is treated as quit.
pub fn spawn_input_handler(sender: Sender<AppMessage>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            };
            match parse_command(&line) {
                Some(message) => {
                    if sender.send(message).is_err() {
                        return;
                    }
                }
                None => {
                    debug!("Unknown command {:?}", line);
                    println!("{}", HELP);
                }
            }
        }
        let _ = sender.send(AppMessage::Quit);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(line: &str) -> Option<UserCommand> {
        match parse_command(line) {
            Some(AppMessage::User(command)) => Some(command),
            _ => None,
        }
    }

    #[test]
    fn single_keys_map_to_commands() {
        assert_eq!(user("n"), Some(UserCommand::Next));
        assert_eq!(user("p"), Some(UserCommand::Previous));
        assert_eq!(user("  s  "), Some(UserCommand::Skip));
        assert_eq!(user(""), Some(UserCommand::TogglePause));
        assert_eq!(user("0"), Some(UserCommand::ResetTransform));
        assert_eq!(user("b"), Some(UserCommand::SkipBreak));
    }

    #[test]
    fn folder_command_takes_rest_of_line() {
        assert_eq!(
            user("f /refs/figure drawing"),
            Some(UserCommand::ChooseFolder(PathBuf::from("/refs/figure drawing")))
        );
        assert!(parse_command("f   ").is_none());
    }

    #[test]
    fn pause_and_resume_are_explicit() {
        assert_eq!(user("pause"), Some(UserCommand::Pause));
        assert_eq!(user("resume"), Some(UserCommand::Resume));
    }

    #[test]
    fn settings_commands() {
        assert_eq!(user("settings"), Some(UserCommand::OpenSettings));
        assert_eq!(
            user("set folder /refs/hands and feet"),
            Some(UserCommand::SetSetting {
                key: "folder".into(),
                value: "/refs/hands and feet".into(),
            })
        );
        assert_eq!(
            user("set display_time unlimited"),
            Some(UserCommand::SetSetting {
                key: "display_time".into(),
                value: "unlimited".into(),
            })
        );
        assert!(parse_command("set display_time").is_none());
        assert_eq!(user("done"), Some(UserCommand::CloseSettings));
    }

    #[test]
    fn quit_and_unknown() {
        assert!(matches!(parse_command("q"), Some(AppMessage::Quit)));
        assert!(parse_command("zoom").is_none());
    }
}
