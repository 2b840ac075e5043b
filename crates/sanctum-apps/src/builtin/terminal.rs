//! The terminal: a line-oriented command interpreter.

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::instance::AppInstance;
use crate::module::AppModule;

/// ANSI sequence that clears the screen and homes the cursor.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

const HELP: &str = "\
Available commands:
  help     - Show this help
  clear    - Clear terminal
  echo     - Echo text
  date     - Show current date
  whoami   - Show current user
  ls       - List files under a path
  cat      - Print a file
  write    - Write text to a file";

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalApp;

#[async_trait]
impl AppModule for TerminalApp {
    fn name(&self) -> &str {
        "terminal"
    }

    fn banner(&self) -> Option<String> {
        Some("Sanctum Terminal v1.0.0\nType \"help\" for available commands".to_owned())
    }

    async fn invoke(&self, instance: &AppInstance, input: &str) -> Result<String> {
        let mut words = input.split_whitespace();
        let Some(cmd) = words.next() else {
            return Ok(String::new());
        };
        let args: Vec<&str> = words.collect();
        tracing::trace!(app_id = %instance.app_id, cmd, "terminal command");

        let output = match cmd {
            "help" => HELP.to_owned(),
            "clear" => CLEAR_SCREEN.to_owned(),
            "echo" => args.join(" "),
            "date" => chrono::Local::now()
                .format("%a %b %e %Y %H:%M:%S %z")
                .to_string(),
            "whoami" => "user@sanctum".to_owned(),
            "ls" => match instance.api.fs_read() {
                None => "ls: file access not permitted".to_owned(),
                Some(fs) => {
                    let prefix = args.first().copied().unwrap_or("");
                    fs.list_directory(prefix).await?.join("\n")
                }
            },
            "cat" => match (instance.api.fs_read(), args.first()) {
                (None, _) => "cat: file access not permitted".to_owned(),
                (Some(_), None) => "usage: cat <path>".to_owned(),
                (Some(fs), Some(path)) => match fs.read_file(path).await {
                    Ok(content) => content,
                    Err(AppError::Store(e)) if e.is_not_found() => {
                        format!("cat: {path}: no such file")
                    }
                    Err(AppError::PermissionDenied { .. }) => {
                        format!("cat: {path}: permission denied")
                    }
                    Err(e) => return Err(e),
                },
            },
            "write" => match (instance.api.fs_write(), args.split_first()) {
                (None, _) => "write: file access not permitted".to_owned(),
                (Some(_), None) => "usage: write <path> <text>".to_owned(),
                (Some(fs), Some((path, text))) => {
                    let text = text.join(" ");
                    match fs.write_file(path, &text).await {
                        Ok(()) => format!("wrote {} bytes to {path}", text.len()),
                        Err(AppError::PermissionDenied { .. }) => {
                            format!("write: {path}: permission denied")
                        }
                        Err(e) => return Err(e),
                    }
                }
            },
            other => format!("Command not found: {other}"),
        };
        Ok(output)
    }
}
