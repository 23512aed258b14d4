//! REPL (Read-Eval-Print Loop) for hoe

use crate::interp::Interpreter;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = "> ";
const HISTORY_FILE: &str = ".hoe_history";

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    interpreter: Interpreter,
    history_path: Option<PathBuf>,
}

impl Repl {
    /// Create a new REPL
    pub fn new() -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let interpreter = Interpreter::new();

        // Try to find history file in home directory
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            interpreter,
            history_path,
        };

        // Load history if available
        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("hoe REPL");
        println!("Type :help for help, :quit to exit.\n");

        loop {
            match self.editor.readline(PROMPT) {
                Ok(line) => {
                    let line = line.trim();

                    if line.is_empty() {
                        continue;
                    }

                    // Add to history
                    let _ = self.editor.add_history_entry(line);

                    // Handle commands
                    if line.starts_with(':') {
                        if self.handle_command(line) {
                            break;
                        }
                        continue;
                    }

                    self.eval_input(line);
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        // Save history
        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    /// Handle REPL commands (starting with :)
    fn handle_command(&mut self, cmd: &str) -> bool {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                true
            }
            ":help" | ":h" | ":?" => {
                self.print_help();
                false
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                false
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                false
            }
        }
    }

    /// Print help message
    fn print_help(&self) {
        println!("hoe REPL Commands:");
        println!("  :help, :h, :?   Show this help");
        println!("  :quit, :q       Exit the REPL");
        println!("  :clear          Clear the screen");
        println!();
        println!("You can enter statements:");
        println!("  value 42                   literal value");
        println!("  x: value [1, 2, 3]         labelled binding");
        println!("  eval \"+\" [1, 2]            builtin invocation");
        println!("  proc \"double\" eval \"*\" [$, 2] end");
        println!();
        println!("Built-in operations:");
        println!("  + - * / =       arithmetic and equality over arrays");
        println!("  type, str, len  inspection and conversion");
        println!("  map, filter     apply a proc over an array");
        println!("  io.puts         print a value with newline");
        println!("  import          evaluate a module file into scope");
    }

    /// Evaluate one line of input, printing the result or the error.
    /// Bindings and procedures persist between lines; a failed
    /// evaluation can leave frames behind, so the interpreter is reset
    /// (losing the session) before the next prompt.
    fn eval_input(&mut self, input: &str) {
        match self.interpreter.eval_interactive(input) {
            Ok(value) => println!("{value}"),
            Err(err) => {
                eprintln!("{err}");
                self.interpreter.reset();
            }
        }
    }
}

impl Default for Repl {
    fn default() -> Self {
        Self::new().expect("Failed to create REPL")
    }
}

/// Get home directory
fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_new() {
        let repl = Repl::new();
        assert!(repl.is_ok());
    }

    #[test]
    fn test_handle_command_quit() {
        let mut repl = Repl::new().unwrap();
        assert!(repl.handle_command(":quit"));
        assert!(repl.handle_command(":q"));
        assert!(repl.handle_command(":exit"));
    }

    #[test]
    fn test_handle_command_help() {
        let mut repl = Repl::new().unwrap();
        assert!(!repl.handle_command(":help"));
        assert!(!repl.handle_command(":h"));
        assert!(!repl.handle_command(":?"));
    }

    #[test]
    fn test_handle_command_unknown() {
        let mut repl = Repl::new().unwrap();
        assert!(!repl.handle_command(":unknown"));
    }

    #[test]
    fn test_dirs_home_returns_some() {
        // On any real system, HOME or USERPROFILE should be set
        assert!(dirs_home().is_some());
    }

    #[test]
    fn test_eval_input_statement() {
        let mut repl = Repl::new().unwrap();
        // Should not panic
        repl.eval_input("value 42");
    }

    #[test]
    fn test_eval_input_invalid() {
        let mut repl = Repl::new().unwrap();
        // Should not panic, just print error
        repl.eval_input("@#$%");
    }

    #[test]
    fn test_state_survives_across_inputs() {
        let mut repl = Repl::new().unwrap();
        repl.eval_input("x: value 5");
        // x stays bound in the interpreter's lasting frame
        repl.eval_input("value x");
    }

    #[test]
    fn test_eval_input_recovers_after_error() {
        let mut repl = Repl::new().unwrap();
        repl.eval_input("begin value missing end");
        repl.eval_input("value 1");
    }

    #[test]
    fn test_constants() {
        assert_eq!(PROMPT, "> ");
        assert_eq!(HISTORY_FILE, ".hoe_history");
    }
}
