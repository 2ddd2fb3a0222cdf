//! Simple terminal prompt for secure flags.
//!
//! Works without external dependencies but does not mask what the user
//! types. Enable the `inquire` feature and use
//! [`InquirePassword`](crate::InquirePassword) for masked entry.

use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::secret::{SecretRequest, SecretSource};
use crate::InputError;

/// The terminal a prompt talks to.
pub trait TerminalIO: Send + Sync {
    /// Whether stdin is attached to a TTY.
    fn is_terminal(&self) -> bool;

    /// Show the prompt on stderr.
    fn write_prompt(&self, prompt: &str) -> io::Result<()>;

    /// One line of input, newline included; empty at EOF.
    fn read_line(&self) -> io::Result<String>;
}

/// Stdin and stderr of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealTerminal;

impl TerminalIO for RealTerminal {
    fn is_terminal(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn write_prompt(&self, prompt: &str) -> io::Result<()> {
        eprint!("{}", prompt);
        io::stderr().flush()
    }

    fn read_line(&self) -> io::Result<String> {
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(line)
    }
}

/// Ask for a secure flag's value on the terminal.
///
/// Only available when stdin is a TTY. The prompt text comes from the
/// flag; when the flag has none, `"<flag>: "` is used.
#[derive(Clone)]
pub struct PromptSecret<T: TerminalIO = RealTerminal> {
    terminal: Arc<T>,
}

impl PromptSecret<RealTerminal> {
    /// Create a prompt on the real terminal.
    pub fn new() -> Self {
        Self {
            terminal: Arc::new(RealTerminal),
        }
    }
}

impl Default for PromptSecret<RealTerminal> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TerminalIO> PromptSecret<T> {
    /// Create a prompt with a custom terminal for testing.
    pub fn with_terminal(terminal: T) -> Self {
        Self {
            terminal: Arc::new(terminal),
        }
    }
}

impl<T: TerminalIO + 'static> SecretSource for PromptSecret<T> {
    fn name(&self) -> &'static str {
        "prompt"
    }

    fn is_available(&self, _request: &SecretRequest) -> bool {
        self.terminal.is_terminal()
    }

    fn read_secret(&self, request: &SecretRequest) -> Result<Option<String>, InputError> {
        if !self.terminal.is_terminal() {
            return Ok(None);
        }

        let prompt = if request.prompt.is_empty() {
            format!("{}: ", request.flag)
        } else {
            request.prompt.clone()
        };

        self.terminal
            .write_prompt(&prompt)
            .map_err(InputError::TerminalFailed)?;

        let line = self
            .terminal
            .read_line()
            .map_err(InputError::TerminalFailed)?;

        // EOF (Ctrl+D)
        if line.is_empty() {
            return Err(InputError::PromptCancelled);
        }

        let value = line.trim_end_matches('\n').trim_end_matches('\r');
        if value.is_empty() {
            Ok(None)
        } else {
            Ok(Some(value.to_string()))
        }
    }

    fn can_retry(&self) -> bool {
        true
    }
}

/// Scripted terminal: answers prompts from a fixed list, then reports EOF.
///
/// Clones share the read cursor.
#[derive(Debug, Clone)]
pub struct MockTerminal {
    tty: bool,
    answers: Arc<[String]>,
    next: Arc<AtomicUsize>,
}

impl MockTerminal {
    fn scripted(tty: bool, answers: Vec<String>) -> Self {
        Self {
            tty,
            answers: answers.into(),
            next: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Stdin is not a TTY; prompting is unavailable.
    pub fn non_terminal() -> Self {
        Self::scripted(false, Vec::new())
    }

    /// A TTY that types `response` once.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self::scripted(true, vec![response.into()])
    }

    /// A TTY that types each response in turn.
    pub fn with_responses(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::scripted(true, responses.into_iter().map(Into::into).collect())
    }

    /// A TTY where the user presses Ctrl+D straight away.
    pub fn eof() -> Self {
        Self::scripted(true, Vec::new())
    }
}

impl TerminalIO for MockTerminal {
    fn is_terminal(&self) -> bool {
        self.tty
    }

    fn write_prompt(&self, _prompt: &str) -> io::Result<()> {
        Ok(())
    }

    fn read_line(&self) -> io::Result<String> {
        let at = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .answers
            .get(at)
            .map(|answer| format!("{}\n", answer))
            .unwrap_or_default())
    }
}
