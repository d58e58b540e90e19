//! Interactive question seam

use std::io::{self, BufRead, Stdin, StdinLock, Stdout, Write};

/// Source of answers for interactive augmentation
pub trait Prompter {
    /// Display an informational message
    fn show(&mut self, message: &str);

    /// Ask a yes/no question
    fn confirm(&mut self, question: &str, default: bool) -> bool;

    /// Ask a free-form question.
    ///
    /// An empty `default` means there is none; non-empty `choices` restrict
    /// the accepted answers.
    fn ask(&mut self, question: &str, default: &str, choices: &[String]) -> String;
}

/// Line-oriented prompter over any reader/writer pair
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the prompter, returning the writer
    pub fn into_output(self) -> W {
        self.output
    }

    fn write_prompt(&mut self, text: &str) {
        // Prompt output is best effort; a closed terminal falls back to defaults
        let _ = write!(self.output, "{}", text);
        let _ = self.output.flush();
    }

    /// Next trimmed line, or `None` at end of input
    fn read_answer(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl TerminalPrompter<StdinLock<'static>, Stdout> {
    /// Prompter on the process's standard streams
    pub fn stdio() -> Self {
        let stdin: Stdin = io::stdin();
        Self::new(stdin.lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn show(&mut self, message: &str) {
        self.write_prompt(&format!("{}\n", message));
    }

    fn confirm(&mut self, question: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        loop {
            self.write_prompt(&format!("{} {} ", question, hint));
            let Some(answer) = self.read_answer() else {
                return default;
            };
            match answer.to_lowercase().as_str() {
                "" => return default,
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => self.show("Please answer y or n."),
            }
        }
    }

    fn ask(&mut self, question: &str, default: &str, choices: &[String]) -> String {
        let mut prompt = question.to_string();
        if !choices.is_empty() {
            prompt.push_str(&format!(" ({})", choices.join("/")));
        }
        if !default.is_empty() {
            prompt.push_str(&format!(" [{}]", default));
        }
        prompt.push_str(": ");

        loop {
            self.write_prompt(&prompt);
            let Some(answer) = self.read_answer() else {
                return default.to_string();
            };
            if answer.is_empty() {
                return default.to_string();
            }
            if choices.is_empty() || choices.iter().any(|c| *c == answer) {
                return answer;
            }
            self.show(&format!("Please choose one of: {}", choices.join(", ")));
        }
    }
}
