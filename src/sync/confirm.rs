use std::collections::VecDeque;
use std::io::{BufRead, Write};

use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
    /// Yes, and stop asking this question.
    All,
}

impl Decision {
    /// `y` / `a`; anything else is a no.
    pub fn parse(input: &str) -> Self {
        match input.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Decision::Yes,
            "a" | "all" => Decision::All,
            _ => Decision::No,
        }
    }

    pub fn is_yes(self) -> bool {
        matches!(self, Decision::Yes | Decision::All)
    }
}

/// Answers the yes/no/all questions a workflow asks before destructive or
/// lossy steps.
pub trait ConfirmationPolicy {
    fn confirm(&mut self, prompt: &str) -> Decision;
}

/// Always gives the same answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub Decision);

impl ConfirmationPolicy for FixedPolicy {
    fn confirm(&mut self, _prompt: &str) -> Decision {
        self.0
    }
}

/// Replays a list of answers, then says no. Records every prompt it saw.
#[derive(Debug, Default)]
pub struct ScriptedPolicy {
    answers: VecDeque<Decision>,
    pub prompts: Vec<String>,
}

impl ScriptedPolicy {
    pub fn new(answers: impl IntoIterator<Item = Decision>) -> Self {
        Self { answers: answers.into_iter().collect(), prompts: Vec::new() }
    }
}

impl ConfirmationPolicy for ScriptedPolicy {
    fn confirm(&mut self, prompt: &str) -> Decision {
        self.prompts.push(prompt.to_owned());
        self.answers.pop_front().unwrap_or(Decision::No)
    }
}

/// Prints the prompt and reads one line of input.
pub struct ConsolePolicy<'a, R, W> {
    input: &'a mut R,
    output: &'a mut W,
}

impl<'a, R: BufRead, W: Write> ConsolePolicy<'a, R, W> {
    pub fn new(input: &'a mut R, output: &'a mut W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ConfirmationPolicy for ConsolePolicy<'_, R, W> {
    fn confirm(&mut self, prompt: &str) -> Decision {
        if let Err(e) = write!(self.output, "{} ", prompt) {
            warn!("failed to write prompt: {}", e);
        }
        if let Err(e) = self.output.flush() {
            warn!("failed to flush prompt: {}", e);
        }

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(_) => Decision::parse(&line),
            Err(e) => {
                warn!("failed to read answer: {}", e);
                Decision::No
            }
        }
    }
}
