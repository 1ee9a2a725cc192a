//! Per-test confirmation for `record`.

use std::io::{BufRead, Write};

use crate::error::Result;

/// Prompt shown before overwriting a test's expectations.
pub const RECORD_PROMPT: &str = "Record current behaviour as the expected one? [y/N]";

/// Decides whether a test's current behaviour becomes its expectation.
pub trait Confirm {
    fn confirm(&mut self, name: &str) -> Result<bool>;
}

/// Asks the operator on a terminal-like pair of streams.
///
/// Only `y` (any case) is affirmative. End of input counts as a no.
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Confirm for Prompt<R, W> {
    fn confirm(&mut self, _name: &str) -> Result<bool> {
        write!(self.output, "{}", RECORD_PROMPT)?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            writeln!(self.output)?;
            return Ok(false);
        }

        Ok(answer.trim_end_matches(['\r', '\n']).eq_ignore_ascii_case("y"))
    }
}

impl<F> Confirm for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm(&mut self, name: &str) -> Result<bool> {
        Ok(self(name))
    }
}
