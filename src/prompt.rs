//! Operator prompt
//!
//! Line-at-a-time terminal interaction, generic over the input and output so sessions can
//! be driven from scripts.

use std::{
    fmt::Display,
    io::{self, BufRead, Write},
};

/// Reads operator answers from `R` and writes prompts and messages to `W`.
#[derive(Debug)]
pub struct Prompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompt<R, W> {
    /// Create a new prompt.
    pub fn new(input: R, output: W) -> Self {
        Prompt { input, output }
    }

    /// Writes `message` and reads one line of input.
    ///
    /// The trailing line ending is removed. Returns `None` once the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be written or the input cannot be read.
    pub fn ask(&mut self, message: &str) -> io::Result<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();

        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let answer = line.strip_suffix('\n').unwrap_or(&line);
        let answer = answer.strip_suffix('\r').unwrap_or(answer);

        Ok(Some(answer.to_string()))
    }

    /// Writes `message` on its own line.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written.
    pub fn say(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }

    /// Output the prompt writes to.
    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Consumes the prompt, returning its output.
    pub fn into_output(self) -> W {
        self.output
    }
}
