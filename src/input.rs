//! Input collection for batch runs.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// One unit of work named on the command line, in a file or on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkInput {
    /// Handle suffix under the configured prefix.
    Handle(String),
    /// Absolute RDF document URI.
    DocumentUri(String),
}

impl WorkInput {
    /// Classifies a trimmed, non-empty token.
    #[must_use]
    pub fn classify(token: &str) -> Self {
        if token.starts_with("http://") || token.starts_with("https://") {
            Self::DocumentUri(token.to_string())
        } else {
            Self::Handle(token.to_string())
        }
    }

    /// The token as given.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Handle(value) | Self::DocumentUri(value) => value,
        }
    }
}

/// Splits text into inputs: one per line, blanks and `#` comments skipped.
#[must_use]
pub fn parse_input_lines(text: &str) -> Vec<WorkInput> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(WorkInput::classify)
        .collect()
}

/// Gathers inputs from positional args and the input file.
///
/// Stdin is read only when neither source was given and stdin is piped.
pub fn collect_inputs(positional: &[String], input_file: Option<&Path>) -> Result<Vec<WorkInput>> {
    let mut inputs = parse_input_lines(&positional.join("\n"));

    if let Some(path) = input_file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file '{}'", path.display()))?;
        inputs.extend(parse_input_lines(&text));
    }

    if positional.is_empty() && input_file.is_none() && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        inputs.extend(parse_input_lines(&buffer));
    }

    Ok(inputs)
}
