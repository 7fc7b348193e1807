/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! The sentence-segmentation seam. Segmentation itself is an external
//! collaborator (a line-oriented tool invoked per document); this crate only
//! defines the interface it needs and two implementations: a passthrough
//! splitter on existing line breaks and a synchronous external-command
//! wrapper. External invocations must fully complete before the caller
//! proceeds; no timeout is defined and a hanging tool is a run failure.

use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::AnnError;

/// Splits a document's text into an ordered sequence of sentence lines.
pub trait Segmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>, AnnError>;
}

/// The default segmenter: the text is already line-segmented, keep its lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewlineSegmenter;

impl Segmenter for NewlineSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>, AnnError> {
        Ok(text.split('\n').map(|line| line.to_string()).collect())
    }
}

/// Invokes an external line-oriented segmentation tool: the document text is
/// piped to its standard input and one sentence per output line is read back.
#[derive(Debug, Clone)]
pub struct CommandSegmenter {
    program: String,
    args: Vec<String>,
}

impl CommandSegmenter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Segmenter for CommandSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>, AnnError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AnnError::IOError(e, self.program.clone(), "Spawning segmentation tool failed")
            })?;

        if let Some(stdin) = child.stdin.take() {
            let mut stdin = stdin;
            stdin.write_all(text.as_bytes()).map_err(|e| {
                AnnError::IOError(e, self.program.clone(), "Writing to segmentation tool failed")
            })?;
            // dropping stdin closes the pipe so the tool can terminate
        }

        let output = child.wait_with_output().map_err(|e| {
            AnnError::IOError(e, self.program.clone(), "Waiting for segmentation tool failed")
        })?;
        if !output.status.success() {
            return Err(AnnError::SerializationError(format!(
                "segmentation tool {} exited with {}",
                self.program, output.status
            )));
        }
        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| AnnError::OtherError("segmentation tool produced invalid utf-8"))?;
        Ok(stdout
            .lines()
            .map(|line| line.trim_end().to_string())
            .collect())
    }
}
