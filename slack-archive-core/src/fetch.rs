use std::io::Write;
use std::path::PathBuf;

use crate::error::{ArchiveError, Result};

const PREAMBLE: &[&str] = &[
    "mv avatars avatars_old",
    "mv images images_old",
    "mv files files_old",
    "set -eux",
    "mkdir images files avatars",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchInstruction {
    pub source: String,
    pub dest: String,
}

/// Receives one instruction per remote asset, in first-discovery order.
pub trait FetchSink {
    fn fetch(&mut self, source: &str, dest: &str) -> Result<()>;
}

impl FetchSink for Vec<FetchInstruction> {
    fn fetch(&mut self, source: &str, dest: &str) -> Result<()> {
        self.push(FetchInstruction {
            source: source.to_string(),
            dest: dest.to_string(),
        });
        Ok(())
    }
}

/// Shell script that downloads every referenced asset with `wget`.
///
/// Lines are written as they are discovered, so a run that aborts part-way
/// still leaves a usable (if incomplete) script behind.
pub struct FetchScript<W: Write> {
    writer: W,
    path: PathBuf,
    count: usize,
}

impl<W: Write> FetchScript<W> {
    pub fn begin(mut writer: W, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        for line in PREAMBLE {
            writeln!(writer, "{line}").map_err(|source| ArchiveError::Io {
                path: path.clone(),
                source,
            })?;
        }
        Ok(Self {
            writer,
            path,
            count: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush().map_err(|source| ArchiveError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.writer)
    }
}

impl<W: Write> FetchSink for FetchScript<W> {
    fn fetch(&mut self, source: &str, dest: &str) -> Result<()> {
        writeln!(
            self.writer,
            "wget {} -O {}",
            shell_quote(source),
            shell_quote(dest)
        )
        .map_err(|err| ArchiveError::Io {
            path: self.path.clone(),
            source: err,
        })?;
        self.count += 1;
        Ok(())
    }
}

fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
