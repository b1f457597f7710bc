use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::info;
use walkdir::WalkDir;

use crate::attachments::AttachmentResolver;
use crate::config::Settings;
use crate::error::{ArchiveError, Result};
use crate::fetch::{FetchScript, FetchSink};
use crate::group::{Entry, group_messages};
use crate::model::Message;
use crate::render;
use crate::users::UserDirectory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArchive {
    pub html: String,
    pub days: usize,
    pub blocks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub messages: usize,
    pub days: usize,
    pub blocks: usize,
    pub fetches: usize,
    pub output: PathBuf,
    pub fetch_script: PathBuf,
}

/// Expands directories (a channel folder of a Slack export) into their `*.json` files.
pub fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(input)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        if found.is_empty() {
            return Err(ArchiveError::NoInputFiles {
                path: input.clone(),
            });
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

pub fn read_messages(path: &Path) -> Result<Vec<Message>> {
    let raw = fs::read_to_string(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArchiveError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_messages(inputs: &[PathBuf]) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    for path in collect_input_files(inputs)? {
        let batch = read_messages(&path)?;
        info!(path = %path.display(), count = batch.len(), "loaded messages");
        messages.extend(batch);
    }
    Ok(messages)
}

pub fn render_archive(
    messages: &[Message],
    settings: &Settings,
    sink: &mut impl FetchSink,
) -> Result<RenderedArchive> {
    let mut users = UserDirectory::new();
    users.populate(messages, sink)?;

    let clock = settings.resolver();
    let mut attachments = AttachmentResolver::new();
    let entries = group_messages(messages, &clock, &users, &mut attachments, sink)?;

    let days = entries
        .iter()
        .filter(|entry| matches!(entry, Entry::DayMarker(_)))
        .count();
    let blocks = entries.len() - days;
    let content = render::render_entries(&entries);
    let html = render::render_page(&settings.title, &settings.stylesheet, &content);

    Ok(RenderedArchive { html, days, blocks })
}

/// Reads every input, writes the HTML page to `output` and the fetch script
/// to `settings.fetch_script`.
pub fn export_archive(
    inputs: &[PathBuf],
    output: &Path,
    settings: &Settings,
) -> Result<ExportSummary> {
    let script_file = File::create(&settings.fetch_script).map_err(|source| ArchiveError::Io {
        path: settings.fetch_script.clone(),
        source,
    })?;
    let mut script = FetchScript::begin(BufWriter::new(script_file), &settings.fetch_script)?;

    let messages = load_messages(inputs)?;
    let rendered = render_archive(&messages, settings, &mut script)?;
    let fetches = script.len();
    script.finish()?;

    fs::write(output, &rendered.html).map_err(|source| ArchiveError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    let summary = ExportSummary {
        messages: messages.len(),
        days: rendered.days,
        blocks: rendered.blocks,
        fetches,
        output: output.to_path_buf(),
        fetch_script: settings.fetch_script.clone(),
    };
    info!(
        messages = summary.messages,
        days = summary.days,
        blocks = summary.blocks,
        fetches = summary.fetches,
        output = %summary.output.display(),
        "archive written"
    );
    Ok(summary)
}
