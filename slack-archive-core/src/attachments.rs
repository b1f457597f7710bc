use std::collections::HashMap;

use crate::error::{ArchiveError, Result};
use crate::fetch::FetchSink;
use crate::model::{FileDetail, MessageFile};

/// Maps file references to local paths, fetching each file id at most once.
#[derive(Debug, Clone, Default)]
pub struct AttachmentResolver {
    files: HashMap<String, FileDetail>,
}

impl AttachmentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn resolve(&mut self, file: &MessageFile, sink: &mut impl FetchSink) -> Result<FileDetail> {
        if let Some(detail) = self.files.get(&file.id) {
            return Ok(detail.clone());
        }

        let filetype = required(file, file.filetype.as_deref(), "filetype")?;
        let download = required(
            file,
            file.url_private_download.as_deref(),
            "url_private_download",
        )?;
        required(file, file.mimetype.as_deref(), "mimetype")?;

        let filename = format!("{}.{filetype}", file.id);
        let detail = if file.is_image() {
            FileDetail {
                id: file.id.clone(),
                path: format!("images/{filename}"),
                thumbnail: None,
            }
        } else {
            let thumb_source = file
                .thumb_960
                .as_deref()
                .or(file.thumb_video.as_deref())
                .ok_or_else(|| ArchiveError::UnsupportedAttachment {
                    file_id: file.id.clone(),
                })?;
            let thumbnail = format!("images/{}.jpg", file.id);
            sink.fetch(thumb_source, &thumbnail)?;
            FileDetail {
                id: file.id.clone(),
                path: format!("files/{filename}"),
                thumbnail: Some(thumbnail),
            }
        };

        sink.fetch(download, &detail.path)?;
        self.files.insert(file.id.clone(), detail.clone());
        Ok(detail)
    }
}

fn required<'a>(
    file: &MessageFile,
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str> {
    value.ok_or_else(|| ArchiveError::MissingFileField {
        file_id: file.id.clone(),
        field,
    })
}
