use std::mem;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::attachments::AttachmentResolver;
use crate::clock::{TimestampResolver, ZonedTime};
use crate::error::Result;
use crate::fetch::FetchSink;
use crate::markup;
use crate::model::{Message, UserDetail};
use crate::users::UserDirectory;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text {
        posted_at: ZonedTime,
        html: String,
    },
    Image {
        posted_at: ZonedTime,
        path: String,
        alt: String,
    },
    Attachment {
        posted_at: ZonedTime,
        path: String,
        thumbnail: String,
        title: String,
        filetype: String,
    },
}

impl Fragment {
    pub fn posted_at(&self) -> &ZonedTime {
        match self {
            Self::Text { posted_at, .. }
            | Self::Image { posted_at, .. }
            | Self::Attachment { posted_at, .. } => posted_at,
        }
    }
}

/// Consecutive messages by one author on one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub author_id: String,
    pub author: UserDetail,
    pub started_at: ZonedTime,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    DayMarker(NaiveDate),
    Block(Block),
}

/// Single forward pass that splits messages into day markers and author blocks.
///
/// A date change always closes the open block and forgets the author, so the
/// next message starts a fresh block even when the same person keeps talking.
/// Messages with neither text nor files still take part in this bookkeeping.
pub struct Grouper<'a, S: FetchSink> {
    clock: &'a TimestampResolver,
    users: &'a UserDirectory,
    attachments: &'a mut AttachmentResolver,
    sink: &'a mut S,
    entries: Vec<Entry>,
    current_date: Option<NaiveDate>,
    current_author: Option<String>,
    block_started_at: Option<ZonedTime>,
    fragments: Vec<Fragment>,
}

impl<'a, S: FetchSink> Grouper<'a, S> {
    pub fn new(
        clock: &'a TimestampResolver,
        users: &'a UserDirectory,
        attachments: &'a mut AttachmentResolver,
        sink: &'a mut S,
    ) -> Self {
        Self {
            clock,
            users,
            attachments,
            sink,
            entries: Vec::new(),
            current_date: None,
            current_author: None,
            block_started_at: None,
            fragments: Vec::new(),
        }
    }

    pub fn push(&mut self, message: &Message) -> Result<()> {
        let posted_at = self.clock.resolve(&message.ts)?;

        let date = posted_at.date();
        if self.current_date != Some(date) {
            self.flush();
            self.current_author = None;
            self.current_date = Some(date);
            self.entries.push(Entry::DayMarker(date));
        }

        if self.current_author.as_deref() != Some(message.user.as_str()) {
            self.flush();
            self.current_author = Some(message.user.clone());
            self.block_started_at = Some(posted_at.clone());
        }

        if let Some(text) = message.text.as_deref().filter(|text| !text.is_empty()) {
            self.fragments.push(Fragment::Text {
                posted_at: posted_at.clone(),
                html: markup::rewrite(text, self.users),
            });
        }

        for file in &message.files {
            if file.is_unavailable() {
                debug!(file_id = %file.id, mode = ?file.mode, "skipping unavailable file");
                continue;
            }

            let detail = self.attachments.resolve(file, &mut *self.sink)?;
            let title = file.title.clone().unwrap_or_else(|| file.id.clone());
            let fragment = match detail.thumbnail {
                None => Fragment::Image {
                    posted_at: posted_at.clone(),
                    path: detail.path,
                    alt: title,
                },
                Some(thumbnail) => Fragment::Attachment {
                    posted_at: posted_at.clone(),
                    path: detail.path,
                    thumbnail,
                    title,
                    filetype: file.filetype.clone().unwrap_or_default(),
                },
            };
            self.fragments.push(fragment);
        }

        Ok(())
    }

    pub fn finish(mut self) -> Vec<Entry> {
        self.flush();
        self.entries
    }

    fn flush(&mut self) {
        let fragments = mem::take(&mut self.fragments);
        if fragments.is_empty() {
            return;
        }
        let (Some(author_id), Some(started_at)) =
            (self.current_author.clone(), self.block_started_at.clone())
        else {
            return;
        };

        if !self.users.contains(&author_id) {
            warn!(user = %author_id, "no profile for user, rendering placeholder identity");
        }
        let author = self.users.get_or_placeholder(&author_id);
        self.entries.push(Entry::Block(Block {
            author_id,
            author,
            started_at,
            fragments,
        }));
    }
}

pub fn group_messages<S: FetchSink>(
    messages: &[Message],
    clock: &TimestampResolver,
    users: &UserDirectory,
    attachments: &mut AttachmentResolver,
    sink: &mut S,
) -> Result<Vec<Entry>> {
    let mut grouper = Grouper::new(clock, users, attachments, sink);
    for message in messages {
        grouper.push(message)?;
    }
    Ok(grouper.finish())
}
