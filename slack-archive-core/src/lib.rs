pub mod attachments;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod group;
pub mod markup;
pub mod model;
pub mod render;
pub mod service;
pub mod users;

pub use attachments::AttachmentResolver;
pub use clock::{DisplayZone, TimestampResolver, TravelWindow, ZonedTime};
pub use config::Settings;
pub use error::{ArchiveError, Result};
pub use fetch::{FetchInstruction, FetchScript, FetchSink};
pub use group::{Block, Entry, Fragment, Grouper, group_messages};
pub use model::{FileDetail, Message, MessageFile, RawTimestamp, UserDetail, UserProfile};
pub use service::{
    ExportSummary, RenderedArchive, collect_input_files, export_archive, load_messages,
    read_messages, render_archive,
};
pub use users::UserDirectory;
