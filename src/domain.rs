use std::fmt;
use std::io::Error;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;
use tracing_error::SpanTrace;

pub const HELP_TEXT: &str = "\
q         quit
?         this help, Esc closes it
← → h l   select column
s         sort by selected column, again to flip direction
/         search all columns
f         search in selected column
c         clear search
v         show/hide selected column
m         move selected column, ← → to drag, Enter to drop
n p       next / previous page (PageDown / PageUp)
Home End  first / last page
1-9       jump to page";

#[derive(Debug)]
pub enum TVError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String, SpanTrace),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    InvalidPath(String),
    Logging(String),
}

impl fmt::Display for TVError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TVError::IoError(e) => write!(f, "I/O error: {e}"),
            TVError::PolarsError(e) => write!(f, "Could not read data: {e}"),
            TVError::LoadingFailed(reason, span) => {
                write!(f, "Loading failed: {reason}")?;
                write!(f, "\n{span}")
            }
            TVError::FileNotFound => write!(f, "File not found"),
            TVError::PermissionDenied => write!(f, "Permission denied"),
            TVError::UnknownFileType => {
                write!(f, "Unknown file type, expected csv, parquet or arrow")
            }
            TVError::InvalidPath(reason) => write!(f, "Invalid path: {reason}"),
            TVError::Logging(reason) => write!(f, "Could not set up logging: {reason}"),
        }
    }
}

impl From<Error> for TVError {
    fn from(err: Error) -> Self {
        TVError::IoError(err)
    }
}

impl From<PolarsError> for TVError {
    fn from(err: PolarsError) -> Self {
        TVError::PolarsError(err)
    }
}

/// What the command line input is currently used for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CMDMode {
    SearchTable,
    SearchInColumn,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    Help,
    Exit,
    Enter,
    MoveLeft,
    MoveRight,
    Sort,
    Search,
    SearchInColumn,
    ClearSearch,
    ToggleColumn,
    StartDrag,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    GotoPage(usize),
    RawKey(KeyEvent),
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TVConfig {
    pub page_size: NonZeroUsize,
    pub event_poll_time: u64,
    #[setters(strip_option)]
    pub log_file: Option<PathBuf>,
    #[setters(into)]
    pub log_level: String,
    /// Replaces the data set name in the table title.
    #[setters(strip_option, into)]
    pub title: Option<String>,
}

impl Default for TVConfig {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(4).unwrap_or(NonZeroUsize::MIN),
            event_poll_time: 100,
            log_file: None,
            log_level: "info".to_string(),
            title: None,
        }
    }
}
