use crate::error::{Result, ReviewError};
use crate::status::Status;
use crate::store::{ImageRecord, Session};
use std::path::{Path, PathBuf};

/// Cursor over a [`Session`]'s ordered images.
///
/// The cursor is `None` only when the session has no images; otherwise it
/// always points at a valid record.
#[derive(Debug, Clone)]
pub struct Navigator {
    session: Session,
    cursor: Option<usize>,
}

impl Navigator {
    /// Open a directory and place the cursor on its first image.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::from_session(Session::open_directory(dir)?))
    }

    pub fn from_session(session: Session) -> Self {
        let cursor = if session.is_empty() { None } else { Some(0) };
        Self { session, cursor }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        self.cursor.and_then(|i| self.session.get(i))
    }

    /// Absolute path of the current image.
    pub fn current_path(&self) -> Option<PathBuf> {
        self.current()
            .map(|r| self.session.image_path(&r.file_name))
    }

    /// Move forward one image, stopping at the last.
    pub fn next(&mut self) -> Option<usize> {
        if let Some(i) = self.cursor
            && i + 1 < self.session.len()
        {
            self.cursor = Some(i + 1);
            tracing::debug!("cursor -> {}", i + 1);
        }
        self.cursor
    }

    /// Move back one image, stopping at the first.
    pub fn previous(&mut self) -> Option<usize> {
        if let Some(i) = self.cursor
            && i > 0
        {
            self.cursor = Some(i - 1);
            tracing::debug!("cursor -> {}", i - 1);
        }
        self.cursor
    }

    /// Move to `file_name`. The cursor is untouched when it is not found.
    pub fn jump_to(&mut self, file_name: &str) -> Result<usize> {
        let idx = self
            .session
            .position(file_name)
            .ok_or_else(|| ReviewError::ImageNotFound(file_name.to_string()))?;
        self.cursor = Some(idx);
        tracing::debug!("jump to {} ({})", file_name, idx);
        Ok(idx)
    }

    /// Label the current image, persist, then advance.
    ///
    /// Does nothing and returns `Ok(None)` when there is no current image.
    /// If persisting fails the cursor stays where it was.
    pub fn mark_current_and_advance(&mut self, status: Status) -> Result<Option<usize>> {
        let Some(file_name) = self.current().map(|r| r.file_name.clone()) else {
            return Ok(None);
        };
        self.session.set_status(&file_name, status)?;
        Ok(self.next())
    }

    /// `(file name, status)` pairs in display order.
    pub fn entries(&self) -> Vec<(&str, &Status)> {
        self.session
            .records()
            .iter()
            .map(|r| (r.file_name.as_str(), &r.status))
            .collect()
    }

    /// One-based "i / n" position for status lines.
    pub fn position_label(&self) -> String {
        match self.cursor {
            Some(i) => format!("{} / {}", i + 1, self.session.len()),
            None => "0 / 0".to_string(),
        }
    }
}
