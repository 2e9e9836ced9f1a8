use serde::{Deserialize, Serialize};
use std::fmt;

pub const TOKEN_UNMARKED: &str = "未标记";
pub const TOKEN_CORRECT: &str = "正确";
pub const TOKEN_INCORRECT: &str = "错误";

/// Label attached to an image.
///
/// Tokens other than the three written by this crate are carried through
/// untouched as [`Status::Other`], so a hand-edited status file survives a
/// load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    #[default]
    Unmarked,
    Correct,
    Incorrect,
    Other(String),
}

impl Status {
    pub fn from_token(token: &str) -> Self {
        match token {
            TOKEN_UNMARKED => Status::Unmarked,
            TOKEN_CORRECT => Status::Correct,
            TOKEN_INCORRECT => Status::Incorrect,
            other => Status::Other(other.to_string()),
        }
    }

    /// Token written to the status file.
    pub fn token(&self) -> &str {
        match self {
            Status::Unmarked => TOKEN_UNMARKED,
            Status::Correct => TOKEN_CORRECT,
            Status::Incorrect => TOKEN_INCORRECT,
            Status::Other(s) => s,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            TOKEN_UNMARKED | TOKEN_CORRECT | TOKEN_INCORRECT => Status::from_token(&value),
            _ => Status::Other(value),
        }
    }
}

impl From<Status> for String {
    fn from(value: Status) -> Self {
        match value {
            Status::Other(s) => s,
            known => known.token().to_string(),
        }
    }
}

/// Per-status counts over a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub unmarked: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub other: usize,
}

impl Tally {
    pub fn total(&self) -> usize {
        self.unmarked + self.correct + self.incorrect + self.other
    }

    pub(crate) fn add(&mut self, status: &Status) {
        match status {
            Status::Unmarked => self.unmarked += 1,
            Status::Correct => self.correct += 1,
            Status::Incorrect => self.incorrect += 1,
            Status::Other(_) => self.other += 1,
        }
    }
}
