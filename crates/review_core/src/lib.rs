//! Session model for reviewing a folder of images.
//!
//! A [`Session`] owns the ordered file list and the per-image labels of one
//! directory and keeps `image_status.csv` in sync after every change. A
//! [`Navigator`] adds the cursor the GUI moves around with.

mod error;
mod navigator;
mod status;
mod store;

pub use error::{Result, ReviewError};
pub use navigator::Navigator;
pub use status::{Status, TOKEN_CORRECT, TOKEN_INCORRECT, TOKEN_UNMARKED, Tally};
pub use store::{
    HEADER_FILE, HEADER_STATUS, ImageRecord, STATUS_FILE_NAME, Session, SessionOrigin,
    read_status_file, scan_images, write_status_file,
};
