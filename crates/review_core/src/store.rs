//! Directory scanning and the `image_status.csv` round-trip.
//!
//! The status file is the source of truth once it exists: its rows define
//! both the set of images and their order. A fresh scan is only used to seed
//! the file the first time a directory is opened.

use crate::error::{Result, ReviewError};
use crate::status::{Status, Tally};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Name of the status file kept inside the reviewed directory.
pub const STATUS_FILE_NAME: &str = "image_status.csv";
pub const HEADER_FILE: &str = "文件名";
pub const HEADER_STATUS: &str = "识别状态";

const IMAGE_SUFFIXES: [&str; 3] = [".jpg", ".jpeg", ".png"];

/// One image in a session, keyed by its base file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    pub file_name: String,
    pub status: Status,
}

/// Where the session's file list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Directory was scanned and a new status file written.
    Scanned,
    /// An existing status file was loaded.
    Loaded,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatusRow {
    #[serde(rename = "文件名")]
    file_name: String,
    #[serde(rename = "识别状态")]
    status: Status,
}

/// Labels for one directory, in navigation order.
#[derive(Debug, Clone)]
pub struct Session {
    dir: PathBuf,
    records: Vec<ImageRecord>,
    index: HashMap<String, usize>,
    origin: SessionOrigin,
}

impl Session {
    /// Open `dir`, loading its status file or creating one from a scan.
    pub fn open_directory(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ReviewError::DirectoryNotFound(dir.to_path_buf()));
        }

        let csv_path = dir.join(STATUS_FILE_NAME);
        if csv_path.exists() {
            let records = read_status_file(&csv_path)?;
            let session = Self::from_records(dir, records, SessionOrigin::Loaded);
            tracing::info!(
                "Loaded {} labels from {}",
                session.len(),
                csv_path.display()
            );
            let missing = session.missing_files();
            if !missing.is_empty() {
                tracing::warn!(
                    "{} listed image(s) no longer exist in {}",
                    missing.len(),
                    dir.display()
                );
            }
            Ok(session)
        } else {
            let records = scan_images(dir)?
                .into_iter()
                .map(|file_name| ImageRecord {
                    file_name,
                    status: Status::Unmarked,
                })
                .collect();
            let session = Self::from_records(dir, records, SessionOrigin::Scanned);
            session.save()?;
            tracing::info!(
                "Scanned {} images in {}",
                session.len(),
                dir.display()
            );
            Ok(session)
        }
    }

    /// Build a session from records; later duplicates overwrite the status
    /// of the first occurrence and are otherwise dropped.
    fn from_records(dir: &Path, rows: Vec<ImageRecord>, origin: SessionOrigin) -> Self {
        let mut records: Vec<ImageRecord> = Vec::with_capacity(rows.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(rows.len());
        for row in rows {
            match index.entry(row.file_name.clone()) {
                Entry::Occupied(slot) => {
                    tracing::warn!("Duplicate row for {}; keeping the last status", row.file_name);
                    records[*slot.get()].status = row.status;
                }
                Entry::Vacant(slot) => {
                    slot.insert(records.len());
                    records.push(row);
                }
            }
        }
        Self {
            dir: dir.to_path_buf(),
            records,
            index,
            origin,
        }
    }

    /// Rewrite the status file with the current labels.
    pub fn save(&self) -> Result<()> {
        write_status_file(&self.csv_path(), &self.records)
    }

    /// Label `file_name` and persist. If the write fails the old label is
    /// restored and the error returned.
    pub fn set_status(&mut self, file_name: &str, status: Status) -> Result<()> {
        let idx = self
            .position(file_name)
            .ok_or_else(|| ReviewError::ImageNotFound(file_name.to_string()))?;
        let previous = std::mem::replace(&mut self.records[idx].status, status);
        if let Err(e) = self.save() {
            self.records[idx].status = previous;
            return Err(e);
        }
        tracing::debug!("{} -> {}", file_name, self.records[idx].status);
        Ok(())
    }

    pub fn csv_path(&self) -> PathBuf {
        self.dir.join(STATUS_FILE_NAME)
    }

    pub fn origin(&self) -> SessionOrigin {
        self.origin
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn get(&self, idx: usize) -> Option<&ImageRecord> {
        self.records.get(idx)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn position(&self, file_name: &str) -> Option<usize> {
        self.index.get(file_name).copied()
    }

    pub fn status_of(&self, file_name: &str) -> Option<&Status> {
        self.position(file_name).map(|i| &self.records[i].status)
    }

    /// Full path of an image in this session's directory.
    pub fn image_path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for r in &self.records {
            tally.add(&r.status);
        }
        tally
    }

    /// Listed images that are no longer present on disk.
    pub fn missing_files(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| !self.image_path(&r.file_name).is_file())
            .map(|r| r.file_name.as_str())
            .collect()
    }
}

/// List image file names directly inside `dir`, sorted.
///
/// Only names ending in `.jpg`, `.jpeg` or `.png` match, case-sensitively;
/// subdirectories are not visited.
pub fn scan_images(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let root = dir.as_ref();
    if !root.is_dir() {
        return Err(ReviewError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut names = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) if e.depth() == 0 => {
                let source = std::io::Error::from(e);
                return Err(ReviewError::io(root, source));
            }
            Err(e) => {
                tracing::warn!("walkdir error: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() || !is_supported_image(path) {
            continue;
        }
        match entry.file_name().to_str() {
            Some(name) => names.push(name.to_string()),
            None => tracing::warn!("Skipping non UTF-8 file name: {}", path.display()),
        }
    }
    names.sort();
    Ok(names)
}

/// Parse a status file into records in row order.
pub fn read_status_file(path: impl AsRef<Path>) -> Result<Vec<ImageRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ReviewError::io(path, e))?;
    let mut rdr = csv::Reader::from_reader(file);

    let headers = rdr
        .headers()
        .map_err(|e| ReviewError::from_csv(path, e))?
        .clone();
    for required in [HEADER_FILE, HEADER_STATUS] {
        if !headers.iter().any(|h| h == required) {
            return Err(ReviewError::parse(
                path,
                Some(1),
                format!("missing column \"{required}\""),
            ));
        }
    }

    let mut records = Vec::new();
    for row in rdr.deserialize::<StatusRow>() {
        let row = row.map_err(|e| ReviewError::from_csv(path, e))?;
        records.push(ImageRecord {
            file_name: row.file_name,
            status: row.status,
        });
    }
    Ok(records)
}

/// Write `records` to `path` via a temporary file in the same directory,
/// then rename it into place.
pub fn write_status_file(path: impl AsRef<Path>, records: &[ImageRecord]) -> Result<()> {
    let path = path.as_ref();
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| ReviewError::io(parent, e))?;
    {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(tmp.as_file_mut());
        wtr.write_record([HEADER_FILE, HEADER_STATUS])
            .map_err(|e| ReviewError::from_csv(path, e))?;
        for r in records {
            wtr.serialize(StatusRow {
                file_name: r.file_name.clone(),
                status: r.status.clone(),
            })
            .map_err(|e| ReviewError::from_csv(path, e))?;
        }
        wtr.flush().map_err(|e| ReviewError::io(path, e))?;
    }
    tmp.as_file_mut()
        .flush()
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| ReviewError::io(tmp.path(), e))?;

    match fs::metadata(path) {
        Ok(meta) => {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| ReviewError::io(tmp.path(), e))?;
        }
        #[cfg(unix)]
        Err(_) => {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))
                .map_err(|e| ReviewError::io(tmp.path(), e))?;
        }
        #[cfg(not(unix))]
        Err(_) => {}
    }

    tmp.persist(path)
        .map_err(|e| ReviewError::io(path, e.error))?;
    Ok(())
}

/// Suffix match on the file name, so a bare `.png` counts too.
fn is_supported_image(path: &Path) -> bool {
    match path.file_name().and_then(|s| s.to_str()) {
        Some(name) => IMAGE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs::{self, File};
    use tempfile::tempdir;

    fn record(name: &str, status: Status) -> ImageRecord {
        ImageRecord {
            file_name: name.into(),
            status,
        }
    }

    #[rstest]
    #[case("a.jpg", true)]
    #[case("a.jpeg", true)]
    #[case("a.png", true)]
    #[case("a.JPG", false)]
    #[case("a.Png", false)]
    #[case("a.gif", false)]
    #[case("a.png.txt", false)]
    #[case("noext", false)]
    #[case(".png", true)]
    #[case("png", false)]
    fn extension_filter_is_case_sensitive(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_supported_image(Path::new(name)), expected);
    }

    #[test]
    fn scan_lists_only_images_sorted() -> anyhow::Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("c.png"))?;
        File::create(dir.path().join("a.jpg"))?;
        File::create(dir.path().join("b.jpeg"))?;
        File::create(dir.path().join("d.JPG"))?;
        File::create(dir.path().join("notes.txt"))?;
        File::create(dir.path().join(".png"))?;
        fs::create_dir(dir.path().join("folder.png"))?;
        let nested = dir.path().join("nested");
        fs::create_dir(&nested)?;
        File::create(nested.join("e.jpg"))?;

        let names = scan_images(dir.path())?;
        assert_eq!(names, vec![".png", "a.jpg", "b.jpeg", "c.png"]);
        Ok(())
    }

    #[test]
    fn scan_missing_directory_is_not_found() {
        let dir = tempdir().unwrap();
        let err = scan_images(dir.path().join("gone")).unwrap_err();
        assert!(matches!(err, ReviewError::DirectoryNotFound(_)));
    }

    #[test]
    fn write_uses_fixed_header_and_crlf() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(STATUS_FILE_NAME);
        write_status_file(
            &path,
            &[
                record("a.png", Status::Correct),
                record("b.jpg", Status::Unmarked),
            ],
        )?;
        let text = fs::read_to_string(&path)?;
        assert_eq!(text, "文件名,识别状态\r\na.png,正确\r\nb.jpg,未标记\r\n");
        Ok(())
    }

    #[test]
    fn write_empty_session_still_has_header() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(STATUS_FILE_NAME);
        write_status_file(&path, &[])?;
        assert_eq!(fs::read_to_string(&path)?, "文件名,识别状态\r\n");
        assert!(read_status_file(&path)?.is_empty());
        Ok(())
    }

    #[test]
    fn names_with_commas_are_quoted() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(STATUS_FILE_NAME);
        let rows = vec![record("a,b.png", Status::Incorrect)];
        write_status_file(&path, &rows)?;
        assert!(fs::read_to_string(&path)?.contains("\"a,b.png\",错误"));
        assert_eq!(read_status_file(&path)?, rows);
        Ok(())
    }

    #[test]
    fn read_keeps_unknown_tokens_and_row_order() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(STATUS_FILE_NAME);
        fs::write(
            &path,
            "文件名,识别状态\nz.png,正确\na.png,待复核\nm.jpg,未标记\n",
        )?;
        let rows = read_status_file(&path)?;
        assert_eq!(
            rows,
            vec![
                record("z.png", Status::Correct),
                record("a.png", Status::Other("待复核".into())),
                record("m.jpg", Status::Unmarked),
            ]
        );
        Ok(())
    }

    #[test]
    fn read_accepts_reordered_and_extra_columns() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(STATUS_FILE_NAME);
        fs::write(&path, "识别状态,备注,文件名\n错误,blurry,x.png\n")?;
        assert_eq!(
            read_status_file(&path)?,
            vec![record("x.png", Status::Incorrect)]
        );
        Ok(())
    }

    #[rstest]
    #[case::wrong_header("file,status\na.png,正确\n")]
    #[case::missing_status_column("文件名\na.png\n")]
    #[case::ragged_row("文件名,识别状态\na.png,正确,extra\n")]
    #[case::empty_file("")]
    fn malformed_files_are_parse_errors(#[case] contents: &str) {
        let dir = tempdir().unwrap();
        let path = dir.path().join(STATUS_FILE_NAME);
        fs::write(&path, contents).unwrap();
        let err = read_status_file(&path).unwrap_err();
        assert!(matches!(err, ReviewError::Parse { .. }), "{err:?}");
    }

    #[test]
    fn duplicate_rows_keep_first_position_and_last_status() -> anyhow::Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join(STATUS_FILE_NAME),
            "文件名,识别状态\na.png,正确\nb.png,未标记\na.png,错误\n",
        )?;
        let session = Session::open_directory(dir.path())?;
        assert_eq!(
            session.records(),
            &[
                record("a.png", Status::Incorrect),
                record("b.png", Status::Unmarked)
            ]
        );
        assert_eq!(session.position("b.png"), Some(1));
        Ok(())
    }

    #[test]
    fn open_scans_and_writes_csv_when_absent() -> anyhow::Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("b.jpg"))?;
        File::create(dir.path().join("a.png"))?;

        let session = Session::open_directory(dir.path())?;
        assert_eq!(session.origin(), SessionOrigin::Scanned);
        assert_eq!(session.len(), 2);
        assert!(session.csv_path().exists());
        assert_eq!(
            read_status_file(session.csv_path())?,
            vec![
                record("a.png", Status::Unmarked),
                record("b.jpg", Status::Unmarked)
            ]
        );
        Ok(())
    }

    #[test]
    fn open_prefers_csv_over_directory_contents() -> anyhow::Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("a.png"))?;
        File::create(dir.path().join("new.png"))?;
        fs::write(
            dir.path().join(STATUS_FILE_NAME),
            "文件名,识别状态\nz.png,正确\na.png,未标记\n",
        )?;

        let session = Session::open_directory(dir.path())?;
        assert_eq!(session.origin(), SessionOrigin::Loaded);
        let names: Vec<_> = session.records().iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["z.png", "a.png"]);
        assert_eq!(session.missing_files(), vec!["z.png"]);
        Ok(())
    }

    #[test]
    fn open_missing_or_file_path_is_not_found() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("a.png");
        File::create(&file)?;
        assert!(matches!(
            Session::open_directory(dir.path().join("nope")),
            Err(ReviewError::DirectoryNotFound(_))
        ));
        assert!(matches!(
            Session::open_directory(&file),
            Err(ReviewError::DirectoryNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn set_status_persists_immediately() -> anyhow::Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("a.png"))?;
        let mut session = Session::open_directory(dir.path())?;

        session.set_status("a.png", Status::Correct)?;
        assert_eq!(session.status_of("a.png"), Some(&Status::Correct));
        assert_eq!(
            read_status_file(session.csv_path())?,
            vec![record("a.png", Status::Correct)]
        );
        Ok(())
    }

    #[test]
    fn set_status_unknown_name_fails_without_writing() -> anyhow::Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("a.png"))?;
        let mut session = Session::open_directory(dir.path())?;
        let before = fs::read(session.csv_path())?;

        let err = session.set_status("zz.png", Status::Correct).unwrap_err();
        assert!(matches!(err, ReviewError::ImageNotFound(ref n) if n == "zz.png"));
        assert_eq!(fs::read(session.csv_path())?, before);
        Ok(())
    }

    #[test]
    fn failed_save_restores_previous_status() -> anyhow::Result<()> {
        let dir = tempdir()?;
        File::create(dir.path().join("a.png"))?;
        let mut session = Session::open_directory(dir.path())?;

        // Pull the directory out from under the session so the write fails.
        fs::remove_dir_all(dir.path())?;
        let err = session.set_status("a.png", Status::Correct).unwrap_err();
        assert!(matches!(err, ReviewError::Io { .. }), "{err:?}");
        assert_eq!(session.status_of("a.png"), Some(&Status::Unmarked));
        Ok(())
    }

    #[test]
    fn tally_reflects_labels() -> anyhow::Result<()> {
        let dir = tempdir()?;
        for n in ["a.png", "b.png", "c.png"] {
            File::create(dir.path().join(n))?;
        }
        let mut session = Session::open_directory(dir.path())?;
        session.set_status("a.png", Status::Correct)?;
        session.set_status("b.png", Status::Incorrect)?;
        let tally = session.tally();
        assert_eq!((tally.unmarked, tally.correct, tally.incorrect), (1, 1, 1));
        Ok(())
    }
}
