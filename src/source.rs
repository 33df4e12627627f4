//! Source enumeration: the items an import reads from.

use crate::date_filter::DateFilters;
use crate::{Error, Result};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Default media extensions picked up from a camera folder
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "heic", "heif", "dng", "cr2", "cr3", "nef",
    "arw", "raf", "orf", "rw2", "mp4", "mov", "avi", "mkv", "3gp", "m4v", "mts",
];

/// Handle to one enumerated source file.
///
/// Resolution only reads `absolute_path`; the handle itself is passed
/// through to the copy target untouched.
pub trait SourceItem {
    /// Absolute display path, starting with the enumerator's root display
    fn absolute_path(&self) -> String;

    /// Last modification time, if the source reports one
    fn modified(&self) -> Option<DateTime<Local>>;

    /// Location the copy collaborator reads bytes from
    fn local_path(&self) -> &Path;
}

/// Lists the files of interest below a source root
pub trait SourceEnumerator {
    type Item: SourceItem;

    /// Root prefix every item's `absolute_path` starts with
    fn root_display(&self) -> String;

    /// Enumerate items keyed by path, already restricted by `filters`
    fn enumerate(&self, filters: &DateFilters) -> Result<BTreeMap<String, Self::Item>>;
}

/// Broad media classification by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl MediaKind {
    pub fn classify(path: &Path) -> Self {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return MediaKind::Other;
        };
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "heic" | "heif" | "dng" | "cr2"
            | "cr3" | "nef" | "arw" | "raf" | "orf" | "rw2" => MediaKind::Image,
            "mp4" | "mov" | "avi" | "mkv" | "3gp" | "m4v" | "mts" => MediaKind::Video,
            _ => MediaKind::Other,
        }
    }
}

/// A file found on the local filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    path: PathBuf,
    modified: Option<DateTime<Local>>,
}

impl LocalFile {
    pub fn new(path: PathBuf, modified: Option<DateTime<Local>>) -> Self {
        Self { path, modified }
    }
}

impl SourceItem for LocalFile {
    fn absolute_path(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    fn modified(&self) -> Option<DateTime<Local>> {
        self.modified
    }

    fn local_path(&self) -> &Path {
        &self.path
    }
}

/// Walks a mounted card or folder for media files
#[derive(Debug, Clone)]
pub struct LocalFsSource {
    root: PathBuf,
    extensions: Vec<String>,
    follow_links: bool,
}

impl LocalFsSource {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            follow_links: false,
        }
    }

    /// Restrict enumeration to these (case-insensitive) extensions
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions.into_iter().map(|e| e.to_lowercase()).collect();
        self
    }

    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    fn is_wanted(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .is_some_and(|e| self.extensions.iter().any(|wanted| *wanted == e))
    }
}

impl SourceEnumerator for LocalFsSource {
    type Item = LocalFile;

    fn root_display(&self) -> String {
        self.root.to_string_lossy().into_owned()
    }

    /// Paths that are not valid UTF-8 are skipped with a warning; their
    /// lossy display form is not a unique key.
    fn enumerate(&self, filters: &DateFilters) -> Result<BTreeMap<String, LocalFile>> {
        if !self.root.is_dir() {
            return Err(Error::configuration(format!(
                "source {} is not a folder",
                self.root.display()
            )));
        }
        if self.root.to_str().is_none() {
            return Err(Error::configuration(format!(
                "source {} is not a UTF-8 path",
                self.root.display()
            )));
        }

        info!("Scanning source: {}", self.root.display());
        let mut items = BTreeMap::new();
        let mut filtered_out = 0usize;
        let mut unreadable_names = 0usize;

        for entry in WalkDir::new(&self.root)
            .follow_links(self.follow_links)
            .into_iter()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping entry due to error: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.is_wanted(entry.path()) {
                continue;
            }

            let modified = entry
                .metadata()
                .ok()
                .and_then(|m| m.modified().ok())
                .map(DateTime::<Local>::from);

            if let Some(modified) = modified {
                if !filters.keeps(&modified) {
                    debug!("Excluding by date: {}", entry.path().display());
                    filtered_out += 1;
                    continue;
                }
            }

            let Some(key) = entry.path().to_str().map(str::to_string) else {
                warn!("Skipping non UTF-8 path: {}", entry.path().display());
                unreadable_names += 1;
                continue;
            };

            items.insert(key, LocalFile::new(entry.path().to_path_buf(), modified));
        }

        info!(
            "Found {} media files ({} excluded by date, {} skipped for non UTF-8 names)",
            items.len(),
            filtered_out,
            unreadable_names
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_filter::{Bound, DateFilter};
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative.as_bytes()).unwrap();
    }

    #[test]
    fn test_media_classification() {
        assert_eq!(MediaKind::classify(Path::new("a/IMG_1.HEIC")), MediaKind::Image);
        assert_eq!(MediaKind::classify(Path::new("a/MVI_1.Mov")), MediaKind::Video);
        assert_eq!(MediaKind::classify(Path::new("a/notes.txt")), MediaKind::Other);
        assert_eq!(MediaKind::classify(Path::new("a/README")), MediaKind::Other);
    }

    #[test]
    fn test_enumerate_keeps_media_only() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "202301/IMG_1.JPG");
        touch(temp_dir.path(), "202301_a/IMG_2.heic");
        touch(temp_dir.path(), "202301/MISC.THM");
        touch(temp_dir.path(), "202302/MVI_3.MP4");

        let source = LocalFsSource::new(temp_dir.path());
        let items = source.enumerate(&DateFilters::new()).unwrap();

        let root = source.root_display();
        let mut relative: Vec<_> = items
            .keys()
            .map(|k| k.strip_prefix(&root).unwrap().replace('\\', "/"))
            .collect();
        relative.sort();
        assert_eq!(
            relative,
            vec!["/202301/IMG_1.JPG", "/202301_a/IMG_2.heic", "/202302/MVI_3.MP4"]
        );
        assert!(items.values().all(|f| f.modified().is_some()));
    }

    #[test]
    fn test_enumerate_custom_extensions() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a/IMG_1.JPG");
        touch(temp_dir.path(), "a/MVI_2.MP4");

        let source = LocalFsSource::new(temp_dir.path()).with_extensions(vec!["MP4".to_string()]);
        let items = source.enumerate(&DateFilters::new()).unwrap();

        assert_eq!(items.len(), 1);
        assert!(items.keys().next().unwrap().ends_with("MVI_2.MP4"));
    }

    #[test]
    fn test_enumerate_applies_date_filters() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "a/IMG_1.JPG");

        // freshly written files are dated today
        let mut future_only = DateFilters::new();
        future_only.push(DateFilter::build("99991231", Bound::Lower).unwrap());
        let mut past_only = DateFilters::new();
        past_only.push(DateFilter::build("19700101", Bound::Lower).unwrap());

        let source = LocalFsSource::new(temp_dir.path());
        assert!(source.enumerate(&future_only).unwrap().is_empty());
        assert_eq!(source.enumerate(&past_only).unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_enumerate_skips_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let folder = temp_dir.path().join("202301");
        fs::create_dir_all(&folder).unwrap();
        for name in [&b"\xffA.JPG"[..], &b"\xfeA.JPG"[..]] {
            // some filesystems refuse invalid UTF-8 names outright
            if fs::write(folder.join(OsStr::from_bytes(name)), b"jpeg").is_err() {
                return;
            }
        }
        touch(temp_dir.path(), "202301/IMG_1.JPG");

        let items = LocalFsSource::new(temp_dir.path())
            .enumerate(&DateFilters::new())
            .unwrap();

        assert_eq!(items.len(), 1);
        assert!(items.keys().next().unwrap().ends_with("IMG_1.JPG"));
        assert!(items.keys().all(|k| !k.contains('\u{FFFD}')));
    }

    #[test]
    fn test_enumerate_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let source = LocalFsSource::new(&temp_dir.path().join("nope"));

        let err = source.enumerate(&DateFilters::new()).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }
}
