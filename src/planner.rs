//! Turns the resolver's copy plan into concrete copy tasks.

use crate::copy::CopyTarget;
use crate::{Error, Result};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One planned copy of a source item into a destination folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask<I, F> {
    /// Relative path the task was planned under
    pub relative_path: String,
    /// Source handle, passed through untouched
    pub source: I,
    /// Destination folder handle from the copy target
    pub folder: F,
    pub file_name: String,
    /// Full destination path, for reporting
    pub destination: PathBuf,
}

/// Build copy tasks in relative-path order.
///
/// Each distinct destination folder is prepared through `target` once;
/// later tasks in the same folder reuse the cached handle.
pub fn plan<I, T: CopyTarget>(
    copy_plan: BTreeMap<String, I>,
    destination_root: &Path,
    target: &mut T,
) -> Result<Vec<CopyTask<I, T::Folder>>> {
    let mut folders: HashMap<PathBuf, T::Folder> = HashMap::new();
    let mut tasks = Vec::with_capacity(copy_plan.len());

    for (relative_path, source) in copy_plan {
        let (folder_path, file_name) = split_destination(destination_root, &relative_path)?;

        let folder = match folders.entry(folder_path.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                debug!("Preparing destination folder {}", folder_path.display());
                entry.insert(target.ensure_folder(&folder_path)?).clone()
            }
        };

        tasks.push(CopyTask {
            destination: folder_path.join(&file_name),
            relative_path,
            source,
            folder,
            file_name,
        });
    }

    info!(
        "Files to copy: {} into {} folders",
        tasks.len(),
        folders.len()
    );
    Ok(tasks)
}

/// Map a relative source path onto the destination tree.
///
/// `/` separates components whenever it occurs; otherwise the path is read
/// as a Windows-style `\` path. A backslash inside a `/` path stays part of
/// its component.
fn split_destination(destination_root: &Path, relative_path: &str) -> Result<(PathBuf, String)> {
    let invalid = || Error::PathAssumption {
        path: relative_path.to_string(),
        expected_prefix: "a relative file path".to_string(),
    };

    let separator = if relative_path.contains('/') { '/' } else { '\\' };
    let mut components: Vec<&str> = relative_path
        .split(separator)
        .filter(|c| !c.is_empty())
        .collect();
    if components.iter().any(|c| *c == "." || *c == "..") {
        return Err(invalid());
    }
    let file_name = components.pop().ok_or_else(invalid)?;

    let mut folder = destination_root.to_path_buf();
    folder.extend(components);
    Ok((folder, file_name.to_string()))
}
