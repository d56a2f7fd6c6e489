//! Turn a folder of text files into documents.
//!
//! The first two directories below the root become `system` and `subsystem`:
//! `root/hvac/air/filters.txt` is system `hvac`, subsystem `air`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use docqa_core::types::Document;

const TEXT_EXTENSIONS: &[(&str, &str)] = &[
    ("txt", "text/plain"),
    ("md", "text/markdown"),
    ("csv", "text/csv"),
    ("log", "text/plain"),
    ("json", "application/json"),
];

/// Supported files under `root`, sorted by path.
pub fn list_text_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && mime_type_for(e.path()).is_some())
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}

pub fn load_document(root: &Path, path: &Path) -> Result<Document> {
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes).into_owned();
    let relative = path.strip_prefix(root).unwrap_or(path);
    let (system, subsystem) = system_from_path(relative);
    let mime = mime_type_for(path).unwrap_or("text/plain");
    Ok(Document::new(relative.to_string_lossy(), content).with_system(system, subsystem).with_mime_type(mime))
}

pub fn load_documents(root: &Path) -> Result<Vec<Document>> {
    list_text_files(root).iter().map(|p| load_document(root, p)).collect()
}

fn system_from_path(relative: &Path) -> (String, String) {
    let dirs: Vec<String> = relative
        .parent()
        .map(|p| p.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect())
        .unwrap_or_default();
    let system = dirs.first().cloned().unwrap_or_default();
    let subsystem = dirs.get(1).cloned().unwrap_or_default();
    (system, subsystem)
}

fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    TEXT_EXTENSIONS.iter().find(|(e, _)| *e == ext).map(|(_, mime)| *mime)
}
