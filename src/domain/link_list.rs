//! Persisted list of queued links
//!
//! The list is a plain text file with one URL per line, stored as UTF-16LE
//! with a BOM so Notepad opens it without guessing. Files edited by hand in
//! another encoding are still read, and get normalized on the next append.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];
const UTF16BE_BOM: [u8; 2] = [0xFE, 0xFF];
const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];
const LINE_END: &str = "\r\n";

/// Link list errors
#[derive(Debug, thiserror::Error)]
pub enum LinkListError {
    #[error("failed to read link list {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write link list {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// Encoding detected at the start of a list file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf16Le,
    Utf16Be,
    Utf8,
}

/// Handle to the link list file
///
/// Every operation opens and closes the file, so the user can keep it open
/// in an editor while the tray app runs.
#[derive(Debug, Clone)]
pub struct LinkList {
    path: PathBuf,
}

impl LinkList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the file (and its directory) if it does not exist yet
    pub fn ensure_exists(&self) -> Result<(), LinkListError> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
        }
        File::create(&self.path).map_err(|source| self.write_error(source))?;
        Ok(())
    }

    /// Returns the queued links in insertion order
    ///
    /// A missing file is an empty list.
    pub fn read(&self) -> Result<Vec<String>, LinkListError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(self.read_error(source)),
        };
        Ok(extract_links(&decode_text(&bytes)))
    }

    /// Appends one line per link and returns how many were written
    ///
    /// With `skip_duplicates` set, links already in the file and repeats
    /// within `links` are dropped.
    pub fn append(&self, links: &[String], skip_duplicates: bool) -> Result<usize, LinkListError> {
        let existing = match fs::read(&self.path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(source) => return Err(self.read_error(source)),
        };

        let mut seen: HashSet<String> = HashSet::new();
        if skip_duplicates {
            if let Some(bytes) = &existing {
                seen.extend(extract_links(&decode_text(bytes)));
            }
        }

        let fresh: Vec<&String> = links
            .iter()
            .filter(|link| !skip_duplicates || seen.insert((*link).clone()))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        let mut text = String::new();
        for link in &fresh {
            text.push_str(link);
            text.push_str(LINE_END);
        }

        match existing {
            Some(bytes) if !bytes.is_empty() => {
                if detect_encoding(&bytes) == (TextEncoding::Utf16Le, true) {
                    let mut prefix = String::new();
                    if !ends_with_newline_utf16le(&bytes) {
                        prefix.push_str(LINE_END);
                    }
                    prefix.push_str(&text);
                    self.append_raw(&encode_utf16le_body(&prefix))?;
                } else {
                    // Normalize a hand-edited file before adding to it
                    let mut body = decode_text(&bytes);
                    if !body.is_empty() && !body.ends_with('\n') {
                        body.push_str(LINE_END);
                    }
                    body.push_str(&text);
                    self.write_all(&encode_utf16le(&body))?;
                }
            }
            _ => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
                }
                self.write_all(&encode_utf16le(&text))?;
            }
        }

        Ok(fresh.len())
    }

    /// Truncates the file to zero length
    pub fn clear(&self) -> Result<(), LinkListError> {
        File::create(&self.path).map_err(|source| self.write_error(source))?;
        Ok(())
    }

    fn append_raw(&self, bytes: &[u8]) -> Result<(), LinkListError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|source| self.write_error(source))?;
        file.write_all(bytes).map_err(|source| self.write_error(source))
    }

    fn write_all(&self, bytes: &[u8]) -> Result<(), LinkListError> {
        fs::write(&self.path, bytes).map_err(|source| self.write_error(source))
    }

    fn read_error(&self, source: io::Error) -> LinkListError {
        LinkListError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn write_error(&self, source: io::Error) -> LinkListError {
        LinkListError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

/// Splits text into trimmed, non-empty lines
pub fn extract_links(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.trim().trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Guesses the encoding of a list file, and whether a BOM was present
pub fn detect_encoding(bytes: &[u8]) -> (TextEncoding, bool) {
    if bytes.starts_with(&UTF16LE_BOM) {
        return (TextEncoding::Utf16Le, true);
    }
    if bytes.starts_with(&UTF16BE_BOM) {
        return (TextEncoding::Utf16Be, true);
    }
    if bytes.starts_with(&UTF8_BOM) {
        return (TextEncoding::Utf8, true);
    }

    // BOM-less UTF-16LE: ASCII text leaves every odd byte zero
    let looks_utf16le = bytes.len() >= 2
        && bytes.len() % 2 == 0
        && bytes.iter().skip(1).step_by(2).all(|&b| b == 0);
    if looks_utf16le {
        (TextEncoding::Utf16Le, false)
    } else {
        (TextEncoding::Utf8, false)
    }
}

/// Decodes list file bytes into text, replacing invalid sequences
pub fn decode_text(bytes: &[u8]) -> String {
    let (encoding, has_bom) = detect_encoding(bytes);
    match encoding {
        TextEncoding::Utf8 => {
            let body = if has_bom { &bytes[UTF8_BOM.len()..] } else { bytes };
            String::from_utf8_lossy(body).into_owned()
        }
        TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
            let body = if has_bom { &bytes[2..] } else { bytes };
            let units: Vec<u16> = body
                .chunks_exact(2)
                .map(|pair| match encoding {
                    TextEncoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
                    _ => u16::from_le_bytes([pair[0], pair[1]]),
                })
                .collect();
            String::from_utf16_lossy(&units)
        }
    }
}

/// Encodes text as UTF-16LE with a leading BOM
pub fn encode_utf16le(text: &str) -> Vec<u8> {
    let mut bytes = UTF16LE_BOM.to_vec();
    bytes.extend(encode_utf16le_body(text));
    bytes
}

fn encode_utf16le_body(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn ends_with_newline_utf16le(bytes: &[u8]) -> bool {
    // A BOM-only file counts as terminated
    bytes.len() <= UTF16LE_BOM.len() || bytes.ends_with(&[b'\n', 0])
}
