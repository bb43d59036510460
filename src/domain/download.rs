//! Planning of downloader invocations
//!
//! Every queued link becomes one `DownloadJob`: the folder it goes to and the
//! command line handed to the shell. Nothing here touches processes.

use std::path::{Path, PathBuf};

use super::link_kind::{DownloadFolders, LinkKind};

/// How the external downloader is invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    pub program: String,
    pub args: Vec<String>,
    /// Flag that receives the target folder, e.g. `-P` for yt-dlp
    pub output_flag: Option<String>,
    pub playlist_args: Vec<String>,
}

/// One downloader launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: String,
    pub kind: LinkKind,
    pub target_dir: PathBuf,
    pub command_line: String,
}

/// Builds one job per link, keeping list order
///
/// With `route_by_site` off every link goes to the base folder.
pub fn plan_jobs(
    urls: &[String],
    template: &CommandTemplate,
    folders: &DownloadFolders,
    route_by_site: bool,
) -> Vec<DownloadJob> {
    urls.iter()
        .map(|url| {
            let kind = LinkKind::classify(url);
            let target_dir = if route_by_site {
                folders.for_kind(kind)
            } else {
                folders.base().to_path_buf()
            };
            let command_line = build_command_line(template, kind, &target_dir, url);
            DownloadJob {
                url: url.clone(),
                kind,
                target_dir,
                command_line,
            }
        })
        .collect()
}

/// `program args… [playlist args…] [output flag + dir] url`
pub fn build_command_line(
    template: &CommandTemplate,
    kind: LinkKind,
    target_dir: &Path,
    url: &str,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(template.args.len() + 4);
    parts.push(quote_for_cmd(&template.program));
    parts.extend(template.args.iter().map(|arg| quote_for_cmd(arg)));

    if kind.is_playlist() {
        parts.extend(template.playlist_args.iter().map(|arg| quote_for_cmd(arg)));
    }

    if let Some(flag) = template.output_flag.as_deref().filter(|f| !f.is_empty()) {
        parts.push(quote_for_cmd(flag));
        parts.push(quote_for_cmd(&target_dir.to_string_lossy()));
    }

    parts.push(quote_for_cmd(url));
    parts.join(" ")
}

/// Quotes one argument for `cmd.exe`
///
/// Inside double quotes cmd.exe treats `&`, `|`, `<`, `>`, `^` and `(`/`)`
/// literally. A double quote cannot be escaped there, so it is dropped.
/// Trailing backslashes are doubled so the program's argument splitter does
/// not read the closing quote as an escaped one.
pub fn quote_for_cmd(arg: &str) -> String {
    const SPECIAL: &[char] = &[' ', '\t', '&', '|', '<', '>', '^', '(', ')', ',', ';', '=', '!'];

    let cleaned: String = arg.chars().filter(|&c| c != '"').collect();
    if !cleaned.is_empty() && !cleaned.contains(SPECIAL) {
        return cleaned;
    }

    let trailing = cleaned.len() - cleaned.trim_end_matches('\\').len();
    format!("\"{cleaned}{}\"", "\\".repeat(trailing))
}
