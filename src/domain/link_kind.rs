//! Link classification and download folder routing

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use url::Url;

/// What a queued link points at, as far as routing is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    YoutubePlaylist,
    YoutubeVideo,
    Pinterest,
    Other,
}

impl LinkKind {
    /// Classifies a link by host and path
    ///
    /// Text that does not parse as a URL is `Other`; it is still handed to
    /// the downloader, which decides what to do with it.
    pub fn classify(link: &str) -> Self {
        let Ok(url) = Url::parse(link.trim()) else {
            return Self::Other;
        };
        let Some(host) = url.host_str() else {
            return Self::Other;
        };
        let host = host.to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);

        if is_youtube_host(host) {
            if url.path().trim_end_matches('/') == "/playlist" {
                return Self::YoutubePlaylist;
            }
            return Self::YoutubeVideo;
        }

        if host == "pin.it" || host.split('.').any(|label| label == "pinterest") {
            return Self::Pinterest;
        }

        Self::Other
    }

    pub fn is_playlist(self) -> bool {
        self == Self::YoutubePlaylist
    }
}

fn is_youtube_host(host: &str) -> bool {
    const DOMAINS: [&str; 3] = ["youtube.com", "youtu.be", "youtube-nocookie.com"];
    DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
}

/// Download folder layout under the base downloads directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFolders {
    base: PathBuf,
}

impl DownloadFolders {
    pub const VIDEOS: &'static str = "Videos";
    pub const PLAYLISTS: &'static str = "Playlist Videos";
    pub const PICTURES: &'static str = "Pictures";

    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn videos(&self) -> PathBuf {
        self.base.join(Self::VIDEOS)
    }

    pub fn playlists(&self) -> PathBuf {
        self.videos().join(Self::PLAYLISTS)
    }

    pub fn pictures(&self) -> PathBuf {
        self.base.join(Self::PICTURES)
    }

    /// Folder a link of the given kind is downloaded into
    pub fn for_kind(&self, kind: LinkKind) -> PathBuf {
        match kind {
            LinkKind::YoutubePlaylist => self.playlists(),
            LinkKind::YoutubeVideo => self.videos(),
            LinkKind::Pinterest => self.pictures(),
            LinkKind::Other => self.base.clone(),
        }
    }

    /// Creates the base folder and every routed subfolder
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(self.playlists())?;
        fs::create_dir_all(self.pictures())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_youtube_links() {
        assert_eq!(
            LinkKind::classify("https://www.youtube.com/playlist?list=PL123"),
            LinkKind::YoutubePlaylist
        );
        assert_eq!(
            LinkKind::classify("https://music.youtube.com/playlist/?list=PL123"),
            LinkKind::YoutubePlaylist
        );
        assert_eq!(
            LinkKind::classify("https://www.youtube.com/watch?v=abc&list=PL123"),
            LinkKind::YoutubeVideo
        );
        assert_eq!(LinkKind::classify("https://youtu.be/abc"), LinkKind::YoutubeVideo);
        assert_eq!(LinkKind::classify("https://m.YouTube.com/shorts/x"), LinkKind::YoutubeVideo);
        assert_eq!(
            LinkKind::classify("https://www.youtube-nocookie.com/embed/abc"),
            LinkKind::YoutubeVideo
        );
    }

    #[test]
    fn classifies_pinterest_links() {
        assert_eq!(
            LinkKind::classify("https://www.pinterest.com/pin/123/"),
            LinkKind::Pinterest
        );
        assert_eq!(LinkKind::classify("https://pinterest.co.uk/pin/1"), LinkKind::Pinterest);
        assert_eq!(LinkKind::classify("https://pin.it/xyz"), LinkKind::Pinterest);
    }

    #[test]
    fn lookalike_hosts_are_not_youtube() {
        assert_eq!(LinkKind::classify("https://notyoutube.com/watch"), LinkKind::Other);
        assert_eq!(
            LinkKind::classify("https://example.com/youtube.com/playlist"),
            LinkKind::Other
        );
    }

    #[test]
    fn unparsable_text_is_other() {
        assert_eq!(LinkKind::classify("just some words"), LinkKind::Other);
        assert_eq!(LinkKind::classify(""), LinkKind::Other);
        assert_eq!(LinkKind::classify("mailto:someone@example.com"), LinkKind::Other);
    }

    #[test]
    fn folders_route_by_kind() {
        let folders = DownloadFolders::new("/data/Downloads");

        assert_eq!(
            folders.for_kind(LinkKind::YoutubePlaylist),
            PathBuf::from("/data/Downloads/Videos/Playlist Videos")
        );
        assert_eq!(
            folders.for_kind(LinkKind::YoutubeVideo),
            PathBuf::from("/data/Downloads/Videos")
        );
        assert_eq!(
            folders.for_kind(LinkKind::Pinterest),
            PathBuf::from("/data/Downloads/Pictures")
        );
        assert_eq!(folders.for_kind(LinkKind::Other), PathBuf::from("/data/Downloads"));
    }

    #[test]
    fn ensure_creates_all_folders() {
        let dir = tempfile::tempdir().unwrap();
        let folders = DownloadFolders::new(dir.path().join("Downloads"));

        folders.ensure().unwrap();

        assert!(folders.playlists().is_dir());
        assert!(folders.videos().is_dir());
        assert!(folders.pictures().is_dir());
    }
}
