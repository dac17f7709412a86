//! Media download helpers: variant selection and chunked draining.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use futures::{Stream, StreamExt};
use vidgen_core::error::CoreError;

use crate::api::VideoApiError;

/// Media rendition to download for a finished job.
///
/// Omitting the variant lets the service pick its default (MP4 video).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadVariant {
    Video,
    Thumbnail,
    Spritesheet,
}

impl DownloadVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
            Self::Spritesheet => "spritesheet",
        }
    }

    /// File extension of the rendition.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Video => "mp4",
            Self::Thumbnail => "webp",
            Self::Spritesheet => "jpg",
        }
    }
}

impl FromStr for DownloadVariant {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "video" | "mp4" => Ok(Self::Video),
            "thumbnail" => Ok(Self::Thumbnail),
            "spritesheet" => Ok(Self::Spritesheet),
            other => Err(CoreError::Validation(format!(
                "Unknown download variant: '{other}'. Valid variants: video, thumbnail, spritesheet"
            ))),
        }
    }
}

/// Default file name for a downloaded rendition, e.g. `video_123.mp4`.
pub fn file_name_for(job_id: &str, variant: Option<DownloadVariant>) -> String {
    let ext = variant.unwrap_or(DownloadVariant::Video).extension();
    format!("{job_id}.{ext}")
}

/// Sibling path a download is written to before it is complete,
/// e.g. `out/video_1.mp4.part`.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    PathBuf::from(partial)
}

/// Feed every chunk of `stream` into `sink`, returning the total number
/// of bytes written.
///
/// Stops at the first stream or sink error; bytes already handed to the
/// sink stay there.
pub async fn drain_stream<S, B, E, F>(stream: S, mut sink: F) -> Result<u64, VideoApiError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<VideoApiError>,
    F: FnMut(&[u8]) -> std::io::Result<()>,
{
    let mut stream = std::pin::pin!(stream);
    let mut total = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::into)?;
        let bytes = chunk.as_ref();
        sink(bytes)?;
        total += bytes.len() as u64;
    }

    Ok(total)
}
