//! ffmpeg/ffprobe subprocess backends.
//!
//! Everything here shells out to the binaries on `PATH`; without the
//! `media-ffmpeg` feature the entry points return errors instead.

use std::path::{Path, PathBuf};

use crate::{
    audio::buffer::AudioBuffer,
    foundation::error::{ReelError, ReelResult},
};

#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration_sec: f64,
}

#[cfg(feature = "media-ffmpeg")]
pub use handle::FfmpegVideo;

#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> ReelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::decode(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::decode(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::decode("no video stream found"))?;
    let (width, height) = video_stream
        .width
        .zip(video_stream.height)
        .ok_or_else(|| ReelError::decode("missing video dimensions from ffprobe"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        duration_sec,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> ReelResult<VideoSourceInfo> {
    Err(ReelError::validation(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

/// One straight RGBA8 frame at `source_time_sec`.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_video_frame_rgba8(
    source: &VideoSourceInfo,
    source_time_sec: f64,
) -> ReelResult<Vec<u8>> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{source_time_sec:.9}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::decode(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::decode(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 {
        return Err(ReelError::decode(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if out.stdout.len() < expected_len {
        return Err(ReelError::decode(format!(
            "ffmpeg returned {} bytes for '{}', expected {expected_len}",
            out.stdout.len(),
            source.source_path.display()
        )));
    }
    let mut frame = out.stdout;
    frame.truncate(expected_len);
    Ok(frame)
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_video_frame_rgba8(
    _source: &VideoSourceInfo,
    _source_time_sec: f64,
) -> ReelResult<Vec<u8>> {
    Err(ReelError::validation(
        "video sources require the 'media-ffmpeg' feature",
    ))
}

/// Decode the whole audio stream as interleaved stereo f32 at `sample_rate`.
///
/// Files without an audio stream decode to an empty buffer.
#[cfg(feature = "media-ffmpeg")]
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> ReelResult<AudioBuffer> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::audio(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        if msg.contains("Stream specifier")
            || msg.contains("matches no streams")
            || msg.contains("Output file #0 does not contain any stream")
        {
            return AudioBuffer::new(sample_rate, 2, Vec::new());
        }
        return Err(ReelError::audio(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(8) {
        return Err(ReelError::audio(
            "decoded audio byte length is not aligned to stereo f32 frames",
        ));
    }
    let samples = out
        .stdout
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    AudioBuffer::new(sample_rate, 2, samples)
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_audio_f32_stereo(path: &Path, _sample_rate: u32) -> ReelResult<AudioBuffer> {
    Err(ReelError::audio(format!(
        "decoding '{}' requires the 'media-ffmpeg' feature",
        path.display()
    )))
}

#[cfg(feature = "media-ffmpeg")]
mod handle {
    use std::sync::{Arc, mpsc};

    use image::RgbaImage;

    use super::{VideoSourceInfo, decode_video_frame_rgba8, probe_video};
    use crate::{
        foundation::error::{ReelError, ReelResult},
        media::{decode::local_path, seek::AsyncSeeker, source::DecodedVideo},
    };

    /// Seekable handle that decodes one frame per seek on a worker thread.
    pub struct FfmpegVideo {
        url: String,
        info: Arc<VideoSourceInfo>,
        seeker: AsyncSeeker,
    }

    impl FfmpegVideo {
        pub fn open(url: &str) -> ReelResult<Self> {
            let info = probe_video(&local_path(url)?)?;
            tracing::debug!(
                url,
                w = info.width,
                h = info.height,
                dur = info.duration_sec,
                "opened video"
            );
            Ok(Self {
                url: url.to_string(),
                info: Arc::new(info),
                seeker: AsyncSeeker::new(),
            })
        }
    }

    impl DecodedVideo for FfmpegVideo {
        fn url(&self) -> &str {
            &self.url
        }

        fn duration_secs(&self) -> f64 {
            self.info.duration_sec
        }

        fn current_time(&self) -> f64 {
            self.seeker.current_time()
        }

        fn begin_seek(&mut self, target_secs: f64) -> mpsc::Receiver<ReelResult<()>> {
            let info = Arc::clone(&self.info);
            self.seeker.begin_seek(target_secs, move |t| {
                let raw = decode_video_frame_rgba8(&info, t)?;
                RgbaImage::from_raw(info.width, info.height, raw)
                    .ok_or_else(|| ReelError::decode("decoded frame has wrong size"))
            })
        }

        fn sample(&mut self) -> ReelResult<RgbaImage> {
            self.seeker.frame().ok_or_else(|| {
                ReelError::decode(format!("no frame decoded yet for '{}'", self.url))
            })
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/media/ffmpeg.rs"]
mod tests;
