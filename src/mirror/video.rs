//! Video mirroring via FFmpeg

use crate::error::{Error, Result};
use crate::fsops::temp_sibling;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, trace, warn};

/// Check if `program` runs and answers `-version` successfully
pub fn is_ffmpeg_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Something that can write a horizontally flipped copy of a video
pub trait VideoTranscoder {
    /// Write `input` flipped left-right to `output`, audio copied untouched
    fn flip_horizontal(&self, input: &Path, output: &Path) -> Result<()>;
}

/// Transcoder backed by the `ffmpeg` executable
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    available: OnceLock<bool>,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            available: OnceLock::new(),
        }
    }

    /// Availability of the executable, probed once per transcoder
    pub fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| is_ffmpeg_available(&self.program))
    }

    /// Arguments for flipping `input` into `output`
    pub fn build_args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-v", "error", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(input.as_os_str().to_owned());
        args.extend(
            [
                "-map_metadata",
                "0",
                "-vf",
                "hflip",
                "-c:a",
                "copy",
            ]
            .iter()
            .map(OsString::from),
        );
        args.push(output.as_os_str().to_owned());
        args
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl VideoTranscoder for FfmpegTranscoder {
    fn flip_horizontal(&self, input: &Path, output: &Path) -> Result<()> {
        if !self.is_available() {
            return Err(Error::FfmpegNotFound);
        }

        let args = Self::build_args(input, output);
        trace!(?args, "Running ffmpeg");

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|e| Error::Transcode {
                path: input.to_path_buf(),
                message: format!("Failed to execute ffmpeg: {}", e),
            })?;

        if !result.status.success() {
            return Err(Error::Transcode {
                path: input.to_path_buf(),
                message: format!(
                    "ffmpeg exited with {}: {}",
                    result.status,
                    String::from_utf8_lossy(&result.stderr).trim()
                ),
            });
        }

        Ok(())
    }
}

/// Flip the video at `path` in place
///
/// The transcoder writes to a temporary sibling which replaces `path` only
/// after a successful transcode. On failure `path` is untouched and the
/// temporary file is removed.
pub fn mirror_video_in_place(transcoder: &dyn VideoTranscoder, path: &Path) -> Result<()> {
    let temp = temp_sibling(path, "mirror-tmp");

    let outcome = transcoder.flip_horizontal(path, &temp).and_then(|()| {
        if !temp.is_file() {
            return Err(Error::Transcode {
                path: path.to_path_buf(),
                message: "transcoder produced no output".to_string(),
            });
        }
        fs::rename(&temp, path)?;
        Ok(())
    });

    if outcome.is_err()
        && temp.exists()
        && let Err(e) = fs::remove_file(&temp)
    {
        warn!(temp = %temp.display(), error = %e, "Failed to remove temporary video");
    }

    if outcome.is_ok() {
        debug!(path = %path.display(), "Mirrored video");
    }
    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Writes the input bytes reversed as the "flipped" output
    pub(crate) struct FakeTranscoder;

    impl VideoTranscoder for FakeTranscoder {
        fn flip_horizontal(&self, input: &Path, output: &Path) -> Result<()> {
            let mut bytes = fs::read(input)?;
            bytes.reverse();
            fs::write(output, bytes)?;
            Ok(())
        }
    }

    /// Leaves partial output behind, then fails like a non-zero exit
    pub(crate) struct FailingTranscoder;

    impl VideoTranscoder for FailingTranscoder {
        fn flip_horizontal(&self, input: &Path, output: &Path) -> Result<()> {
            fs::write(output, b"partial")?;
            Err(Error::Transcode {
                path: input.to_path_buf(),
                message: "ffmpeg exited with exit status: 1".into(),
            })
        }
    }

    #[test]
    fn test_args_flip_video_and_copy_audio() {
        let args = FfmpegTranscoder::build_args(Path::new("in.mov"), Path::new("out.mov"));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-i") + 1], "in.mov");
        assert_eq!(args[pos("-vf") + 1], "hflip");
        assert_eq!(args[pos("-c:a") + 1], "copy");
        assert_eq!(args.last().unwrap(), "out.mov");
        assert!(args.contains(&"-y".to_string()));
    }

    #[test]
    fn test_success_replaces_original() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("001_042025-042025_live.mov");
        fs::write(&path, b"abc").unwrap();

        mirror_video_in_place(&FakeTranscoder, &path).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"cba");
        assert!(!temp_sibling(&path, "mirror-tmp").exists());
    }

    #[test]
    fn test_failure_leaves_original_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("001_042025-042025_live.mov");
        fs::write(&path, b"original motion").unwrap();

        let result = mirror_video_in_place(&FailingTranscoder, &path);

        assert!(matches!(result, Err(Error::Transcode { .. })));
        assert_eq!(fs::read(&path).unwrap(), b"original motion");
        assert!(!temp_sibling(&path, "mirror-tmp").exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_version_check_is_unavailable() {
        // `false` spawns fine but exits non-zero
        assert!(!is_ffmpeg_available(Path::new("false")));
        assert!(!FfmpegTranscoder::new("false").is_available());
        assert!(!is_ffmpeg_available(Path::new("/nonexistent/ffmpeg")));
    }

    #[test]
    fn test_missing_executable_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mov");
        fs::write(&path, b"bytes").unwrap();

        let transcoder = FfmpegTranscoder::new(dir.path().join("no-such-ffmpeg"));
        let result = mirror_video_in_place(&transcoder, &path);
        assert!(result.is_err());
        assert_eq!(fs::read(&path).unwrap(), b"bytes");
    }
}
