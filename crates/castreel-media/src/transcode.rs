//! FFmpeg command builder and transcoder.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use castreel_models::encoding::OUTPUT_EXTENSION;
use castreel_models::TranscodeSettings;

use crate::error::{MediaError, MediaResult};
use crate::processor::MediaProcessor;

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set CRF (quality).
    pub fn crf(self, crf: u8) -> Self {
        self.output_arg("-crf").output_arg(crf.to_string())
    }

    /// Set preset.
    pub fn preset(self, preset: impl Into<String>) -> Self {
        self.output_arg("-preset").output_arg(preset)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }

    /// Run the command to completion.
    pub async fn run(&self) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = self.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(MediaError::ffmpeg_failed(
                format!("transcode of {} failed", self.input.display()),
                Some(stderr),
                output.status.code(),
            ));
        }

        Ok(())
    }
}

/// Transcoder that normalizes an uploaded video to a delivery-ready MP4.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    settings: TranscodeSettings,
}

impl FfmpegTranscoder {
    /// Create a transcoder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcoder with the given settings.
    pub fn with_settings(settings: TranscodeSettings) -> Self {
        Self { settings }
    }

    /// Output path for a given input: sibling file with a `_processed`
    /// suffix and the delivery container extension.
    pub fn output_path(input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());
        input.with_file_name(format!("{}_processed.{}", stem, OUTPUT_EXTENSION))
    }
}

#[async_trait]
impl MediaProcessor for FfmpegTranscoder {
    async fn process(&self, input: &Path) -> MediaResult<PathBuf> {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }

        let output = Self::output_path(input);

        FfmpegCommand::new(input, &output)
            .video_codec(&self.settings.codec)
            .preset(&self.settings.preset)
            .crf(self.settings.crf)
            .audio_codec(&self.settings.audio_codec)
            .audio_bitrate(&self.settings.audio_bitrate)
            .output_args(self.settings.extra_args.clone())
            .output_arg("-movflags")
            .output_arg("+faststart")
            .run()
            .await?;

        info!(
            "Transcoded {} to {}",
            input.display(),
            output.display()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args_order() {
        let cmd = FfmpegCommand::new("/tmp/in.mov", "/tmp/out.mp4")
            .video_codec("libx264")
            .crf(23);
        let args = cmd.build_args();

        assert_eq!(args[0], "-y");
        assert_eq!(args[1], "-v");
        assert_eq!(args[2], "error");
        assert_eq!(args[3], "-i");
        assert_eq!(args[4], "/tmp/in.mov");
        assert_eq!(args[5], "-c:v");
        assert_eq!(args[6], "libx264");
        assert_eq!(args[7], "-crf");
        assert_eq!(args[8], "23");
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));
    }

    #[test]
    fn test_output_path() {
        let out = FfmpegTranscoder::output_path(Path::new("/work/item-abc.mov"));
        assert_eq!(out, PathBuf::from("/work/item-abc_processed.mp4"));
    }

    #[tokio::test]
    async fn test_missing_input_fails_fast() {
        let transcoder = FfmpegTranscoder::new();
        let err = transcoder
            .process(Path::new("/nonexistent/input.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
