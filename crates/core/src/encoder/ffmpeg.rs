//! FFmpeg-based encoder implementation.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use super::config::EncoderConfig;
use super::error::TranscodeError;
use super::traits::Encoder;
use super::types::{EncodePass, EncodeRequest};
use crate::process::StderrTail;

/// Encoder that shells out to ffmpeg.
pub struct FfmpegEncoder {
    config: EncoderConfig,
}

impl FfmpegEncoder {
    /// Creates a new FFmpeg encoder with the given configuration.
    pub fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Creates an encoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(EncoderConfig::default())
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Builds ffmpeg arguments for one pass.
    fn build_args(&self, request: &EncodeRequest) -> Vec<String> {
        let input = request.input.to_string_lossy().to_string();
        let mut args = self.config.base_args.clone();

        match request.pass.number() {
            None => {
                args.extend([
                    "-y".to_string(),
                    "-hwaccel".to_string(),
                    "cuda".to_string(),
                    "-hwaccel_output_format".to_string(),
                    "cuda".to_string(),
                    "-i".to_string(),
                    input,
                    "-c:v".to_string(),
                    "h264_nvenc".to_string(),
                    "-preset".to_string(),
                    self.config.gpu_preset.clone(),
                    "-c:a".to_string(),
                    "copy".to_string(),
                    "-r:v".to_string(),
                    self.config.frame_rate.clone(),
                ]);
            }
            Some(n) => {
                args.extend([
                    "-i".to_string(),
                    input,
                    "-y".to_string(),
                    "-c:v".to_string(),
                    "h264".to_string(),
                    "-b:v".to_string(),
                    self.config.cpu_bitrate.clone(),
                    "-c:a".to_string(),
                    "copy".to_string(),
                    "-s".to_string(),
                    self.config.cpu_resolution.clone(),
                    "-r:v".to_string(),
                    self.config.frame_rate.clone(),
                    "-passlogfile".to_string(),
                    request.passlog().to_string_lossy().to_string(),
                    "-pass".to_string(),
                    n.to_string(),
                ]);
            }
        }

        args.extend(self.config.extra_args.iter().cloned());
        args.push(request.output.to_string_lossy().to_string());
        args
    }

    fn unavailable_or_io(&self, e: std::io::Error) -> TranscodeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            TranscodeError::ToolUnavailable {
                program: self.config.program.clone(),
            }
        } else {
            TranscodeError::Io(e)
        }
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn encode(&self, request: &EncodeRequest) -> Result<(), TranscodeError> {
        let args = self.build_args(request);
        debug!(pass = %request.pass, args = ?args, "Running ffmpeg");

        let mut child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.unavailable_or_io(e))?;

        let stderr = child.stderr.take().map(StderrTail::spawn);
        let status = child.wait().await?;

        if status.success() {
            return Ok(());
        }

        let stderr = match stderr {
            Some(tail) => tail.collect().await,
            None => None,
        };
        warn!(
            pass = %request.pass,
            code = ?status.code(),
            input = %request.input.display(),
            "ffmpeg failed"
        );
        Err(TranscodeError::encode_failed(
            request.pass,
            status.code(),
            stderr,
        ))
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let output = Command::new(&self.config.program)
            .args(&self.config.base_args)
            .arg("-version")
            .output()
            .await
            .map_err(|e| self.unavailable_or_io(e))?;

        if !output.status.success() {
            return Err(TranscodeError::encode_failed(
                EncodePass::Single,
                output.status.code(),
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn request(pass: EncodePass) -> EncodeRequest {
        EncodeRequest {
            input: PathBuf::from("/dl/clip.mkv"),
            output: PathBuf::from("/dl/clip.mkv-recoded.mkv"),
            pass,
        }
    }

    #[test]
    fn test_gpu_args() {
        let encoder = FfmpegEncoder::with_defaults();
        let args = encoder.build_args(&request(EncodePass::Single));

        assert_eq!(
            args,
            vec![
                "-y",
                "-hwaccel",
                "cuda",
                "-hwaccel_output_format",
                "cuda",
                "-i",
                "/dl/clip.mkv",
                "-c:v",
                "h264_nvenc",
                "-preset",
                "medium",
                "-c:a",
                "copy",
                "-r:v",
                "29.97",
                "/dl/clip.mkv-recoded.mkv",
            ]
        );
    }

    #[test]
    fn test_cpu_pass_args() {
        let encoder = FfmpegEncoder::with_defaults();

        let first = encoder.build_args(&request(EncodePass::First));
        assert!(first.windows(2).any(|w| w == ["-passlogfile", "/dl/clip.mkv"]));
        assert!(first.windows(2).any(|w| w == ["-pass", "1"]));
        assert!(first.windows(2).any(|w| w == ["-s", "1600x900"]));
        assert!(first.windows(2).any(|w| w == ["-b:v", "2M"]));
        assert!(!first.contains(&"-hwaccel".to_string()));

        let second = encoder.build_args(&request(EncodePass::Second));
        assert!(second.windows(2).any(|w| w == ["-pass", "2"]));
        assert_eq!(second.last().map(String::as_str), Some("/dl/clip.mkv-recoded.mkv"));
    }

    #[test]
    fn test_base_and_extra_args() {
        let mut config =
            EncoderConfig::with_program("/bin/sh", vec!["fake-ffmpeg.sh".to_string()]);
        config.extra_args = vec!["-threads".to_string(), "2".to_string()];
        let args = FfmpegEncoder::new(config).build_args(&request(EncodePass::Single));

        assert_eq!(args[0], "fake-ffmpeg.sh");
        let n = args.len();
        assert_eq!(&args[n - 3..n - 1], ["-threads", "2"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_unavailable() {
        let config = EncoderConfig::with_program("/nonexistent/ffmpeg-binary", vec![]);
        let encoder = FfmpegEncoder::new(config);

        let err = encoder.encode(&request(EncodePass::Single)).await.unwrap_err();
        assert!(matches!(err, TranscodeError::ToolUnavailable { .. }));

        let err = encoder.validate().await.unwrap_err();
        assert!(matches!(err, TranscodeError::ToolUnavailable { .. }));
    }
}
