//! Audio file assembly using FFmpeg.

use super::capability::{Capabilities, Capability};
use crate::error::{ConvertError, Result};
use crate::tts::AudioSegment;
use log::{error, info};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Silence inserted between consecutive segments.
pub const INTER_SEGMENT_PAUSE: Duration = Duration::from_secs(1);

/// Sample format every input is converted to before concatenation.
const SAMPLE_RATE: u32 = 24_000;

/// Result of an assembly attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssemblyOutcome {
    /// All segments merged into this file
    Merged(PathBuf),
    /// Nothing merged; the segments stand alone
    Unmerged,
    /// The merge failed; the segments stand alone
    Failed(String),
}

/// Strategy for turning per-chunk segments into the final output.
pub trait Assembler {
    fn name(&self) -> &'static str;

    /// Whether this strategy ever produces a merged file.
    fn merges(&self) -> bool;

    /// Combine `segments` (in index order) into `output`.
    fn assemble(&self, segments: &[AudioSegment], output: &Path) -> AssemblyOutcome;
}

/// Used when no merge backend is available: segments are returned unchanged.
pub struct PassThrough;

impl Assembler for PassThrough {
    fn name(&self) -> &'static str {
        "pass-through"
    }

    fn merges(&self) -> bool {
        false
    }

    fn assemble(&self, _segments: &[AudioSegment], _output: &Path) -> AssemblyOutcome {
        AssemblyOutcome::Unmerged
    }
}

/// Merges segments with ffmpeg, one pause between each pair.
pub struct FfmpegAssembler {
    ffmpeg: PathBuf,
    pause: Duration,
}

impl FfmpegAssembler {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            pause: INTER_SEGMENT_PAUSE,
        }
    }

    /// Run ffmpeg into a temporary file next to `output`, then move it into
    /// place. A failed run leaves nothing behind.
    fn merge(&self, segments: &[AudioSegment], output: &Path) -> Result<()> {
        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let extension = output
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_else(|| "mp3".to_string());

        let temp = tempfile::Builder::new()
            .prefix(".merging-")
            .suffix(&format!(".{}", extension))
            .tempfile_in(dir)?;

        let inputs: Vec<&Path> = segments.iter().map(|s| s.path.as_path()).collect();
        let args = build_merge_args(&inputs, self.pause, &extension, temp.path());

        let result = Command::new(&self.ffmpeg)
            .args(&args)
            .output()
            .map_err(|e| ConvertError::AssemblyFailed(format!("failed to run ffmpeg: {}", e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ConvertError::AssemblyFailed(format!(
                "ffmpeg concat failed: {}",
                stderr.trim()
            )));
        }

        temp.persist(output)
            .map_err(|e| ConvertError::AssemblyFailed(e.error.to_string()))?;
        Ok(())
    }
}

impl Assembler for FfmpegAssembler {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    fn merges(&self) -> bool {
        true
    }

    fn assemble(&self, segments: &[AudioSegment], output: &Path) -> AssemblyOutcome {
        if segments.len() <= 1 {
            return AssemblyOutcome::Unmerged;
        }

        info!("Merging {} audio files...", segments.len());
        match self.merge(segments, output) {
            Ok(()) => {
                info!("Merged audiobook saved as: {}", output.display());
                AssemblyOutcome::Merged(output.to_path_buf())
            }
            Err(e) => {
                error!("Error merging audio files: {}", e);
                AssemblyOutcome::Failed(e.to_string())
            }
        }
    }
}

/// Pick the assembly strategy for the detected capabilities.
pub fn select_assembler(capabilities: &Capabilities) -> Box<dyn Assembler> {
    match capabilities.ffmpeg() {
        Some(ffmpeg) if capabilities.has(Capability::AudioMerge) => {
            Box::new(FfmpegAssembler::new(ffmpeg))
        }
        _ => Box::new(PassThrough),
    }
}

/// Audio codec for an output extension.
fn codec_for(extension: &str) -> &'static [&'static str] {
    match extension.to_ascii_lowercase().as_str() {
        "wav" => &["-c:a", "pcm_s16le"],
        "m4a" | "m4b" => &["-c:a", "aac", "-b:a", "64k"],
        _ => &["-c:a", "libmp3lame", "-b:a", "64k"],
    }
}

/// Build the concat filter graph: every input but the last is padded with
/// `pause` of silence, then all are concatenated.
fn build_concat_filter(count: usize, pause: Duration) -> String {
    let mut filter = String::new();

    for i in 0..count {
        filter.push_str(&format!(
            "[{i}:a]aformat=sample_rates={SAMPLE_RATE}:channel_layouts=mono"
        ));
        if i + 1 < count {
            filter.push_str(&format!(",apad=pad_dur={}", pause.as_secs_f64()));
        }
        filter.push_str(&format!("[a{i}];"));
    }

    for i in 0..count {
        filter.push_str(&format!("[a{i}]"));
    }
    filter.push_str(&format!("concat=n={count}:v=0:a=1[out]"));
    filter
}

/// Full ffmpeg argument list for merging `inputs` into `output`.
fn build_merge_args(
    inputs: &[&Path],
    pause: Duration,
    extension: &str,
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(OsString::from)
        .collect();

    for input in inputs {
        args.push("-i".into());
        args.push(input.as_os_str().to_os_string());
    }

    args.push("-filter_complex".into());
    args.push(build_concat_filter(inputs.len(), pause).into());
    args.push("-map".into());
    args.push("[out]".into());
    args.extend(codec_for(extension).iter().map(OsString::from));
    args.push(output.as_os_str().to_os_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn segment(index: usize, path: &Path) -> AudioSegment {
        AudioSegment {
            index,
            path: path.to_path_buf(),
        }
    }

    #[test]
    fn test_concat_filter_pads_between_segments() {
        let filter = build_concat_filter(3, Duration::from_secs(1));
        assert_eq!(
            filter,
            "[0:a]aformat=sample_rates=24000:channel_layouts=mono,apad=pad_dur=1[a0];\
             [1:a]aformat=sample_rates=24000:channel_layouts=mono,apad=pad_dur=1[a1];\
             [2:a]aformat=sample_rates=24000:channel_layouts=mono[a2];\
             [a0][a1][a2]concat=n=3:v=0:a=1[out]"
        );
    }

    #[test]
    fn test_merge_args_keep_input_order() {
        let inputs = [Path::new("b_part_001.mp3"), Path::new("b_part_003.mp3")];
        let args = build_merge_args(&inputs, INTER_SEGMENT_PAUSE, "mp3", Path::new("out.mp3"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().to_string()).collect();

        let first = args.iter().position(|a| a == "b_part_001.mp3").unwrap();
        let second = args.iter().position(|a| a == "b_part_003.mp3").unwrap();
        assert!(first < second);
        assert_eq!(args[first - 1], "-i");
        assert!(args.contains(&"libmp3lame".to_string()));
        assert_eq!(args.last().unwrap(), "out.mp3");
    }

    #[test]
    fn test_codec_for_extension() {
        assert_eq!(codec_for("WAV"), &["-c:a", "pcm_s16le"]);
        assert_eq!(codec_for("mp3")[1], "libmp3lame");
    }

    #[test]
    fn test_select_pass_through_without_ffmpeg() {
        let assembler = select_assembler(&Capabilities::none());
        assert!(!assembler.merges());
        assert_eq!(assembler.name(), "pass-through");
    }

    #[test]
    fn test_select_ffmpeg_when_available() {
        let assembler = select_assembler(&Capabilities::none().with_ffmpeg("/usr/bin/ffmpeg"));
        assert!(assembler.merges());
        assert_eq!(assembler.name(), "ffmpeg");
    }

    #[test]
    fn test_single_segment_not_merged() {
        let dir = TempDir::new().unwrap();
        let part = dir.path().join("book_part_001.mp3");
        std::fs::write(&part, b"audio").unwrap();
        let output = dir.path().join("book_complete_audiobook.mp3");

        let outcome = FfmpegAssembler::new("/nonexistent/ffmpeg").assemble(&[segment(1, &part)], &output);

        assert_eq!(outcome, AssemblyOutcome::Unmerged);
        assert!(!output.exists());
    }

    #[test]
    fn test_failed_merge_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("book_part_001.mp3");
        let second = dir.path().join("book_part_002.mp3");
        std::fs::write(&first, b"one").unwrap();
        std::fs::write(&second, b"two").unwrap();
        let output = dir.path().join("book_complete_audiobook.mp3");

        let outcome = FfmpegAssembler::new("/nonexistent/ffmpeg")
            .assemble(&[segment(1, &first), segment(2, &second)], &output);

        assert!(matches!(outcome, AssemblyOutcome::Failed(_)));
        assert!(!output.exists());
        let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }

    #[test]
    fn test_merge_with_real_ffmpeg() {
        let caps = Capabilities::detect(None);
        let Some(ffmpeg) = caps.ffmpeg() else {
            // ffmpeg not installed on this host
            return;
        };

        let dir = TempDir::new().unwrap();
        let mut segments = Vec::new();
        for i in 1..=2 {
            let path = dir.path().join(format!("tone_part_{:03}.mp3", i));
            let status = Command::new(ffmpeg)
                .args(["-y", "-loglevel", "error", "-f", "lavfi", "-i"])
                .arg("sine=frequency=440:duration=0.5:sample_rate=24000")
                .arg(&path)
                .status()
                .unwrap();
            if !status.success() {
                // ffmpeg build without lavfi or an mp3 encoder
                return;
            }
            segments.push(segment(i, &path));
        }

        let output = dir.path().join("tone_complete_audiobook.mp3");
        let outcome = FfmpegAssembler::new(ffmpeg).assemble(&segments, &output);

        assert_eq!(outcome, AssemblyOutcome::Merged(output.clone()));
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }
}
