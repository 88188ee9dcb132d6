//! relpc - frame-wise LPC features from audio files
//!
//! Decodes any format symphonia understands, downmixes to mono and runs the
//! liblpc analyzer over it. The CLI in `main.rs` is a thin layer over this
//! library.

pub mod audio;

use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

pub use audio::DecodedAudio;
pub use liblpc::{AnalysisConfig, CoefficientMatrix, DispatchStrategy};

/// Summary of an audio source as the analyzer will see it
#[derive(Debug, Clone, Serialize)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: usize,
    /// mono sample count
    pub samples: usize,
    pub duration_secs: f64,
}

impl From<&DecodedAudio> for AudioInfo {
    fn from(audio: &DecodedAudio) -> Self {
        AudioInfo {
            sample_rate: audio.sample_rate,
            channels: audio.channels,
            samples: audio.samples.len(),
            duration_secs: audio.duration_secs(),
        }
    }
}

/// Get information about an audio file
pub fn get_audio_info(bytes: &[u8]) -> Result<AudioInfo> {
    let audio = audio::read_mono_from_bytes(bytes)?;
    Ok(AudioInfo::from(&audio))
}

/// Result of one analysis pass, ready for JSON output
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub audio: AudioInfo,
    pub config: AnalysisConfig,
    /// wall-clock time of framing, dispatch and assembly
    pub elapsed_ms: f64,
    pub matrix: CoefficientMatrix,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize analysis report")
    }
}

/// Analyze samples that are already decoded
pub fn analyze_audio(audio: &DecodedAudio, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let started = Instant::now();
    let matrix = liblpc::analyze(&audio.samples, config).context("LPC analysis failed")?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    log::info!(
        "{} frames × {} coefficients in {:.2} ms",
        matrix.frame_count(),
        matrix.width(),
        elapsed_ms
    );

    Ok(AnalysisReport {
        audio: AudioInfo::from(audio),
        config: config.clone(),
        elapsed_ms,
        matrix,
    })
}

/// Decode an in-memory audio file and analyze it
pub fn analyze_audio_bytes(bytes: &[u8], config: &AnalysisConfig) -> Result<AnalysisReport> {
    let audio = audio::read_mono_from_bytes(bytes).context("Failed to read audio data")?;
    analyze_audio(&audio, config)
}

/// Decode an audio file and analyze it
pub fn analyze_audio_file(path: &Path, config: &AnalysisConfig) -> Result<AnalysisReport> {
    let audio = audio::read_mono_file(path)?;
    analyze_audio(&audio, config)
}

/// Overlap-add resynthesis of the windowed frames, trimmed to the input length
pub fn resynthesize(audio: &DecodedAudio, frame_len: usize) -> Result<Vec<f64>> {
    let frames =
        liblpc::frame_signal(&audio.samples, frame_len).context("Failed to frame audio")?;
    let spectra = liblpc::frame_spectra(&frames);
    let mut output = liblpc::overlap_add(&spectra).context("Overlap-add failed")?;
    output.truncate(audio.samples.len());
    Ok(output)
}

/// Write the matrix as CSV, one frame per line: `frame,a0,a1,...,ap`
pub fn write_matrix_csv<W: Write>(matrix: &CoefficientMatrix, mut writer: W) -> Result<()> {
    let header: Vec<String> = (0..matrix.width()).map(|k| format!("a{k}")).collect();
    writeln!(writer, "frame,{}", header.join(","))?;

    for (i, row) in matrix.rows().enumerate() {
        let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        writeln!(writer, "{},{}", i, cells.join(","))?;
    }

    writer.flush().context("Failed to flush CSV output")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_layout() {
        let matrix = CoefficientMatrix::canonical(2, 2);
        let mut out = Vec::new();
        write_matrix_csv(&matrix, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "frame,a0,a1,a2\n0,1,0,0\n1,1,0,0\n");
    }
}
