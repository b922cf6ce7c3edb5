//! Intermediary transcoder request for peak extraction.

use crate::defaults;
use crate::pipeline::job::{AudioOptions, OutputSpec};
use serde::{Deserialize, Serialize};

/// Raw PCM output the external transcoder must produce before peaks can be
/// computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeRequest {
    pub output_format: String,
    pub channels: u16,
    pub sample_rate: u32,
}

impl TranscodeRequest {
    /// Transcoder command-line arguments for this output.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        vec![
            "-f".to_string(),
            self.output_format.clone(),
            "-ac".to_string(),
            self.channels.to_string(),
            "-ar".to_string(),
            self.sample_rate.to_string(),
        ]
    }

    /// The request as an entry of a job's output list.
    pub fn to_output(&self) -> OutputSpec {
        OutputSpec {
            format: self.output_format.clone(),
            audio: Some(AudioOptions {
                channels: Some(self.channels),
                frequency: Some(self.sample_rate),
                ..AudioOptions::default()
            }),
            ..OutputSpec::default()
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Clamps quality into the accepted range. Non-finite input uses the default.
pub fn clamp_quality(quality: f64) -> f64 {
    if quality.is_finite() {
        quality.clamp(defaults::MIN_QUALITY, defaults::MAX_QUALITY)
    } else {
        defaults::QUALITY
    }
}

/// Builds the mono s16le intermediary request for `quality`.
///
/// The sample rate scales with the square of quality so that low settings
/// shrink the intermediary quickly.
pub fn peaks_intermediary(quality: f64) -> TranscodeRequest {
    let quality = clamp_quality(quality);
    let sample_rate = (defaults::BASE_SAMPLE_RATE as f64 * quality * quality).round() as u32;
    TranscodeRequest {
        output_format: defaults::INTERMEDIARY_FORMAT.to_string(),
        channels: 1,
        sample_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_quality_quarters_rate() {
        let request = peaks_intermediary(0.5);
        assert_eq!(request.output_format, "s16le");
        assert_eq!(request.channels, 1);
        assert_eq!(request.sample_rate, 11025);
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(peaks_intermediary(5.0).sample_rate, 44100);
        assert_eq!(peaks_intermediary(0.0).sample_rate, 441);
        assert_eq!(peaks_intermediary(-1.0).sample_rate, 441);
    }

    #[test]
    fn sample_rate_is_rounded() {
        // 44100 * 0.3^2 = 3969.0; 44100 * 0.33^2 = 4802.49
        assert_eq!(peaks_intermediary(0.3).sample_rate, 3969);
        assert_eq!(peaks_intermediary(0.33).sample_rate, 4802);
    }

    #[test]
    fn non_finite_quality_uses_default() {
        assert_eq!(clamp_quality(f64::NAN), defaults::QUALITY);
        assert_eq!(clamp_quality(f64::INFINITY), defaults::QUALITY);
    }

    #[test]
    fn serializes_camel_case() {
        let json = peaks_intermediary(1.0).to_json().unwrap();
        assert_eq!(
            json,
            r#"{"outputFormat":"s16le","channels":1,"sampleRate":44100}"#
        );
    }

    #[test]
    fn ffmpeg_args_render_all_parameters() {
        let args = peaks_intermediary(0.5).ffmpeg_args();
        assert_eq!(args, vec!["-f", "s16le", "-ac", "1", "-ar", "11025"]);
    }

    #[test]
    fn to_output_carries_audio_options() {
        let output = peaks_intermediary(0.5).to_output();
        assert_eq!(output.format, "s16le");
        let audio = output.audio.unwrap();
        assert_eq!(audio.channels, Some(1));
        assert_eq!(audio.frequency, Some(11025));
        assert!(output.local.is_none());
    }
}
