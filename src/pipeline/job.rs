//! Outer job object exchanged with the surrounding media pipeline.
//!
//! Only the fields peak extraction touches are typed. Everything else is kept
//! in `extra` maps so a job survives a JSON round trip unchanged.

use crate::defaults;
use crate::error::{PeaksError, Result};
use crate::peaks::{PeakConfig, Peaks, extract_peaks};
use crate::pipeline::request::{TranscodeRequest, peaks_intermediary};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::info;

/// Audio options of one transcoder output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Extra transcoder arguments: one string or a list of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutputOptions {
    One(String),
    Many(Vec<String>),
}

impl OutputOptions {
    /// Arguments as a list, splitting the single-string form on whitespace.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            OutputOptions::One(line) => line.split_whitespace().map(str::to_string).collect(),
            OutputOptions::Many(args) => args.clone(),
        }
    }
}

/// One transcoder output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OutputSpec {
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OutputOptions>,
    /// Where the transcoder wrote this output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Peak request as submitted with a job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PeaksRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<f64>,
    /// Index into the job's outputs of the prepared intermediary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intermediary: Option<usize>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PeaksRequest {
    /// Requested bucket count; zero or absent means the default.
    pub fn bucket_count(&self) -> usize {
        self.bucket_count_or(defaults::BUCKET_COUNT)
    }

    /// Requested bucket count, or `fallback` when zero or absent.
    pub fn bucket_count_or(&self, fallback: usize) -> usize {
        self.count.filter(|&count| count > 0).unwrap_or(fallback)
    }

    pub fn quality(&self) -> f64 {
        self.quality_or(defaults::QUALITY)
    }

    pub fn quality_or(&self, fallback: f64) -> f64 {
        self.quality.unwrap_or(fallback)
    }
}

/// The job's `peaks` field: a request before extraction, the peaks after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PeaksField {
    Computed(Peaks),
    Request(PeaksRequest),
}

/// A pipeline job.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peaks: Option<PeaksField>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Job {
    pub fn from_json(s: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn peaks_request(&self) -> Option<&PeaksRequest> {
        match &self.peaks {
            Some(PeaksField::Request(request)) => Some(request),
            _ => None,
        }
    }

    pub fn computed_peaks(&self) -> Option<&Peaks> {
        match &self.peaks {
            Some(PeaksField::Computed(peaks)) => Some(peaks),
            _ => None,
        }
    }

    /// Adds the raw PCM intermediary to the outputs.
    ///
    /// Calling this again returns the existing request without adding a
    /// second output.
    pub fn prep_for_peaks(&mut self) -> Result<TranscodeRequest> {
        self.prep_for_peaks_with(defaults::QUALITY)
    }

    /// Like [`prep_for_peaks`](Self::prep_for_peaks), using `fallback_quality`
    /// when the request does not carry one.
    pub fn prep_for_peaks_with(&mut self, fallback_quality: f64) -> Result<TranscodeRequest> {
        let outputs_len = self.outputs.len();
        let request = match &mut self.peaks {
            Some(PeaksField::Request(request)) => request,
            Some(PeaksField::Computed(_)) => {
                return Err(PeaksError::InvalidJob {
                    message: "peaks already computed".to_string(),
                });
            }
            None => {
                return Err(PeaksError::InvalidJob {
                    message: "no peaks requested".to_string(),
                });
            }
        };

        let intermediary = peaks_intermediary(request.quality_or(fallback_quality));
        if request.intermediary.is_some_and(|index| index < outputs_len) {
            return Ok(intermediary);
        }

        request.intermediary = Some(outputs_len);
        self.outputs.push(intermediary.to_output());
        Ok(intermediary)
    }

    /// Local path of the prepared intermediary.
    pub fn intermediary_path(&self) -> Result<&Path> {
        let missing = |message: &str| PeaksError::IntermediaryMissing {
            message: message.to_string(),
        };

        let request = self
            .peaks_request()
            .ok_or_else(|| missing("no pending peaks request"))?;
        let index = request
            .intermediary
            .ok_or_else(|| missing("server did not prepare file for finding peaks"))?;
        let output = self
            .outputs
            .get(index)
            .ok_or_else(|| missing("intermediary output is not in the job"))?;
        output
            .local
            .as_deref()
            .ok_or_else(|| missing("intermediary was never written"))
    }

    /// Computes peaks from the intermediary and stores them in the job.
    ///
    /// `base` supplies step and bucket seeding; channels are forced to 1 and
    /// the count comes from the job's request, falling back to `base.count`.
    pub async fn attach_peaks(&mut self, base: &PeakConfig, chunk_size: usize) -> Result<Peaks> {
        let path = self.intermediary_path()?.to_path_buf();
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(PeaksError::IntermediaryMissing {
                message: format!("{} does not exist", path.display()),
            });
        }

        let count = self
            .peaks_request()
            .map_or(base.count, |request| request.bucket_count_or(base.count));
        let config = base.clone().with_channels(1).with_count(count);
        let peaks = extract_peaks(&path, &config, chunk_size).await?;
        info!(
            intermediary = %path.display(),
            buckets = peaks.bucket_count(),
            "peaks attached to job"
        );

        self.peaks = Some(PeaksField::Computed(peaks.clone()));
        Ok(peaks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const JOB: &str = r#"{
        "input": {"download": {"url": "https://example.com/a.wav"}},
        "outputs": [
            {"format": "mp3", "audio": {"codec": "libmp3lame", "bitrate": 128}, "upload": {"url": "https://example.com/put"}}
        ],
        "peaks": {"count": 4, "quality": 0.5},
        "callback": {"url": "https://example.com/cb"}
    }"#;

    fn encode(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn parses_request_and_keeps_unknown_fields() {
        let job = Job::from_json(JOB).unwrap();
        let request = job.peaks_request().unwrap();
        assert_eq!(request.count, Some(4));
        assert_eq!(request.quality, Some(0.5));
        assert!(job.extra.contains_key("input"));
        assert!(job.extra.contains_key("callback"));
        assert!(job.outputs[0].extra.contains_key("upload"));
        assert!(job.outputs[0].audio.as_ref().unwrap().extra.contains_key("codec"));
    }

    #[test]
    fn json_round_trip_preserves_job() {
        let job = Job::from_json(JOB).unwrap();
        let again = Job::from_json(&job.to_json().unwrap()).unwrap();
        assert_eq!(job, again);
    }

    #[test]
    fn prep_appends_intermediary_once() {
        let mut job = Job::from_json(JOB).unwrap();
        let request = job.prep_for_peaks().unwrap();
        assert_eq!(request.sample_rate, 11025);
        assert_eq!(job.outputs.len(), 2);
        assert_eq!(job.outputs[1].format, "s16le");
        assert_eq!(job.peaks_request().unwrap().intermediary, Some(1));

        job.prep_for_peaks().unwrap();
        assert_eq!(job.outputs.len(), 2);
    }

    #[test]
    fn prep_keeps_unknown_peaks_fields() {
        let mut job = Job::from_json(
            r#"{"outputs": [{"format": "mp3"}], "peaks": {"count": 4, "destination": "s3://b/p.json"}}"#,
        )
        .unwrap();
        job.prep_for_peaks().unwrap();

        let json: Value = serde_json::from_str(&job.to_json().unwrap()).unwrap();
        assert_eq!(json["peaks"]["destination"], "s3://b/p.json");
        assert_eq!(json["peaks"]["count"], 4);
        assert_eq!(json["peaks"]["intermediary"], 1);
    }

    #[test]
    fn prep_uses_fallback_quality_only_when_request_has_none() {
        let mut job = Job::from_json(r#"{"peaks": {"count": 4}}"#).unwrap();
        assert_eq!(job.prep_for_peaks_with(1.0).unwrap().sample_rate, 44100);

        let mut job = Job::from_json(JOB).unwrap();
        assert_eq!(job.prep_for_peaks_with(1.0).unwrap().sample_rate, 11025);
    }

    #[test]
    fn output_options_accept_string_and_list() {
        let job = Job::from_json(
            r#"{"outputs": [
                {"format": "mp3", "options": "-ar 8000", "audio": {"options": "-ac 1"}},
                {"format": "ogg", "options": ["-q:a", "4"]}
            ], "peaks": {"count": 4}}"#,
        )
        .unwrap();

        assert_eq!(
            job.outputs[0].options,
            Some(OutputOptions::One("-ar 8000".to_string()))
        );
        assert_eq!(
            job.outputs[0].options.as_ref().unwrap().to_args(),
            vec!["-ar", "8000"]
        );
        assert_eq!(
            job.outputs[1].options.as_ref().unwrap().to_args(),
            vec!["-q:a", "4"]
        );
        assert_eq!(job.outputs[0].audio.as_ref().unwrap().extra["options"], "-ac 1");

        let json: Value = serde_json::from_str(&job.to_json().unwrap()).unwrap();
        assert_eq!(json["outputs"][0]["options"], "-ar 8000");
        assert_eq!(json["outputs"][1]["options"], serde_json::json!(["-q:a", "4"]));
    }

    #[test]
    fn prep_without_request_fails() {
        let mut job = Job::default();
        assert!(matches!(
            job.prep_for_peaks(),
            Err(PeaksError::InvalidJob { .. })
        ));
    }

    #[test]
    fn request_count_defaults() {
        assert_eq!(PeaksRequest::default().bucket_count(), 600);
        let zero = PeaksRequest {
            count: Some(0),
            ..PeaksRequest::default()
        };
        assert_eq!(zero.bucket_count(), 600);
    }

    #[test]
    fn computed_peaks_parse_as_computed() {
        let job = Job::from_json(r#"{"outputs": [], "peaks": [-1, 1, -2, 2]}"#).unwrap();
        assert_eq!(job.computed_peaks(), Some(&Peaks::Merged(vec![-1, 1, -2, 2])));
        assert!(job.peaks_request().is_none());
    }

    #[test]
    fn intermediary_path_requires_prep() {
        let job = Job::from_json(JOB).unwrap();
        let err = job.intermediary_path().unwrap_err();
        assert!(err.to_string().contains("did not prepare"));
    }

    #[test]
    fn intermediary_path_requires_local_file() {
        let mut job = Job::from_json(JOB).unwrap();
        job.prep_for_peaks().unwrap();
        let err = job.intermediary_path().unwrap_err();
        assert!(err.to_string().contains("never written"));
    }

    #[tokio::test]
    async fn attach_replaces_request_with_peaks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let samples: Vec<i16> = (0..8).map(|v| v * 100 - 400).collect();
        file.write_all(&encode(&samples)).unwrap();
        file.flush().unwrap();

        let mut job = Job::from_json(JOB).unwrap();
        job.prep_for_peaks().unwrap();
        job.outputs[1].local = Some(file.path().to_path_buf());

        let peaks = job.attach_peaks(&PeakConfig::default(), 5).await.unwrap();
        assert_eq!(
            peaks,
            Peaks::Merged(vec![-400, -300, -200, -100, 0, 100, 200, 300])
        );
        assert_eq!(job.computed_peaks(), Some(&peaks));

        let json: Value = serde_json::from_str(&job.to_json().unwrap()).unwrap();
        assert_eq!(json["peaks"], serde_json::json!([-400, -300, -200, -100, 0, 100, 200, 300]));
    }

    #[tokio::test]
    async fn attach_falls_back_to_base_count() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&encode(&[1, 2, 3, 4])).unwrap();
        file.flush().unwrap();

        let mut job = Job::from_json(r#"{"peaks": {"quality": 0.5}}"#).unwrap();
        job.prep_for_peaks().unwrap();
        job.outputs[0].local = Some(file.path().to_path_buf());

        let peaks = job.attach_peaks(&PeakConfig::new(2), 64).await.unwrap();
        assert_eq!(peaks, Peaks::Merged(vec![1, 2, 3, 4]));
    }

    #[tokio::test]
    async fn attach_fails_when_intermediary_file_is_gone() {
        let mut job = Job::from_json(JOB).unwrap();
        job.prep_for_peaks().unwrap();
        job.outputs[1].local = Some(PathBuf::from("/nonexistent/intermediary.raw"));

        let err = job
            .attach_peaks(&PeakConfig::default(), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, PeaksError::IntermediaryMissing { .. }));
    }

    #[tokio::test]
    async fn attach_without_prep_fails() {
        let mut job = Job::from_json(JOB).unwrap();
        let err = job
            .attach_peaks(&PeakConfig::default(), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, PeaksError::IntermediaryMissing { .. }));
    }
}
