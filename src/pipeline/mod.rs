//! Boundary between peak extraction and the surrounding media pipeline.
//!
//! ```text
//! Job { peaks: {count, quality} }
//!     │ prep_for_peaks
//!     ▼
//! outputs += s16le mono intermediary ──▶ external transcoder writes `local`
//!     │ attach_peaks
//!     ▼
//! Job { peaks: [min0, max0, ...] }
//! ```

pub mod job;
pub mod request;

pub use job::{AudioOptions, Job, OutputOptions, OutputSpec, PeaksField, PeaksRequest};
pub use request::{TranscodeRequest, clamp_quality, peaks_intermediary};
