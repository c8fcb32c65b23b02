//! Hand model: landmarks, palm geometry and neutral-pose calibration.
//!
//! Provides:
//! - `landmarks`: the 21-joint snapshot and the derived palm box
//! - `geometry`: distance, ROI overlap, tilt and containment queries
//! - `calibration`: neutral-pose baseline capture

pub mod calibration;
pub mod geometry;
pub mod landmarks;

pub use calibration::{Calibration, CalibrationConfig, CalibrationStore, SampleOutcome};
pub use geometry::{CircularRoi, Point};
pub use landmarks::{HandLandmark, LandmarkSnapshot, PalmBox, LANDMARK_COUNT};
