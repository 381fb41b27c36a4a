//! Pole test for force plate calibration
//!
//! Extrapolates the tip of a marker-tracked pole, pairs it with the contact
//! point measured by two force plates, and reports whether the two agree
//! within tolerance.

pub mod activation;
pub mod alignment;
pub mod channels;
pub mod config;
pub mod error;
pub mod geometry;
pub mod markers;
pub mod pipeline;
pub mod report;
pub mod trial;
pub mod types;

pub use config::PoleCheckConfig;
pub use error::{Notification, NotificationKind, PoleCheckError, PoleResult};
pub use pipeline::{run_trial, TrialOutcome};
pub use report::TrialReport;
pub use trial::TrialInput;
