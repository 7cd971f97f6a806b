pub mod keypoint;
pub mod source;

pub use keypoint::{Keypoint, KeypointIndex, Pose};
pub use source::{PoseEstimator, PoseSource, ScriptedPoseSource, ThreadedPoseSource};
