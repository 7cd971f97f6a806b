pub mod collision;
pub mod config;
pub mod dataset;
pub mod deform;
pub mod distortion;
pub mod driver;
pub mod motion;
pub mod particles;
pub mod pose;
pub mod scene;
