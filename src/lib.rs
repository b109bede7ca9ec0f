//! mask-detector library crate.
//!
//! Classifies webcam frames with an image model and reports, frame by
//! frame, how likely the person in view is wearing a face mask.

pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod detector;
pub mod model;
pub mod ui;
