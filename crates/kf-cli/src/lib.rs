//! kf-cli library surface: prediction calibration scoring.

pub mod calibration;
