//! Core module containing the simulator functionality
//!
//! This module provides:
//! - Device registry with per-field value domains and validation
//! - NMEA-0183 sentence and binary frame encoding
//! - Fixed-point scaling for binary fields
//! - Hex rendering of binary frames
//! - Serial transport with per-send port acquisition
//! - Message log and console display sinks
//! - Transmission scheduler (Stopped/Running state machine)
//! - Async tick driver

pub mod codec;
pub mod device;
pub mod encoder;
pub mod logger;
pub mod protocol;
pub mod runner;
pub mod scheduler;
pub mod transport;
