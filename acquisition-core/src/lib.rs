#![no_std]

// Shared logic for the RC step-response bench.
//
// This crate stays portable across MCU firmware and host tooling by avoiding
// the Rust standard library and exposing abstractions the other crates can
// adopt.

pub mod config;
pub mod discharge;
pub mod request;
pub mod sampling;
pub mod state;
pub mod step;
pub mod telemetry;
pub mod timing;
