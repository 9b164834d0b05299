#![no_std]

// Shared logic for the menorah controller.
//
// This crate stays portable across MCU firmware and host tooling by avoiding the
// Rust standard library. Hardware, timers, and task spawning are reached through
// the traits exposed here so the same pipeline runs under the Embassy executor on
// the board and under `block_on` in tests and the emulator.

pub mod candle;
pub mod clock;
pub mod config;
pub mod fault;
pub mod mode;
pub mod pattern;
pub mod schedule;
pub mod time;
