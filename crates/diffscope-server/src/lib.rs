//! Diffscope server library (gateway layer for the `diffscope` binary).

pub mod gateway;
