//! Integration test crate for Mixdesk.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on every mixdesk crate to verify they work together.

#[cfg(test)]
mod console;

#[cfg(test)]
mod splits;

#[cfg(test)]
mod persistence;

#[cfg(test)]
mod meters;
