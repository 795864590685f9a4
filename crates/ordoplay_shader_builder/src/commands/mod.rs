// SPDX-License-Identifier: MIT OR Apache-2.0
//! CLI command implementations.

pub mod build;
pub mod check;
pub mod common;
pub mod types;
