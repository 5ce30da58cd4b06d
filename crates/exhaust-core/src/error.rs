// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for exhauster setup.

use std::alloc::LayoutError;
use thiserror::Error;

/// Errors raised before the allocation loop starts
#[derive(Error, Debug)]
pub enum Error {
    #[error("Chunk size must be non-zero")]
    ZeroChunkSize,

    #[error("Invalid chunk layout: {0}")]
    Layout(#[from] LayoutError),
}

pub type Result<T> = std::result::Result<T, Error>;
