// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Heap exhaustion core.
//!
//! Requests fixed-size chunks from an allocator until it reports failure,
//! holding on to every chunk so the memory pressure persists until the
//! process exits. Used by the `alloc_exhaust` fixture to drive a process
//! into its memory limit.

pub mod allocator;
pub mod error;
pub mod exhauster;

pub use allocator::{CappedAllocator, Chunk, ChunkAllocator, SystemAllocator};
pub use error::{Error, Result};
pub use exhauster::{
    CHUNK_ALIGN, CHUNK_SIZE, ExhaustConfig, ExhaustionReport, Exhauster, FILL_BYTE, State,
    StopReason,
};
