// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The allocation loop.
//!
//! An [`Exhauster`] requests fixed-size chunks until the allocator returns
//! its failure sentinel and keeps every chunk it obtained. It has two
//! states, `Running` and `Stopped`, and moves between them exactly once.

use std::alloc::Layout;
use tracing::debug;

use crate::allocator::{Chunk, ChunkAllocator, SystemAllocator};
use crate::error::{Error, Result};

/// Size of each chunk requested by the fixture: 1 MiB.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Alignment of each chunk.
pub const CHUNK_ALIGN: usize = 8;

/// Byte written into chunks when page touching is enabled.
pub const FILL_BYTE: u8 = 0xAA;

/// Loop parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExhaustConfig {
    pub chunk_size: usize,
    /// Write into every chunk after allocating it
    pub touch_pages: bool,
    pub fill_byte: u8,
}

impl Default for ExhaustConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            touch_pages: false,
            fill_byte: FILL_BYTE,
        }
    }
}

impl ExhaustConfig {
    fn layout(&self) -> Result<Layout> {
        if self.chunk_size == 0 {
            return Err(Error::ZeroChunkSize);
        }
        Ok(Layout::from_size_align(self.chunk_size, CHUNK_ALIGN)?)
    }
}

/// Why the loop stopped. Both variants are the expected outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The allocator returned the failure sentinel for a chunk.
    AllocationExhausted,
    /// The allocation list could not grow to hold another handle.
    ListExhausted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Stopped(StopReason),
}

/// Summary of a finished (or in-progress) run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExhaustionReport {
    pub chunks: usize,
    pub chunk_size: usize,
    pub bytes_retained: usize,
    /// Chunk requests made, including the one that failed
    pub requests: usize,
    pub stop_reason: Option<StopReason>,
}

pub struct Exhauster<A = SystemAllocator> {
    allocator: A,
    layout: Layout,
    config: ExhaustConfig,
    retained: Vec<Chunk>,
    requests: usize,
    state: State,
}

impl Exhauster<SystemAllocator> {
    /// Exhauster over the process heap.
    pub fn new(config: ExhaustConfig) -> Result<Self> {
        Self::with_allocator(config, SystemAllocator)
    }
}

impl<A: ChunkAllocator> Exhauster<A> {
    pub fn with_allocator(config: ExhaustConfig, allocator: A) -> Result<Self> {
        let layout = config.layout()?;
        Ok(Self {
            allocator,
            layout,
            config,
            retained: Vec::new(),
            requests: 0,
            state: State::Running,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, State::Stopped(_))
    }

    /// Chunks obtained so far, in allocation order.
    pub fn retained(&self) -> &[Chunk] {
        &self.retained
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Performs one iteration of the loop.
    ///
    /// Once stopped, further calls return the stopped state without touching
    /// the allocator.
    pub fn step(&mut self) -> State {
        if self.is_stopped() {
            return self.state;
        }

        // Reserve the slot first: a failed push would abort the process.
        if self.retained.try_reserve(1).is_err() {
            self.state = State::Stopped(StopReason::ListExhausted);
            return self.state;
        }

        self.requests += 1;
        match self.allocator.try_allocate(self.layout) {
            Some(mut chunk) => {
                if self.config.touch_pages {
                    chunk.fill(self.config.fill_byte);
                }
                self.retained.push(chunk);
            }
            None => self.state = State::Stopped(StopReason::AllocationExhausted),
        }
        self.state
    }

    /// Runs until the first failure and reports the result.
    ///
    /// The loop body does not log. The closing `debug!` event is only
    /// formatted when a subscriber enables it.
    pub fn run(&mut self) -> ExhaustionReport {
        debug!(
            chunk_size = self.layout.size(),
            touch_pages = self.config.touch_pages,
            "starting allocation loop"
        );

        while self.step() == State::Running {}

        let report = self.report();
        debug!(
            chunks = report.chunks,
            bytes_retained = report.bytes_retained,
            stop_reason = ?report.stop_reason,
            "allocation loop stopped"
        );
        report
    }

    pub fn report(&self) -> ExhaustionReport {
        ExhaustionReport {
            chunks: self.retained.len(),
            chunk_size: self.layout.size(),
            bytes_retained: self.retained.len() * self.layout.size(),
            requests: self.requests,
            stop_reason: match self.state {
                State::Running => None,
                State::Stopped(reason) => Some(reason),
            },
        }
    }
}
