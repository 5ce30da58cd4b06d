// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Heap exhaustion fixture.
//!
//! Allocates 1 MiB chunks until the allocator refuses one, keeps all of
//! them, and exits with status 0. Takes no arguments. Run it under a memory
//! limit; on overcommitting hosts without one the kernel may kill it first.

use exhaust_core::{ExhaustConfig, Exhauster};
use tracing::warn;

const COMPONENT: &str = "alloc-exhaust";

fn main() {
    exhaust_logging::init_fixture(COMPONENT);

    let mut exhauster = match Exhauster::new(ExhaustConfig::default()) {
        Ok(exhauster) => exhauster,
        Err(e) => {
            warn!(error = %e, "invalid chunk configuration");
            std::process::exit(0);
        }
    };

    exhauster.run();

    // Leave without running destructors so no chunk is released before exit
    std::process::exit(0);
}
