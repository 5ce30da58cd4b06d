// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Logging configuration types

use serde::{Deserialize, Serialize};

use crate::{CliLogLevel, LogFormat};

/// Logging section of a harness config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoggingConfig {
    /// Logging verbosity level
    #[serde(rename = "log-level")]
    pub level: Option<CliLogLevel>,

    /// Output format
    #[serde(rename = "log-format")]
    pub format: Option<LogFormat>,
}
