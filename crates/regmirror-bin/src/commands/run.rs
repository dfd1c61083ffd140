// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `run` command.

use crate::cli::Cli;
use crate::error::BinResult;
use crate::runtime::RuntimeBuilder;

/// Starts the mirror daemon.
pub async fn run(cli: &Cli) -> BinResult<()> {
    let runtime = RuntimeBuilder::new().config_path(&cli.config).build()?;
    runtime.run().await
}
