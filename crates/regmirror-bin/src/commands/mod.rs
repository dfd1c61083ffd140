// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Command implementations and dispatch.

pub mod run;
pub mod validate;
pub mod version;

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

/// Executes the selected command.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.effective_command() {
        Commands::Run => run::run(&cli).await,
        Commands::Validate(args) => validate::run(&cli, args),
        Commands::Version => {
            version::run();
            Ok(())
        }
    }
}
