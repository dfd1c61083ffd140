// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! regmirror - bidirectional SRTP <-> Modbus/TCP register mirror.
//!
//! Main binary entry point. The daemon keeps the holding-register image
//! of one Modbus/TCP server in lockstep with the register areas of one
//! or more GE/Emerson SRTP PLCs, with the PLC side authoritative.

use clap::Parser;

use regmirror_bin::cli::Cli;
use regmirror_bin::commands;
use regmirror_bin::error::report_error_and_exit;
use regmirror_bin::logging::init_logging;

/// Application entry point.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(cli.effective_log_level(), cli.log_format);

    if let Err(error) = commands::execute(cli).await {
        report_error_and_exit(error);
    }
}
