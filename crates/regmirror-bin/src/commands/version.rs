// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

/// Prints version information for the daemon and its crates.
pub fn run() {
    println!("regmirror {}", regmirror_core::VERSION);
    println!("  srtp client:    regmirror-srtp {}", regmirror_core::VERSION);
    println!("  modbus adapter: regmirror-modbus {}", regmirror_core::VERSION);
    println!(
        "  build:          {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}
