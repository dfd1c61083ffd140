// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use regmirror_config::load_config;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::BinResult;

/// Parses, validates, and resolves the configuration without connecting.
pub fn run(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config = load_config(&cli.config)?;
    let resolved = config.resolve()?;

    let link_count: usize = resolved.plcs.iter().map(|p| p.mappings.len()).sum();

    match args.format {
        OutputFormat::Json => {
            let mut report = serde_json::json!({
                "valid": true,
                "config": cli.config.display().to_string(),
                "poll_ms": resolved.poll_interval.as_millis() as u64,
                "modbus": format!("{}:{}", resolved.modbus.ip, resolved.modbus.port),
                "plcs": resolved.plcs.len(),
                "links": link_count,
            });
            if args.show_mappings {
                report["mappings"] = serde_json::json!(resolved
                    .plcs
                    .iter()
                    .map(|plc| {
                        serde_json::json!({
                            "plc": plc.label(),
                            "links": plc.mappings.iter().map(|m| m.label()).collect::<Vec<_>>(),
                        })
                    })
                    .collect::<Vec<_>>());
            }
            println!("{}", serde_json::to_string_pretty(&report).unwrap_or_default());
        }
        OutputFormat::Text => {
            println!("Configuration OK: {}", cli.config.display());
            println!(
                "  poll interval: {} ms",
                resolved.poll_interval.as_millis()
            );
            println!(
                "  modbus target: {}:{} (unit {})",
                resolved.modbus.ip, resolved.modbus.port, resolved.modbus.unit_id
            );
            println!("  {} PLC(s), {} link(s)", resolved.plcs.len(), link_count);

            if args.show_mappings {
                for plc in &resolved.plcs {
                    println!("  {}", plc.label());
                    for mapping in &plc.mappings {
                        println!(
                            "    {}{}",
                            mapping.label(),
                            if mapping.swap_bytes { "  (swap)" } else { "" }
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
