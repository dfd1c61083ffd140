// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! End-to-end configuration pipeline: file on disk, loader, schema
//! validation, and resolution into typed mappings.

use std::io::Write;

use tempfile::NamedTempFile;

use regmirror_config::{load_config, ConfigError, ConfigFormat, ConfigLoader};
use regmirror_core::MemoryArea;

fn write_config(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::with_suffix(suffix).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn json_document_resolves_end_to_end() {
    let file = write_config(
        ".json",
        r#"{
            "PollMs": 100,
            "DefaultSwapBytes": true,
            "Modbus": { "Ip": "192.168.30.2" },
            "Plcs": [
                {
                    "Ip": "192.168.30.244",
                    "SrtpPort": 18245,
                    "Links": [
                        { "Plc": "R01001", "Modbus": "400001", "Count": 16 },
                        { "Plc": "%Q0001", "Modbus": "400101", "Count": 4, "SwapBytes": false }
                    ]
                },
                {
                    "Ip": "192.168.30.245",
                    "Links": [
                        { "Plc": "GB12", "Modbus": "250", "Count": 1 }
                    ]
                }
            ]
        }"#,
    );

    let config = load_config(file.path()).unwrap();
    let resolved = config.resolve().unwrap();

    assert_eq!(resolved.poll_interval.as_millis(), 100);
    assert_eq!(resolved.modbus.ip, "192.168.30.2");
    assert_eq!(resolved.modbus.port, 502);
    assert_eq!(resolved.modbus.unit_id, 1);
    assert_eq!(resolved.plcs.len(), 2);

    let first = &resolved.plcs[0];
    assert_eq!(first.label(), "192.168.30.244:18245");
    assert_eq!(first.mappings[0].area, MemoryArea::R);
    assert_eq!(first.mappings[0].plc_start, 1001);
    assert_eq!(first.mappings[0].modbus_start, 0);
    assert!(first.mappings[0].swap_bytes);

    assert_eq!(first.mappings[1].area, MemoryArea::Q);
    assert_eq!(first.mappings[1].plc_start, 1);
    assert_eq!(first.mappings[1].modbus_start, 100);
    assert!(!first.mappings[1].swap_bytes);

    let second = &resolved.plcs[1];
    assert_eq!(second.srtp_port, 18245); // default
    assert_eq!(second.mappings[0].area, MemoryArea::Gb);
    assert_eq!(second.mappings[0].plc_start, 12);
    assert_eq!(second.mappings[0].modbus_start, 250); // raw 0-based
}

#[test]
fn yaml_document_loads_by_extension() {
    let file = write_config(
        ".yaml",
        r#"
PollMs: 200
Plcs:
  - Ip: 10.1.1.1
    Links:
      - Plc: R1
        Modbus: "400010"
        Count: 2
"#,
    );

    let config = load_config(file.path()).unwrap();
    let resolved = config.resolve().unwrap();
    assert_eq!(resolved.plcs[0].mappings[0].modbus_start, 9);
    assert_eq!(resolved.plcs[0].mappings[0].count, 2);
}

#[test]
fn toml_document_loads_by_extension() {
    let file = write_config(
        ".toml",
        r#"
PollMs = 300

[[Plcs]]
Ip = "10.2.2.2"

  [[Plcs.Links]]
  Plc = "M100"
  Modbus = "17"
  Count = 1
"#,
    );

    let config = load_config(file.path()).unwrap();
    let resolved = config.resolve().unwrap();
    assert_eq!(resolved.plcs[0].mappings[0].area, MemoryArea::M);
    assert_eq!(resolved.plcs[0].mappings[0].modbus_start, 17);
}

#[test]
fn unknown_area_tag_fails_the_load() {
    let file = write_config(
        ".json",
        r#"{
            "PollMs": 100,
            "Plcs": [ { "Ip": "10.0.0.1", "Links": [
                { "Plc": "ZZ9", "Modbus": "0", "Count": 1 }
            ] } ]
        }"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Address(_)));
}

#[test]
fn malformed_documents_fail_with_the_path() {
    let file = write_config(".json", "{ \"PollMs\": ");
    let err = load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn loader_can_skip_env_overrides() {
    std::env::set_var("REGMIRROR_POLL_MS", "9999");

    let config = ConfigLoader::new()
        .with_env_overrides(false)
        .load_from_str(
            r#"{ "PollMs": 100, "Plcs": [] }"#,
            ConfigFormat::Json,
        )
        .unwrap();
    assert_eq!(config.poll_ms, 100);

    std::env::remove_var("REGMIRROR_POLL_MS");
}
