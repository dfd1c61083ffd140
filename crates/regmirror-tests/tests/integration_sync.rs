// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Synchronizer semantics against scripted links: first-run
//! reconciliation, change propagation in both directions, the PLC-wins
//! conflict rule, and failure behavior.

use std::time::Duration;

use regmirror_core::{
    MemoryArea, MirrorError, RegisterSyncMapping, ShutdownCoordinator, Synchronizer,
};
use regmirror_tests::common::mocks::{MockModbusLink, MockPlcLink};

fn mapping(count: u16, swap: bool) -> RegisterSyncMapping {
    RegisterSyncMapping {
        area: MemoryArea::R,
        plc_start: 1,
        modbus_start: 0,
        count,
        swap_bytes: swap,
    }
}

fn synchronizer(
    plc: &MockPlcLink,
    modbus: &MockModbusLink,
    mappings: Vec<RegisterSyncMapping>,
) -> Synchronizer<MockPlcLink, MockModbusLink> {
    let coordinator = ShutdownCoordinator::new();
    Synchronizer::new(
        "plc-under-test",
        plc.clone(),
        modbus.clone(),
        mappings,
        Duration::from_millis(10),
        coordinator.listener(),
    )
}

#[tokio::test]
async fn equal_images_produce_zero_writes() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[10, 20, 30]);
    modbus.set_block(0, &[10, 20, 30]);

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(3, false)]);
    sync.reconcile().await.unwrap();
    sync.tick().await.unwrap();

    assert!(modbus.write_history().is_empty());
    assert!(plc.write_history().is_empty());
}

#[tokio::test]
async fn plc_change_propagates_to_modbus() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[10, 20, 30]);
    modbus.set_block(0, &[10, 20, 30]);

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(3, false)]);
    sync.reconcile().await.unwrap();

    // The process writes a new value into the middle of the block.
    plc.set_block(MemoryArea::R, 2, &[99]);
    sync.tick().await.unwrap();

    assert_eq!(modbus.write_history(), vec![(1, 99)]);
    assert_eq!(modbus.get(1), 99);
    assert!(plc.write_history().is_empty());

    // Once mirrored, the images are settled: no further writes.
    sync.tick().await.unwrap();
    assert_eq!(modbus.write_history().len(), 1);
}

#[tokio::test]
async fn modbus_change_propagates_to_plc() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[5]);
    modbus.set_block(0, &[5]);

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(1, false)]);
    sync.reconcile().await.unwrap();

    // An operator writes through the Modbus side.
    modbus.set_block(0, &[9]);
    sync.tick().await.unwrap();

    assert_eq!(plc.write_history(), vec![(MemoryArea::R, 1, 9)]);
    assert_eq!(plc.get(MemoryArea::R, 1), 9);
    // The changed side itself is untouched.
    assert!(modbus.write_history().is_empty());
}

#[tokio::test]
async fn conflicts_resolve_in_favor_of_the_plc() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[5]);
    modbus.set_block(0, &[5]);

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(1, false)]);
    sync.reconcile().await.unwrap();

    // Both sides move between ticks.
    plc.set_block(MemoryArea::R, 1, &[7]);
    modbus.set_block(0, &[9]);
    sync.tick().await.unwrap();

    assert_eq!(modbus.get(0), 7);
    assert_eq!(plc.get(MemoryArea::R, 1), 7);
    assert_eq!(modbus.write_history(), vec![(0, 7)]);
    assert!(plc.write_history().is_empty());

    // Snapshots settled on the winner.
    sync.tick().await.unwrap();
    assert_eq!(modbus.write_history().len(), 1);
}

#[tokio::test]
async fn reconcile_pushes_the_plc_image() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[1, 2, 3]);
    modbus.set_block(0, &[4, 5, 3]);

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(3, false)]);
    sync.reconcile().await.unwrap();

    assert_eq!(modbus.write_history(), vec![(0, 1), (1, 2)]);
    assert_eq!(modbus.get(0), 1);
    assert_eq!(modbus.get(1), 2);
    assert_eq!(modbus.get(2), 3);
}

#[tokio::test]
async fn swapped_words_compare_equal() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[0x00FF]);
    modbus.set_block(0, &[0xFF00]);

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(1, true)]);
    sync.reconcile().await.unwrap();
    sync.tick().await.unwrap();

    assert!(modbus.write_history().is_empty());
    assert!(plc.write_history().is_empty());
}

#[tokio::test]
async fn swapped_writes_land_in_the_peer_byte_order() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[0x1234]);
    modbus.set_block(0, &[0x3412]);

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(1, true)]);
    sync.reconcile().await.unwrap();
    assert!(modbus.write_history().is_empty());

    // Operator writes 0x1122 in Modbus order; the PLC receives it swapped.
    modbus.set_block(0, &[0x1122]);
    sync.tick().await.unwrap();
    assert_eq!(plc.write_history(), vec![(MemoryArea::R, 1, 0x2211)]);

    // PLC moves next; the Modbus image receives the swapped form.
    plc.set_block(MemoryArea::R, 1, &[0xBEEF]);
    sync.tick().await.unwrap();
    assert_eq!(modbus.get(0), 0xEFBE);
}

#[tokio::test]
async fn a_tick_mirrors_mixed_divergence_in_one_pass() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[1, 2, 3, 4]);
    modbus.set_block(0, &[1, 2, 3, 4]);

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(4, false)]);
    sync.reconcile().await.unwrap();

    // Index 0 moves on the PLC, index 3 moves on the Modbus side.
    plc.set_block(MemoryArea::R, 1, &[100]);
    modbus.set_block(3, &[400]);
    sync.tick().await.unwrap();

    // Both sides agree afterwards.
    for i in 0..4u16 {
        assert_eq!(plc.get(MemoryArea::R, 1 + i), modbus.get(i));
    }
    assert_eq!(plc.get(MemoryArea::R, 4), 400);
    assert_eq!(modbus.get(0), 100);
}

#[tokio::test]
async fn areas_sync_in_configuration_order() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[11]);
    plc.set_block(MemoryArea::Ai, 1, &[22]);

    let second = RegisterSyncMapping {
        area: MemoryArea::Ai,
        plc_start: 1,
        modbus_start: 100,
        count: 1,
        swap_bytes: false,
    };

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(1, false), second]);
    sync.reconcile().await.unwrap();

    // Reconciliation pushed both areas, first mapping first.
    assert_eq!(modbus.write_history(), vec![(0, 11), (100, 22)]);
}

#[tokio::test]
async fn a_failed_write_aborts_the_tick_and_heals_on_the_next() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[5]);
    modbus.set_block(0, &[5]);

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(1, false)]);
    sync.reconcile().await.unwrap();

    plc.set_block(MemoryArea::R, 1, &[6]);
    modbus.fail_next_write();

    let err = sync.tick().await.unwrap_err();
    assert!(matches!(err, MirrorError::Link { .. }));
    assert_eq!(modbus.get(0), 5); // nothing landed

    // Snapshots were not advanced by the aborted pass, so the next tick
    // re-detects the same change and completes it.
    sync.tick().await.unwrap();
    assert_eq!(modbus.get(0), 6);
    assert_eq!(modbus.write_history(), vec![(0, 6)]);
}

#[tokio::test]
async fn failed_reads_surface_the_side_that_broke() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();

    let mut sync = synchronizer(&plc, &modbus, vec![mapping(1, false)]);
    sync.reconcile().await.unwrap();

    plc.fail_next_read();
    let err = sync.tick().await.unwrap_err();
    assert!(err.to_string().starts_with("PLC link error"));

    modbus.fail_next_read();
    let err = sync.tick().await.unwrap_err();
    assert!(err.to_string().starts_with("Modbus link error"));
}

#[tokio::test]
async fn cancellation_is_observed_before_the_next_area() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();

    let coordinator = ShutdownCoordinator::new();
    let mut sync = Synchronizer::new(
        "plc-under-test",
        plc.clone(),
        modbus.clone(),
        vec![mapping(1, false)],
        Duration::from_millis(10),
        coordinator.listener(),
    );
    sync.reconcile().await.unwrap();

    coordinator.initiate();
    let err = sync.tick().await.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(plc.read_count(), 1); // only the reconcile read happened
}

#[tokio::test]
async fn run_stops_on_cancellation() {
    let plc = MockPlcLink::new();
    let modbus = MockModbusLink::new();
    plc.set_block(MemoryArea::R, 1, &[1]);
    modbus.set_block(0, &[1]);

    let coordinator = ShutdownCoordinator::new();
    let mut sync = Synchronizer::new(
        "plc-under-test",
        plc.clone(),
        modbus.clone(),
        vec![mapping(1, false)],
        Duration::from_millis(5),
        coordinator.listener(),
    );
    sync.reconcile().await.unwrap();

    let handle = tokio::spawn(async move { sync.run().await });
    tokio::time::sleep(Duration::from_millis(25)).await;
    coordinator.initiate();

    let result = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("run should stop after cancellation")
        .unwrap();
    assert!(matches!(result, Err(MirrorError::Cancelled)));

    // The loop actually scanned while it ran.
    assert!(plc.read_count() > 1);
}
