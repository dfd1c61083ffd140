// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-PLC change detection and the reconciliation loop.
//!
//! One [`Synchronizer`] owns one PLC link, one Modbus connection, and the
//! scratch state for every mapped block. Each tick it reads both sides of
//! every area, compares against the previous snapshots, and writes the
//! side that changed to the other one. When both sides changed in the
//! same tick, the PLC value wins.
//!
//! Two snapshots are kept per area, one per side: a single snapshot
//! cannot distinguish "the other side wrote this" from "this side wrote
//! this", which would lose the PLC-wins rule.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::error::MirrorError;
use crate::link::{ModbusLink, PlcLink};
use crate::mapping::{swap_if, RegisterSyncMapping};
use crate::shutdown::ShutdownListener;

// =============================================================================
// SyncArea
// =============================================================================

/// Runtime scratch for one mapped block.
///
/// `last_plc` holds wire-level PLC words; `last_mb` holds words in the
/// Modbus domain, which is also the domain comparisons run in. Both are
/// updated only at the end of an area pass, so an aborted pass merely
/// re-reads on the next tick.
#[derive(Debug)]
pub struct SyncArea {
    mapping: RegisterSyncMapping,
    last_plc: Vec<u16>,
    last_mb: Vec<u16>,
}

impl SyncArea {
    /// Creates the scratch state for a mapping.
    pub fn new(mapping: RegisterSyncMapping) -> Self {
        let count = mapping.count as usize;
        Self {
            mapping,
            last_plc: vec![0; count],
            last_mb: vec![0; count],
        }
    }

    /// Returns the mapping this area mirrors.
    pub fn mapping(&self) -> &RegisterSyncMapping {
        &self.mapping
    }

    /// Returns the last observed PLC image (wire domain).
    pub fn last_plc(&self) -> &[u16] {
        &self.last_plc
    }

    /// Returns the last observed Modbus image (Modbus domain).
    pub fn last_mb(&self) -> &[u16] {
        &self.last_mb
    }
}

// =============================================================================
// Synchronizer
// =============================================================================

/// Mirrors the mapped blocks of one PLC against the shared Modbus image.
pub struct Synchronizer<P: PlcLink, M: ModbusLink> {
    name: String,
    plc: P,
    modbus: M,
    areas: Vec<SyncArea>,
    poll_interval: Duration,
    shutdown: ShutdownListener,
}

impl<P: PlcLink, M: ModbusLink> Synchronizer<P, M> {
    /// Creates a synchronizer over already-constructed links.
    pub fn new(
        name: impl Into<String>,
        plc: P,
        modbus: M,
        mappings: Vec<RegisterSyncMapping>,
        poll_interval: Duration,
        shutdown: ShutdownListener,
    ) -> Self {
        Self {
            name: name.into(),
            plc,
            modbus,
            areas: mappings.into_iter().map(SyncArea::new).collect(),
            poll_interval,
            shutdown,
        }
    }

    /// Returns the synchronizer's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the per-area scratch state.
    pub fn areas(&self) -> &[SyncArea] {
        &self.areas
    }

    /// First-run reconciliation: the PLC is authoritative at startup.
    ///
    /// Reads both sides of every area and overwrites any Modbus word that
    /// differs from the PLC value, then takes the initial snapshots.
    pub async fn reconcile(&mut self) -> Result<(), MirrorError> {
        let Self {
            name,
            plc,
            modbus,
            areas,
            ..
        } = self;

        for area in areas.iter_mut() {
            let m = area.mapping;
            let plc_words = plc
                .read_registers(m.area, m.plc_start, m.count)
                .await
                .map_err(MirrorError::plc)?;
            let mut mb_words = modbus
                .read_holding_block(m.modbus_start, m.count)
                .await
                .map_err(MirrorError::modbus)?;

            let mut pushed = 0usize;
            for i in 0..m.count as usize {
                if plc_words[i] == swap_if(mb_words[i], m.swap_bytes) {
                    continue;
                }
                let to_mb = swap_if(plc_words[i], m.swap_bytes);
                modbus
                    .write_single_register(m.modbus_start + i as u16, to_mb)
                    .await
                    .map_err(MirrorError::modbus)?;
                mb_words[i] = to_mb;
                pushed += 1;
            }

            area.last_plc = plc_words;
            area.last_mb = mb_words;

            if pushed > 0 {
                info!(
                    plc = %name,
                    area = %m.label(),
                    pushed,
                    "reconciled stale Modbus registers from the PLC image"
                );
            }
        }

        Ok(())
    }

    /// Runs the periodic loop until cancelled or a link fails.
    ///
    /// Returns [`MirrorError::Cancelled`] on cooperative shutdown; any
    /// other error means the current tick was aborted and this
    /// synchronizer is done.
    pub async fn run(&mut self) -> Result<(), MirrorError> {
        info!(
            plc = %self.name,
            areas = self.areas.len(),
            poll_ms = self.poll_interval.as_millis() as u64,
            "synchronizer loop started"
        );

        loop {
            if self.shutdown.is_requested() {
                return Err(MirrorError::Cancelled);
            }

            let started = Instant::now();
            self.tick().await?;

            match self.poll_interval.checked_sub(started.elapsed()) {
                Some(remaining) if !remaining.is_zero() => {
                    tokio::select! {
                        _ = tokio::time::sleep(remaining) => {}
                        _ = self.shutdown.cancelled() => return Err(MirrorError::Cancelled),
                    }
                }
                _ => {
                    // Freshness over cadence: an overrunning tick rolls
                    // straight into the next one.
                    warn!(
                        plc = %self.name,
                        overrun_ms = (started.elapsed().saturating_sub(self.poll_interval)).as_millis() as u64,
                        "tick overran the poll interval"
                    );
                }
            }
        }
    }

    /// One pass over all areas, in configuration order.
    ///
    /// [`run`](Self::run) drives this on the poll cadence; it is public
    /// so a caller can single-step the mirror.
    pub async fn tick(&mut self) -> Result<(), MirrorError> {
        let Self {
            name,
            plc,
            modbus,
            areas,
            shutdown,
            ..
        } = self;

        for area in areas.iter_mut() {
            if shutdown.is_requested() {
                return Err(MirrorError::Cancelled);
            }
            Self::sync_area(name, plc, modbus, area).await?;
        }

        Ok(())
    }

    /// Diffs one area against its snapshots and writes the winner.
    async fn sync_area(
        name: &str,
        plc: &mut P,
        modbus: &mut M,
        area: &mut SyncArea,
    ) -> Result<(), MirrorError> {
        let m = area.mapping;

        // Both sides of the same block read in parallel; writes only
        // start after both reads completed.
        let (plc_res, mb_res) = tokio::join!(
            plc.read_registers(m.area, m.plc_start, m.count),
            modbus.read_holding_block(m.modbus_start, m.count),
        );
        let mut plc_words = plc_res.map_err(MirrorError::plc)?;
        let mut mb_words = mb_res.map_err(MirrorError::modbus)?;

        for i in 0..m.count as usize {
            let p = plc_words[i];
            let mb = mb_words[i];

            if p == swap_if(mb, m.swap_bytes) {
                continue;
            }

            let p_changed = p != area.last_plc[i];
            let m_changed = mb != area.last_mb[i];

            if m_changed && !p_changed {
                // Modbus -> PLC
                let to_plc = swap_if(mb, m.swap_bytes);
                plc.write_registers(m.area, m.plc_start + i as u16, &[to_plc])
                    .await
                    .map_err(MirrorError::plc)?;
                plc_words[i] = to_plc;
                debug!(
                    plc = %name,
                    area = %m.label(),
                    offset = i,
                    value = to_plc,
                    "modbus -> plc"
                );
            } else {
                // PLC -> Modbus. This arm also covers the conflict case
                // (PLC wins) and the neither-changed-but-unequal case,
                // which is kept as a deliberate repair write.
                let to_mb = swap_if(p, m.swap_bytes);
                modbus
                    .write_single_register(m.modbus_start + i as u16, to_mb)
                    .await
                    .map_err(MirrorError::modbus)?;
                mb_words[i] = to_mb;
                if p_changed && m_changed {
                    debug!(
                        plc = %name,
                        area = %m.label(),
                        offset = i,
                        value = to_mb,
                        "conflict, plc wins"
                    );
                } else {
                    debug!(
                        plc = %name,
                        area = %m.label(),
                        offset = i,
                        value = to_mb,
                        "plc -> modbus"
                    );
                }
            }
        }

        // Snapshots move only here, so a pass aborted mid-area re-reads
        // cleanly on the next tick.
        area.last_plc = plc_words;
        area.last_mb = mb_words;

        Ok(())
    }

    /// Releases both links, best-effort.
    pub async fn dispose(mut self) {
        self.plc.disconnect().await;
        self.modbus.disconnect().await;
        debug!(plc = %self.name, "synchronizer disposed");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::MemoryArea;

    fn mapping(count: u16) -> RegisterSyncMapping {
        RegisterSyncMapping {
            area: MemoryArea::R,
            plc_start: 1,
            modbus_start: 0,
            count,
            swap_bytes: false,
        }
    }

    #[test]
    fn sync_area_sizes_snapshots_to_the_mapping() {
        let area = SyncArea::new(mapping(5));
        assert_eq!(area.last_plc().len(), 5);
        assert_eq!(area.last_mb().len(), 5);
        assert_eq!(area.mapping().count, 5);
    }
}
