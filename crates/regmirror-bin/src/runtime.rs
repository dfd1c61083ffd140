// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mirror runtime orchestration.
//!
//! The runtime is the supervisor of the system: it resolves the
//! configuration, launches one independent synchronizer task per PLC
//! (each with its own SRTP session and its own TCP connection to the
//! shared Modbus server), and coordinates shutdown.
//!
//! Signal policy: the first interrupt requests cooperative shutdown and
//! leaves the process alive while the synchronizers finish their current
//! area; a second interrupt terminates immediately.

use std::path::Path;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use regmirror_config::{load_config, MirrorConfig, ResolvedMirror, ResolvedPlc};
use regmirror_core::{MirrorError, ShutdownCoordinator, ShutdownListener, Synchronizer};
use regmirror_modbus::{ModbusAdapter, ModbusConfig};
use regmirror_srtp::{SrtpClient, SrtpConfig};

use crate::error::{BinError, BinResult};

// =============================================================================
// MirrorRuntime
// =============================================================================

/// The supervisor: one synchronizer task per configured PLC.
pub struct MirrorRuntime {
    resolved: ResolvedMirror,
    shutdown: ShutdownCoordinator,
}

impl MirrorRuntime {
    /// Creates a runtime from a parsed configuration.
    pub fn new(config: MirrorConfig) -> BinResult<Self> {
        let resolved = config.resolve()?;
        Ok(Self {
            resolved,
            shutdown: ShutdownCoordinator::new(),
        })
    }

    /// Runs until all synchronizer tasks terminate.
    ///
    /// Cooperative cancellation is swallowed; the first other failure is
    /// surfaced after every task has been joined, so one failing PLC does
    /// not take the others down.
    pub async fn run(self) -> BinResult<()> {
        info!(
            version = regmirror_core::VERSION,
            plcs = self.resolved.plcs.len(),
            modbus = %format!("{}:{}", self.resolved.modbus.ip, self.resolved.modbus.port),
            "starting regmirror"
        );

        if self.resolved.plcs.is_empty() {
            warn!("no PLCs configured; nothing to mirror");
            return Ok(());
        }

        tokio::spawn(signal_watcher(self.shutdown.clone()));

        let mut tasks = JoinSet::new();
        for plc in self.resolved.plcs {
            let poll_interval = self.resolved.poll_interval;
            let modbus_config = ModbusConfig::new(self.resolved.modbus.ip.clone())
                .with_port(self.resolved.modbus.port)
                .with_unit_id(self.resolved.modbus.unit_id);
            let listener = self.shutdown.listener();

            tasks.spawn(run_synchronizer(plc, modbus_config, poll_interval, listener));
        }

        let mut first_failure: Option<BinError> = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_cancelled() => {
                    debug!("synchronizer task finished on cancellation");
                }
                Ok(Err(e)) => {
                    if first_failure.is_none() {
                        first_failure = Some(e.into());
                    }
                }
                Err(join_error) => {
                    error!(error = %join_error, "synchronizer task panicked");
                    if first_failure.is_none() {
                        first_failure = Some(BinError::runtime(join_error.to_string()));
                    }
                }
            }
        }

        info!("regmirror shutdown complete");

        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Synchronizer task
// =============================================================================

/// Lifecycle of one PLC: connect both links, reconcile, loop, dispose.
async fn run_synchronizer(
    plc: ResolvedPlc,
    modbus_config: ModbusConfig,
    poll_interval: Duration,
    shutdown: ShutdownListener,
) -> Result<(), MirrorError> {
    let label = plc.label();

    let mut srtp = SrtpClient::new(SrtpConfig::new(plc.ip.clone()).with_port(plc.srtp_port));
    if let Err(e) = srtp.connect().await {
        let e = MirrorError::plc(e.into());
        error!(plc = %label, error = %e, "failed to establish the SRTP session");
        return Err(e);
    }

    let mut modbus = ModbusAdapter::new(modbus_config);
    if let Err(e) = modbus.connect().await {
        srtp.disconnect().await;
        let e = MirrorError::modbus(e.into());
        error!(plc = %label, error = %e, "failed to connect to the Modbus server");
        return Err(e);
    }

    let mut sync = Synchronizer::new(
        label.clone(),
        srtp,
        modbus,
        plc.mappings,
        poll_interval,
        shutdown,
    );

    let result = match sync.reconcile().await {
        Ok(()) => sync.run().await,
        Err(e) => Err(e),
    };
    sync.dispose().await;

    match &result {
        Err(e) if !e.is_cancelled() => {
            error!(plc = %label, error = %e, "synchronizer terminated");
        }
        _ => {
            info!(plc = %label, "synchronizer stopped");
        }
    }

    result
}

// =============================================================================
// Signal handling
// =============================================================================

/// First interrupt: cooperative shutdown. Second interrupt: hard exit.
async fn signal_watcher(shutdown: ShutdownCoordinator) {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("failed to register the interrupt handler");
        return;
    }
    info!("interrupt received; finishing current scans (interrupt again to force)");
    shutdown.initiate();

    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("second interrupt; terminating immediately");
        std::process::exit(130);
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the mirror runtime.
pub struct RuntimeBuilder {
    config_path: Option<std::path::PathBuf>,
    config: Option<MirrorConfig>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_path: None,
            config: None,
        }
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: MirrorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<MirrorRuntime> {
        let config = match self.config {
            Some(cfg) => cfg,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("no configuration provided"))?;
                load_config(&path)?
            }
        };

        MirrorRuntime::new(config)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
