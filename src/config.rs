// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rig configuration.
//!
//! [`RigOpts`] are composed into the [`cucumber`] CLI as custom options, and
//! every one of them falls back to an environment variable, so a lab machine
//! may be configured without touching the command line.

use std::{path::PathBuf, time::Duration};

use smart_default::SmartDefault;
use tracing_subscriber::filter::LevelFilter;

use crate::error::{Result, StepError};

/// Base URL of the reservation broker used when none is configured.
pub const DEFAULT_BROKER_URL: &str = "http://10.10.1.100:5000/api/v2";

/// Configuration of a rig run.
#[derive(Clone, Debug, SmartDefault, clap::Args)]
#[group(skip)]
pub struct RigOpts {
    /// Base URL of the tool reservation broker.
    #[arg(
        long = "rig-broker-url",
        env = "RIG_BROKER_URL",
        value_name = "url",
        default_value = DEFAULT_BROKER_URL,
    )]
    #[default(DEFAULT_BROKER_URL.to_owned())]
    pub broker_url: String,

    /// Name of this test node, as known to the broker.
    #[arg(long = "rig-node", env = "nodename", value_name = "name")]
    pub node_name: Option<String>,

    /// VLAN the reserved tools are attached to.
    #[arg(long = "rig-vlan-id", env = "vlan_id", value_name = "id")]
    pub vlan_id: Option<u32>,

    /// Directory with card configuration files.
    #[arg(long = "rig-config-dir", env = "config_filepath", value_name = "dir")]
    pub config_dir: Option<PathBuf>,

    /// Firmware version the card is expected to report.
    #[arg(long = "rig-firmware", env = "firmware_version", value_name = "ver")]
    pub firmware_version: Option<String>,

    /// Network interface packet captures listen on.
    #[arg(
        long = "rig-capture-interface",
        env = "wireshark_interface",
        value_name = "iface"
    )]
    pub capture_interface: Option<String>,

    /// Device name of the `SS1` serial console, relative to `/dev`.
    #[arg(long = "rig-ss1", env = "ss1_usb", value_name = "dev")]
    pub ss1: Option<String>,

    /// Device name of the `SS2` serial console, relative to `/dev`.
    #[arg(long = "rig-ss2", env = "ss2_usb", value_name = "dev")]
    pub ss2: Option<String>,

    /// Device name of the `SS3` serial console, relative to `/dev`.
    #[arg(long = "rig-ss3", env = "ss3_usb", value_name = "dev")]
    pub ss3: Option<String>,

    /// Index of this rig in the broker's relay wiring table.
    #[arg(
        long = "rig-automation-index",
        env = "automation_index",
        value_name = "idx"
    )]
    pub automation_index: Option<String>,

    /// Root the helper subsystem paths are relative to.
    #[arg(long = "rig-workspace", env = "workspace_path", value_name = "dir")]
    pub workspace_path: Option<PathBuf>,

    /// JSON object mapping helper subsystem names to their command lines.
    #[arg(
        long = "rig-subsystems",
        env = "windows_subsystem_list",
        value_name = "json"
    )]
    pub subsystems: Option<String>,

    /// Conformance test files to run.
    #[arg(
        long = "rig-conformance-files",
        env = "conformance_files",
        value_name = "files",
        value_delimiter = ','
    )]
    pub conformance_files: Vec<String>,

    /// Directory with conformance test files.
    #[arg(
        long = "rig-conformance-dir",
        env = "conformance_config_file_path",
        value_name = "dir"
    )]
    pub conformance_dir: Option<PathBuf>,

    /// Interval between attempts of bounded polls.
    #[arg(
        long = "rig-poll-interval",
        env = "RIG_POLL_INTERVAL",
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "500ms",
    )]
    #[default(Duration::from_millis(500))]
    pub poll_interval: Duration,

    /// How long to wait for a card to confirm a new configuration.
    #[arg(
        long = "rig-config-timeout",
        env = "RIG_CONFIG_TIMEOUT",
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "30s",
    )]
    #[default(Duration::from_secs(30))]
    pub config_timeout: Duration,

    /// How long to keep asking the broker for a busy tool.
    #[arg(
        long = "rig-reserve-timeout",
        env = "RIG_RESERVE_TIMEOUT",
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "5m",
    )]
    #[default(Duration::from_secs(300))]
    pub reserve_timeout: Duration,

    /// Interval between reservation attempts of a busy tool.
    #[arg(
        long = "rig-reserve-interval",
        env = "RIG_RESERVE_INTERVAL",
        value_name = "duration",
        value_parser = humantime::parse_duration,
        default_value = "15s",
    )]
    #[default(Duration::from_secs(15))]
    pub reserve_interval: Duration,

    /// Maximum level of emitted log records.
    #[arg(
        long = "rig-log-level",
        env = "RIG_LOG_LEVEL",
        value_name = "level",
        default_value = "info",
    )]
    #[default(LevelFilter::INFO)]
    pub log_level: LevelFilter,
}

fn required<'a, T: ?Sized>(val: Option<&'a T>, env: &str) -> Result<&'a T> {
    val.ok_or_else(|| StepError::unset(env))
}

impl RigOpts {
    /// Returns the node name.
    ///
    /// # Errors
    ///
    /// If it's not configured.
    pub fn node_name(&self) -> Result<&str> {
        required(self.node_name.as_deref(), "nodename")
    }

    /// Returns the VLAN identifier.
    ///
    /// # Errors
    ///
    /// If it's not configured.
    pub fn vlan_id(&self) -> Result<u32> {
        required(self.vlan_id.as_ref(), "vlan_id").copied()
    }

    /// Returns the configuration files directory.
    ///
    /// # Errors
    ///
    /// If it's not configured.
    pub fn config_dir(&self) -> Result<&PathBuf> {
        required(self.config_dir.as_ref(), "config_filepath")
    }

    /// Returns the expected firmware version.
    ///
    /// # Errors
    ///
    /// If it's not configured.
    pub fn firmware_version(&self) -> Result<&str> {
        required(self.firmware_version.as_deref(), "firmware_version")
    }

    /// Returns the capture interface.
    ///
    /// # Errors
    ///
    /// If it's not configured.
    pub fn capture_interface(&self) -> Result<&str> {
        required(self.capture_interface.as_deref(), "wireshark_interface")
    }

    /// Returns the automation index.
    ///
    /// # Errors
    ///
    /// If it's not configured.
    pub fn automation_index(&self) -> Result<&str> {
        required(self.automation_index.as_deref(), "automation_index")
    }

    /// Returns the helper subsystems workspace.
    ///
    /// # Errors
    ///
    /// If it's not configured.
    pub fn workspace_path(&self) -> Result<&PathBuf> {
        required(self.workspace_path.as_ref(), "workspace_path")
    }

    /// Returns the helper subsystems JSON.
    ///
    /// # Errors
    ///
    /// If it's not configured.
    pub fn subsystems(&self) -> Result<&str> {
        required(self.subsystems.as_deref(), "windows_subsystem_list")
    }

    /// Returns the conformance files directory.
    ///
    /// # Errors
    ///
    /// If it's not configured.
    pub fn conformance_dir(&self) -> Result<&PathBuf> {
        required(self.conformance_dir.as_ref(), "conformance_config_file_path")
    }
}
