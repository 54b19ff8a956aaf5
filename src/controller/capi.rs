// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fieldbus interface card driven through its C API.

use std::{net::Ipv4Addr, path::Path, time::Duration};

use crate::{
    frame::{Reply, Request},
    Envelope,
};

/// Identity of a card, as reported by `Get card info`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct CardInfo {
    /// Station name.
    pub name: String,

    /// IP address, in dotted notation.
    pub ip: String,

    /// Firmware version.
    pub firmware: String,
}

/// Connection counters of a card.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ConnectionInfo {
    /// Number of configured connections.
    pub connections: u32,

    /// Number of active connections.
    pub active: u32,
}

/// Runtime state of a card and its two channels.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CardState {
    pub state: u32,
    pub io_state: u32,
    pub ch1_state: u32,
    pub ch2_state: u32,
    pub ch1_io_state: u32,
    pub ch2_io_state: u32,
}

/// Process image of a card.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IoImage {
    /// Data sent to the network.
    pub produced: Vec<u8>,

    /// Data received from the network.
    pub consumed: Vec<u8>,
}

/// Status of a single I/O connection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct IoStatus {
    /// Status of the produced data.
    pub produced: u32,

    /// Status of the consumed data.
    pub consumed: u32,
}

/// Network connection states of the safety layer.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Ncs {
    /// Produced connection state.
    pub produced: u32,

    /// Consumed connection state.
    pub consumed: u32,
}

/// Statistics of a ping session.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PingStats {
    pub transmitted: u32,
    pub received: u32,
    pub duplicated: u32,
    pub last_rtt: u32,
    pub max_rtt: u32,
    pub min_rtt: u32,
    pub avg_rtt: u32,
    pub sum_rtt: u32,
    pub send_error: u32,
    pub recv_error: u32,
}

/// Parameters of an ARP probe.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArpProbe {
    /// Number of probes to send.
    pub probes: u32,

    /// Interval between probes, in milliseconds.
    pub interval: u32,

    /// Time to wait for an answer, in milliseconds.
    pub timeout: u32,
}

/// Kind of a configuration block written by `Write block`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Block {
    /// Plain network configuration.
    NetworkConfig,

    /// Compressed network configuration.
    NetworkConfigCompressed,
}

impl Block {
    /// Returns the identifier the card knows this block by.
    #[must_use]
    pub const fn id(self) -> u32 {
        match self {
            Self::NetworkConfig => 10,
            Self::NetworkConfigCompressed => 11,
        }
    }
}

/// Fieldbus interface card.
///
/// Closing operations are called by the scenario teardown for every
/// resource still open at the end of a scenario.
pub trait Card {
    fn init(&mut self) -> Envelope;
    fn exit(&mut self) -> Envelope;
    fn enum_drivers(&mut self, index: u32) -> Envelope;
    fn open_interface(&mut self, index: u32) -> Envelope;
    fn close_interface(&mut self) -> Envelope;
    fn card_info(&mut self) -> Envelope<CardInfo>;
    fn soft_reset(&mut self) -> Envelope;
    fn start_protocol(&mut self) -> Envelope;
    fn stop_protocol(&mut self) -> Envelope;
    fn connection_info(&mut self) -> Envelope<ConnectionInfo>;
    fn change_connection_state(&mut self, index: u32, enable: bool) -> Envelope;
    fn state(&mut self) -> Envelope<CardState>;

    fn refresh_io(&mut self) -> Envelope;
    fn start_all_connections(&mut self) -> Envelope;
    fn start_produce(&mut self, index: u32) -> Envelope;
    fn start_consume(&mut self, index: u32) -> Envelope;
    fn read_io(&mut self) -> Envelope<IoImage>;
    fn write_produced_io(&mut self, data: &[u8]) -> Envelope;
    fn io_status(&mut self, index: u32) -> Envelope<IoStatus>;

    /// Cycle time of produced data, to wait after writing it.
    fn produce_duty(&self) -> Duration;

    /// Cycle time of consumed data, to wait after starting a connection.
    fn consume_duty(&self) -> Duration;

    fn ping_open(&mut self, ip: Ipv4Addr, interval: u32, length: u32) -> Envelope;
    fn ping_close(&mut self) -> Envelope;
    fn ping_stats(&mut self) -> Envelope<Option<PingStats>>;
    fn ping_error_no(&mut self) -> Envelope<Option<u32>>;

    fn arp_register(&mut self) -> Envelope;
    fn arp_unregister(&mut self) -> Envelope;
    fn arp_use(&mut self, ip: Ipv4Addr) -> Envelope;
    fn arp_start(&mut self, ip: Ipv4Addr, probe: ArpProbe) -> Envelope;
    fn arp_cancel(&mut self, ip: Ipv4Addr) -> Envelope;

    fn start_heartbeat(&mut self, period_ms: u32) -> Envelope;
    fn stop_heartbeat(&mut self) -> Envelope;
    fn fail_heartbeat(&mut self) -> Envelope;

    fn start_poll(&mut self, duty_ms: u32) -> Envelope;
    fn stop_poll(&mut self) -> Envelope;

    /// Sends a request frame and returns the card's reply.
    fn send_message(&mut self, request: &Request) -> Envelope<Reply>;

    fn safe_init(&mut self) -> Envelope;
    fn safe_exit(&mut self) -> Envelope;
    fn open_safe_interface(&mut self, index: u32) -> Envelope;
    fn close_safe_interface(&mut self) -> Envelope;
    fn read_safe_config(&mut self) -> Envelope;
    fn enable_safe_connection(&mut self) -> Envelope;
    fn disable_safe_connection(&mut self) -> Envelope;
    fn refresh_safe_io(&mut self) -> Envelope;
    fn start_safe_produce(&mut self, index: u32) -> Envelope;
    fn start_safe_consume(&mut self, index: u32) -> Envelope;
    fn read_safe_io(&mut self) -> Envelope<IoImage>;
    fn write_safe_produced_io(&mut self, data: &[u8]) -> Envelope;
    fn safe_io_status(&mut self, index: u32) -> Envelope<IoStatus>;
    fn change_ncs(&mut self, value: u32) -> Envelope;
    fn ncs(&mut self) -> Envelope<Ncs>;
    fn safe_produce_duty(&self) -> Duration;
    fn safe_consume_duty(&self) -> Duration;

    fn config_notify(&mut self, register: bool) -> Envelope;
    fn config_lock(&mut self, lock: bool) -> Envelope;
    fn config_mode(&mut self) -> Envelope;
    fn config_reset(&mut self) -> Envelope;
    fn write_block(&mut self, block: Block, file: &Path) -> Envelope;
    fn config_validate(&mut self) -> Envelope;
    fn config_apply(&mut self) -> Envelope;

    /// Reads back the CRC of the active configuration.
    fn read_config_id(&mut self) -> Envelope<u32>;
}
