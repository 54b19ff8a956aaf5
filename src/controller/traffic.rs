// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Network traffic generator chassis.

use std::net::Ipv4Addr;

use crate::Envelope;

/// Session on a traffic generator chassis.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Session {
    /// Address of the chassis API server.
    pub ip: Ipv4Addr,

    /// Name of the session.
    pub name: String,

    /// Whether to drop the configuration left by a previous session.
    pub clear_config: bool,
}

/// Traffic item definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrafficItem {
    pub name: String,
    pub bidirectional: bool,
    pub source_port: u32,
    pub destination_port: u32,
}

/// Shape of the generated frames.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TrafficShape {
    /// Size of every frame, in bytes.
    pub frame_size: u32,

    /// Percentage of the line rate to send at.
    pub line_rate: u8,

    /// EtherType of the generated frames.
    pub ether_type: u16,
}

/// Traffic generator. Each configuration stage builds upon the previous one.
pub trait TrafficGenerator {
    fn connect(&mut self, session: &Session) -> Envelope;

    /// Assigns the two chassis ports, taking them over from other users
    /// if `force` is set.
    fn configure_ports(&mut self, ports: [u32; 2], force: bool) -> Envelope;

    fn configure_topology(
        &mut self,
        topology: &str,
        device_group: &str,
        port: u32,
        multiplier: u32,
    ) -> Envelope;

    fn configure_protocol_interface(
        &mut self,
        device_group: &str,
        protocol: &str,
        mtu: u32,
    ) -> Envelope;

    fn create_traffic_item(&mut self, item: &TrafficItem) -> Envelope;
    fn configure_traffic_item(&mut self, shape: TrafficShape) -> Envelope;
    fn start_traffic(&mut self) -> Envelope;

    /// Returns the flow statistics rendered as a table.
    fn statistics(&mut self) -> Envelope<String>;

    fn stop_traffic(&mut self) -> Envelope;
}
