// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps driving an Ixia traffic generator through IxNetwork.
//!
//! Configuration goes through fixed stages, each one requiring the previous
//! one to succeed in the same scenario:
//! connect, ports, topology, protocol interface, traffic item, traffic.

use cucumber::{given, then, when};

use crate::{
    args,
    controller::traffic::{Session, TrafficItem, TrafficShape},
    error::{Result, StepError},
    world::{Resource, RigWorld},
};

const DEFAULT_CHASSIS: &str = "192.168.0.200";
const DEFAULT_SESSION: &str = "TX_to_RX";
const DEFAULT_PORTS: [u32; 2] = [1, 2];
const DEFAULT_MTU: u32 = 1500;
const DEFAULT_FRAME_SIZE: u32 = 245;
const DEFAULT_LINE_RATE: u8 = 100;
const DEFAULT_ETHER_TYPE: u16 = 0xFFFF;

/// The only supported traffic type.
const ETHERNET: &str = "Ethernet";

fn reached(stage: bool, step: &str) -> Result<()> {
    if stage {
        Ok(())
    } else {
        Err(StepError::Precondition(format!("run `{step}` first")))
    }
}

#[given(regex = r#"^Connect to ixia "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Connect to ixia "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
async fn connect(
    w: &mut RigWorld,
    ip: String,
    name: String,
    clear: String,
) -> Result<()> {
    let ip = if ip.trim().is_empty() { DEFAULT_CHASSIS } else { ip.as_str() };
    let session = Session {
        ip: args::ipv4("IP address", ip)?,
        name: if name.trim().is_empty() {
            DEFAULT_SESSION.to_owned()
        } else {
            name
        },
        clear_config: args::flag_or("clear config", &clear, true)?,
    };

    let mut generator = w.suite()?.borrow().connector.traffic_generator()?;
    generator.connect(&session).check("Connect to ixia")?;
    w.traffic = Some(generator);
    w.vars.traffic.connected = true;
    Ok(())
}

#[given(regex = r#"^Configure ports "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Configure ports "([^"]*)" "([^"]*)"$"#)]
async fn configure_ports(
    w: &mut RigWorld,
    ids: String,
    force: String,
) -> Result<()> {
    reached(w.vars.traffic.connected, "Connect to ixia")?;
    let ports = if ids.trim().is_empty() {
        tracing::info!("no port IDs given, using {DEFAULT_PORTS:?}");
        DEFAULT_PORTS
    } else {
        <[u32; 2]>::try_from(args::list::<u32>("port IDs", &ids)?).map_err(
            |_| StepError::argument("port IDs", ids.as_str(), "expected two ports"),
        )?
    };
    let force = args::flag_or("force ownership", &force, true)?;

    w.traffic()?.configure_ports(ports, force).check("Configure ports")?;
    w.vars.traffic.ports = true;
    Ok(())
}

#[given(
    regex = r#"^Configure topology and device group "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
#[when(
    regex = r#"^Configure topology and device group "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
async fn configure_topology(
    w: &mut RigWorld,
    topology: String,
    group: String,
    port: String,
    multiplier: String,
) -> Result<()> {
    reached(w.vars.traffic.ports, "Configure ports")?;
    let topology = args::non_empty("topology name", &topology)?;
    let group = args::non_empty("device group name", &group)?;
    let port = args::int("port ID", &port)?;
    let multiplier = args::int_or("multiplier", &multiplier, 1)?;

    w.traffic()?
        .configure_topology(topology, group, port, multiplier)
        .check("Configure topology and device group")?;
    w.vars.traffic.topology = true;
    Ok(())
}

#[given(regex = r#"^Configure protocol interface "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Configure protocol interface "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
async fn configure_protocol_interface(
    w: &mut RigWorld,
    group: String,
    protocol: String,
    mtu: String,
) -> Result<()> {
    reached(w.vars.traffic.topology, "Configure topology and device group")?;
    let group = args::non_empty("device group name", &group)?;
    let protocol = args::non_empty("protocol name", &protocol)?;
    let mtu = args::int_or("MTU", &mtu, DEFAULT_MTU)?;

    w.traffic()?
        .configure_protocol_interface(group, protocol, mtu)
        .check("Configure protocol interface")?;
    w.vars.traffic.interfaces = true;
    Ok(())
}

#[given(
    regex = r#"^Create traffic item "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
#[when(
    regex = r#"^Create traffic item "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
async fn create_traffic_item(
    w: &mut RigWorld,
    name: String,
    kind: String,
    bidirectional: String,
    source: String,
    destination: String,
) -> Result<()> {
    reached(w.vars.traffic.interfaces, "Configure protocol interface")?;
    if kind != ETHERNET {
        return Err(StepError::argument(
            "traffic type",
            kind,
            "only `Ethernet` is supported",
        ));
    }
    let item = TrafficItem {
        name: args::non_empty("traffic item name", &name)?.to_owned(),
        bidirectional: args::flag("bidirectional", &bidirectional)?,
        source_port: args::int("source port ID", &source)?,
        destination_port: args::int("destination port ID", &destination)?,
    };

    w.traffic()?.create_traffic_item(&item).check("Create traffic item")?;
    w.vars.traffic.item_created = true;
    Ok(())
}

#[given(regex = r#"^Configure traffic item "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Configure traffic item "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
async fn configure_traffic_item(
    w: &mut RigWorld,
    frame_size: String,
    line_rate: String,
    ether_type: String,
) -> Result<()> {
    reached(w.vars.traffic.item_created, "Create traffic item")?;
    let ether_type = if ether_type.trim().is_empty() {
        DEFAULT_ETHER_TYPE
    } else {
        u16::from_str_radix(ether_type.trim(), 16)
            .map_err(|e| StepError::argument("ether type", ether_type.as_str(), e))?
    };
    let shape = TrafficShape {
        frame_size: args::int_or("frame size", &frame_size, DEFAULT_FRAME_SIZE)?,
        line_rate: args::int_or("line rate", &line_rate, DEFAULT_LINE_RATE)?,
        ether_type,
    };

    w.traffic()?
        .configure_traffic_item(shape)
        .check("Configure traffic item")?;
    w.vars.traffic.item_configured = true;
    Ok(())
}

#[given(regex = r"^Start traffic$")]
#[when(regex = r"^Start traffic$")]
async fn start_traffic(w: &mut RigWorld) -> Result<()> {
    reached(w.vars.traffic.item_created, "Create traffic item")?;
    w.traffic()?.start_traffic().check("Start traffic")?;
    w.opened(Resource::Traffic);
    Ok(())
}

#[when(regex = r"^Print statistics$")]
#[then(regex = r"^Print statistics$")]
async fn statistics(w: &mut RigWorld) -> Result<()> {
    w.require(Resource::Traffic, "Start traffic")?;
    let stats = w.traffic()?.statistics().check("Print statistics")?;
    tracing::info!("traffic statistics:\n{stats}");
    Ok(())
}

#[given(regex = r"^Stop traffic$")]
#[when(regex = r"^Stop traffic$")]
async fn stop_traffic(w: &mut RigWorld) -> Result<()> {
    w.require(Resource::Traffic, "Start traffic")?;
    w.traffic()?.stop_traffic().check("Stop traffic")?;
    w.closed(Resource::Traffic);
    Ok(())
}
