// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps driving a fieldbus interface card.
//!
//! Steps opening a session, an interface or a connection register it with
//! the [`RigWorld`], so the end of a scenario closes whatever is left open.

use std::time::{Duration, SystemTime};

use cucumber::{given, then, when};
use tokio::time::{self, Instant};

use crate::{
    args,
    controller::capi::{ArpProbe, Block},
    error::{ensure_eq, Result, StepError},
    frame::{self, ExplicitAddress, HexDump, Request},
    poll,
    world::{Resource, RigWorld},
};

/// Settling time between I/O writes and reads of the `Test IO` loop.
const SETTLE: Duration = Duration::from_millis(500);

#[given(regex = r"^Init$")]
#[when(regex = r"^Init$")]
async fn init(w: &mut RigWorld) -> Result<()> {
    let card = w.suite()?.borrow().connector.card()?;
    w.card.insert(card).init().check("Init")?;
    w.opened(Resource::CardSession);
    Ok(())
}

#[given(regex = r#"^Enum drivers "([^"]*)"$"#)]
#[when(regex = r#"^Enum drivers "([^"]*)"$"#)]
async fn enum_drivers(w: &mut RigWorld, index: String) -> Result<()> {
    let index = args::int("index", &index)?;
    w.card()?.enum_drivers(index).check("Enum drivers").map(drop)
}

#[given(regex = r#"^Open interface "([^"]*)"$"#)]
#[when(regex = r#"^Open interface "([^"]*)"$"#)]
async fn open_interface(w: &mut RigWorld, index: String) -> Result<()> {
    let index = args::int("index", &index)?;
    w.card()?.open_interface(index).check("Open interface")?;
    w.opened(Resource::Interface);
    Ok(())
}

#[when(regex = r"^Get card info$")]
#[then(regex = r"^Get card info$")]
async fn card_info(w: &mut RigWorld) -> Result<()> {
    let info = w.card()?.card_info().check("Get card info")?;
    tracing::info!(
        "product name: {}, IP address: {}, firmware: {}",
        info.name,
        info.ip,
        info.firmware,
    );
    w.vars.card_info = Some(info);
    Ok(())
}

#[given(regex = r"^Soft reset device$")]
#[when(regex = r"^Soft reset device$")]
async fn soft_reset(w: &mut RigWorld) -> Result<()> {
    w.card()?.soft_reset().check("Soft reset device").map(drop)
}

#[given(regex = r#"^Start standard connections "([^"]*)"$"#)]
#[when(regex = r#"^Start standard connections "([^"]*)"$"#)]
async fn start_standard_connections(
    w: &mut RigWorld,
    index: String,
) -> Result<()> {
    let index = args::int("index", &index)?;
    let card = w.card()?;
    card.refresh_io().check("Refresh IO")?;
    card.start_all_connections().check("Start all connections")?;
    card.start_produce(index).check("Start produce")?;
    card.start_consume(index).check("Start consume")?;
    let settle = card.consume_duty();
    time::sleep(settle).await;
    Ok(())
}

#[given(regex = r"^Start protocol$")]
#[when(regex = r"^Start protocol$")]
async fn start_protocol(w: &mut RigWorld) -> Result<()> {
    w.card()?.start_protocol().check("Start protocol")?;
    w.opened(Resource::Protocol);
    Ok(())
}

#[given(regex = r"^Stop protocol$")]
#[when(regex = r"^Stop protocol$")]
async fn stop_protocol(w: &mut RigWorld) -> Result<()> {
    w.card()?.stop_protocol().check("Stop protocol")?;
    w.closed(Resource::Protocol);
    Ok(())
}

#[when(regex = r"^Get connection info$")]
#[then(regex = r"^Get connection info$")]
async fn connection_info(w: &mut RigWorld) -> Result<()> {
    let info = w.card()?.connection_info().check("Get connection info")?;
    tracing::info!(
        "connections: {}, active: {}",
        info.connections,
        info.active,
    );
    w.vars.connections = Some(info);
    Ok(())
}

#[when(regex = r"^Get state$")]
#[then(regex = r"^Get state$")]
async fn state(w: &mut RigWorld) -> Result<()> {
    let s = w.card()?.state().check("Get state")?;
    tracing::info!(
        state = s.state,
        io_state = s.io_state,
        ch1_state = s.ch1_state,
        ch2_state = s.ch2_state,
        ch1_io_state = s.ch1_io_state,
        ch2_io_state = s.ch2_io_state,
        "card state",
    );
    Ok(())
}

#[when(regex = r"^Read IO$")]
#[then(regex = r"^Read IO$")]
async fn read_io(w: &mut RigWorld) -> Result<()> {
    let io = w.card()?.read_io().check("Read IO")?;
    tracing::info!("produced: {:?}, consumed: {:?}", io.produced, io.consumed);
    w.vars.io = Some(io);
    Ok(())
}

/// Replaces the first byte of the last read produced image with `value`.
fn with_first_byte(
    image: Option<&Vec<u8>>,
    value: u8,
    read_step: &str,
) -> Result<Vec<u8>> {
    let mut data = image
        .cloned()
        .ok_or_else(|| StepError::missing("produced image", read_step))?;
    *data.first_mut().ok_or(StepError::Empty("produced image"))? = value;
    Ok(data)
}

#[given(regex = r#"^Write IO "([^"]*)"$"#)]
#[when(regex = r#"^Write IO "([^"]*)"$"#)]
async fn write_io(w: &mut RigWorld, value: String) -> Result<()> {
    let value = args::int("value", &value)?;
    let data = with_first_byte(
        w.vars.io.as_ref().map(|io| &io.produced),
        value,
        "Read IO",
    )?;

    let card = w.card()?;
    card.write_produced_io(&data).check("Write IO")?;
    tracing::info!("written: {data:?}");
    let settle = card.produce_duty();
    if let Some(io) = &mut w.vars.io {
        io.produced = data;
    }
    time::sleep(settle).await;
    Ok(())
}

#[given(regex = r"^Start all connections$")]
#[when(regex = r"^Start all connections$")]
async fn start_all_connections(w: &mut RigWorld) -> Result<()> {
    w.card()?
        .start_all_connections()
        .check("Start all connections")
        .map(drop)
}

#[given(regex = r"^Refresh IO$")]
#[when(regex = r"^Refresh IO$")]
async fn refresh_io(w: &mut RigWorld) -> Result<()> {
    w.card()?.refresh_io().check("Refresh IO").map(drop)
}

#[given(regex = r#"^Ping open "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Ping open "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
async fn ping_open(
    w: &mut RigWorld,
    ip: String,
    interval: String,
    length: String,
) -> Result<()> {
    let ip = args::ipv4("ip", &ip)?;
    let interval = match args::int("interval", &interval)? {
        0 => 15,
        n => n,
    };
    let length = match args::int("length", &length)? {
        0 => 10,
        n => n,
    };
    w.card()?.ping_open(ip, interval, length).check("Ping open")?;
    w.opened(Resource::Ping);
    Ok(())
}

#[given(regex = r"^Ping close$")]
#[when(regex = r"^Ping close$")]
async fn ping_close(w: &mut RigWorld) -> Result<()> {
    w.card()?.ping_close().check("Ping close")?;
    w.closed(Resource::Ping);
    Ok(())
}

#[when(regex = r"^Get ping stats$")]
#[then(regex = r"^Get ping stats$")]
async fn ping_stats(w: &mut RigWorld) -> Result<()> {
    let stats = w
        .card()?
        .ping_stats()
        .check("Get ping stats")?
        .ok_or(StepError::Empty("Get ping stats"))?;
    tracing::info!(
        transmitted = stats.transmitted,
        received = stats.received,
        duplicated = stats.duplicated,
        last_rtt = stats.last_rtt,
        max_rtt = stats.max_rtt,
        min_rtt = stats.min_rtt,
        avg_rtt = stats.avg_rtt,
        sum_rtt = stats.sum_rtt,
        send_error = stats.send_error,
        recv_error = stats.recv_error,
        "ping statistics",
    );
    w.vars.ping_stats = Some(stats);
    Ok(())
}

#[when(regex = r"^Get ping error no$")]
#[then(regex = r"^Get ping error no$")]
async fn ping_error_no(w: &mut RigWorld) -> Result<()> {
    let no = w
        .card()?
        .ping_error_no()
        .check("Get ping error no")?
        .ok_or(StepError::Empty("Get ping error no"))?;
    let no = format!("{no:#x}");
    tracing::info!("ping error number: {no}");
    w.vars.ping_error_no = Some(no);
    Ok(())
}

#[given(regex = r"^ARP register$")]
#[when(regex = r"^ARP register$")]
async fn arp_register(w: &mut RigWorld) -> Result<()> {
    w.card()?.arp_register().check("ARP register")?;
    w.opened(Resource::ArpRegistration);
    Ok(())
}

#[given(regex = r#"^ARP use "([^"]*)"$"#)]
#[when(regex = r#"^ARP use "([^"]*)"$"#)]
async fn arp_use(w: &mut RigWorld, ip: String) -> Result<()> {
    let ip = args::ipv4("ip", &ip)?;
    w.card()?.arp_use(ip).check("ARP use").map(drop)
}

#[given(regex = r#"^ARP start "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^ARP start "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
async fn arp_start(
    w: &mut RigWorld,
    ip: String,
    probes: String,
    interval: String,
    timeout: String,
) -> Result<()> {
    let ip = args::ipv4("ip", &ip)?;
    let probe = ArpProbe {
        probes: args::int("probe", &probes)?,
        interval: args::int("interval", &interval)?,
        timeout: args::int("timeout", &timeout)?,
    };
    w.vars.arp_started_at = Some(SystemTime::now());
    w.card()?.arp_start(ip, probe).check("ARP start").map(drop)
}

#[given(regex = r#"^ARP cancel "([^"]*)"$"#)]
#[when(regex = r#"^ARP cancel "([^"]*)"$"#)]
async fn arp_cancel(w: &mut RigWorld, ip: String) -> Result<()> {
    let ip = args::ipv4("ip", &ip)?;
    w.card()?.arp_cancel(ip).check("ARP cancel").map(drop)
}

#[given(regex = r"^ARP unregister$")]
#[when(regex = r"^ARP unregister$")]
async fn arp_unregister(w: &mut RigWorld) -> Result<()> {
    w.card()?.arp_unregister().check("ARP unregister")?;
    w.closed(Resource::ArpRegistration);
    Ok(())
}

#[given(regex = r#"^HB start "([^"]*)"$"#)]
#[when(regex = r#"^HB start "([^"]*)"$"#)]
async fn heartbeat_start(w: &mut RigWorld, period: String) -> Result<()> {
    let period = args::int("heartbeat", &period)?;
    w.card()?.start_heartbeat(period).check("HB start")?;
    w.opened(Resource::Heartbeat);
    Ok(())
}

#[given(regex = r"^HB stop$")]
#[when(regex = r"^HB stop$")]
async fn heartbeat_stop(w: &mut RigWorld) -> Result<()> {
    w.card()?.stop_heartbeat().check("HB stop")?;
    w.closed(Resource::Heartbeat);
    Ok(())
}

#[given(regex = r"^HB fail$")]
#[when(regex = r"^HB fail$")]
async fn heartbeat_fail(w: &mut RigWorld) -> Result<()> {
    w.card()?.fail_heartbeat().check("HB fail").map(drop)
}

#[given(regex = r#"^Poll start "([^"]*)"$"#)]
#[when(regex = r#"^Poll start "([^"]*)"$"#)]
async fn poll_start(w: &mut RigWorld, duty: String) -> Result<()> {
    let duty = args::int("duty cycle", &duty)?;
    w.card()?.start_poll(duty).check("Poll start")?;
    w.opened(Resource::Poll);
    Ok(())
}

#[given(regex = r"^Poll stop$")]
#[when(regex = r"^Poll stop$")]
async fn poll_stop(w: &mut RigWorld) -> Result<()> {
    w.card()?.stop_poll().check("Poll stop")?;
    w.closed(Resource::Poll);
    Ok(())
}

#[given(regex = r#"^Change connection state "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Change connection state "([^"]*)" "([^"]*)"$"#)]
async fn change_connection_state(
    w: &mut RigWorld,
    index: String,
    state: String,
) -> Result<()> {
    let index = args::int("index", &index)?;
    let enable = match args::int::<u8>("state", &state)? {
        0 => false,
        1 => true,
        _ => return Err(StepError::argument("state", state, "expected 0 or 1")),
    };
    w.card()?
        .change_connection_state(index, enable)
        .check("Change connection state")
        .map(drop)
}

#[when(regex = r#"^Get IO status "([^"]*)"$"#)]
#[then(regex = r#"^Get IO status "([^"]*)"$"#)]
async fn io_status(w: &mut RigWorld, index: String) -> Result<()> {
    let index = args::int("index", &index)?;
    let status = w.card()?.io_status(index).check("Get IO status")?;
    tracing::info!(
        "produced status: {}, consumed status: {}",
        status.produced,
        status.consumed,
    );
    w.vars.io_status = Some(status);
    Ok(())
}

/// Sends the `request`, logging both it and the reply as hex dumps.
fn exchange(w: &mut RigWorld, request: &Request) -> Result<()> {
    tracing::info!(
        "sending service {} with data length {}",
        request.service(),
        request.data_length(),
    );
    tracing::debug!("request:\n{}", HexDump(request.payload()));

    let reply = w.card()?.send_message(request).check("Send message")?;
    tracing::info!(
        "reply status: {}, service: {}, size: {}",
        reply.status,
        reply.service,
        reply.size,
    );
    tracing::debug!("reply:\n{}", HexDump(&reply.data));

    if reply.status == 0 {
        Ok(())
    } else {
        Err(StepError::Reply { service: reply.service, status: reply.status })
    }
}

#[given(regex = r#"^Send message blink "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Send message blink "([^"]*)" "([^"]*)"$"#)]
async fn send_blink(w: &mut RigWorld, mac: String, len: String) -> Result<()> {
    let mac = args::mac("MAC", &mac)?;
    let len = frame::data_length(&len)?;
    exchange(w, &Request::blink(mac, len))
}

#[given(
    regex = r#"^Send message set name "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
#[when(
    regex = r#"^Send message set name "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
async fn send_set_name(
    w: &mut RigWorld,
    remanent: String,
    name_length: String,
    name: String,
    mac: String,
    len: String,
) -> Result<()> {
    let remanent = args::int("remanent", &remanent)?;
    let name_length = args::int("name length", &name_length)?;
    let mac = args::mac("MAC", &mac)?;
    let len = frame::data_length(&len)?;
    let request = Request::set_name(remanent, name_length, &name, mac, len)?;
    exchange(w, &request)
}

#[given(
    regex = r#"^Send message set ip "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
#[when(
    regex = r#"^Send message set ip "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
async fn send_set_ip(
    w: &mut RigWorld,
    remanent: String,
    ip_mode: String,
    ip: String,
    mask: String,
    gateway: String,
    mac: String,
    len: String,
) -> Result<()> {
    let request = Request::set_ip(
        args::int("remanent", &remanent)?,
        args::int("IP mode", &ip_mode)?,
        args::ipv4("IP address", &ip)?,
        args::ipv4("IP mask", &mask)?,
        args::ipv4("gateway", &gateway)?,
        args::mac("MAC", &mac)?,
        frame::data_length(&len)?,
    );
    exchange(w, &request)
}

fn explicit_address(
    config_id: &str,
    crc32: &str,
    device: &str,
    api: &str,
    slot: &str,
    subslot: &str,
    index: &str,
) -> Result<ExplicitAddress> {
    Ok(ExplicitAddress {
        config_id: args::int("config ID", config_id)?,
        crc32: args::int("CRC32", crc32)?,
        device: args::int("device number", device)?,
        api: args::int("API", api)?,
        slot: args::int("slot number", slot)?,
        subslot: args::int("subslot number", subslot)?,
        index: args::int("index", index)?,
    })
}

#[given(
    regex = r#"^Send message read explicit "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
#[when(
    regex = r#"^Send message read explicit "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
async fn send_read_explicit(
    w: &mut RigWorld,
    config_id: String,
    crc32: String,
    device: String,
    api: String,
    slot: String,
    subslot: String,
    index: String,
    read_len: String,
    len: String,
) -> Result<()> {
    let addr = explicit_address(
        &config_id, &crc32, &device, &api, &slot, &subslot, &index,
    )?;
    let read_len = args::int("length to read", &read_len)?;
    let len = frame::data_length(&len)?;
    exchange(w, &Request::read_explicit(&addr, read_len, len))
}

#[given(
    regex = r#"^Send message write explicit "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
#[when(
    regex = r#"^Send message write explicit "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
async fn send_write_explicit(
    w: &mut RigWorld,
    config_id: String,
    crc32: String,
    device: String,
    api: String,
    slot: String,
    subslot: String,
    index: String,
    data: String,
    len: String,
) -> Result<()> {
    let addr = explicit_address(
        &config_id, &crc32, &device, &api, &slot, &subslot, &index,
    )?;
    let data = args::list::<u8>("data to write", &data)?;
    let len = frame::data_length(&len)?;
    exchange(w, &Request::write_explicit(&addr, &data, len)?)
}

#[given(regex = r"^Send message identify$")]
#[when(regex = r"^Send message identify$")]
async fn send_identify(w: &mut RigWorld) -> Result<()> {
    exchange(w, &Request::identify())
}

#[given(regex = r"^Send message get device detected$")]
#[when(regex = r"^Send message get device detected$")]
async fn send_device_detected(w: &mut RigWorld) -> Result<()> {
    exchange(w, &Request::device_detected())
}

#[given(regex = r#"^Send message factory reset "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Send message factory reset "([^"]*)" "([^"]*)"$"#)]
async fn send_factory_reset(
    w: &mut RigWorld,
    mac: String,
    len: String,
) -> Result<()> {
    let mac = args::mac("MAC", &mac)?;
    let len = frame::data_length(&len)?;
    exchange(w, &Request::factory_reset(mac, len))
}

#[given(regex = r"^Safe init$")]
#[when(regex = r"^Safe init$")]
async fn safe_init(w: &mut RigWorld) -> Result<()> {
    w.card()?.safe_init().check("Safe init")?;
    w.opened(Resource::SafeSession);
    Ok(())
}

#[given(regex = r#"^Open safe interface "([^"]*)"$"#)]
#[when(regex = r#"^Open safe interface "([^"]*)"$"#)]
async fn open_safe_interface(w: &mut RigWorld, index: String) -> Result<()> {
    let index = args::int("index", &index)?;
    w.card()?.open_safe_interface(index).check("Open safe interface")?;
    w.opened(Resource::SafeInterface);
    Ok(())
}

#[given(regex = r"^Read safe config$")]
#[when(regex = r"^Read safe config$")]
async fn read_safe_config(w: &mut RigWorld) -> Result<()> {
    w.card()?.read_safe_config().check("Read safe config").map(drop)
}

#[given(regex = r"^Enable safe connection$")]
#[when(regex = r"^Enable safe connection$")]
async fn enable_safe_connection(w: &mut RigWorld) -> Result<()> {
    w.card()?.enable_safe_connection().check("Enable safe connection")?;
    w.opened(Resource::SafeConnection);
    Ok(())
}

#[given(regex = r#"^Start safe connections "([^"]*)"$"#)]
#[when(regex = r#"^Start safe connections "([^"]*)"$"#)]
async fn start_safe_connections(w: &mut RigWorld, index: String) -> Result<()> {
    let index = args::int("index", &index)?;
    let card = w.card()?;
    card.refresh_safe_io().check("Refresh safe IO")?;
    card.start_safe_produce(index).check("Start safe produce")?;
    card.start_safe_consume(index).check("Start safe consume")?;
    let settle = card.safe_consume_duty();
    time::sleep(settle).await;
    Ok(())
}

#[when(regex = r"^Read safe IO$")]
#[then(regex = r"^Read safe IO$")]
async fn read_safe_io(w: &mut RigWorld) -> Result<()> {
    let io = w.card()?.read_safe_io().check("Read safe IO")?;
    tracing::info!(
        "safe produced: {:?}, safe consumed: {:?}",
        io.produced,
        io.consumed,
    );
    w.vars.safe_io = Some(io);
    Ok(())
}

#[given(regex = r#"^Write safe IO "([^"]*)"$"#)]
#[when(regex = r#"^Write safe IO "([^"]*)"$"#)]
async fn write_safe_io(w: &mut RigWorld, value: String) -> Result<()> {
    let value = args::int("value", &value)?;
    let data = with_first_byte(
        w.vars.safe_io.as_ref().map(|io| &io.produced),
        value,
        "Read safe IO",
    )?;

    let card = w.card()?;
    card.write_safe_produced_io(&data).check("Write safe IO")?;
    tracing::info!("written: {data:?}");
    let settle = card.safe_produce_duty();
    if let Some(io) = &mut w.vars.safe_io {
        io.produced = data;
    }
    time::sleep(settle).await;
    Ok(())
}

#[given(regex = r#"^Change NCS "([^"]*)"$"#)]
#[when(regex = r#"^Change NCS "([^"]*)"$"#)]
async fn change_ncs(w: &mut RigWorld, value: String) -> Result<()> {
    let value = args::int("value", &value)?;
    w.card()?.change_ncs(value).check("Change NCS").map(drop)
}

#[when(regex = r"^Get NCS$")]
#[then(regex = r"^Get NCS$")]
async fn ncs(w: &mut RigWorld) -> Result<()> {
    let ncs = w.card()?.ncs().check("Get NCS")?;
    tracing::info!("produced NCS: {}, consumed NCS: {}", ncs.produced, ncs.consumed);
    w.vars.ncs = Some(ncs);
    Ok(())
}

#[when(regex = r#"^Get NCS loop "([^"]*)"$"#)]
#[then(regex = r#"^Get NCS loop "([^"]*)"$"#)]
async fn ncs_loop(w: &mut RigWorld, duration: String) -> Result<()> {
    let duration = args::seconds("duration", &duration)?;
    let interval = w.suite()?.borrow().opts.poll_interval;

    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        ncs(w).await?;
        time::sleep(interval).await;
    }
    Ok(())
}

#[when(regex = r#"^Get safe IO status "([^"]*)"$"#)]
#[then(regex = r#"^Get safe IO status "([^"]*)"$"#)]
async fn safe_io_status(w: &mut RigWorld, index: String) -> Result<()> {
    let index = args::int("index", &index)?;
    let status = w.card()?.safe_io_status(index).check("Get safe IO status")?;
    tracing::info!(
        "safe produced status: {}, safe consumed status: {}",
        status.produced,
        status.consumed,
    );
    w.vars.safe_io_status = Some(status);
    Ok(())
}

#[given(regex = r"^Config (register|unregister)$")]
#[when(regex = r"^Config (register|unregister)$")]
async fn config_notify(w: &mut RigWorld, action: String) -> Result<()> {
    let register = action == "register";
    w.card()?.config_notify(register).check("Config notify").map(drop)
}

#[given(regex = r"^Config (lock|unlock)$")]
#[when(regex = r"^Config (lock|unlock)$")]
async fn config_lock(w: &mut RigWorld, action: String) -> Result<()> {
    let lock = action == "lock";
    w.card()?.config_lock(lock).check("Config lock").map(drop)
}

#[given(regex = r"^Config mode$")]
#[when(regex = r"^Config mode$")]
async fn config_mode(w: &mut RigWorld) -> Result<()> {
    w.card()?.config_mode().check("Config mode").map(drop)
}

/// Polls the configuration read-back until the card answers it.
async fn await_config(w: &mut RigWorld, after: &str) -> Result<()> {
    let (timeout, interval) = {
        let suite = w.suite()?.borrow();
        (suite.opts.config_timeout, suite.opts.poll_interval)
    };
    let card = w.card()?;
    let confirmed =
        poll::until(timeout, interval, || card.read_config_id().is_success())
            .await;
    if confirmed {
        Ok(())
    } else {
        Err(StepError::Timeout {
            what: format!("configuration read-back after `{after}`"),
            after: timeout,
        })
    }
}

#[given(regex = r"^Config reset$")]
#[when(regex = r"^Config reset$")]
async fn config_reset(w: &mut RigWorld) -> Result<()> {
    w.card()?.config_reset().check("Config reset")?;
    await_config(w, "Config reset").await
}

#[given(regex = r"^Write block network config( compressed)?$")]
#[when(regex = r"^Write block network config( compressed)?$")]
async fn write_block(w: &mut RigWorld, compressed: String) -> Result<()> {
    let block = if compressed.is_empty() {
        Block::NetworkConfig
    } else {
        Block::NetworkConfigCompressed
    };
    let file = w
        .suite()?
        .borrow()
        .config_file
        .clone()
        .ok_or_else(|| StepError::missing("configuration file", "Load config"))?;
    w.card()?.write_block(block, &file).check("Write block").map(drop)
}

#[given(regex = r"^Config validate$")]
#[when(regex = r"^Config validate$")]
async fn config_validate(w: &mut RigWorld) -> Result<()> {
    w.card()?.config_validate().check("Config validate").map(drop)
}

#[given(regex = r"^Config apply$")]
#[when(regex = r"^Config apply$")]
async fn config_apply(w: &mut RigWorld) -> Result<()> {
    w.card()?.config_apply().check("Config apply")?;
    await_config(w, "Config apply").await
}

#[then(regex = r"^Verify configuration$")]
async fn verify_configuration(w: &mut RigWorld) -> Result<()> {
    let expected = w
        .suite()?
        .borrow()
        .config_crc
        .clone()
        .ok_or_else(|| StepError::missing("configuration CRC", "Get config crc"))?;
    let actual = w.card()?.read_config_id().check("Read config ID")?;
    ensure_eq(
        "configuration CRC",
        expected.to_ascii_lowercase(),
        format!("{actual:#x}"),
    )
}

#[then(regex = r#"^Verify "([^"]*)" card name$"#)]
async fn verify_card_name(w: &mut RigWorld, name: String) -> Result<()> {
    let info = w
        .vars
        .card_info
        .as_ref()
        .ok_or_else(|| StepError::missing("card info", "Get card info"))?;
    ensure_eq("card name", name.as_str(), info.name.as_str())
}

#[then(regex = r#"^Verify "([^"]*)" ip address$"#)]
async fn verify_ip_address(w: &mut RigWorld, ip: String) -> Result<()> {
    let info = w
        .vars
        .card_info
        .as_ref()
        .ok_or_else(|| StepError::missing("card info", "Get card info"))?;
    ensure_eq("IP address", ip.as_str(), info.ip.as_str())
}

#[then(regex = r"^Verify firmware version$")]
async fn verify_firmware(w: &mut RigWorld) -> Result<()> {
    let expected = w.suite()?.borrow().opts.firmware_version()?.to_owned();
    let info = w
        .vars
        .card_info
        .as_ref()
        .ok_or_else(|| StepError::missing("card info", "Get card info"))?;
    ensure_eq("firmware version", expected.as_str(), info.firmware.as_str())
}

#[then(regex = r#"^Verify "([^"]*)" connections$"#)]
async fn verify_connections(w: &mut RigWorld, num: String) -> Result<()> {
    let num = args::int("connections", &num)?;
    let info = w.vars.connections.ok_or_else(|| {
        StepError::missing("connection info", "Get connection info")
    })?;
    ensure_eq("connections", num, info.connections)
}

#[then(regex = r#"^Verify "([^"]*)" active connections$"#)]
async fn verify_active_connections(w: &mut RigWorld, num: String) -> Result<()> {
    let num = args::int("active connections", &num)?;
    let info = w.vars.connections.ok_or_else(|| {
        StepError::missing("connection info", "Get connection info")
    })?;
    ensure_eq("active connections", num, info.active)
}

#[then(regex = r#"^Verify input "([^"]*)"$"#)]
async fn verify_input(w: &mut RigWorld, value: String) -> Result<()> {
    let value = args::int::<u8>("value", &value)?;
    let first = w
        .vars
        .io
        .as_ref()
        .and_then(|io| io.consumed.first().copied())
        .ok_or_else(|| StepError::missing("consumed image", "Read IO"))?;
    ensure_eq("input", value, first)
}

#[then(regex = r#"^Verify safe output "([^"]*)"$"#)]
async fn verify_safe_output(w: &mut RigWorld, value: String) -> Result<()> {
    let value = args::int::<u8>("value", &value)?;
    let first = w
        .vars
        .safe_io
        .as_ref()
        .and_then(|io| io.produced.first().copied())
        .ok_or_else(|| StepError::missing("safe produced image", "Read safe IO"))?;
    ensure_eq("safe output", value, first)
}

#[then(regex = r#"^Verify NCS "([^"]*)" or "([^"]*)"$"#)]
async fn verify_ncs(w: &mut RigWorld, one: String, other: String) -> Result<()> {
    let one = args::int::<u32>("NCS", &one)?;
    let other = args::int::<u32>("NCS", &other)?;
    let ncs = w.vars.ncs.ok_or_else(|| StepError::missing("NCS", "Get NCS"))?;
    if ncs.consumed == one || ncs.consumed == other {
        Ok(())
    } else {
        Err(StepError::Mismatch {
            what: "consumed NCS",
            expected: format!("{one} or {other}"),
            actual: ncs.consumed.to_string(),
        })
    }
}

#[when(regex = r#"^Test IO "([^"]*)" test safe IO "([^"]*)" loop "([^"]*)"$"#)]
#[then(regex = r#"^Test IO "([^"]*)" test safe IO "([^"]*)" loop "([^"]*)"$"#)]
async fn io_loop(
    w: &mut RigWorld,
    standard: String,
    safe: String,
    duration: String,
) -> Result<()> {
    let duration = args::seconds("duration", &duration)?;
    let zero = || "0".to_owned();

    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        read_io(w).await?;
        write_io(w, standard.clone()).await?;
        time::sleep(SETTLE).await;
        read_io(w).await?;
        verify_input(w, standard.clone()).await?;
        read_io(w).await?;
        write_io(w, zero()).await?;
        time::sleep(SETTLE).await;
        read_io(w).await?;
        verify_input(w, zero()).await?;

        ncs(w).await?;
        verify_ncs(w, zero(), "16".to_owned()).await?;
        state(w).await?;

        read_safe_io(w).await?;
        write_safe_io(w, safe.clone()).await?;
        time::sleep(SETTLE).await;
        read_safe_io(w).await?;
        verify_safe_output(w, safe.clone()).await?;
        read_safe_io(w).await?;
        write_safe_io(w, zero()).await?;
        time::sleep(SETTLE).await;
        read_safe_io(w).await?;
        verify_safe_output(w, zero()).await?;

        verify_connections(w, "2".to_owned()).await?;
        verify_active_connections(w, "2".to_owned()).await?;
        tracing::info!("IO loop iteration passed");
    }
    Ok(())
}
