// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Mock controllers recording their calls into a shared [`Journal`].

use std::{
    cell::RefCell,
    collections::HashMap,
    net::Ipv4Addr,
    path::{Path, PathBuf},
    rc::Rc,
    time::{Duration, SystemTime},
};

use serde_json::Value;

use crate::{
    broker::{Broker, BrokerError, ConfigCrc, Lookup, RelayInfo},
    config::RigOpts,
    connector::{ConnectError, Connector},
    controller::{
        browser::{BrowserKind, Locator},
        capi::{
            ArpProbe, Block, CardInfo, CardState, ConnectionInfo, IoImage,
            IoStatus, Ncs, PingStats,
        },
        gpio::Direction,
        nab::{Header, Message, Reply as NabReply},
        opcua::{Node, Variant},
        relay::{NUMATO_RELAYS, WEB_RELAYS},
        traffic::{Session, TrafficItem, TrafficShape},
        Browser, Capture, Card, ConformanceTool, Ftp, Gpio, NabAgent,
        NumatoRelay, OpcUaClient, Plc, SerialPort, TrafficGenerator, WebRelay,
    },
    frame::{Reply, Request},
    suite::Suite,
    world::RigWorld,
    Envelope,
};

/// Calls made to mocks, and the operations they should refuse.
#[derive(Clone, Debug, Default)]
pub(crate) struct Journal {
    calls: Rc<RefCell<Vec<String>>>,
    failing: Rc<RefCell<HashMap<String, Option<u32>>>>,
}

impl Journal {
    /// Makes every following `op` call fail.
    pub(crate) fn fail(&self, op: &str) {
        _ = self.failing.borrow_mut().insert(op.into(), None);
    }

    /// Makes the next `times` calls of `op` fail.
    pub(crate) fn fail_times(&self, op: &str, times: u32) {
        _ = self.failing.borrow_mut().insert(op.into(), Some(times));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Indicates whether a call of `op` was made, with whatever arguments.
    pub(crate) fn called(&self, op: &str) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|c| c == op || c.starts_with(&format!("{op} ")))
    }

    pub(crate) fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn should_fail(&self, op: &str) -> bool {
        let mut failing = self.failing.borrow_mut();
        match failing.get_mut(op) {
            None | Some(Some(0)) => false,
            Some(None) => true,
            Some(Some(n)) => {
                *n -= 1;
                true
            }
        }
    }

    fn reply<T: Default>(&self, call: impl Into<String>, data: T) -> Envelope<T> {
        let call = call.into();
        let op = call.split(' ').next().unwrap_or_default().to_owned();
        self.calls.borrow_mut().push(call);
        if self.should_fail(&op) {
            Envelope::failed(1, format!("{op} refused"))
        } else {
            Envelope::ok(format!("{op} done"), data)
        }
    }
}

pub(crate) struct MockCard {
    journal: Journal,
    produced: Vec<u8>,
    safe_produced: Vec<u8>,
    ncs: u32,
}

impl MockCard {
    pub(crate) fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            produced: vec![0; 4],
            safe_produced: vec![0; 4],
            ncs: 0,
        }
    }
}

impl Card for MockCard {
    fn init(&mut self) -> Envelope {
        self.journal.reply("init", ())
    }
    fn exit(&mut self) -> Envelope {
        self.journal.reply("exit", ())
    }
    fn enum_drivers(&mut self, index: u32) -> Envelope {
        self.journal.reply(format!("enum_drivers {index}"), ())
    }
    fn open_interface(&mut self, index: u32) -> Envelope {
        self.journal.reply(format!("open_interface {index}"), ())
    }
    fn close_interface(&mut self) -> Envelope {
        self.journal.reply("close_interface", ())
    }
    fn card_info(&mut self) -> Envelope<CardInfo> {
        self.journal.reply(
            "card_info",
            CardInfo {
                name: "harshio600-epn".into(),
                ip: "192.168.0.10".into(),
                firmware: "1.2.3".into(),
            },
        )
    }
    fn soft_reset(&mut self) -> Envelope {
        self.journal.reply("soft_reset", ())
    }
    fn start_protocol(&mut self) -> Envelope {
        self.journal.reply("start_protocol", ())
    }
    fn stop_protocol(&mut self) -> Envelope {
        self.journal.reply("stop_protocol", ())
    }
    fn connection_info(&mut self) -> Envelope<ConnectionInfo> {
        self.journal
            .reply("connection_info", ConnectionInfo { connections: 2, active: 2 })
    }
    fn change_connection_state(&mut self, index: u32, enable: bool) -> Envelope {
        self.journal
            .reply(format!("change_connection_state {index} {enable}"), ())
    }
    fn state(&mut self) -> Envelope<CardState> {
        self.journal.reply("state", CardState { state: 3, ..CardState::default() })
    }
    fn refresh_io(&mut self) -> Envelope {
        self.journal.reply("refresh_io", ())
    }
    fn start_all_connections(&mut self) -> Envelope {
        self.journal.reply("start_all_connections", ())
    }
    fn start_produce(&mut self, index: u32) -> Envelope {
        self.journal.reply(format!("start_produce {index}"), ())
    }
    fn start_consume(&mut self, index: u32) -> Envelope {
        self.journal.reply(format!("start_consume {index}"), ())
    }
    fn read_io(&mut self) -> Envelope<IoImage> {
        self.journal.reply(
            "read_io",
            IoImage { produced: self.produced.clone(), consumed: self.produced.clone() },
        )
    }
    fn write_produced_io(&mut self, data: &[u8]) -> Envelope {
        let env = self.journal.reply(format!("write_produced_io {data:?}"), ());
        if env.is_success() {
            self.produced = data.to_vec();
        }
        env
    }
    fn io_status(&mut self, index: u32) -> Envelope<IoStatus> {
        self.journal
            .reply(format!("io_status {index}"), IoStatus { produced: 1, consumed: 1 })
    }
    fn produce_duty(&self) -> Duration {
        Duration::from_millis(100)
    }
    fn consume_duty(&self) -> Duration {
        Duration::from_millis(100)
    }
    fn ping_open(&mut self, ip: Ipv4Addr, interval: u32, length: u32) -> Envelope {
        self.journal.reply(format!("ping_open {ip} {interval} {length}"), ())
    }
    fn ping_close(&mut self) -> Envelope {
        self.journal.reply("ping_close", ())
    }
    fn ping_stats(&mut self) -> Envelope<Option<PingStats>> {
        if self.journal.should_fail("ping_stats_empty") {
            return self.journal.reply("ping_stats", None);
        }
        self.journal.reply(
            "ping_stats",
            Some(PingStats { transmitted: 4, received: 4, ..PingStats::default() }),
        )
    }
    fn ping_error_no(&mut self) -> Envelope<Option<u32>> {
        self.journal.reply("ping_error_no", Some(0x1f))
    }
    fn arp_register(&mut self) -> Envelope {
        self.journal.reply("arp_register", ())
    }
    fn arp_unregister(&mut self) -> Envelope {
        self.journal.reply("arp_unregister", ())
    }
    fn arp_use(&mut self, ip: Ipv4Addr) -> Envelope {
        self.journal.reply(format!("arp_use {ip}"), ())
    }
    fn arp_start(&mut self, ip: Ipv4Addr, probe: ArpProbe) -> Envelope {
        self.journal.reply(
            format!("arp_start {ip} {} {} {}", probe.probes, probe.interval, probe.timeout),
            (),
        )
    }
    fn arp_cancel(&mut self, ip: Ipv4Addr) -> Envelope {
        self.journal.reply(format!("arp_cancel {ip}"), ())
    }
    fn start_heartbeat(&mut self, period_ms: u32) -> Envelope {
        self.journal.reply(format!("start_heartbeat {period_ms}"), ())
    }
    fn stop_heartbeat(&mut self) -> Envelope {
        self.journal.reply("stop_heartbeat", ())
    }
    fn fail_heartbeat(&mut self) -> Envelope {
        self.journal.reply("fail_heartbeat", ())
    }
    fn start_poll(&mut self, duty_ms: u32) -> Envelope {
        self.journal.reply(format!("start_poll {duty_ms}"), ())
    }
    fn stop_poll(&mut self) -> Envelope {
        self.journal.reply("stop_poll", ())
    }
    fn send_message(&mut self, request: &Request) -> Envelope<Reply> {
        let status = u32::from(self.journal.should_fail("reply_status"));
        self.journal.reply(
            format!("send_message {}", request.service()),
            Reply {
                status,
                service: request.service().0,
                size: u32::from(request.data_length()),
                data: request.payload().to_vec(),
            },
        )
    }
    fn safe_init(&mut self) -> Envelope {
        self.journal.reply("safe_init", ())
    }
    fn safe_exit(&mut self) -> Envelope {
        self.journal.reply("safe_exit", ())
    }
    fn open_safe_interface(&mut self, index: u32) -> Envelope {
        self.journal.reply(format!("open_safe_interface {index}"), ())
    }
    fn close_safe_interface(&mut self) -> Envelope {
        self.journal.reply("close_safe_interface", ())
    }
    fn read_safe_config(&mut self) -> Envelope {
        self.journal.reply("read_safe_config", ())
    }
    fn enable_safe_connection(&mut self) -> Envelope {
        self.journal.reply("enable_safe_connection", ())
    }
    fn disable_safe_connection(&mut self) -> Envelope {
        self.journal.reply("disable_safe_connection", ())
    }
    fn refresh_safe_io(&mut self) -> Envelope {
        self.journal.reply("refresh_safe_io", ())
    }
    fn start_safe_produce(&mut self, index: u32) -> Envelope {
        self.journal.reply(format!("start_safe_produce {index}"), ())
    }
    fn start_safe_consume(&mut self, index: u32) -> Envelope {
        self.journal.reply(format!("start_safe_consume {index}"), ())
    }
    fn read_safe_io(&mut self) -> Envelope<IoImage> {
        self.journal.reply(
            "read_safe_io",
            IoImage {
                produced: self.safe_produced.clone(),
                consumed: vec![0; 4],
            },
        )
    }
    fn write_safe_produced_io(&mut self, data: &[u8]) -> Envelope {
        let env = self.journal.reply(format!("write_safe_produced_io {data:?}"), ());
        if env.is_success() {
            self.safe_produced = data.to_vec();
        }
        env
    }
    fn safe_io_status(&mut self, index: u32) -> Envelope<IoStatus> {
        self.journal.reply(
            format!("safe_io_status {index}"),
            IoStatus { produced: 2, consumed: 2 },
        )
    }
    fn change_ncs(&mut self, value: u32) -> Envelope {
        self.ncs = value;
        self.journal.reply(format!("change_ncs {value}"), ())
    }
    fn ncs(&mut self) -> Envelope<Ncs> {
        self.journal.reply("ncs", Ncs { produced: self.ncs, consumed: 16 })
    }
    fn safe_produce_duty(&self) -> Duration {
        Duration::from_millis(200)
    }
    fn safe_consume_duty(&self) -> Duration {
        Duration::from_millis(200)
    }
    fn config_notify(&mut self, register: bool) -> Envelope {
        self.journal.reply(format!("config_notify {register}"), ())
    }
    fn config_lock(&mut self, lock: bool) -> Envelope {
        self.journal.reply(format!("config_lock {lock}"), ())
    }
    fn config_mode(&mut self) -> Envelope {
        self.journal.reply("config_mode", ())
    }
    fn config_reset(&mut self) -> Envelope {
        self.journal.reply("config_reset", ())
    }
    fn write_block(&mut self, block: Block, file: &Path) -> Envelope {
        self.journal
            .reply(format!("write_block {} {}", block.id(), file.display()), ())
    }
    fn config_validate(&mut self) -> Envelope {
        self.journal.reply("config_validate", ())
    }
    fn config_apply(&mut self) -> Envelope {
        self.journal.reply("config_apply", ())
    }
    fn read_config_id(&mut self) -> Envelope<u32> {
        self.journal.reply("read_config_id", 0x1234_abcd)
    }
}

struct MockGpio {
    journal: Journal,
    levels: HashMap<u32, bool>,
}

impl Gpio for MockGpio {
    fn init(&mut self, pin: u32, direction: Direction) -> Envelope {
        self.journal.reply(format!("gpio_init {pin} {direction:?}"), ())
    }
    fn read(&mut self, pin: u32) -> Envelope<bool> {
        let level = self.levels.get(&pin).copied().unwrap_or_default();
        self.journal.reply(format!("gpio_read {pin}"), level)
    }
    fn write(&mut self, pin: u32, high: bool) -> Envelope {
        _ = self.levels.insert(pin, high);
        self.journal.reply(format!("gpio_write {pin} {high}"), ())
    }
    fn close(&mut self, pin: u32) -> Envelope {
        self.journal.reply(format!("gpio_close {pin}"), ())
    }
}

struct MockTraffic(Journal);

impl TrafficGenerator for MockTraffic {
    fn connect(&mut self, session: &Session) -> Envelope {
        self.0.reply(
            format!("ixia_connect {} {} {}", session.ip, session.name, session.clear_config),
            (),
        )
    }
    fn configure_ports(&mut self, ports: [u32; 2], force: bool) -> Envelope {
        self.0.reply(format!("configure_ports {ports:?} {force}"), ())
    }
    fn configure_topology(
        &mut self,
        topology: &str,
        device_group: &str,
        port: u32,
        multiplier: u32,
    ) -> Envelope {
        self.0.reply(
            format!("configure_topology {topology} {device_group} {port} {multiplier}"),
            (),
        )
    }
    fn configure_protocol_interface(
        &mut self,
        device_group: &str,
        protocol: &str,
        mtu: u32,
    ) -> Envelope {
        self.0.reply(
            format!("configure_protocol_interface {device_group} {protocol} {mtu}"),
            (),
        )
    }
    fn create_traffic_item(&mut self, item: &TrafficItem) -> Envelope {
        self.0.reply(format!("create_traffic_item {}", item.name), ())
    }
    fn configure_traffic_item(&mut self, shape: TrafficShape) -> Envelope {
        self.0.reply(
            format!(
                "configure_traffic_item {} {} {:04x}",
                shape.frame_size, shape.line_rate, shape.ether_type,
            ),
            (),
        )
    }
    fn start_traffic(&mut self) -> Envelope {
        self.0.reply("start_traffic", ())
    }
    fn statistics(&mut self) -> Envelope<String> {
        self.0.reply("statistics", "Tx Frames: 100, Rx Frames: 100".to_owned())
    }
    fn stop_traffic(&mut self) -> Envelope {
        self.0.reply("stop_traffic", ())
    }
}

struct MockCapture(Journal);

impl Capture for MockCapture {
    fn stop(&mut self) -> Envelope {
        self.0.reply("capture_stop", ())
    }
    fn export_json(&mut self, file: &Path) -> Envelope {
        self.0.reply(format!("export_json {}", file.display()), ())
    }
    fn arp_count(&mut self, src: Ipv4Addr, dst: Ipv4Addr, _: SystemTime) -> Envelope<u32> {
        self.0.reply(format!("arp_count {src} {dst}"), 3)
    }
}

struct MockNab(Journal);

impl NabAgent for MockNab {
    fn exchange(&mut self, message: &Message) -> Envelope<NabReply> {
        let data = if message.command & 0xFF == 0xBA {
            message.data.iter().map(|b| !b).collect::<Vec<_>>()
        } else {
            message.data.clone()
        };
        let result = if self.0.should_fail("nab_result") { 5 } else { 0 };
        self.0.reply(
            format!("nab_exchange {:#x}", message.command),
            NabReply {
                header: Header {
                    command: message.command | 0x8000,
                    message_id: 1,
                    instance: message.instance,
                    size: u32::try_from(message.data.len()).unwrap(),
                    version: message.version,
                },
                result,
                data,
            },
        )
    }
    fn disconnect(&mut self) -> Envelope {
        self.0.reply("nab_disconnect", ())
    }
}

struct MockSerial {
    journal: Journal,
    lines: Vec<String>,
}

impl SerialPort for MockSerial {
    fn find(&mut self, text: &str, timeout: Duration) -> Envelope<bool> {
        let found = self.lines.iter().any(|l| l.contains(text));
        self.journal
            .reply(format!("serial_find {text} {}", timeout.as_secs()), found)
    }
    fn write(&mut self, text: &str) -> Envelope {
        self.journal.reply(format!("serial_write {text:?}"), ())
    }
    fn read(&mut self) -> Envelope<String> {
        let last = self.lines.last().cloned().unwrap_or_default();
        self.journal.reply("serial_read", last)
    }
    fn read_all(&mut self) -> Envelope<Vec<String>> {
        self.journal.reply("serial_read_all", self.lines.clone())
    }
    fn clear(&mut self) -> Envelope {
        self.lines.clear();
        self.journal.reply("serial_clear", ())
    }
    fn stop(&mut self) -> Envelope {
        self.journal.reply("serial_stop", ())
    }
}

struct MockNumato {
    journal: Journal,
    states: [bool; NUMATO_RELAYS],
}

impl NumatoRelay for MockNumato {
    fn version(&mut self) -> Envelope<String> {
        self.journal.reply("numato_version", "00000008".to_owned())
    }
    fn reset(&mut self) -> Envelope {
        self.states = [false; NUMATO_RELAYS];
        self.journal.reply("numato_reset", ())
    }
    fn read(&mut self, index: u8) -> Envelope<bool> {
        let state = self.states[usize::from(index)];
        self.journal.reply(format!("numato_read {index}"), state)
    }
    fn read_all(&mut self) -> Envelope<[bool; NUMATO_RELAYS]> {
        self.journal.reply("numato_read_all", self.states)
    }
    fn on(&mut self, index: u8) -> Envelope {
        self.states[usize::from(index)] = true;
        self.journal.reply(format!("numato_on {index}"), ())
    }
    fn off(&mut self, index: u8) -> Envelope {
        self.states[usize::from(index)] = false;
        self.journal.reply(format!("numato_off {index}"), ())
    }
    fn write_all(&mut self, states: [bool; NUMATO_RELAYS]) -> Envelope {
        self.states = states;
        self.journal.reply("numato_write_all", ())
    }
}

struct MockWebRelay {
    journal: Journal,
    address: String,
    states: Vec<bool>,
}

impl WebRelay for MockWebRelay {
    fn set_all(&mut self, states: [bool; WEB_RELAYS]) -> Envelope {
        self.states = states.to_vec();
        self.journal.reply(format!("relay_set {}", self.address), ())
    }
    fn status(&mut self) -> Envelope<Vec<bool>> {
        self.journal
            .reply(format!("relay_status {}", self.address), self.states.clone())
    }
    fn on(&mut self, relay: u8) -> Envelope {
        self.states[usize::from(relay) - 1] = true;
        self.journal.reply(format!("relay_on {} {relay}", self.address), ())
    }
    fn off(&mut self, relay: u8) -> Envelope {
        self.states[usize::from(relay) - 1] = false;
        self.journal.reply(format!("relay_off {} {relay}", self.address), ())
    }
}

struct MockFtp(Journal);

impl Ftp for MockFtp {
    fn connect(&mut self, host: &str) -> Envelope<String> {
        self.0.reply(format!("ftp_connect {host}"), "220 ready".to_owned())
    }
    fn login(&mut self, user: &str, _: &str) -> Envelope<String> {
        self.0.reply(format!("ftp_login {user}"), "230 logged in".to_owned())
    }
    fn cwd(&mut self, dir: &str) -> Envelope<String> {
        self.0.reply(format!("ftp_cwd {dir}"), "250 ok".to_owned())
    }
    fn mkd(&mut self, dir: &str) -> Envelope<String> {
        self.0.reply(format!("ftp_mkd {dir}"), format!("257 {dir}"))
    }
    fn nlst(&mut self) -> Envelope<Vec<String>> {
        self.0.reply("ftp_nlst", vec!["fw.bin".to_owned()])
    }
    fn store_binary(&mut self, file: &Path) -> Envelope<String> {
        self.0
            .reply(format!("ftp_stor {}", file.display()), "226 done".to_owned())
    }
    fn quit(&mut self) -> Envelope {
        self.0.reply("ftp_quit", ())
    }
}

struct MockPlc {
    journal: Journal,
    tags: HashMap<String, i64>,
}

impl Plc for MockPlc {
    fn read(&mut self, tag: &str) -> Envelope<i64> {
        let value = self.tags.get(tag).copied().unwrap_or_default();
        self.journal.reply(format!("plc_read {tag}"), value)
    }
    fn write(&mut self, tag: &str, value: i64) -> Envelope {
        _ = self.tags.insert(tag.to_owned(), value);
        self.journal.reply(format!("plc_write {tag} {value}"), ())
    }
    fn close(&mut self) -> Envelope {
        self.journal.reply("plc_close", ())
    }
}

struct MockOpcUa {
    journal: Journal,
    values: HashMap<Node, Variant>,
}

impl OpcUaClient for MockOpcUa {
    fn node(&mut self, id: &str) -> Envelope<Option<Node>> {
        self.journal.reply(format!("opcua_node {id}"), Some(Node(id.to_owned())))
    }
    fn browse_name(&mut self, node: &Node) -> Envelope<String> {
        self.journal.reply(format!("opcua_browse {node}"), format!("2:{node}"))
    }
    fn value(&mut self, node: &Node) -> Envelope<Option<Variant>> {
        let value = self.values.get(node).cloned();
        self.journal.reply(format!("opcua_value {node}"), value)
    }
    fn set_value(&mut self, node: &Node, value: &Variant) -> Envelope {
        _ = self.values.insert(node.clone(), value.clone());
        self.journal.reply(format!("opcua_set {node} {value}"), ())
    }
}

struct MockBrowser(Journal);

impl Browser for MockBrowser {
    fn navigate(&mut self, url: &str) -> Envelope {
        self.0.reply(format!("navigate {url}"), ())
    }
    fn save_screenshot(&mut self) -> Envelope<PathBuf> {
        self.0.reply("screenshot", PathBuf::from("screenshot.png"))
    }
    fn click(&mut self, element: &Locator) -> Envelope {
        self.0.reply(format!("click {element:?}"), ())
    }
    fn selected_text(&mut self, dropdown: &Locator) -> Envelope<String> {
        self.0.reply(format!("selected_text {dropdown:?}"), "DHCP".to_owned())
    }
    fn select_by_value(&mut self, dropdown: &Locator, value: &str) -> Envelope {
        self.0.reply(format!("select_by_value {dropdown:?} {value}"), ())
    }
    fn text(&mut self, element: &Locator) -> Envelope<String> {
        self.0.reply(format!("text {element:?}"), "Online".to_owned())
    }
    fn quit(&mut self) -> Envelope {
        self.0.reply("browser_quit", ())
    }
}

struct MockConformance(Journal);

impl ConformanceTool for MockConformance {
    fn run_test(&mut self, file: &Path) -> Envelope<String> {
        self.0.reply(format!("run_test {}", file.display()), "PASSED".to_owned())
    }
    fn rename_log(&mut self, test: &str) -> Envelope {
        self.0.reply(format!("rename_log {test}"), ())
    }
}

/// [`Connector`] handing out mocks. Connecting a system fails if its
/// `connect <system>` operation is made failing in the [`Journal`].
pub(crate) struct MockConnector(pub(crate) Journal);

impl MockConnector {
    fn connect(&self, what: &'static str) -> Result<(), ConnectError> {
        if self.0.should_fail(&format!("connect_{what}")) {
            Err(ConnectError::new(what, "refused"))
        } else {
            Ok(())
        }
    }
}

impl Connector for MockConnector {
    fn card(&self) -> Result<Box<dyn Card>, ConnectError> {
        self.connect("card")?;
        Ok(Box::new(MockCard::new(&self.0)))
    }
    fn ftp(&self) -> Result<Box<dyn Ftp>, ConnectError> {
        self.connect("ftp")?;
        Ok(Box::new(MockFtp(self.0.clone())))
    }
    fn gpio(&self) -> Result<Box<dyn Gpio>, ConnectError> {
        self.connect("gpio")?;
        Ok(Box::new(MockGpio { journal: self.0.clone(), levels: HashMap::new() }))
    }
    fn traffic_generator(&self) -> Result<Box<dyn TrafficGenerator>, ConnectError> {
        self.connect("traffic")?;
        Ok(Box::new(MockTraffic(self.0.clone())))
    }
    fn nab_agent(&self) -> Result<Box<dyn NabAgent>, ConnectError> {
        self.connect("nab")?;
        Ok(Box::new(MockNab(self.0.clone())))
    }
    fn numato_relay(&self, _: &str) -> Result<Box<dyn NumatoRelay>, ConnectError> {
        self.connect("numato")?;
        Ok(Box::new(MockNumato {
            journal: self.0.clone(),
            states: [false; NUMATO_RELAYS],
        }))
    }
    fn web_relay(&self, address: &str) -> Result<Box<dyn WebRelay>, ConnectError> {
        self.connect("web_relay")?;
        Ok(Box::new(MockWebRelay {
            journal: self.0.clone(),
            address: address.to_owned(),
            states: vec![false; WEB_RELAYS],
        }))
    }
    fn opcua(&self, _: &str) -> Result<Box<dyn OpcUaClient>, ConnectError> {
        self.connect("opcua")?;
        Ok(Box::new(MockOpcUa { journal: self.0.clone(), values: HashMap::new() }))
    }
    fn plc(&self) -> Result<Box<dyn Plc>, ConnectError> {
        self.connect("plc")?;
        Ok(Box::new(MockPlc { journal: self.0.clone(), tags: HashMap::new() }))
    }
    fn browser(&self, _: BrowserKind) -> Result<Box<dyn Browser>, ConnectError> {
        self.connect("browser")?;
        Ok(Box::new(MockBrowser(self.0.clone())))
    }
    fn serial_port(&self, _: &Path) -> Result<Box<dyn SerialPort>, ConnectError> {
        self.connect("serial")?;
        Ok(Box::new(MockSerial {
            journal: self.0.clone(),
            lines: vec![
                "Hit any key to stop autoboot".to_owned(),
                "SSR agent is ready...".to_owned(),
            ],
        }))
    }
    fn capture(&self, interface: &str) -> Result<Box<dyn Capture>, ConnectError> {
        self.connect("capture")?;
        _ = self.0.reply(format!("capture_start {interface}"), ());
        Ok(Box::new(MockCapture(self.0.clone())))
    }
    fn conformance_tool(&self) -> Result<Box<dyn ConformanceTool>, ConnectError> {
        self.connect("conformance")?;
        Ok(Box::new(MockConformance(self.0.clone())))
    }
}

/// [`Broker`] answering from fixed tables. A tool is busy while `reserve`
/// is made failing in the [`Journal`].
pub(crate) struct MockBroker(pub(crate) Journal);

impl Broker for MockBroker {
    fn reserve(
        &self,
        node: &str,
        tool: &str,
        vlan_id: u32,
    ) -> Result<Envelope<Value>, BrokerError> {
        Ok(self.0.reply(format!("reserve {node} {tool} {vlan_id}"), Value::Null))
    }
    fn unreserve(&self, node: &str, tool: &str) -> Result<Envelope<Value>, BrokerError> {
        Ok(self.0.reply(format!("unreserve {node} {tool}"), Value::Null))
    }
    fn lookup(
        &self,
        standard: &str,
        safe: Option<&str>,
    ) -> Result<Envelope<Option<Lookup>>, BrokerError> {
        Ok(self.0.reply(
            format!("lookup {standard} {}", safe.unwrap_or("-")),
            Some(Lookup { port: Value::from(25), toolname: "eip1".into() }),
        ))
    }
    fn config_crc(&self, filename: &str) -> Result<Envelope<Option<ConfigCrc>>, BrokerError> {
        Ok(self.0.reply(
            format!("config_crc {filename}"),
            Some(ConfigCrc { crc: "0x1234abcd".into() }),
        ))
    }
    fn relay_info(
        &self,
        automation_index: &str,
    ) -> Result<Envelope<Option<RelayInfo>>, BrokerError> {
        Ok(self.0.reply(
            format!("relay_info {automation_index}"),
            Some(RelayInfo {
                addresses: vec!["10.0.0.2".into(), "10.0.0.3".into(), "10.0.0.2".into()],
                indices: vec![1, 4, 7],
            }),
        ))
    }
}

/// Returns [`RigOpts`] having every setting configured.
pub(crate) fn opts() -> RigOpts {
    RigOpts {
        node_name: Some("node-1".into()),
        vlan_id: Some(12),
        config_dir: Some(std::env::temp_dir()),
        firmware_version: Some("1.2.3".into()),
        capture_interface: Some("eth1".into()),
        ss1: Some("ttyUSB0".into()),
        ss2: Some("ttyUSB1".into()),
        automation_index: Some("99".into()),
        ..RigOpts::default()
    }
}

/// Returns a [`RigWorld`] attached to a mocked [`Suite`] configured with
/// the given `opts`.
pub(crate) fn rig_with(opts: RigOpts) -> (RigWorld, Journal) {
    let journal = Journal::default();
    let suite = Suite::new(
        Box::new(MockConnector(journal.clone())),
        Box::new(MockBroker(journal.clone())),
        opts,
    );
    (RigWorld::new(suite), journal)
}

/// Returns a [`RigWorld`] attached to a fully configured mocked [`Suite`].
pub(crate) fn rig() -> (RigWorld, Journal) {
    rig_with(opts())
}
