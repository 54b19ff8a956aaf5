use std::{
    cell::RefCell,
    collections::HashMap,
    net::Ipv4Addr,
    path::Path,
    rc::Rc,
    time::Duration,
};

use cucumber_rig::{
    broker::{BrokerError, ConfigCrc, Lookup, RelayInfo},
    controller::{
        capi::{
            ArpProbe, Block, CardInfo, CardState, ConnectionInfo, IoImage,
            IoStatus, Ncs, PingStats,
        },
        gpio::Direction,
        relay::NUMATO_RELAYS,
        Card, Gpio, NumatoRelay, Plc, SerialPort,
    },
    frame::{Reply, Request},
    Broker, ConnectError, Connector, Envelope, Rig, RigOpts,
};
use serde_json::Value;

/// Calls made to the lab doubles, shared by all of them.
#[derive(Clone, Debug, Default)]
struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    fn ok<T>(&self, call: impl Into<String>, data: T) -> Envelope<T> {
        let call = call.into();
        self.0.borrow_mut().push(call.clone());
        Envelope::ok(call, data)
    }

    fn contains(&self, call: &str) -> bool {
        self.0.borrow().iter().any(|c| c == call)
    }

    /// Calls made, among the given ones, in the order they were made.
    fn only(&self, calls: &[&str]) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|c| calls.contains(&c.as_str()))
            .cloned()
            .collect()
    }
}

/// Card looping its produced image back as the consumed one.
struct LabCard {
    log: Log,
    produced: Vec<u8>,
}

impl Card for LabCard {
    fn init(&mut self) -> Envelope {
        self.log.ok("init", ())
    }
    fn exit(&mut self) -> Envelope {
        self.log.ok("exit", ())
    }
    fn enum_drivers(&mut self, index: u32) -> Envelope {
        self.log.ok(format!("enum_drivers {index}"), ())
    }
    fn open_interface(&mut self, index: u32) -> Envelope {
        self.log.ok(format!("open_interface {index}"), ())
    }
    fn close_interface(&mut self) -> Envelope {
        self.log.ok("close_interface", ())
    }
    fn card_info(&mut self) -> Envelope<CardInfo> {
        self.log.ok("card_info", CardInfo::default())
    }
    fn soft_reset(&mut self) -> Envelope {
        self.log.ok("soft_reset", ())
    }
    fn start_protocol(&mut self) -> Envelope {
        self.log.ok("start_protocol", ())
    }
    fn stop_protocol(&mut self) -> Envelope {
        self.log.ok("stop_protocol", ())
    }
    fn connection_info(&mut self) -> Envelope<ConnectionInfo> {
        self.log.ok("connection_info", ConnectionInfo::default())
    }
    fn change_connection_state(&mut self, index: u32, enable: bool) -> Envelope {
        self.log.ok(format!("change_connection_state {index} {enable}"), ())
    }
    fn state(&mut self) -> Envelope<CardState> {
        self.log.ok("state", CardState::default())
    }
    fn refresh_io(&mut self) -> Envelope {
        self.log.ok("refresh_io", ())
    }
    fn start_all_connections(&mut self) -> Envelope {
        self.log.ok("start_all_connections", ())
    }
    fn start_produce(&mut self, index: u32) -> Envelope {
        self.log.ok(format!("start_produce {index}"), ())
    }
    fn start_consume(&mut self, index: u32) -> Envelope {
        self.log.ok(format!("start_consume {index}"), ())
    }
    fn read_io(&mut self) -> Envelope<IoImage> {
        let image = IoImage {
            produced: self.produced.clone(),
            consumed: self.produced.clone(),
        };
        self.log.ok("read_io", image)
    }
    fn write_produced_io(&mut self, data: &[u8]) -> Envelope {
        self.produced = data.to_vec();
        self.log.ok(format!("write_produced_io {data:?}"), ())
    }
    fn io_status(&mut self, index: u32) -> Envelope<IoStatus> {
        self.log.ok(format!("io_status {index}"), IoStatus::default())
    }
    fn produce_duty(&self) -> Duration {
        Duration::ZERO
    }
    fn consume_duty(&self) -> Duration {
        Duration::ZERO
    }
    fn ping_open(&mut self, ip: Ipv4Addr, _: u32, _: u32) -> Envelope {
        self.log.ok(format!("ping_open {ip}"), ())
    }
    fn ping_close(&mut self) -> Envelope {
        self.log.ok("ping_close", ())
    }
    fn ping_stats(&mut self) -> Envelope<Option<PingStats>> {
        self.log.ok("ping_stats", Some(PingStats::default()))
    }
    fn ping_error_no(&mut self) -> Envelope<Option<u32>> {
        self.log.ok("ping_error_no", None)
    }
    fn arp_register(&mut self) -> Envelope {
        self.log.ok("arp_register", ())
    }
    fn arp_unregister(&mut self) -> Envelope {
        self.log.ok("arp_unregister", ())
    }
    fn arp_use(&mut self, ip: Ipv4Addr) -> Envelope {
        self.log.ok(format!("arp_use {ip}"), ())
    }
    fn arp_start(&mut self, ip: Ipv4Addr, _: ArpProbe) -> Envelope {
        self.log.ok(format!("arp_start {ip}"), ())
    }
    fn arp_cancel(&mut self, ip: Ipv4Addr) -> Envelope {
        self.log.ok(format!("arp_cancel {ip}"), ())
    }
    fn start_heartbeat(&mut self, period_ms: u32) -> Envelope {
        self.log.ok(format!("start_heartbeat {period_ms}"), ())
    }
    fn stop_heartbeat(&mut self) -> Envelope {
        self.log.ok("stop_heartbeat", ())
    }
    fn fail_heartbeat(&mut self) -> Envelope {
        self.log.ok("fail_heartbeat", ())
    }
    fn start_poll(&mut self, duty_ms: u32) -> Envelope {
        self.log.ok(format!("start_poll {duty_ms}"), ())
    }
    fn stop_poll(&mut self) -> Envelope {
        self.log.ok("stop_poll", ())
    }
    fn send_message(&mut self, _: &Request) -> Envelope<Reply> {
        self.log.ok("send_message", Reply::default())
    }
    fn safe_init(&mut self) -> Envelope {
        self.log.ok("safe_init", ())
    }
    fn safe_exit(&mut self) -> Envelope {
        self.log.ok("safe_exit", ())
    }
    fn open_safe_interface(&mut self, index: u32) -> Envelope {
        self.log.ok(format!("open_safe_interface {index}"), ())
    }
    fn close_safe_interface(&mut self) -> Envelope {
        self.log.ok("close_safe_interface", ())
    }
    fn read_safe_config(&mut self) -> Envelope {
        self.log.ok("read_safe_config", ())
    }
    fn enable_safe_connection(&mut self) -> Envelope {
        self.log.ok("enable_safe_connection", ())
    }
    fn disable_safe_connection(&mut self) -> Envelope {
        self.log.ok("disable_safe_connection", ())
    }
    fn refresh_safe_io(&mut self) -> Envelope {
        self.log.ok("refresh_safe_io", ())
    }
    fn start_safe_produce(&mut self, index: u32) -> Envelope {
        self.log.ok(format!("start_safe_produce {index}"), ())
    }
    fn start_safe_consume(&mut self, index: u32) -> Envelope {
        self.log.ok(format!("start_safe_consume {index}"), ())
    }
    fn read_safe_io(&mut self) -> Envelope<IoImage> {
        self.log.ok("read_safe_io", IoImage::default())
    }
    fn write_safe_produced_io(&mut self, data: &[u8]) -> Envelope {
        self.log.ok(format!("write_safe_produced_io {data:?}"), ())
    }
    fn safe_io_status(&mut self, index: u32) -> Envelope<IoStatus> {
        self.log.ok(format!("safe_io_status {index}"), IoStatus::default())
    }
    fn change_ncs(&mut self, value: u32) -> Envelope {
        self.log.ok(format!("change_ncs {value}"), ())
    }
    fn ncs(&mut self) -> Envelope<Ncs> {
        self.log.ok("ncs", Ncs::default())
    }
    fn safe_produce_duty(&self) -> Duration {
        Duration::ZERO
    }
    fn safe_consume_duty(&self) -> Duration {
        Duration::ZERO
    }
    fn config_notify(&mut self, register: bool) -> Envelope {
        self.log.ok(format!("config_notify {register}"), ())
    }
    fn config_lock(&mut self, lock: bool) -> Envelope {
        self.log.ok(format!("config_lock {lock}"), ())
    }
    fn config_mode(&mut self) -> Envelope {
        self.log.ok("config_mode", ())
    }
    fn config_reset(&mut self) -> Envelope {
        self.log.ok("config_reset", ())
    }
    fn write_block(&mut self, block: Block, _: &Path) -> Envelope {
        self.log.ok(format!("write_block {}", block.id()), ())
    }
    fn config_validate(&mut self) -> Envelope {
        self.log.ok("config_validate", ())
    }
    fn config_apply(&mut self) -> Envelope {
        self.log.ok("config_apply", ())
    }
    fn read_config_id(&mut self) -> Envelope<u32> {
        self.log.ok("read_config_id", 0)
    }
}

struct LabPlc {
    log: Log,
    tags: HashMap<String, i64>,
}

impl Plc for LabPlc {
    fn read(&mut self, tag: &str) -> Envelope<i64> {
        let value = self.tags.get(tag).copied().unwrap_or_default();
        self.log.ok(format!("plc_read {tag}"), value)
    }

    fn write(&mut self, tag: &str, value: i64) -> Envelope {
        _ = self.tags.insert(tag.to_owned(), value);
        self.log.ok(format!("plc_write {tag} {value}"), ())
    }

    fn close(&mut self) -> Envelope {
        self.log.ok("plc_close", ())
    }
}

struct LabSerial {
    log: Log,
    device: String,
    lines: Vec<String>,
}

impl SerialPort for LabSerial {
    fn find(&mut self, text: &str, _: std::time::Duration) -> Envelope<bool> {
        let found = self.lines.iter().any(|l| l.contains(text));
        self.log.ok(format!("serial_find {} {text}", self.device), found)
    }

    fn write(&mut self, text: &str) -> Envelope {
        self.log.ok(format!("serial_write {} {text:?}", self.device), ())
    }

    fn read(&mut self) -> Envelope<String> {
        let last = self.lines.last().cloned().unwrap_or_default();
        self.log.ok(format!("serial_read {}", self.device), last)
    }

    fn read_all(&mut self) -> Envelope<Vec<String>> {
        self.log.ok(format!("serial_read_all {}", self.device), self.lines.clone())
    }

    fn clear(&mut self) -> Envelope {
        self.lines.clear();
        self.log.ok(format!("serial_clear {}", self.device), ())
    }

    fn stop(&mut self) -> Envelope {
        self.log.ok(format!("serial_stop {}", self.device), ())
    }
}

struct LabNumato {
    log: Log,
    states: [bool; NUMATO_RELAYS],
}

impl NumatoRelay for LabNumato {
    fn version(&mut self) -> Envelope<String> {
        self.log.ok("numato_version", "00000008".to_owned())
    }

    fn reset(&mut self) -> Envelope {
        self.states = [false; NUMATO_RELAYS];
        self.log.ok("numato_reset", ())
    }

    fn read(&mut self, index: u8) -> Envelope<bool> {
        let state = self.states[usize::from(index)];
        self.log.ok(format!("numato_read {index}"), state)
    }

    fn read_all(&mut self) -> Envelope<[bool; NUMATO_RELAYS]> {
        self.log.ok("numato_read_all", self.states)
    }

    fn on(&mut self, index: u8) -> Envelope {
        self.states[usize::from(index)] = true;
        self.log.ok(format!("numato_on {index}"), ())
    }

    fn off(&mut self, index: u8) -> Envelope {
        self.states[usize::from(index)] = false;
        self.log.ok(format!("numato_off {index}"), ())
    }

    fn write_all(&mut self, states: [bool; NUMATO_RELAYS]) -> Envelope {
        self.states = states;
        self.log.ok("numato_write_all", ())
    }
}

struct LabGpio(Log);

impl Gpio for LabGpio {
    fn init(&mut self, pin: u32, direction: Direction) -> Envelope {
        self.0.ok(format!("gpio_init {pin} {direction:?}"), ())
    }

    fn read(&mut self, pin: u32) -> Envelope<bool> {
        self.0.ok(format!("gpio_read {pin}"), true)
    }

    fn write(&mut self, pin: u32, high: bool) -> Envelope {
        self.0.ok(format!("gpio_write {pin} {high}"), ())
    }

    fn close(&mut self, pin: u32) -> Envelope {
        self.0.ok(format!("gpio_close {pin}"), ())
    }
}

struct Lab(Log);

impl Connector for Lab {
    fn card(&self) -> Result<Box<dyn Card>, ConnectError> {
        Ok(Box::new(LabCard { log: self.0.clone(), produced: vec![0; 4] }))
    }

    fn gpio(&self) -> Result<Box<dyn Gpio>, ConnectError> {
        Ok(Box::new(LabGpio(self.0.clone())))
    }

    fn numato_relay(
        &self,
        _: &str,
    ) -> Result<Box<dyn NumatoRelay>, ConnectError> {
        Ok(Box::new(LabNumato {
            log: self.0.clone(),
            states: [false; NUMATO_RELAYS],
        }))
    }

    fn plc(&self) -> Result<Box<dyn Plc>, ConnectError> {
        Ok(Box::new(LabPlc { log: self.0.clone(), tags: HashMap::new() }))
    }

    fn serial_port(
        &self,
        device: &Path,
    ) -> Result<Box<dyn SerialPort>, ConnectError> {
        Ok(Box::new(LabSerial {
            log: self.0.clone(),
            device: device.display().to_string(),
            lines: vec![
                "Hit any key to stop autoboot:  3".to_owned(),
                "SSR agent is ready...".to_owned(),
            ],
        }))
    }
}

struct LabBroker(Log);

impl Broker for LabBroker {
    fn reserve(
        &self,
        node: &str,
        tool: &str,
        vlan_id: u32,
    ) -> Result<Envelope<Value>, BrokerError> {
        Ok(self.0.ok(format!("reserve {node} {tool} {vlan_id}"), Value::Null))
    }

    fn unreserve(
        &self,
        node: &str,
        tool: &str,
    ) -> Result<Envelope<Value>, BrokerError> {
        Ok(self.0.ok(format!("unreserve {node} {tool}"), Value::Null))
    }

    fn lookup(
        &self,
        standard: &str,
        _: Option<&str>,
    ) -> Result<Envelope<Option<Lookup>>, BrokerError> {
        Ok(self.0.ok(format!("lookup {standard}"), None))
    }

    fn config_crc(
        &self,
        filename: &str,
    ) -> Result<Envelope<Option<ConfigCrc>>, BrokerError> {
        Ok(self.0.ok(format!("config_crc {filename}"), None))
    }

    fn relay_info(
        &self,
        automation_index: &str,
    ) -> Result<Envelope<Option<RelayInfo>>, BrokerError> {
        Ok(self.0.ok(format!("relay_info {automation_index}"), None))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let log = Log::default();
    let opts = RigOpts {
        node_name: Some("node-7".into()),
        vlan_id: Some(30),
        ss1: Some("ttyRIG0".into()),
        ss2: Some("ttyRIG1".into()),
        ss3: Some("ttyRIG2".into()),
        ..RigOpts::default()
    };

    let summary = Rig::new(Lab(log.clone()))
        .with_broker(LabBroker(log.clone()))
        .with_opts(opts)
        .run("tests/features")
        .await;

    assert_eq!(summary.failed_steps, 1, "{summary}");
    assert_eq!(summary.skipped_steps, 0, "{summary}");
    assert_eq!(summary.parsing_errors, 0, "{summary}");
    assert_eq!(summary.hook_errors, 0, "{summary}");
    assert_eq!(summary.passed_steps, 29, "{summary}");

    // Closed by the scenario teardown, the safety layer first.
    assert!(log.contains("gpio_close 17"));
    assert_eq!(
        log.only(&[
            "disable_safe_connection",
            "close_safe_interface",
            "safe_exit",
            "stop_protocol",
            "close_interface",
            "exit",
        ]),
        [
            "disable_safe_connection",
            "close_safe_interface",
            "safe_exit",
            "stop_protocol",
            "close_interface",
            "exit",
        ],
    );
    assert!(log.contains("write_produced_io [5, 0, 0, 0]"));

    // Released once the run finishes.
    assert!(log.contains("unreserve node-7 eip1"));
    for dev in ["/dev/ttyRIG0", "/dev/ttyRIG1", "/dev/ttyRIG2"] {
        assert!(log.contains(&format!("serial_stop {dev}")), "{dev}");
    }

    assert!(log.contains(r#"serial_write /dev/ttyRIG0 "\r\n""#));
    assert!(log.contains("plc_write Speed 1500"));
    assert!(log.contains("numato_on 3"));
}
