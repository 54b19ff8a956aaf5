// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! State shared by every [scenario] of a run.
//!
//! [scenario]: https://cucumber.io/docs/gherkin/reference#example

use std::{
    cell::{Ref, RefCell, RefMut},
    collections::HashMap,
    fmt, fs, mem,
    path::{Path, PathBuf},
    rc::Rc,
};

use linked_hash_map::LinkedHashMap;
use tokio::process::Child;

use crate::{
    broker::{Broker, Lookup, RelayInfo},
    config::RigOpts,
    connector::Connector,
    controller::{
        capture::CAPTURE_FILE, opcua::Node, serial::Console, Browser, Ftp,
        NabAgent, NumatoRelay, OpcUaClient, Plc, SerialPort, WebRelay,
    },
    error::{Result, StepError},
};

/// Web relay board together with the relays of it wired to the rig.
pub struct RelayBoard {
    /// Address of the board.
    pub address: String,

    /// Relay numbers wired to the rig.
    pub relays: Vec<u8>,

    pub(crate) controller: Box<dyn WebRelay>,
}

/// Groups the relay wiring by board, keeping boards in order of their
/// first appearance.
///
/// # Errors
///
/// If the wiring table is empty.
pub fn group_relays(info: &RelayInfo) -> Result<Vec<(String, Vec<u8>)>> {
    if info.addresses.is_empty() {
        return Err(StepError::Precondition(
            "relay wiring lists no boards".into(),
        ));
    }
    if info.indices.is_empty() {
        return Err(StepError::Precondition(
            "relay wiring lists no relays".into(),
        ));
    }

    let mut boards = LinkedHashMap::<&str, Vec<u8>>::new();
    for (address, index) in info.addresses.iter().zip(&info.indices) {
        boards.entry(address.as_str()).or_insert_with(Vec::new).push(*index);
    }
    Ok(boards.into_iter().map(|(a, r)| (a.to_owned(), r)).collect())
}

/// State shared by every scenario of a run.
pub struct SuiteState {
    pub(crate) connector: Box<dyn Connector>,
    pub(crate) broker: Box<dyn Broker>,
    pub(crate) opts: RigOpts,

    pub(crate) ftp: Option<Box<dyn Ftp>>,
    pub(crate) consoles: LinkedHashMap<Console, Box<dyn SerialPort>>,
    pub(crate) nab: Option<Box<dyn NabAgent>>,
    pub(crate) plc: Option<Box<dyn Plc>>,
    pub(crate) opcua: Option<Box<dyn OpcUaClient>>,
    pub(crate) nodes: HashMap<String, Node>,
    pub(crate) browser: Option<Box<dyn Browser>>,
    pub(crate) numato: LinkedHashMap<String, Box<dyn NumatoRelay>>,
    pub(crate) web_relays: Option<Vec<RelayBoard>>,

    pub(crate) reserved: Vec<String>,
    pub(crate) lookup: Option<Lookup>,
    pub(crate) config_file: Option<PathBuf>,
    pub(crate) config_crc: Option<String>,
    pub(crate) subsystems: LinkedHashMap<String, Child>,

    /// Number of rotated capture files.
    pub(crate) captures: u32,

    /// Whether the device under test reported readiness after a hard reset.
    pub(crate) hard_reset: bool,
}

macro_rules! connected {
    ($($(#[$attr:meta])* $name:ident: $ty:ty => $what:literal),* $(,)?) => {$(
        $(#[$attr])*
        pub(crate) fn $name(&mut self) -> Result<&mut Box<$ty>> {
            self.$name.as_mut().ok_or(StepError::NotConnected($what))
        }
    )*};
}

impl SuiteState {
    connected! {
        ftp: dyn Ftp => "FTP client",
        nab: dyn NabAgent => "NAB agent",
        plc: dyn Plc => "PLC",
        opcua: dyn OpcUaClient => "OPC UA client",
        browser: dyn Browser => "browser",
    }

    /// Returns the [`RigOpts`] of this run.
    #[must_use]
    pub const fn opts(&self) -> &RigOpts {
        &self.opts
    }

    /// Returns tools reserved by this run and not released yet.
    #[must_use]
    pub fn reserved(&self) -> &[String] {
        &self.reserved
    }

    /// Returns the configuration file loaded by `Load config`.
    #[must_use]
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Returns the CRC of the configuration looked up by `Get config crc`.
    #[must_use]
    pub fn config_crc(&self) -> Option<&str> {
        self.config_crc.as_deref()
    }

    /// Returns the tool found by `Lookup protocol`.
    #[must_use]
    pub const fn lookup(&self) -> Option<&Lookup> {
        self.lookup.as_ref()
    }

    /// Indicates whether the device under test came up after a hard reset.
    #[must_use]
    pub const fn hard_reset(&self) -> bool {
        self.hard_reset
    }

    pub(crate) fn console(
        &mut self,
        console: Console,
    ) -> Result<&mut Box<dyn SerialPort>> {
        self.consoles
            .get_mut(&console)
            .ok_or_else(|| StepError::Precondition(format!("{console} is not open")))
    }

    pub(crate) fn numato(
        &mut self,
        name: &str,
    ) -> Result<&mut Box<dyn NumatoRelay>> {
        self.numato.get_mut(name).ok_or_else(|| {
            StepError::Precondition(format!("Numato relay `{name}` is not connected"))
        })
    }

    pub(crate) fn node(&self, key: &str) -> Result<&Node> {
        self.nodes
            .get(key)
            .ok_or_else(|| StepError::missing(&format!("node `{key}`"), "Get node"))
    }

    /// Returns the web relay boards of this rig, looking them up on the
    /// first call.
    pub(crate) fn web_relays(&mut self) -> Result<&mut Vec<RelayBoard>> {
        if self.web_relays.is_none() {
            let index = self.opts.automation_index()?;
            let info = self
                .broker
                .relay_info(index)?
                .check("Lookup relay info")?
                .ok_or(StepError::Empty("Lookup relay info"))?;
            let boards = group_relays(&info)?
                .into_iter()
                .map(|(address, relays)| {
                    let controller = self.connector.web_relay(&address)?;
                    Ok(RelayBoard { address, relays, controller })
                })
                .collect::<Result<Vec<_>>>()?;
            tracing::info!(
                "web relays: {}",
                boards
                    .iter()
                    .map(|b| format!("{} {:?}", b.address, b.relays))
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            self.web_relays = Some(boards);
        }
        self.web_relays
            .as_mut()
            .ok_or(StepError::NotConnected("web relays"))
    }

    /// Releases the reserved `tool`.
    pub(crate) fn unreserve(&mut self, tool: &str) -> Result<()> {
        let node = self.opts.node_name()?;
        self.broker.unreserve(node, tool)?.check("Unreserve")?;
        self.reserved.retain(|t| t != tool);
        Ok(())
    }

    /// Renames [`CAPTURE_FILE`] to a numbered one, so the next capture
    /// doesn't overwrite it.
    pub(crate) fn rotate_capture(&mut self) -> Result<()> {
        let file = Path::new(CAPTURE_FILE);
        if file.exists() {
            let rotated = format!("wireshark_{}.cap", self.captures);
            fs::rename(file, &rotated)?;
            tracing::info!("capture saved as {rotated}");
            self.captures += 1;
        }
        Ok(())
    }
}

/// Handle to the [`SuiteState`].
///
/// Scenarios run one at a time, so the state is shared without locking.
#[derive(Clone)]
pub struct Suite(Rc<RefCell<SuiteState>>);

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(s) = self.0.try_borrow() else {
            return f.write_str("Suite(<borrowed>)");
        };
        f.debug_struct("Suite")
            .field("consoles", &s.consoles.keys().collect::<Vec<_>>())
            .field("numato", &s.numato.keys().collect::<Vec<_>>())
            .field("reserved", &s.reserved)
            .field("config_file", &s.config_file)
            .field("config_crc", &s.config_crc)
            .field("subsystems", &s.subsystems.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Suite {
    /// Creates a new [`Suite`].
    #[must_use]
    pub fn new(
        connector: Box<dyn Connector>,
        broker: Box<dyn Broker>,
        opts: RigOpts,
    ) -> Self {
        Self(Rc::new(RefCell::new(SuiteState {
            connector,
            broker,
            opts,
            ftp: None,
            consoles: LinkedHashMap::new(),
            nab: None,
            plc: None,
            opcua: None,
            nodes: HashMap::new(),
            browser: None,
            numato: LinkedHashMap::new(),
            web_relays: None,
            reserved: Vec::new(),
            lookup: None,
            config_file: None,
            config_crc: None,
            subsystems: LinkedHashMap::new(),
            captures: 0,
            hard_reset: false,
        })))
    }

    /// Immutably borrows the [`SuiteState`].
    ///
    /// # Panics
    ///
    /// If it's mutably borrowed already.
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, SuiteState> {
        self.0.borrow()
    }

    /// Mutably borrows the [`SuiteState`].
    ///
    /// # Panics
    ///
    /// If it's borrowed already.
    #[must_use]
    pub fn borrow_mut(&self) -> RefMut<'_, SuiteState> {
        self.0.borrow_mut()
    }

    /// Opens every configured serial console. Failures are logged, and the
    /// console stays closed.
    pub fn open_consoles(&self) {
        let mut s = self.borrow_mut();
        for console in Console::ALL {
            let device = match console {
                Console::Ss1 => s.opts.ss1.clone(),
                Console::Ss2 => s.opts.ss2.clone(),
                Console::Ss3 => s.opts.ss3.clone(),
            };
            let Some(device) = device else {
                continue;
            };
            let path = Path::new("/dev").join(device);
            match s.connector.serial_port(&path) {
                Ok(port) => {
                    tracing::info!("{console} opened on {}", path.display());
                    _ = s.consoles.insert(console, port);
                }
                Err(e) => tracing::warn!("{console}: {e}"),
            }
        }
    }

    /// Releases everything the run still holds: reserved tools, serial
    /// consoles, helper subsystems and the browser.
    ///
    /// Failures are logged and don't stop the remaining releases.
    pub async fn finish(&self) {
        let tools = self.borrow().reserved.clone();
        for tool in tools {
            if let Err(e) = self.borrow_mut().unreserve(&tool) {
                tracing::warn!("failed to unreserve `{tool}`: {e}");
            }
        }

        let consoles = mem::take(&mut self.borrow_mut().consoles);
        for (console, mut port) in consoles {
            if let Err(e) = port.stop().check("Stop serial port") {
                tracing::warn!("failed to stop {console}: {e}");
            }
        }

        if let Some(mut browser) = self.borrow_mut().browser.take() {
            if let Err(e) = browser.quit().check("Quit browser") {
                tracing::warn!("failed to quit browser: {e}");
            }
        }

        let subsystems = mem::take(&mut self.borrow_mut().subsystems);
        for (name, mut child) in subsystems {
            if let Err(e) = child.kill().await {
                tracing::warn!("failed to stop subsystem `{name}`: {e}");
            }
        }
    }
}
