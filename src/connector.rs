// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Factory of controllers.

use std::path::Path;

use derive_more::with_trait::{Display, Error};

use crate::controller::{
    browser::BrowserKind, Browser, Capture, Card, ConformanceTool, Ftp, Gpio,
    NabAgent, NumatoRelay, OpcUaClient, Plc, SerialPort, TrafficGenerator,
    WebRelay,
};

/// Error of creating a controller.
#[derive(Clone, Debug, Display, Error)]
#[display("cannot connect {what}: {reason}")]
pub struct ConnectError {
    /// Kind of the controller.
    pub what: &'static str,

    /// Why it can't be created.
    #[error(not(source))]
    pub reason: String,
}

impl ConnectError {
    /// Creates a new [`ConnectError`].
    #[must_use]
    pub fn new(what: &'static str, reason: impl Into<String>) -> Self {
        Self { what, reason: reason.into() }
    }

    /// Creates a [`ConnectError`] for a controller this rig has no driver
    /// for.
    #[must_use]
    pub fn unsupported(what: &'static str) -> Self {
        Self::new(what, "no driver is available on this rig")
    }
}

/// Creates controllers for the external systems a rig has.
///
/// Every method defaults to [`ConnectError::unsupported()`], so an
/// implementor provides drivers only for the systems it actually has.
/// Creating a controller shouldn't talk to its system yet, as steps perform
/// the connection themselves.
#[expect(unused_variables, reason = "default implementations")]
pub trait Connector {
    /// Creates a CAPI card controller.
    ///
    /// # Errors
    ///
    /// If the card can't be reached.
    fn card(&self) -> Result<Box<dyn Card>, ConnectError> {
        Err(ConnectError::unsupported("CAPI card"))
    }

    /// Creates an FTP client.
    ///
    /// # Errors
    ///
    /// If no FTP client is available.
    fn ftp(&self) -> Result<Box<dyn Ftp>, ConnectError> {
        Err(ConnectError::unsupported("FTP client"))
    }

    /// Creates a GPIO controller.
    ///
    /// # Errors
    ///
    /// If there is no sysfs GPIO.
    fn gpio(&self) -> Result<Box<dyn Gpio>, ConnectError> {
        Err(ConnectError::unsupported("GPIO"))
    }

    /// Creates a traffic generator client.
    ///
    /// # Errors
    ///
    /// If no traffic generator is available.
    fn traffic_generator(
        &self,
    ) -> Result<Box<dyn TrafficGenerator>, ConnectError> {
        Err(ConnectError::unsupported("traffic generator"))
    }

    /// Connects to the network agent of a device under test.
    ///
    /// # Errors
    ///
    /// If the agent can't be reached.
    fn nab_agent(&self) -> Result<Box<dyn NabAgent>, ConnectError> {
        Err(ConnectError::unsupported("NAB agent"))
    }

    /// Creates a client of the Numato relay board at `host`.
    ///
    /// # Errors
    ///
    /// If the board can't be reached.
    fn numato_relay(
        &self,
        host: &str,
    ) -> Result<Box<dyn NumatoRelay>, ConnectError> {
        Err(ConnectError::unsupported("Numato relay"))
    }

    /// Creates a client of the web relay board at `address`.
    ///
    /// # Errors
    ///
    /// If the board can't be reached.
    fn web_relay(&self, address: &str) -> Result<Box<dyn WebRelay>, ConnectError> {
        Err(ConnectError::unsupported("web relay"))
    }

    /// Connects to the OPC UA server at `url`.
    ///
    /// # Errors
    ///
    /// If the server can't be reached.
    fn opcua(&self, url: &str) -> Result<Box<dyn OpcUaClient>, ConnectError> {
        Err(ConnectError::unsupported("OPC UA client"))
    }

    /// Connects to the PLC.
    ///
    /// # Errors
    ///
    /// If the PLC can't be reached.
    fn plc(&self) -> Result<Box<dyn Plc>, ConnectError> {
        Err(ConnectError::unsupported("PLC"))
    }

    /// Launches a browser of the given `kind`.
    ///
    /// # Errors
    ///
    /// If the browser can't be launched.
    fn browser(&self, kind: BrowserKind) -> Result<Box<dyn Browser>, ConnectError> {
        Err(ConnectError::unsupported("browser"))
    }

    /// Opens the serial `device` and starts reading it.
    ///
    /// # Errors
    ///
    /// If the device can't be opened.
    fn serial_port(&self, device: &Path) -> Result<Box<dyn SerialPort>, ConnectError> {
        Err(ConnectError::unsupported("serial port"))
    }

    /// Starts capturing packets on the network `interface` into
    /// [`CAPTURE_FILE`].
    ///
    /// # Errors
    ///
    /// If the capture can't be started.
    ///
    /// [`CAPTURE_FILE`]: crate::controller::capture::CAPTURE_FILE
    fn capture(&self, interface: &str) -> Result<Box<dyn Capture>, ConnectError> {
        Err(ConnectError::unsupported("packet capture"))
    }

    /// Creates a conformance test tool.
    ///
    /// # Errors
    ///
    /// If the tool isn't installed.
    fn conformance_tool(&self) -> Result<Box<dyn ConformanceTool>, ConnectError> {
        Err(ConnectError::unsupported("conformance tool"))
    }
}
