// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Abstractions of the external systems a rig drives.
//!
//! Every external system is a trait whose methods return an [`Envelope`].
//! Concrete drivers live outside of this crate and are handed to steps by a
//! [`Connector`].
//!
//! [`Connector`]: crate::Connector
//! [`Envelope`]: crate::Envelope

pub mod browser;
pub mod capi;
pub mod capture;
pub mod conformance;
pub mod ftp;
pub mod gpio;
pub mod nab;
pub mod opcua;
pub mod plc;
pub mod relay;
pub mod serial;
pub mod traffic;

#[doc(inline)]
pub use self::{
    browser::Browser, capi::Card, capture::Capture,
    conformance::ConformanceTool, ftp::Ftp, gpio::Gpio, nab::NabAgent,
    opcua::OpcUaClient, plc::Plc, relay::{NumatoRelay, WebRelay},
    serial::SerialPort, traffic::TrafficGenerator,
};
