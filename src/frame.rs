// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Fixed-layout request frames sent to a card with `Send message` steps.
//!
//! A [`Request`] is a zeroed buffer of [`FRAME_LEN`] bytes with fields
//! written as little-endian integers or raw bytes at constant offsets.

use std::{fmt, net::Ipv4Addr};

use derive_more::with_trait::Display;
use itertools::Itertools as _;

use crate::{
    args::MacAddr,
    error::{Result, StepError},
};

/// Length of every request buffer.
pub const FRAME_LEN: usize = 1024;

/// Data length declared by requests carrying no fields.
pub const EMPTY_DATA_LEN: u8 = 254;

/// Names must be strictly shorter than this.
pub const NAME_CAPACITY: usize = 240;

/// Explicit write data starts at this offset.
const EXPLICIT_DATA: usize = 20;

/// Service identifier of a request.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[display("{_0}")]
pub struct Service(pub u32);

impl Service {
    /// Asks the device to identify itself.
    pub const IDENTIFY: Self = Self(10);

    /// Asks whether the device has been detected.
    pub const GET_DEVICE_DETECTED: Self = Self(11);

    /// Blinks the device LEDs.
    pub const BLINK: Self = Self(20);

    /// Resets the device to factory settings.
    pub const FACTORY_RESET: Self = Self(21);

    /// Sets the station name.
    pub const SET_NAME: Self = Self(22);

    /// Sets the IP configuration.
    pub const SET_IP: Self = Self(23);

    /// Reads or writes an explicit record.
    pub const EXPLICIT: Self = Self(32);
}

/// Field offsets within a [`Request`].
mod offset {
    pub(super) const MAC: usize = 0;

    pub(super) const REMANENT: usize = 0;
    pub(super) const NAME_LEN: usize = 4;
    pub(super) const NAME: usize = 8;
    pub(super) const NAME_MAC: usize = 248;

    pub(super) const IP_MODE: usize = 4;
    pub(super) const IP: usize = 8;
    pub(super) const MASK: usize = 12;
    pub(super) const GATEWAY: usize = 16;
    pub(super) const IP_MAC: usize = 20;

    pub(super) const CONFIG_ID: usize = 0;
    pub(super) const CRC32: usize = 4;
    pub(super) const DEVICE: usize = 8;
    pub(super) const API: usize = 10;
    pub(super) const SLOT: usize = 14;
    pub(super) const SUBSLOT: usize = 16;
    pub(super) const INDEX: usize = 18;
    pub(super) const READ_LEN: usize = 20;
}

/// Parses the declared data length of a request, which must be below `255`.
///
/// # Errors
///
/// If `raw` isn't an integer below `255`.
pub fn data_length(raw: &str) -> Result<u8> {
    let len = crate::args::int::<u32>("data length", raw)?;
    u8::try_from(len)
        .ok()
        .filter(|l| *l < u8::MAX)
        .ok_or_else(|| StepError::argument("data length", raw, "must be < 255"))
}

/// Address of an explicit record on a device.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ExplicitAddress {
    /// Configuration identifier.
    pub config_id: u32,

    /// CRC32 of the configuration.
    pub crc32: u32,

    /// Device number.
    pub device: u16,

    /// Application process identifier.
    pub api: u32,

    /// Slot number.
    pub slot: u16,

    /// Subslot number.
    pub subslot: u16,

    /// Record index.
    pub index: u16,
}

/// Request frame ready to be sent.
#[derive(Clone, Eq, PartialEq)]
pub struct Request {
    service: Service,
    data_length: u8,
    buf: Box<[u8; FRAME_LEN]>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("service", &self.service)
            .field("data_length", &self.data_length)
            .finish_non_exhaustive()
    }
}

impl Request {
    fn new(service: Service, data_length: u8) -> Self {
        Self { service, data_length, buf: Box::new([0; FRAME_LEN]) }
    }

    fn put(&mut self, at: usize, bytes: &[u8]) {
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
    }

    fn put_u16(&mut self, at: usize, val: u16) {
        self.put(at, &val.to_le_bytes());
    }

    fn put_u32(&mut self, at: usize, val: u32) {
        self.put(at, &val.to_le_bytes());
    }

    fn put_address(&mut self, addr: &ExplicitAddress) {
        self.put_u32(offset::CONFIG_ID, addr.config_id);
        self.put_u32(offset::CRC32, addr.crc32);
        self.put_u16(offset::DEVICE, addr.device);
        self.put_u32(offset::API, addr.api);
        self.put_u16(offset::SLOT, addr.slot);
        self.put_u16(offset::SUBSLOT, addr.subslot);
        self.put_u16(offset::INDEX, addr.index);
    }

    /// Creates an `Identify` request.
    #[must_use]
    pub fn identify() -> Self {
        Self::new(Service::IDENTIFY, EMPTY_DATA_LEN)
    }

    /// Creates a `Get device detected` request.
    #[must_use]
    pub fn device_detected() -> Self {
        Self::new(Service::GET_DEVICE_DETECTED, EMPTY_DATA_LEN)
    }

    /// Creates a `Blink` request for the device with the given `mac`.
    #[must_use]
    pub fn blink(mac: MacAddr, data_length: u8) -> Self {
        let mut req = Self::new(Service::BLINK, data_length);
        req.put(offset::MAC, &mac.octets());
        req
    }

    /// Creates a `Factory reset` request for the device with the given `mac`.
    #[must_use]
    pub fn factory_reset(mac: MacAddr, data_length: u8) -> Self {
        let mut req = Self::new(Service::FACTORY_RESET, data_length);
        req.put(offset::MAC, &mac.octets());
        req
    }

    /// Creates a `Set name` request.
    ///
    /// # Errors
    ///
    /// If `name` doesn't fit [`NAME_CAPACITY`], or its length differs from
    /// the declared `name_length`.
    pub fn set_name(
        remanent: u32,
        name_length: u32,
        name: &str,
        mac: MacAddr,
        data_length: u8,
    ) -> Result<Self> {
        if name.len() >= NAME_CAPACITY {
            return Err(StepError::argument(
                "name",
                name,
                format!("must be shorter than {NAME_CAPACITY} bytes"),
            ));
        }
        if usize::try_from(name_length).ok() != Some(name.len()) {
            return Err(StepError::argument(
                "name length",
                name_length.to_string(),
                format!("`{name}` is {} bytes long", name.len()),
            ));
        }

        let mut req = Self::new(Service::SET_NAME, data_length);
        req.put_u32(offset::REMANENT, remanent);
        req.put_u32(offset::NAME_LEN, name_length);
        req.put(offset::NAME, name.as_bytes());
        req.put(offset::NAME_MAC, &mac.octets());
        Ok(req)
    }

    /// Creates a `Set IP` request.
    #[must_use]
    pub fn set_ip(
        remanent: u32,
        ip_mode: u32,
        ip: Ipv4Addr,
        mask: Ipv4Addr,
        gateway: Ipv4Addr,
        mac: MacAddr,
        data_length: u8,
    ) -> Self {
        let mut req = Self::new(Service::SET_IP, data_length);
        req.put_u32(offset::REMANENT, remanent);
        req.put_u32(offset::IP_MODE, ip_mode);
        req.put(offset::IP, &ip.octets());
        req.put(offset::MASK, &mask.octets());
        req.put(offset::GATEWAY, &gateway.octets());
        req.put(offset::IP_MAC, &mac.octets());
        req
    }

    /// Creates a request reading `length` bytes of an explicit record.
    #[must_use]
    pub fn read_explicit(
        addr: &ExplicitAddress,
        length: u16,
        data_length: u8,
    ) -> Self {
        let mut req = Self::new(Service::EXPLICIT, data_length);
        req.put_address(addr);
        req.put_u16(offset::READ_LEN, length);
        req
    }

    /// Creates a request writing `data` into an explicit record.
    ///
    /// # Errors
    ///
    /// If `data` doesn't fit the frame.
    pub fn write_explicit(
        addr: &ExplicitAddress,
        data: &[u8],
        data_length: u8,
    ) -> Result<Self> {
        if data.len() > FRAME_LEN - EXPLICIT_DATA {
            return Err(StepError::argument(
                "data",
                format!("{} bytes", data.len()),
                format!("at most {} bytes fit", FRAME_LEN - EXPLICIT_DATA),
            ));
        }

        let mut req = Self::new(Service::EXPLICIT, data_length);
        req.put_address(addr);
        req.put(EXPLICIT_DATA, data);
        Ok(req)
    }

    /// Returns the [`Service`] of this request.
    #[must_use]
    pub const fn service(&self) -> Service {
        self.service
    }

    /// Returns the declared data length of this request.
    #[must_use]
    pub const fn data_length(&self) -> u8 {
        self.data_length
    }

    /// Returns the whole buffer of this request.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_slice()
    }

    /// Returns the bytes covered by the declared data length.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.buf[..usize::from(self.data_length)]
    }
}

/// Reply of a card to a [`Request`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reply {
    /// Status of the request, `0` on success.
    pub status: u32,

    /// Service this reply belongs to.
    pub service: u32,

    /// Size of the reply data.
    pub size: u32,

    /// Reply data.
    pub data: Vec<u8>,
}

/// [`Display`]s bytes in rows of four, each prefixed with its offset.
///
/// [`Display`]: fmt::Display
#[derive(Clone, Copy, Debug)]
pub struct HexDump<'b>(pub &'b [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.0.chunks(4).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            write!(f, "{:04X}: {:02X}", row * 4, chunk.iter().format(" "))?;
        }
        Ok(())
    }
}
