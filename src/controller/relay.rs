// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Relay boards switching power and signals of devices under test.

use crate::Envelope;

/// Number of relays on a Numato board.
pub const NUMATO_RELAYS: usize = 16;

/// Number of relays on a web relay board.
pub const WEB_RELAYS: usize = 8;

/// Numato relay board controlled over Ethernet.
pub trait NumatoRelay {
    fn version(&mut self) -> Envelope<String>;
    fn reset(&mut self) -> Envelope;

    /// Reads the state of the relay at `index`, `true` being closed.
    fn read(&mut self, index: u8) -> Envelope<bool>;

    fn read_all(&mut self) -> Envelope<[bool; NUMATO_RELAYS]>;
    fn on(&mut self, index: u8) -> Envelope;
    fn off(&mut self, index: u8) -> Envelope;
    fn write_all(&mut self, states: [bool; NUMATO_RELAYS]) -> Envelope;
}

/// Web relay board controlled over HTTP.
///
/// Relays are numbered from `1`.
pub trait WebRelay {
    /// Sets every relay at once.
    fn set_all(&mut self, states: [bool; WEB_RELAYS]) -> Envelope;

    /// Returns relay states, the state of relay `n` at position `n - 1`.
    fn status(&mut self) -> Envelope<Vec<bool>>;

    fn on(&mut self, relay: u8) -> Envelope;
    fn off(&mut self, relay: u8) -> Envelope;
}
