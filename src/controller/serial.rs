// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Serial consoles of devices under test.

use std::{str::FromStr, time::Duration};

use derive_more::with_trait::Display;

use crate::Envelope;

/// Serial console slot of a rig.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Console {
    #[display("SS1")]
    Ss1,
    #[display("SS2")]
    Ss2,
    #[display("SS3")]
    Ss3,
}

impl Console {
    /// Every slot, in order.
    pub const ALL: [Self; 3] = [Self::Ss1, Self::Ss2, Self::Ss3];
}

impl FromStr for Console {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SS1" => Ok(Self::Ss1),
            "SS2" => Ok(Self::Ss2),
            "SS3" => Ok(Self::Ss3),
            _ => Err("expected `SS1`, `SS2` or `SS3`"),
        }
    }
}

/// Open serial port, buffering everything received since the last clear.
pub trait SerialPort {
    /// Waits up to `timeout` for the `text` to be received.
    fn find(&mut self, text: &str, timeout: Duration) -> Envelope<bool>;

    fn write(&mut self, text: &str) -> Envelope;

    /// Returns the last received line.
    fn read(&mut self) -> Envelope<String>;

    /// Returns every received line.
    fn read_all(&mut self) -> Envelope<Vec<String>>;

    /// Drops everything received so far.
    fn clear(&mut self) -> Envelope;

    /// Stops the reader and closes the port.
    fn stop(&mut self) -> Envelope;
}
