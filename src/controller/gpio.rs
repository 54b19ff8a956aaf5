// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Sysfs GPIO pins of the rig host.

use std::str::FromStr;

use crate::Envelope;

/// Direction of a GPIO pin.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Pin is read.
    In,

    /// Pin is driven.
    Out,
}

impl FromStr for Direction {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "out" => Ok(Self::Out),
            _ => Err("expected `in` or `out`"),
        }
    }
}

/// GPIO pins exported through sysfs.
pub trait Gpio {
    /// Exports the `pin` and sets its direction.
    fn init(&mut self, pin: u32, direction: Direction) -> Envelope;

    /// Reads the level of the `pin`, `true` being high.
    fn read(&mut self, pin: u32) -> Envelope<bool>;

    /// Drives the `pin` high or low.
    fn write(&mut self, pin: u32, high: bool) -> Envelope;

    /// Unexports the `pin`.
    fn close(&mut self, pin: u32) -> Envelope;
}
