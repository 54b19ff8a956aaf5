// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Programmable logic controller reached through its tag interface.

use crate::Envelope;

/// PLC session.
pub trait Plc {
    /// Reads the integer value of a `tag`.
    fn read(&mut self, tag: &str) -> Envelope<i64>;

    /// Writes an integer `value` into a `tag`.
    fn write(&mut self, tag: &str, value: i64) -> Envelope;

    fn close(&mut self) -> Envelope;
}
