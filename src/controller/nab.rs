// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Network agent of a device under test, reached through a message
//! exchange.

use crate::Envelope;

/// Request message of a [`NabAgent`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub command: u32,
    pub instance: u32,
    pub version: u32,
    pub data: Vec<u8>,
}

/// Header of a [`NabAgent`] reply.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Header {
    pub command: u32,
    pub message_id: u32,
    pub instance: u32,
    pub size: u32,
    pub version: u32,
}

/// Reply of a [`NabAgent`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reply {
    pub header: Header,

    /// Result code reported by the device itself.
    pub result: i32,

    pub data: Vec<u8>,
}

/// Network agent of a device under test.
pub trait NabAgent {
    /// Sends the `message` and awaits its reply.
    fn exchange(&mut self, message: &Message) -> Envelope<Reply>;

    /// Closes the connection.
    fn disconnect(&mut self) -> Envelope;
}
