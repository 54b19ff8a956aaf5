// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Packet capture on a rig network interface.

use std::{net::Ipv4Addr, path::Path, time::SystemTime};

use crate::Envelope;

/// File every capture is written into, until rotated at the end of a
/// scenario.
pub const CAPTURE_FILE: &str = "wireshark.cap";

/// Running or finished packet capture.
pub trait Capture {
    fn stop(&mut self) -> Envelope;

    /// Dissects the capture `file` into JSON.
    fn export_json(&mut self, file: &Path) -> Envelope;

    /// Counts ARP requests from `src` for `dst` captured since `since`.
    fn arp_count(
        &mut self,
        src: Ipv4Addr,
        dst: Ipv4Addr,
        since: SystemTime,
    ) -> Envelope<u32>;
}
