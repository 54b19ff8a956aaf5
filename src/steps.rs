// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Step definitions of rig [scenario]s.
//!
//! Every step is registered into the [`RigWorld`] collection by its
//! `#[given]`, `#[when]` or `#[then]` attribute, so modules here export
//! nothing.
//!
//! [`RigWorld`]: crate::RigWorld
//! [scenario]: https://cucumber.io/docs/gherkin/reference#example

mod browser;
mod capi;
mod capture;
mod conformance;
mod ftp;
mod gpio;
mod ixnetwork;
mod nab;
mod opcua;
mod plc;
mod relay;
mod serial;
mod utility;
