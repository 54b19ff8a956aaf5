// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Cucumber step library driving lab test rigs.
//!
//! A rig connects fieldbus interface cards, relays, PLCs, serial consoles,
//! traffic generators and packet capture to a device under test. Its
//! [feature]s are written in Gherkin with the steps defined in this crate,
//! and run by a [`Rig`]:
//!
//! ```rust,no_run
//! # use cucumber_rig::{Connector, Rig};
//! #
//! struct Lab;
//!
//! impl Connector for Lab {}
//!
//! # let _ = async {
//! let summary = Rig::new(Lab).run("tests/features").await;
//! assert!(!summary.has_failed(), "{summary}");
//! # };
//! ```
//!
//! Every piece of lab hardware is reached through a [`controller`] trait,
//! and a [`Connector`] creates the controllers a rig has drivers for.
//!
//! [feature]: https://cucumber.io/docs/gherkin/reference#feature

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod args;
pub mod broker;
pub mod config;
pub mod connector;
pub mod controller;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod poll;
pub mod rig;
mod steps;
pub mod suite;
pub mod teardown;
pub mod world;

#[cfg(test)]
mod test_utils;

#[doc(inline)]
pub use self::{
    broker::{Broker, HttpBroker},
    config::RigOpts,
    connector::{ConnectError, Connector},
    envelope::Envelope,
    error::{Result, StepError},
    rig::{Rig, Summary},
    suite::Suite,
    world::{Resource, RigWorld},
};
