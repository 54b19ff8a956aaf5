// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`World`] of rig [scenario]s.
//!
//! [scenario]: https://cucumber.io/docs/gherkin/reference#example

use std::{fmt, mem, time::SystemTime};

use cucumber::World;

use crate::{
    controller::{
        capi::{CardInfo, ConnectionInfo, IoImage, IoStatus, Ncs, PingStats},
        Capture, Card, Gpio, TrafficGenerator,
    },
    error::{Result, StepError},
    suite::Suite,
    teardown::{Rank, Teardown},
};

/// Resource opened by a step, and closed by another step or by the end of
/// its scenario.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Resource {
    /// `Init`
    CardSession,

    /// `Open interface`
    Interface,

    /// `Start protocol`
    Protocol,

    /// `HB start`
    Heartbeat,

    /// `Poll start`
    Poll,

    /// `Ping open`
    Ping,

    /// `ARP register`
    ArpRegistration,

    /// `Safe init`
    SafeSession,

    /// `Open safe interface`
    SafeInterface,

    /// `Enable safe connection`
    SafeConnection,

    /// `Init GPIO`
    GpioPin(u32),

    /// `Start traffic`
    Traffic,

    /// `Wireshark start`
    Capture,
}

impl Rank for Resource {
    /// Safety layer first, then the base layer from the top down, then the
    /// resources independent of the card.
    fn rank(&self) -> u8 {
        match self {
            Self::SafeConnection => 0,
            Self::SafeInterface => 1,
            Self::SafeSession => 2,
            Self::Ping => 3,
            Self::ArpRegistration => 4,
            Self::Heartbeat => 5,
            Self::Poll => 6,
            Self::Protocol => 7,
            Self::Interface => 8,
            Self::CardSession => 9,
            Self::GpioPin(_) | Self::Traffic | Self::Capture => 10,
        }
    }
}

/// Traffic generator configuration stages reached in a scenario.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TrafficStages {
    pub connected: bool,
    pub ports: bool,
    pub topology: bool,
    pub interfaces: bool,
    pub item_created: bool,
    pub item_configured: bool,
}

/// Values read by steps of a scenario and checked by its later steps.
#[derive(Clone, Debug, Default)]
pub struct ScenarioVars {
    pub card_info: Option<CardInfo>,
    pub connections: Option<ConnectionInfo>,
    pub io: Option<IoImage>,
    pub safe_io: Option<IoImage>,
    pub io_status: Option<IoStatus>,
    pub safe_io_status: Option<IoStatus>,
    pub ncs: Option<Ncs>,
    pub ping_stats: Option<PingStats>,

    /// Last ping error number, rendered as hex.
    pub ping_error_no: Option<String>,

    /// When the last `ARP start` was issued.
    pub arp_started_at: Option<SystemTime>,

    /// Whether the device under test must be power-cycled before flashing.
    pub factory_flash_restart: bool,

    pub traffic: TrafficStages,
}

/// Per-[scenario] state: controllers, open resources and read values.
///
/// Lives for a single scenario, while the [`Suite`] it's attached to lives
/// for the whole run.
///
/// [scenario]: https://cucumber.io/docs/gherkin/reference#example
#[derive(World)]
#[world(init = Self::detached)]
pub struct RigWorld {
    suite: Option<Suite>,
    teardown: Teardown<Resource>,

    pub(crate) card: Option<Box<dyn Card>>,
    pub(crate) gpio: Option<Box<dyn Gpio>>,
    pub(crate) traffic: Option<Box<dyn TrafficGenerator>>,
    pub(crate) capture: Option<Box<dyn Capture>>,

    /// Values read by the steps of this scenario.
    pub vars: ScenarioVars,
}

impl fmt::Debug for RigWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RigWorld")
            .field("suite", &self.suite)
            .field("open", &self.teardown)
            .field("card", &self.card.is_some())
            .field("gpio", &self.gpio.is_some())
            .field("traffic", &self.traffic.is_some())
            .field("capture", &self.capture.is_some())
            .field("vars", &self.vars)
            .finish()
    }
}

macro_rules! controller {
    ($($name:ident: $ty:ty => $what:literal),* $(,)?) => {$(
        pub(crate) fn $name(&mut self) -> Result<&mut Box<$ty>> {
            self.$name.as_mut().ok_or(StepError::NotConnected($what))
        }
    )*};
}

impl RigWorld {
    /// Creates a [`RigWorld`] not attached to any [`Suite`] yet.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            suite: None,
            teardown: Teardown::new(),
            card: None,
            gpio: None,
            traffic: None,
            capture: None,
            vars: ScenarioVars::default(),
        }
    }

    /// Creates a [`RigWorld`] attached to the given [`Suite`].
    #[must_use]
    pub fn new(suite: Suite) -> Self {
        let mut world = Self::detached();
        world.attach(suite);
        world
    }

    /// Attaches this [`RigWorld`] to the given [`Suite`].
    pub fn attach(&mut self, suite: Suite) {
        self.suite = Some(suite);
    }

    /// Returns the [`Suite`] this [`RigWorld`] is attached to.
    ///
    /// # Errors
    ///
    /// If it's detached.
    pub fn suite(&self) -> Result<&Suite> {
        self.suite.as_ref().ok_or_else(|| {
            StepError::Precondition("scenario is not attached to a suite".into())
        })
    }

    controller! {
        card: dyn Card => "CAPI card",
        gpio: dyn Gpio => "GPIO",
        traffic: dyn TrafficGenerator => "traffic generator",
        capture: dyn Capture => "packet capture",
    }

    /// Resets this [`RigWorld`] for a new scenario: forgets open resources
    /// and controllers, and clears read values.
    pub fn begin_scenario(&mut self) {
        self.teardown.forget();
        self.card = None;
        self.gpio = None;
        self.traffic = None;
        self.capture = None;
        self.vars = ScenarioVars::default();
    }

    /// Releases every resource still open, the safety layer before the base
    /// layer, then rotates the capture file if this scenario captured packets.
    ///
    /// Failures are logged and never stop the remaining releases.
    pub fn end_scenario(&mut self) {
        let mut teardown = mem::take(&mut self.teardown);
        teardown.unwind(|res| self.release(res));

        if self.capture.take().is_some() {
            if let Some(suite) = &self.suite {
                if let Err(e) = suite.borrow_mut().rotate_capture() {
                    tracing::warn!("failed to rotate capture file: {e}");
                }
            }
        }
        self.card = None;
        self.gpio = None;
        self.traffic = None;
    }

    /// Indicates whether the `resource` is open.
    #[must_use]
    pub fn is_open(&self, resource: Resource) -> bool {
        self.teardown.is_open(resource)
    }

    /// Iterates over open resources in the order they were opened.
    pub fn open_resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.teardown.iter()
    }

    pub(crate) fn opened(&mut self, resource: Resource) {
        self.teardown.acquire(resource);
    }

    pub(crate) fn closed(&mut self, resource: Resource) {
        _ = self.teardown.release(resource);
    }

    /// Fails unless the `resource` is open.
    pub(crate) fn require(&self, resource: Resource, step: &str) -> Result<()> {
        if self.is_open(resource) {
            Ok(())
        } else {
            Err(StepError::Precondition(format!(
                "{resource:?} is not open, run `{step}` first",
            )))
        }
    }

    fn release(&mut self, resource: Resource) -> Result<()> {
        if let Resource::GpioPin(pin) = resource {
            return self.gpio()?.close(pin).check("Close sysfs GPIO");
        }
        if resource == Resource::Traffic {
            return self.traffic()?.stop_traffic().check("Stop traffic");
        }
        if resource == Resource::Capture {
            return self.capture()?.stop().check("Wireshark stop");
        }

        let card = self.card()?;
        match resource {
            Resource::CardSession => card.exit().check("Exit"),
            Resource::Interface => card.close_interface().check("Close interface"),
            Resource::Protocol => card.stop_protocol().check("Stop protocol"),
            Resource::Heartbeat => card.stop_heartbeat().check("HB stop"),
            Resource::Poll => card.stop_poll().check("Poll stop"),
            Resource::Ping => card.ping_close().check("Ping close"),
            Resource::ArpRegistration => {
                card.arp_unregister().check("ARP unregister")
            }
            Resource::SafeSession => card.safe_exit().check("Safe exit"),
            Resource::SafeInterface => {
                card.close_safe_interface().check("Close safe interface")
            }
            Resource::SafeConnection => card
                .disable_safe_connection()
                .check("Disable safe connection"),
            Resource::GpioPin(_) | Resource::Traffic | Resource::Capture => {
                Ok(())
            }
        }
    }
}
