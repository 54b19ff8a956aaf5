// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps driving sysfs GPIO pins.
//!
//! Pins initialized by a scenario are closed at its end, unless closed
//! explicitly before.

use cucumber::{given, then, when};

use crate::{
    args,
    controller::gpio::Direction,
    error::Result,
    world::{Resource, RigWorld},
};

#[given(regex = r"^GPIO connect$")]
#[when(regex = r"^GPIO connect$")]
async fn connect(w: &mut RigWorld) -> Result<()> {
    let gpio = w.suite()?.borrow().connector.gpio()?;
    w.gpio = Some(gpio);
    Ok(())
}

#[given(regex = r#"^Init GPIO "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Init GPIO "([^"]*)" "([^"]*)"$"#)]
async fn init(w: &mut RigWorld, pin: String, dir: String) -> Result<()> {
    let pin = args::int("pin number", &pin)?;
    let dir = args::parse::<Direction>("direction", &dir)?;
    w.gpio()?.init(pin, dir).check("Init GPIO")?;
    w.opened(Resource::GpioPin(pin));
    Ok(())
}

#[when(regex = r#"^Read pin level "([^"]*)"$"#)]
#[then(regex = r#"^Read pin level "([^"]*)"$"#)]
async fn read_level(w: &mut RigWorld, pin: String) -> Result<()> {
    let pin = args::int("pin number", &pin)?;
    let high = w.gpio()?.read(pin).check("Read pin level")?;
    tracing::info!("pin {pin} is {}", if high { "high" } else { "low" });
    Ok(())
}

#[given(regex = r#"^Set pin level "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Set pin level "([^"]*)" "([^"]*)"$"#)]
async fn set_level(w: &mut RigWorld, pin: String, value: String) -> Result<()> {
    let pin = args::int("pin number", &pin)?;
    let high = args::flag("value", &value)?;
    w.gpio()?.write(pin, high).check("Set pin level").map(drop)
}

#[given(regex = r#"^Close sysfs GPIO "([^"]*)"$"#)]
#[when(regex = r#"^Close sysfs GPIO "([^"]*)"$"#)]
async fn close(w: &mut RigWorld, pin: String) -> Result<()> {
    let pin = args::int("pin number", &pin)?;
    w.gpio()?.close(pin).check("Close sysfs GPIO")?;
    w.closed(Resource::GpioPin(pin));
    Ok(())
}
