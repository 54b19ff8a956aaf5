// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps switching relays: named Numato Ethernet relay modules, and the
//! KMTronic web relay boards wired to this rig.
//!
//! Web relay boards aren't named in steps. They're looked up through the
//! reservation broker by the configured automation index on first use, and
//! every step acts on all the relays wired to the rig.

use std::time::Duration;

use cucumber::{given, then, when};
use itertools::Itertools as _;
use tokio::time;

use crate::{
    args,
    controller::relay::{NUMATO_RELAYS, WEB_RELAYS},
    error::{ensure_eq, Result, StepError},
    suite::Suite,
    world::RigWorld,
};

/// Relay powering the Lauterbach debugger and the device under test.
const TRACE32_RELAY: u8 = 4;

/// Automation index of the only rig having a Lauterbach debugger.
const TRACE32_RIG: &str = "99";

fn numato_index(raw: &str) -> Result<u8> {
    let index = args::int::<u8>("relay index", raw)?;
    if usize::from(index) < NUMATO_RELAYS {
        Ok(index)
    } else {
        Err(StepError::argument(
            "relay index",
            raw,
            format!("must be below {NUMATO_RELAYS}"),
        ))
    }
}

fn on_off(state: bool) -> &'static str {
    if state {
        "on"
    } else {
        "off"
    }
}

#[given(regex = r#"^Numato eth relay connect to "([^"]*)" at "([^"]*)"$"#)]
#[when(regex = r#"^Numato eth relay connect to "([^"]*)" at "([^"]*)"$"#)]
async fn numato_connect(
    w: &mut RigWorld,
    name: String,
    host: String,
) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    if s.numato.contains_key(&name) {
        tracing::info!("Numato relay `{name}` is connected already");
        return Ok(());
    }
    let relay = s.connector.numato_relay(&host)?;
    _ = s.numato.insert(name, relay);
    Ok(())
}

#[when(regex = r#"^Numato eth relay version at "([^"]*)"$"#)]
#[then(regex = r#"^Numato eth relay version at "([^"]*)"$"#)]
async fn numato_version(w: &mut RigWorld, name: String) -> Result<()> {
    let version = w
        .suite()?
        .borrow_mut()
        .numato(&name)?
        .version()
        .check("Numato eth relay version")?;
    tracing::info!("`{name}` firmware version: {version}");
    Ok(())
}

#[given(regex = r#"^Numato eth relay reset at "([^"]*)"$"#)]
#[when(regex = r#"^Numato eth relay reset at "([^"]*)"$"#)]
async fn numato_reset(w: &mut RigWorld, name: String) -> Result<()> {
    w.suite()?
        .borrow_mut()
        .numato(&name)?
        .reset()
        .check("Numato eth relay reset")
        .map(drop)
}

#[when(regex = r#"^Numato eth relay read at "([^"]*)" with "([^"]*)"$"#)]
#[then(regex = r#"^Numato eth relay read at "([^"]*)" with "([^"]*)"$"#)]
async fn numato_read(
    w: &mut RigWorld,
    name: String,
    index: String,
) -> Result<()> {
    let index = numato_index(&index)?;
    let state = w
        .suite()?
        .borrow_mut()
        .numato(&name)?
        .read(index)
        .check("Numato eth relay read")?;
    tracing::info!("`{name}` relay {index} is {}", on_off(state));
    Ok(())
}

#[when(regex = r#"^Numato eth relay read all at "([^"]*)"$"#)]
#[then(regex = r#"^Numato eth relay read all at "([^"]*)"$"#)]
async fn numato_read_all(w: &mut RigWorld, name: String) -> Result<()> {
    let states = w
        .suite()?
        .borrow_mut()
        .numato(&name)?
        .read_all()
        .check("Numato eth relay read all")?;
    tracing::info!(
        "`{name}` relays: {}",
        states.iter().map(|s| u8::from(*s)).join(","),
    );
    Ok(())
}

#[given(regex = r#"^Numato eth relay (on|off) at "([^"]*)" with "([^"]*)"$"#)]
#[when(regex = r#"^Numato eth relay (on|off) at "([^"]*)" with "([^"]*)"$"#)]
async fn numato_switch(
    w: &mut RigWorld,
    state: String,
    name: String,
    index: String,
) -> Result<()> {
    let index = numato_index(&index)?;
    let mut s = w.suite()?.borrow_mut();
    let relay = s.numato(&name)?;
    if state == "on" {
        relay.on(index).check("Numato eth relay on").map(drop)
    } else {
        relay.off(index).check("Numato eth relay off").map(drop)
    }
}

#[given(regex = r#"^Numato eth relay write all at "([^"]*)" with "([^"]*)"$"#)]
#[when(regex = r#"^Numato eth relay write all at "([^"]*)" with "([^"]*)"$"#)]
async fn numato_write_all(
    w: &mut RigWorld,
    name: String,
    list: String,
) -> Result<()> {
    let states = args::list::<u8>("relay states", &list)?
        .into_iter()
        .map(|s| match s {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(StepError::argument(
                "relay states",
                list.as_str(),
                "states are 0 or 1",
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    let states = <[bool; NUMATO_RELAYS]>::try_from(states).map_err(|s| {
        StepError::argument(
            "relay states",
            list.as_str(),
            format!("expected {NUMATO_RELAYS} states, got {}", s.len()),
        )
    })?;

    w.suite()?
        .borrow_mut()
        .numato(&name)?
        .write_all(states)
        .check("Numato eth relay write all")
        .map(drop)
}

/// Switches every relay wired to the rig: on for `0`, and off otherwise,
/// as the relays break the power line when energized.
fn set_power(suite: &Suite, toggle: &str) -> Result<()> {
    let power = args::int::<u8>("relay toggle", toggle)? == 0;

    let mut s = suite.borrow_mut();
    for board in s.web_relays()? {
        for relay in &board.relays {
            if power {
                board.controller.on(*relay).check("Web relay on")?;
            } else {
                board.controller.off(*relay).check("Web relay off")?;
            }
        }
        tracing::info!("{}: switched relays {:?}", board.address, board.relays);
    }
    Ok(())
}

#[given(regex = r#"^Set web relay "([^"]*)"$"#)]
#[when(regex = r#"^Set web relay "([^"]*)"$"#)]
async fn set_web_relay(w: &mut RigWorld, list: String) -> Result<()> {
    let states = list
        .trim()
        .chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            _ => Err(StepError::argument(
                "relay list",
                list.as_str(),
                "states are 0 or 1",
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    let states = <[bool; WEB_RELAYS]>::try_from(states).map_err(|s| {
        StepError::argument(
            "relay list",
            list.as_str(),
            format!("expected {WEB_RELAYS} states, got {}", s.len()),
        )
    })?;

    let mut s = w.suite()?.borrow_mut();
    for board in s.web_relays()? {
        board.controller.set_all(states).check("Set web relay")?;
    }
    Ok(())
}

#[then(regex = r#"^Verify web relay status "([^"]*)"$"#)]
async fn verify_web_relay_status(
    w: &mut RigWorld,
    status: String,
) -> Result<()> {
    let expected = match args::int::<u8>("relay status", &status)? {
        0 => false,
        1 => true,
        _ => {
            return Err(StepError::argument(
                "relay status",
                status,
                "expected 0 or 1",
            ))
        }
    };

    let mut s = w.suite()?.borrow_mut();
    for board in s.web_relays()? {
        tracing::info!("verifying web relay at {}", board.address);
        let states = board.controller.status().check("Web relay status")?;
        for relay in &board.relays {
            let actual = usize::from(*relay)
                .checked_sub(1)
                .and_then(|i| states.get(i))
                .copied()
                .ok_or(StepError::Empty("Web relay status"))?;
            ensure_eq("web relay status", on_off(expected), on_off(actual))?;
        }
    }
    Ok(())
}

#[given(regex = r#"^Set web relay power "([^"]*)"$"#)]
#[when(regex = r#"^Set web relay power "([^"]*)"$"#)]
async fn set_web_relay_power(w: &mut RigWorld, toggle: String) -> Result<()> {
    set_power(w.suite()?, &toggle)
}

#[given(regex = r#"^Factory flash set web relay power "([^"]*)"$"#)]
#[when(regex = r#"^Factory flash set web relay power "([^"]*)"$"#)]
async fn factory_flash_power(w: &mut RigWorld, toggle: String) -> Result<()> {
    if w.vars.factory_flash_restart {
        set_power(w.suite()?, &toggle)
    } else {
        tracing::info!("device came up, no restart needed");
        Ok(())
    }
}

#[given(regex = r"^Reset trace32 device$")]
#[when(regex = r"^Reset trace32 device$")]
async fn reset_trace32(w: &mut RigWorld) -> Result<()> {
    let suite = w.suite()?;
    if suite.borrow().opts.automation_index.as_deref() != Some(TRACE32_RIG) {
        tracing::info!("no Lauterbach debugger on this rig");
        return Ok(());
    }

    let boards = suite.borrow_mut().web_relays()?.len();
    for i in 0..boards {
        let switch = |on: bool| -> Result<()> {
            let mut s = suite.borrow_mut();
            let board = s
                .web_relays()?
                .get_mut(i)
                .ok_or(StepError::NotConnected("web relay"))?;
            let env = if on {
                board.controller.on(TRACE32_RELAY)
            } else {
                board.controller.off(TRACE32_RELAY)
            };
            env.check("Reset trace32 device").map(drop)
        };
        switch(false)?;
        time::sleep(Duration::from_secs(5)).await;
        switch(true)?;
        time::sleep(Duration::from_secs(10)).await;
    }
    Ok(())
}
