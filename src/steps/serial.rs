// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps reading and writing the serial consoles of the device under test.
//!
//! Consoles are opened once per run by [`Suite::open_consoles()`], and are
//! addressed by their slot: `SS1`, `SS2` or `SS3`.
//!
//! [`Suite::open_consoles()`]: crate::Suite::open_consoles

use std::time::Duration;

use cucumber::{given, then, when};

use crate::{
    args,
    controller::serial::Console,
    error::{Result, StepError},
    world::RigWorld,
};

/// How long `Find` waits when no timeout is given.
const DEFAULT_FIND_TIMEOUT: Duration = Duration::from_secs(30);

/// How long the device under test may take to come up after a hard reset.
const HARD_RESET_TIMEOUT: Duration = Duration::from_secs(120);

/// Line the agent of the device under test prints once it's up.
const READY_BANNER: &str = "SSR agent is ready...";

/// Parses the timeout of a `Find` step, returning it along with whether the
/// result must be checked. `-1` waits the default time and ignores the
/// result.
fn find_timeout(raw: &str) -> Result<(Duration, bool)> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok((DEFAULT_FIND_TIMEOUT, true));
    }
    if raw.parse::<f64>().is_ok_and(|t| t == -1.0) {
        return Ok((DEFAULT_FIND_TIMEOUT, false));
    }
    Ok((args::seconds("timeout", raw)?, true))
}

#[given(regex = r"^Connect to serial ports$")]
#[then(regex = r"^Connect to serial ports$")]
async fn connect(w: &mut RigWorld) -> Result<()> {
    let s = w.suite()?.borrow();
    let configured = [
        (Console::Ss1, &s.opts().ss1, "ss1_usb"),
        (Console::Ss2, &s.opts().ss2, "ss2_usb"),
        (Console::Ss3, &s.opts().ss3, "ss3_usb"),
    ];
    for (console, device, env) in configured {
        let Some(device) = device else {
            return Err(StepError::unset(env));
        };
        if !s.consoles.contains_key(&console) {
            return Err(StepError::Precondition(format!(
                "{console} on `{device}` is not open",
            )));
        }
    }
    Ok(())
}

#[when(regex = r#"^Find "([^"]*)" on "([^"]*)" serial port "([^"]*)"$"#)]
#[then(regex = r#"^Find "([^"]*)" on "([^"]*)" serial port "([^"]*)"$"#)]
async fn find(
    w: &mut RigWorld,
    text: String,
    console: String,
    timeout: String,
) -> Result<()> {
    let console = args::parse::<Console>("controller", &console)?;
    let (timeout, checked) = find_timeout(&timeout)?;
    tracing::info!("looking for {text:?} on {console} for {timeout:?}");

    let reply = w.suite()?.borrow_mut().console(console)?.find(&text, timeout);
    if !checked {
        tracing::info!("{console} find: {}", reply.description);
        return Ok(());
    }
    if reply.check("Find on serial port")? {
        Ok(())
    } else {
        Err(StepError::Timeout {
            what: format!("{text:?} on {console}"),
            after: timeout,
        })
    }
}

#[given(regex = r#"^Write "([^"]*)" on "([^"]*)" serial port$"#)]
#[when(regex = r#"^Write "([^"]*)" on "([^"]*)" serial port$"#)]
async fn write(w: &mut RigWorld, text: String, console: String) -> Result<()> {
    let console = args::parse::<Console>("controller", &console)?;
    w.suite()?
        .borrow_mut()
        .console(console)?
        .write(&text)
        .check("Write on serial port")
}

#[when(regex = r#"^Read on "([^"]*)" serial port$"#)]
#[then(regex = r#"^Read on "([^"]*)" serial port$"#)]
async fn read(w: &mut RigWorld, console: String) -> Result<()> {
    let console = args::parse::<Console>("controller", &console)?;
    let line = w
        .suite()?
        .borrow_mut()
        .console(console)?
        .read()
        .check("Read on serial port")?;
    tracing::info!("{console}: {line}");
    Ok(())
}

#[when(regex = r#"^Read all on "([^"]*)" serial port$"#)]
#[then(regex = r#"^Read all on "([^"]*)" serial port$"#)]
async fn read_all(w: &mut RigWorld, console: String) -> Result<()> {
    let console = args::parse::<Console>("controller", &console)?;
    let lines = w
        .suite()?
        .borrow_mut()
        .console(console)?
        .read_all()
        .check("Read all on serial port")?;
    for line in lines {
        tracing::info!("{console}: {line}");
    }
    Ok(())
}

#[given(regex = r#"^Clear "([^"]*)" serial port$"#)]
#[when(regex = r#"^Clear "([^"]*)" serial port$"#)]
async fn clear(w: &mut RigWorld, console: String) -> Result<()> {
    let console = args::parse::<Console>("controller", &console)?;
    w.suite()?
        .borrow_mut()
        .console(console)?
        .clear()
        .check("Clear serial port")
}

/// Looks for the boot loader prompt. When it shows up, the boot is
/// interrupted on `SS1` and no power cycle is needed before flashing.
#[given(regex = r#"^Before flash find "([^"]*)" on "([^"]*)" serial port$"#)]
#[when(regex = r#"^Before flash find "([^"]*)" on "([^"]*)" serial port$"#)]
async fn before_flash_find(
    w: &mut RigWorld,
    text: String,
    console: String,
) -> Result<()> {
    let console = args::parse::<Console>("controller", &console)?;
    let found = {
        let mut s = w.suite()?.borrow_mut();
        let reply = s.console(console)?.find(&text, DEFAULT_FIND_TIMEOUT);
        tracing::info!("{console} find: {}", reply.description);
        let found = reply.is_success() && reply.data;
        if found {
            s.console(Console::Ss1)?
                .write("\r\n")
                .check("Write on serial port")?;
        }
        found
    };
    w.vars.factory_flash_restart = !found;
    Ok(())
}

#[then(regex = r"^Verify device is ready from hard reset$")]
async fn verify_ready_after_hard_reset(w: &mut RigWorld) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    let ready = s
        .console(Console::Ss1)?
        .find(READY_BANNER, HARD_RESET_TIMEOUT)
        .check("Verify device is ready")?;
    if !ready {
        return Err(StepError::Timeout {
            what: "device to report readiness".into(),
            after: HARD_RESET_TIMEOUT,
        });
    }
    s.hard_reset = true;
    Ok(())
}
