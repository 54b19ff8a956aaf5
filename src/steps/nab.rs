// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps exchanging messages with a NAB agent.

use cucumber::{given, then, when};
use itertools::Itertools as _;

use crate::{
    args,
    controller::nab::{Message, Reply},
    error::{ensure_eq, Result, StepError},
    world::RigWorld,
};

const ECHO: u32 = 0x5002_005C;
const INVERSE: u32 = 0x5002_00BA;

/// Bit set in the command of a reply to the request's command.
const REPLY_BIT: u32 = 0x8000;

const INSTANCE: u32 = 0;
const VERSION: u32 = 1;

/// Expected result code of a NAB reply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Expect {
    /// Zero, with the reply data checked.
    Zero,

    /// Anything but zero.
    NonZero,

    /// Whatever.
    Any,
}

impl From<&str> for Expect {
    /// Anything but `zero` and `non-zero` leaves the result unchecked.
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" => Self::Zero,
            "non-zero" => Self::NonZero,
            "any" => Self::Any,
            other => {
                tracing::debug!("not checking NAB result for `{other}`");
                Self::Any
            }
        }
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().format_with(" ", |b, f| f(&format_args!("0x{b:02X}"))).to_string()
}

/// Sends `data` with the given `command`, checks the reply header, and
/// returns the reply if its result matches the expectation.
fn exchange(
    w: &mut RigWorld,
    command: u32,
    data: Vec<u8>,
    expect: Expect,
) -> Result<Option<Reply>> {
    let message = Message { command, instance: INSTANCE, version: VERSION, data };
    tracing::info!("sending {command:#010X}: {}", hex(&message.data));

    let reply = w
        .suite()?
        .borrow_mut()
        .nab()?
        .exchange(&message)
        .check("NAB exchange")?;
    let h = reply.header;
    tracing::info!(
        "reply header: {:#010X} {:#06X} {:#06X} {:#06X} {:#06X}, result: {}, data: {}",
        h.command,
        h.message_id,
        h.instance,
        h.size,
        h.version,
        reply.result,
        hex(&reply.data),
    );

    ensure_eq("replied command", command | REPLY_BIT, h.command)?;
    ensure_eq("replied instance", INSTANCE, h.instance)?;
    ensure_eq(
        "replied data size",
        u32::try_from(message.data.len()).unwrap_or(u32::MAX),
        h.size,
    )?;
    ensure_eq("replied version", VERSION, h.version)?;

    match expect {
        Expect::Zero => {
            ensure_eq("NAB result", 0, reply.result)?;
            Ok(Some(reply))
        }
        Expect::NonZero if reply.result == 0 => Err(StepError::Mismatch {
            what: "NAB result",
            expected: "non-zero".into(),
            actual: "0".into(),
        }),
        Expect::NonZero | Expect::Any => Ok(None),
    }
}

#[given(regex = r"^NAB connect$")]
#[when(regex = r"^NAB connect$")]
async fn connect(w: &mut RigWorld) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    if s.nab.is_some() {
        tracing::info!("NAB agent is connected already");
        return Ok(());
    }
    let agent = s.connector.nab_agent()?;
    s.nab = Some(agent);
    Ok(())
}

#[given(regex = r"^NAB disconnect$")]
#[when(regex = r"^NAB disconnect$")]
async fn disconnect(w: &mut RigWorld) -> Result<()> {
    let agent = w.suite()?.borrow_mut().nab.take();
    match agent {
        Some(mut agent) => agent.disconnect().check("NAB disconnect").map(drop),
        None => {
            tracing::info!("NAB agent is not connected");
            Ok(())
        }
    }
}

#[when(regex = r#"^NAB echo data "([^"]*)" "([^"]*)"$"#)]
#[then(regex = r#"^NAB echo data "([^"]*)" "([^"]*)"$"#)]
async fn echo(w: &mut RigWorld, data: String, expect: String) -> Result<()> {
    let data = args::list::<u8>("echo data", &data)?;
    let expect = Expect::from(expect.as_str());

    if let Some(reply) = exchange(w, ECHO, data.clone(), expect)? {
        for (sent, echoed) in data.iter().zip(&reply.data) {
            ensure_eq("echoed byte", *sent, *echoed)?;
        }
    }
    Ok(())
}

#[when(regex = r#"^NAB inverse data "([^"]*)" "([^"]*)"$"#)]
#[then(regex = r#"^NAB inverse data "([^"]*)" "([^"]*)"$"#)]
async fn inverse(w: &mut RigWorld, data: String, expect: String) -> Result<()> {
    let data = args::list::<u8>("inverse data", &data)?;
    let expect = Expect::from(expect.as_str());

    if let Some(reply) = exchange(w, INVERSE, data.clone(), expect)? {
        for (sent, inverted) in data.iter().zip(&reply.data) {
            ensure_eq("inverted byte", !*sent, *inverted)?;
        }
    }
    Ok(())
}
