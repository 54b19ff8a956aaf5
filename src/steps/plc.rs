// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps reading and writing tags of an Allen-Bradley PLC.

use cucumber::{given, then, when};

use crate::{args, error::Result, world::RigWorld};

#[given(regex = r"^(?:PLC|PyLogix) connect$")]
#[when(regex = r"^(?:PLC|PyLogix) connect$")]
async fn connect(w: &mut RigWorld) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    if s.plc.is_some() {
        tracing::info!("PLC is connected already");
        return Ok(());
    }
    let plc = s.connector.plc()?;
    s.plc = Some(plc);
    Ok(())
}

#[given(regex = r"^(?:PLC|PyLogix) disconnect$")]
#[when(regex = r"^(?:PLC|PyLogix) disconnect$")]
async fn disconnect(w: &mut RigWorld) -> Result<()> {
    let plc = w.suite()?.borrow_mut().plc.take();
    match plc {
        Some(mut plc) => plc.close().check("PLC disconnect").map(drop),
        None => {
            tracing::info!("PLC is not connected");
            Ok(())
        }
    }
}

#[when(regex = r#"^(?:PLC|PyLogix) read tag "([^"]*)" check "([^"]*)"$"#)]
#[then(regex = r#"^(?:PLC|PyLogix) read tag "([^"]*)" check "([^"]*)"$"#)]
async fn read_tag(w: &mut RigWorld, tag: String, check: String) -> Result<()> {
    let reply = w.suite()?.borrow_mut().plc()?.read(&tag);
    tracing::info!("{tag}: {} ({})", reply.data, reply.description);
    if check.eq_ignore_ascii_case("true") {
        _ = reply.check("PLC read tag")?;
    }
    Ok(())
}

#[given(
    regex = r#"^(?:PLC|PyLogix) write tag "([^"]*)" value "([^"]*)" check "([^"]*)"$"#
)]
#[when(
    regex = r#"^(?:PLC|PyLogix) write tag "([^"]*)" value "([^"]*)" check "([^"]*)"$"#
)]
async fn write_tag(
    w: &mut RigWorld,
    tag: String,
    value: String,
    check: String,
) -> Result<()> {
    let value = args::int("value", &value)?;
    let reply = w.suite()?.borrow_mut().plc()?.write(&tag, value);
    tracing::info!("{tag} = {value}: {}", reply.description);
    if check.eq_ignore_ascii_case("true") {
        reply.check("PLC write tag")?;
    }
    Ok(())
}
