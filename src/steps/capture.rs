// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Packet capture steps.

use std::{
    path::Path,
    time::{Duration, SystemTime},
};

use cucumber::{given, then, when};
use tokio::time;

use crate::{
    args,
    error::{Result, StepError},
    world::{Resource, RigWorld},
};

/// Time the capture process needs before it sees packets.
const WARM_UP: Duration = Duration::from_secs(2);

#[given(regex = r"^Wireshark start$")]
#[when(regex = r"^Wireshark start$")]
async fn start(w: &mut RigWorld) -> Result<()> {
    if w.is_open(Resource::Capture) {
        return Err(StepError::Precondition(
            "packet capture is running already".into(),
        ));
    }
    let capture = {
        let s = w.suite()?.borrow();
        let interface = s.opts().capture_interface()?;
        let capture = s.connector.capture(interface)?;
        tracing::info!("capturing on {interface}");
        capture
    };
    w.capture = Some(capture);
    w.opened(Resource::Capture);
    time::sleep(WARM_UP).await;
    Ok(())
}

#[given(regex = r"^Wireshark stop$")]
#[when(regex = r"^Wireshark stop$")]
async fn stop(w: &mut RigWorld) -> Result<()> {
    w.require(Resource::Capture, "Wireshark start")?;
    w.capture()?.stop().check("Wireshark stop")?;
    w.closed(Resource::Capture);
    Ok(())
}

#[when(regex = r#"^Wireshark generate json "([^"]*)"$"#)]
#[then(regex = r#"^Wireshark generate json "([^"]*)"$"#)]
async fn generate_json(w: &mut RigWorld, file: String) -> Result<()> {
    let file = Path::new(args::non_empty("filename", &file)?);
    if !file.exists() {
        return Err(StepError::Precondition(format!(
            "capture file `{}` does not exist",
            file.display(),
        )));
    }
    w.capture()?.export_json(file).check("Wireshark generate json")
}

/// Passes when the captured ARP requests number `count`, or one more: the
/// capture may catch a retry sent just before it was stopped.
#[then(regex = r#"^Wireshark arp count "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
async fn arp_count(
    w: &mut RigWorld,
    count: String,
    src: String,
    dst: String,
) -> Result<()> {
    let expected = args::int::<u32>("count", &count)?;
    let src = args::ipv4("srcAddr", &src)?;
    let dst = args::ipv4("dstAddr", &dst)?;
    let since = w.vars.arp_started_at.unwrap_or(SystemTime::UNIX_EPOCH);

    let counted = w
        .capture()?
        .arp_count(src, dst, since)
        .check("Wireshark arp count")?;
    tracing::info!("ARPs counted: {counted}, requested: {expected}");
    if counted == expected || Some(counted) == expected.checked_add(1) {
        Ok(())
    } else {
        Err(StepError::Mismatch {
            what: "ARP count",
            expected: format!("{expected} or {}", expected.saturating_add(1)),
            actual: counted.to_string(),
        })
    }
}
