// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! General purpose steps: waiting, local commands, tool reservation and
//! configuration lookup.

use std::{collections::BTreeMap, mem, process::Stdio, time::Duration};

use cucumber::{given, then, when};
use tokio::{
    process::Command,
    time::{self, Instant},
};

use crate::{
    args,
    error::{Result, StepError},
    suite::Suite,
    world::RigWorld,
};

/// Deadline of the `Ping` step.
const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Broker status of a reservation refused because the tool is busy.
const BUSY: i32 = 1;

/// Returns a command running `line` through the platform shell.
fn shell(line: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        _ = cmd.arg("/C").arg(line);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        _ = cmd.arg("-c").arg(line);
        cmd
    }
}

#[given(regex = r#"^Wait "([^"]*)"$"#)]
#[when(regex = r#"^Wait "([^"]*)"$"#)]
async fn wait(_: &mut RigWorld, secs: String) -> Result<()> {
    time::sleep(args::seconds("timeout", &secs)?).await;
    Ok(())
}

#[given(regex = r#"^Ping "([^"]*)"$"#)]
#[when(regex = r#"^Ping "([^"]*)"$"#)]
#[then(regex = r#"^Ping "([^"]*)"$"#)]
async fn ping(_: &mut RigWorld, ip: String) -> Result<()> {
    let ip = args::ipv4("IP address", &ip)?;
    let count = if cfg!(windows) { "-n" } else { "-c" };

    let output = time::timeout(
        PING_TIMEOUT,
        Command::new("ping").arg(count).arg("4").arg(ip.to_string()).output(),
    )
    .await
    .map_err(|_| StepError::Timeout {
        what: format!("ping of {ip}"),
        after: PING_TIMEOUT,
    })??;

    tracing::info!("{}", String::from_utf8_lossy(&output.stdout));
    if !output.stderr.is_empty() {
        tracing::info!("{}", String::from_utf8_lossy(&output.stderr));
    }
    if output.status.success() {
        Ok(())
    } else {
        Err(StepError::Precondition(format!("{ip} doesn't answer pings")))
    }
}

#[given(regex = r#"^Send shell command "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^Send shell command "([^"]*)" "([^"]*)"$"#)]
async fn shell_command(
    _: &mut RigWorld,
    line: String,
    check: String,
) -> Result<()> {
    let check = check.eq_ignore_ascii_case("true");

    let output = shell(&line).output().await?;
    tracing::info!(
        "`{line}` exited with {}\n{}{}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
    if check && !output.status.success() {
        return Err(StepError::Operation {
            operation: "Send shell command",
            status: output.status.code().unwrap_or(-1),
            description: format!("`{line}` returned non-zero"),
        });
    }
    Ok(())
}

#[given(regex = r"^Force fail$")]
#[when(regex = r"^Force fail$")]
#[then(regex = r"^Force fail$")]
async fn force_fail(_: &mut RigWorld) -> Result<()> {
    Err(StepError::Forced)
}

#[given(regex = r"^Force pass$")]
#[when(regex = r"^Force pass$")]
#[then(regex = r"^Force pass$")]
async fn force_pass(_: &mut RigWorld) -> Result<()> {
    Ok(())
}

/// Reserves the `tool` for this node, retrying while the broker reports it
/// busy.
///
/// Does nothing if this run holds the `tool` already.
async fn reserve_tool(suite: &Suite, tool: &str) -> Result<()> {
    if suite.borrow().reserved.iter().any(|t| t == tool) {
        tracing::info!("`{tool}` is reserved already");
        return Ok(());
    }

    let (timeout, interval) = {
        let s = suite.borrow();
        (s.opts.reserve_timeout, s.opts.reserve_interval)
    };
    let deadline = Instant::now() + timeout;
    let reply = loop {
        let reply = {
            let s = suite.borrow();
            s.broker.reserve(s.opts.node_name()?, tool, s.opts.vlan_id()?)?
        };
        if reply.status != BUSY || Instant::now() + interval > deadline {
            break reply;
        }
        tracing::info!("`{tool}` is busy, retrying in {interval:?}");
        time::sleep(interval).await;
    };

    if reply.status == BUSY {
        return Err(StepError::Timeout {
            what: format!("reservation of `{tool}`"),
            after: timeout,
        });
    }
    _ = reply.check("Reserve")?;
    suite.borrow_mut().reserved.push(tool.to_owned());
    Ok(())
}

/// Returns the name of the tool found by `Lookup protocol`.
fn lookup_tool(suite: &Suite) -> Result<String> {
    suite
        .borrow()
        .lookup
        .as_ref()
        .map(|l| l.toolname.clone())
        .ok_or_else(|| StepError::missing("lookup tool", "Lookup protocol"))
}

#[given(regex = r#"^Reserve "([^"]*)"$"#)]
#[when(regex = r#"^Reserve "([^"]*)"$"#)]
async fn reserve(w: &mut RigWorld, tool: String) -> Result<()> {
    let suite = w.suite()?.clone();
    reserve_tool(&suite, &tool).await
}

#[given(regex = r#"^Unreserve "([^"]*)"$"#)]
#[when(regex = r#"^Unreserve "([^"]*)"$"#)]
async fn unreserve(w: &mut RigWorld, tool: String) -> Result<()> {
    w.suite()?.borrow_mut().unreserve(&tool)
}

#[given(regex = r#"^Get config crc "([^"]*)"$"#)]
#[when(regex = r#"^Get config crc "([^"]*)"$"#)]
async fn config_crc(w: &mut RigWorld, file: String) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    let crc = s
        .broker
        .config_crc(&file)?
        .check("Get config crc")?
        .ok_or(StepError::Empty("Get config crc"))?
        .crc;
    tracing::info!("CRC of `{file}`: {crc}");
    s.config_crc = Some(crc);
    Ok(())
}

#[given(regex = r#"^Load config "([^"]*)"$"#)]
#[when(regex = r#"^Load config "([^"]*)"$"#)]
async fn load_config(w: &mut RigWorld, file: String) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    let path = s.opts.config_dir()?.join(&file);
    if !path.exists() {
        return Err(StepError::Precondition(format!(
            "configuration file `{}` doesn't exist",
            path.display(),
        )));
    }
    tracing::info!("configuration file: {}", path.display());
    s.config_file = Some(path);
    Ok(())
}

#[given(regex = r#"^Lookup protocol standard "([^"]*)" safe "([^"]*)"$"#)]
#[when(regex = r#"^Lookup protocol standard "([^"]*)" safe "([^"]*)"$"#)]
async fn lookup_protocol(
    w: &mut RigWorld,
    standard: String,
    safe: String,
) -> Result<()> {
    let safe = (!safe.is_empty()).then_some(safe.as_str());

    let mut s = w.suite()?.borrow_mut();
    let found = s
        .broker
        .lookup(&standard, safe)?
        .check("Lookup protocol")?
        .ok_or(StepError::Empty("Lookup protocol"))?;
    tracing::info!("found `{}` on port {}", found.toolname, found.port());
    s.lookup = Some(found);
    Ok(())
}

#[given(regex = r"^Reserve lookup tool$")]
#[when(regex = r"^Reserve lookup tool$")]
async fn reserve_lookup_tool(w: &mut RigWorld) -> Result<()> {
    let suite = w.suite()?.clone();
    let tool = lookup_tool(&suite)?;
    reserve_tool(&suite, &tool).await
}

#[given(regex = r"^Unreserve lookup tool$")]
#[when(regex = r"^Unreserve lookup tool$")]
async fn unreserve_lookup_tool(w: &mut RigWorld) -> Result<()> {
    let suite = w.suite()?;
    let tool = lookup_tool(suite)?;
    suite.borrow_mut().unreserve(&tool)
}

#[given(regex = r#"^Config lookup tool "([^"]*)"$"#)]
#[when(regex = r#"^Config lookup tool "([^"]*)"$"#)]
async fn config_lookup_tool(w: &mut RigWorld, hardware: String) -> Result<()> {
    let port = w
        .suite()?
        .borrow()
        .lookup
        .as_ref()
        .map(|l| l.port())
        .ok_or_else(|| StepError::missing("lookup port", "Lookup protocol"))?;
    let file = format!("{hardware}_port-{port}.bin");
    config_crc(w, file.clone()).await?;
    load_config(w, file).await
}

#[given(regex = r"^Startup windows subsystems$")]
#[when(regex = r"^Startup windows subsystems$")]
async fn startup_subsystems(w: &mut RigWorld) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    let list: BTreeMap<String, String> =
        serde_json::from_str(s.opts.subsystems()?).map_err(|e| {
            StepError::argument("windows_subsystem_list", "", e.to_string())
        })?;
    let workspace = s.opts.workspace_path()?.clone();
    tracing::info!("subsystems: {list:?}");

    for (name, path) in list {
        let path = workspace.join(path.trim());
        tracing::info!("starting `{name}`: {}", path.display());
        let child = shell(&path.to_string_lossy())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        _ = s.subsystems.insert(name, child);
    }
    Ok(())
}

#[given(regex = r"^Stop windows subsystems$")]
#[when(regex = r"^Stop windows subsystems$")]
async fn stop_subsystems(w: &mut RigWorld) -> Result<()> {
    let running = mem::take(&mut w.suite()?.borrow_mut().subsystems);

    let mut failed = Vec::new();
    for (name, mut child) in running {
        if let Err(e) = child.kill().await {
            tracing::warn!("failed to stop `{name}`: {e}");
            failed.push(name);
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(StepError::Precondition(format!(
            "failed to stop subsystems: {}",
            failed.join(", "),
        )))
    }
}
