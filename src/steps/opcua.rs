// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps driving an OPC UA client.
//!
//! Nodes are looked up once and kept under a name, so later steps refer
//! to them by that name instead of the full node ID.

use cucumber::{given, then, when};

use crate::{
    args,
    controller::opcua::VariantType,
    error::{Result, StepError},
    world::RigWorld,
};

#[given(regex = r#"^OPC UA Client connect "([^"]*)"$"#)]
#[when(regex = r#"^OPC UA Client connect "([^"]*)"$"#)]
async fn connect(w: &mut RigWorld, url: String) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    let client = s.connector.opcua(&url)?;
    s.opcua = Some(client);
    Ok(())
}

#[given(regex = r#"^OPC UA Client get node "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^OPC UA Client get node "([^"]*)" "([^"]*)"$"#)]
async fn get_node(w: &mut RigWorld, id: String, key: String) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    let node = s
        .opcua()?
        .node(&id)
        .check("OPC UA Client get node")?
        .ok_or(StepError::Empty("OPC UA Client get node"))?;
    tracing::info!("`{key}` is node {node}");
    _ = s.nodes.insert(key, node);
    Ok(())
}

#[when(regex = r#"^OPC UA Client get browse name "([^"]*)"$"#)]
#[then(regex = r#"^OPC UA Client get browse name "([^"]*)"$"#)]
async fn browse_name(w: &mut RigWorld, key: String) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    let node = s.node(&key)?.clone();
    let name = s
        .opcua()?
        .browse_name(&node)
        .check("OPC UA Client get browse name")?;
    tracing::info!("browse name of `{key}`: {name}");
    Ok(())
}

#[when(regex = r#"^OPC UA Client get value "([^"]*)"$"#)]
#[then(regex = r#"^OPC UA Client get value "([^"]*)"$"#)]
async fn get_value(w: &mut RigWorld, key: String) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    let node = s.node(&key)?.clone();
    let value = s
        .opcua()?
        .value(&node)
        .check("OPC UA Client get value")?
        .ok_or(StepError::Empty("OPC UA Client get value"))?;
    tracing::info!("value of `{key}`: {value}");
    Ok(())
}

#[given(regex = r#"^OPC UA Client set value "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^OPC UA Client set value "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
async fn set_value(
    w: &mut RigWorld,
    key: String,
    value: String,
    ty: String,
) -> Result<()> {
    let ty = args::parse::<VariantType>("value type", &ty)?;
    let value = ty
        .parse(&value)
        .map_err(|e| StepError::argument("value", value.as_str(), e))?;

    let mut s = w.suite()?.borrow_mut();
    let node = s.node(&key)?.clone();
    s.opcua()?
        .set_value(&node, &value)
        .check("OPC UA Client set value")
        .map(drop)
}
