// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps driving the web interface of the device under test in a browser.

use cucumber::{given, then, when};

use crate::{
    args,
    controller::browser::{BrowserKind, Locator},
    error::{Result, StepError, ensure_eq},
    world::RigWorld,
};

/// Parses an element locator, accepting its kind in any case.
fn locator(kind: &str, value: &str) -> Result<Locator> {
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "id" => "ID",
        "class" => "Class",
        _ => kind,
    };
    Locator::new(kind, value).map_err(|e| StepError::argument("byType", kind, e))
}

#[given(regex = r#"^(?:Browser|Selenium) connect "([^"]*)"$"#)]
#[when(regex = r#"^(?:Browser|Selenium) connect "([^"]*)"$"#)]
async fn connect(w: &mut RigWorld, kind: String) -> Result<()> {
    let kind = args::parse::<BrowserKind>("type", &kind.to_ascii_lowercase())?;
    let mut s = w.suite()?.borrow_mut();
    if s.browser.is_some() {
        tracing::info!("browser is connected already");
        return Ok(());
    }
    let browser = s.connector.browser(kind)?;
    tracing::info!("{kind} started");
    s.browser = Some(browser);
    Ok(())
}

#[given(regex = r"^(?:Browser|Selenium) disconnect$")]
#[when(regex = r"^(?:Browser|Selenium) disconnect$")]
async fn disconnect(w: &mut RigWorld) -> Result<()> {
    let browser = w.suite()?.borrow_mut().browser.take();
    match browser {
        Some(mut b) => b.quit().check("Browser disconnect"),
        None => {
            tracing::info!("browser is not connected");
            Ok(())
        }
    }
}

#[given(regex = r#"^(?:Browser|Selenium) navigate "([^"]*)"$"#)]
#[when(regex = r#"^(?:Browser|Selenium) navigate "([^"]*)"$"#)]
async fn navigate(w: &mut RigWorld, url: String) -> Result<()> {
    let url = args::non_empty("url", &url)?;
    w.suite()?.borrow_mut().browser()?.navigate(url).check("Browser navigate")
}

#[when(regex = r"^(?:Browser|Selenium) save screenshot$")]
#[then(regex = r"^(?:Browser|Selenium) save screenshot$")]
async fn save_screenshot(w: &mut RigWorld) -> Result<()> {
    let path = w
        .suite()?
        .borrow_mut()
        .browser()?
        .save_screenshot()
        .check("Browser save screenshot")?;
    tracing::info!("screenshot saved to {}", path.display());
    Ok(())
}

#[given(regex = r#"^(?:Browser|Selenium) click "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^(?:Browser|Selenium) click "([^"]*)" "([^"]*)"$"#)]
async fn click(w: &mut RigWorld, kind: String, id: String) -> Result<()> {
    let element = locator(&kind, &id)?;
    w.suite()?.borrow_mut().browser()?.click(&element).check("Browser click")
}

#[when(
    regex = r#"^(?:Browser|Selenium) get selected text from dropdown "([^"]*)" "([^"]*)"$"#
)]
#[then(
    regex = r#"^(?:Browser|Selenium) get selected text from dropdown "([^"]*)" "([^"]*)"$"#
)]
async fn selected_text(w: &mut RigWorld, kind: String, id: String) -> Result<()> {
    let dropdown = locator(&kind, &id)?;
    let text = w
        .suite()?
        .borrow_mut()
        .browser()?
        .selected_text(&dropdown)
        .check("Browser get selected text")?;
    tracing::info!("selected: {text}");
    Ok(())
}

#[given(
    regex = r#"^(?:Browser|Selenium) select by value "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
#[when(
    regex = r#"^(?:Browser|Selenium) select by value "([^"]*)" "([^"]*)" "([^"]*)"$"#
)]
async fn select_by_value(
    w: &mut RigWorld,
    kind: String,
    id: String,
    value: String,
) -> Result<()> {
    let dropdown = locator(&kind, &id)?;
    w.suite()?
        .borrow_mut()
        .browser()?
        .select_by_value(&dropdown, &value)
        .check("Browser select by value")
}

#[when(regex = r#"^(?:Browser|Selenium) get text "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
#[then(regex = r#"^(?:Browser|Selenium) get text "([^"]*)" "([^"]*)" "([^"]*)"$"#)]
async fn text(
    w: &mut RigWorld,
    kind: String,
    id: String,
    verify: String,
) -> Result<()> {
    let element = locator(&kind, &id)?;
    let text = w
        .suite()?
        .borrow_mut()
        .browser()?
        .text(&element)
        .check("Browser get text")?;
    tracing::info!("text: {text}");
    if verify.is_empty() {
        return Ok(());
    }
    ensure_eq("element text", verify.as_str(), text.as_str())
}
