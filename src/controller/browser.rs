// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Web browser automation, used to drive device web interfaces.

use std::{path::PathBuf, str::FromStr};

use derive_more::with_trait::Display;

use crate::Envelope;

/// Supported browsers.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum BrowserKind {
    #[display("firefox")]
    Firefox,
    #[display("chrome")]
    Chrome,
}

impl FromStr for BrowserKind {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firefox" => Ok(Self::Firefox),
            "chrome" => Ok(Self::Chrome),
            _ => Err("expected `firefox` or `chrome`"),
        }
    }
}

/// Way of locating a page element.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Locator {
    /// By its `id` attribute.
    Id(String),

    /// By its `class` attribute.
    Class(String),
}

impl Locator {
    /// Creates a [`Locator`] of the given `kind`, either `ID` or `Class`.
    ///
    /// # Errors
    ///
    /// If the `kind` is unknown.
    pub fn new(kind: &str, value: &str) -> Result<Self, &'static str> {
        match kind {
            "ID" => Ok(Self::Id(value.to_owned())),
            "Class" => Ok(Self::Class(value.to_owned())),
            _ => Err("expected `ID` or `Class`"),
        }
    }
}

/// Browser session.
pub trait Browser {
    fn navigate(&mut self, url: &str) -> Envelope;

    /// Saves a screenshot of the current page, returning its path.
    fn save_screenshot(&mut self) -> Envelope<PathBuf>;

    fn click(&mut self, element: &Locator) -> Envelope;

    /// Returns the text of the selected option of a dropdown.
    fn selected_text(&mut self, dropdown: &Locator) -> Envelope<String>;

    /// Selects the option of a dropdown having the given `value`.
    fn select_by_value(&mut self, dropdown: &Locator, value: &str) -> Envelope;

    fn text(&mut self, element: &Locator) -> Envelope<String>;

    /// Closes the browser.
    fn quit(&mut self) -> Envelope;
}
