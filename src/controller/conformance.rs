// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Protocol conformance test tool.

use std::path::Path;

use crate::Envelope;

/// Conformance test tool.
pub trait ConformanceTool {
    /// Runs the test described by a configuration `file`, returning the
    /// tool's verdict.
    fn run_test(&mut self, file: &Path) -> Envelope<String>;

    /// Renames the tool's last log after the test it belongs to.
    fn rename_log(&mut self, test: &str) -> Envelope;
}
