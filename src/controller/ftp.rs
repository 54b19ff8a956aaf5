// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! FTP client.

use std::path::Path;

use crate::Envelope;

/// FTP client session. Payload strings are the server's responses.
pub trait Ftp {
    /// Connects to the given `host`.
    fn connect(&mut self, host: &str) -> Envelope<String>;

    fn login(&mut self, user: &str, password: &str) -> Envelope<String>;

    /// Changes the working directory.
    fn cwd(&mut self, dir: &str) -> Envelope<String>;

    /// Creates a directory.
    fn mkd(&mut self, dir: &str) -> Envelope<String>;

    /// Lists the working directory.
    fn nlst(&mut self) -> Envelope<Vec<String>>;

    /// Uploads a local `file` in binary mode.
    fn store_binary(&mut self, file: &Path) -> Envelope<String>;

    /// Closes the session.
    fn quit(&mut self) -> Envelope;
}
