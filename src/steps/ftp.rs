// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Steps driving an FTP client, shared by every scenario of a run.

use std::path::Path;

use cucumber::{given, then, when};

use crate::{error::Result, world::RigWorld};

#[given(regex = r#"^FTP connect "([^"]*)"$"#)]
#[when(regex = r#"^FTP connect "([^"]*)"$"#)]
async fn connect(w: &mut RigWorld, host: String) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    let mut ftp = s.connector.ftp()?;
    let welcome = ftp.connect(&host).check("FTP connect")?;
    tracing::info!("{host}: {welcome}");
    s.ftp = Some(ftp);
    Ok(())
}

#[given(regex = r#"^FTP login "([^"]*)" "([^"]*)"$"#)]
#[when(regex = r#"^FTP login "([^"]*)" "([^"]*)"$"#)]
async fn login(w: &mut RigWorld, user: String, password: String) -> Result<()> {
    let reply = w.suite()?.borrow_mut().ftp()?.login(&user, &password);
    tracing::info!("{}", reply.check("FTP login")?);
    Ok(())
}

#[given(regex = r#"^FTP cwd "([^"]*)"$"#)]
#[when(regex = r#"^FTP cwd "([^"]*)"$"#)]
async fn cwd(w: &mut RigWorld, dir: String) -> Result<()> {
    let reply = w.suite()?.borrow_mut().ftp()?.cwd(&dir);
    tracing::info!("{}", reply.check("FTP cwd")?);
    Ok(())
}

#[given(regex = r#"^FTP mkd "([^"]*)"$"#)]
#[when(regex = r#"^FTP mkd "([^"]*)"$"#)]
async fn mkd(w: &mut RigWorld, dir: String) -> Result<()> {
    let reply = w.suite()?.borrow_mut().ftp()?.mkd(&dir);
    tracing::info!("{}", reply.check("FTP mkd")?);
    Ok(())
}

#[when(regex = r"^FTP nlst$")]
#[then(regex = r"^FTP nlst$")]
async fn nlst(w: &mut RigWorld) -> Result<()> {
    let files = w.suite()?.borrow_mut().ftp()?.nlst().check("FTP nlst")?;
    tracing::info!("files: {}", files.join(", "));
    Ok(())
}

#[given(regex = r#"^FTP storebinary "([^"]*)"$"#)]
#[when(regex = r#"^FTP storebinary "([^"]*)"$"#)]
async fn store_binary(w: &mut RigWorld, file: String) -> Result<()> {
    let reply = w.suite()?.borrow_mut().ftp()?.store_binary(Path::new(&file));
    tracing::info!("{}", reply.check("FTP storebinary")?);
    Ok(())
}

#[given(regex = r"^FTP exit$")]
#[when(regex = r"^FTP exit$")]
async fn exit(w: &mut RigWorld) -> Result<()> {
    let mut s = w.suite()?.borrow_mut();
    s.ftp()?.quit().check("FTP exit")?;
    s.ftp = None;
    Ok(())
}
