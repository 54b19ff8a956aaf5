// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! EtherNet/IP conformance test steps.

use cucumber::{then, when};
use itertools::Itertools as _;

use crate::{
    error::{Result, StepError},
    world::RigWorld,
};

/// Verdict the conformance tool prints for a passed test.
const PASSED: &str = "PASSED";

/// Runs every configured conformance test, one after another, renaming the
/// tool's log after each of them. Failed tests don't stop the remaining
/// ones, and are reported together at the end.
#[when(regex = r"^Run conformance tests$")]
#[then(regex = r"^Run conformance tests$")]
async fn run_conformance_tests(w: &mut RigWorld) -> Result<()> {
    let s = w.suite()?.borrow();
    let files = &s.opts().conformance_files;
    if files.is_empty() {
        return Err(StepError::unset("conformance_files"));
    }
    let dir = s.opts().conformance_dir()?;
    tracing::info!("conformance files in {}: {}", dir.display(), files.join(", "));

    let mut tool = s.connector.conformance_tool()?;
    let mut failed = Vec::new();
    for test in files.iter().map(|f| f.trim()) {
        let path = dir.join(test);
        tracing::info!("running {}", path.display());
        match tool.run_test(&path).check("Run conformance test") {
            Ok(verdict) if verdict.contains(PASSED) => {
                tracing::info!("{test}: {verdict}");
            }
            Ok(verdict) => {
                tracing::error!("{test}: {verdict}");
                failed.push(test);
            }
            Err(e) => {
                tracing::error!("{test}: {e}");
                failed.push(test);
            }
        }
        if let Err(e) = tool.rename_log(test).check("Rename conformance log") {
            tracing::warn!("{test}: {e}");
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(StepError::Precondition(format!(
            "conformance tests failed: {}",
            failed.iter().format(", "),
        )))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        config::RigOpts,
        test_utils::{opts, rig, rig_with},
    };

    use super::*;

    fn with_files(files: &[&str]) -> RigOpts {
        RigOpts {
            conformance_files: files.iter().map(|&f| f.to_owned()).collect(),
            conformance_dir: Some("/opt/ct".into()),
            ..opts()
        }
    }

    #[tokio::test]
    async fn runs_every_file_in_order() {
        let (mut w, journal) = rig_with(with_files(&["io.stc", " msg.stc"]));

        run_conformance_tests(&mut w).await.unwrap();

        assert_eq!(
            journal.calls(),
            [
                "run_test /opt/ct/io.stc",
                "rename_log io.stc",
                "run_test /opt/ct/msg.stc",
                "rename_log msg.stc",
            ],
        );
    }

    #[tokio::test]
    async fn failures_are_reported_after_all_tests() {
        let (mut w, journal) = rig_with(with_files(&["io.stc", "msg.stc"]));
        journal.fail_times("run_test", 1);

        let err = run_conformance_tests(&mut w).await.unwrap_err();

        assert_eq!(err.to_string(), "conformance tests failed: io.stc");
        assert!(journal.called("run_test /opt/ct/msg.stc"));
    }

    #[tokio::test]
    async fn needs_configured_files() {
        let (mut w, _) = rig();

        assert_eq!(
            run_conformance_tests(&mut w).await.unwrap_err().to_string(),
            "`conformance_files` is not configured",
        );
    }
}
