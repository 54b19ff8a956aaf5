// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bounded polling.

use std::time::Duration;

use tokio::time::{self, Instant};

/// Calls `attempt` every `interval` until it succeeds or `timeout` elapses.
///
/// Returns whether some attempt succeeded. The first attempt is made
/// immediately, and the last one no later than `timeout` after it.
pub async fn until(
    timeout: Duration,
    interval: Duration,
    mut attempt: impl FnMut() -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if attempt() {
            return true;
        }
        if Instant::now() + interval > deadline {
            return false;
        }
        time::sleep(interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stops_on_first_success() {
        let mut calls = 0;

        let ok = until(Duration::from_secs(30), Duration::from_millis(500), || {
            calls += 1;
            calls == 3
        })
        .await;

        assert!(ok);
        assert_eq!(calls, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_timeout() {
        let started = Instant::now();
        let mut calls = 0;

        let ok = until(Duration::from_secs(30), Duration::from_millis(500), || {
            calls += 1;
            false
        })
        .await;

        assert!(!ok);
        assert_eq!(calls, 61);
        assert_eq!(started.elapsed(), Duration::from_secs(30));
    }
}
