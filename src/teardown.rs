// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tracking of resources opened during a [scenario].
//!
//! [scenario]: https://cucumber.io/docs/gherkin/reference#example

use std::{fmt, mem};

use crate::error::Result;

/// Fixed position of a resource in the release order.
pub trait Rank {
    /// Lower ranks are released first.
    fn rank(&self) -> u8;
}

/// Resources opened by steps of a single [scenario], in acquisition order.
///
/// [`Teardown::unwind()`] releases them by their [`Rank`], so a resource is
/// always released before the resources it's built on, whatever order the
/// steps opened them in. Resources of equal rank are released in reverse
/// acquisition order.
///
/// [scenario]: https://cucumber.io/docs/gherkin/reference#example
pub struct Teardown<K: Copy + Eq + fmt::Debug> {
    open: Vec<K>,
}

impl<K: Copy + Eq + fmt::Debug> Default for Teardown<K> {
    fn default() -> Self {
        Self { open: Vec::new() }
    }
}

impl<K: Copy + Eq + fmt::Debug> fmt::Debug for Teardown<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.open).finish()
    }
}

impl<K: Copy + Eq + fmt::Debug> Teardown<K> {
    /// Creates an empty [`Teardown`].
    #[must_use]
    pub const fn new() -> Self {
        Self { open: Vec::new() }
    }

    /// Marks the `resource` as open.
    ///
    /// Acquiring an already open resource keeps its original position.
    pub fn acquire(&mut self, resource: K) {
        if !self.open.contains(&resource) {
            self.open.push(resource);
        }
    }

    /// Marks the `resource` as closed, returning whether it was open.
    pub fn release(&mut self, resource: K) -> bool {
        let len = self.open.len();
        self.open.retain(|r| *r != resource);
        self.open.len() != len
    }

    /// Indicates whether the `resource` is open.
    #[must_use]
    pub fn is_open(&self, resource: K) -> bool {
        self.open.contains(&resource)
    }

    /// Indicates whether nothing is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    /// Iterates over open resources in acquisition order.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.open.iter().copied()
    }

    /// Forgets every open resource without releasing it.
    pub fn forget(&mut self) {
        self.open.clear();
    }
}

impl<K: Copy + Eq + fmt::Debug + Rank> Teardown<K> {
    /// Releases every open resource by ascending [`Rank`], the latest
    /// acquired first among equal ranks.
    ///
    /// A failed `close` is logged and doesn't stop the remaining ones. Once
    /// this returns, nothing is tracked as open.
    pub fn unwind(&mut self, mut close: impl FnMut(K) -> Result<()>) {
        let mut order = mem::take(&mut self.open);
        order.reverse();
        order.sort_by_key(|r| r.rank());

        for resource in order {
            match close(resource) {
                Ok(()) => tracing::debug!("released {resource:?}"),
                Err(e) => tracing::warn!("failed to release {resource:?}: {e}"),
            }
        }
    }
}

impl<K: Copy + Eq + fmt::Debug> Drop for Teardown<K> {
    fn drop(&mut self) {
        if !self.open.is_empty() {
            tracing::warn!(
                "dropping scenario with unreleased resources: {:?}",
                self.open,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::StepError;

    use super::*;

    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    enum Res {
        Session,
        Interface,
        Ping,
        Pin(u8),
    }

    impl Rank for Res {
        fn rank(&self) -> u8 {
            match self {
                Self::Ping => 0,
                Self::Interface => 1,
                Self::Session => 2,
                Self::Pin(_) => 3,
            }
        }
    }

    #[test]
    fn unwinds_in_reverse_order() {
        let mut td = Teardown::new();
        td.acquire(Res::Session);
        td.acquire(Res::Interface);
        td.acquire(Res::Ping);

        let mut closed = Vec::new();
        td.unwind(|r| {
            closed.push(r);
            Ok(())
        });

        assert_eq!(closed, [Res::Ping, Res::Interface, Res::Session]);
        assert!(td.is_empty());
    }

    #[test]
    fn unwinds_by_rank_then_reverse_order() {
        let mut td = Teardown::new();
        td.acquire(Res::Pin(1));
        td.acquire(Res::Session);
        td.acquire(Res::Ping);
        td.acquire(Res::Pin(2));
        td.acquire(Res::Interface);

        let mut closed = Vec::new();
        td.unwind(|r| {
            closed.push(r);
            Ok(())
        });

        assert_eq!(
            closed,
            [Res::Ping, Res::Interface, Res::Session, Res::Pin(2), Res::Pin(1)],
        );
        assert!(td.is_empty());
    }

    #[test]
    fn failures_do_not_stop_unwinding() {
        let mut td = Teardown::new();
        td.acquire(Res::Session);
        td.acquire(Res::Interface);

        let mut closed = Vec::new();
        td.unwind(|r| {
            closed.push(r);
            if r == Res::Interface {
                Err(StepError::NotConnected("CAPI card"))
            } else {
                Ok(())
            }
        });

        assert_eq!(closed, [Res::Interface, Res::Session]);
        assert!(td.is_empty());
    }

    #[test]
    fn acquire_is_idempotent() {
        let mut td = Teardown::new();
        td.acquire(Res::Session);
        td.acquire(Res::Interface);
        td.acquire(Res::Session);

        assert_eq!(td.iter().collect::<Vec<_>>(), [Res::Session, Res::Interface]);

        assert!(td.release(Res::Session));
        assert!(!td.release(Res::Session));
        assert!(!td.is_open(Res::Session));
        assert!(td.is_open(Res::Interface));

        td.forget();
    }
}
