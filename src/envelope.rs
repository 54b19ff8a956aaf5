// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Uniform result of every controller and broker operation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StepError};

/// Status, human-readable description and typed payload of an operation.
///
/// Status `0` means success. Broker responses carry the status under the
/// `result` key.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Envelope<T = ()> {
    /// Status code, `0` on success.
    #[serde(rename = "result")]
    pub status: i32,

    /// Description of what happened.
    #[serde(default)]
    pub description: String,

    /// Payload of the operation.
    #[serde(default, bound(deserialize = "T: Deserialize<'de> + Default"))]
    pub data: T,
}

impl<T> Envelope<T> {
    /// Creates a successful [`Envelope`].
    #[must_use]
    pub fn ok(description: impl Into<String>, data: T) -> Self {
        Self { status: 0, description: description.into(), data }
    }

    /// Creates an [`Envelope`] with the given `status` and an empty payload.
    #[must_use]
    pub fn failed(status: i32, description: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self { status, description: description.into(), data: T::default() }
    }

    /// Indicates whether the operation succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status == 0
    }

    /// Maps the payload, keeping status and description.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            status: self.status,
            description: self.description,
            data: f(self.data),
        }
    }

    /// Logs the description of this `operation` and unwraps its payload.
    ///
    /// # Errors
    ///
    /// With [`StepError::Operation`] if the status isn't `0`.
    pub fn check(self, operation: &'static str) -> Result<T> {
        if self.is_success() {
            tracing::info!("{operation}: {}", self.description);
            Ok(self.data)
        } else {
            tracing::error!(
                status = self.status,
                "{operation}: {}",
                self.description,
            );
            Err(StepError::Operation {
                operation,
                status: self.status,
                description: self.description,
            })
        }
    }
}
