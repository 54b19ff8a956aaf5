// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors failing a [step].
//!
//! Every step returns a [`Result`], and [`cucumber`] reports its [`Err`] as
//! a failed step, rendering the [`StepError`] [`Display`] output.
//!
//! [step]: https://cucumber.io/docs/gherkin/reference#steps

use std::{fmt, io, time::Duration};

use derive_more::with_trait::{Display, Error, From};

use crate::{broker::BrokerError, connector::ConnectError};

/// Alias for a [`std::result::Result`] with the error type [`StepError`].
pub type Result<T, E = StepError> = std::result::Result<T, E>;

/// Reason of a failed step.
#[derive(Debug, Display, Error, From)]
pub enum StepError {
    /// Step argument is malformed or out of range.
    #[display("invalid {name} `{value}`: {reason}")]
    Argument {
        /// Name of the argument.
        name: &'static str,

        /// Raw text of the argument.
        #[error(not(source))]
        value: String,

        /// What is wrong with it.
        reason: String,
    },

    /// Controller reported a non-zero status.
    #[display("{operation} failed with status {status}: {description}")]
    Operation {
        /// Name of the failed operation.
        operation: &'static str,

        /// Non-zero status code.
        status: i32,

        /// Description reported along with the status.
        #[error(not(source))]
        description: String,
    },

    /// Controller returned success but no payload.
    #[display("{_0} returned no data")]
    Empty(#[error(not(source))] &'static str),

    /// Required controller hasn't been connected.
    #[display("{_0} is not connected")]
    NotConnected(#[error(not(source))] &'static str),

    /// Some earlier step hasn't been run, or a setting is absent.
    #[display("{_0}")]
    Precondition(#[error(not(source))] String),

    /// Observed value differs from the expected one.
    #[display("{what}: expected `{expected}`, got `{actual}`")]
    Mismatch {
        /// What has been compared.
        what: &'static str,

        /// Expected value.
        #[error(not(source))]
        expected: String,

        /// Actual value.
        actual: String,
    },

    /// Request frame carried a non-zero reply status.
    #[display("reply to service {service} carries status {status}")]
    Reply {
        /// Service the reply belongs to.
        service: u32,

        /// Non-zero reply status.
        status: u32,
    },

    /// Bounded poll or retry loop gave up.
    #[display("gave up on {what} after {after:?}")]
    Timeout {
        /// What has been waited for.
        #[error(not(source))]
        what: String,

        /// Elapsed time.
        after: Duration,
    },

    /// Controller couldn't be created.
    #[display("{_0}")]
    #[from]
    Connect(ConnectError),

    /// Reservation broker failure.
    #[display("reservation broker: {_0}")]
    #[from]
    Broker(BrokerError),

    /// Local I/O failure.
    #[display("I/O error: {_0}")]
    #[from]
    Io(io::Error),

    /// Step failed on purpose.
    #[display("forced failure")]
    Forced,
}

impl StepError {
    /// Creates a [`StepError::Argument`].
    #[must_use]
    pub fn argument(
        name: &'static str,
        value: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        Self::Argument { name, value: value.into(), reason: reason.to_string() }
    }

    /// Creates a [`StepError::Precondition`] about a value that only an
    /// earlier step produces.
    #[must_use]
    pub fn missing(what: &str, step: &str) -> Self {
        Self::Precondition(format!("{what} is unknown, run `{step}` first"))
    }

    /// Creates a [`StepError::Precondition`] about an absent setting.
    #[must_use]
    pub fn unset(setting: &str) -> Self {
        Self::Precondition(format!("`{setting}` is not configured"))
    }
}

/// Fails with a [`StepError::Mismatch`] unless `expected == actual`.
///
/// # Errors
///
/// If the values differ.
pub fn ensure_eq<T>(what: &'static str, expected: T, actual: T) -> Result<()>
where
    T: PartialEq + fmt::Display,
{
    if expected == actual {
        Ok(())
    } else {
        Err(StepError::Mismatch {
            what,
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}
