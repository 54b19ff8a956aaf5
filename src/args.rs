// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Parsing of quoted [step] arguments into typed values.
//!
//! Steps capture their arguments as raw [`String`]s and convert them here,
//! so malformed input fails the step before any controller is touched.
//!
//! [step]: https://cucumber.io/docs/gherkin/reference#steps

use std::{fmt, net::Ipv4Addr, str::FromStr, time::Duration};

use derive_more::with_trait::{Display, Error};
use itertools::Itertools as _;
use lazy_regex::regex_is_match;

use crate::error::{Result, StepError};

/// Parses an integer, rejecting values not fitting into `T`.
///
/// # Errors
///
/// If `raw` isn't a valid `T`.
pub fn int<T>(name: &'static str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| StepError::argument(name, raw, e))
}

/// Same as [`int()`], but an empty `raw` yields the `default`.
///
/// # Errors
///
/// If non-empty `raw` isn't a valid `T`.
pub fn int_or<T>(name: &'static str, raw: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if raw.trim().is_empty() {
        Ok(default)
    } else {
        int(name, raw)
    }
}

/// Parses `true` or `false`, case-insensitively.
///
/// # Errors
///
/// On anything else.
pub fn flag(name: &'static str, raw: &str) -> Result<bool> {
    match raw.trim() {
        s if s.eq_ignore_ascii_case("true") => Ok(true),
        s if s.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err(StepError::argument(name, raw, "expected `true` or `false`")),
    }
}

/// Same as [`flag()`], but an empty `raw` yields the `default`.
///
/// # Errors
///
/// If non-empty `raw` is neither `true` nor `false`.
pub fn flag_or(name: &'static str, raw: &str, default: bool) -> Result<bool> {
    if raw.trim().is_empty() {
        Ok(default)
    } else {
        flag(name, raw)
    }
}

/// Parses a dotted quad of exactly four components, each within `0..=255`.
///
/// # Errors
///
/// If there aren't four components, or any of them is out of range.
pub fn ipv4(name: &'static str, raw: &str) -> Result<Ipv4Addr> {
    let parts = raw.trim().split('.').collect::<Vec<_>>();
    let [a, b, c, d] = parts.as_slice() else {
        return Err(StepError::argument(
            name,
            raw,
            format!("expected 4 dot-separated components, got {}", parts.len()),
        ));
    };
    let octet = |s: &str| {
        s.parse::<u8>().map_err(|e| {
            StepError::argument(name, raw, format!("component `{s}`: {e}"))
        })
    };
    Ok(Ipv4Addr::new(octet(a)?, octet(b)?, octet(c)?, octet(d)?))
}

/// Parses a comma-separated list. Empty `raw` yields an empty list.
///
/// # Errors
///
/// If any item isn't a valid `T`.
pub fn list<T>(name: &'static str, raw: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|item| {
            item.trim().parse().map_err(|e| {
                StepError::argument(name, raw, format!("item `{item}`: {e}"))
            })
        })
        .collect()
}

/// Parses a non-negative number of seconds, fractions allowed.
///
/// # Errors
///
/// If `raw` isn't a finite non-negative number.
pub fn seconds(name: &'static str, raw: &str) -> Result<Duration> {
    let secs = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| StepError::argument(name, raw, e))?;
    Duration::try_from_secs_f64(secs)
        .map_err(|e| StepError::argument(name, raw, e))
}

/// Ensures `raw` isn't blank.
///
/// # Errors
///
/// If `raw` is empty or whitespace only.
pub fn non_empty<'s>(name: &'static str, raw: &'s str) -> Result<&'s str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Err(StepError::argument(name, raw, "must not be empty"))
    } else {
        Ok(trimmed)
    }
}

/// Parses any [`FromStr`] value, mapping its error into a [`StepError`].
///
/// # Errors
///
/// If `raw` isn't a valid `T`.
pub fn parse<T>(name: &'static str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim().parse().map_err(|e| StepError::argument(name, raw, e))
}

/// Hardware address of a network device.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Returns the raw bytes of this address.
    #[must_use]
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

/// Error of parsing a [`MacAddr`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("expected 6 colon-separated hex bytes")]
pub struct ParseMacError;

impl FromStr for MacAddr {
    type Err = ParseMacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !regex_is_match!(r"^[0-9A-Fa-f]{2}(?::[0-9A-Fa-f]{2}){5}$", s) {
            return Err(ParseMacError);
        }
        let mut octets = [0; 6];
        for (octet, part) in octets.iter_mut().zip(s.split(':')) {
            *octet = u8::from_str_radix(part, 16).map_err(|_| ParseMacError)?;
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}", self.0.iter().format(":"))
    }
}

/// Parses a [`MacAddr`].
///
/// # Errors
///
/// If `raw` isn't six colon-separated hex bytes.
pub fn mac(name: &'static str, raw: &str) -> Result<MacAddr> {
    parse(name, raw)
}
