// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! OPC UA client.

use std::{fmt, str::FromStr};

use derive_more::with_trait::{Display, Error};

use crate::Envelope;

/// Handle of a resolved node.
#[derive(Clone, Debug, Display, Eq, Hash, PartialEq)]
pub struct Node(pub String);

/// Typed value of a node.
#[derive(Clone, Debug, Display, PartialEq)]
pub enum Variant {
    #[display("{_0:?}")]
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Type of a [`Variant`] written by a step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VariantType {
    Str,
    Int,
    Float,
    Bool,
}

impl FromStr for VariantType {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "str" => Ok(Self::Str),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "bool" => Ok(Self::Bool),
            _ => Err("expected `str`, `int`, `float` or `bool`"),
        }
    }
}

/// Error of converting text into a [`Variant`].
#[derive(Clone, Debug, Display, Error)]
#[display("`{value}` is not a valid {ty:?}")]
pub struct VariantError {
    #[error(not(source))]
    value: String,
    ty: VariantType,
}

impl VariantType {
    /// Converts the `raw` text into a [`Variant`] of this type.
    ///
    /// # Errors
    ///
    /// If `raw` can't represent this type.
    pub fn parse(self, raw: &str) -> Result<Variant, VariantError> {
        let err = || VariantError { value: raw.to_owned(), ty: self };
        Ok(match self {
            Self::Str => Variant::Str(raw.to_owned()),
            Self::Int => Variant::Int(raw.trim().parse().map_err(|_| err())?),
            Self::Float => {
                Variant::Float(raw.trim().parse().map_err(|_| err())?)
            }
            Self::Bool => match raw.trim() {
                s if s.eq_ignore_ascii_case("true") => Variant::Bool(true),
                s if s.eq_ignore_ascii_case("false") => Variant::Bool(false),
                _ => return Err(err()),
            },
        })
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        })
    }
}

/// Session with an OPC UA server.
pub trait OpcUaClient {
    /// Resolves a node by its `id`, like `ns=2;s=Device.Status`.
    fn node(&mut self, id: &str) -> Envelope<Option<Node>>;

    fn browse_name(&mut self, node: &Node) -> Envelope<String>;
    fn value(&mut self, node: &Node) -> Envelope<Option<Variant>>;
    fn set_value(&mut self, node: &Node, value: &Variant) -> Envelope;
}
