// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared data types.

use thiserror::Error;

/// An error produced by checked counter arithmetic.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum ArithmeticError {
    #[error("Number overflow")]
    Overflow,
    #[error("Number underflow")]
    Underflow,
}
