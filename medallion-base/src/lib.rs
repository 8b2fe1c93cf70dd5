// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Base types shared by the Medallion asset registry: opaque participant
//! identities, asset numbers, and a few helpers with no dependency on the
//! storage or execution layers.

pub mod data_types;
pub mod ensure;
pub mod identifiers;
