// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Views give exclusive read-write access to scoped regions of an abstract
//! key-value store. Mutations are staged in memory and turned into a single
//! [`batch::Batch`] of write operations on flush, so that all the changes of
//! a logical transaction hit the store together or not at all.

pub mod batch;
pub mod context;
pub mod map_view;
pub mod memory;
pub mod register_view;
pub mod set_view;
pub mod views;
