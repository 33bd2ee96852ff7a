// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! fieldsync-core: Shared library for the fieldsync offline engine
//!
//! This crate provides the data model shared by the field client and the
//! remote store: record categories, pending operations, record preparation,
//! connectivity status, drain outcomes and the wire protocol.

pub mod category;
pub mod connectivity;
pub mod error;
pub mod op;
pub mod protocol;
pub mod record;
pub mod sync;

pub use category::Category;
pub use connectivity::{ConnectivityStatus, TransportType};
pub use error::{Error, Result};
pub use op::{LocalId, Payload, PendingOperation, PendingOperationInput};
pub use sync::{Disposition, ItemError, LastSync, SyncResult, SyncStatus};
