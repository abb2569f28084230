// Copyright 2025 the Pentrace Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by the R-tree and the point grid.

use thiserror::Error;

/// Errors raised synchronously by index operations.
///
/// A call that returns an error has not mutated the index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A rectangle or point is malformed: `min > max` on an axis, or a
    /// non-finite coordinate.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),

    /// A constructor parameter is out of range (cell size, fanout).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),

    /// A query parameter is out of range (negative radius).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The identifier is already stored in an index that requires unique ids.
    #[error("identifier is already present in the index")]
    DuplicateId,
}

/// Result alias for index operations.
pub type Result<T, E = IndexError> = core::result::Result<T, E>;
