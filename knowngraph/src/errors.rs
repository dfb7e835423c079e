// Copyright 2019 Facebook, Inc.
//
// This software may be used and distributed according to the terms of the
// GNU General Public License version 2 or any later version.

use failure::Fail;

pub use failure::Error;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Fail)]
pub enum ErrorKind {
    /// A query named a revision the graph has never seen. Keys are rendered
    /// with `Debug` since they are opaque to the graph.
    #[fail(display = "revision {} is not in the graph", _0)]
    UnknownKey(String),

    /// The ancestry contains a cycle, so no complete ordering exists.
    /// Carries the keys of every node distance propagation left unfinished:
    /// the cycle members and everything that descends from them.
    #[fail(display = "revision ancestry contains a cycle involving {:?}", _0)]
    Cycle(Vec<String>),
}
