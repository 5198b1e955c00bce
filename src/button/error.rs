// Copyright (c) 2017 Jason White
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in
// all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN
// THE SOFTWARE.

//! The crate-wide error type.
//!
//! Every fallible operation in this crate eventually bubbles up into this
//! [`Error`]. It wraps a `failure::Context<ErrorKind>` so that the chain of
//! causes (a missing file, a malformed rule, a cyclic graph) survives all
//! the way up to whoever prints it.

use std::fmt;
use std::io;

use failure::{Backtrace, Context, Fail};

pub use failure::ResultExt;

use crate::build_graph;
use crate::rules;

/// A broad classification of what went wrong. Used to pick a sensible
/// top-level message; the real detail lives in the cause chain.
#[derive(Clone, Eq, PartialEq, Debug, Fail)]
pub enum ErrorKind {
    #[fail(display = "I/O error")]
    Io,

    #[fail(display = "failed to load build rules")]
    Rules,

    #[fail(display = "failed to construct the build graph")]
    Graph,

    #[fail(display = "build directory is locked by another process")]
    BuildDirectoryLocked,

    #[fail(display = "build cancelled")]
    Cancelled,

    #[fail(display = "command timed out")]
    CommandTimedOut,

    #[fail(display = "output missing after task execution: {:?}", _0)]
    OutputMissing(std::path::PathBuf),

    #[fail(display = "{}", _0)]
    Other(String),
}

#[derive(Debug)]
pub struct Error {
    inner: Context<ErrorKind>,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.inner.get_context()
    }

    /// Walks the chain of causes, starting with this error itself.
    pub fn iter_chain(&self) -> impl Iterator<Item = &dyn Fail> {
        let mut next: Option<&dyn Fail> = Some(self);
        std::iter::from_fn(move || {
            let fail = next.take()?;
            next = fail.cause();
            Some(fail)
        })
    }
}

impl Fail for Error {
    fn cause(&self) -> Option<&dyn Fail> {
        self.inner.cause()
    }

    fn backtrace(&self) -> Option<&Backtrace> {
        self.inner.backtrace()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error {
            inner: Context::new(kind),
        }
    }
}

impl From<Context<ErrorKind>> for Error {
    fn from(inner: Context<ErrorKind>) -> Error {
        Error { inner }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        err.context(ErrorKind::Io).into()
    }
}

impl From<rules::Error> for Error {
    fn from(err: rules::Error) -> Error {
        err.context(ErrorKind::Rules).into()
    }
}

impl From<build_graph::Error> for Error {
    fn from(err: build_graph::Error) -> Error {
        err.context(ErrorKind::Graph).into()
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Error {
        Context::new(ErrorKind::Other(err.to_string())).into()
    }
}

/// Catches `.context("...")` call sites that pass a string literal instead
/// of a specific `ErrorKind`.
impl From<Context<&'static str>> for Error {
    fn from(ctx: Context<&'static str>) -> Error {
        let kind = ErrorKind::Other((*ctx.get_context()).to_string());
        Error { inner: ctx.context(kind) }
    }
}

/// Catches `.with_context(|_| format!("..."))` call sites.
impl From<Context<String>> for Error {
    fn from(ctx: Context<String>) -> Error {
        let kind = ErrorKind::Other(ctx.get_context().clone());
        Error { inner: ctx.context(kind) }
    }
}
