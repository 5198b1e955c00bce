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

use std::fmt;
use std::hash::Hash;
use std::io;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use crate::error::Error;
use serde::Serialize;

use crate::res;

/// The resources a task actually touched while it ran, as opposed to the
/// ones it declared up front via `known_inputs`/`known_outputs`.
///
/// Ideally the known (explicit) inputs and outputs are a subset of the
/// detected (implicit) ones. Discrepancies are recorded as implicit edges in
/// the build graph so that a later build can pick up dependencies the build
/// description didn't mention.
#[derive(Debug, Default, Clone)]
pub struct Detected {
    pub inputs: res::Set,
    pub outputs: res::Set,
}

impl Detected {
    pub fn new() -> Detected {
        Detected::default()
    }

    pub fn add_input(&mut self, resource: res::Any) {
        self.inputs.insert(resource);
    }

    pub fn add_output(&mut self, resource: res::Any) {
        self.outputs.insert(resource);
    }

    /// Merges another task's detected resources into this one.
    pub fn add(&mut self, other: Detected) {
        self.inputs.extend(other.inputs);
        self.outputs.extend(other.outputs);
    }
}

/// A task is a routine to be executed that produces resources as outputs.
///
/// Most tasks will be of the `Command` type. That is, the execution of a
/// process with arguments.
///
/// Since a task is anything that can be executed, we can have other built-in
/// tasks to aid with cross-platform compatibility. For example:
///  * Copying a file or directory.
///  * Downloading a file.
///  * Creating a directory.
pub trait Task:
    Serialize + Ord + PartialOrd + Eq + PartialEq + Hash + fmt::Display
{
    /// Executes the task. The result of a task are the resources it used and
    /// the resources it output. These are its *implicit* inputs and outputs.
    /// Ideally, the *explicit* inputs and outputs are a subset of the
    /// *implicit* inputs and outputs.
    ///
    /// `cancel` is shared with the rest of the build: a task that spawns a
    /// child process should poll it and kill the child if it becomes `true`
    /// rather than waiting for it to exit on its own.
    fn execute(
        &self,
        root: &Path,
        log: &mut dyn io::Write,
        cancel: &AtomicBool,
    ) -> Result<Detected, Error>;

    /// Inputs the task knows about *a priori*. It must calculate these by
    /// *only* looking at the task parameters. It should not do anything fancy
    /// like running an external process to determine these.
    ///
    /// If the task would delete a resource, it should remove it from the set of
    /// inputs. It may be the case that one task adds an input, but a later task
    /// deletes it. In such a case, that file is effectively a temporary file
    /// and can be ignored.
    fn known_inputs(&self, _resources: &mut res::Set) {}

    /// Outputs the task knows about *a priori*. It must calculate these by
    /// *only* looking at the task parameters. It cannot do anything fancy like
    /// running an external process to determine these.
    fn known_outputs(&self, _resources: &mut res::Set) {}

    /// Named concurrency pools this task belongs to. The executor will not
    /// run more than the configured limit of tasks in the same pool at
    /// once. Empty by default, i.e., the task is unconstrained beyond the
    /// global job limit.
    fn pools(&self) -> &[String] {
        &[]
    }

    /// Full command line representation of this task, ignoring any
    /// human-friendly `display` override. Used by `EchoMode::CommandLine`.
    /// Defaults to whatever `Display` shows.
    fn command_line(&self) -> String {
        self.to_string()
    }
}
