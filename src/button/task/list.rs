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
use std::io;
use std::ops;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::any::Any;
use super::traits::{Detected, Task};

use crate::error::Error;
use crate::res;

/// A list of tasks executed in sequence. This is the root task for all tasks.
#[derive(Ord, PartialOrd, Eq, PartialEq, Hash, Clone)]
pub struct List {
    list: Vec<Any>,

    /// Union of all the pools of the tasks in `list`, computed once up
    /// front so that `pools()` can hand out a borrow.
    pools: Vec<String>,
}

impl List {
    pub fn new(list: Vec<Any>) -> List {
        let pools = union_pools(&list);
        List { list, pools }
    }

    /// Adds additional pool names on top of the ones inherited from the
    /// individual tasks, e.g., a pool declared on the owning rule rather
    /// than on any one task.
    pub fn merge_pools(&mut self, extra: &[String]) {
        for pool in extra {
            if !self.pools.iter().any(|p| p == pool) {
                self.pools.push(pool.clone());
            }
        }
    }
}

fn union_pools(list: &[Any]) -> Vec<String> {
    let mut pools: Vec<String> = Vec::new();

    for task in list {
        for pool in task.pools() {
            if !pools.iter().any(|p| p == pool) {
                pools.push(pool.clone());
            }
        }
    }

    pools
}

impl Serialize for List {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.list.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for List {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Deserialize::deserialize(deserializer).map(|v: Vec<Any>| List::new(v))
    }
}

impl From<Vec<Any>> for List {
    fn from(v: Vec<Any>) -> Self {
        List::new(v)
    }
}

impl ops::Deref for List {
    type Target = Vec<Any>;
    fn deref(&self) -> &Vec<Any> {
        &self.list
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list.len() == 1 {
            write!(f, "{}", self.list[0])
        } else {
            write!(f, "list of {} tasks", self.list.len())
        }
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl Task for List {
    fn execute(
        &self,
        root: &Path,
        log: &mut dyn io::Write,
        cancel: &AtomicBool,
    ) -> Result<Detected, Error> {
        let mut detected = Detected::new();

        for task in &self.list {
            detected.add(task.execute(root, log, cancel)?);
        }

        Ok(detected)
    }

    fn known_inputs(&self, resources: &mut res::Set) {
        for task in &self.list {
            task.known_inputs(resources);
        }
    }

    fn known_outputs(&self, resources: &mut res::Set) {
        for task in &self.list {
            task.known_outputs(resources);
        }
    }

    fn pools(&self) -> &[String] {
        &self.pools
    }
}
