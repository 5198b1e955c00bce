// Copyright (c) 2018 Jason White
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

use std::path::PathBuf;

use button::error::Error;
use button::logger::Console;
use structopt::StructOpt;

use crate::opts::GlobalOpts;
use crate::paths;

#[derive(StructOpt, Debug)]
pub struct Clean {
    /// Path to the build rules. Only used to locate the project root; only
    /// the build state is touched.
    #[structopt(long = "rules", parse(from_os_str))]
    rules: Option<PathBuf>,

    /// Don't delete anything, just print what would happen.
    #[structopt(long = "dry-run")]
    dryrun: bool,

    /// Number of worker threads to use for deleting resources.
    #[structopt(long = "jobs", short = "j", default_value = "0")]
    jobs: usize,

    /// Print each resource as it's deleted.
    #[structopt(long = "verbose", short = "v")]
    verbose: bool,
}

impl Clean {
    pub fn main(&self, global: &GlobalOpts) -> Result<(), Error> {
        let rules_path = paths::rules_path(&self.rules);
        let root = paths::root_of(&rules_path);
        let state_path = paths::state_path(&root);

        let threads = if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        };

        let logger = Console::new(
            self.verbose,
            Default::default(),
            global.color.into(),
        );

        button::Build::new(&root, &state_path)
            .clean(self.dryrun, threads, &logger)
    }
}
