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

use std::collections::HashMap;
use std::path::PathBuf;

use button::error::{Error, ErrorKind};
use button::logger::Console;
use button::{BuildOptions, Rules};
use structopt::StructOpt;

use crate::opts::{Echo, GlobalOpts};
use crate::paths;

#[derive(StructOpt, Debug)]
pub struct Build {
    /// Path to the build rules. If not given, searches the current directory
    /// and its parents for `button.json`.
    #[structopt(long = "rules", parse(from_os_str))]
    rules: Option<PathBuf>,

    /// Don't execute anything, just print what would happen.
    #[structopt(long = "dry-run")]
    dryrun: bool,

    /// Number of worker threads to use. Defaults to the number of logical
    /// CPUs.
    #[structopt(long = "jobs", short = "j", default_value = "0")]
    jobs: usize,

    /// Keep building independent tasks after one fails instead of stopping
    /// at the first failure.
    #[structopt(long = "keep-going", short = "k")]
    keep_going: bool,

    /// Limits concurrency within named pools, e.g.
    /// `--job-limits links:1,net:4`.
    #[structopt(long = "job-limits", use_delimiter = true)]
    job_limits: Vec<String>,

    /// Verify that every output a task claims to produce actually exists
    /// once it finishes.
    #[structopt(long = "check-outputs")]
    check_outputs: bool,

    /// Don't trust previously recorded checksums; probe every resource's
    /// state from scratch.
    #[structopt(long = "force-probe-execution")]
    force_probe: bool,

    /// How much of each task to print before running it.
    #[structopt(
        long = "command-echo-mode",
        default_value = "description",
        possible_values = &Echo::variants(),
    )]
    echo: Echo,

    /// Print each task's duration after it finishes.
    #[structopt(long = "verbose", short = "v")]
    verbose: bool,
}

impl Build {
    pub fn main(&self, global: &GlobalOpts) -> Result<(), Error> {
        let rules_path = paths::rules_path(&self.rules);
        let root = paths::root_of(&rules_path);

        paths::init(&root)?;

        let state_path = paths::state_path(&root);

        let rules = Rules::from_path(&rules_path)?;

        let threads = if self.jobs == 0 {
            num_cpus::get()
        } else {
            self.jobs
        };

        let job_limits = parse_job_limits(&self.job_limits)?;

        let options = BuildOptions {
            dryrun: self.dryrun,
            threads,
            keep_going: self.keep_going,
            job_limits,
            check_outputs: self.check_outputs,
            force_probe: self.force_probe,
            echo: self.echo.0,
        };

        let mut logger = Console::new(self.verbose, options.echo, global.color.into());

        button::Build::new(&root, &state_path).build(rules, &options, &mut logger)
    }
}

/// Parses `pool:limit` pairs, e.g. from `--job-limits links:1,net:4`.
fn parse_job_limits(entries: &[String]) -> Result<HashMap<String, usize>, Error> {
    let mut limits = HashMap::new();

    for entry in entries {
        let mut parts = entry.splitn(2, ':');
        let name = parts.next().unwrap_or("");
        let limit = parts.next();

        let limit: usize = limit.and_then(|s| s.parse().ok()).ok_or_else(|| {
            Error::from(ErrorKind::Other(format!(
                "invalid --job-limits entry {:?}, expected NAME:LIMIT",
                entry
            )))
        })?;

        limits.insert(name.to_string(), limit);
    }

    Ok(limits)
}
