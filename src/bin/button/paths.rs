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

//! Well-known paths for the build system.
//!
//! All paths are relative to the project root (i.e., the directory that
//! `button.json` lives in).
//!
//! The button library doesn't hard code these paths anywhere -- it's up to
//! the command line front end to pick them.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use button::util::PathExt;

/// Name of the rules file.
pub const RULES: &str = "button.json";

/// Name of the directory where internal state can be stored.
pub const DIR: &str = ".button";

/// Name of the file where build state is saved. Lives inside `DIR`.
pub const STATE: &str = ".button/state";

/// Returns the path to the rules, starting at the given directory and
/// searching all parent directories. Returns `None` if it cannot be found.
pub fn find_rules_path(start: &Path) -> Option<PathBuf> {
    let path = start.join(RULES);

    if path.is_file() {
        Some(
            path.relative_from(&env::current_dir().unwrap())
                .unwrap_or(path),
        )
    } else {
        match start.parent() {
            Some(parent) => find_rules_path(parent),
            None => None,
        }
    }
}

/// Resolves the path to the rules file, falling back to a parent-directory
/// search when the user didn't pass one explicitly.
pub fn rules_path(path: &Option<PathBuf>) -> PathBuf {
    match path {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = env::current_dir().unwrap();
            match find_rules_path(&cwd) {
                Some(path) => path,

                // Not found. Assume it lives in the current directory even
                // though it doesn't -- the error gets reported when we try
                // to load it.
                None => PathBuf::from(RULES),
            }
        }
    }
}

/// Returns the project root given the resolved path to the rules file.
pub fn root_of(rules: &Path) -> PathBuf {
    rules
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Path to the build state file for a given project root.
pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE)
}

/// Initializes the `.button` directory. Does nothing if it already exists.
pub fn init(root: &Path) -> Result<(), io::Error> {
    fs::create_dir_all(root.join(DIR))
}
