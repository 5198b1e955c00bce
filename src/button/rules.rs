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

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::slice::{Iter, IterMut};

use serde::{Deserialize, Serialize};
use serde_json as json;

use crate::res;
use crate::task::{self, Task};

#[derive(Fail, Debug)]
pub enum Error {
    #[fail(display = "Failed reading rules: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "Failed parsing rules: {}", _0)]
    Parse(#[cause] json::error::Error),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<json::error::Error> for Error {
    fn from(err: json::error::Error) -> Error {
        Error::Parse(err)
    }
}

fn default_multiplex() -> bool {
    true
}

/// A rule in the build description.
///
/// A rule declares a single transformer instantiation: a sequence of tasks
/// that reads some set of input resources and produces some set of output
/// resources. Tags classify inputs beyond plain data dependencies: an
/// `aux_input` is consulted for staleness but is not itself consumed the way
/// a primary input is, and an `order_only` dependency only constrains
/// ordering -- it never makes the rule's outputs stale on its own.
///
/// `input_tags`/`output_tags` are a second, independent classification used
/// only to order rule application: a rule whose `output_tags` intersect
/// another rule's `input_tags` must be applied first. Which concrete paths a
/// rule actually reads or writes is always `inputs`/`aux_inputs`/
/// `order_only`/`outputs`; tags never drive path resolution here, only
/// ordering (see `build_graph::rule_order`).
///
/// `multiplex` controls whether a rule with more than one primary input is
/// instantiated as a single transformer consuming all of them (the
/// default), or as one transformer per primary input, each paired
/// positionally with the correspondingly-indexed output.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Rule {
    /// Primary inputs to the task. Changing any of these makes the rule's
    /// outputs stale.
    pub inputs: res::Set,

    /// Inputs that are consulted but are not the "main" subject of the rule
    /// (e.g., a compiler binary, a shared header). Still participates in
    /// staleness checks.
    #[serde(default)]
    pub aux_inputs: res::Set,

    /// Dependencies that must exist before this rule runs but do not, on
    /// their own, make this rule's outputs stale if they change.
    #[serde(default)]
    pub order_only: res::Set,

    /// Outputs from the task.
    pub outputs: res::Set,

    /// The sequence of tasks to execute.
    pub tasks: task::List,

    /// Named concurrency pools this rule's tasks belong to, in addition to
    /// any pools declared on the individual tasks themselves.
    #[serde(default)]
    pub pools: Vec<String>,

    /// Name of the product this rule belongs to, if any. Used to check that
    /// every product referenced by name actually has rules.
    #[serde(default)]
    pub product: Option<String>,

    /// File-tags this rule consumes, for rule-graph ordering purposes only.
    #[serde(default)]
    pub input_tags: BTreeSet<String>,

    /// File-tags this rule's outputs carry, for rule-graph ordering
    /// purposes only.
    #[serde(default)]
    pub output_tags: BTreeSet<String>,

    /// `true` (the default): one transformer consumes every primary input.
    /// `false`: one transformer per primary input, each paired
    /// positionally with `outputs`; `outputs.len()` must then equal
    /// `inputs.len()`.
    #[serde(default = "default_multiplex")]
    pub multiplex: bool,
}

/// A named group of rules, declaring the file-tags its build is ultimately
/// responsible for and which other products it depends on.
///
/// Optional: a product referenced only via `Rule::product` (with no
/// corresponding `ProductDecl`) gets an empty `target_tags`/`dependencies`,
/// which means every one of its rules is applied unconditionally -- the
/// file-tag-driven reachability restriction described in spec.md #4.1 only
/// kicks in once a product actually declares target tags.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct ProductDecl {
    pub name: String,

    #[serde(default)]
    pub target_tags: BTreeSet<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// The on-disk shape of a rules document. A bare array of rules (the
/// original, and still most common, shape) and the richer object form that
/// also declares products are both accepted.
#[derive(Deserialize)]
#[serde(untagged)]
enum RulesDoc {
    Bare(Vec<Rule>),
    Full {
        rules: Vec<Rule>,
        #[serde(default)]
        products: Vec<ProductDecl>,
    },
}

impl RulesDoc {
    fn into_parts(self) -> (Vec<Rule>, Vec<ProductDecl>) {
        match self {
            RulesDoc::Bare(rules) => (rules, Vec::new()),
            RulesDoc::Full { rules, products } => (rules, products),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Rules {
    pub rules: Vec<Rule>,

    /// Declared products, naming their target file-tags and their
    /// dependencies on other products. A product named only through
    /// `Rule::product` with no entry here is unrestricted (see
    /// `ProductDecl`'s docs).
    pub products: Vec<ProductDecl>,
}

impl Rules {
    pub fn new(rules: Vec<Rule>) -> Rules {
        Self::with_products(rules, Vec::new())
    }

    pub fn with_products(mut rules: Vec<Rule>, products: Vec<ProductDecl>) -> Rules {
        // Add known inputs and outputs so the user doesn't have to.
        for r in rules.iter_mut() {
            r.tasks.known_inputs(&mut r.inputs);
            r.tasks.known_outputs(&mut r.outputs);
            r.tasks.merge_pools(&r.pools);
        }

        log::debug!("loaded {} rule(s), {} product(s)", rules.len(), products.len());

        Rules { rules, products }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Rules, Error> {
        let f = fs::File::open(path)?;
        Self::from_reader(io::BufReader::new(f))
    }

    pub fn from_reader<R>(reader: R) -> Result<Rules, Error>
    where
        R: io::Read,
    {
        let doc: RulesDoc = json::from_reader(reader)?;
        let (rules, products) = doc.into_parts();
        Ok(Self::with_products(rules, products))
    }

    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Rules, Error> {
        let doc: RulesDoc = json::from_str(s)?;
        let (rules, products) = doc.into_parts();
        Ok(Self::with_products(rules, products))
    }

    pub fn iter(&self) -> Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, Rule> {
        self.rules.iter_mut()
    }

    /// Names of the products referenced by at least one rule.
    pub fn product_names(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter_map(|r| r.product.as_ref().map(String::as_str))
    }
}

impl IntoIterator for Rules {
    type Item = Rule;
    type IntoIter = ::std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.into_iter()
    }
}

impl fmt::Display for Rules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rule(s)", self.rules.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::res::File;
    use crate::task::Command;
    use std::path::PathBuf;

    #[test]
    fn test_loading() {
        let data = r#"[{
            "inputs": ["foo.c", "foo.h"],
            "outputs": ["foo.o"],
            "tasks": [
                {
                    "type": "command",
                    "program": "gcc",
                    "args": ["foo.c"]
                }
            ]
        }]"#;

        let rules = Rules::from_str(&data).unwrap();

        let inputs = vec![File::from("foo.c").into(), File::from("foo.h").into()];

        let outputs = vec![File::from("foo.o").into()];
        let tasks =
            vec![Command::new(PathBuf::from("gcc"), vec!["foo.c".to_owned()]).into()];

        assert_eq!(
            rules,
            Rules::new(vec![Rule {
                inputs: inputs.into_iter().collect(),
                aux_inputs: res::Set::new(),
                order_only: res::Set::new(),
                outputs: outputs.into_iter().collect(),
                tasks: tasks.into(),
                pools: Vec::new(),
                product: None,
                input_tags: BTreeSet::new(),
                output_tags: BTreeSet::new(),
                multiplex: true,
            }])
        );
    }

    #[test]
    fn test_loading_with_products() {
        let data = r#"{
            "rules": [{
                "inputs": ["foo.cpp"],
                "outputs": ["foo.o"],
                "tasks": [
                    {"type": "command", "program": "gcc", "args": ["foo.cpp"]}
                ],
                "product": "app",
                "output_tags": ["obj"]
            }],
            "products": [
                {"name": "app", "target_tags": ["obj"]}
            ]
        }"#;

        let rules = Rules::from_str(data).unwrap();
        assert_eq!(rules.products.len(), 1);
        assert_eq!(rules.products[0].name, "app");
        assert!(rules.products[0].target_tags.contains("obj"));
        assert_eq!(rules.rules[0].output_tags, {
            let mut tags = BTreeSet::new();
            tags.insert("obj".to_string());
            tags
        });
    }
}
