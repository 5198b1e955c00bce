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

//! The build graph engine.
//!
//! This module provides an arena-backed directed graph (`base::Graph`) with
//! stable, type-safe indices (`NodeIndex`/`EdgeIndex`), a family of traits
//! for traversal and graph algorithms (`traits`), and a `Subgraph` view used
//! to build and traverse just the "ready set" of nodes during an incremental
//! build.

mod base;
mod index;
mod subgraph;
mod traits;

pub use self::base::{Graph, NodeTrait};
pub use self::index::{EdgeIndex, Index, IndexSet, NodeIndex};
pub use self::subgraph::Subgraph;
pub use self::traits::{
    Algo, Diff, Edges, GraphBase, Graphviz, Indexable, Neighbors, Nodes,
    TraversalState, VisitMap, VisitSet, Visitable,
};
