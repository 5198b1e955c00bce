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

mod console;
mod indicatif_bar;
mod traits;

pub use self::console::Console;
pub use self::indicatif_bar::IndicatifBar;
pub use self::traits::{EchoMode, Error, EventLogger, TaskLogger};

// TODO: Add additional loggers:
//
//  - dump
//
//    A logger that records everything, including the time at which each event
//    is triggered. This could be useful for "replaying" a build through
//    different loggers later.
//
//  - web
//
//    A logger that sends all of the events to a web page for display. This
//    could be useful for seeing the output for long running tasks as they
//    occur. It could also display a Gantt chart of the build tasks.
