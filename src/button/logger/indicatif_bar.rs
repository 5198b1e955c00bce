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

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use console::style;
use humantime::format_duration;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use crate::res;
use crate::task::{self, Detected, Task};

use crate::error::Error;

use super::traits::{EchoMode, EventLogger, LogResult, TaskLogger};

fn style_idle() -> ProgressStyle {
    ProgressStyle::default_spinner().template("{prefix:.bold.dim} idle")
}

fn style_running() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{prefix:.bold.dim} {elapsed} {wide_msg}")
}

/// Width, in digits, of the largest thread index. Used to line up the
/// `[N]` prefixes of each spinner.
fn num_width(mut max_value: usize) -> usize {
    let mut count = 1;

    while max_value >= 10 {
        max_value /= 10;
        count += 1;
    }

    count
}

/// Buffers a task's output until it finishes, same as `ConsoleTask`, but
/// prints it above the spinner for its thread via `ProgressBar::println` so
/// it never gets interleaved with the spinner's own redraws.
pub struct IndicatifTask {
    verbose: bool,
    bar: ProgressBar,
    name: String,
    buf: Vec<u8>,
    start_time: Instant,
}

impl IndicatifTask {
    fn new(
        verbose: bool,
        echo: EchoMode,
        bar: ProgressBar,
        task: &task::Any,
    ) -> IndicatifTask {
        let name = match echo {
            EchoMode::CommandLine => task.command_line(),
            _ => task.to_string(),
        };

        bar.reset_elapsed();
        bar.set_style(style_running());

        if echo != EchoMode::Silent {
            bar.set_message(&name);
        }

        IndicatifTask {
            verbose,
            bar,
            name,
            buf: Vec::new(),
            start_time: Instant::now(),
        }
    }
}

impl io::Write for IndicatifTask {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.write(buf)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.buf.write_all(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TaskLogger for IndicatifTask {
    fn finish(self, result: &Result<Detected, Error>) -> LogResult<()> {
        let IndicatifTask {
            verbose,
            bar,
            name,
            mut buf,
            start_time,
        } = self;

        let duration = format_duration(start_time.elapsed());

        if verbose && !buf.is_empty() && !buf.ends_with(b"\n") {
            buf.push(b'\n');
        }

        if let Err(err) = result {
            let _ = writeln!(
                &mut buf,
                "{} after {}: {}",
                style("Task failed").bold().red(),
                style(duration).cyan(),
                err,
            );

            bar.println(format!(
                "> {}\n{}",
                style(&name).bold().red(),
                String::from_utf8_lossy(&buf),
            ));
        } else if verbose && !buf.is_empty() {
            bar.println(format!(
                "> {} ({})\n{}",
                style(&name).bold(),
                style(duration).cyan(),
                String::from_utf8_lossy(&buf),
            ));
        }

        bar.set_style(style_idle());

        Ok(())
    }
}

/// Per-build state: one spinner per worker thread plus an overall progress
/// bar tracking completed graph nodes. Lives from `begin_build` until
/// `end_build` takes it out again.
struct Inner {
    bars: Vec<ProgressBar>,
    overall: ProgressBar,
    tick_thread: Option<JoinHandle<()>>,
    join_thread: Option<JoinHandle<Result<(), io::Error>>>,
}

impl Inner {
    fn new(threads: usize) -> Inner {
        let multi = MultiProgress::new();

        let overall = multi.add(ProgressBar::new(0));
        overall.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len}")
                .progress_chars("#>-"),
        );

        let width = num_width(threads);
        let mut bars = Vec::with_capacity(threads);

        for i in 0..threads {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(style_idle());
            bar.set_prefix(&format!("[{:>width$}]", i + 1, width = width));
            bars.push(bar);
        }

        let tick_bars = bars.clone();
        let tick_thread = thread::spawn(move || loop {
            thread::sleep(Duration::from_millis(200));

            if tick_bars.iter().all(|b| b.is_finished()) {
                return;
            }

            for bar in &tick_bars {
                bar.tick();
            }
        });

        let join_thread = thread::spawn(move || multi.join_and_clear());

        Inner {
            bars,
            overall,
            tick_thread: Some(tick_thread),
            join_thread: Some(join_thread),
        }
    }

    fn bar(&self, thread: usize) -> &ProgressBar {
        &self.bars[thread % self.bars.len()]
    }

    fn finish(&mut self) {
        for bar in &self.bars {
            bar.finish_and_clear();
        }

        self.overall.finish_and_clear();

        if let Some(t) = self.tick_thread.take() {
            let _ = t.join();
        }

        if let Some(t) = self.join_thread.take() {
            let _ = t.join();
        }
    }
}

/// Reports progress with a spinner per worker thread plus an overall bar of
/// completed graph nodes, in the style of a typical build tool's live
/// terminal output.
///
/// Unlike `Console`, this shows what's in flight without waiting for the
/// whole build to finish.
pub struct IndicatifBar {
    verbose: bool,
    echo: EchoMode,
    inner: Mutex<Option<Inner>>,
    start_time: Instant,
}

impl IndicatifBar {
    pub fn new(verbose: bool, echo: EchoMode) -> IndicatifBar {
        IndicatifBar {
            verbose,
            echo,
            inner: Mutex::new(None),
            start_time: Instant::now(),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Option<Inner>> {
        self.inner.lock().unwrap()
    }
}

impl EventLogger for IndicatifBar {
    type TaskLogger = IndicatifTask;

    fn begin_build(&mut self, threads: usize) -> LogResult<()> {
        self.start_time = Instant::now();
        *self.inner.lock().unwrap() = Some(Inner::new(threads.max(1)));
        Ok(())
    }

    fn end_build(&mut self, result: &Result<(), Error>) -> LogResult<()> {
        if let Some(mut inner) = self.inner.lock().unwrap().take() {
            inner.finish();
        }

        let duration = format_duration(self.start_time.elapsed());

        match result {
            Ok(()) => println!(
                "{} in {}",
                style("Build finished").bold().green(),
                style(duration).cyan(),
            ),
            Err(err) => println!(
                "{} after {}: {}",
                style("Build failed").bold().red(),
                style(duration).cyan(),
                err,
            ),
        }

        Ok(())
    }

    fn start_task(
        &self,
        thread: usize,
        task: &task::Any,
    ) -> Result<IndicatifTask, Error> {
        let guard = self.inner();
        let bar = guard
            .as_ref()
            .map(|inner| inner.bar(thread).clone())
            .unwrap_or_else(ProgressBar::hidden);

        Ok(IndicatifTask::new(self.verbose, self.echo, bar, task))
    }

    fn delete(&self, thread: usize, resource: &res::Any) -> LogResult<()> {
        let guard = self.inner();

        if let Some(inner) = guard.as_ref() {
            inner
                .bar(thread)
                .println(format!("Deleting {}", style(resource).yellow()));
        }

        Ok(())
    }

    fn task_progress(&self, done: usize, total: usize) -> LogResult<()> {
        if let Some(inner) = self.inner().as_ref() {
            if inner.overall.length() != total as u64 {
                inner.overall.set_length(total as u64);
            }

            inner.overall.set_position(done as u64);
        }

        Ok(())
    }
}
