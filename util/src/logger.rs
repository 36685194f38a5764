// Copyright (c) 2020 Huawei Technologies Co.,Ltd. All rights reserved.
//
// StratoVirt is licensed under Mulan PSL v2.
// You can use this software according to the terms and conditions of the Mulan
// PSL v2.
// You may obtain a copy of Mulan PSL v2 at:
//         http://license.coscl.org.cn/MulanPSL2
// THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY
// KIND, EITHER EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO
// NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR PURPOSE.
// See the Mulan PSL v2 for more details.

//! Logger of the harness binary.
//!
//! Each scenario run is short, so the log goes to stderr or is appended to
//! a single file named with `--log`.

use std::fs::File;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::sync::Mutex;

use anyhow::{Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use nix::unistd::{getpid, gettid};

use crate::time::{get_format_time, gettime};

/// Environment variable selecting the log level of the harness.
pub const LOG_LEVEL_ENV: &str = "SMP_HARNESS_LOG_LEVEL";

/// "%year-%mon-%dayT%hour:%min:%sec.%nsec"
fn format_now() -> String {
    let (sec, nsec) = gettime().unwrap_or((0, 0));
    let t = get_format_time(sec);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:09}",
        t[0], t[1], t[2], t[3], t[4], t[5], nsec
    )
}

fn format_record(record: &Record) -> String {
    format!(
        "{} [{}][{}][{}: {}]:{}: {}\n",
        format_now(),
        getpid().as_raw(),
        gettid().as_raw(),
        record.file().unwrap_or(""),
        record.line().unwrap_or(0),
        record.level(),
        record.args()
    )
}

struct HarnessLogger {
    sink: Mutex<Box<dyn Write + Send>>,
    level: Level,
}

impl HarnessLogger {
    fn new(sink: Box<dyn Write + Send>, level: Level) -> Self {
        HarnessLogger {
            sink: Mutex::new(sink),
            level,
        }
    }
}

impl Log for HarnessLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format_record(record);
        let mut sink = match self.sink.lock() {
            Ok(sink) => sink,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = sink.write_all(line.as_bytes()) {
            eprintln!("Failed to log message {:?}", e);
        }
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.flush();
        }
    }
}

/// Map a level name to a `Level`, unknown names fall back to `Info`.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "error" => Level::Error,
        "warn" => Level::Warn,
        "info" => Level::Info,
        "debug" => Level::Debug,
        "trace" => Level::Trace,
        _ => Level::Info,
    }
}

fn level_from_env() -> Level {
    std::env::var(LOG_LEVEL_ENV).map_or(Level::Info, |l| parse_level(&l))
}

fn open_log_file(path: &str) -> Result<File> {
    std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .mode(0o640)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path))
}

/// Install the global logger. An empty `path` logs to stderr.
pub fn init_log(path: String) -> Result<()> {
    let sink: Box<dyn Write + Send> = if path.is_empty() {
        Box::new(std::io::stderr())
    } else {
        Box::new(open_log_file(&path)?)
    };
    let logger = HarnessLogger::new(sink, level_from_env());
    log::set_boxed_logger(Box::new(logger))
        .map(|()| log::set_max_level(LevelFilter::Trace))
        .with_context(|| format!("Failed to init logger: {}", path))
}
