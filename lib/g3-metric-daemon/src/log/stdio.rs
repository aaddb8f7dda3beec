/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use chrono::Local;
use flume::{Receiver, Sender, TrySendError};
use slog::{Drain, KV, Level, OwnedKVList, Record};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

pub(super) struct StdLogValue {
    level: Level,
    message: String,
    kv_pairs: Vec<(String, String)>,
    location: Option<String>,
}

impl StdLogValue {
    fn message_str(&self) -> &str {
        if self.message.is_empty() {
            "()"
        } else {
            &self.message
        }
    }
}

struct KvCollector<'a> {
    kv_pairs: &'a mut Vec<(String, String)>,
}

impl slog::Serializer for KvCollector<'_> {
    fn emit_arguments(&mut self, key: slog::Key, val: &fmt::Arguments) -> slog::Result {
        self.kv_pairs.push((key.to_string(), val.to_string()));
        Ok(())
    }
}

pub(super) struct AsyncStdLogger {
    sender: Sender<StdLogValue>,
    append_code_position: bool,
    dropped: AtomicU64,
}

impl Drain for AsyncStdLogger {
    type Ok = ();
    type Err = slog::Error;

    fn log(&self, record: &Record, logger_values: &OwnedKVList) -> Result<(), slog::Error> {
        let mut kv_pairs = Vec::new();
        let mut collector = KvCollector {
            kv_pairs: &mut kv_pairs,
        };
        logger_values.serialize(record, &mut collector)?;
        record.kv().serialize(record, &mut collector)?;

        let location = if self.append_code_position {
            Some(format!("{}:{}", record.file(), record.line()))
        } else {
            None
        };
        let value = StdLogValue {
            level: record.level(),
            message: record.msg().to_string(),
            kv_pairs,
            location,
        };

        match self.sender.try_send(value) {
            Ok(_) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

pub(super) fn spawn_async_logger(
    thread_name: &str,
    channel_capacity: usize,
    append_code_position: bool,
) -> io::Result<(AsyncStdLogger, JoinHandle<()>)> {
    let (sender, receiver) = flume::bounded::<StdLogValue>(channel_capacity);

    let io_thread = AsyncIoThread { receiver };
    let handle = std::thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || io_thread.run_with_stderr())?;

    let logger = AsyncStdLogger {
        sender,
        append_code_position,
        dropped: AtomicU64::new(0),
    };
    Ok((logger, handle))
}

struct AsyncIoThread {
    receiver: Receiver<StdLogValue>,
}

impl AsyncIoThread {
    fn write_time<IO: Write>(&self, io: &mut IO) -> io::Result<()> {
        let datetime = Local::now();
        write!(io, "{}", datetime.format(TIME_FORMAT))
    }

    fn run_with_stderr(self) {
        let mut io = io::stderr();
        let console = io.is_terminal();
        let mut buf: Vec<u8> = Vec::with_capacity(1024);
        while let Ok(v) = self.receiver.recv() {
            self.write_one(&mut io, &mut buf, v, console);

            while let Ok(v) = self.receiver.try_recv() {
                self.write_one(&mut io, &mut buf, v, console);
            }

            let _ = io.flush();
        }
    }

    fn write_one<IO: Write>(&self, io: &mut IO, buf: &mut Vec<u8>, v: StdLogValue, console: bool) {
        buf.clear();
        let _ = if console {
            self.write_console(buf, v)
        } else {
            self.write_plain(buf, v)
        };
        let _ = io.write_all(buf);
    }

    fn write_plain<IO: Write>(&self, io: &mut IO, v: StdLogValue) -> io::Result<()> {
        self.write_time(io)?;
        write!(io, " {}", v.level)?;
        for (k, v) in &v.kv_pairs {
            write!(io, " {k}: {v},")?;
        }
        write!(io, " {}", v.message_str())?;
        if let Some(location) = &v.location {
            write!(io, " <{location}>")?;
        }
        writeln!(io)
    }

    fn write_console<IO: Write>(&self, io: &mut IO, v: StdLogValue) -> io::Result<()> {
        use anstyle::{AnsiColor, Color, Style};

        const COLOR_MAGENTA: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta)));
        const COLOR_RED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
        const COLOR_YELLOW: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
        const COLOR_GREEN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
        const COLOR_CYAN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan)));
        const COLOR_BLUE: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue)));
        const STYLE_BOLD: Style = Style::new().bold();
        const STYLE_ITALIC: Style = Style::new().italic();

        let bold_s = STYLE_BOLD.render();
        let bold_e = STYLE_BOLD.render_reset();

        self.write_time(io)?;
        let level_color = match v.level {
            Level::Critical => COLOR_MAGENTA,
            Level::Error => COLOR_RED,
            Level::Warning => COLOR_YELLOW,
            Level::Info => COLOR_GREEN,
            Level::Debug => COLOR_CYAN,
            Level::Trace => COLOR_BLUE,
        };
        write!(
            io,
            " {}{}{}",
            level_color.render(),
            v.level,
            level_color.render_reset(),
        )?;

        for (k, v) in &v.kv_pairs {
            write!(io, " {bold_s}{k}{bold_e}={v},")?;
        }
        write!(io, " {bold_s}{}{bold_e}", v.message_str())?;

        if let Some(location) = &v.location {
            write!(
                io,
                " <{}{location}{}>",
                STYLE_ITALIC.render(),
                STYLE_ITALIC.render_reset()
            )?;
        }
        writeln!(io)
    }
}
