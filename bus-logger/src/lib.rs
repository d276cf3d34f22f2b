#![no_std]

use core::cell::Cell;

use critical_section::Mutex;

static PRINT_HOOK: Mutex<Cell<Option<fn(core::fmt::Arguments)>>> = Mutex::new(Cell::new(None));

pub const RESET: &str = "\u{001B}[0m";
pub const RED: &str = "\u{001B}[31m";
pub const GREEN: &str = "\u{001B}[32m";
pub const YELLOW: &str = "\u{001B}[33m";
pub const BLUE: &str = "\u{001B}[34m";
pub const MAGENTA: &str = "\u{001B}[35m";

/// Install the bus logger as the global `log` backend.
pub fn init_logger(level: log::LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_logger(&BusLogger)?;
    log::set_max_level(level);
    Ok(())
}

/// Route every formatted record through `hook`. Records are dropped until a hook is set.
pub fn set_print_hook(hook: fn(core::fmt::Arguments)) {
    critical_section::with(|cs| PRINT_HOOK.borrow(cs).set(Some(hook)));
}

pub fn clear_print_hook() {
    critical_section::with(|cs| PRINT_HOOK.borrow(cs).set(None));
}

pub fn level_color(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => RED,
        log::Level::Warn => YELLOW,
        log::Level::Info => GREEN,
        log::Level::Debug => BLUE,
        log::Level::Trace => MAGENTA,
    }
}

struct BusLogger;

impl log::Log for BusLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let hook = critical_section::with(|cs| PRINT_HOOK.borrow(cs).get());
        if let Some(hook) = hook {
            hook(format_args!(
                "{}{} - {}{}",
                level_color(record.level()),
                record.level(),
                record.args(),
                RESET
            ));
        }
    }

    fn flush(&self) {}
}
