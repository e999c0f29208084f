use indicatif::{ProgressBar, ProgressStyle};

use crate::config::ProgressKind;

const BAR_TEMPLATE: &str = "{msg} [{bar:40}] {pos}/{len} ({eta})";

pub trait Progress {
    fn start(&mut self, total: u64, message: &str);
    fn advance(&mut self, n: u64);
    fn finish(&mut self) {}
}

pub fn progress_for(kind: ProgressKind) -> Box<dyn Progress> {
    match kind {
        ProgressKind::Bar => Box::new(BarProgress::default()),
        ProgressKind::Log => Box::new(LogProgress::default()),
        ProgressKind::Silent => Box::new(NoProgress),
    }
}

#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl Progress for BarProgress {
    fn start(&mut self, total: u64, message: &str) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
        let bar = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("=> "));
        }
        bar.set_message(message.to_string());
        self.bar = Some(bar);
    }

    fn advance(&mut self, n: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(n);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

/// Reports every tenth of the way through as a `log::info!` record.
#[derive(Default)]
pub struct LogProgress {
    message: String,
    total: u64,
    done: u64,
    next_report: u64,
}

impl LogProgress {
    fn step(&self) -> u64 {
        (self.total / 10).max(1)
    }

    pub fn is_complete(&self) -> bool {
        self.done >= self.total
    }
}

impl Progress for LogProgress {
    fn start(&mut self, total: u64, message: &str) {
        self.message = message.to_string();
        self.total = total;
        self.done = 0;
        self.next_report = self.step();
        log::info!("{} [0/{}]", self.message, self.total);
    }

    fn advance(&mut self, n: u64) {
        self.done += n;
        if self.done >= self.next_report && self.done < self.total {
            log::info!("{} [{}/{}]", self.message, self.done, self.total);
            self.next_report = self.done + self.step();
        }
    }

    fn finish(&mut self) {
        if self.is_complete() {
            log::info!("{} [{}/{}] done", self.message, self.done, self.total);
        } else {
            log::warn!("{} aborted at [{}/{}]", self.message, self.done, self.total);
        }
    }
}

pub struct NoProgress;

impl Progress for NoProgress {
    fn start(&mut self, _total: u64, _message: &str) {}
    fn advance(&mut self, _n: u64) {}
}
