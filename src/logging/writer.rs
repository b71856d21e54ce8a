//! 按本地日期切分的日志文件.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Local, NaiveDate};

/// `<dir>/<prefix>.<YYYY-MM-DD>.log`
pub(crate) fn log_file_path(dir: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    dir.join(format!("{prefix}.{}.log", date.format("%Y-%m-%d")))
}

fn open_for_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// 日期变化后的第一次写入会切到新文件
pub(super) struct DailyFileWriter {
    dir: PathBuf,
    prefix: String,
    pub(super) date: NaiveDate,
    file: File,
}

impl DailyFileWriter {
    pub(super) fn open(dir: &Path, prefix: &str) -> anyhow::Result<Self> {
        let date = Local::now().date_naive();
        let path = log_file_path(dir, prefix, date);
        let file = open_for_append(&path)
            .with_context(|| format!("打开日志文件失败, path={}", path.display()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_owned(),
            date,
            file,
        })
    }

    pub(super) fn roll_to(&mut self, date: NaiveDate) -> io::Result<()> {
        self.file = open_for_append(&log_file_path(&self.dir, &self.prefix, date))?;
        self.date = date;
        Ok(())
    }
}

impl Write for DailyFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let today = Local::now().date_naive();
        if self.date != today {
            self.roll_to(today)?;
        }
        self.file.write_all(buf).map(|()| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
