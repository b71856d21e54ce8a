//! 历史日志清理.
//!
//! 启动时执行一次: 超出保留天数的文件删除, 其余非今天的 `.log` 压缩成 `.log.gz`.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Days, NaiveDate};
use flate2::Compression;
use flate2::write::GzEncoder;

use super::LoggingConfig;

/// 目录中一份属于本进程前缀的日志
#[derive(Debug, PartialEq, Eq)]
struct HistoryFile {
    date: NaiveDate,
    gzipped: bool,
}

pub(super) fn cleanup_logs(config: &LoggingConfig, today: NaiveDate) -> anyhow::Result<()> {
    let dir = Path::new(&config.directory);
    if !dir.is_dir() {
        return Ok(());
    }
    let keep_from = u64::try_from(config.retention_days)
        .ok()
        .and_then(|days| today.checked_sub_days(Days::new(days)))
        .unwrap_or(today);

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(file) = classify(name, &config.file_prefix) else {
            continue;
        };

        if file.date < keep_from {
            fs::remove_file(&path)
                .with_context(|| format!("删除过期日志失败, path={}", path.display()))?;
        } else if config.compress_history && !file.gzipped && file.date < today {
            gzip_in_place(&path)?;
        }
    }
    Ok(())
}

/// `foo.log` -> `foo.log.gz`, 成功后删除原文件
///
/// 先写 `foo.log.gz.tmp` 再改名, 已存在的 `foo.log.gz` 被覆盖.
fn gzip_in_place(path: &Path) -> anyhow::Result<()> {
    let mut target = path.as_os_str().to_owned();
    target.push(".gz");
    let target = PathBuf::from(target);
    let mut partial = target.clone().into_os_string();
    partial.push(".tmp");
    let partial = PathBuf::from(partial);

    let mut reader = BufReader::new(
        File::open(path).with_context(|| format!("打开日志失败, path={}", path.display()))?,
    );
    let out = File::create(&partial)
        .with_context(|| format!("创建压缩文件失败, path={}", partial.display()))?;
    let mut gz = GzEncoder::new(BufWriter::new(out), Compression::default());
    io::copy(&mut reader, &mut gz)?;
    gz.finish()?.flush()?;
    fs::rename(&partial, &target)
        .with_context(|| format!("重命名压缩文件失败, path={}", target.display()))?;

    fs::remove_file(path).with_context(|| format!("删除原日志失败, path={}", path.display()))
}

/// 识别 `<prefix>.<YYYY-MM-DD>.log[.gz]`
fn classify(name: &str, prefix: &str) -> Option<HistoryFile> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('.')?;
    let (stem, gzipped) = match rest.strip_suffix(".gz") {
        Some(stem) => (stem, true),
        None => (rest, false),
    };
    let date = stem.strip_suffix(".log")?;
    // chrono 接受不补零的月日, 这里要求严格的 10 个字符
    if date.len() != 10 {
        return None;
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(HistoryFile { date, gzipped })
}
