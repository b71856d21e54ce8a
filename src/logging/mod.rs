//! 日志系统.
//!
//! 控制台 + 按日期切分的文件 (`<prefix>.<YYYY-MM-DD>.log`), 各自一个 `EnvFilter`.
//! 库 crate 经 `log` 门面输出的记录由 tracing-log 桥接到这里.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::Context;
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::NormalizeEvent;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, fmt};

mod retention;
mod writer;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` 语法, 如 `"info,hengsu::constrate=debug"`
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    /// 是否同时输出到 stdout
    pub console: bool,
    /// 超过天数的日志文件在启动时删除
    pub retention_days: i64,
    /// 启动时把今天以前的日志压缩为 `.gz`
    pub compress_history: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            directory: "logs".into(),
            file_prefix: "hengsu".into(),
            console: true,
            retention_days: 30,
            compress_history: true,
        }
    }
}

/// 非阻塞文件写入线程的守卫, 进程结束前不能释放
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// 安装全局日志, 一个进程只能成功一次
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let dir = Path::new(&config.directory);
    std::fs::create_dir_all(dir)
        .with_context(|| format!("创建日志目录失败, path={}", dir.display()))?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(writer::DailyFileWriter::open(dir, &config.file_prefix)?);
    let file = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .event_format(LineFormat { ansi: false })
        .with_filter(env_filter(&config.level)?);

    let console = match config.console {
        true => Some(
            fmt::layer()
                .with_writer(std::io::stdout)
                .event_format(LineFormat { ansi: true })
                .with_filter(env_filter(&config.level)?),
        ),
        false => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .context("全局日志已初始化")?;
    let _ = FILE_GUARD.set(guard);

    if let Err(err) = retention::cleanup_logs(config, Local::now().date_naive()) {
        tracing::warn!("清理历史日志失败: {err:#}");
    }
    Ok(())
}

fn env_filter(level: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("无效的日志级别: \"{level}\""))
}

/// `[MM-DD HH:MM:SS.mmm] LEVEL target:line > message`
///
/// 控制台按级别着色, 文件不带转义序列也不带行号.
struct LineFormat {
    ansi: bool,
}

impl LineFormat {
    fn color(level: Level) -> &'static str {
        match level {
            Level::ERROR => "\x1b[31m",
            Level::WARN => "\x1b[33m",
            Level::INFO => "\x1b[32m",
            _ => "\x1b[34m",
        }
    }
}

impl<S, N> FormatEvent<S, N> for LineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        // log 门面转发的记录, 真实 target 在 normalized 元数据里
        let normalized = event.normalized_metadata();
        let meta = normalized.as_ref().unwrap_or_else(|| event.metadata());
        let level = meta.level().as_str();

        write!(writer, "[{}] ", Local::now().format("%m-%d %H:%M:%S%.3f"))?;
        if self.ansi {
            write!(
                writer,
                "{}{level:5}\x1b[0m {}:{} > ",
                Self::color(*meta.level()),
                meta.target(),
                meta.line().unwrap_or(0)
            )?;
        } else {
            write!(writer, "{level:5} {} > ", meta.target())?;
        }
        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_无效日志级别() {
        assert!(env_filter("debug,hengsu::constrate=trace").is_ok());
        assert!(env_filter("hengsu=verbose").is_err());
    }

    #[test]
    fn test_配置缺省字段() {
        let config: LoggingConfig =
            serde_json::from_str(r#"{ "level": "debug", "console": false }"#).unwrap();
        assert_eq!(config.level, "debug");
        assert!(!config.console);
        assert_eq!(config.file_prefix, "hengsu");
        assert_eq!(config.retention_days, 30);
        assert!(config.compress_history);
    }
}
