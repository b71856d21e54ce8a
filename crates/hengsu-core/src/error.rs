//! 错误类型, 各 crate 共用.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HengsuError {
    /// 调用方传入的参数不可用 (如帧率为 0)
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 码流合法但功能未实现, 如隔行或 CABAC 缺模板
    #[error("不支持: {0}")]
    Unsupported(String),

    /// 码流损坏或截断
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// send/receive 调用顺序不对
    #[error("无效状态: {0}")]
    InvalidState(String),

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 对标 `AVERROR(EAGAIN)`
    #[error("需要更多输入")]
    NeedMoreData,

    #[error("已到达流末尾")]
    Eof,

    #[error("内部错误: {0}")]
    Internal(String),
}

impl HengsuError {
    pub fn is_need_more_data(&self) -> bool {
        matches!(self, HengsuError::NeedMoreData)
    }
}

pub type HengsuResult<T> = Result<T, HengsuError>;
