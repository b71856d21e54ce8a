//! # hengsu-core
//!
//! 恒速核心库, 提供基础类型定义、错误处理和位级读写工具.
//!
//! 本 crate 对标 FFmpeg 的 libavutil: 除了码流处理需要的位读写器与
//! 有理数/时间戳类型, 还包含统计用的环形缓冲区、帧率计数器、码率计算器和音频电平计算.

pub mod audio_level;
pub mod bitrate;
pub mod bitreader;
pub mod bitwriter;
pub mod circular_buffer;
pub mod error;
pub mod rate_counter;
pub mod rational;
pub mod timestamp;

// 重导出常用类型
pub use audio_level::{AudioLevel, audio_level_s16};
pub use bitrate::BitrateCalculator;
pub use circular_buffer::CircularBuffer;
pub use error::{HengsuError, HengsuResult};
pub use rate_counter::RateCounter;
pub use rational::Rational;
pub use timestamp::{NOPTS_VALUE, Timestamp};
