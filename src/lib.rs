//! # Hengsu (恒速)
//!
//! H.264 恒定帧率码流过滤器, 对标 FFmpeg 的 bitstream filter.
//!
//! 输入是已编码的 H.264 数据包, 输出帧率恒定的数据包序列:
//! - **空洞补帧**: DTS 出现空洞时插入全 skip 的 P 帧
//! - **frame_num 修正**: 补帧之后, 同一 GOP 内的真实帧 frame_num 顺延
//! - **不解码**: 只在比特层面读写 slice header
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use hengsu::config::AppConfig;
//! use hengsu::core::Rational;
//! use hengsu::codec::{CodecId, CodecParameters};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = AppConfig::from_json_str(r#"{ "constrate": { "frame_rate": "25/1" } }"#)?;
//! # let extradata = Vec::new();
//! let params = CodecParameters::video(CodecId::H264, 1920, 1080, extradata);
//! let mut filter = hengsu::open_constrate(&config.constrate, &params, Rational::new(1, 90000))?;
//! # let _ = &mut filter;
//! # Ok(())
//! # }
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `hengsu-core` | 核心类型与位级读写工具 |
//! | `hengsu-codec` | 数据包与 H.264 码流解析 |
//! | `hengsu-filter` | 恒定帧率过滤器 |

pub mod config;
pub mod logging;

use anyhow::{Context, Result};

use config::ConstRateConfig;
use hengsu_codec::CodecParameters;
use hengsu_core::Rational;
use hengsu_filter::ConstRateFilter;

/// 核心类型与工具 (对标 libavutil)
pub use hengsu_core as core;

/// 数据包与码流解析 (对标 libavcodec)
pub use hengsu_codec as codec;

/// 码流过滤器 (对标 libavcodec/bsf)
pub use hengsu_filter as filter;

/// 获取 Hengsu 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 按配置创建恒定帧率过滤器
///
/// 未配置模板目录时使用进程级全局模板表.
pub fn open_constrate(
    config: &ConstRateConfig,
    params: &CodecParameters,
    time_base: Rational,
) -> Result<ConstRateFilter> {
    let frame_rate = config.frame_rate()?;
    let filter = match &config.template_dir {
        Some(dir) => {
            let templates = config.templates()?;
            ConstRateFilter::with_templates(params, time_base, frame_rate, &templates)
                .with_context(|| format!("创建 h264_constrate 失败, 模板目录={}", dir.display()))?
        }
        None => ConstRateFilter::new(params, time_base, frame_rate)
            .context("创建 h264_constrate 失败")?,
    };
    Ok(match &config.label {
        Some(label) => filter.with_label(label.clone()),
        None => filter,
    })
}
