//! 音频电平计算.
//!
//! 对交织的 s16 采样逐声道计算 RMS 与峰值 (dBFS), 用于音频内容变化检测.
//! 只支持单声道和立体声.

use crate::{HengsuError, HengsuResult};

/// 支持的最大声道数
pub const MAX_CHANNELS: usize = 2;

/// 电平下限, 静音或无数据时的取值
pub const SILENCE_DB: f32 = -100.0;

/// 逐声道电平, 超出实际声道数的槽位为 [`SILENCE_DB`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioLevel {
    pub rms: [f32; MAX_CHANNELS],
    pub max: [f32; MAX_CHANNELS],
}

impl AudioLevel {
    pub const SILENCE: Self = Self {
        rms: [SILENCE_DB; MAX_CHANNELS],
        max: [SILENCE_DB; MAX_CHANNELS],
    };
}

/// 线性幅度转 dB, 低于 1e-5 时取下限
fn to_db(v: f64) -> f32 {
    if v > 0.00001 {
        (20.0 * v.log10()) as f32
    } else {
        SILENCE_DB
    }
}

/// 计算交织 s16 采样的电平
///
/// 末尾不足一帧 (每声道一个采样) 的部分被忽略. 峰值只统计正向采样,
/// 全为负值的声道峰值为下限.
pub fn audio_level_s16(samples: &[i16], channels: usize) -> HengsuResult<AudioLevel> {
    if channels > MAX_CHANNELS {
        return Err(HengsuError::Unsupported(format!(
            "音频电平只支持单声道和立体声, channels={channels}"
        )));
    }
    let frames = if channels == 0 { 0 } else { samples.len() / channels };
    if frames == 0 {
        return Ok(AudioLevel::SILENCE);
    }

    let mut power = [0f64; MAX_CHANNELS];
    let mut peak = [0i16; MAX_CHANNELS];
    for frame in samples.chunks_exact(channels) {
        for (ch, &s) in frame.iter().enumerate() {
            let v = f64::from(s) / 32768.0;
            power[ch] += v * v;
            peak[ch] = peak[ch].max(s);
        }
    }

    let mut level = AudioLevel::SILENCE;
    for ch in 0..channels {
        level.rms[ch] = to_db((power[ch] / frames as f64).sqrt());
        level.max[ch] = to_db(f64::from(peak[ch]) / 32768.0);
    }
    Ok(level)
}
