//! H.264 SPS (Sequence Parameter Set) 解析器.
//!
//! 只解析码流过滤所需的字段: 色度格式、frame_num 位宽、POC 类型、参考帧数、
//! 宏块尺寸与场/帧编码标志. VUI 不解析.

use hengsu_core::bitreader::BitReader;
use hengsu_core::{HengsuError, HengsuResult};

/// SPS 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sps {
    /// profile_idc (66=Baseline, 77=Main, 100=High)
    pub profile_idc: u8,
    /// level_idc (30=3.0, 41=4.1)
    pub level_idc: u8,
    /// seq_parameter_set_id
    pub sps_id: u32,
    /// 色度格式 (0=单色, 1=4:2:0, 2=4:2:2, 3=4:4:4)
    pub chroma_format_idc: u32,
    /// log2(MaxFrameNum), 即 slice header 中 frame_num 字段的位宽
    pub log2_max_frame_num: u32,
    /// 图像顺序计数类型 (0, 1, 2)
    pub poc_type: u32,
    /// 最大参考帧数 (ref_frame_count)
    pub max_num_ref_frames: u32,
    /// gaps_in_frame_num_value_allowed_flag
    pub gaps_in_frame_num_allowed: bool,
    /// 宽度 (宏块)
    pub pic_width_in_mbs: u32,
    /// 高度 (map unit, 场编码时为半帧宏块行数)
    pub pic_height_in_map_units: u32,
    /// 是否只有帧编码 (无场/MBAFF)
    pub frame_mbs_only: bool,
    /// 图像宽度 (像素, 已应用 cropping)
    pub width: u32,
    /// 图像高度 (像素, 已应用 cropping)
    pub height: u32,
}

impl Sps {
    /// 每行宏块数
    pub fn mb_width(&self) -> u32 {
        self.pic_width_in_mbs
    }

    /// 每列宏块数 (按帧计)
    pub fn mb_height(&self) -> u32 {
        self.pic_height_in_map_units * if self.frame_mbs_only { 1 } else { 2 }
    }

    /// frame_num 的模数 2^log2_max_frame_num
    pub fn max_frame_num(&self) -> u32 {
        1 << self.log2_max_frame_num
    }
}

/// 从 RBSP 数据 (不含 NAL 头) 解析 SPS
pub fn parse_sps(rbsp: &[u8]) -> HengsuResult<Sps> {
    if rbsp.len() < 4 {
        return Err(HengsuError::InvalidData("H.264: SPS RBSP 太短".into()));
    }

    let mut br = BitReader::new(rbsp);

    let profile_idc = br.read_bits(8)? as u8;
    let _constraint_set_flags = br.read_bits(8)?;
    let level_idc = br.read_bits(8)? as u8;
    let sps_id = br.read_ue()?;
    if sps_id > 31 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: sps_id 超出范围, sps_id={}",
            sps_id
        )));
    }

    let mut chroma_format_idc = 1;
    let mut separate_colour_plane = false;
    if is_high_profile(profile_idc) {
        chroma_format_idc = br.read_ue()?;
        if chroma_format_idc > 3 {
            return Err(HengsuError::InvalidData(format!(
                "H.264: chroma_format_idc 非法, value={}",
                chroma_format_idc
            )));
        }
        if chroma_format_idc == 3 {
            separate_colour_plane = br.read_flag()?;
        }
        let bit_depth_luma = br.read_ue()? + 8;
        let bit_depth_chroma = br.read_ue()? + 8;
        if bit_depth_luma > 14 || bit_depth_chroma > 14 {
            return Err(HengsuError::InvalidData(format!(
                "H.264: 位深非法, luma={}, chroma={}",
                bit_depth_luma, bit_depth_chroma
            )));
        }
        br.skip_bits(1)?; // qpprime_y_zero_transform_bypass_flag
        if br.read_flag()? {
            let list_count = if chroma_format_idc == 3 { 12 } else { 8 };
            for idx in 0..list_count {
                if br.read_flag()? {
                    skip_scaling_list(&mut br, if idx < 6 { 16 } else { 64 })?;
                }
            }
        }
    }

    let log2_max_frame_num_minus4 = br.read_ue()?;
    if log2_max_frame_num_minus4 > 12 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: log2_max_frame_num_minus4 超出范围, value={}",
            log2_max_frame_num_minus4
        )));
    }

    let poc_type = br.read_ue()?;
    match poc_type {
        0 => {
            let log2_max_poc_lsb_minus4 = br.read_ue()?;
            if log2_max_poc_lsb_minus4 > 12 {
                return Err(HengsuError::InvalidData(format!(
                    "H.264: log2_max_pic_order_cnt_lsb_minus4 超出范围, value={}",
                    log2_max_poc_lsb_minus4
                )));
            }
        }
        1 => {
            br.skip_bits(1)?; // delta_pic_order_always_zero_flag
            br.read_se()?; // offset_for_non_ref_pic
            br.read_se()?; // offset_for_top_to_bottom_field
            let cycle = br.read_ue()?;
            if cycle > 255 {
                return Err(HengsuError::InvalidData(format!(
                    "H.264: num_ref_frames_in_pic_order_cnt_cycle 超出范围, value={}",
                    cycle
                )));
            }
            for _ in 0..cycle {
                br.read_se()?;
            }
        }
        2 => {}
        _ => {
            return Err(HengsuError::InvalidData(format!(
                "H.264: pic_order_cnt_type 非法, value={}",
                poc_type
            )));
        }
    }

    let max_num_ref_frames = br.read_ue()?;
    if max_num_ref_frames > 16 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: max_num_ref_frames 超出范围, value={}",
            max_num_ref_frames
        )));
    }
    let gaps_in_frame_num_allowed = br.read_flag()?;

    let pic_width_in_mbs = br.read_ue()? + 1;
    let pic_height_in_map_units = br.read_ue()? + 1;
    if pic_width_in_mbs > 1024 || pic_height_in_map_units > 1024 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: 图像尺寸超出范围, mbs={}x{}",
            pic_width_in_mbs, pic_height_in_map_units
        )));
    }

    let frame_mbs_only = br.read_flag()?;
    if !frame_mbs_only {
        br.skip_bits(1)?; // mb_adaptive_frame_field_flag
    }
    br.skip_bits(1)?; // direct_8x8_inference_flag

    let (mut crop_left, mut crop_right, mut crop_top, mut crop_bottom) = (0, 0, 0, 0);
    if br.read_flag()? {
        crop_left = br.read_ue()?;
        crop_right = br.read_ue()?;
        crop_top = br.read_ue()?;
        crop_bottom = br.read_ue()?;
    }

    let chroma_array_type = if separate_colour_plane {
        0
    } else {
        chroma_format_idc
    };
    let (unit_x, unit_y) = cropping_unit(chroma_array_type, frame_mbs_only);
    let raw_width = pic_width_in_mbs * 16;
    let raw_height = pic_height_in_map_units * if frame_mbs_only { 16 } else { 32 };
    let crop_x = u64::from(crop_left) + u64::from(crop_right);
    let crop_y = u64::from(crop_top) + u64::from(crop_bottom);
    let crop_x = crop_x * u64::from(unit_x);
    let crop_y = crop_y * u64::from(unit_y);
    if crop_x >= u64::from(raw_width) || crop_y >= u64::from(raw_height) {
        return Err(HengsuError::InvalidData(format!(
            "H.264: 裁剪参数非法, raw={}x{}, crop_x={}, crop_y={}",
            raw_width, raw_height, crop_x, crop_y
        )));
    }

    Ok(Sps {
        profile_idc,
        level_idc,
        sps_id,
        chroma_format_idc,
        log2_max_frame_num: log2_max_frame_num_minus4 + 4,
        poc_type,
        max_num_ref_frames,
        gaps_in_frame_num_allowed,
        pic_width_in_mbs,
        pic_height_in_map_units,
        frame_mbs_only,
        width: raw_width - crop_x as u32,
        height: raw_height - crop_y as u32,
    })
}

// ============================================================
// 内部工具函数
// ============================================================

/// 带 chroma_format_idc 等扩展字段的 profile
fn is_high_profile(profile_idc: u8) -> bool {
    matches!(
        profile_idc,
        100 | 110 | 122 | 244 | 44 | 83 | 86 | 118 | 128 | 138 | 139 | 134 | 135
    )
}

/// 跳过一个 scaling_list() 语法结构
fn skip_scaling_list(br: &mut BitReader, size: usize) -> HengsuResult<()> {
    let mut last_scale = 8i32;
    let mut next_scale = 8i32;
    for _ in 0..size {
        if next_scale != 0 {
            let delta = br.read_se()?;
            if !(-128..=127).contains(&delta) {
                return Err(HengsuError::InvalidData(format!(
                    "H.264: delta_scale 超出范围, value={}",
                    delta
                )));
            }
            next_scale = (last_scale + delta + 256) % 256;
        }
        if next_scale != 0 {
            last_scale = next_scale;
        }
    }
    Ok(())
}

/// 裁剪单位 (ITU-T H.264 7.4.2.1.1)
fn cropping_unit(chroma_array_type: u32, frame_mbs_only: bool) -> (u32, u32) {
    let field_factor = if frame_mbs_only { 1 } else { 2 };
    match chroma_array_type {
        1 => (2, 2 * field_factor),
        2 => (2, field_factor),
        _ => (1, field_factor),
    }
}
