//! H.264 PPS (Picture Parameter Set) 解析器.
//!
//! 解析到 redundant_pic_cnt_present_flag 为止. 之后的 8x8 变换与缩放矩阵扩展
//! 不影响 slice header 前部的语法, 因此不解析.

use hengsu_core::bitreader::BitReader;
use hengsu_core::{HengsuError, HengsuResult};

/// PPS 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pps {
    /// pic_parameter_set_id
    pub pps_id: u32,
    /// 引用的 seq_parameter_set_id
    pub sps_id: u32,
    /// entropy_coding_mode_flag (true=CABAC, false=CAVLC)
    pub cabac: bool,
    /// bottom_field_pic_order_in_frame_present_flag
    pub pic_order_present: bool,
    /// num_slice_groups_minus1 + 1
    pub slice_group_count: u32,
    /// slice_group_map_type (仅 slice_group_count > 1 时有意义)
    pub slice_group_map_type: u32,
    /// num_ref_idx_l0_default_active_minus1 + 1, 即 ref_count[0]
    pub num_ref_idx_l0_default_active: u32,
    /// num_ref_idx_l1_default_active_minus1 + 1
    pub num_ref_idx_l1_default_active: u32,
    /// weighted_pred_flag
    pub weighted_pred: bool,
    /// weighted_bipred_idc
    pub weighted_bipred_idc: u32,
    /// 26 + pic_init_qp_minus26
    pub pic_init_qp: i32,
    /// chroma_qp_index_offset
    pub chroma_qp_index_offset: i32,
    /// deblocking_filter_control_present_flag
    pub deblocking_filter_control: bool,
    /// constrained_intra_pred_flag
    pub constrained_intra_pred: bool,
    /// redundant_pic_cnt_present_flag
    pub redundant_pic_cnt_present: bool,
}

/// 从 RBSP 数据 (不含 NAL 头) 解析 PPS
pub fn parse_pps(rbsp: &[u8]) -> HengsuResult<Pps> {
    if rbsp.is_empty() {
        return Err(HengsuError::InvalidData("H.264: PPS RBSP 为空".into()));
    }

    let mut br = BitReader::new(rbsp);
    let pps_id = br.read_ue()?;
    if pps_id > 255 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: pps_id 超出范围, pps_id={}",
            pps_id
        )));
    }
    let sps_id = br.read_ue()?;
    if sps_id > 31 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: sps_id 超出范围, sps_id={}",
            sps_id
        )));
    }

    let cabac = br.read_flag()?;
    let pic_order_present = br.read_flag()?;

    let num_slice_groups_minus1 = br.read_ue()?;
    if num_slice_groups_minus1 > 7 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: num_slice_groups_minus1 超出范围, value={}",
            num_slice_groups_minus1
        )));
    }
    let slice_group_map_type = if num_slice_groups_minus1 > 0 {
        skip_slice_group_map(&mut br, num_slice_groups_minus1)?
    } else {
        0
    };

    let num_ref_idx_l0_default_active = br.read_ue()? + 1;
    let num_ref_idx_l1_default_active = br.read_ue()? + 1;
    if num_ref_idx_l0_default_active > 32 || num_ref_idx_l1_default_active > 32 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: 默认参考帧数超出范围, l0={}, l1={}",
            num_ref_idx_l0_default_active, num_ref_idx_l1_default_active
        )));
    }

    let weighted_pred = br.read_flag()?;
    let weighted_bipred_idc = br.read_bits(2)?;
    if weighted_bipred_idc > 2 {
        return Err(HengsuError::InvalidData(format!(
            "H.264: weighted_bipred_idc 非法, value={}",
            weighted_bipred_idc
        )));
    }

    let pic_init_qp = 26 + br.read_se()?;
    if !(0..=51).contains(&pic_init_qp) {
        return Err(HengsuError::InvalidData(format!(
            "H.264: pic_init_qp 超出范围, pic_init_qp={}",
            pic_init_qp
        )));
    }
    br.read_se()?; // pic_init_qs_minus26
    let chroma_qp_index_offset = br.read_se()?;
    if !(-12..=12).contains(&chroma_qp_index_offset) {
        return Err(HengsuError::InvalidData(format!(
            "H.264: chroma_qp_index_offset 超出范围, value={}",
            chroma_qp_index_offset
        )));
    }

    let deblocking_filter_control = br.read_flag()?;
    let constrained_intra_pred = br.read_flag()?;
    let redundant_pic_cnt_present = br.read_flag()?;

    Ok(Pps {
        pps_id,
        sps_id,
        cabac,
        pic_order_present,
        slice_group_count: num_slice_groups_minus1 + 1,
        slice_group_map_type,
        num_ref_idx_l0_default_active,
        num_ref_idx_l1_default_active,
        weighted_pred,
        weighted_bipred_idc,
        pic_init_qp,
        chroma_qp_index_offset,
        deblocking_filter_control,
        constrained_intra_pred,
        redundant_pic_cnt_present,
    })
}

/// 跳过 slice group 映射参数, 返回 slice_group_map_type
fn skip_slice_group_map(br: &mut BitReader, num_slice_groups_minus1: u32) -> HengsuResult<u32> {
    let map_type = br.read_ue()?;
    match map_type {
        0 => {
            for _ in 0..=num_slice_groups_minus1 {
                br.read_ue()?; // run_length_minus1
            }
        }
        1 => {}
        2 => {
            for _ in 0..num_slice_groups_minus1 {
                br.read_ue()?; // top_left
                br.read_ue()?; // bottom_right
            }
        }
        3..=5 => {
            br.skip_bits(1)?; // slice_group_change_direction_flag
            br.read_ue()?; // slice_group_change_rate_minus1
        }
        6 => {
            let pic_size_in_map_units = br.read_ue()? as usize + 1;
            let bits_per_id = u32::BITS - num_slice_groups_minus1.leading_zeros();
            br.skip_bits(pic_size_in_map_units * bits_per_id as usize)?;
        }
        _ => {
            return Err(HengsuError::InvalidData(format!(
                "H.264: slice_group_map_type 非法, value={}",
                map_type
            )));
        }
    }
    Ok(map_type)
}
