//! CABAC 跳帧 slice data 模板表.
//!
//! CABAC 编码的 slice data 无法像 CAVLC 那样用一个 mb_skip_run 字段表示,
//! 需要离线为每种分辨率生成一段常量字节 (从 slice header 之后的字节对齐处开始).
//! 模板按 (宽, 高) 索引, 构建后只读.
//!
//! 进程级全局表通过 [`install_global`] 安装一次, 之后由 [`global`] 只读访问.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use bytes::Bytes;
use hengsu_core::{HengsuError, HengsuResult};

/// 全局模板表
static GLOBAL_TABLE: OnceLock<SkipSliceTable> = OnceLock::new();

/// 跳帧 slice data 模板表
#[derive(Debug, Clone, Default)]
pub struct SkipSliceTable {
    entries: HashMap<(u32, u32), Bytes>,
}

impl SkipSliceTable {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入模板, 已存在时替换
    pub fn insert(&mut self, width: u32, height: u32, data: impl Into<Bytes>) {
        self.entries.insert((width, height), data.into());
    }

    /// 链式插入模板
    pub fn with_entry(mut self, width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        self.insert(width, height, data);
        self
    }

    /// 查找指定分辨率的模板
    pub fn get(&self, width: u32, height: u32) -> Option<&Bytes> {
        self.entries.get(&(width, height))
    }

    /// 模板数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空表
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 已收录的分辨率列表 (按宽高排序)
    pub fn resolutions(&self) -> Vec<(u32, u32)> {
        let mut list: Vec<_> = self.entries.keys().copied().collect();
        list.sort_unstable();
        list
    }

    /// 从目录加载模板, 文件名形如 `1920x1080.bin`
    ///
    /// 文件名不符合格式或内容为空的文件被跳过.
    pub fn load_dir(dir: &Path) -> HengsuResult<Self> {
        let mut table = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "bin") {
                continue;
            }
            let Some((width, height)) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(parse_resolution)
            else {
                log::warn!("跳帧模板文件名无法识别, 已跳过: {}", path.display());
                continue;
            };
            let data = fs::read(&path)?;
            if data.is_empty() {
                log::warn!("跳帧模板为空, 已跳过: {}", path.display());
                continue;
            }
            log::debug!(
                "加载跳帧模板 {}x{}, {} 字节",
                width,
                height,
                data.len()
            );
            table.insert(width, height, data);
        }
        Ok(table)
    }
}

/// 解析 `"<宽>x<高>"`
fn parse_resolution(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.split_once(['x', 'X'])?;
    let width = w.parse().ok()?;
    let height = h.parse().ok()?;
    (width > 0 && height > 0).then_some((width, height))
}

/// 安装进程级全局模板表, 只能安装一次
pub fn install_global(table: SkipSliceTable) -> HengsuResult<()> {
    GLOBAL_TABLE.set(table).map_err(|_| {
        HengsuError::InvalidState("全局跳帧模板表已初始化, 不能重复安装".into())
    })
}

/// 进程级全局模板表, 未安装时为空表
pub fn global() -> &'static SkipSliceTable {
    GLOBAL_TABLE.get_or_init(SkipSliceTable::new)
}
