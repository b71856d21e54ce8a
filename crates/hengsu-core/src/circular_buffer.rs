//! 定长环形缓冲区.
//!
//! 保存最近 `capacity` 个 `i64` 采样 (通常是微秒时间戳), 写满后覆盖最旧的值.
//! 为 [`RateCounter`](crate::rate_counter::RateCounter) 提供存储.

use crate::{HengsuError, HengsuResult};
use std::collections::VecDeque;

/// 定长环形缓冲区
#[derive(Debug, Clone)]
pub struct CircularBuffer {
    values: VecDeque<i64>,
    capacity: usize,
}

impl CircularBuffer {
    /// 创建容量为 `capacity` 的缓冲区, 容量必须大于 0
    pub fn new(capacity: usize) -> HengsuResult<Self> {
        if capacity == 0 {
            return Err(HengsuError::InvalidArgument(
                "环形缓冲区容量不能为 0".into(),
            ));
        }
        Ok(Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// 追加一个值, 已满时丢弃最旧的值
    pub fn enqueue(&mut self, value: i64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// 最旧的值
    pub fn head(&self) -> Option<i64> {
        self.values.front().copied()
    }

    /// 最新的值
    pub fn tail(&self) -> Option<i64> {
        self.values.back().copied()
    }

    /// 从最旧的值开始计数的第 `position` 个值
    pub fn at(&self, position: usize) -> Option<i64> {
        self.values.get(position).copied()
    }

    /// 按从旧到新的顺序复制全部值
    pub fn to_vec(&self) -> Vec<i64> {
        self.values.iter().copied().collect()
    }

    /// 当前保存的值个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// 清空所有值, 容量不变
    pub fn reset(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_零容量() {
        assert!(CircularBuffer::new(0).is_err());
    }

    #[test]
    fn test_未写满时保持写入顺序() {
        let mut cb = CircularBuffer::new(4).unwrap();
        assert!(cb.is_empty());
        assert_eq!(cb.head(), None);
        assert_eq!(cb.tail(), None);

        cb.enqueue(10);
        assert_eq!(cb.head(), Some(10));
        assert_eq!(cb.tail(), Some(10));

        cb.enqueue(20);
        cb.enqueue(30);
        assert_eq!(cb.len(), 3);
        assert!(!cb.is_full());
        assert_eq!(cb.to_vec(), vec![10, 20, 30]);
        assert_eq!(cb.at(1), Some(20));
        assert_eq!(cb.at(3), None);
    }

    #[test]
    fn test_写满后覆盖最旧值() {
        let mut cb = CircularBuffer::new(3).unwrap();
        for v in 1..=5 {
            cb.enqueue(v);
        }
        assert!(cb.is_full());
        assert_eq!(cb.len(), 3);
        assert_eq!(cb.capacity(), 3);
        assert_eq!(cb.head(), Some(3));
        assert_eq!(cb.tail(), Some(5));
        assert_eq!(cb.to_vec(), vec![3, 4, 5]);
        assert_eq!(cb.at(0), Some(3));
        assert_eq!(cb.at(2), Some(5));
    }

    #[test]
    fn test_容量为一() {
        let mut cb = CircularBuffer::new(1).unwrap();
        cb.enqueue(7);
        cb.enqueue(8);
        assert_eq!(cb.head(), Some(8));
        assert_eq!(cb.tail(), Some(8));
        assert_eq!(cb.len(), 1);
    }

    #[test]
    fn test_reset() {
        let mut cb = CircularBuffer::new(2).unwrap();
        cb.enqueue(1);
        cb.enqueue(2);
        cb.reset();
        assert!(cb.is_empty());
        assert_eq!(cb.capacity(), 2);
        cb.enqueue(3);
        assert_eq!(cb.to_vec(), vec![3]);
    }
}
