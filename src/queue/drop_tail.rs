//! DropTail（尾丢弃）队列
//!
//! 当队列已满时，直接拒绝新到达的元素，内容保持不变。

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct PacketQueue<T> {
    capacity: usize,
    q: VecDeque<T>,
    total_enqueued: u64,
    total_dequeued: u64,
    total_dropped: u64,
}

impl<T> PacketQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            q: VecDeque::with_capacity(capacity),
            total_enqueued: 0,
            total_dequeued: 0,
            total_dropped: 0,
        }
    }

    /// 入队：成功返回 Ok；队列已满则返回 Err(item)，并累加丢弃计数
    pub fn enqueue(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            self.total_dropped = self.total_dropped.saturating_add(1);
            return Err(item);
        }
        self.q.push_back(item);
        self.total_enqueued = self.total_enqueued.saturating_add(1);
        Ok(())
    }

    /// 出队：严格 FIFO
    pub fn dequeue(&mut self) -> Option<T> {
        let item = self.q.pop_front()?;
        self.total_dequeued = self.total_dequeued.saturating_add(1);
        Some(item)
    }

    pub fn peek(&self) -> Option<&T> {
        self.q.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.q.iter()
    }

    /// 清空队列并交还其中的元素（计数器不变）
    pub fn clear(&mut self) -> Vec<T> {
        self.q.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.q.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 占用率，[0, 1]；容量为 0 时为 0
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        self.q.len() as f64 / self.capacity as f64
    }

    pub fn total_enqueued(&self) -> u64 {
        self.total_enqueued
    }

    pub fn total_dequeued(&self) -> u64 {
        self.total_dequeued
    }

    pub fn total_dropped(&self) -> u64 {
        self.total_dropped
    }
}
