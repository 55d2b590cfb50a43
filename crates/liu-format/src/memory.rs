//! 内存数据源.
//!
//! 持有预先构造的流描述与数据包队列, 按入队顺序产出. 用于在没有
//! 容器解析引擎时驱动整条管线.

use std::collections::VecDeque;

use liu_codec::Packet;
use liu_core::{LiuError, LiuResult};
use log::debug;

use crate::demuxer::Demuxer;
use crate::stream::Stream;

/// 内存数据源
pub struct MemoryDemuxer {
    streams: Vec<Stream>,
    packets: VecDeque<Packet>,
    url: Option<String>,
}

impl MemoryDemuxer {
    pub fn new(streams: Vec<Stream>, packets: impl IntoIterator<Item = Packet>) -> Self {
        Self {
            streams,
            packets: packets.into_iter().collect(),
            url: None,
        }
    }

    /// 追加一个数据包
    pub fn push(&mut self, packet: Packet) {
        self.packets.push_back(packet);
    }

    /// 尚未读取的数据包数
    pub fn remaining(&self) -> usize {
        self.packets.len()
    }

    /// 打开时使用的地址
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl Demuxer for MemoryDemuxer {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(&mut self, url: &str) -> LiuResult<()> {
        if url.is_empty() {
            return Err(LiuError::InvalidArgument("输入地址不能为空".into()));
        }
        debug!("打开内存数据源: {url}, {} 个数据包", self.packets.len());
        self.url = Some(url.to_string());
        Ok(())
    }

    fn find_stream_info(&mut self) -> LiuResult<()> {
        if self.streams.is_empty() {
            return Err(LiuError::InvalidData("没有可识别的流".into()));
        }
        Ok(())
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn read_packet(&mut self) -> LiuResult<Packet> {
        if self.url.is_none() {
            return Err(LiuError::InvalidArgument("数据源未打开".into()));
        }
        self.packets.pop_front().ok_or(LiuError::Eof)
    }

    fn close(&mut self) {
        if self.url.take().is_some() {
            debug!("关闭内存数据源, 丢弃 {} 个未读数据包", self.packets.len());
        }
        self.packets.clear();
    }
}
