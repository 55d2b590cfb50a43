//! 压缩数据包.

use bytes::Bytes;
use liu_core::{NOPTS_VALUE, Rational};

/// 从数据源读出的一个压缩数据包
///
/// 送入解码器后即被释放, 管线不跨迭代保留数据包.
#[derive(Debug, Clone)]
pub struct Packet {
    /// 压缩数据
    pub data: Bytes,
    /// 显示时间戳 (PTS)
    pub pts: i64,
    /// 解码时间戳 (DTS)
    pub dts: i64,
    /// 时长 (以 time_base 为单位)
    pub duration: i64,
    pub time_base: Rational,
    /// 所属流的索引
    pub stream_index: usize,
    pub is_keyframe: bool,
}

impl Packet {
    /// 空数据包, 送入解码器表示刷新 (flush)
    pub fn empty() -> Self {
        Self {
            data: Bytes::new(),
            pts: NOPTS_VALUE,
            dts: NOPTS_VALUE,
            duration: 0,
            time_base: Rational::UNDEFINED,
            stream_index: 0,
            is_keyframe: false,
        }
    }

    pub fn from_data(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Self::empty()
        }
    }

    /// 链式设置流索引与时间信息
    pub fn with_timing(
        mut self,
        stream_index: usize,
        pts: i64,
        duration: i64,
        time_base: Rational,
    ) -> Self {
        self.stream_index = stream_index;
        self.pts = pts;
        self.dts = pts;
        self.duration = duration;
        self.time_base = time_base;
        self
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 是否为空包 (flush packet)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
