//! # liu-format
//!
//! 数据源侧的契约: 打开输入、探测流信息、按读取顺序产出数据包.
//! 容器解析与网络传输由外部 [`Demuxer`] 实现提供;
//! [`MemoryDemuxer`] 是内存中的合成数据源.

pub mod demuxer;
pub mod memory;
pub mod stream;

pub use demuxer::Demuxer;
pub use memory::MemoryDemuxer;
pub use stream::{AudioStreamParams, Stream, StreamParams, VideoStreamParams};
