//! # Liu (流)
//!
//! 解复用 → 解码 → 格式转换 → 时间戳纪律 的媒体读取管线.
//!
//! 打开一个输入源, 选出第一条视频流与第一条音频流:
//! - **视频**: 优先绑定平台硬件设备, 解码输出留在设备上的表面直接交付;
//!   无法使用硬件时退回软件像素平面
//! - **音频**: 软件解码后归一化为 32 位浮点 (交错或平面), 采样率不变
//! - **时间**: 每个缓冲带呈现时间与时长; 视频时间戳必须单调不减
//!
//! 所有输出经由一个回调同步交付, 交付即转移所有权.
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use liu::{OutputBuffer, ReaderConfig, VideoReader};
//! # fn open_demuxer() -> liu::MemoryDemuxer { liu::MemoryDemuxer::new(Vec::new(), Vec::new()) }
//!
//! let mut reader = VideoReader::new(open_demuxer(), liu::default_codec_registry())
//!     .with_config(ReaderConfig::default());
//! let outcome = reader
//!     .start("file:///tmp/demo.mp4", |buffer: OutputBuffer| {
//!         println!("{:?} @ {}", buffer.media_type(), buffer.presentation_time());
//!     })
//!     .unwrap();
//! println!("结束: {}", outcome.termination);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `liu-core` | 时间基、时间戳、像素/采样格式、错误类型 |
//! | `liu-codec` | 解码器与硬件设备契约, 内置软件解码器 |
//! | `liu-format` | 输入源契约与流描述 |
//! | `liu-resample` | 音频格式转换 |

/// 核心类型
pub use liu_core as core;

/// 解码器与硬件设备契约
pub use liu_codec as codec;

/// 输入源契约
pub use liu_format as format;

/// 音频格式转换
pub use liu_resample as resample;

pub mod audio;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod output;
mod pipeline;
pub mod reader;
pub mod timing;
pub mod video;

pub use audio::AudioPipeline;
pub use catalog::{Route, StreamCatalog};
pub use config::{AudioLayout, ReaderConfig};
pub use liu_core::{LiuError, LiuResult};
pub use liu_format::MemoryDemuxer;
pub use output::{
    AudioBuffer, AudioFormatDescription, BufferSink, OutputBuffer, VideoBuffer,
    VideoFormatDescription, VideoImage,
};
pub use pipeline::PipelineState;
pub use reader::{ReaderState, RunOutcome, RunStats, StopHandle, Termination, VideoReader};
pub use timing::PtsGuard;
pub use video::{VideoOptions, VideoPipeline};

/// 获取 Liu 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// 创建已注册所有内置解码器的注册表
pub fn default_codec_registry() -> liu_codec::CodecRegistry {
    let mut registry = liu_codec::CodecRegistry::new();
    liu_codec::register_all(&mut registry);
    registry
}
