//! 读取器配置.
//!
//! 所有字段都有默认值, 可以从 JSON 片段部分覆盖:
//!
//! ```rust
//! use liu::config::{AudioLayout, ReaderConfig};
//!
//! let config = ReaderConfig::from_json_str(r#"{ "frame_limit": 300, "audio_layout": "planar" }"#)
//!     .unwrap();
//! assert_eq!(config.frame_limit, Some(300));
//! assert_eq!(config.audio_layout, AudioLayout::Planar);
//! assert!(config.software_fallback);
//! ```

use liu_codec::HwDeviceType;
use liu_core::{LiuError, LiuResult, SampleFormat};
use serde::{Deserialize, Serialize};

/// 规范音频输出的样本排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioLayout {
    /// 交错 32 位浮点 (flt)
    #[default]
    Packed,
    /// 平面 32 位浮点 (fltp)
    Planar,
}

impl AudioLayout {
    pub const fn sample_format(&self) -> SampleFormat {
        match self {
            Self::Packed => SampleFormat::F32,
            Self::Planar => SampleFormat::F32p,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// 请求的硬件设备类型
    pub hw_device: HwDeviceType,
    pub audio_layout: AudioLayout,
    /// 允许非硬件表面的视频帧以像素平面形式输出.
    /// 关闭后只输出硬件表面, 且硬件上下文不可用时启动失败.
    pub software_fallback: bool,
    /// 丢弃标记为损坏的视频帧 (总会先记录警告)
    pub drop_corrupt_frames: bool,
    /// 活动流的解码器无法准备时直接让启动失败
    pub require_decoders: bool,
    /// 输出这么多视频缓冲后自动停止
    pub frame_limit: Option<u64>,
    /// 输入结束时冲刷解码器, 取出缓存的帧
    pub flush_on_end: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            hw_device: HwDeviceType::platform_default(),
            audio_layout: AudioLayout::Packed,
            software_fallback: true,
            drop_corrupt_frames: false,
            require_decoders: false,
            frame_limit: None,
            flush_on_end: true,
        }
    }
}

impl ReaderConfig {
    /// 从 JSON 解析, 缺省字段取默认值
    pub fn from_json_str(json: &str) -> LiuResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| LiuError::InvalidArgument(format!("解析读取器配置失败: {e}")))
    }
}
