//! 解码后的帧.
//!
//! 视频帧有两种形态: 硬件表面 (`surface` 持有平台句柄, 不含像素平面)
//! 与平面数据 (`data` / `linesize`). 二者由 `pixel_format.is_hardware()` 区分.

use bitflags::bitflags;
use liu_core::{ChannelLayout, NOPTS_VALUE, PixelFormat, Rational, SampleFormat};

use crate::hw::SurfaceRef;

bitflags! {
    /// 帧标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrameFlags: u32 {
        /// 关键帧
        const KEY     = 1 << 0;
        /// 解码器检测到损坏, 画面可能不可用
        const CORRUPT = 1 << 1;
    }
}

/// 视频帧
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// 像素平面, 硬件表面帧为空
    pub data: Vec<Vec<u8>>,
    /// 每个平面的行字节数
    pub linesize: Vec<usize>,
    /// 硬件表面句柄
    pub surface: Option<SurfaceRef>,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// 显示时间戳 (流时间基)
    pub pts: i64,
    pub time_base: Rational,
    /// 帧时长 (流时间基), 0 表示未知
    pub duration: i64,
    pub flags: FrameFlags,
}

impl VideoFrame {
    /// 创建平面数据帧, 按像素格式预留平面
    pub fn new(width: u32, height: u32, pixel_format: PixelFormat) -> Self {
        let plane_count = pixel_format.plane_count() as usize;
        Self {
            data: vec![Vec::new(); plane_count],
            linesize: vec![0; plane_count],
            surface: None,
            width,
            height,
            pixel_format,
            pts: NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            duration: 0,
            flags: FrameFlags::empty(),
        }
    }

    /// 包装硬件表面, 尺寸与格式取自表面本身
    pub fn from_surface(surface: SurfaceRef) -> Self {
        Self {
            data: Vec::new(),
            linesize: Vec::new(),
            width: surface.width(),
            height: surface.height(),
            pixel_format: surface.format(),
            surface: Some(surface),
            pts: NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            duration: 0,
            flags: FrameFlags::empty(),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        self.flags.contains(FrameFlags::CORRUPT)
    }

    pub fn is_keyframe(&self) -> bool {
        self.flags.contains(FrameFlags::KEY)
    }
}

/// 音频帧
///
/// 平面格式: `data` 中每个 Vec 对应一个声道.
/// 交错格式: `data` 中只有一个 Vec, 所有声道交替排列.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub data: Vec<Vec<u8>>,
    /// 每声道采样数
    pub nb_samples: u32,
    pub sample_rate: u32,
    pub sample_format: SampleFormat,
    pub channel_layout: ChannelLayout,
    pub pts: i64,
    pub time_base: Rational,
    pub duration: i64,
}

impl AudioFrame {
    pub fn new(
        nb_samples: u32,
        sample_rate: u32,
        sample_format: SampleFormat,
        channel_layout: ChannelLayout,
    ) -> Self {
        let plane_count = if sample_format.is_planar() {
            channel_layout.channels as usize
        } else {
            1
        };
        Self {
            data: vec![Vec::new(); plane_count],
            nb_samples,
            sample_rate,
            sample_format,
            channel_layout,
            pts: NOPTS_VALUE,
            time_base: Rational::UNDEFINED,
            duration: 0,
        }
    }
}

/// 解码器输出
#[derive(Debug, Clone)]
pub enum Frame {
    Video(VideoFrame),
    Audio(AudioFrame),
}
