//! 输出缓冲: 唯一跨越管线边界的实体.
//!
//! 交付即转移所有权. 接收方丢弃缓冲就是释放: 硬件表面在最后一个
//! 引用析构时归还设备, 转换后的音频样本是缓冲自己持有的内存.

use liu_codec::SurfaceRef;
use liu_core::{ChannelLayout, MediaType, PixelFormat, SampleFormat, Timestamp};

/// 输出缓冲
#[derive(Debug)]
pub enum OutputBuffer {
    Video(VideoBuffer),
    Audio(AudioBuffer),
}

impl OutputBuffer {
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Video(_) => MediaType::Video,
            Self::Audio(_) => MediaType::Audio,
        }
    }

    pub fn presentation_time(&self) -> Timestamp {
        match self {
            Self::Video(v) => v.presentation_time,
            Self::Audio(a) => a.presentation_time,
        }
    }

    pub fn duration(&self) -> Timestamp {
        match self {
            Self::Video(v) => v.duration,
            Self::Audio(a) => a.duration,
        }
    }

    pub fn as_video(&self) -> Option<&VideoBuffer> {
        match self {
            Self::Video(v) => Some(v),
            Self::Audio(_) => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioBuffer> {
        match self {
            Self::Audio(a) => Some(a),
            Self::Video(_) => None,
        }
    }
}

/// 可呈现图像
#[derive(Debug)]
pub enum VideoImage {
    /// 硬件驻留表面, 未拷贝像素
    Surface(SurfaceRef),
    /// 软件解码的像素平面
    Planes {
        data: Vec<Vec<u8>>,
        linesize: Vec<usize>,
    },
}

/// 视频格式描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoFormatDescription {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

/// 带时间信息的视频缓冲
#[derive(Debug)]
pub struct VideoBuffer {
    pub image: VideoImage,
    pub format: VideoFormatDescription,
    /// pts × 流时间基
    pub presentation_time: Timestamp,
    /// 帧时长, 纳秒时间基
    pub duration: Timestamp,
    pub keyframe: bool,
    /// 解码器标记为损坏, 已记录诊断
    pub corrupt: bool,
}

impl VideoBuffer {
    pub fn is_hardware(&self) -> bool {
        matches!(self.image, VideoImage::Surface(_))
    }
}

/// 音频格式描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormatDescription {
    pub sample_rate: u32,
    pub channels: u32,
    /// `F32` 或 `F32p`
    pub sample_format: SampleFormat,
    pub bits_per_channel: u32,
    /// 一个采样帧在单个平面中的字节数: 交错为 4 × 声道数, 平面为 4
    pub bytes_per_frame: u32,
}

impl AudioFormatDescription {
    /// 32 位浮点格式描述
    pub fn float32(sample_rate: u32, channels: u32, sample_format: SampleFormat) -> Self {
        let bytes = sample_format.bytes_per_sample();
        let bytes_per_frame = if sample_format.is_planar() {
            bytes
        } else {
            bytes * channels
        };
        Self {
            sample_rate,
            channels,
            sample_format,
            bits_per_channel: bytes * 8,
            bytes_per_frame,
        }
    }
}

/// 带时间信息的音频缓冲
#[derive(Debug)]
pub struct AudioBuffer {
    /// 交错格式一个平面, 平面格式每声道一个
    pub planes: Vec<Vec<f32>>,
    /// 每声道采样数
    pub frame_count: u32,
    pub format: AudioFormatDescription,
    pub channel_layout: ChannelLayout,
    /// 以 1/采样率 为时间基
    pub presentation_time: Timestamp,
    /// frame_count / 采样率
    pub duration: Timestamp,
}

impl AudioBuffer {
    pub fn sample_rate(&self) -> u32 {
        self.format.sample_rate
    }
}

/// 输出回调
///
/// 在解复用线程上同步调用, 每个缓冲一次. 没有背压通道: 接收方阻塞会拖住整条管线.
pub trait BufferSink {
    fn on_buffer(&mut self, buffer: OutputBuffer);
}

impl<F> BufferSink for F
where
    F: FnMut(OutputBuffer),
{
    fn on_buffer(&mut self, buffer: OutputBuffer) {
        self(buffer)
    }
}
