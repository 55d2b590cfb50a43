//! 编解码器标识符.

use std::fmt;

use liu_core::MediaType;

/// 编解码器标识符, 与容器格式无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    /// 未知编解码器
    None,

    /// H.264 / AVC
    H264,
    /// H.265 / HEVC
    H265,
    Vp9,
    Av1,
    /// MPEG-4 Part 2
    Mpeg4,
    ProRes,
    /// 未压缩视频
    RawVideo,

    Aac,
    Mp3,
    Opus,
    Flac,
    Ac3,
    PcmU8,
    PcmS16le,
    PcmS16be,
    PcmS32le,
    PcmF32le,
}

impl CodecId {
    /// 所属媒体类型
    pub const fn media_type(&self) -> Option<MediaType> {
        match self {
            Self::None => None,
            Self::H264
            | Self::H265
            | Self::Vp9
            | Self::Av1
            | Self::Mpeg4
            | Self::ProRes
            | Self::RawVideo => Some(MediaType::Video),
            _ => Some(MediaType::Audio),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::H264 => "h264",
            Self::H265 => "hevc",
            Self::Vp9 => "vp9",
            Self::Av1 => "av1",
            Self::Mpeg4 => "mpeg4",
            Self::ProRes => "prores",
            Self::RawVideo => "rawvideo",
            Self::Aac => "aac",
            Self::Mp3 => "mp3",
            Self::Opus => "opus",
            Self::Flac => "flac",
            Self::Ac3 => "ac3",
            Self::PcmU8 => "pcm_u8",
            Self::PcmS16le => "pcm_s16le",
            Self::PcmS16be => "pcm_s16be",
            Self::PcmS32le => "pcm_s32le",
            Self::PcmF32le => "pcm_f32le",
        }
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
