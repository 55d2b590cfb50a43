//! 音频采样格式.
//!
//! 解码引擎可能交付下列任意一种格式 (交错或平面), 由重采样器统一解码为 f32;
//! 管线对外只输出 32 位浮点: 交错的 `F32` 或平面的 `F32p`.

use std::fmt;

/// 音频采样格式
///
/// 带 `p` 后缀的是平面格式, 每个声道一个缓冲区; 其余为交错格式 (LRLR...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// 未指定
    None,
    U8,
    S16,
    S32,
    /// 32 位浮点, 交错 (默认输出格式)
    F32,
    F64,
    U8p,
    S16p,
    S32p,
    /// 32 位浮点, 平面 (平面输出格式)
    F32p,
    F64p,
}

impl SampleFormat {
    /// 每个采样点占用的字节数
    pub const fn bytes_per_sample(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::U8 | Self::U8p => 1,
            Self::S16 | Self::S16p => 2,
            Self::S32 | Self::S32p | Self::F32 | Self::F32p => 4,
            Self::F64 | Self::F64p => 8,
        }
    }

    pub const fn is_planar(&self) -> bool {
        matches!(
            self,
            Self::U8p | Self::S16p | Self::S32p | Self::F32p | Self::F64p
        )
    }

    /// 管线可以输出的格式 (`F32` / `F32p`)
    pub const fn is_output_format(&self) -> bool {
        matches!(self, Self::F32 | Self::F32p)
    }

    /// 对应的交错格式, 用于按样本类型解码平面数据
    pub const fn to_interleaved(&self) -> Self {
        match self {
            Self::U8p => Self::U8,
            Self::S16p => Self::S16,
            Self::S32p => Self::S32,
            Self::F32p => Self::F32,
            Self::F64p => Self::F64,
            other => *other,
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::U8 => "u8",
            Self::S16 => "s16",
            Self::S32 => "s32",
            Self::F32 => "flt",
            Self::F64 => "dbl",
            Self::U8p => "u8p",
            Self::S16p => "s16p",
            Self::S32p => "s32p",
            Self::F32p => "fltp",
            Self::F64p => "dblp",
        };
        write!(f, "{name}")
    }
}
