//! 音频声道布局.

use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// 声道位掩码, 每个位代表一个扬声器位置
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ChannelMask: u64 {
        const FRONT_LEFT     = 1 << 0;
        const FRONT_RIGHT    = 1 << 1;
        const FRONT_CENTER   = 1 << 2;
        /// 低频效果 (LFE / 重低音)
        const LOW_FREQUENCY  = 1 << 3;
        const BACK_LEFT      = 1 << 4;
        const BACK_RIGHT     = 1 << 5;
        const BACK_CENTER    = 1 << 8;
        const SIDE_LEFT      = 1 << 9;
        const SIDE_RIGHT     = 1 << 10;
    }
}

/// 声道布局: 声道数与扬声器位置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelLayout {
    /// 声道数量
    pub channels: u32,
    /// 声道位掩码, 非标准布局为空
    pub mask: ChannelMask,
}

impl ChannelLayout {
    pub const MONO: Self = Self {
        channels: 1,
        mask: ChannelMask::FRONT_CENTER,
    };

    pub const STEREO: Self = Self {
        channels: 2,
        mask: ChannelMask::FRONT_LEFT.union(ChannelMask::FRONT_RIGHT),
    };

    /// 2.1
    pub const SURROUND_2_1: Self = Self {
        channels: 3,
        mask: Self::STEREO.mask.union(ChannelMask::LOW_FREQUENCY),
    };

    /// 4.0 (quad)
    pub const QUAD: Self = Self {
        channels: 4,
        mask: Self::STEREO
            .mask
            .union(ChannelMask::BACK_LEFT)
            .union(ChannelMask::BACK_RIGHT),
    };

    /// 5.0
    pub const SURROUND_5_0: Self = Self {
        channels: 5,
        mask: Self::QUAD.mask.union(ChannelMask::FRONT_CENTER),
    };

    /// 5.1
    pub const SURROUND_5_1: Self = Self {
        channels: 6,
        mask: Self::SURROUND_5_0.mask.union(ChannelMask::LOW_FREQUENCY),
    };

    /// 7.1
    pub const SURROUND_7_1: Self = Self {
        channels: 8,
        mask: Self::SURROUND_5_1
            .mask
            .union(ChannelMask::SIDE_LEFT)
            .union(ChannelMask::SIDE_RIGHT),
    };

    /// 按声道数取默认布局
    ///
    /// 音频管线的输出布局即由此决定. 没有标准布局的声道数返回空掩码.
    pub fn from_channels(channels: u32) -> Self {
        match channels {
            1 => Self::MONO,
            2 => Self::STEREO,
            3 => Self::SURROUND_2_1,
            4 => Self::QUAD,
            5 => Self::SURROUND_5_0,
            6 => Self::SURROUND_5_1,
            8 => Self::SURROUND_7_1,
            n => Self {
                channels: n,
                mask: ChannelMask::empty(),
            },
        }
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MONO => write!(f, "mono"),
            Self::STEREO => write!(f, "stereo"),
            Self::SURROUND_2_1 => write!(f, "2.1"),
            Self::QUAD => write!(f, "quad"),
            Self::SURROUND_5_0 => write!(f, "5.0"),
            Self::SURROUND_5_1 => write!(f, "5.1"),
            Self::SURROUND_7_1 => write!(f, "7.1"),
            _ => write!(f, "{}ch", self.channels),
        }
    }
}
