//! # liu-core
//!
//! Liu 解码管线的基础类型: 有理数时间基、时间戳、像素/采样格式、声道布局,
//! 以及整个工作区共用的错误类型.

pub mod channel_layout;
pub mod error;
pub mod media_type;
pub mod pixel_format;
pub mod rational;
pub mod sample_format;
pub mod timestamp;

pub use channel_layout::{ChannelLayout, ChannelMask};
pub use error::{LiuError, LiuResult};
pub use media_type::MediaType;
pub use pixel_format::PixelFormat;
pub use rational::Rational;
pub use sample_format::SampleFormat;
pub use timestamp::{NOPTS_VALUE, Timestamp};
