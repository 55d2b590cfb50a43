//! # liu-codec
//!
//! 解码侧的引擎契约. 管线只依赖这里的 trait, 具体引擎 (平台硬件解码器、
//! 第三方软件解码库) 在外部实现并注册进 [`CodecRegistry`].
//!
//! 内置两个纯软件参考解码器: PCM 音频与 RAW 视频, 用于无平台引擎时的端到端运行.
//!
//! ```rust
//! use liu_codec::{CodecId, CodecRegistry};
//!
//! let mut reg = CodecRegistry::new();
//! liu_codec::register_all(&mut reg);
//! assert!(reg.has_decoder(CodecId::PcmS16le));
//! ```

pub mod codec_id;
pub mod codec_parameters;
pub mod decoder;
pub mod decoders;
pub mod frame;
pub mod hw;
pub mod packet;
pub mod registry;

pub use codec_id::CodecId;
pub use codec_parameters::{AudioCodecParams, CodecParameters, CodecParamsType, VideoCodecParams};
pub use decoder::{Decoder, GetFormatFn};
pub use frame::{AudioFrame, Frame, FrameFlags, VideoFrame};
pub use hw::{
    HwDevice, HwDeviceContext, HwDeviceProvider, HwDeviceType, Surface, SurfaceRef,
    select_pixel_format,
};
pub use packet::Packet;
pub use registry::{CodecRegistry, DecoderFactory};

/// 注册所有内置软件解码器
pub fn register_all(registry: &mut CodecRegistry) {
    decoders::register_all_decoders(registry);
}
