//! 内置纯软件解码器.

pub mod pcm;
pub mod rawvideo;

use crate::codec_id::CodecId;
use crate::registry::CodecRegistry;

/// 注册所有内置解码器
pub fn register_all_decoders(registry: &mut CodecRegistry) {
    registry.register_decoder(CodecId::RawVideo, "rawvideo", rawvideo::RawVideoDecoder::create);
    for codec_id in pcm::SUPPORTED {
        registry.register_decoder(codec_id, codec_id.name(), move || {
            pcm::PcmDecoder::create(codec_id)
        });
    }
}
