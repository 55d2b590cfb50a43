//! 两条解码管线共用的状态与解码器准备步骤.

use std::fmt;

use liu_codec::{CodecRegistry, Decoder};
use liu_core::{LiuError, LiuResult};
use liu_format::Stream;

/// 解码管线状态
///
/// `Uninitialized → Ready` 只在 `prepare` 中发生一次;
/// 输入结束时冲刷进入 `Draining`; 关闭后为 `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready,
    Draining,
    Closed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "未初始化",
            Self::Ready => "就绪",
            Self::Draining => "冲刷中",
            Self::Closed => "已关闭",
        };
        write!(f, "{name}")
    }
}

/// 按流的编解码器创建解码器实例
pub(crate) fn create_decoder(
    stream: &Stream,
    codecs: &CodecRegistry,
) -> LiuResult<Box<dyn Decoder>> {
    let unavailable = || LiuError::DecoderUnavailable {
        stream: stream.index,
        codec: stream.codec_id.to_string(),
    };
    if !codecs.has_decoder(stream.codec_id) {
        return Err(unavailable());
    }
    codecs.create_decoder(stream.codec_id).map_err(|e| match e {
        LiuError::Unsupported(_) => unavailable(),
        other => {
            LiuError::DecoderOpenFailed(format!("创建 {} 解码器: {other}", stream.codec_id))
        }
    })
}

/// 用流参数打开解码器
pub(crate) fn open_decoder(decoder: &mut dyn Decoder, stream: &Stream) -> LiuResult<()> {
    let result = decoder.open(&stream.codec_parameters());
    result.map_err(|e| {
        LiuError::DecoderOpenFailed(format!("流 #{} {}: {e}", stream.index, decoder.name()))
    })
}
