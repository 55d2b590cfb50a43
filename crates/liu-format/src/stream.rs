//! 流描述.
//!
//! 在流探测时创建一次, 此后不再修改. 解码管线持有它的副本.

use liu_codec::{AudioCodecParams, CodecId, CodecParameters, CodecParamsType, VideoCodecParams};
use liu_core::{ChannelLayout, MediaType, PixelFormat, Rational, SampleFormat};

/// 流描述
#[derive(Debug, Clone)]
pub struct Stream {
    /// 流索引 (在容器中的位置, 从 0 开始)
    pub index: usize,
    pub media_type: MediaType,
    pub codec_id: CodecId,
    /// 时间基, 数据包与帧的 pts 以它为单位
    pub time_base: Rational,
    /// 编解码器私有数据 (如 SPS/PPS)
    pub extra_data: Vec<u8>,
    pub params: StreamParams,
}

/// 流特定参数
#[derive(Debug, Clone)]
pub enum StreamParams {
    Video(VideoStreamParams),
    Audio(AudioStreamParams),
    /// 字幕、数据等管线不处理的流
    Other,
}

#[derive(Debug, Clone)]
pub struct VideoStreamParams {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
    /// 平均帧率, 帧时长未知时用于推算
    pub frame_rate: Rational,
}

#[derive(Debug, Clone)]
pub struct AudioStreamParams {
    pub sample_rate: u32,
    pub channel_layout: ChannelLayout,
    pub sample_format: SampleFormat,
    /// 每帧采样数 (0 表示可变)
    pub frame_size: u32,
}

impl Stream {
    /// 视频流描述
    pub fn video(
        index: usize,
        codec_id: CodecId,
        time_base: Rational,
        params: VideoStreamParams,
    ) -> Self {
        Self {
            index,
            media_type: MediaType::Video,
            codec_id,
            time_base,
            extra_data: Vec::new(),
            params: StreamParams::Video(params),
        }
    }

    /// 音频流描述
    pub fn audio(
        index: usize,
        codec_id: CodecId,
        time_base: Rational,
        params: AudioStreamParams,
    ) -> Self {
        Self {
            index,
            media_type: MediaType::Audio,
            codec_id,
            time_base,
            extra_data: Vec::new(),
            params: StreamParams::Audio(params),
        }
    }

    pub fn video_params(&self) -> Option<&VideoStreamParams> {
        match &self.params {
            StreamParams::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn audio_params(&self) -> Option<&AudioStreamParams> {
        match &self.params {
            StreamParams::Audio(a) => Some(a),
            _ => None,
        }
    }

    /// 转换为打开解码器所需的参数
    pub fn codec_parameters(&self) -> CodecParameters {
        let params = match &self.params {
            StreamParams::Video(v) => CodecParamsType::Video(VideoCodecParams {
                width: v.width,
                height: v.height,
                pixel_format: v.pixel_format,
                frame_rate: v.frame_rate,
            }),
            StreamParams::Audio(a) => CodecParamsType::Audio(AudioCodecParams {
                sample_rate: a.sample_rate,
                channel_layout: a.channel_layout,
                sample_format: a.sample_format,
                frame_size: a.frame_size,
            }),
            StreamParams::Other => CodecParamsType::None,
        };
        CodecParameters {
            codec_id: self.codec_id,
            extra_data: self.extra_data.clone(),
            params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_视频流转换为解码参数() {
        let stream = Stream::video(
            0,
            CodecId::H264,
            Rational::new(1, 90000),
            VideoStreamParams {
                width: 1920,
                height: 1080,
                pixel_format: PixelFormat::Yuv420p,
                frame_rate: Rational::new(30, 1),
            },
        );
        let params = stream.codec_parameters();
        assert_eq!(params.codec_id, CodecId::H264);
        let v = params.video().expect("应为视频参数");
        assert_eq!((v.width, v.height), (1920, 1080));
        assert!(stream.audio_params().is_none());
    }

    #[test]
    fn test_音频流转换为解码参数() {
        let stream = Stream::audio(
            1,
            CodecId::Aac,
            Rational::new(1, 48000),
            AudioStreamParams {
                sample_rate: 48000,
                channel_layout: ChannelLayout::STEREO,
                sample_format: SampleFormat::F32p,
                frame_size: 1024,
            },
        );
        let a = stream.codec_parameters().audio().cloned().expect("应为音频参数");
        assert_eq!(a.sample_rate, 48000);
        assert_eq!(a.channel_layout, ChannelLayout::STEREO);
        assert_eq!(stream.media_type, MediaType::Audio);
    }
}
