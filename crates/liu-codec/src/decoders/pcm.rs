//! PCM 音频解码器.
//!
//! 未压缩 PCM 直接切分为交错格式的音频帧, 大端变体转换为小端.

use liu_core::{ChannelLayout, LiuError, LiuResult, SampleFormat};
use log::debug;

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::decoder::Decoder;
use crate::frame::{AudioFrame, Frame};
use crate::packet::Packet;

/// 支持的 PCM 变体
pub const SUPPORTED: [CodecId; 5] = [
    CodecId::PcmU8,
    CodecId::PcmS16le,
    CodecId::PcmS16be,
    CodecId::PcmS32le,
    CodecId::PcmF32le,
];

/// 码流样本格式与是否需要字节翻转
fn sample_layout(codec_id: CodecId) -> Option<(SampleFormat, bool)> {
    Some(match codec_id {
        CodecId::PcmU8 => (SampleFormat::U8, false),
        CodecId::PcmS16le => (SampleFormat::S16, false),
        CodecId::PcmS16be => (SampleFormat::S16, true),
        CodecId::PcmS32le => (SampleFormat::S32, false),
        CodecId::PcmF32le => (SampleFormat::F32, false),
        _ => return None,
    })
}

/// PCM 音频解码器
pub struct PcmDecoder {
    codec_id: CodecId,
    sample_format: SampleFormat,
    big_endian: bool,
    sample_rate: u32,
    channel_layout: ChannelLayout,
    /// 每个采样块的字节数 (样本字节数 * 声道数)
    block_align: usize,
    pending: Option<AudioFrame>,
    opened: bool,
    flushing: bool,
}

impl PcmDecoder {
    pub fn create(codec_id: CodecId) -> LiuResult<Box<dyn Decoder>> {
        let (sample_format, big_endian) = sample_layout(codec_id)
            .ok_or_else(|| LiuError::Unsupported(format!("不支持的 PCM 格式: {codec_id}")))?;
        Ok(Box::new(Self {
            codec_id,
            sample_format,
            big_endian,
            sample_rate: 0,
            channel_layout: ChannelLayout::MONO,
            block_align: 0,
            pending: None,
            opened: false,
            flushing: false,
        }))
    }
}

impl Decoder for PcmDecoder {
    fn codec_id(&self) -> CodecId {
        self.codec_id
    }

    fn name(&self) -> &str {
        self.codec_id.name()
    }

    fn open(&mut self, params: &CodecParameters) -> LiuResult<()> {
        let audio = params
            .audio()
            .ok_or_else(|| LiuError::InvalidArgument("PCM 解码器需要音频参数".into()))?;
        if audio.sample_rate == 0 {
            return Err(LiuError::InvalidArgument("采样率不能为 0".into()));
        }
        if audio.channel_layout.channels == 0 {
            return Err(LiuError::InvalidArgument("声道数不能为 0".into()));
        }

        self.sample_rate = audio.sample_rate;
        self.channel_layout = audio.channel_layout;
        self.block_align =
            self.sample_format.bytes_per_sample() as usize * audio.channel_layout.channels as usize;
        self.pending = None;
        self.opened = true;
        self.flushing = false;

        debug!(
            "打开 {} 解码器: {} Hz, {}, 输出 {}",
            self.name(),
            self.sample_rate,
            self.channel_layout,
            self.sample_format,
        );
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> LiuResult<()> {
        if !self.opened {
            return Err(LiuError::Codec("解码器未打开, 请先调用 open()".into()));
        }
        if self.pending.is_some() {
            return Err(LiuError::NeedMoreData);
        }
        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }
        if packet.size() % self.block_align != 0 {
            return Err(LiuError::InvalidData(format!(
                "数据大小 {} 不是 block_align {} 的整数倍",
                packet.size(),
                self.block_align,
            )));
        }

        let nb_samples = (packet.size() / self.block_align) as u32;
        let mut frame = AudioFrame::new(
            nb_samples,
            self.sample_rate,
            self.sample_format,
            self.channel_layout,
        );
        frame.pts = packet.pts;
        frame.time_base = packet.time_base;
        frame.duration = i64::from(nb_samples);
        frame.data[0] = if self.big_endian {
            packet
                .data
                .chunks_exact(2)
                .flat_map(|pair| [pair[1], pair[0]])
                .collect()
        } else {
            packet.data.to_vec()
        };

        self.pending = Some(frame);
        Ok(())
    }

    fn receive_frame(&mut self) -> LiuResult<Frame> {
        if let Some(frame) = self.pending.take() {
            return Ok(Frame::Audio(frame));
        }
        if self.flushing {
            return Err(LiuError::Eof);
        }
        Err(LiuError::NeedMoreData)
    }

    fn close(&mut self) {
        self.pending = None;
        self.opened = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec_parameters::{AudioCodecParams, CodecParamsType};
    use liu_core::Rational;

    fn audio_params(codec_id: CodecId, channels: u32) -> CodecParameters {
        CodecParameters {
            codec_id,
            extra_data: Vec::new(),
            params: CodecParamsType::Audio(AudioCodecParams {
                sample_rate: 44100,
                channel_layout: ChannelLayout::from_channels(channels),
                sample_format: SampleFormat::None,
                frame_size: 0,
            }),
        }
    }

    fn decode_one(dec: &mut Box<dyn Decoder>, data: Vec<u8>) -> AudioFrame {
        let pkt = Packet::from_data(data).with_timing(0, 441, 0, Rational::new(1, 44100));
        dec.send_packet(&pkt).unwrap();
        match dec.receive_frame().unwrap() {
            Frame::Audio(af) => af,
            Frame::Video(_) => panic!("期望音频帧"),
        }
    }

    #[test]
    fn test_pcm_s16le_decode() {
        let mut dec = PcmDecoder::create(CodecId::PcmS16le).unwrap();
        dec.open(&audio_params(CodecId::PcmS16le, 2)).unwrap();

        let data = vec![0x00, 0x01, 0xFF, 0x7F, 0x00, 0x80, 0x01, 0x00];
        let af = decode_one(&mut dec, data.clone());
        assert_eq!(af.nb_samples, 2);
        assert_eq!(af.sample_format, SampleFormat::S16);
        assert_eq!(af.data[0], data);
        assert_eq!(af.pts, 441);
        assert_eq!(af.duration, 2);
    }

    #[test]
    fn test_pcm_s16be_字节翻转() {
        let mut dec = PcmDecoder::create(CodecId::PcmS16be).unwrap();
        dec.open(&audio_params(CodecId::PcmS16be, 1)).unwrap();
        let af = decode_one(&mut dec, vec![0x01, 0x00, 0x7F, 0xFF]);
        assert_eq!(af.data[0], vec![0x00, 0x01, 0xFF, 0x7F]);
    }

    #[test]
    fn test_数据不对齐返回错误() {
        let mut dec = PcmDecoder::create(CodecId::PcmS32le).unwrap();
        dec.open(&audio_params(CodecId::PcmS32le, 2)).unwrap();
        let pkt = Packet::from_data(vec![0u8; 6]);
        assert!(matches!(dec.send_packet(&pkt), Err(LiuError::InvalidData(_))));
    }

    #[test]
    fn test_空包之后返回eof() {
        let mut dec = PcmDecoder::create(CodecId::PcmU8).unwrap();
        dec.open(&audio_params(CodecId::PcmU8, 1)).unwrap();
        assert!(matches!(dec.receive_frame(), Err(LiuError::NeedMoreData)));
        dec.send_packet(&Packet::empty()).unwrap();
        assert!(matches!(dec.receive_frame(), Err(LiuError::Eof)));
    }

    #[test]
    fn test_未打开时送包失败() {
        let mut dec = PcmDecoder::create(CodecId::PcmU8).unwrap();
        assert!(matches!(
            dec.send_packet(&Packet::from_data(vec![1u8])),
            Err(LiuError::Codec(_))
        ));
    }
}
