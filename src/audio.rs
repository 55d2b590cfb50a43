//! 音频解码管线.
//!
//! 软件解码后经格式转换引擎归一化为 32 位浮点 (交错或平面),
//! 采样率与声道数保持不变. 转换引擎在第一帧到达时按帧参数惰性创建,
//! 帧参数变化时重建.

use std::iter::FusedIterator;

use liu_codec::{AudioFrame, CodecRegistry, Decoder, Frame, Packet};
use liu_core::{ChannelLayout, LiuError, LiuResult, NOPTS_VALUE, Rational, Timestamp};
use liu_format::Stream;
use liu_resample::{ResampleConfig, Resampler, ResamplerFactory};
use log::{debug, warn};

use crate::config::AudioLayout;
use crate::output::{AudioBuffer, AudioFormatDescription};
use crate::pipeline::{self, PipelineState};

/// 音频解码管线
pub struct AudioPipeline {
    state: PipelineState,
    layout: AudioLayout,
    factory: ResamplerFactory,
    stream: Option<Stream>,
    decoder: Option<Box<dyn Decoder>>,
    resampler: Option<Box<dyn Resampler>>,
}

impl AudioPipeline {
    pub fn new(layout: AudioLayout, factory: ResamplerFactory) -> Self {
        Self {
            state: PipelineState::Uninitialized,
            layout,
            factory,
            stream: None,
            decoder: None,
            resampler: None,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stream(&self) -> Option<&Stream> {
        self.stream.as_ref()
    }

    /// 格式转换引擎已创建
    pub fn has_resampler(&self) -> bool {
        self.resampler.is_some()
    }

    /// 准备解码器, 已就绪时直接返回
    pub fn prepare(&mut self, stream: &Stream, codecs: &CodecRegistry) -> LiuResult<()> {
        match self.state {
            PipelineState::Uninitialized => {}
            PipelineState::Closed => {
                return Err(LiuError::InvalidArgument("音频管线已关闭".into()));
            }
            _ => return Ok(()),
        }
        let mut decoder = pipeline::create_decoder(stream, codecs)?;
        pipeline::open_decoder(decoder.as_mut(), stream)?;
        debug!("音频解码器 {} 已打开 (流 #{})", decoder.name(), stream.index);

        self.decoder = Some(decoder);
        self.stream = Some(stream.clone());
        self.state = PipelineState::Ready;
        Ok(())
    }

    /// 送入一个数据包, 返回转换后的音频缓冲
    ///
    /// 送包失败只记录日志, 仍会取出解码器中已有的帧.
    pub fn submit(&mut self, packet: Packet) -> AudioDrain<'_> {
        if self.state != PipelineState::Ready {
            return AudioDrain::new(self, true);
        }
        let sent = match self.decoder.as_mut() {
            Some(decoder) => decoder.send_packet(&packet),
            None => return AudioDrain::new(self, true),
        };
        if let Err(e) = sent {
            warn!(
                "{}",
                LiuError::PacketSubmitFailed(format!("音频 pts={}: {e}", packet.pts))
            );
        }
        drop(packet);
        AudioDrain::new(self, false)
    }

    /// 输入结束: 送入空包, 取出解码器缓存的帧
    pub fn flush(&mut self) -> AudioDrain<'_> {
        if self.state != PipelineState::Ready {
            return AudioDrain::new(self, true);
        }
        self.state = PipelineState::Draining;
        let sent = match self.decoder.as_mut() {
            Some(decoder) => decoder.send_packet(&Packet::empty()),
            None => return AudioDrain::new(self, true),
        };
        if let Err(e) = sent {
            warn!("冲刷音频解码器失败: {e}");
        }
        AudioDrain::new(self, false)
    }

    /// 先释放转换引擎, 再关闭解码器; 可重复调用
    pub fn close(&mut self) {
        if let Some(mut resampler) = self.resampler.take() {
            debug!("释放音频格式转换引擎");
            resampler.close();
        }
        if let Some(mut decoder) = self.decoder.take() {
            debug!("关闭音频解码器 {}", decoder.name());
            decoder.close();
        }
        self.state = PipelineState::Closed;
    }

    /// 取出下一帧; `None` 表示本轮已取空
    fn pull(&mut self) -> Option<Option<AudioBuffer>> {
        let received = self.decoder.as_mut()?.receive_frame();
        match received {
            Ok(Frame::Audio(frame)) => Some(self.convert(frame)),
            Ok(Frame::Video(_)) => {
                warn!("音频解码器输出了视频帧, 已忽略");
                Some(None)
            }
            Err(LiuError::NeedMoreData | LiuError::Eof) => None,
            Err(e) => {
                warn!("音频解码失败, 放弃本数据包的剩余输出: {e}");
                None
            }
        }
    }

    fn convert(&mut self, frame: AudioFrame) -> Option<AudioBuffer> {
        match self.try_convert(&frame) {
            Ok(buffer) => Some(buffer),
            Err(e) => {
                warn!("{e}, 丢弃音频帧 pts={}", frame.pts);
                None
            }
        }
    }

    fn try_convert(&mut self, frame: &AudioFrame) -> LiuResult<AudioBuffer> {
        let config = ResampleConfig {
            sample_rate: frame.sample_rate,
            src_sample_format: frame.sample_format,
            src_channel_layout: frame.channel_layout,
            dst_sample_format: self.layout.sample_format(),
            dst_channel_layout: ChannelLayout::from_channels(frame.channel_layout.channels),
        };
        let resampler = self.resampler_for(config)?;
        let converted = resampler
            .convert(&frame.data, frame.nb_samples)
            .map_err(|e| LiuError::ConversionFailed(e.to_string()))?;
        if converted.nb_samples == 0 {
            return Err(LiuError::ConversionFailed("转换产出 0 个采样".into()));
        }

        let rate = frame.sample_rate;
        let time_base = Rational::per_sample(rate);
        let presentation_time = self.presentation_time(frame, time_base);
        Ok(AudioBuffer {
            format: AudioFormatDescription::float32(
                rate,
                converted.channel_layout.channels,
                converted.sample_format,
            ),
            frame_count: converted.nb_samples,
            channel_layout: converted.channel_layout,
            planes: converted.planes,
            presentation_time,
            duration: Timestamp::new(i64::from(converted.nb_samples), time_base),
        })
    }

    /// 复用或重建转换引擎
    fn resampler_for(&mut self, config: ResampleConfig) -> LiuResult<&mut Box<dyn Resampler>> {
        let reusable = self
            .resampler
            .as_ref()
            .is_some_and(|resampler| *resampler.config() == config);
        if !reusable {
            if let Some(mut old) = self.resampler.take() {
                debug!("音频帧参数变化, 重建格式转换引擎");
                old.close();
            }
            let created = (self.factory)(&config)
                .map_err(|e| LiuError::ConversionFailed(format!("创建格式转换引擎: {e}")))?;
            self.resampler = Some(created);
        }
        self.resampler
            .as_mut()
            .ok_or_else(|| LiuError::Internal("格式转换引擎缺失".into()))
    }

    /// 以 1/采样率 为时间基的呈现时间
    fn presentation_time(&self, frame: &AudioFrame, time_base: Rational) -> Timestamp {
        if frame.pts == NOPTS_VALUE {
            return Timestamp::none();
        }
        let source = if frame.time_base.is_valid() {
            frame.time_base
        } else {
            match &self.stream {
                Some(stream) if stream.time_base.is_valid() => stream.time_base,
                _ => time_base,
            }
        };
        if source == time_base || !time_base.is_valid() {
            return Timestamp::new(frame.pts, source);
        }
        Timestamp::new(frame.pts, source).rescale(time_base)
    }
}

impl Drop for AudioPipeline {
    fn drop(&mut self) {
        self.close();
    }
}

/// 一次送包 (或冲刷) 产出的音频缓冲
pub struct AudioDrain<'a> {
    pipeline: &'a mut AudioPipeline,
    done: bool,
}

impl<'a> AudioDrain<'a> {
    fn new(pipeline: &'a mut AudioPipeline, done: bool) -> Self {
        Self { pipeline, done }
    }
}

impl Iterator for AudioDrain<'_> {
    type Item = AudioBuffer;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.pipeline.pull() {
                Some(Some(buffer)) => return Some(buffer),
                Some(None) => {}
                None => self.done = true,
            }
        }
        None
    }
}

impl FusedIterator for AudioDrain<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use liu_codec::CodecId;
    use liu_core::SampleFormat;
    use liu_format::AudioStreamParams;
    use liu_resample::ConvertedAudio;

    fn pcm_stream() -> Stream {
        Stream::audio(
            1,
            CodecId::PcmS16le,
            Rational::new(1, 48000),
            AudioStreamParams {
                sample_rate: 48000,
                channel_layout: ChannelLayout::STEREO,
                sample_format: SampleFormat::S16,
                frame_size: 0,
            },
        )
    }

    fn codecs() -> CodecRegistry {
        let mut codecs = CodecRegistry::new();
        liu_codec::register_all(&mut codecs);
        codecs
    }

    /// 4 个立体声采样, 左声道满幅, 右声道静音
    fn pcm_packet(pts: i64, time_base: Rational) -> Packet {
        let mut data = Vec::new();
        for _ in 0..4 {
            data.extend_from_slice(&i16::MAX.to_le_bytes());
            data.extend_from_slice(&0i16.to_le_bytes());
        }
        Packet::from_data(data).with_timing(1, pts, 4, time_base)
    }

    fn counting_factory(created: Arc<AtomicUsize>) -> ResamplerFactory {
        let inner = liu_resample::default_factory();
        Arc::new(move |config: &ResampleConfig| {
            created.fetch_add(1, Ordering::SeqCst);
            inner(config)
        })
    }

    #[test]
    fn test_交错浮点输出() {
        let mut pipeline = AudioPipeline::new(AudioLayout::Packed, liu_resample::default_factory());
        pipeline.prepare(&pcm_stream(), &codecs()).unwrap();
        assert!(!pipeline.has_resampler());

        let buffers: Vec<_> = pipeline
            .submit(pcm_packet(960, Rational::new(1, 48000)))
            .collect();
        assert_eq!(buffers.len(), 1);
        let buffer = &buffers[0];
        assert_eq!(buffer.frame_count, 4);
        assert_eq!(buffer.planes.len(), 1);
        assert_eq!(buffer.planes[0].len(), 8);
        assert!(buffer.planes[0][0] > 0.99);
        assert_eq!(buffer.planes[0][1], 0.0);
        assert_eq!(buffer.format.sample_format, SampleFormat::F32);
        assert_eq!(buffer.format.bytes_per_frame, 8);
        assert_eq!(buffer.presentation_time, Timestamp::new(960, Rational::new(1, 48000)));
        assert_eq!(buffer.duration, Timestamp::new(4, Rational::new(1, 48000)));
        assert!(pipeline.has_resampler());
    }

    #[test]
    fn test_平面浮点输出() {
        let mut pipeline = AudioPipeline::new(AudioLayout::Planar, liu_resample::default_factory());
        pipeline.prepare(&pcm_stream(), &codecs()).unwrap();

        let buffer = pipeline
            .submit(pcm_packet(0, Rational::new(1, 48000)))
            .next()
            .unwrap();
        assert_eq!(buffer.planes.len(), 2);
        assert_eq!(buffer.planes[1], vec![0.0; 4]);
        assert_eq!(buffer.format.sample_format, SampleFormat::F32p);
        assert_eq!(buffer.format.bytes_per_frame, 4);
    }

    #[test]
    fn test_毫秒时间基换算为采样刻度() {
        let mut pipeline = AudioPipeline::new(AudioLayout::Packed, liu_resample::default_factory());
        pipeline.prepare(&pcm_stream(), &codecs()).unwrap();

        let buffer = pipeline
            .submit(pcm_packet(20, Rational::new(1, 1000)))
            .next()
            .unwrap();
        assert_eq!(buffer.presentation_time, Timestamp::new(960, Rational::new(1, 48000)));
    }

    #[test]
    fn test_参数不变时复用转换引擎() {
        let created = Arc::new(AtomicUsize::new(0));
        let mut pipeline =
            AudioPipeline::new(AudioLayout::Packed, counting_factory(Arc::clone(&created)));
        pipeline.prepare(&pcm_stream(), &codecs()).unwrap();

        for pts in [0, 4, 8] {
            assert_eq!(pipeline.submit(pcm_packet(pts, Rational::new(1, 48000))).count(), 1);
        }
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_零采样转换结果被丢弃() {
        struct EmptyResampler(ResampleConfig);

        impl Resampler for EmptyResampler {
            fn config(&self) -> &ResampleConfig {
                &self.0
            }
            fn convert(
                &mut self,
                _input: &[Vec<u8>],
                _nb_samples: u32,
            ) -> LiuResult<ConvertedAudio> {
                Ok(ConvertedAudio {
                    planes: vec![Vec::new()],
                    nb_samples: 0,
                    sample_format: self.0.dst_sample_format,
                    channel_layout: self.0.dst_channel_layout,
                })
            }
        }

        let factory: ResamplerFactory = Arc::new(|config: &ResampleConfig| {
            Ok(Box::new(EmptyResampler(config.clone())) as Box<dyn Resampler>)
        });
        let mut pipeline = AudioPipeline::new(AudioLayout::Packed, factory);
        pipeline.prepare(&pcm_stream(), &codecs()).unwrap();
        assert_eq!(pipeline.submit(pcm_packet(0, Rational::new(1, 48000))).count(), 0);
        // 管线状态不受影响
        assert_eq!(pipeline.submit(pcm_packet(4, Rational::new(1, 48000))).count(), 0);
        assert_eq!(pipeline.state(), PipelineState::Ready);
    }

    #[test]
    fn test_送包失败不影响后续数据包() {
        let mut pipeline = AudioPipeline::new(AudioLayout::Packed, liu_resample::default_factory());
        pipeline.prepare(&pcm_stream(), &codecs()).unwrap();

        let broken =
            Packet::from_data(vec![1u8, 2, 3]).with_timing(1, 0, 1, Rational::new(1, 48000));
        assert_eq!(pipeline.submit(broken).count(), 0);
        assert_eq!(pipeline.submit(pcm_packet(4, Rational::new(1, 48000))).count(), 1);
    }

    #[test]
    fn test_冲刷与重复关闭() {
        let mut pipeline = AudioPipeline::new(AudioLayout::Packed, liu_resample::default_factory());
        pipeline.prepare(&pcm_stream(), &codecs()).unwrap();
        assert_eq!(pipeline.submit(pcm_packet(0, Rational::new(1, 48000))).count(), 1);
        assert_eq!(pipeline.flush().count(), 0);
        assert_eq!(pipeline.state(), PipelineState::Draining);

        pipeline.close();
        assert!(!pipeline.has_resampler());
        pipeline.close();
        assert_eq!(pipeline.state(), PipelineState::Closed);
    }

    #[test]
    fn test_未知编解码器不可用() {
        let mut stream = pcm_stream();
        stream.codec_id = CodecId::Opus;
        let mut pipeline = AudioPipeline::new(AudioLayout::Packed, liu_resample::default_factory());
        let err = pipeline.prepare(&stream, &codecs()).unwrap_err();
        assert!(matches!(err, LiuError::DecoderUnavailable { stream: 1, .. }));
    }
}
