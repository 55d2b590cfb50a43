//! 视频解码管线.
//!
//! 持有视频解码器, 协商输出像素格式 (优先硬件表面, 否则退回第一个候选),
//! 驱动 送包/取帧 循环, 并把每帧包装为带时间信息的 [`VideoBuffer`].

use std::iter::FusedIterator;

use liu_codec::{
    CodecRegistry, Decoder, Frame, HwDeviceContext, Packet, VideoFrame, select_pixel_format,
};
use liu_core::{LiuError, LiuResult, NOPTS_VALUE, PixelFormat, Rational, Timestamp};
use liu_format::Stream;
use log::{debug, info, warn};

use crate::output::{VideoBuffer, VideoFormatDescription, VideoImage};
use crate::pipeline::{self, PipelineState};
use crate::timing::PtsGuard;

/// 视频管线选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoOptions {
    /// 非硬件表面的帧以像素平面输出; 关闭时这类帧只记录日志后丢弃
    pub software_fallback: bool,
    /// 丢弃损坏帧
    pub drop_corrupt_frames: bool,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            software_fallback: true,
            drop_corrupt_frames: false,
        }
    }
}

enum Pulled {
    Buffer(VideoBuffer),
    Skipped,
    Exhausted,
    Terminal(LiuError),
}

/// 视频解码管线
pub struct VideoPipeline {
    state: PipelineState,
    options: VideoOptions,
    stream: Option<Stream>,
    decoder: Option<Box<dyn Decoder>>,
    /// 绑定成功的硬件表面格式
    hw_format: Option<PixelFormat>,
    /// 帧时长未知时使用的帧周期
    frame_period: Option<Rational>,
    guard: PtsGuard,
    /// 出现终止条件后不再输出
    halted: bool,
}

impl VideoPipeline {
    pub fn new(options: VideoOptions) -> Self {
        Self {
            state: PipelineState::Uninitialized,
            options,
            stream: None,
            decoder: None,
            hw_format: None,
            frame_period: None,
            guard: PtsGuard::new(),
            halted: false,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn stream(&self) -> Option<&Stream> {
        self.stream.as_ref()
    }

    /// 解码器已绑定硬件设备
    pub fn is_hardware(&self) -> bool {
        self.hw_format.is_some()
    }

    /// 已因流结束或时间戳不连续而停止输出
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// 准备解码器
    ///
    /// 已就绪时直接返回, 不会重新分配解码器.
    ///
    /// # 错误
    /// - `DecoderUnavailable`: 没有匹配的解码器
    /// - `DecoderOpenFailed`: 解码器拒绝流参数
    /// - `HardwareContextUnavailable`: 解码器拒绝硬件设备且不允许软件回退
    pub fn prepare(
        &mut self,
        stream: &Stream,
        codecs: &CodecRegistry,
        hw_device: Option<&HwDeviceContext>,
    ) -> LiuResult<()> {
        match self.state {
            PipelineState::Uninitialized => {}
            PipelineState::Closed => {
                return Err(LiuError::InvalidArgument("视频管线已关闭".into()));
            }
            _ => {
                debug!("视频管线已就绪, 跳过重复准备");
                return Ok(());
            }
        }

        let mut decoder = pipeline::create_decoder(stream, codecs)?;
        let mut hw_format = None;
        if let Some(device) = hw_device {
            match decoder.attach_hw_device(device.clone()) {
                Ok(()) => {
                    info!(
                        "视频解码器 {} 绑定硬件设备 {}",
                        decoder.name(),
                        device.device_type()
                    );
                    hw_format = Some(device.surface_format());
                }
                Err(e) if self.options.software_fallback => {
                    debug!("{} 使用软件解码: {e}", decoder.name());
                }
                Err(e) => {
                    return Err(LiuError::HardwareContextUnavailable(format!(
                        "{}: {e}",
                        decoder.name()
                    )));
                }
            }
        }
        decoder.set_get_format(Box::new(move |candidates| {
            let chosen = select_pixel_format(candidates, hw_format);
            debug!("像素格式协商: {candidates:?} -> {chosen}");
            chosen
        }));
        pipeline::open_decoder(decoder.as_mut(), stream)?;

        self.frame_period = stream
            .video_params()
            .map(|v| v.frame_rate)
            .filter(|r| r.num > 0 && r.den > 0)
            .map(Rational::invert);
        self.hw_format = hw_format;
        self.decoder = Some(decoder);
        self.stream = Some(stream.clone());
        self.state = PipelineState::Ready;
        Ok(())
    }

    /// 送入一个数据包, 返回本包产出的缓冲
    ///
    /// 数据包在送入解码器后立即释放. 送包失败返回 `PacketSubmitFailed`,
    /// 属于单包级别的非致命错误; 解码器缓冲区已满 (`NeedMoreData`) 时该包被丢弃,
    /// 仍返回迭代器以取出已有的帧. 迭代中的 `Err` 是终止条件
    /// (`StreamEnded` / `StreamDiscontinuity`), 之后管线不再输出.
    pub fn submit(&mut self, packet: Packet) -> LiuResult<VideoDrain<'_>> {
        if self.halted || self.state != PipelineState::Ready {
            return Ok(VideoDrain::new(self, true));
        }
        let sent = match self.decoder.as_mut() {
            Some(decoder) => decoder.send_packet(&packet),
            None => return Ok(VideoDrain::new(self, true)),
        };
        let pts = packet.pts;
        drop(packet);
        match sent {
            Ok(()) => {}
            Err(LiuError::NeedMoreData) => {
                warn!(
                    "{}, 先取出已解码帧",
                    LiuError::PacketSubmitFailed(format!("视频 pts={pts}: 解码器缓冲区已满"))
                );
            }
            Err(e) => return Err(LiuError::PacketSubmitFailed(e.to_string())),
        }
        Ok(VideoDrain::new(self, false))
    }

    /// 输入结束: 送入空包, 取出解码器缓存的帧
    pub fn flush(&mut self) -> LiuResult<VideoDrain<'_>> {
        if self.halted || self.state != PipelineState::Ready {
            return Ok(VideoDrain::new(self, true));
        }
        self.state = PipelineState::Draining;
        let sent = match self.decoder.as_mut() {
            Some(decoder) => decoder.send_packet(&Packet::empty()),
            None => return Ok(VideoDrain::new(self, true)),
        };
        sent.map_err(|e| LiuError::PacketSubmitFailed(format!("冲刷视频解码器: {e}")))?;
        Ok(VideoDrain::new(self, false))
    }

    /// 关闭解码器, 可重复调用
    pub fn close(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            debug!("关闭视频解码器 {}", decoder.name());
            decoder.close();
        }
        self.state = PipelineState::Closed;
    }

    fn pull(&mut self) -> Pulled {
        let received = match self.decoder.as_mut() {
            Some(decoder) => decoder.receive_frame(),
            None => return Pulled::Exhausted,
        };
        match received {
            Ok(Frame::Video(frame)) => self.package(frame),
            Ok(Frame::Audio(_)) => {
                warn!("视频解码器输出了音频帧, 已忽略");
                Pulled::Skipped
            }
            Err(LiuError::NeedMoreData) => Pulled::Exhausted,
            Err(LiuError::Eof) if self.state == PipelineState::Draining => {
                debug!("视频解码器冲刷完毕");
                Pulled::Exhausted
            }
            Err(LiuError::Eof) => {
                warn!("视频解码器在播放中途报告流结束");
                self.halted = true;
                Pulled::Terminal(LiuError::StreamEnded)
            }
            Err(e) => {
                warn!("视频解码失败, 放弃本数据包的剩余输出: {e}");
                Pulled::Exhausted
            }
        }
    }

    fn package(&mut self, frame: VideoFrame) -> Pulled {
        let corrupt = frame.is_corrupt();
        if corrupt {
            warn!("视频帧损坏: pts={}, 格式={}", frame.pts, frame.pixel_format);
            if self.options.drop_corrupt_frames {
                return Pulled::Skipped;
            }
        }
        if frame.pts == NOPTS_VALUE {
            warn!("视频帧没有 pts, 无法排入时间线, 已丢弃");
            return Pulled::Skipped;
        }
        if let Err(e) = self.guard.check(frame.pts) {
            warn!("{e}, 停止输出视频");
            self.halted = true;
            return Pulled::Terminal(e);
        }

        let time_base = match &self.stream {
            Some(stream) if stream.time_base.is_valid() => stream.time_base,
            _ => frame.time_base,
        };
        let presentation_time = Timestamp::new(frame.pts, time_base);
        let duration = self.frame_duration(frame.duration, time_base);
        let format = VideoFormatDescription {
            width: frame.width,
            height: frame.height,
            pixel_format: frame.pixel_format,
        };
        let keyframe = frame.is_keyframe();

        let image = if frame.pixel_format.is_hardware() {
            match frame.surface {
                Some(surface) => VideoImage::Surface(surface),
                None => {
                    warn!("{} 帧缺少表面句柄, 已丢弃", frame.pixel_format);
                    return Pulled::Skipped;
                }
            }
        } else if self.options.software_fallback {
            VideoImage::Planes {
                data: frame.data,
                linesize: frame.linesize,
            }
        } else {
            warn!("不支持的像素格式 {}, 只输出硬件表面", frame.pixel_format);
            return Pulled::Skipped;
        };

        Pulled::Buffer(VideoBuffer {
            image,
            format,
            presentation_time,
            duration,
            keyframe,
            corrupt,
        })
    }

    /// 帧时长换算为纳秒, 未知时按帧率推算
    fn frame_duration(&self, ticks: i64, time_base: Rational) -> Timestamp {
        if ticks > 0 {
            let duration = Timestamp::new(ticks, time_base).rescale_rounded(Rational::NANO);
            if duration.is_valid() {
                return duration;
            }
        }
        match self.frame_period {
            Some(period) => Timestamp::new(1, period).rescale_rounded(Rational::NANO),
            None => Timestamp::new(0, Rational::NANO),
        }
    }
}

impl Drop for VideoPipeline {
    fn drop(&mut self) {
        self.close();
    }
}

/// 一次送包 (或冲刷) 产出的视频缓冲
///
/// 惰性地从解码器取帧, 取空即结束, 不可重启.
pub struct VideoDrain<'a> {
    pipeline: &'a mut VideoPipeline,
    done: bool,
}

impl<'a> VideoDrain<'a> {
    fn new(pipeline: &'a mut VideoPipeline, done: bool) -> Self {
        Self { pipeline, done }
    }
}

impl Iterator for VideoDrain<'_> {
    type Item = LiuResult<VideoBuffer>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.pipeline.pull() {
                Pulled::Buffer(buffer) => return Some(Ok(buffer)),
                Pulled::Skipped => {}
                Pulled::Exhausted => self.done = true,
                Pulled::Terminal(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

impl FusedIterator for VideoDrain<'_> {}
