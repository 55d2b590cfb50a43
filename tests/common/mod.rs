//! 集成测试共用的脚本化引擎.
//!
//! 所有假引擎把生命周期事件写入同一个 [`Recorder`], 用于验证释放顺序.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use liu::codec::{
    AudioFrame, CodecId, CodecParameters, CodecRegistry, Decoder, Frame, FrameFlags,
    GetFormatFn, HwDevice, HwDeviceContext, HwDeviceProvider, HwDeviceType, Packet, Surface,
    VideoFrame,
};
use liu::core::{ChannelLayout, LiuError, LiuResult, PixelFormat, Rational, SampleFormat};
use liu::format::{AudioStreamParams, Demuxer, Stream, VideoStreamParams};
use liu::resample::{ResampleConfig, Resampler, ResamplerFactory};
use liu::{OutputBuffer, VideoImage};

pub const VIDEO_TIME_BASE: Rational = Rational::new(1, 90000);
pub const AUDIO_TIME_BASE: Rational = Rational::new(1, 48000);
pub const VIDEO_INDEX: usize = 0;
pub const AUDIO_INDEX: usize = 1;

/// 首字节为此值的视频数据包让解码器报告流结束
pub const END_OF_STREAM_MARK: u8 = 0xEE;
/// 首字节为此值的视频数据包解码为损坏帧
pub const CORRUPT_MARK: u8 = 0xCC;

/// 生命周期事件记录
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn record(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| *e == event).count()
    }
}

// ============================================================
// 硬件设备
// ============================================================

#[derive(Debug)]
pub struct FakeSurface {
    pub width: u32,
    pub height: u32,
}

impl Surface for FakeSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> PixelFormat {
        PixelFormat::VideoToolbox
    }
}

pub struct FakeDevice {
    recorder: Recorder,
}

impl HwDevice for FakeDevice {
    fn device_type(&self) -> HwDeviceType {
        HwDeviceType::VideoToolbox
    }

    fn release(&mut self) {
        self.recorder.record("hw.release");
    }
}

/// 硬件设备提供者, 只支持 VideoToolbox
#[derive(Clone)]
pub struct FakeHwProvider {
    recorder: Recorder,
    pub created: Arc<AtomicUsize>,
}

impl FakeHwProvider {
    pub fn new(recorder: &Recorder) -> Self {
        Self {
            recorder: recorder.clone(),
            created: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl HwDeviceProvider for FakeHwProvider {
    fn create_device_context(&self, device_type: HwDeviceType) -> LiuResult<HwDeviceContext> {
        if device_type != HwDeviceType::VideoToolbox {
            return Err(LiuError::Unsupported(format!("测试平台不支持 {device_type}")));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(HwDeviceContext::new(FakeDevice {
            recorder: self.recorder.clone(),
        }))
    }
}

// ============================================================
// 视频解码器
// ============================================================

/// 脚本化的视频解码器
///
/// 每个数据包解码为一帧 (pts 与时长取自数据包), 内部保留 `delay` 帧重排延迟.
/// 绑定硬件设备后输出表面, 否则输出 NV12 平面.
pub struct FakeVideoDecoder {
    recorder: Recorder,
    delay: usize,
    device: Option<HwDeviceContext>,
    get_format: Option<GetFormatFn>,
    output: PixelFormat,
    pending: VecDeque<VideoFrame>,
    ended: bool,
    draining: bool,
}

impl FakeVideoDecoder {
    pub fn new(recorder: &Recorder, delay: usize) -> Self {
        Self {
            recorder: recorder.clone(),
            delay,
            device: None,
            get_format: None,
            output: PixelFormat::None,
            pending: VecDeque::new(),
            ended: false,
            draining: false,
        }
    }

    fn decode(&self, packet: &Packet) -> VideoFrame {
        let mut frame = if self.output.is_hardware() {
            VideoFrame::from_surface(Arc::new(FakeSurface {
                width: 64,
                height: 32,
            }))
        } else {
            let mut frame = VideoFrame::new(64, 32, PixelFormat::Nv12);
            frame.data = vec![vec![16; 64 * 32], vec![128; 64 * 16]];
            frame.linesize = vec![64, 64];
            frame
        };
        frame.pts = packet.pts;
        frame.time_base = packet.time_base;
        frame.duration = packet.duration;
        if packet.is_keyframe {
            frame.flags |= FrameFlags::KEY;
        }
        if packet.data.first() == Some(&CORRUPT_MARK) {
            frame.flags |= FrameFlags::CORRUPT;
        }
        frame
    }
}

impl Decoder for FakeVideoDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::H264
    }

    fn name(&self) -> &str {
        "fake_h264"
    }

    fn open(&mut self, _params: &CodecParameters) -> LiuResult<()> {
        let candidates: Vec<PixelFormat> = match &self.device {
            Some(device) => vec![device.surface_format(), PixelFormat::Nv12],
            None => vec![PixelFormat::Nv12],
        };
        self.output = match &self.get_format {
            Some(get_format) => get_format(&candidates),
            None => PixelFormat::Nv12,
        };
        self.recorder.record(format!("video.open {}", self.output));
        Ok(())
    }

    fn attach_hw_device(&mut self, device: HwDeviceContext) -> LiuResult<()> {
        self.device = Some(device);
        Ok(())
    }

    fn set_get_format(&mut self, get_format: GetFormatFn) {
        self.get_format = Some(get_format);
    }

    fn send_packet(&mut self, packet: &Packet) -> LiuResult<()> {
        if packet.is_empty() {
            self.draining = true;
            return Ok(());
        }
        if packet.data.first() == Some(&END_OF_STREAM_MARK) {
            self.ended = true;
            return Ok(());
        }
        let frame = self.decode(packet);
        self.pending.push_back(frame);
        Ok(())
    }

    fn receive_frame(&mut self) -> LiuResult<Frame> {
        if self.ended {
            return Err(LiuError::Eof);
        }
        if self.pending.len() > self.delay || (self.draining && !self.pending.is_empty()) {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Frame::Video(frame));
            }
        }
        if self.draining {
            Err(LiuError::Eof)
        } else {
            Err(LiuError::NeedMoreData)
        }
    }

    fn close(&mut self) {
        self.pending.clear();
        self.device = None;
        self.recorder.record("video.close");
    }
}

// ============================================================
// 音频
// ============================================================

/// 包装内置解码器, 记录关闭事件
pub struct RecordingDecoder {
    inner: Box<dyn Decoder>,
    label: &'static str,
    recorder: Recorder,
}

impl Decoder for RecordingDecoder {
    fn codec_id(&self) -> CodecId {
        self.inner.codec_id()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn open(&mut self, params: &CodecParameters) -> LiuResult<()> {
        self.inner.open(params)
    }

    fn send_packet(&mut self, packet: &Packet) -> LiuResult<()> {
        self.inner.send_packet(packet)
    }

    fn receive_frame(&mut self) -> LiuResult<Frame> {
        self.inner.receive_frame()
    }

    fn close(&mut self) {
        self.inner.close();
        self.recorder.record(format!("{}.close", self.label));
    }
}

/// 输出 F32 单声道帧, 首字节为 1 时采样率为 44100, 否则为 48000
#[derive(Default)]
pub struct VaryingRateDecoder {
    pending: Option<AudioFrame>,
}

impl Decoder for VaryingRateDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::PcmF32le
    }

    fn name(&self) -> &str {
        "varying_rate"
    }

    fn open(&mut self, _params: &CodecParameters) -> LiuResult<()> {
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> LiuResult<()> {
        if packet.is_empty() {
            return Ok(());
        }
        let rate = if packet.data.first() == Some(&1) {
            44100
        } else {
            48000
        };
        self.pending = Some(audio_frame_f32(rate, packet.pts, packet.time_base));
        Ok(())
    }

    fn receive_frame(&mut self) -> LiuResult<Frame> {
        self.pending
            .take()
            .map(Frame::Audio)
            .ok_or(LiuError::NeedMoreData)
    }
}

/// 转换引擎包装, 记录创建与释放
pub struct RecordingResampler {
    inner: Box<dyn Resampler>,
    recorder: Recorder,
}

impl Resampler for RecordingResampler {
    fn config(&self) -> &ResampleConfig {
        self.inner.config()
    }

    fn convert(
        &mut self,
        input: &[Vec<u8>],
        nb_samples: u32,
    ) -> LiuResult<liu::resample::ConvertedAudio> {
        self.inner.convert(input, nb_samples)
    }

    fn close(&mut self) {
        self.inner.close();
        self.recorder.record("resampler.close");
    }
}

pub fn recording_resampler_factory(recorder: &Recorder) -> ResamplerFactory {
    let recorder = recorder.clone();
    let inner = liu::resample::default_factory();
    Arc::new(move |config: &ResampleConfig| {
        recorder.record(format!("resampler.create {}", config.sample_rate));
        let resampler = inner(config)?;
        Ok(Box::new(RecordingResampler {
            inner: resampler,
            recorder: recorder.clone(),
        }) as Box<dyn Resampler>)
    })
}

// ============================================================
// 注册表
// ============================================================

/// 注册脚本化 H.264 解码器与记录关闭事件的 PCM 解码器
pub fn test_registry(recorder: &Recorder, video_delay: usize) -> CodecRegistry {
    let mut codecs = CodecRegistry::new();
    let video_recorder = recorder.clone();
    codecs.register_decoder(CodecId::H264, "fake_h264", move || {
        Ok(Box::new(FakeVideoDecoder::new(&video_recorder, video_delay)) as Box<dyn Decoder>)
    });
    register_recording_pcm(&mut codecs, recorder);
    codecs
}

/// 只有音频解码器的注册表
pub fn audio_only_registry(recorder: &Recorder) -> CodecRegistry {
    let mut codecs = CodecRegistry::new();
    register_recording_pcm(&mut codecs, recorder);
    codecs
}

fn register_recording_pcm(codecs: &mut CodecRegistry, recorder: &Recorder) {
    let builtin = liu::default_codec_registry();
    let audio_recorder = recorder.clone();
    codecs.register_decoder(CodecId::PcmS16le, "pcm_s16le", move || {
        let inner = builtin.create_decoder(CodecId::PcmS16le)?;
        Ok(Box::new(RecordingDecoder {
            inner,
            label: "audio",
            recorder: audio_recorder.clone(),
        }) as Box<dyn Decoder>)
    });
}

// ============================================================
// 数据源
// ============================================================

/// 脚本化数据源, 可注入读取错误
pub struct ScriptedDemuxer {
    streams: Vec<Stream>,
    script: VecDeque<LiuResult<Packet>>,
    recorder: Recorder,
    fail_open: bool,
}

impl ScriptedDemuxer {
    pub fn new(
        streams: Vec<Stream>,
        packets: impl IntoIterator<Item = Packet>,
        recorder: &Recorder,
    ) -> Self {
        Self {
            streams,
            script: packets.into_iter().map(Ok).collect(),
            recorder: recorder.clone(),
            fail_open: false,
        }
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn push_error(&mut self, err: LiuError) {
        self.script.push_back(Err(err));
    }
}

impl Demuxer for ScriptedDemuxer {
    fn name(&self) -> &str {
        "scripted"
    }

    fn network_init(&mut self) -> LiuResult<()> {
        self.recorder.record("demuxer.network_init");
        Ok(())
    }

    fn network_deinit(&mut self) {
        self.recorder.record("demuxer.network_deinit");
    }

    fn open(&mut self, url: &str) -> LiuResult<()> {
        if self.fail_open {
            return Err(LiuError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{url} 不存在"),
            )));
        }
        self.recorder.record("demuxer.open");
        Ok(())
    }

    fn find_stream_info(&mut self) -> LiuResult<()> {
        if self.streams.is_empty() {
            return Err(LiuError::InvalidData("没有流".into()));
        }
        Ok(())
    }

    fn streams(&self) -> &[Stream] {
        &self.streams
    }

    fn read_packet(&mut self) -> LiuResult<Packet> {
        self.script.pop_front().unwrap_or(Err(LiuError::Eof))
    }

    fn close(&mut self) {
        self.recorder.record("demuxer.close");
    }
}

// ============================================================
// 流与数据包
// ============================================================

pub fn video_stream() -> Stream {
    Stream::video(
        VIDEO_INDEX,
        CodecId::H264,
        VIDEO_TIME_BASE,
        VideoStreamParams {
            width: 64,
            height: 32,
            pixel_format: PixelFormat::Nv12,
            frame_rate: Rational::new(30, 1),
        },
    )
}

pub fn audio_stream() -> Stream {
    Stream::audio(
        AUDIO_INDEX,
        CodecId::PcmS16le,
        AUDIO_TIME_BASE,
        AudioStreamParams {
            sample_rate: 48000,
            channel_layout: ChannelLayout::STEREO,
            sample_format: SampleFormat::S16,
            frame_size: 0,
        },
    )
}

/// 一帧视频数据包, 时长 3000 (1/30 秒)
pub fn video_packet(pts: i64) -> Packet {
    let mut packet =
        Packet::from_data(vec![0u8; 16]).with_timing(VIDEO_INDEX, pts, 3000, VIDEO_TIME_BASE);
    packet.is_keyframe = pts == 0;
    packet
}

pub fn marked_video_packet(pts: i64, mark: u8) -> Packet {
    Packet::from_data(vec![mark; 16]).with_timing(VIDEO_INDEX, pts, 3000, VIDEO_TIME_BASE)
}

/// 4 个立体声 S16 采样
pub fn audio_packet(pts: i64) -> Packet {
    let mut data = Vec::with_capacity(16);
    for i in 0..4i16 {
        data.extend_from_slice(&(i * 1000).to_le_bytes());
        data.extend_from_slice(&(-i * 1000).to_le_bytes());
    }
    Packet::from_data(data).with_timing(AUDIO_INDEX, pts, 4, AUDIO_TIME_BASE)
}

/// 交错排列 `video_count` 个视频包与 `audio_count` 个音频包
pub fn interleaved_packets(video_count: i64, audio_count: i64) -> Vec<Packet> {
    let mut packets = Vec::new();
    for i in 0..video_count.max(audio_count) {
        if i < video_count {
            packets.push(video_packet(i * 3000));
        }
        if i < audio_count {
            packets.push(audio_packet(i * 1600));
        }
    }
    packets
}

/// 收集所有输出缓冲
pub fn collector() -> (Arc<Mutex<Vec<OutputBuffer>>>, impl FnMut(OutputBuffer)) {
    let buffers = Arc::new(Mutex::new(Vec::new()));
    let sink_buffers = Arc::clone(&buffers);
    let sink = move |buffer: OutputBuffer| sink_buffers.lock().unwrap().push(buffer);
    (buffers, sink)
}

pub fn is_surface(buffer: &OutputBuffer) -> bool {
    matches!(
        buffer.as_video().map(|v| &v.image),
        Some(VideoImage::Surface(_))
    )
}

pub fn audio_frame_f32(sample_rate: u32, pts: i64, time_base: Rational) -> AudioFrame {
    let mut frame = AudioFrame::new(4, sample_rate, SampleFormat::F32, ChannelLayout::MONO);
    frame.data = vec![vec![0u8; 16]];
    frame.pts = pts;
    frame.time_base = time_base;
    frame
}
