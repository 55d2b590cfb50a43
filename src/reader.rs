//! 解复用循环与生命周期控制.
//!
//! [`VideoReader`] 持有输入源、两条解码管线与硬件设备上下文,
//! 在调用线程上阻塞运行: 读包 → 路由 → 送包 → 交付缓冲, 直到停止条件出现,
//! 然后按固定顺序释放所有资源.
//!
//! ```rust
//! use liu::reader::VideoReader;
//! use liu::{MemoryDemuxer, OutputBuffer};
//!
//! let demuxer = MemoryDemuxer::new(Vec::new(), Vec::new());
//! let mut reader = VideoReader::new(demuxer, liu::default_codec_registry());
//! // 没有任何流
//! assert!(reader.start("memory://empty", |_buffer: OutputBuffer| {}).is_err());
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use liu_codec::{CodecRegistry, HwDeviceContext, HwDeviceProvider};
use liu_core::{LiuError, LiuResult};
use liu_format::Demuxer;
use liu_resample::ResamplerFactory;
use log::{debug, info, trace, warn};

use crate::audio::{AudioDrain, AudioPipeline};
use crate::catalog::{Route, StreamCatalog};
use crate::config::ReaderConfig;
use crate::output::{BufferSink, OutputBuffer};
use crate::video::{VideoDrain, VideoOptions, VideoPipeline};

/// 读取器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Idle,
    Running,
    /// 已观察到停止请求, 正在退出循环
    Stopping,
    TornDown,
}

/// 停止请求句柄
///
/// 可以克隆到其他线程或输出回调中. 停止是协作式的: 循环每读一个数据包检查一次,
/// 不会打断正在进行的解码.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 运行结束原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// 收到停止请求
    Stopped,
    /// 输入读完, 解码器已冲刷
    EndOfInput,
    /// 读取数据包失败
    ReadFailed(String),
    /// 输出的视频帧达到上限
    FrameLimitReached,
    /// 视频解码器在播放中途报告流结束
    StreamEnded,
    /// 视频时间戳回退
    Discontinuity { previous: i64, current: i64 },
}

impl Termination {
    fn from_terminal(err: LiuError) -> Self {
        match err {
            LiuError::StreamDiscontinuity { previous, current } => {
                Self::Discontinuity { previous, current }
            }
            LiuError::StreamEnded => Self::StreamEnded,
            other => Self::ReadFailed(other.to_string()),
        }
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => write!(f, "已停止"),
            Self::EndOfInput => write!(f, "输入结束"),
            Self::ReadFailed(msg) => write!(f, "读取失败: {msg}"),
            Self::FrameLimitReached => write!(f, "达到帧数上限"),
            Self::StreamEnded => write!(f, "解码器提前结束"),
            Self::Discontinuity { previous, current } => {
                write!(f, "时间戳不连续 ({previous} -> {current})")
            }
        }
    }
}

/// 运行统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub packets_read: u64,
    /// 路由不到任何管线的数据包
    pub packets_dropped: u64,
    pub video_buffers: u64,
    pub audio_buffers: u64,
}

/// 一次运行的结果
#[derive(Debug)]
pub struct RunOutcome {
    pub termination: Termination,
    pub stats: RunStats,
    /// 未阻止运行的准备阶段错误 (解码器不可用、硬件设备不可用等)
    pub setup_errors: Vec<LiuError>,
}

/// 视频读取器
pub struct VideoReader {
    state: ReaderState,
    config: ReaderConfig,
    demuxer: Box<dyn Demuxer>,
    codecs: CodecRegistry,
    hw_provider: Option<Box<dyn HwDeviceProvider>>,
    resampler_factory: ResamplerFactory,
    hw_device: Option<HwDeviceContext>,
    video: Option<VideoPipeline>,
    audio: Option<AudioPipeline>,
    stop: StopHandle,
    network_ready: bool,
    input_opened: bool,
}

impl VideoReader {
    pub fn new(demuxer: impl Demuxer + 'static, codecs: CodecRegistry) -> Self {
        Self {
            state: ReaderState::Idle,
            config: ReaderConfig::default(),
            demuxer: Box::new(demuxer),
            codecs,
            hw_provider: None,
            resampler_factory: liu_resample::default_factory(),
            hw_device: None,
            video: None,
            audio: None,
            stop: StopHandle::new(),
            network_ready: false,
            input_opened: false,
        }
    }

    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hw_provider(mut self, provider: impl HwDeviceProvider + 'static) -> Self {
        self.hw_provider = Some(Box::new(provider));
        self
    }

    pub fn with_resampler_factory(mut self, factory: ResamplerFactory) -> Self {
        self.resampler_factory = factory;
        self
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// 请求停止, 最多再处理一个数据包
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// 打开输入并阻塞运行, 直到停止条件出现
    ///
    /// 返回前总会释放所有资源. 只能从 `Idle` 状态调用一次.
    ///
    /// # 错误
    /// - `OpenInputFailed`: 输入无法打开
    /// - `NoStreamInfo`: 探测失败或没有音视频流
    /// - `HardwareContextUnavailable`: 硬件设备不可用且关闭了软件回退
    /// - 开启 `require_decoders` 时的解码器准备错误
    pub fn start(&mut self, url: &str, mut sink: impl BufferSink) -> LiuResult<RunOutcome> {
        if self.state != ReaderState::Idle {
            return Err(LiuError::InvalidArgument(format!(
                "读取器当前状态 {:?}, 只能从 Idle 启动",
                self.state
            )));
        }
        self.state = ReaderState::Running;
        let result = self.run(url, &mut sink);
        match &result {
            Ok(outcome) => info!(
                "运行结束: {}, 读取 {} 个数据包, 输出视频 {} / 音频 {}",
                outcome.termination,
                outcome.stats.packets_read,
                outcome.stats.video_buffers,
                outcome.stats.audio_buffers,
            ),
            Err(e) => warn!("启动失败: {e}"),
        }
        self.close();
        result
    }

    /// 释放所有资源, 可重复调用
    ///
    /// 顺序: 格式转换引擎 → 音频解码器 → 视频解码器 → 硬件设备上下文 → 输入源.
    pub fn close(&mut self) {
        if self.state == ReaderState::TornDown {
            return;
        }
        if let Some(mut audio) = self.audio.take() {
            audio.close();
        }
        if let Some(mut video) = self.video.take() {
            video.close();
        }
        if let Some(device) = self.hw_device.take() {
            debug!("归还硬件设备上下文 (剩余 {} 个引用)", device.ref_count() - 1);
        }
        if self.input_opened {
            self.demuxer.close();
            self.input_opened = false;
        }
        if self.network_ready {
            self.demuxer.network_deinit();
            self.network_ready = false;
        }
        self.state = ReaderState::TornDown;
        debug!("读取器资源已释放");
    }

    fn run(&mut self, url: &str, sink: &mut dyn BufferSink) -> LiuResult<RunOutcome> {
        let mut setup_errors = Vec::new();
        self.open_input(url)?;
        self.create_hw_device(&mut setup_errors)?;
        let catalog = StreamCatalog::discover(self.demuxer.as_mut(), &self.codecs)?;
        self.prepare_pipelines(&catalog, &mut setup_errors)?;

        let mut stats = RunStats::default();
        let termination = self.demux_loop(&catalog, sink, &mut stats);
        Ok(RunOutcome {
            termination,
            stats,
            setup_errors,
        })
    }

    fn open_input(&mut self, url: &str) -> LiuResult<()> {
        self.demuxer
            .network_init()
            .map_err(|e| LiuError::OpenInputFailed(format!("网络初始化失败: {e}")))?;
        self.network_ready = true;

        self.input_opened = true;
        self.demuxer
            .open(url)
            .map_err(|e| LiuError::OpenInputFailed(format!("{url}: {e}")))?;
        info!("打开输入 {url} ({})", self.demuxer.name());
        Ok(())
    }

    fn create_hw_device(&mut self, setup_errors: &mut Vec<LiuError>) -> LiuResult<()> {
        let device_type = self.config.hw_device;
        let created = match &self.hw_provider {
            Some(provider) => provider.create_device_context(device_type),
            None => Err(LiuError::Unsupported("未配置硬件设备提供者".into())),
        };
        match created {
            Ok(device) => {
                info!("创建硬件设备上下文: {device_type}");
                self.hw_device = Some(device);
                Ok(())
            }
            Err(e) => {
                let err = LiuError::HardwareContextUnavailable(format!("{device_type}: {e}"));
                if !self.config.software_fallback {
                    return Err(err);
                }
                warn!("{err}, 视频使用软件解码");
                setup_errors.push(err);
                Ok(())
            }
        }
    }

    fn prepare_pipelines(
        &mut self,
        catalog: &StreamCatalog,
        setup_errors: &mut Vec<LiuError>,
    ) -> LiuResult<()> {
        if catalog.active_video().is_none() && catalog.active_audio().is_none() {
            return Err(LiuError::NoStreamInfo("输入中没有音视频流".into()));
        }

        if let Some(stream) = catalog.active_video() {
            let mut video = VideoPipeline::new(VideoOptions {
                software_fallback: self.config.software_fallback,
                drop_corrupt_frames: self.config.drop_corrupt_frames,
            });
            match video.prepare(stream, &self.codecs, self.hw_device.as_ref()) {
                Ok(()) => self.video = Some(video),
                Err(e) => self.setup_failed(e, setup_errors)?,
            }
        }
        if let Some(stream) = catalog.active_audio() {
            let mut audio =
                AudioPipeline::new(self.config.audio_layout, Arc::clone(&self.resampler_factory));
            match audio.prepare(stream, &self.codecs) {
                Ok(()) => self.audio = Some(audio),
                Err(e) => self.setup_failed(e, setup_errors)?,
            }
        }
        Ok(())
    }

    fn setup_failed(&self, err: LiuError, setup_errors: &mut Vec<LiuError>) -> LiuResult<()> {
        let fatal = self.config.require_decoders
            || matches!(err, LiuError::HardwareContextUnavailable(_));
        if fatal {
            return Err(err);
        }
        warn!("{err}, 该流的数据包将被丢弃");
        setup_errors.push(err);
        Ok(())
    }

    fn demux_loop(
        &mut self,
        catalog: &StreamCatalog,
        sink: &mut dyn BufferSink,
        stats: &mut RunStats,
    ) -> Termination {
        let limit = self.config.frame_limit;
        loop {
            if self.stop.is_stopped() {
                self.state = ReaderState::Stopping;
                info!("收到停止请求");
                return Termination::Stopped;
            }

            let packet = match self.demuxer.read_packet() {
                Ok(packet) => packet,
                Err(LiuError::Eof) => {
                    info!("输入读取完毕");
                    if !self.config.flush_on_end {
                        return Termination::EndOfInput;
                    }
                    return self
                        .drain(sink, stats)
                        .unwrap_or(Termination::EndOfInput);
                }
                Err(e) => {
                    warn!("读取数据包失败: {e}");
                    return Termination::ReadFailed(e.to_string());
                }
            };
            stats.packets_read += 1;

            let stream_index = packet.stream_index;
            let route = catalog.route(stream_index);
            let outcome = match (route, self.video.as_mut(), self.audio.as_mut()) {
                (Route::Video, Some(video), _) => match video.submit(packet) {
                    Ok(drain) => deliver_video(drain, sink, stats, limit),
                    Err(e) => {
                        warn!("{e}");
                        None
                    }
                },
                (Route::Audio, _, Some(audio)) => {
                    deliver_audio(audio.submit(packet), sink, stats);
                    None
                }
                _ => {
                    trace!("丢弃流 #{stream_index} 的数据包");
                    stats.packets_dropped += 1;
                    None
                }
            };
            if let Some(termination) = outcome {
                if termination == Termination::FrameLimitReached {
                    info!("已输出 {} 个视频帧, 达到上限", stats.video_buffers);
                    self.stop.stop();
                    self.state = ReaderState::Stopping;
                }
                return termination;
            }
        }
    }

    /// 冲刷两条管线
    fn drain(&mut self, sink: &mut dyn BufferSink, stats: &mut RunStats) -> Option<Termination> {
        let limit = self.config.frame_limit;
        if let Some(video) = self.video.as_mut() {
            match video.flush() {
                Ok(drain) => {
                    if let Some(termination) = deliver_video(drain, sink, stats, limit) {
                        return Some(termination);
                    }
                }
                Err(e) => warn!("{e}"),
            }
        }
        if let Some(audio) = self.audio.as_mut() {
            deliver_audio(audio.flush(), sink, stats);
        }
        None
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        self.close();
    }
}

/// 交付一次送包产出的视频缓冲, 返回需要结束运行的原因
fn deliver_video(
    drain: VideoDrain<'_>,
    sink: &mut dyn BufferSink,
    stats: &mut RunStats,
    limit: Option<u64>,
) -> Option<Termination> {
    for item in drain {
        match item {
            Ok(buffer) => {
                let reached = |count: u64| limit.is_some_and(|limit| count >= limit);
                if reached(stats.video_buffers) {
                    return Some(Termination::FrameLimitReached);
                }
                stats.video_buffers += 1;
                sink.on_buffer(OutputBuffer::Video(buffer));
                if reached(stats.video_buffers) {
                    return Some(Termination::FrameLimitReached);
                }
            }
            Err(e) => return Some(Termination::from_terminal(e)),
        }
    }
    None
}

fn deliver_audio(drain: AudioDrain<'_>, sink: &mut dyn BufferSink, stats: &mut RunStats) {
    for buffer in drain {
        stats.audio_buffers += 1;
        sink.on_buffer(OutputBuffer::Audio(buffer));
    }
}
