//! # liu-resample
//!
//! 音频格式转换引擎契约 [`Resampler`] 与软件实现 [`ResampleContext`].
//!
//! 输出固定为 32 位浮点 (交错 `F32` 或平面 `F32p`), 采样率与输入一致:
//! 这里只做采样格式与声道布局的归一化, 不做采样率转换.

mod convert;

use std::sync::Arc;

use liu_core::{ChannelLayout, LiuError, LiuResult, SampleFormat};
use log::debug;

pub use convert::{interleave, remix, to_f32_planes};

/// 转换配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResampleConfig {
    /// 输入输出共用的采样率
    pub sample_rate: u32,
    pub src_sample_format: SampleFormat,
    pub src_channel_layout: ChannelLayout,
    /// `F32` 或 `F32p`
    pub dst_sample_format: SampleFormat,
    pub dst_channel_layout: ChannelLayout,
}

/// 一次转换的结果, 样本内存归调用方所有
#[derive(Debug, Clone)]
pub struct ConvertedAudio {
    /// 交错格式只有一个平面, 平面格式每声道一个
    pub planes: Vec<Vec<f32>>,
    /// 每声道采样数
    pub nb_samples: u32,
    pub sample_format: SampleFormat,
    pub channel_layout: ChannelLayout,
}

/// 音频格式转换引擎
pub trait Resampler: Send {
    fn config(&self) -> &ResampleConfig;

    /// 转换一帧
    ///
    /// # 参数
    /// - `input`: 源数据平面 (交错格式为单个平面)
    /// - `nb_samples`: 每声道采样数
    fn convert(&mut self, input: &[Vec<u8>], nb_samples: u32) -> LiuResult<ConvertedAudio>;

    /// 释放引擎资源, 可重复调用
    fn close(&mut self) {}
}

/// 按配置构造转换引擎
pub type ResamplerFactory =
    Arc<dyn Fn(&ResampleConfig) -> LiuResult<Box<dyn Resampler>> + Send + Sync>;

/// 使用 [`ResampleContext`] 的工厂
pub fn default_factory() -> ResamplerFactory {
    Arc::new(|config: &ResampleConfig| {
        let context = ResampleContext::new(config.clone())?;
        Ok(Box::new(context) as Box<dyn Resampler>)
    })
}

/// 软件格式转换上下文
///
/// 所有采样格式先解码为 f32, 再按目标声道数混合, 最后按目标排列输出.
#[derive(Debug)]
pub struct ResampleContext {
    config: ResampleConfig,
}

impl ResampleContext {
    pub fn new(config: ResampleConfig) -> LiuResult<Self> {
        if !config.dst_sample_format.is_output_format() {
            return Err(LiuError::Unsupported(format!(
                "输出格式只能是 flt/fltp, 收到 {}",
                config.dst_sample_format
            )));
        }
        if config.src_sample_format.bytes_per_sample() == 0 {
            return Err(LiuError::InvalidArgument("源采样格式未指定".into()));
        }
        if config.src_channel_layout.channels == 0 || config.dst_channel_layout.channels == 0 {
            return Err(LiuError::InvalidArgument("声道数不能为 0".into()));
        }
        if config.sample_rate == 0 {
            return Err(LiuError::InvalidArgument("采样率不能为 0".into()));
        }
        debug!(
            "创建格式转换: {} Hz, {} {} -> {} {}",
            config.sample_rate,
            config.src_sample_format,
            config.src_channel_layout,
            config.dst_sample_format,
            config.dst_channel_layout,
        );
        Ok(Self { config })
    }
}

impl Resampler for ResampleContext {
    fn config(&self) -> &ResampleConfig {
        &self.config
    }

    fn convert(&mut self, input: &[Vec<u8>], nb_samples: u32) -> LiuResult<ConvertedAudio> {
        let cfg = &self.config;
        let planes = to_f32_planes(
            input,
            cfg.src_sample_format,
            nb_samples as usize,
            cfg.src_channel_layout.channels as usize,
        )?;
        let planes = remix(planes, cfg.dst_channel_layout.channels as usize);
        let planes = if cfg.dst_sample_format.is_planar() {
            planes
        } else {
            vec![interleave(&planes)]
        };
        Ok(ConvertedAudio {
            planes,
            nb_samples,
            sample_format: cfg.dst_sample_format,
            channel_layout: cfg.dst_channel_layout,
        })
    }
}
