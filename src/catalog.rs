//! 流目录: 探测输入源中的各条流并选出活动流.
//!
//! 每种媒体类型只支持一条活动流: 第一条视频流与第一条音频流.

use liu_codec::CodecRegistry;
use liu_core::{LiuError, LiuResult, MediaType};
use liu_format::{Demuxer, Stream};
use log::{info, warn};

/// 数据包路由目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Video,
    Audio,
    /// 未知流索引或非活动流
    Ignored,
}

/// 目录条目
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub stream: Stream,
    /// 注册表中有该编解码器的解码器
    pub decodable: bool,
}

/// 流目录
#[derive(Debug, Clone)]
pub struct StreamCatalog {
    entries: Vec<CatalogEntry>,
    video: Option<usize>,
    audio: Option<usize>,
}

impl StreamCatalog {
    /// 探测输入源
    ///
    /// 探测失败返回 `NoStreamInfo`. 找不到解码器只记录警告, 不影响探测结果.
    pub fn discover(demuxer: &mut dyn Demuxer, codecs: &CodecRegistry) -> LiuResult<Self> {
        demuxer
            .find_stream_info()
            .map_err(|e| LiuError::NoStreamInfo(e.to_string()))?;
        Ok(Self::from_streams(demuxer.streams(), codecs))
    }

    /// 由已知的流描述建立目录
    pub fn from_streams(streams: &[Stream], codecs: &CodecRegistry) -> Self {
        let mut catalog = Self {
            entries: Vec::with_capacity(streams.len()),
            video: None,
            audio: None,
        };
        for (position, stream) in streams.iter().enumerate() {
            let decodable = codecs.has_decoder(stream.codec_id);
            if !decodable && matches!(stream.media_type, MediaType::Video | MediaType::Audio) {
                warn!(
                    "流 #{}: 没有 {} 解码器, 该流无法解码",
                    stream.index, stream.codec_id
                );
            }
            match stream.media_type {
                MediaType::Video if catalog.video.is_none() => {
                    if let Some(v) = stream.video_params() {
                        info!(
                            "视频流 #{}: {} {}x{}, 时间基 {}",
                            stream.index, stream.codec_id, v.width, v.height, stream.time_base
                        );
                    }
                    catalog.video = Some(position);
                }
                MediaType::Audio if catalog.audio.is_none() => {
                    if let Some(a) = stream.audio_params() {
                        info!(
                            "音频流 #{}: {} {} Hz {}",
                            stream.index, stream.codec_id, a.sample_rate, a.channel_layout
                        );
                    }
                    catalog.audio = Some(position);
                }
                _ => {}
            }
            catalog.entries.push(CatalogEntry {
                stream: stream.clone(),
                decodable,
            });
        }
        catalog
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// 按流索引查找
    pub fn get(&self, stream_index: usize) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.stream.index == stream_index)
    }

    pub fn active_video(&self) -> Option<&Stream> {
        self.video.map(|i| &self.entries[i].stream)
    }

    pub fn active_audio(&self) -> Option<&Stream> {
        self.audio.map(|i| &self.entries[i].stream)
    }

    /// 数据包路由
    pub fn route(&self, stream_index: usize) -> Route {
        let is_active = |slot: Option<usize>| {
            slot.is_some_and(|i| self.entries[i].stream.index == stream_index)
        };
        if is_active(self.video) {
            Route::Video
        } else if is_active(self.audio) {
            Route::Audio
        } else {
            Route::Ignored
        }
    }
}
