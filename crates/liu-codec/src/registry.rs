//! 解码器注册表.
//!
//! 按 [`CodecId`] 查找并实例化解码器. 外部引擎 (平台硬件解码器等)
//! 通过 [`CodecRegistry::register_decoder`] 接入, 后注册的同 ID 解码器优先.

use std::collections::HashMap;
use std::sync::Arc;

use liu_core::{LiuError, LiuResult};

use crate::codec_id::CodecId;
use crate::decoder::Decoder;

/// 解码器工厂
pub type DecoderFactory = Arc<dyn Fn() -> LiuResult<Box<dyn Decoder>> + Send + Sync>;

struct DecoderEntry {
    name: String,
    factory: DecoderFactory,
}

/// 解码器注册表
#[derive(Default)]
pub struct CodecRegistry {
    decoders: HashMap<CodecId, Vec<DecoderEntry>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册一个解码器工厂
    pub fn register_decoder<F>(&mut self, codec_id: CodecId, name: impl Into<String>, factory: F)
    where
        F: Fn() -> LiuResult<Box<dyn Decoder>> + Send + Sync + 'static,
    {
        self.decoders
            .entry(codec_id)
            .or_default()
            .push(DecoderEntry {
                name: name.into(),
                factory: Arc::new(factory),
            });
    }

    /// 是否有可用于 `codec_id` 的解码器
    pub fn has_decoder(&self, codec_id: CodecId) -> bool {
        self.decoders
            .get(&codec_id)
            .is_some_and(|entries| !entries.is_empty())
    }

    /// 创建解码器实例, 使用最后注册的工厂
    ///
    /// # 返回
    /// - `Err(LiuError::Unsupported)`: 没有注册该编解码器
    pub fn create_decoder(&self, codec_id: CodecId) -> LiuResult<Box<dyn Decoder>> {
        let entry = self
            .decoders
            .get(&codec_id)
            .and_then(|entries| entries.last())
            .ok_or_else(|| LiuError::Unsupported(format!("未找到 {codec_id} 的解码器")))?;
        (entry.factory)()
    }

    /// 所有已注册的 (编解码器, 解码器名称)
    pub fn list_decoders(&self) -> Vec<(CodecId, &str)> {
        let mut result: Vec<_> = self
            .decoders
            .iter()
            .flat_map(|(id, entries)| entries.iter().map(move |e| (*id, e.name.as_str())))
            .collect();
        result.sort_by_key(|(id, name)| (id.name(), *name));
        result
    }
}
