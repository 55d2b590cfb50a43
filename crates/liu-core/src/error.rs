//! 统一错误类型定义.
//!
//! 分两类: 引擎协议信号 (`NeedMoreData` / `Eof` 等, 由解码器与数据源返回),
//! 以及管线自身的失败种类 (流探测、解码器准备、送包、转换、终止条件).

use thiserror::Error;

/// Liu 工作区统一错误类型
#[derive(Debug, Error)]
pub enum LiuError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 解码引擎内部错误
    #[error("编解码器错误: {0}")]
    Codec(String),

    /// 无效数据 (损坏的码流等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 数据不足, 需要更多输入
    #[error("数据不足, 需要更多输入")]
    NeedMoreData,

    /// 已到达流末尾
    #[error("已到达流末尾")]
    Eof,

    /// 输入源无法打开
    #[error("打开输入失败: {0}")]
    OpenInputFailed(String),

    /// 流信息探测失败
    #[error("无法获取流信息: {0}")]
    NoStreamInfo(String),

    /// 没有与编解码器匹配的解码器
    #[error("流 #{stream} 没有可用的 {codec} 解码器")]
    DecoderUnavailable { stream: usize, codec: String },

    /// 解码器拒绝打开参数
    #[error("打开解码器失败: {0}")]
    DecoderOpenFailed(String),

    /// 平台无法提供硬件设备上下文
    #[error("硬件设备上下文不可用: {0}")]
    HardwareContextUnavailable(String),

    /// 单个数据包送入解码器失败 (非致命)
    #[error("送包失败: {0}")]
    PacketSubmitFailed(String),

    /// 视频时间戳回退
    #[error("时间戳不连续: pts {current} < 上一帧 {previous}")]
    StreamDiscontinuity { previous: i64, current: i64 },

    /// 解码器在播放中途报告不再有输出
    #[error("视频流已结束")]
    StreamEnded,

    /// 音频格式转换失败 (非致命)
    #[error("音频转换失败: {0}")]
    ConversionFailed(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

impl LiuError {
    /// 是否为终止整个运行的条件
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::StreamEnded | Self::StreamDiscontinuity { .. })
    }
}

/// Liu 工作区统一 Result 类型
pub type LiuResult<T> = Result<T, LiuError>;
