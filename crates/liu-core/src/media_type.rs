//! 媒体流类型.

use std::fmt;

/// 媒体流类型
///
/// 管线只处理 `Video` 与 `Audio`, 其余类型的流在路由时被忽略.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Video,
    Audio,
    Subtitle,
    /// 数据流 (如时间码)
    Data,
    /// 附件流 (如封面图片、字体)
    Attachment,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "视频",
            Self::Audio => "音频",
            Self::Subtitle => "字幕",
            Self::Data => "数据",
            Self::Attachment => "附件",
        };
        write!(f, "{name}")
    }
}
