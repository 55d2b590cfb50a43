//! 解封装器 trait 定义.

use liu_codec::Packet;
use liu_core::LiuResult;

use crate::stream::Stream;

/// 解封装器 trait
///
/// 使用流程:
/// 1. `network_init()` (网络输入需要时)
/// 2. `open()` 打开输入, `find_stream_info()` 探测各流参数
/// 3. `streams()` 获取流描述
/// 4. 循环 `read_packet()` 直到 `Err(LiuError::Eof)`
/// 5. `close()`, 然后 `network_deinit()`
pub trait Demuxer: Send {
    fn name(&self) -> &str;

    /// 初始化网络协议栈, 默认无操作
    fn network_init(&mut self) -> LiuResult<()> {
        Ok(())
    }

    /// 反初始化网络协议栈, 默认无操作
    fn network_deinit(&mut self) {}

    /// 打开输入源
    fn open(&mut self, url: &str) -> LiuResult<()>;

    /// 读取足够的数据以确定各流参数
    fn find_stream_info(&mut self) -> LiuResult<()> {
        Ok(())
    }

    /// 所有流描述, 顺序即流索引顺序
    fn streams(&self) -> &[Stream];

    /// 读取下一个数据包
    ///
    /// # 返回
    /// - `Ok(packet)`: 成功读取一个数据包
    /// - `Err(LiuError::Eof)`: 已到达输入末尾
    /// - 其他错误: 读取失败
    fn read_packet(&mut self) -> LiuResult<Packet>;

    /// 关闭输入源, 可重复调用
    fn close(&mut self) {}
}
