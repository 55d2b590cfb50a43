//! 解码器 trait 定义.

use liu_core::{LiuError, LiuResult, PixelFormat};

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::frame::Frame;
use crate::hw::HwDeviceContext;
use crate::packet::Packet;

/// 像素格式协商回调: 从解码器给出的候选列表中选出输出格式
pub type GetFormatFn = Box<dyn Fn(&[PixelFormat]) -> PixelFormat + Send>;

/// 解码器 trait
///
/// 管线视解码器为不透明引擎, 只通过此接口交互.
///
/// 解码流程:
/// 1. `open()` 之前可选地 `attach_hw_device()` 与 `set_get_format()`
/// 2. `send_packet()` 送入压缩数据
/// 3. 反复 `receive_frame()` 直到返回 `NeedMoreData` 或 `Eof`
/// 4. 送入空包 (flush) 以取出解码器中缓存的帧
/// 5. `close()` 释放引擎资源
pub trait Decoder: Send {
    fn codec_id(&self) -> CodecId;

    fn name(&self) -> &str;

    /// 使用参数打开解码器
    fn open(&mut self, params: &CodecParameters) -> LiuResult<()>;

    /// 绑定硬件设备上下文, 请求硬件驻留的输出表面
    ///
    /// 默认实现返回 `Unsupported`, 即纯软件解码器.
    fn attach_hw_device(&mut self, _device: HwDeviceContext) -> LiuResult<()> {
        Err(LiuError::Unsupported(format!(
            "{} 不支持硬件解码",
            self.name()
        )))
    }

    /// 安装像素格式协商回调
    ///
    /// 解码器在确定输出格式时以候选列表调用它. 默认忽略.
    fn set_get_format(&mut self, _get_format: GetFormatFn) {}

    /// 送入一个压缩数据包
    ///
    /// # 返回
    /// - `Ok(())`: 数据包已接受
    /// - `Err(LiuError::NeedMoreData)`: 内部缓冲区已满, 需要先取出帧
    fn send_packet(&mut self, packet: &Packet) -> LiuResult<()>;

    /// 取出一帧解码数据
    ///
    /// # 返回
    /// - `Ok(frame)`: 成功取出一帧
    /// - `Err(LiuError::NeedMoreData)`: 需要送入更多数据包
    /// - `Err(LiuError::Eof)`: 不会再有输出
    fn receive_frame(&mut self) -> LiuResult<Frame>;

    /// 释放引擎资源, 可重复调用
    fn close(&mut self) {}
}
