//! 硬件表面提供者契约.
//!
//! 平台相关的设备创建与表面分配由外部实现 [`HwDeviceProvider`] / [`HwDevice`] /
//! [`Surface`]. 这里只定义句柄的所有权语义与像素格式协商策略.

use std::fmt;
use std::sync::Arc;

use liu_core::{LiuResult, PixelFormat};
use log::debug;
use serde::{Deserialize, Serialize};

/// 硬件加速设备类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HwDeviceType {
    /// macOS / iOS VideoToolbox
    VideoToolbox,
    /// Linux VA-API
    Vaapi,
    /// NVIDIA CUDA
    Cuda,
    /// Windows D3D11VA
    D3d11,
}

impl HwDeviceType {
    /// 该设备解码输出的表面格式
    pub const fn surface_format(&self) -> PixelFormat {
        match self {
            Self::VideoToolbox => PixelFormat::VideoToolbox,
            Self::Vaapi => PixelFormat::Vaapi,
            Self::Cuda => PixelFormat::Cuda,
            Self::D3d11 => PixelFormat::D3d11,
        }
    }

    /// 当前平台的默认设备类型
    pub const fn platform_default() -> Self {
        if cfg!(any(target_os = "macos", target_os = "ios")) {
            Self::VideoToolbox
        } else if cfg!(target_os = "windows") {
            Self::D3d11
        } else {
            Self::Vaapi
        }
    }
}

impl Default for HwDeviceType {
    fn default() -> Self {
        Self::platform_default()
    }
}

impl fmt::Display for HwDeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::VideoToolbox => "videotoolbox",
            Self::Vaapi => "vaapi",
            Self::Cuda => "cuda",
            Self::D3d11 => "d3d11va",
        };
        write!(f, "{name}")
    }
}

/// 平台硬件设备
pub trait HwDevice: Send + Sync {
    fn device_type(&self) -> HwDeviceType;

    /// 释放平台设备, 在最后一个 [`HwDeviceContext`] 引用消失时调用一次
    fn release(&mut self) {}
}

struct DeviceHolder {
    device: Box<dyn HwDevice>,
}

impl Drop for DeviceHolder {
    fn drop(&mut self) {
        debug!("释放硬件设备上下文: {}", self.device.device_type());
        self.device.release();
    }
}

/// 引用计数的硬件设备上下文
///
/// 克隆即增加一个引用 (解码器绑定时持有一份), 最后一个引用析构时释放设备.
#[derive(Clone)]
pub struct HwDeviceContext {
    inner: Arc<DeviceHolder>,
}

impl HwDeviceContext {
    pub fn new(device: impl HwDevice + 'static) -> Self {
        Self {
            inner: Arc::new(DeviceHolder {
                device: Box::new(device),
            }),
        }
    }

    pub fn device_type(&self) -> HwDeviceType {
        self.inner.device.device_type()
    }

    /// 设备输出的表面像素格式
    pub fn surface_format(&self) -> PixelFormat {
        self.device_type().surface_format()
    }

    /// 当前引用数
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl fmt::Debug for HwDeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HwDeviceContext")
            .field("device_type", &self.device_type())
            .field("refs", &self.ref_count())
            .finish()
    }
}

/// 硬件设备提供者
pub trait HwDeviceProvider: Send {
    /// 创建指定类型的设备上下文, 平台不支持时返回错误
    fn create_device_context(&self, device_type: HwDeviceType) -> LiuResult<HwDeviceContext>;
}

/// 硬件驻留的可呈现图像
///
/// 像素数据始终留在设备上; 句柄的最后一个引用析构即归还表面.
pub trait Surface: Send + Sync + fmt::Debug {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> PixelFormat;
}

/// 共享的表面句柄
pub type SurfaceRef = Arc<dyn Surface>;

/// 像素格式协商策略
///
/// 候选列表中有 `hw_format` 时选它; 否则选第一个软件格式,
/// 全部是硬件格式时退回第一个候选; 列表为空返回 `None`.
pub fn select_pixel_format(
    candidates: &[PixelFormat],
    hw_format: Option<PixelFormat>,
) -> PixelFormat {
    if let Some(hw) = hw_format {
        if candidates.contains(&hw) {
            return hw;
        }
    }
    candidates
        .iter()
        .copied()
        .find(|format| !format.is_hardware())
        .or_else(|| candidates.first().copied())
        .unwrap_or(PixelFormat::None)
}
