//! 像素格式.
//!
//! 除常规的平面/半平面/打包格式外, 还包括硬件解码器输出的不透明表面格式.
//! 硬件表面格式的帧不携带可寻址的像素平面, 只持有平台句柄.

use std::fmt;

/// 像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 未指定
    None,

    /// YUV 4:2:0 平面格式, 8 位
    Yuv420p,
    /// YUV 4:2:2 平面格式, 8 位
    Yuv422p,
    /// YUV 4:4:4 平面格式, 8 位
    Yuv444p,
    /// NV12: Y 平面 + UV 交错, 4:2:0
    Nv12,
    Rgb24,
    Rgba,
    Bgra,
    Gray8,

    /// Apple VideoToolbox 表面
    VideoToolbox,
    /// Linux VA-API 表面
    Vaapi,
    /// NVIDIA CUDA 表面
    Cuda,
    /// Windows D3D11 纹理
    D3d11,
}

impl PixelFormat {
    /// 是否为硬件表面格式
    pub const fn is_hardware(&self) -> bool {
        matches!(
            self,
            Self::VideoToolbox | Self::Vaapi | Self::Cuda | Self::D3d11
        )
    }

    /// 平面数量, 硬件表面格式为 0
    pub const fn plane_count(&self) -> u32 {
        match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p => 3,
            Self::Nv12 => 2,
            Self::Rgb24 | Self::Rgba | Self::Bgra | Self::Gray8 => 1,
            _ => 0,
        }
    }

    /// 色度子采样 (log2 水平, log2 垂直)
    pub const fn chroma_subsampling(&self) -> (u32, u32) {
        match self {
            Self::Yuv420p | Self::Nv12 => (1, 1),
            Self::Yuv422p => (1, 0),
            _ => (0, 0),
        }
    }

    /// 指定平面每行的字节数
    ///
    /// # 返回
    /// - `None`: 格式没有可寻址平面, 或平面索引超出范围
    pub fn plane_linesize(&self, plane: usize, width: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let w = width as usize;
        let (sub_h, _) = self.chroma_subsampling();
        Some(match self {
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p if plane > 0 => w >> sub_h,
            // NV12 的 UV 平面: (w/2) 个 UV 对
            Self::Nv12 if plane > 0 => (w >> 1) * 2,
            Self::Rgb24 => w * 3,
            Self::Rgba | Self::Bgra => w * 4,
            _ => w,
        })
    }

    /// 指定平面的行数
    pub fn plane_height(&self, plane: usize, height: u32) -> Option<usize> {
        if plane >= self.plane_count() as usize {
            return None;
        }
        let (_, sub_v) = self.chroma_subsampling();
        let h = height as usize;
        Some(if plane == 0 { h } else { h >> sub_v })
    }

    /// 整帧字节数
    pub fn frame_size(&self, width: u32, height: u32) -> Option<usize> {
        if self.plane_count() == 0 {
            return None;
        }
        (0..self.plane_count() as usize).try_fold(0usize, |total, plane| {
            Some(total + self.plane_linesize(plane, width)? * self.plane_height(plane, height)?)
        })
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Yuv420p => "yuv420p",
            Self::Yuv422p => "yuv422p",
            Self::Yuv444p => "yuv444p",
            Self::Nv12 => "nv12",
            Self::Rgb24 => "rgb24",
            Self::Rgba => "rgba",
            Self::Bgra => "bgra",
            Self::Gray8 => "gray8",
            Self::VideoToolbox => "videotoolbox_vld",
            Self::Vaapi => "vaapi",
            Self::Cuda => "cuda",
            Self::D3d11 => "d3d11",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuv420p_frame_size() {
        let pf = PixelFormat::Yuv420p;
        assert_eq!(pf.frame_size(1920, 1080), Some(1920 * 1080 * 3 / 2));
        assert_eq!(pf.plane_linesize(1, 1920), Some(960));
        assert_eq!(pf.plane_height(2, 1080), Some(540));
    }

    #[test]
    fn test_nv12_frame_size() {
        let pf = PixelFormat::Nv12;
        assert_eq!(pf.frame_size(4, 2), Some(4 * 2 + 4));
    }

    #[test]
    fn test_硬件表面没有平面() {
        for pf in [
            PixelFormat::VideoToolbox,
            PixelFormat::Vaapi,
            PixelFormat::Cuda,
            PixelFormat::D3d11,
        ] {
            assert!(pf.is_hardware());
            assert_eq!(pf.plane_count(), 0);
            assert_eq!(pf.frame_size(16, 16), None);
        }
        assert!(!PixelFormat::Nv12.is_hardware());
    }
}
