//! RAW 视频解码器.
//!
//! 按像素格式把未压缩数据切分为平面. 它只能输出流参数中的那一种格式,
//! 协商回调拒绝该格式时打开失败.

use liu_core::{LiuError, LiuResult, PixelFormat};
use log::debug;

use crate::codec_id::CodecId;
use crate::codec_parameters::CodecParameters;
use crate::decoder::{Decoder, GetFormatFn};
use crate::frame::{Frame, FrameFlags, VideoFrame};
use crate::packet::Packet;

/// RAW 视频解码器
pub struct RawVideoDecoder {
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    /// 各平面 (行字节数, 行数)
    planes: Vec<(usize, usize)>,
    frame_size: usize,
    get_format: Option<GetFormatFn>,
    pending: Option<VideoFrame>,
    opened: bool,
    flushing: bool,
}

impl RawVideoDecoder {
    pub fn create() -> LiuResult<Box<dyn Decoder>> {
        Ok(Box::new(Self {
            width: 0,
            height: 0,
            pixel_format: PixelFormat::None,
            planes: Vec::new(),
            frame_size: 0,
            get_format: None,
            pending: None,
            opened: false,
            flushing: false,
        }))
    }
}

impl Decoder for RawVideoDecoder {
    fn codec_id(&self) -> CodecId {
        CodecId::RawVideo
    }

    fn name(&self) -> &str {
        "rawvideo"
    }

    fn set_get_format(&mut self, get_format: GetFormatFn) {
        self.get_format = Some(get_format);
    }

    fn open(&mut self, params: &CodecParameters) -> LiuResult<()> {
        let video = params
            .video()
            .ok_or_else(|| LiuError::InvalidArgument("rawvideo 解码器需要视频参数".into()))?;
        if video.width == 0 || video.height == 0 {
            return Err(LiuError::InvalidArgument("宽度和高度不能为 0".into()));
        }

        let pf = video.pixel_format;
        if let Some(get_format) = &self.get_format {
            let chosen = get_format(&[pf]);
            if chosen != pf {
                return Err(LiuError::InvalidArgument(format!(
                    "rawvideo 只能输出 {pf}, 协商结果为 {chosen}"
                )));
            }
        }

        let frame_size = pf
            .frame_size(video.width, video.height)
            .ok_or_else(|| LiuError::InvalidArgument(format!("无法计算 {pf} 的帧大小")))?;
        self.planes = (0..pf.plane_count() as usize)
            .map(|i| {
                let linesize = pf.plane_linesize(i, video.width);
                let rows = pf.plane_height(i, video.height);
                linesize.zip(rows).ok_or_else(|| {
                    LiuError::InvalidArgument(format!("无法计算平面 {i} 的尺寸"))
                })
            })
            .collect::<LiuResult<_>>()?;
        self.width = video.width;
        self.height = video.height;
        self.pixel_format = pf;
        self.frame_size = frame_size;
        self.pending = None;
        self.opened = true;
        self.flushing = false;

        debug!(
            "打开 rawvideo 解码器: {}x{}, 格式={}, 帧大小={}",
            self.width, self.height, self.pixel_format, self.frame_size,
        );
        Ok(())
    }

    fn send_packet(&mut self, packet: &Packet) -> LiuResult<()> {
        if !self.opened {
            return Err(LiuError::Codec("解码器未打开, 请先调用 open()".into()));
        }
        if self.pending.is_some() {
            return Err(LiuError::NeedMoreData);
        }
        if packet.is_empty() {
            self.flushing = true;
            return Ok(());
        }
        if packet.size() != self.frame_size {
            return Err(LiuError::InvalidData(format!(
                "数据大小 {} 与帧大小 {} 不匹配",
                packet.size(),
                self.frame_size,
            )));
        }

        let mut frame = VideoFrame::new(self.width, self.height, self.pixel_format);
        frame.pts = packet.pts;
        frame.time_base = packet.time_base;
        frame.duration = packet.duration;
        frame.flags = FrameFlags::KEY;

        let mut offset = 0usize;
        for (i, &(linesize, rows)) in self.planes.iter().enumerate() {
            let len = linesize * rows;
            frame.data[i] = packet.data[offset..offset + len].to_vec();
            frame.linesize[i] = linesize;
            offset += len;
        }

        self.pending = Some(frame);
        Ok(())
    }

    fn receive_frame(&mut self) -> LiuResult<Frame> {
        if let Some(frame) = self.pending.take() {
            return Ok(Frame::Video(frame));
        }
        if self.flushing {
            return Err(LiuError::Eof);
        }
        Err(LiuError::NeedMoreData)
    }

    fn close(&mut self) {
        self.pending = None;
        self.opened = false;
    }
}
