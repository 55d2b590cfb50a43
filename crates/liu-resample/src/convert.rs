//! 采样解码、声道混合与交错排列.

use liu_core::{LiuError, LiuResult, SampleFormat};

/// 将源数据解码为每声道一个的 f32 平面
///
/// 交错输入只读取 `input[0]`, 平面输入每声道读取一个平面.
/// 整数格式归一化到 [-1.0, 1.0).
pub fn to_f32_planes(
    input: &[Vec<u8>],
    format: SampleFormat,
    nb_samples: usize,
    channels: usize,
) -> LiuResult<Vec<Vec<f32>>> {
    let bps = format.bytes_per_sample() as usize;
    if bps == 0 {
        return Err(LiuError::InvalidArgument("无效的采样格式".into()));
    }

    if format.is_planar() {
        if input.len() < channels {
            return Err(LiuError::InvalidArgument(format!(
                "平面数不足: 期望 {channels}, 实际 {}",
                input.len()
            )));
        }
        input[..channels]
            .iter()
            .map(|plane| -> LiuResult<Vec<f32>> {
                check_len(plane, nb_samples * bps)?;
                plane[..nb_samples * bps]
                    .chunks_exact(bps)
                    .map(|raw| decode_sample(raw, format))
                    .collect()
            })
            .collect()
    } else {
        let data = input.first().map(Vec::as_slice).unwrap_or_default();
        check_len(data, nb_samples * channels * bps)?;
        let mut planes = vec![Vec::with_capacity(nb_samples); channels];
        for (i, raw) in data[..nb_samples * channels * bps]
            .chunks_exact(bps)
            .enumerate()
        {
            planes[i % channels].push(decode_sample(raw, format)?);
        }
        Ok(planes)
    }
}

/// 声道混合
///
/// - 单声道 → 多声道: 复制到所有声道
/// - 多声道 → 单声道: 取平均
/// - 其他: 对应声道直接映射, 多余声道丢弃, 缺少的声道填静音
pub fn remix(planes: Vec<Vec<f32>>, dst_channels: usize) -> Vec<Vec<f32>> {
    let src_channels = planes.len();
    if src_channels == dst_channels || src_channels == 0 {
        return planes;
    }
    let nb_samples = planes[0].len();

    if src_channels == 1 {
        return vec![planes[0].clone(); dst_channels];
    }
    if dst_channels == 1 {
        let scale = 1.0 / src_channels as f32;
        let mono = (0..nb_samples)
            .map(|s| planes.iter().map(|p| p[s]).sum::<f32>() * scale)
            .collect();
        return vec![mono];
    }

    let mut planes = planes;
    planes.resize(dst_channels, vec![0.0; nb_samples]);
    planes
}

/// 平面排列转为交错排列
pub fn interleave(planes: &[Vec<f32>]) -> Vec<f32> {
    let Some(first) = planes.first() else {
        return Vec::new();
    };
    let mut out = Vec::with_capacity(first.len() * planes.len());
    for s in 0..first.len() {
        out.extend(planes.iter().map(|p| p[s]));
    }
    out
}

fn check_len(data: &[u8], expected: usize) -> LiuResult<()> {
    if data.len() < expected {
        return Err(LiuError::InvalidArgument(format!(
            "数据不足: 期望 {expected} 字节, 实际 {} 字节",
            data.len()
        )));
    }
    Ok(())
}

/// 单个样本解码为归一化 f32, 字节序为小端
fn decode_sample(raw: &[u8], format: SampleFormat) -> LiuResult<f32> {
    Ok(match format.to_interleaved() {
        SampleFormat::U8 => (f32::from(raw[0]) - 128.0) / 128.0,
        SampleFormat::S16 => f32::from(i16::from_le_bytes([raw[0], raw[1]])) / 32768.0,
        SampleFormat::S32 => {
            (i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64 / 2_147_483_648.0) as f32
        }
        SampleFormat::F32 => f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
        SampleFormat::F64 => {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&raw[..8]);
            f64::from_le_bytes(bytes) as f32
        }
        other => return Err(LiuError::Unsupported(format!("不支持的采样格式: {other}"))),
    })
}
