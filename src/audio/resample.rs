//! Channel downmix and sample-rate conversion.

/// Convert interleaved multi-channel audio to mono by averaging channels.
pub fn to_mono(data: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return data.to_vec();
    }
    let ch = channels as usize;
    data.chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// Linear-interpolation resampler for mono audio, up or down.
///
/// Speech energy sits below 8kHz, so no anti-alias filter is applied when
/// going down to 16kHz.
pub fn resample_linear(samples: &[f32], src_rate: u32, dst_rate: u32) -> Vec<f32> {
    if src_rate == dst_rate || samples.is_empty() || src_rate == 0 || dst_rate == 0 {
        return samples.to_vec();
    }

    let ratio = src_rate as f64 / dst_rate as f64;
    let out_len = ((samples.len() as f64) / ratio).round() as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 * ratio;
            let idx = (src_pos as usize).min(last);
            let frac = src_pos - idx as f64;
            if idx < last {
                (samples[idx] as f64 * (1.0 - frac) + samples[idx + 1] as f64 * frac) as f32
            } else {
                samples[last]
            }
        })
        .collect()
}
