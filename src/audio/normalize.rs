use super::block::{AudioBlock, BlockSamples};
use crate::constants::FIXED_POINT_SCALE;
use crate::error::FormatError;

/// Convert a block into canonical mono f32 samples
///
/// Size-1 axes are squeezed away. A remaining `[channels, samples]` layout
/// is averaged down to mono. Fixed-point samples are divided by 32768,
/// floating-point samples are passed through unscaled. Widened fixed-point
/// values beyond the 16-bit range are rejected rather than scaled past 1.
///
/// The block is only read, so a rejected block leaves every piece of
/// playback state untouched.
pub fn normalize(block: &AudioBlock) -> Result<Vec<f32>, FormatError> {
    let shape = block.shape();
    let expected = shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| FormatError::ShapeOverflow {
            shape: shape.to_vec(),
        })?;
    if expected != block.len() {
        return Err(FormatError::ShapeMismatch {
            shape: shape.to_vec(),
            expected,
            actual: block.len(),
        });
    }

    let squeezed: Vec<usize> = shape.iter().copied().filter(|&d| d != 1).collect();
    let channels = match squeezed.as_slice() {
        [] | [_] => 1,
        [channels, _] => *channels,
        _ => {
            return Err(FormatError::UnsupportedRank {
                shape: shape.to_vec(),
                rank: squeezed.len(),
            });
        }
    };
    if channels == 0 {
        return Err(FormatError::NoChannels);
    }

    let flat = to_f32(block.samples())?;
    if channels == 1 {
        return Ok(flat);
    }

    Ok(downmix(&flat, channels))
}

fn to_f32(samples: &BlockSamples) -> Result<Vec<f32>, FormatError> {
    let flat = match samples {
        BlockSamples::I16(v) => v.iter().map(|&s| s as f32 / FIXED_POINT_SCALE).collect(),
        BlockSamples::I32(v) => {
            if let Some((index, &value)) = v
                .iter()
                .enumerate()
                .find(|(_, s)| !(-32_768..=32_768).contains(*s))
            {
                return Err(FormatError::SampleOutOfRange { index, value });
            }
            v.iter().map(|&s| s as f32 / FIXED_POINT_SCALE).collect()
        }
        BlockSamples::F32(v) => v.clone(),
        BlockSamples::F64(v) => v.iter().map(|&s| s as f32).collect(),
    };
    Ok(flat)
}

/// Average planar channels `[c0.., c1.., ...]` into one
fn downmix(planar: &[f32], channels: usize) -> Vec<f32> {
    let frames = planar.len() / channels;
    if frames == 0 {
        return Vec::new();
    }
    let scale = 1.0 / channels as f32;
    let mut mono = vec![0.0; frames];
    for channel in planar.chunks_exact(frames) {
        for (out, &s) in mono.iter_mut().zip(channel) {
            *out += s;
        }
    }
    for s in &mut mono {
        *s *= scale;
    }
    mono
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_canonical_input_is_unchanged() {
        let samples = vec![0.0, 0.25, -0.5, 1.0, -1.0];
        let block = AudioBlock::mono_f32(samples.clone());
        assert_eq!(normalize(&block).unwrap(), samples);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let block = AudioBlock::mono_i16(vec![1000, -2000, 16384]);
        let once = normalize(&block).unwrap();
        let twice = normalize(&AudioBlock::mono_f32(once.clone())).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_fixed_point_boundaries() {
        let block = AudioBlock::with_shape(vec![3], BlockSamples::I32(vec![32768, 0, -32768]));
        assert_eq!(normalize(&block).unwrap(), vec![1.0, 0.0, -1.0]);

        let block = AudioBlock::mono_i16(vec![i16::MIN, 0, 16384]);
        assert_eq!(normalize(&block).unwrap(), vec![-1.0, 0.0, 0.5]);
    }

    #[test]
    fn test_f64_passes_through_without_rescaling() {
        let block = AudioBlock::with_shape(vec![2], BlockSamples::F64(vec![0.5, -0.25]));
        assert_eq!(normalize(&block).unwrap(), vec![0.5, -0.25]);
    }

    #[test]
    fn test_squeezes_model_layout() {
        // [batch, channels, samples] as emitted by a generative model
        let block = AudioBlock::with_shape(
            vec![1, 1, 4],
            BlockSamples::I16(vec![0, 8192, 16384, -8192]),
        );
        assert_eq!(normalize(&block).unwrap(), vec![0.0, 0.25, 0.5, -0.25]);
    }

    #[test]
    fn test_downmixes_planar_stereo() {
        let block = AudioBlock::with_shape(
            vec![1, 2, 3],
            BlockSamples::F32(vec![1.0, 0.0, 0.5, 0.0, 0.0, -0.5]),
        );
        let mono = normalize(&block).unwrap();
        assert_eq!(mono.len(), 3);
        assert_abs_diff_eq!(mono[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(mono[1], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(mono[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_single_sample_block() {
        let block = AudioBlock::with_shape(vec![1, 1, 1], BlockSamples::F32(vec![0.3]));
        assert_eq!(normalize(&block).unwrap(), vec![0.3]);
    }

    #[test]
    fn test_empty_block_is_accepted() {
        let block = AudioBlock::mono_f32(Vec::new());
        assert!(normalize(&block).unwrap().is_empty());
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let block = AudioBlock::with_shape(vec![1, 5], BlockSamples::F32(vec![0.0; 4]));
        assert_eq!(
            normalize(&block),
            Err(FormatError::ShapeMismatch {
                shape: vec![1, 5],
                expected: 5,
                actual: 4,
            })
        );
    }

    #[test]
    fn test_overflowing_shape_is_rejected() {
        let block =
            AudioBlock::with_shape(vec![usize::MAX, 2], BlockSamples::F32(Vec::new()));
        assert_eq!(
            normalize(&block),
            Err(FormatError::ShapeOverflow {
                shape: vec![usize::MAX, 2],
            })
        );
    }

    #[test]
    fn test_widened_fixed_point_out_of_range_is_rejected() {
        let block = AudioBlock::with_shape(vec![3], BlockSamples::I32(vec![100, 65536, i32::MAX]));
        assert_eq!(
            normalize(&block),
            Err(FormatError::SampleOutOfRange {
                index: 1,
                value: 65536,
            })
        );

        let block = AudioBlock::with_shape(vec![1], BlockSamples::I32(vec![-32769]));
        assert!(matches!(
            normalize(&block),
            Err(FormatError::SampleOutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn test_high_rank_is_rejected() {
        let block = AudioBlock::with_shape(vec![2, 2, 2], BlockSamples::F32(vec![0.0; 8]));
        assert!(matches!(
            normalize(&block),
            Err(FormatError::UnsupportedRank { rank: 3, .. })
        ));
    }

    #[test]
    fn test_zero_channels_is_rejected() {
        let block = AudioBlock::with_shape(vec![0, 4], BlockSamples::F32(Vec::new()));
        assert_eq!(normalize(&block), Err(FormatError::NoChannels));
    }
}
