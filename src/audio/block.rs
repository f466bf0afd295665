/// Raw sample storage of a generated block
#[derive(Debug, Clone, PartialEq)]
pub enum BlockSamples {
    /// 16-bit fixed point
    I16(Vec<i16>),
    /// Fixed point widened to 32 bits; values must lie in [-32768, 32768]
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

impl BlockSamples {
    pub fn len(&self) -> usize {
        match self {
            Self::I16(v) => v.len(),
            Self::I32(v) => v.len(),
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A block of generated audio as handed over by the producer
///
/// The shape is row-major with samples on the last axis, e.g.
/// `[batch, channels, samples]` for model output. Leading size-1 axes are
/// squeezed away during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlock {
    shape: Vec<usize>,
    samples: BlockSamples,
}

impl AudioBlock {
    /// Flat mono float block
    pub fn mono_f32(samples: Vec<f32>) -> Self {
        Self {
            shape: vec![samples.len()],
            samples: BlockSamples::F32(samples),
        }
    }

    /// Flat mono 16-bit fixed-point block
    pub fn mono_i16(samples: Vec<i16>) -> Self {
        Self {
            shape: vec![samples.len()],
            samples: BlockSamples::I16(samples),
        }
    }

    /// Block with an explicit shape
    ///
    /// The shape is not checked here; `normalize` reports a mismatch as a
    /// `FormatError` so a bad block is rejected where it is consumed.
    pub fn with_shape(shape: Vec<usize>, samples: BlockSamples) -> Self {
        Self { shape, samples }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn samples(&self) -> &BlockSamples {
        &self.samples
    }

    /// Total number of stored values across all channels
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
