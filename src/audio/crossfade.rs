/// Complementary linear fade curves used to blend block seams
///
/// `fade_out` runs from 1 down to 0 and `fade_in` from 0 up to 1, both with
/// inclusive endpoints, so `fade_out[i] + fade_in[i] == 1` for every `i`.
/// The curves are computed once and only read afterwards.
#[derive(Debug, Clone)]
pub struct CrossfadeWindow {
    fade_out: Vec<f32>,
    fade_in: Vec<f32>,
}

impl CrossfadeWindow {
    /// Build curves spanning `len` samples
    ///
    /// A zero-length window disables blending.
    pub fn new(len: usize) -> Self {
        let fade_in: Vec<f32> = match len {
            0 => Vec::new(),
            1 => vec![0.0],
            _ => {
                let last = (len - 1) as f32;
                (0..len).map(|i| i as f32 / last).collect()
            }
        };
        let fade_out = fade_in.iter().map(|w| 1.0 - w).collect();

        Self { fade_out, fade_in }
    }

    pub fn len(&self) -> usize {
        self.fade_in.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fade_in.is_empty()
    }

    pub fn fade_out(&self) -> &[f32] {
        &self.fade_out
    }

    pub fn fade_in(&self) -> &[f32] {
        &self.fade_in
    }

    /// Blend `head` into `tail` in place: `tail * fade_out + head * fade_in`
    ///
    /// Both sides must be exactly one window long.
    pub fn blend<'a>(&self, tail: impl Iterator<Item = &'a mut f32>, head: &[f32]) {
        debug_assert_eq!(head.len(), self.len());
        for (((t, &h), &out_w), &in_w) in tail
            .zip(head)
            .zip(&self.fade_out)
            .zip(&self.fade_in)
        {
            *t = *t * out_w + h * in_w;
        }
    }
}
