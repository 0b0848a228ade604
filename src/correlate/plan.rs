//! Template plan precomputation for ZNCC.

use crate::image::ImageView;
use crate::util::{IdentError, IdentResult};

/// Zero-mean template buffer and its energy, computed once per template.
#[derive(Clone, Debug)]
pub struct ZnccPlan {
    width: usize,
    height: usize,
    t_prime: Vec<f32>,
    var_t: f32,
}

impl ZnccPlan {
    /// Builds a plan from a template view.
    ///
    /// Flat templates have no variance and cannot be correlated.
    pub fn from_view(tpl: ImageView<'_, u8>) -> IdentResult<Self> {
        let width = tpl.width();
        let height = tpl.height();
        let count = width * height;

        let mut sum = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(IdentError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: y * tpl.stride(),
            })?;
            sum += row.iter().map(|&v| f64::from(v)).sum::<f64>();
        }
        let mean = sum / count as f64;

        let mut t_prime = Vec::with_capacity(count);
        let mut var_t = 0.0f64;
        for y in 0..height {
            let row = tpl.row(y).ok_or(IdentError::BufferTooSmall {
                needed: (y + 1) * tpl.stride(),
                got: y * tpl.stride(),
            })?;
            for &value in row {
                let centered = f64::from(value) - mean;
                var_t += centered * centered;
                t_prime.push(centered as f32);
            }
        }
        if var_t <= 1e-8 {
            return Err(IdentError::DegenerateTemplate {
                reason: "zero variance",
            });
        }

        Ok(Self {
            width,
            height,
            t_prime,
            var_t: var_t as f32,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Zero-mean template values in row-major order.
    pub fn t_prime(&self) -> &[f32] {
        &self.t_prime
    }

    /// Sum of squared zero-mean template values.
    pub fn var_t(&self) -> f32 {
        self.var_t
    }
}
