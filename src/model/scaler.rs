//! Standard scaling paired with the trained model.
//!
//! The mean/scale arrays are fitted during training and shipped inside the
//! model artifact; they are applied as-is and never refit at prediction time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerParams {
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Structural check against the feature order the crate produces.
    pub fn check(&self, expected_width: usize) -> Result<(), String> {
        if self.mean.len() != self.scale.len() {
            return Err(format!(
                "scaler mean/scale lengths differ: {} vs {}",
                self.mean.len(),
                self.scale.len()
            ));
        }
        if self.mean.len() != expected_width {
            return Err(format!(
                "scaler width {} does not match feature width {expected_width}",
                self.mean.len()
            ));
        }
        Ok(())
    }

    /// Apply `(x - mean) / scale` column-wise. A zero `scale` entry marks a
    /// constant training column and is applied as a unit divisor.
    pub fn transform(&self, matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
        matrix
            .iter()
            .map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(self.scale.iter()))
                    .map(|(value, (mean, scale))| {
                        let divisor = if *scale == 0.0 { 1.0 } else { *scale };
                        (value - mean) / divisor
                    })
                    .collect()
            })
            .collect()
    }
}
