//! Re-expresses every pose of a sequence relative to its first frame.

use log::debug;
use nalgebra::UnitQuaternion;

use crate::geometry::{quat_to_euler, AxisOrder};
use crate::pose::{NormalizedFrame, PoseError};

/// Rotates a sequence into the frame of its lexicographically first image.
///
/// For frame `i` the stored orientation becomes
/// `q_i * q_0^-1 * reference`, and the angles are that rotation decoded under
/// `axis_order`. Angles of every frame after the first are negated, so a
/// sequence with constant physical roll shows a sign jump between frame 0
/// and frame 1 whenever the reference rotation is not the identity.
/// Positions are left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseNormalizer {
    axis_order: AxisOrder,
    reference: UnitQuaternion<f64>,
}

impl Default for PoseNormalizer {
    fn default() -> Self {
        PoseNormalizer::new(AxisOrder::default())
    }
}

impl PoseNormalizer {
    pub fn new(axis_order: AxisOrder) -> Self {
        PoseNormalizer {
            axis_order,
            reference: UnitQuaternion::identity(),
        }
    }

    /// Composes every frame with `reference`, e.g. an orientation predicted
    /// for the first image.
    pub fn with_reference(mut self, reference: UnitQuaternion<f64>) -> Self {
        self.reference = reference;
        self
    }

    pub fn axis_order(&self) -> AxisOrder {
        self.axis_order
    }

    pub fn reference(&self) -> &UnitQuaternion<f64> {
        &self.reference
    }

    /// Sorts `frames` by file name and rewrites their orientation and angles.
    ///
    /// # Errors
    ///
    /// [`PoseError::EmptySequence`] if `frames` is empty.
    pub fn normalize(&self, frames: &mut [NormalizedFrame]) -> Result<(), PoseError> {
        if frames.is_empty() {
            return Err(PoseError::EmptySequence);
        }

        // stable: frames sharing a name keep their input order
        frames.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        let r0_inv = frames[0].orientation.inverse();

        for (i, frame) in frames.iter_mut().enumerate() {
            let adjusted = frame.orientation * r0_inv * self.reference;
            let angles = quat_to_euler(&adjusted, self.axis_order);
            frame.angles = if i == 0 { angles } else { angles.negated() };
            frame.orientation = adjusted;
        }

        debug!(
            "Normalized {} frames to reference {} ({})",
            frames.len(),
            frames[0].file_name,
            self.axis_order
        );
        Ok(())
    }
}

/// Normalizes `frames` and returns them in file name order.
///
/// `reference` defaults to the identity rotation.
pub fn normalize(
    mut frames: Vec<NormalizedFrame>,
    reference: Option<UnitQuaternion<f64>>,
    axis_order: AxisOrder,
) -> Result<Vec<NormalizedFrame>, PoseError> {
    let normalizer = PoseNormalizer::new(axis_order)
        .with_reference(reference.unwrap_or_else(UnitQuaternion::identity));
    normalizer.normalize(&mut frames)?;
    Ok(frames)
}
