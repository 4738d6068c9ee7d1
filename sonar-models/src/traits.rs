//! Core trait for text models.

use crate::error::Result;
use candle::Tensor;

/// Maps right-padded token ids to logits.
///
/// Token id 0 is padding. Padded positions never change the logits of real
/// positions.
pub trait TextModel {
    /// Registered name.
    fn name(&self) -> &'static str;

    fn num_classes(&self) -> usize;

    /// Run the model on `[batch, time]` token ids.
    ///
    /// Dropout is active only when `train` is set.
    fn forward(&self, input_x: &Tensor, train: bool) -> Result<Tensor>;
}
