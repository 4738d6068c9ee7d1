//! Building blocks shared by the text models.

mod bilstm;
mod embedding;
mod encoder;

pub use bilstm::BiLstm;
pub use embedding::{MaskedEmbedding, PAD_ID, padding_mask};
pub use encoder::{Encoded, SeqEncoder};
