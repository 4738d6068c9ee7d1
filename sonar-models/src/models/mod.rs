pub mod bilstm_crf;
pub mod rnn_class;

pub use bilstm_crf::BilstmCrfModel;
pub use rnn_class::RnnClassModel;
