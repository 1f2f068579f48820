//! Inference side of the sortgate pipeline: ROI preprocessing, the binary
//! classification type, and classifier back ends.

pub use classify::{Classification, Classifier, MeanLumaClassifier};
pub use preprocess::{preprocess, InputSpec, InputTensor};

#[cfg(feature = "with-tch")]
pub use torch::TorchClassifier;

mod classify;
mod preprocess;
#[cfg(feature = "with-tch")]
mod torch;

#[cfg(feature = "with-tch")]
pub use tch;
