//! TorchScript classifier back end.

use std::path::Path;

use anyhow::Result;
use tch::{Device, Tensor};

use crate::{
    classify::Classifier,
    preprocess::{InputSpec, InputTensor},
};

/// TorchScript-backed binary classifier.
///
/// Loads a scripted module whose forward pass maps a `[1, 3, H, W]` float
/// batch to a single sigmoid score.
pub struct TorchClassifier {
    module: tch::CModule,
    device: Device,
    input_size: (i64, i64),
}

impl TorchClassifier {
    /// Load a TorchScript module and pin it to the given device.
    pub fn load<P: AsRef<Path>>(model_path: P, device: Device, spec: &InputSpec) -> Result<Self> {
        let module = tch::CModule::load_on_device(model_path, device)?;
        Ok(Self {
            module,
            device,
            input_size: (spec.width as i64, spec.height as i64),
        })
    }

    pub fn device(&self) -> Device {
        self.device
    }
}

impl Classifier for TorchClassifier {
    fn score(&self, input: &InputTensor) -> Result<f32> {
        let (in_w, in_h) = self.input_size;
        if (input.width as i64, input.height as i64) != (in_w, in_h) {
            anyhow::bail!(
                "input size {}x{} does not match model input {in_w}x{in_h}",
                input.width,
                input.height
            );
        }

        let tensor = Tensor::from_slice(&input.data)
            .to_device(self.device)
            .view([1, in_h, in_w, 3])
            .permute([0, 3, 1, 2]);

        let output = self.module.forward_ts(&[tensor])?;
        let flat = output.to_device(Device::Cpu).flatten(0, -1);
        if flat.size1()? < 1 {
            anyhow::bail!("model returned an empty output tensor");
        }
        Ok(flat.double_value(&[0]) as f32)
    }
}
