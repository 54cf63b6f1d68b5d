use std::path::Path;
use std::sync::Mutex;

use image::RgbImage;
use image::imageops::FilterType;
use tch::{CModule, Device, Kind, Tensor};

use super::ModelError;

/// Length of the feature vector produced for one image (ViT-Base hidden size).
pub const EMBEDDING_DIM: usize = 768;

/// Encoder input contract: resolution and normalization statistics the
/// image processor applied during training. Not configurable at runtime.
const INPUT_SIZE: u32 = 224;
const NORM_MEAN: f32 = 0.5;
const NORM_STD: f32 = 0.5;

/// Frozen ViT encoder behind a TorchScript module.
///
/// The module is a trace of the `google/vit-base-patch16-224-in21k`
/// encoder that returns the last hidden state for a `[1, 3, 224, 224]`
/// pixel tensor. Weights load once and are never mutated afterwards;
/// the `Mutex` only serializes access to the libtorch module handle.
pub struct Embedder {
    module: Mutex<CModule>,
    device: Device,
}

impl Embedder {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let device = Device::Cpu;
        let module = CModule::load_on_device(path, device)?;
        Ok(Self {
            module: Mutex::new(module),
            device,
        })
    }

    /// Map raw image bytes to the encoder's CLS-token feature vector.
    pub fn embed(&self, image_bytes: &[u8]) -> Result<Vec<f32>, ModelError> {
        let rgb = decode_rgb(image_bytes)?;
        let tensor = to_input_tensor(&rgb, self.device);

        let module = self.module.lock().unwrap();
        let hidden = tch::no_grad(|| module.forward_ts(&[tensor]))?;

        // Position 0 of the last hidden state is the representation token.
        let cls = hidden.select(1, 0).to_kind(Kind::Float).view([-1]);
        let len = cls.size()[0] as usize;
        let mut features = vec![0.0f32; len];
        cls.copy_data(&mut features, len);
        Ok(features)
    }
}

/// Decode arbitrary upload bytes into the fixed encoder resolution.
///
/// Alpha channels are dropped and grayscale is expanded during the RGB
/// conversion, matching how the encoder was fed during training.
fn decode_rgb(image_bytes: &[u8]) -> Result<RgbImage, ModelError> {
    let image = image::load_from_memory(image_bytes)
        .map_err(|e| ModelError::InvalidImage(e.to_string()))?;
    Ok(image
        .resize_exact(INPUT_SIZE, INPUT_SIZE, FilterType::Triangle)
        .to_rgb8())
}

/// Scale to `[0, 1]`, normalize per channel and lay out as NCHW.
fn to_input_tensor(rgb: &RgbImage, device: Device) -> Tensor {
    let plane = (INPUT_SIZE * INPUT_SIZE) as usize;
    let mut chw = vec![0.0f32; 3 * plane];
    for (i, pixel) in rgb.pixels().enumerate() {
        for channel in 0..3 {
            chw[channel * plane + i] = ((pixel[channel] as f32 / 255.0) - NORM_MEAN) / NORM_STD;
        }
    }
    Tensor::from_slice(&chw)
        .view([1, 3, INPUT_SIZE as i64, INPUT_SIZE as i64])
        .to_device(device)
}
