//! Image-classification seam.
//!
//! The classifier is an external collaborator: the gateway hands it an
//! image reference and gets back a disease label and confidence. The
//! shipped implementation is a fixed verdict standing in for the ML
//! service; the real endpoint plugs in behind the same trait.

use ll_domain::error::Result;

/// What the classifier says about one image.
#[derive(Debug, Clone)]
pub struct ClassifierVerdict {
    /// Disease label, e.g. `"rice_brownSpot"`.
    pub disease: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Opaque crop-image classifier.
#[async_trait::async_trait]
pub trait CropClassifier: Send + Sync {
    async fn classify(
        &self,
        image_url: &str,
        crop_type: Option<&str>,
    ) -> Result<ClassifierVerdict>;
}

/// Fixed-verdict classifier used until the ML service is wired up.
pub struct MockClassifier;

#[async_trait::async_trait]
impl CropClassifier for MockClassifier {
    async fn classify(
        &self,
        image_url: &str,
        _crop_type: Option<&str>,
    ) -> Result<ClassifierVerdict> {
        tracing::debug!(image_url = %image_url, "mock classifier invoked");
        Ok(ClassifierVerdict {
            disease: "rice_brownSpot".into(),
            confidence: 0.91,
        })
    }
}
