use serde::{Deserialize, Serialize};

/// One object reported by the detector for a single image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class label assigned by the model (e.g. "empty")
    #[serde(rename = "class")]
    pub class_name: String,

    /// Model confidence in `[0, 1]`
    pub confidence: f32,
}

impl Detection {
    pub fn new(class_name: impl Into<String>, confidence: f32) -> Self {
        Self { class_name: class_name.into(), confidence }
    }
}

/// An image is a stockout iff at least one detection carries the stockout
/// label with a confidence at or above the threshold.
pub fn is_stockout(detections: &[Detection], label: &str, threshold: f32) -> bool {
    detections.iter().any(|d| d.class_name == label && d.confidence >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stockout_requires_label_and_confidence() {
        let detections = vec![Detection::new("product", 0.99), Detection::new("empty", 0.42)];
        assert!(!is_stockout(&detections, "empty", 0.5));
        assert!(is_stockout(&detections, "empty", 0.4));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let detections = vec![Detection::new("empty", 0.5)];
        assert!(is_stockout(&detections, "empty", 0.5));
    }

    #[test]
    fn test_no_detections() {
        assert!(!is_stockout(&[], "empty", 0.0));
    }

    #[test]
    fn test_deserialize_detector_output() {
        let json = r#"[{"class": "empty", "confidence": 0.87}]"#;
        let detections: Vec<Detection> = serde_json::from_str(json).unwrap();
        assert_eq!(detections, vec![Detection::new("empty", 0.87)]);
    }
}
