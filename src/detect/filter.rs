use super::result::{Detection, Label};

/// Keeps detections of one label whose confidence exceeds a threshold.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionFilter {
    pub label: Label,
    pub min_confidence: f32,
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self {
            label: Label::Person,
            min_confidence: 0.75,
        }
    }
}

impl DetectionFilter {
    pub fn new(label: Label, min_confidence: f32) -> Self {
        Self {
            label,
            min_confidence,
        }
    }

    pub fn accepts(&self, detection: &Detection) -> bool {
        detection.label == self.label && detection.confidence > self.min_confidence
    }

    /// Surviving detections in input order.
    pub fn apply(&self, detections: &[Detection]) -> Vec<Detection> {
        detections
            .iter()
            .filter(|d| self.accepts(d))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{parse_detections, NormBox};

    fn det(label: Label, confidence: f32) -> Detection {
        Detection {
            image_id: 0,
            label,
            confidence,
            bbox: NormBox::default(),
        }
    }

    #[test]
    fn person_above_threshold_survives() -> anyhow::Result<()> {
        let layer = [0.0, 15.0, 0.9, 0.1, 0.1, 0.5, 0.5, -1.0];
        let detections = parse_detections(&layer)?;
        let survivors = DetectionFilter::new(Label::Person, 0.75).apply(&detections);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].confidence, 0.9);
        Ok(())
    }

    #[test]
    fn threshold_is_strict() {
        let filter = DetectionFilter::new(Label::Person, 0.75);
        assert!(!filter.accepts(&det(Label::Person, 0.75)));
        assert!(filter.accepts(&det(Label::Person, 0.7501)));
    }

    #[test]
    fn other_labels_are_dropped() {
        let filter = DetectionFilter::default();
        let input = vec![
            det(Label::Chair, 0.99),
            det(Label::Person, 0.8),
            det(Label::DiningTable, 0.95),
            det(Label::Person, 0.3),
        ];
        let out = filter.apply(&input);
        assert_eq!(out, vec![det(Label::Person, 0.8)]);
    }

    #[test]
    fn output_is_a_subset_of_input() {
        let filter = DetectionFilter::new(Label::Car, 0.5);
        let input: Vec<Detection> = (0..40)
            .map(|i| {
                let label = Label::from_index(i % 21).unwrap();
                det(label, (i as f32) / 40.0)
            })
            .collect();
        let out = filter.apply(&input);
        assert!(out.len() <= input.len());
        assert!(out.iter().all(|d| input.contains(d)));
        assert!(out.iter().all(|d| d.label == Label::Car && d.confidence > 0.5));
    }

    #[test]
    fn all_below_threshold_yields_nothing() {
        let filter = DetectionFilter::default();
        let input = vec![det(Label::Person, 0.1), det(Label::Person, 0.74)];
        assert!(filter.apply(&input).is_empty());
    }
}
