use crate::pose::{Joint, PoseSnapshot};

pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.6;

/// Confidence check over the joints an exercise rule depends on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityGate {
    threshold: f64,
}

impl VisibilityGate {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True iff every joint is present and strictly above the threshold
    pub fn is_visible(&self, pose: &PoseSnapshot, joints: &[Joint]) -> bool {
        joints.iter().all(|j| self.joint_visible(pose, *j))
    }

    /// Joints that fail the gate, in the order they were requested
    pub fn hidden(&self, pose: &PoseSnapshot, joints: &[Joint]) -> Vec<Joint> {
        joints
            .iter()
            .copied()
            .filter(|j| !self.joint_visible(pose, *j))
            .collect()
    }

    fn joint_visible(&self, pose: &PoseSnapshot, joint: Joint) -> bool {
        pose.get(joint)
            .is_some_and(|l| l.visibility > self.threshold)
    }
}

impl Default for VisibilityGate {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Landmark;

    fn leg(visibility: f64) -> PoseSnapshot {
        PoseSnapshot::new()
            .with(Joint::LeftHip, Landmark::new(0.5, 0.5, 0.9))
            .with(Joint::LeftKnee, Landmark::new(0.5, 0.7, visibility))
            .with(Joint::LeftAnkle, Landmark::new(0.5, 0.9, 0.9))
    }

    const LEG: [Joint; 3] = [Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle];

    #[test]
    fn default_threshold() {
        assert_eq!(VisibilityGate::default().threshold(), 0.6);
    }

    #[test]
    fn all_joints_above_threshold() {
        let gate = VisibilityGate::default();
        assert!(gate.is_visible(&leg(0.61), &LEG));
        assert!(gate.hidden(&leg(0.61), &LEG).is_empty());
    }

    #[test]
    fn threshold_is_exclusive() {
        let gate = VisibilityGate::default();
        assert!(!gate.is_visible(&leg(0.6), &LEG));
        assert_eq!(gate.hidden(&leg(0.6), &LEG), vec![Joint::LeftKnee]);
    }

    #[test]
    fn missing_joint_is_hidden() {
        let gate = VisibilityGate::new(0.5);
        let pose = leg(0.9);
        assert!(!gate.is_visible(&pose, &[Joint::LeftHip, Joint::RightHip]));
    }

    #[test]
    fn threshold_is_clamped() {
        assert_eq!(VisibilityGate::new(3.0).threshold(), 1.0);
        assert_eq!(VisibilityGate::new(-1.0).threshold(), 0.0);
    }
}
