use std::fmt::Display;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Cancelling,
    Succeeded,
    Failed,
}

impl JobState {
    /// A job in one of these states owns the encoder and the output path.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Running | JobState::Cancelling)
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{:?}", self).to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_active() {
        assert!(JobState::Running.is_active());
        assert!(JobState::Cancelling.is_active());
        assert!(!JobState::Idle.is_active());
        assert!(!JobState::Succeeded.is_active());
        assert!(!JobState::Failed.is_active());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", JobState::Cancelling), "cancelling");
    }
}
