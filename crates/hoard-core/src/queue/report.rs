use std::fmt;

/// A job that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub label: String,
    pub message: String,
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.message)
    }
}

/// Tally returned by [`super::TaskQueue::shutdown`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueReport {
    pub completed: usize,
    pub failures: Vec<JobFailure>,
}

impl QueueReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.completed + self.failures.len()
    }
}
