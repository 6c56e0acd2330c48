/// Result of an operation against the host page that may legitimately do nothing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Skipped(SkipReason),
    Failed(Failure),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    NoInputTarget,
    EmptyText,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NoInputTarget => "no_input_target",
            SkipReason::EmptyText => "empty_text",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    TargetDetached,
    HostRejected,
}

impl Failure {
    pub fn as_str(self) -> &'static str {
        match self {
            Failure::TargetDetached => "target_detached",
            Failure::HostRejected => "host_rejected",
        }
    }
}
