//! Success/failure interpretation of a finished fail2ban-client invocation.

use crate::command_runner::CommandOutput;

/// Captured stdout that the legacy heuristic treats as a failure.
pub const LEGACY_FAILURE_OUTPUT: &str = "0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Enumerates supported `SuccessDetection` values.
pub enum SuccessDetection {
    /// Success iff the process exited with status 0.
    #[default]
    ExitStatus,
    /// Failure iff stdout is exactly `"0"`; the exit status is ignored.
    LegacyOutputLiteral,
}

impl SuccessDetection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ExitStatus => "exit_status",
            Self::LegacyOutputLiteral => "legacy_output_literal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Enumerates supported `CommandOutcome` values.
pub enum CommandOutcome {
    Succeeded,
    Failed,
}

impl CommandOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

pub fn classify_command_outcome(
    output: &CommandOutput,
    detection: SuccessDetection,
) -> CommandOutcome {
    let succeeded = match detection {
        SuccessDetection::ExitStatus => output.success(),
        SuccessDetection::LegacyOutputLiteral => output.stdout_text() != LEGACY_FAILURE_OUTPUT,
    };
    if succeeded {
        CommandOutcome::Succeeded
    } else {
        CommandOutcome::Failed
    }
}
