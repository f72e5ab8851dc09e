use clap::ValueEnum;

use jailbot_fail2ban::SuccessDetection;
use jailbot_runtime::CommandSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliCommandSurface {
    Full,
    Reduced,
}

impl From<CliCommandSurface> for CommandSurface {
    fn from(value: CliCommandSurface) -> Self {
        match value {
            CliCommandSurface::Full => CommandSurface::Full,
            CliCommandSurface::Reduced => CommandSurface::Reduced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliSuccessDetection {
    ExitStatus,
    LegacyOutput,
}

impl From<CliSuccessDetection> for SuccessDetection {
    fn from(value: CliSuccessDetection) -> Self {
        match value {
            CliSuccessDetection::ExitStatus => SuccessDetection::ExitStatus,
            CliSuccessDetection::LegacyOutput => SuccessDetection::LegacyOutputLiteral,
        }
    }
}
