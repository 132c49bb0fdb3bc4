//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod config_cmd;
pub mod device;
pub mod power;
pub mod scan;
pub mod status;
pub mod util;
pub mod watch;

use filmdeck_core::{Capability, Command as CoreCommand, DeviceConfig};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a scanner-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    device: DeviceConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(device, global).await,
        Command::Watch(args) => watch::handle(device, args, global).await,
        Command::Advance => device::handle(device, CoreCommand::Advance, global).await,
        Command::Light => {
            device::handle(device, CoreCommand::for_capability(Capability::Light), global).await
        }
        Command::FastForward => {
            let command = CoreCommand::for_capability(Capability::FastForward);
            device::handle(device, command, global).await
        }
        Command::Zoom => {
            device::handle(device, CoreCommand::for_capability(Capability::Zoom), global).await
        }
        Command::Scan(args) => scan::handle(device, args, global).await,
        Command::Dismiss => scan::dismiss(device, global).await,
        Command::Poweroff => power::handle(device, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "local command routed to the scanner dispatcher".into(),
        )),
    }
}
