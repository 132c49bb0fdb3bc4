//! Capability buttons: advance, light, fast-forward, zoom.

use filmdeck_core::{Command as CoreCommand, Controller, DeviceConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

use super::util;

pub async fn handle(
    device: DeviceConfig,
    command: CoreCommand,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let message = match command.capability() {
        Some(capability) => format!("{} sent", capability.label()),
        None => "Command sent".to_owned(),
    };

    Controller::oneshot(device, |controller| async move {
        controller.execute(command).await
    })
    .await?;

    util::done(&message, global);
    Ok(())
}
