//! Scan session commands.

use filmdeck_core::{Controller, DeviceConfig, StartScanRequest};

use crate::cli::{GlobalOpts, ScanArgs, ScanCommand};
use crate::error::CliError;

use super::util;

pub async fn handle(device: DeviceConfig, args: ScanArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ScanCommand::Start {
            output_directory,
            frames,
        } => {
            let request = StartScanRequest::new(output_directory, frames);
            // Fail on bad input before touching the network.
            request.validate()?;

            let message = format!(
                "Scanning {} frames into {}",
                request.target_frame_count, request.output_directory
            );
            Controller::oneshot(device, |controller| async move {
                controller.start_scan(request).await
            })
            .await?;
            util::done(&message, global);
            Ok(())
        }

        ScanCommand::Stop => {
            if !util::confirm("scan stop", "Stop the running scan?", global.yes)? {
                return Err(CliError::Cancelled {
                    action: "scan stop".into(),
                });
            }
            Controller::oneshot(device, |controller| async move {
                controller.stop_scan().await
            })
            .await?;
            util::done("Scan stop requested", global);
            Ok(())
        }
    }
}

pub async fn dismiss(device: DeviceConfig, global: &GlobalOpts) -> Result<(), CliError> {
    Controller::oneshot(device, |controller| async move {
        controller.dismiss_alert().await
    })
    .await?;
    util::done("Scan result dismissed", global);
    Ok(())
}
