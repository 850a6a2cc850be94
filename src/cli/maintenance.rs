use std::process::ExitCode;

use anyhow::Result;
use lnatprep_user::MaintenanceStatus;

pub async fn sweep(config: lnatprep::Config) -> Result<ExitCode> {
    let command = super::command(&config).await?;

    let report = match command.maintenance().await {
        Ok(report) => report,
        Err(err) => {
            tracing::error!(err = %err, "maintenance failed");
            return Ok(ExitCode::FAILURE);
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    match report.status {
        MaintenanceStatus::Success => Ok(ExitCode::SUCCESS),
        MaintenanceStatus::PartialFailure => {
            tracing::warn!(
                failed_sweep = report.sweep.failed,
                failed_refresh = report.refresh.failed,
                "maintenance finished with failures"
            );
            Ok(ExitCode::from(2))
        }
    }
}
