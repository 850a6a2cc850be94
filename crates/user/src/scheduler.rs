use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use crate::{Command, MaintenanceStatus, Store};

/// Run [`Command::maintenance`] on a cron `schedule` (seconds field first).
/// The scheduler is returned unstarted.
pub async fn scheduler<S: Store>(
    command: &Command<S>,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let sched = JobScheduler::new().await?;
    let command = command.clone();

    sched
        .add(Job::new_async(schedule, move |uuid, mut l| {
            let command = command.clone();

            Box::pin(async move {
                match command.maintenance().await {
                    Ok(report) if report.status == MaintenanceStatus::PartialFailure => {
                        tracing::warn!(
                            failed = report.sweep.failed + report.refresh.failed,
                            "scheduled maintenance finished with failures"
                        );
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::error!(err = %err, "scheduled maintenance failed");
                    }
                }

                if let Err(err) = l.next_tick_for_job(uuid).await {
                    tracing::error!(
                        err = %err,
                        "failed to get next tick for scheduled maintenance"
                    );
                }
            })
        })?)
        .await?;

    Ok(sched)
}
