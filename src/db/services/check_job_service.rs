use crate::db::entities::{check_job, prelude::*};
use crate::db::enums::CheckJobStatus;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

/// Attempts a job is allowed before it is parked as failed.
pub const MAX_JOB_ATTEMPTS: i32 = 3;

pub async fn enqueue(db: &DatabaseConnection, monitor_id: i32) -> Result<check_job::Model, DbErr> {
    let now = Utc::now();
    let job = check_job::ActiveModel {
        monitor_id: Set(monitor_id),
        status: Set(CheckJobStatus::Pending),
        attempts: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    job.insert(db).await
}

/// Claims the oldest pending job by flipping it to running with a conditional
/// update. Returns None when the queue is empty or another worker won the
/// claim; callers just poll again.
pub async fn claim_next(db: &DatabaseConnection) -> Result<Option<check_job::Model>, DbErr> {
    let Some(job) = CheckJob::find()
        .filter(check_job::Column::Status.eq(CheckJobStatus::Pending))
        .order_by_asc(check_job::Column::CreatedAt)
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let claimed = CheckJob::update_many()
        .set(check_job::ActiveModel {
            status: Set(CheckJobStatus::Running),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(check_job::Column::Id.eq(job.id))
        .filter(check_job::Column::Status.eq(CheckJobStatus::Pending))
        .exec(db)
        .await?;

    if claimed.rows_affected == 1 {
        Ok(Some(job))
    } else {
        Ok(None)
    }
}

pub async fn complete(db: &DatabaseConnection, job_id: i32) -> Result<(), DbErr> {
    CheckJob::delete_by_id(job_id).exec(db).await?;
    Ok(())
}

/// Where a job lands after its n-th execution attempt fails.
pub fn state_after_failure(attempts_made: i32) -> CheckJobStatus {
    if attempts_made >= MAX_JOB_ATTEMPTS {
        CheckJobStatus::Failed
    } else {
        CheckJobStatus::Pending
    }
}

/// Records a failed execution attempt and either requeues the job or parks
/// it as failed once the attempt budget is spent. Returns the new status.
pub async fn record_failure(
    db: &DatabaseConnection,
    job: &check_job::Model,
) -> Result<CheckJobStatus, DbErr> {
    let attempts = job.attempts + 1;
    let next_status = state_after_failure(attempts);
    CheckJob::update_many()
        .set(check_job::ActiveModel {
            status: Set(next_status.clone()),
            attempts: Set(attempts),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(check_job::Column::Id.eq(job.id))
        .exec(db)
        .await?;
    Ok(next_status)
}

/// Requeues running jobs whose worker died mid-flight. Anything still marked
/// running past the cutoff is assumed orphaned; the resulting re-delivery is
/// the at-least-once contract.
pub async fn requeue_stale(
    db: &DatabaseConnection,
    older_than: DateTime<Utc>,
) -> Result<u64, DbErr> {
    let result = CheckJob::update_many()
        .set(check_job::ActiveModel {
            status: Set(CheckJobStatus::Pending),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(check_job::Column::Status.eq(CheckJobStatus::Running))
        .filter(check_job::Column::UpdatedAt.lt(older_than))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn prune_failed(
    db: &DatabaseConnection,
    older_than: DateTime<Utc>,
) -> Result<u64, DbErr> {
    let result = CheckJob::delete_many()
        .filter(check_job::Column::Status.eq(CheckJobStatus::Failed))
        .filter(check_job::Column::UpdatedAt.lt(older_than))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_attempts_requeue_until_budget_spent() {
        assert_eq!(state_after_failure(1), CheckJobStatus::Pending);
        assert_eq!(state_after_failure(2), CheckJobStatus::Pending);
        assert_eq!(state_after_failure(3), CheckJobStatus::Failed);
        assert_eq!(state_after_failure(4), CheckJobStatus::Failed);
    }
}
