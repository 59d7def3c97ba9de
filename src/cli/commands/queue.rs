//! `elon queue list|approve|reject` (§10.4, §4.3).

use elon_queue::{Bucket, WorkQueue};

use crate::cli::args::QueueAction;
use crate::context::Context;
use crate::ElonError;

fn parse_bucket(name: &str) -> Result<Bucket, ElonError> {
    match name {
        "pending" => Ok(Bucket::Pending),
        "approved" => Ok(Bucket::Approved),
        "completed" => Ok(Bucket::Completed),
        "failed" => Ok(Bucket::Failed),
        "rejected" => Ok(Bucket::Rejected),
        other => Err(ElonError::ValidationFailed(format!(
            "unknown bucket '{other}' (expected pending|approved|completed|failed|rejected)"
        ))),
    }
}

pub fn run(ctx: &Context, action: &QueueAction) -> Result<(), ElonError> {
    let queue = WorkQueue::new(ctx.data_dir.clone()).map_err(ElonError::Other)?;

    match action {
        QueueAction::List { bucket } => {
            let bucket = parse_bucket(bucket)?;
            let specs = queue.list(bucket).map_err(ElonError::Other)?;
            if specs.is_empty() {
                println!("(empty)");
            }
            for spec in specs {
                println!("{}  [{:?}/{:?}]  {}", spec.id, spec.priority, spec.category, spec.description);
            }
        }
        QueueAction::Approve { id } => {
            queue
                .transition(id, Bucket::Pending, Bucket::Approved)
                .map_err(|e| ElonError::QueueIo(e.to_string()))?;
            println!("approved {id}");
        }
        QueueAction::Reject { id } => {
            queue
                .transition(id, Bucket::Pending, Bucket::Rejected)
                .map_err(|e| ElonError::QueueIo(e.to_string()))?;
            println!("rejected {id}");
        }
    }

    Ok(())
}
