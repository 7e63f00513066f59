// 全ジョブ実行（rayon スレッドプール、結果はジョブ順）

use rayon::prelude::*;
use tracing::warn;

use crate::pipeline::job_runner::{JobConfig, JobResult, run_job};

/// Run multiple jobs, collecting results in job order.
/// One job failure does NOT prevent other jobs from running.
///
/// `parallel_workers == 0` lets rayon pick the thread count.
pub fn run_all_jobs(
    jobs: &[JobConfig],
    parallel_workers: usize,
) -> Vec<crate::error::Result<JobResult>> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(parallel_workers)
        .build()
    {
        Ok(pool) => pool.install(|| jobs.par_iter().map(run_job).collect()),
        Err(e) => {
            warn!(error = %e, "thread pool unavailable, running jobs sequentially");
            jobs.iter().map(run_job).collect()
        }
    }
}
