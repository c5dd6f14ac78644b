use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    error::{Result, SchedulerError},
    schedule::{compute_next_run, realign},
    types::{Job, Schedule},
};

/// Executes fired jobs. Returns `false` when the run failed; the job stays
/// scheduled either way.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn run(&self, job: &Job) -> bool;
}

struct Entry {
    job: Job,
    period: Duration,
    due: Instant,
}

/// Interval scheduler. Jobs are added up front, then [`run`](Self::run)
/// drives them until shutdown.
///
/// The first fire of a job comes one interval after it was added.
#[derive(Default)]
pub struct SchedulerEngine {
    entries: Vec<Entry>,
}

impl SchedulerEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job. Returns the populated [`Job`] record.
    pub fn add_job(&mut self, name: &str, schedule: Schedule, action: &str) -> Result<Job> {
        let period = schedule.as_duration();
        let due = Instant::now()
            .checked_add(period)
            .ok_or_else(|| SchedulerError::InvalidSchedule(schedule.to_string()))?;

        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            schedule,
            action: action.to_string(),
            run_count: 0,
            skipped_count: 0,
            last_run: None,
            next_run: compute_next_run(&schedule, now),
            created_at: now,
        };

        info!(job_id = %job.id, name = %job.name, %schedule, "job added");

        self.entries.push(Entry {
            job: job.clone(),
            period,
            due,
        });
        Ok(job)
    }

    /// All jobs in registration order.
    pub fn list_jobs(&self) -> Vec<Job> {
        self.entries.iter().map(|e| e.job.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Main event loop. Runs until `shutdown` broadcasts `true` or its sender
    /// is dropped. Shutdown is observed between jobs, never during one.
    pub async fn run<H>(mut self, handler: &H, mut shutdown: watch::Receiver<bool>)
    where
        H: JobHandler + ?Sized,
    {
        info!(jobs = self.entries.len(), "scheduler engine started");

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let Some(idx) = self.next_due() else {
                // Nothing to fire; just wait for shutdown.
                if shutdown.changed().await.is_err() {
                    break;
                }
                continue;
            };

            tokio::select! {
                _ = sleep_until(self.entries[idx].due) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    continue;
                }
            }

            self.fire(idx, handler).await;
        }

        info!("scheduler engine shutting down");
    }

    // --- private helpers ---------------------------------------------------

    /// Index of the entry with the earliest due time; ties go to the one
    /// registered first.
    fn next_due(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(i, e)| (e.due, *i))
            .map(|(i, _)| i)
    }

    async fn fire<H>(&mut self, idx: usize, handler: &H)
    where
        H: JobHandler + ?Sized,
    {
        let entry = &mut self.entries[idx];
        entry.job.last_run = Some(Utc::now());
        entry.job.run_count += 1;

        info!(job_id = %entry.job.id, name = %entry.job.name, run = entry.job.run_count, "executing job");
        if !handler.run(&entry.job).await {
            warn!(job_id = %entry.job.id, name = %entry.job.name, "job run failed");
        }

        let now = Instant::now();
        let Some((next, skipped)) = realign(entry.due, entry.period, now) else {
            warn!(
                job_id = %entry.job.id,
                name = %entry.job.name,
                "next fire is out of range; job dropped"
            );
            self.entries.remove(idx);
            return;
        };
        if skipped > 0 {
            warn!(
                job_id = %entry.job.id,
                name = %entry.job.name,
                skipped,
                "job overran its interval; skipping missed fires"
            );
            entry.job.skipped_count = entry.job.skipped_count.saturating_add(skipped);
        }
        entry.due = next;
        entry.job.next_run = chrono::Duration::from_std(next - now)
            .ok()
            .and_then(|d| Utc::now().checked_add_signed(d));
        debug!(job_id = %entry.job.id, next_run = ?entry.job.next_run, "job rescheduled");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records `(action, offset from start, run_count, skipped_count)` for
    /// every run and optionally takes `busy` of virtual time per run.
    struct Recorder {
        start: Instant,
        busy: Duration,
        runs: Mutex<Vec<(String, Duration, u32, u32)>>,
    }

    impl Recorder {
        fn new(busy: Duration) -> Self {
            Self {
                start: Instant::now(),
                busy,
                runs: Mutex::new(Vec::new()),
            }
        }

        fn runs(&self) -> Vec<(String, Duration, u32, u32)> {
            self.runs.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobHandler for Recorder {
        async fn run(&self, job: &Job) -> bool {
            self.runs.lock().unwrap().push((
                job.action.clone(),
                Instant::now() - self.start,
                job.run_count,
                job.skipped_count,
            ));
            if !self.busy.is_zero() {
                tokio::time::sleep(self.busy).await;
            }
            true
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    async fn shutdown_after(tx: watch::Sender<bool>, after: Duration) {
        tokio::time::sleep(after).await;
        tx.send(true).unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_per_interval_until_shutdown() {
        let recorder = Recorder::new(Duration::ZERO);
        let mut engine = SchedulerEngine::new();
        engine
            .add_job("push daily-users", "10 seconds".parse().unwrap(), "daily-users")
            .unwrap();
        let (tx, rx) = watch::channel(false);

        tokio::join!(engine.run(&recorder, rx), shutdown_after(tx, secs(35)));

        let offsets: Vec<_> = recorder.runs().into_iter().map(|r| r.1).collect();
        assert_eq!(offsets, vec![secs(10), secs(20), secs(30)]);
    }

    #[tokio::test(start_paused = true)]
    async fn jobs_fire_in_due_order() {
        let recorder = Recorder::new(Duration::ZERO);
        let mut engine = SchedulerEngine::new();
        engine.add_job("slow", "1 minutes".parse().unwrap(), "slow").unwrap();
        engine.add_job("fast", "20 seconds".parse().unwrap(), "fast").unwrap();
        let (tx, rx) = watch::channel(false);

        tokio::join!(engine.run(&recorder, rx), shutdown_after(tx, secs(70)));

        let fired: Vec<_> = recorder
            .runs()
            .into_iter()
            .map(|(action, at, ..)| (action, at))
            .collect();
        assert_eq!(
            fired,
            vec![
                ("fast".to_string(), secs(20)),
                ("fast".to_string(), secs(40)),
                ("slow".to_string(), secs(60)),
                ("fast".to_string(), secs(60)),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_fires_are_coalesced() {
        let recorder = Recorder::new(secs(25));
        let mut engine = SchedulerEngine::new();
        engine
            .add_job("push", "10 seconds".parse().unwrap(), "daily-users")
            .unwrap();
        let (tx, rx) = watch::channel(false);

        tokio::join!(engine.run(&recorder, rx), shutdown_after(tx, secs(50)));

        // First run occupies 10..35, so 20 and 30 are skipped and the next
        // run lands back on the grid at 40. Shutdown at 50 is seen once that
        // run finishes.
        assert_eq!(
            recorder.runs(),
            vec![
                ("daily-users".to_string(), secs(10), 1, 0),
                ("daily-users".to_string(), secs(40), 2, 2),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_engine_waits_for_shutdown() {
        let recorder = Recorder::new(Duration::ZERO);
        let engine = SchedulerEngine::new();
        let (tx, rx) = watch::channel(false);

        tokio::join!(engine.run(&recorder, rx), shutdown_after(tx, secs(5)));

        assert!(recorder.runs().is_empty());
    }

    #[tokio::test]
    async fn dropped_sender_stops_the_loop() {
        let recorder = Recorder::new(Duration::ZERO);
        let mut engine = SchedulerEngine::new();
        engine.add_job("push", "1 hours".parse().unwrap(), "x").unwrap();
        let (tx, rx) = watch::channel(false);
        drop(tx);

        engine.run(&recorder, rx).await;
        assert!(recorder.runs().is_empty());
    }

    #[test]
    fn add_and_list_jobs() {
        let mut engine = SchedulerEngine::new();
        let a = engine.add_job("a", "5 minutes".parse().unwrap(), "a").unwrap();
        let b = engine.add_job("b", "1 days".parse().unwrap(), "b").unwrap();

        assert_eq!(engine.len(), 2);
        assert_ne!(a.id, b.id);
        assert_eq!(a.run_count, 0);
        assert!(a.next_run.is_some_and(|next| next > a.created_at));

        let names: Vec<_> = engine.list_jobs().into_iter().map(|j| j.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
