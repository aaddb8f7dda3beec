/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};

use g3_metric_daemon::quit::QuitWaiter;
use g3_metric_model::Metric;

use crate::config::AgentConfig;
use crate::stats::{self, RuntimeStats, StatsSource};
use crate::transport::MetricSender;

pub const POLL_COUNT: &str = "PollCount";
pub const RANDOM_VALUE: &str = "RandomValue";

/// The latest sample, written by the poll loop and read by the report loop.
#[derive(Default)]
pub struct SharedSnapshot {
    pub stats: RuntimeStats,
    pub poll_count: i64,
}

pub type SharedStats = Arc<Mutex<SharedSnapshot>>;

async fn poll_loop<T: StatsSource>(
    mut source: T,
    shared: SharedStats,
    interval: Duration,
    mut quit: QuitWaiter,
) {
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = quit.wait() => break,
            _ = timer.tick() => {
                let stats = source.collect();
                let mut snapshot = shared.lock().unwrap();
                snapshot.stats = stats;
                snapshot.poll_count += 1;
            }
        }
    }
    debug!("poll loop stopped");
}

/// Report state carried between ticks.
pub struct Reporter<S> {
    sender: Arc<S>,
    semaphore: Arc<Semaphore>,
    batch: bool,
    excluded: HashSet<String>,
    delivered_polls: i64,
}

impl<S: MetricSender> Reporter<S> {
    pub fn new(sender: Arc<S>, config: &AgentConfig) -> Self {
        Reporter {
            sender,
            semaphore: Arc::new(Semaphore::new(config.rate_limit.get())),
            batch: config.batch,
            excluded: config.excluded_fields.clone(),
            delivered_polls: 0,
        }
    }

    /// Polls counted locally but not yet accepted by the server.
    pub fn pending_polls(&self, poll_count: i64) -> i64 {
        poll_count - self.delivered_polls
    }

    /// Send the current snapshot, returns the number of failed deliveries.
    pub async fn report_once(&mut self, shared: &SharedStats) -> usize {
        let (stats, poll_count) = {
            let snapshot = shared.lock().unwrap();
            (snapshot.stats.clone(), snapshot.poll_count)
        };

        let mut gauges = stats::gauges(&stats, &self.excluded);
        gauges.push((RANDOM_VALUE.to_string(), fastrand::f64()));
        let poll_delta = self.pending_polls(poll_count);

        if self.batch {
            self.report_batch(gauges, poll_count, poll_delta).await
        } else {
            self.report_each(gauges, poll_count, poll_delta).await
        }
    }

    async fn report_batch(
        &mut self,
        gauges: Vec<(String, f64)>,
        poll_count: i64,
        poll_delta: i64,
    ) -> usize {
        // the server applies a batch in order and stops at the first error
        let mut metrics = Vec::with_capacity(gauges.len() + 1);
        metrics.push(Metric::counter(POLL_COUNT, poll_delta));
        metrics.extend(
            gauges
                .into_iter()
                .map(|(name, value)| Metric::gauge(name, value)),
        );

        match self.sender.send_batch(&metrics).await {
            Ok(_) => {
                self.delivered_polls = poll_count;
                0
            }
            Err(e) => {
                warn!("failed to send batch of {} metrics: {e}", metrics.len());
                metrics.len()
            }
        }
    }

    async fn report_each(
        &mut self,
        gauges: Vec<(String, f64)>,
        poll_count: i64,
        poll_delta: i64,
    ) -> usize {
        let mut tasks = JoinSet::new();

        let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
            return gauges.len() + 1;
        };
        let sender = self.sender.clone();
        tasks.spawn(async move {
            let _permit = permit;
            let r = sender.send_counter(POLL_COUNT, poll_delta).await;
            (POLL_COUNT.to_string(), r)
        });

        for (name, value) in gauges {
            let Ok(permit) = self.semaphore.clone().acquire_owned().await else {
                break;
            };
            let sender = self.sender.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let r = sender.send_gauge(&name, value).await;
                (name, r)
            });
        }

        let mut failed = 0;
        while let Some(r) = tasks.join_next().await {
            match r {
                Ok((name, Ok(_))) => {
                    if name == POLL_COUNT {
                        self.delivered_polls = poll_count;
                    }
                }
                Ok((name, Err(e))) => {
                    failed += 1;
                    warn!("failed to send {name}: {e}");
                }
                Err(e) => {
                    failed += 1;
                    warn!("delivery task exited abnormally: {e}");
                }
            }
        }
        failed
    }
}

async fn report_loop<S: MetricSender>(
    mut reporter: Reporter<S>,
    shared: SharedStats,
    interval: Duration,
    mut quit: QuitWaiter,
) {
    let mut timer = tokio::time::interval_at(Instant::now() + interval, interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = quit.wait() => break,
            _ = timer.tick() => {
                let failed = reporter.report_once(&shared).await;
                if failed > 0 {
                    debug!("report finished with {failed} failed deliveries");
                }
            }
        }
    }
    debug!("report loop stopped");
}

/// Run the poll and report loops until quit, returns after both stopped.
pub async fn run<T, S>(config: &AgentConfig, source: T, sender: Arc<S>, quit: QuitWaiter)
where
    T: StatsSource,
    S: MetricSender,
{
    let shared = SharedStats::default();
    let reporter = Reporter::new(sender, config);

    info!(
        "agent started, poll every {:?}, report to {} every {:?}",
        config.poll_interval, config.server, config.report_interval
    );
    tokio::join!(
        poll_loop(source, shared.clone(), config.poll_interval, quit.clone()),
        report_loop(reporter, shared, config.report_interval, quit),
    );
    info!("agent stopped");
}
