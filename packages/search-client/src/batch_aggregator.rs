//! Optional facade: coalesces individually-submitted queries into batches
//! of up to the provider cap (or until a wait window elapses) and issues
//! one `search_batch` call per batch. Useful when many independent
//! call-sites each need one query's worth of results but submission is
//! not naturally batch-shaped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::client::SearchClient;
use crate::error::Result;
use crate::types::SearchRow;

struct Submission {
    query: String,
    num_results: u32,
    reply: oneshot::Sender<Result<Vec<SearchRow>>>,
}

#[derive(Clone)]
pub struct BatchAggregatorHandle {
    tx: mpsc::UnboundedSender<Submission>,
}

impl BatchAggregatorHandle {
    /// Submit one query; resolves once its batch has been issued.
    pub async fn submit(&self, query: impl Into<String>, num_results: u32) -> Result<Vec<SearchRow>> {
        let (reply, rx) = oneshot::channel();
        let submission = Submission {
            query: query.into(),
            num_results,
            reply,
        };
        // The receiver only drops if the aggregator task has stopped, which
        // only happens on process shutdown; losing the submission there is
        // acceptable (mirrors shedding load during shutdown).
        let _ = self.tx.send(submission);
        rx.await.unwrap_or_else(|_| Ok(Vec::new()))
    }
}

/// Spawns the background consumer and returns a cloneable handle to submit
/// queries to it.
pub fn spawn(client: Arc<SearchClient>, max_batch: usize, wait_window: Duration) -> BatchAggregatorHandle {
    let (tx, mut rx) = mpsc::unbounded_channel::<Submission>();

    tokio::spawn(async move {
        loop {
            let Some(first) = rx.recv().await else {
                break;
            };
            let mut batch = vec![first];

            let deadline = tokio::time::sleep(wait_window);
            tokio::pin!(deadline);
            while batch.len() < max_batch {
                tokio::select! {
                    _ = &mut deadline => break,
                    maybe = rx.recv() => {
                        match maybe {
                            Some(s) => batch.push(s),
                            None => break,
                        }
                    }
                }
            }

            // A real deployment would group by `num_results`; submissions
            // sharing it batch together, others fall back to per-query.
            let num_results = batch[0].num_results;
            let (uniform, rest): (Vec<_>, Vec<_>) =
                batch.into_iter().partition(|s| s.num_results == num_results);

            let queries: Vec<String> = uniform.iter().map(|s| s.query.clone()).collect();
            match client.search_batch(&queries, num_results).await {
                Ok(outcome) => {
                    for (submission, rows) in uniform.into_iter().zip(outcome.rows_per_query.into_iter()) {
                        let _ = submission.reply.send(Ok(rows));
                    }
                }
                Err(e) => {
                    for submission in uniform {
                        let _ = submission.reply.send(Err(e));
                    }
                }
            }

            for submission in rest {
                match client.search(&submission.query, submission.num_results).await {
                    Ok(outcome) => {
                        let _ = submission.reply.send(Ok(outcome.rows));
                    }
                    Err(e) => {
                        let _ = submission.reply.send(Err(e));
                    }
                }
            }
        }
    });

    BatchAggregatorHandle { tx }
}
