//! Result collector
//!
//! Drains the fan-in channel in completion order. The collector knows how
//! many outcomes to expect up front and finishes as soon as every dispatched
//! node has reported, never waiting on a node that already failed.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::outcome::{DispatchOutcome, OutcomeKind, STATUS_DEADLINE, STATUS_FAILED};
use crate::nodes::NodeDescriptor;

/// A launched node call the collector is waiting on
#[derive(Debug)]
pub(crate) struct PendingNode {
    pub node: NodeDescriptor,
    pub handle: JoinHandle<()>,
}

/// Outcomes of one fan-out, in the order nodes finish
#[derive(Debug)]
pub struct OutcomeStream {
    receiver: mpsc::Receiver<(usize, DispatchOutcome)>,
    pending: Vec<PendingNode>,
    reported: Vec<bool>,
    received: usize,
}

impl OutcomeStream {
    pub(crate) fn new(
        receiver: mpsc::Receiver<(usize, DispatchOutcome)>,
        pending: Vec<PendingNode>,
    ) -> Self {
        let reported = vec![false; pending.len()];
        Self {
            receiver,
            pending,
            reported,
            received: 0,
        }
    }

    /// Number of outcomes this stream will produce (one per enabled node)
    #[must_use]
    pub fn expected(&self) -> usize {
        self.pending.len()
    }

    /// Wait for the next node to finish
    ///
    /// Returns `None` once every node has reported, or if the remaining
    /// tasks ended without reporting.
    pub async fn next(&mut self) -> Option<DispatchOutcome> {
        if self.received == self.expected() {
            return None;
        }
        let (index, outcome) = self.receiver.recv().await?;
        self.record(index);
        Some(outcome)
    }

    /// Collect every outcome
    ///
    /// With `deadline` set, nodes still running when it elapses are aborted
    /// and reported as [`OutcomeKind::Deadline`]. Either way the result holds
    /// exactly one outcome per dispatched node.
    pub async fn collect(mut self, deadline: Option<Duration>) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::with_capacity(self.expected());

        let drained = match deadline {
            Some(limit) => tokio::time::timeout(limit, self.drain(&mut outcomes))
                .await
                .is_ok(),
            None => {
                self.drain(&mut outcomes).await;
                true
            }
        };

        // Outcomes that raced the deadline are still valid
        while let Ok((index, outcome)) = self.receiver.try_recv() {
            self.record(index);
            outcomes.push(outcome);
        }

        for (pending, reported) in self.pending.iter().zip(&self.reported) {
            if *reported {
                continue;
            }
            pending.handle.abort();

            let outcome = if drained {
                tracing::error!(url = %pending.node.url, "node task ended without reporting");
                DispatchOutcome::failed(
                    &pending.node,
                    STATUS_FAILED,
                    OutcomeKind::Transport,
                    "Error: node call aborted unexpectedly".to_string(),
                )
            } else {
                tracing::warn!(url = %pending.node.url, "request deadline exceeded, node call cancelled");
                DispatchOutcome::failed(
                    &pending.node,
                    STATUS_DEADLINE,
                    OutcomeKind::Deadline,
                    "Error: request deadline exceeded".to_string(),
                )
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn drain(&mut self, outcomes: &mut Vec<DispatchOutcome>) {
        while let Some(outcome) = self.next().await {
            outcomes.push(outcome);
        }
    }

    fn record(&mut self, index: usize) {
        if let Some(reported) = self.reported.get_mut(index) {
            *reported = true;
            self.received += 1;
        }
    }
}

impl Drop for OutcomeStream {
    /// A stream dropped before completion stops its node calls
    fn drop(&mut self) {
        for pending in &self.pending {
            pending.handle.abort();
        }
    }
}

/// Join payloads with newlines in the given (completion) order and trim
#[must_use]
pub fn merge_text(outcomes: &[DispatchOutcome]) -> String {
    outcomes
        .iter()
        .map(|o| o.payload.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(url: &str) -> NodeDescriptor {
        NodeDescriptor::new(url, Duration::from_secs(1))
    }

    fn outcome(url: &str, payload: &str) -> DispatchOutcome {
        DispatchOutcome::ok(&node(url), "200 OK", payload.to_string())
    }

    /// Build a stream whose tasks are driven by the test instead of HTTP
    fn manual_stream(
        urls: &[&str],
    ) -> (OutcomeStream, mpsc::Sender<(usize, DispatchOutcome)>) {
        let (tx, rx) = mpsc::channel(urls.len().max(1));
        let pending = urls
            .iter()
            .map(|url| PendingNode {
                node: node(url),
                handle: tokio::spawn(std::future::pending::<()>()),
            })
            .collect();
        (OutcomeStream::new(rx, pending), tx)
    }

    #[test]
    fn merge_text_joins_and_trims() {
        let outcomes = vec![outcome("a", "first"), outcome("b", "second\n"), outcome("c", "")];
        assert_eq!(merge_text(&outcomes), "first\nsecond");
    }

    #[test]
    fn merge_text_empty() {
        assert_eq!(merge_text(&[]), "");
    }

    #[tokio::test]
    async fn collects_in_completion_order() {
        let (stream, tx) = manual_stream(&["a", "b", "c"]);
        tx.send((2, outcome("c", "3"))).await.unwrap();
        tx.send((0, outcome("a", "1"))).await.unwrap();
        tx.send((1, outcome("b", "2"))).await.unwrap();

        let outcomes = stream.collect(None).await;
        let payloads: Vec<_> = outcomes.iter().map(|o| o.payload.as_str()).collect();
        assert_eq!(payloads, ["3", "1", "2"]);
    }

    #[tokio::test]
    async fn finishes_once_all_expected_arrive() {
        let (stream, tx) = manual_stream(&["a", "b"]);
        tx.send((1, outcome("b", "2"))).await.unwrap();
        tx.send((0, outcome("a", "1"))).await.unwrap();

        // Sender still alive: termination comes from the count, not channel close
        let outcomes = tokio::time::timeout(Duration::from_secs(1), stream.collect(None))
            .await
            .expect("collector should not wait for channel close");
        assert_eq!(outcomes.len(), 2);
        drop(tx);
    }

    #[tokio::test]
    async fn deadline_fills_in_missing_nodes() {
        let (stream, tx) = manual_stream(&["a", "b"]);
        tx.send((0, outcome("a", "1"))).await.unwrap();

        let outcomes = stream.collect(Some(Duration::from_millis(50))).await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes[0].is_ok());
        assert_eq!(outcomes[1].node_url, "b");
        assert_eq!(outcomes[1].kind, OutcomeKind::Deadline);
        assert_eq!(outcomes[1].status, STATUS_DEADLINE);
        drop(tx);
    }

    #[tokio::test]
    async fn lost_task_still_yields_outcome() {
        let (stream, tx) = manual_stream(&["a", "b"]);
        tx.send((1, outcome("b", "2"))).await.unwrap();
        drop(tx);

        let outcomes = stream.collect(None).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[1].node_url, "a");
        assert_eq!(outcomes[1].status, STATUS_FAILED);
    }

    #[tokio::test]
    async fn dropping_stream_aborts_running_calls() {
        let (_tx, rx) = mpsc::channel(1);
        let (held, released) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let _held = held;
            std::future::pending::<()>().await;
        });
        let stream = OutcomeStream::new(rx, vec![PendingNode { node: node("a"), handle }]);

        drop(stream);

        // The task owned the sender, so aborting it closes the channel
        let result = tokio::time::timeout(Duration::from_secs(1), released)
            .await
            .expect("node task should be aborted when the stream is dropped");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn next_yields_as_they_arrive() {
        let (mut stream, tx) = manual_stream(&["a", "b"]);
        tx.send((1, outcome("b", "2"))).await.unwrap();

        let first = stream.next().await.unwrap();
        assert_eq!(first.node_url, "b");

        tx.send((0, outcome("a", "1"))).await.unwrap();
        assert_eq!(stream.next().await.unwrap().node_url, "a");
        assert!(stream.next().await.is_none());
    }
}
