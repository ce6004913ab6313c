//! Union bounds of the selection, tolerant of nodes that have not mounted yet.

use crate::scene::{LayerId, NodeRegistry};
use crate::types::Bounds;
use crate::utils::union_bounds;
use serde::Deserialize;
use std::task::Poll;
use thiserror::Error;

/// What to publish when the selected nodes never mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountTimeoutPolicy {
    /// Publish `None`
    #[default]
    Clear,
    /// Leave the previous bounds in place instead of flashing `None`
    KeepPrevious,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{} node(s) still unmounted after {attempts} attempts", missing.len())]
pub struct MountTimeout {
    pub missing: Vec<LayerId>,
    pub attempts: u32,
}

/// Bounded wait for a set of ids to be present in the registry.
///
/// The first `poll` is the initial attempt; each further poll consumes one
/// retry. Once the budget is spent the wait resolves to `MountTimeout`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountWait {
    ids: Vec<LayerId>,
    budget: u32,
    retries_left: u32,
}

impl MountWait {
    pub fn new(ids: &[LayerId], budget: u32) -> Self {
        Self {
            ids: ids.to_vec(),
            budget,
            retries_left: budget,
        }
    }

    /// Resolve every id to its node's stage rect. Degenerate rects are dropped.
    pub fn poll<R: NodeRegistry>(&mut self, nodes: &R) -> Poll<Result<Vec<Bounds>, MountTimeout>> {
        let missing: Vec<LayerId> = self.ids.iter().copied().filter(|&id| !nodes.has(id)).collect();
        if missing.is_empty() {
            let rects = self
                .ids
                .iter()
                .filter_map(|&id| nodes.get(id))
                .filter_map(|node| node.client_rect())
                .collect();
            return Poll::Ready(Ok(rects));
        }
        if self.retries_left == 0 {
            return Poll::Ready(Err(MountTimeout {
                missing,
                attempts: self.budget + 1,
            }));
        }
        self.retries_left -= 1;
        Poll::Pending
    }
}

/// Result of one resolver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// New bounds were published
    Changed,
    /// Computation finished with the same bounds as before
    Unchanged,
    /// Some nodes are missing; poll again next frame
    Pending,
}

pub struct BoundsResolver {
    published: Option<Bounds>,
    wait: Option<MountWait>,
    budget: u32,
    policy: MountTimeoutPolicy,
}

impl BoundsResolver {
    pub fn new(budget: u32, policy: MountTimeoutPolicy) -> Self {
        Self {
            published: None,
            wait: None,
            budget,
            policy,
        }
    }

    pub fn published(&self) -> Option<Bounds> {
        self.published
    }

    pub fn is_waiting(&self) -> bool {
        self.wait.is_some()
    }

    /// Start a fresh computation for `ids`, replacing any wait in progress
    pub fn resolve<R: NodeRegistry>(&mut self, ids: &[LayerId], select_active: bool, nodes: &mut R) -> Resolution {
        if !select_active || ids.is_empty() {
            self.wait = None;
            return self.publish(None, nodes);
        }
        self.wait = Some(MountWait::new(ids, self.budget));
        self.retry(nodes)
    }

    /// Poll the pending wait again. A no-op when nothing is pending.
    pub fn retry<R: NodeRegistry>(&mut self, nodes: &mut R) -> Resolution {
        let Some(wait) = self.wait.as_mut() else {
            return Resolution::Unchanged;
        };
        match wait.poll(&*nodes) {
            Poll::Pending => Resolution::Pending,
            Poll::Ready(Ok(rects)) => {
                self.wait = None;
                self.publish(union_bounds(rects), nodes)
            }
            Poll::Ready(Err(timeout)) => {
                self.wait = None;
                log::debug!("bounds: {timeout}, missing {:?}", timeout.missing);
                match self.policy {
                    MountTimeoutPolicy::Clear => self.publish(None, nodes),
                    MountTimeoutPolicy::KeepPrevious => Resolution::Unchanged,
                }
            }
        }
    }

    fn publish<R: NodeRegistry>(&mut self, bounds: Option<Bounds>, nodes: &mut R) -> Resolution {
        if self.published == bounds {
            return Resolution::Unchanged;
        }
        self.published = bounds;
        nodes.request_redraw();
        Resolution::Changed
    }
}
