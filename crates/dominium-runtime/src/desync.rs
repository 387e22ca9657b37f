// SPDX-License-Identifier: Apache-2.0
//! Desync detection (`SPEC_FULL.md` §4.8C, grounded on spec.md §7's
//! "Network driver writes a `desync_bundle_<tick>.tlv` the first time a
//! peer reports a hash diverging from the local hash at the same tick").
//!
//! This module only detects and packages the divergence; writing it to
//! disk is a concrete consumer's job (`dominium-cli`'s `replay`
//! subcommand), not this crate's.

use std::collections::VecDeque;

use dominium_kernel::Tick;

use crate::command::Command;

/// A first-divergence report: the tick it happened at, both hashes, and a
/// trailing window of recently-dispatched commands for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesyncBundle {
    /// The tick at which `local_hash` and `peer_hash` first diverged.
    pub tick: Tick,
    /// This runtime's world hash at `tick`.
    pub local_hash: u64,
    /// The peer's reported world hash at `tick`.
    pub peer_hash: u64,
    /// Up to the configured window of commands dispatched immediately
    /// before the divergence, oldest first.
    pub recent_commands: Vec<Command>,
}

/// Tracks a rolling window of recently-dispatched commands and latches the
/// first tick at which a peer-reported hash diverges from the local one.
/// One `DesyncDetector` reports at most once: the network driver already
/// has everything it needs after the first bundle.
#[derive(Debug, Clone)]
pub struct DesyncDetector {
    window: usize,
    recent: VecDeque<Command>,
    reported_tick: Option<Tick>,
}

impl DesyncDetector {
    /// Builds a detector keeping the last `window` dispatched commands.
    #[must_use]
    pub fn new(window: usize) -> Self {
        Self {
            window,
            recent: VecDeque::with_capacity(window),
            reported_tick: None,
        }
    }

    /// Records that `command` was dispatched, for inclusion in a future
    /// bundle. Evicts the oldest entry once the window is full.
    pub fn record_dispatched(&mut self, command: Command) {
        if self.recent.len() >= self.window {
            self.recent.pop_front();
        }
        self.recent.push_back(command);
    }

    /// Compares `local_hash` against a peer's reported `peer_hash` at
    /// `tick`. Returns `Some(bundle)` the first time they differ across
    /// this detector's lifetime; `None` otherwise, including on every
    /// subsequent divergent tick once one has already been reported.
    pub fn observe(&mut self, tick: Tick, local_hash: u64, peer_hash: u64) -> Option<DesyncBundle> {
        if local_hash == peer_hash || self.reported_tick.is_some() {
            return None;
        }
        self.reported_tick = Some(tick);
        Some(DesyncBundle {
            tick,
            local_hash,
            peer_hash,
            recent_commands: self.recent.iter().cloned().collect(),
        })
    }

    /// `true` once a divergence has been reported.
    #[must_use]
    pub const fn has_reported(&self) -> bool {
        self.reported_tick.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(sequence: u64) -> Command {
        Command {
            scheduled_tick: 0,
            schema_id: 1,
            schema_version: 1,
            payload: Vec::new(),
            source_peer: 0,
            sequence,
        }
    }

    #[test]
    fn matching_hashes_never_report() {
        let mut detector = DesyncDetector::new(4);
        assert_eq!(detector.observe(1, 42, 42), None);
        assert!(!detector.has_reported());
    }

    #[test]
    fn first_divergence_reports_once() {
        let mut detector = DesyncDetector::new(4);
        detector.record_dispatched(command(1));
        detector.record_dispatched(command(2));
        let bundle = detector.observe(5, 111, 222).expect("first divergence reports");
        assert_eq!(bundle.tick, 5);
        assert_eq!(bundle.recent_commands.len(), 2);

        assert_eq!(detector.observe(6, 333, 444), None, "latched after first report");
    }

    #[test]
    fn window_evicts_oldest_command() {
        let mut detector = DesyncDetector::new(2);
        detector.record_dispatched(command(1));
        detector.record_dispatched(command(2));
        detector.record_dispatched(command(3));
        let bundle = detector.observe(1, 1, 2).expect("divergence");
        let sequences: Vec<u64> = bundle.recent_commands.iter().map(|c| c.sequence).collect();
        assert_eq!(sequences, vec![2, 3]);
    }
}
