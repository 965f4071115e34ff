use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    joins: AtomicU64,
    check_ins: AtomicU64,
    check_outs: AtomicU64,
    leaves: AtomicU64,
    ledger_entries: AtomicU64,
    conflicts: AtomicU64,
    backend_failures: AtomicU64,
}

impl Metrics {
    pub fn record_join(&self) {
        self.joins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_check_in(&self) {
        self.check_ins.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_check_out(&self) {
        self.check_outs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_leave(&self) {
        self.leaves.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ledger_entry(&self) {
        self.ledger_entries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_backend_failure(&self) {
        self.backend_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ledger_entries(&self) -> u64 {
        self.ledger_entries.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let joins = self.joins.load(Ordering::Relaxed);
        let check_ins = self.check_ins.load(Ordering::Relaxed);
        let check_outs = self.check_outs.load(Ordering::Relaxed);
        let leaves = self.leaves.load(Ordering::Relaxed);
        let entries = self.ledger_entries.load(Ordering::Relaxed);
        let conflicts = self.conflicts.load(Ordering::Relaxed);
        let failures = self.backend_failures.load(Ordering::Relaxed);

        format!(
            "# TYPE volunteer_joins_total counter\n\
volunteer_joins_total {}\n\
# TYPE volunteer_check_ins_total counter\n\
volunteer_check_ins_total {}\n\
# TYPE volunteer_check_outs_total counter\n\
volunteer_check_outs_total {}\n\
# TYPE volunteer_leaves_total counter\n\
volunteer_leaves_total {}\n\
# TYPE volunteer_ledger_entries_total counter\n\
volunteer_ledger_entries_total {}\n\
# TYPE volunteer_conflicts_total counter\n\
volunteer_conflicts_total {}\n\
# TYPE volunteer_backend_failures_total counter\n\
volunteer_backend_failures_total {}\n",
            joins, check_ins, check_outs, leaves, entries, conflicts, failures
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_every_counter() {
        let metrics = Metrics::default();
        metrics.record_join();
        metrics.record_check_in();
        metrics.record_ledger_entry();
        metrics.record_ledger_entry();
        let text = metrics.render_prometheus();
        assert!(text.contains("volunteer_joins_total 1\n"));
        assert!(text.contains("volunteer_ledger_entries_total 2\n"));
        assert!(text.contains("volunteer_backend_failures_total 0\n"));
    }
}
