use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;

use super::{CatalogError, RuleCatalog};

/// Holds the live [`RuleCatalog`] behind a pointer swap.
///
/// The lock guards only the `Arc` itself and is never held while rules are
/// evaluated: readers clone the pointer and release. A reload builds the new
/// catalog completely before taking the write lock, so no reader can observe a
/// partially-loaded table.
#[derive(Debug)]
pub struct RuleRegistry {
    current: RwLock<Arc<RuleCatalog>>,
}

impl RuleRegistry {
    pub fn new(catalog: RuleCatalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The catalog in force right now. Stays valid after a later reload.
    pub fn snapshot(&self) -> Arc<RuleCatalog> {
        Arc::clone(&self.current.read())
    }

    /// Swaps in `catalog` and returns the one it replaced.
    pub fn replace(&self, catalog: RuleCatalog) -> Arc<RuleCatalog> {
        let next = Arc::new(catalog);
        let years: Vec<String> = next.assessment_years().map(|y| y.to_string()).collect();
        let rule_sets: Vec<&str> = next.validation_rule_set_ids().collect();
        tracing::info!(
            assessment_years = %years.join(","),
            validation_rule_sets = %rule_sets.join(","),
            "rule catalog replaced"
        );

        let mut guard = self.current.write();
        std::mem::replace(&mut *guard, next)
    }

    /// Loads `dir` and swaps it in. On failure the current catalog stays in place.
    pub fn reload_from(&self, dir: &Path) -> Result<Arc<RuleCatalog>, CatalogError> {
        match RuleCatalog::load_dir(dir) {
            Ok(catalog) => Ok(self.replace(catalog)),
            Err(err) => {
                tracing::warn!(path = %dir.display(), error = %err, "rule reload rejected");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{rule_set_2025_26, AssessmentYear};
    use rust_decimal_macros::dec;
    use std::thread;

    fn registry() -> RuleRegistry {
        RuleRegistry::new(RuleCatalog::builtin().expect("built-in tables are valid"))
    }

    #[test]
    fn snapshots_outlive_a_replacement() {
        let registry = registry();
        let before = registry.snapshot();

        let mut catalog = RuleCatalog::builtin().expect("built-in tables are valid");
        let mut changed = rule_set_2025_26();
        changed.cess_rate = dec!(0.05);
        catalog.insert_tax_rules(changed).expect("valid table");
        let replaced = registry.replace(catalog);

        let year = AssessmentYear::new(2025);
        assert!(Arc::ptr_eq(&before, &replaced));
        assert_eq!(before.tax_rules(year).expect("loaded").cess_rate, dec!(0.04));
        assert_eq!(
            registry.snapshot().tax_rules(year).expect("loaded").cess_rate,
            dec!(0.05)
        );
    }

    #[test]
    fn failed_reload_keeps_the_current_catalog() {
        let registry = registry();
        let before = registry.snapshot();
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("tax-rules-2025-26.json"), "[]").expect("fixture");

        assert!(registry.reload_from(dir.path()).is_err());
        assert!(Arc::ptr_eq(&before, &registry.snapshot()));
    }

    #[test]
    fn readers_always_see_a_whole_catalog() {
        let registry = Arc::new(registry());
        let year = AssessmentYear::new(2025);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = registry.snapshot();
                        let rules = snapshot.tax_rules(year).expect("year always present");
                        assert!(rules.cess_rate == dec!(0.04) || rules.cess_rate == dec!(0.05));
                    }
                })
            })
            .collect();

        for round in 0..50 {
            let mut catalog = RuleCatalog::builtin().expect("built-in tables are valid");
            let mut changed = rule_set_2025_26();
            changed.cess_rate = if round % 2 == 0 { dec!(0.05) } else { dec!(0.04) };
            catalog.insert_tax_rules(changed).expect("valid table");
            registry.replace(catalog);
        }

        for reader in readers {
            reader.join().expect("reader thread");
        }
    }
}
