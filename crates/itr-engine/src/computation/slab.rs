use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::SlabTable;

/// Portion of taxable income falling in one slab and the tax it attracts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabLine {
    pub from: Decimal,
    pub to: Option<Decimal>,
    pub rate: Decimal,
    pub taxable_portion: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlabComputation {
    pub lines: Vec<SlabLine>,
    pub tax: Decimal,
}

/// Walks the slabs in ascending order, taxing the part of `taxable_income` in each.
/// The result is exact; rounding belongs to the final total.
pub fn compute_slab_tax(taxable_income: Decimal, table: &SlabTable) -> SlabComputation {
    let income = taxable_income.max(Decimal::ZERO);
    let mut lines = Vec::new();
    let mut tax = Decimal::ZERO;

    for slab in table.slabs() {
        if income <= slab.from {
            break;
        }

        let upper = slab.to.map_or(income, |to| to.min(income));
        let taxable_portion = upper - slab.from;
        let slab_tax = taxable_portion * slab.rate;
        tax += slab_tax;
        lines.push(SlabLine {
            from: slab.from,
            to: slab.to,
            rate: slab.rate,
            taxable_portion,
            tax: slab_tax,
        });
    }

    SlabComputation { lines, tax }
}
