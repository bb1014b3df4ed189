// ==========================================
// 电商采购单解析引擎 - 合计与行号校验
// ==========================================
// 行号: 重复 → 重编为 max+1；缺号 → 按区间告警
// 合计: 明细汇总优先写入表头；与表格声明不一致时告警（不改数据）
// 溢出: 汇总溢出时改用表格声明值并告警
// 容差: 数量精确比较；金额取 min(绝对容差, 相对容差 × |声明值|)
// ==========================================

use crate::domain::purchase_order::POLine;
use crate::importer::error::{LineGap, ParseWarning};
use crate::importer::po_parser_trait::{ComputedTotals, DeclaredTotals, TotalsReconciler};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashSet};
use tracing::warn;

pub struct Reconciler {
    abs_tolerance: Decimal,
    pct_tolerance: Decimal,
}

impl Reconciler {
    pub fn new(abs_tolerance: Decimal, pct_tolerance: Decimal) -> Self {
        Self {
            abs_tolerance,
            pct_tolerance,
        }
    }

    /// 差值无法表示时视为超出容差
    fn within_tolerance(&self, declared: Decimal, computed: Decimal) -> bool {
        let tolerance = match self.pct_tolerance.checked_mul(declared.abs()) {
            Some(relative) => self.abs_tolerance.min(relative),
            None => self.abs_tolerance,
        };
        match declared.checked_sub(computed) {
            Some(diff) => diff.abs() <= tolerance,
            None => false,
        }
    }

    fn check_money(
        &self,
        metric: &str,
        declared: Option<Decimal>,
        computed: Option<Decimal>,
        warnings: &mut Vec<ParseWarning>,
    ) {
        if let (Some(d), Some(c)) = (declared, computed) {
            if !self.within_tolerance(d, c) {
                warn!(metric, declared = %d, computed = %c, "金额合计不一致");
                warnings.push(ParseWarning::TotalsMismatch {
                    metric: metric.to_string(),
                    declared: d.normalize().to_string(),
                    computed: c.normalize().to_string(),
                });
            }
        }
    }
}

impl TotalsReconciler for Reconciler {
    fn check_line_numbers(&self, lines: &mut [POLine]) -> Vec<ParseWarning> {
        let mut warnings = Vec::new();
        let mut next_free = lines.iter().map(|l| l.line_number).max().unwrap_or(0);
        let mut seen = HashSet::new();

        for line in lines.iter_mut() {
            if !seen.insert(line.line_number) {
                // max 已到 u32 上限时取最小的空闲行号
                let renumbered = match next_free.checked_add(1) {
                    Some(n) => {
                        next_free = n;
                        n
                    }
                    None => (1..=u32::MAX).find(|n| !seen.contains(n)).unwrap_or(u32::MAX),
                };
                warnings.push(ParseWarning::LineNumberDuplicate {
                    line_number: line.line_number,
                    renumbered_to: renumbered,
                });
                line.line_number = renumbered;
                seen.insert(renumbered);
            }
        }

        let numbers: BTreeSet<u32> = lines.iter().map(|l| l.line_number).collect();
        let missing = gaps(&numbers);
        if !missing.is_empty() {
            warn!(ranges = missing.len(), "行号不连续");
            warnings.push(ParseWarning::LineNumberGap { missing });
        }
        warnings
    }

    fn reconcile_totals(
        &self,
        declared: &DeclaredTotals,
        lines: &[POLine],
    ) -> (ComputedTotals, Vec<ParseWarning>) {
        let mut warnings = Vec::new();
        let computed = ComputedTotals {
            quantity: sum_present(
                "total_quantity",
                lines.iter().map(|l| l.quantity),
                &mut warnings,
            ),
            taxable_value: sum_present(
                "total_taxable_value",
                lines.iter().map(|l| l.taxable_value),
                &mut warnings,
            ),
            tax_amount: sum_present(
                "total_tax_amount",
                lines.iter().map(POLine::effective_tax_amount),
                &mut warnings,
            ),
            amount: sum_present(
                "total_amount",
                lines.iter().map(|l| l.line_total),
                &mut warnings,
            ),
        };

        if let (Some(d), Some(c)) = (declared.quantity, computed.quantity) {
            if d != c {
                warn!(declared = d, computed = c, "数量合计不一致");
                warnings.push(ParseWarning::TotalsMismatch {
                    metric: "total_quantity".into(),
                    declared: d.to_string(),
                    computed: c.to_string(),
                });
            }
        }
        self.check_money(
            "total_taxable_value",
            declared.taxable_value,
            computed.taxable_value,
            &mut warnings,
        );
        self.check_money(
            "total_tax_amount",
            declared.tax_amount,
            computed.tax_amount,
            &mut warnings,
        );
        self.check_money("total_amount", declared.amount, computed.amount, &mut warnings);

        let totals = ComputedTotals {
            quantity: computed.quantity.or(declared.quantity),
            taxable_value: computed.taxable_value.or(declared.taxable_value),
            tax_amount: computed.tax_amount.or(declared.tax_amount),
            amount: computed.amount.or(declared.amount),
        };
        (totals, warnings)
    }
}

/// 按升序行号求缺号区间，区间个数不超过行数 + 1
fn gaps(numbers: &BTreeSet<u32>) -> Vec<LineGap> {
    let mut missing = Vec::new();
    let mut prev = 0u32;
    for &n in numbers {
        if n > prev.saturating_add(1) {
            missing.push(LineGap::new(prev + 1, n - 1));
        }
        prev = n;
    }
    missing
}

/// 可检查溢出的加法
trait CheckedTotal: Copy {
    fn checked_total(self, rhs: Self) -> Option<Self>;
}

impl CheckedTotal for i64 {
    fn checked_total(self, rhs: Self) -> Option<Self> {
        self.checked_add(rhs)
    }
}

impl CheckedTotal for Decimal {
    fn checked_total(self, rhs: Self) -> Option<Self> {
        self.checked_add(rhs)
    }
}

/// 没有任何行给出值时返回 None；溢出时告警并返回 None
fn sum_present<T, I>(metric: &str, values: I, warnings: &mut Vec<ParseWarning>) -> Option<T>
where
    T: CheckedTotal,
    I: Iterator<Item = Option<T>>,
{
    let mut total: Option<T> = None;
    for value in values.flatten() {
        total = match total {
            None => Some(value),
            Some(acc) => match acc.checked_total(value) {
                Some(sum) => Some(sum),
                None => {
                    warn!(metric, "明细汇总溢出");
                    warnings.push(ParseWarning::TotalsOverflow {
                        metric: metric.to_string(),
                    });
                    return None;
                }
            },
        };
    }
    total
}
