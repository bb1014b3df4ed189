// ==========================================
// 电商采购单解析引擎 - 锚点字段提取器
// ==========================================
// 契约: find(worksheet, anchor) → Some(命中) | None
// 策略: 固定偏移 / 右侧首个非空 / 第二标签之后 / 末次匹配 / 同单元格 / 下方
// 标签缺失不是错误；是否告警由调用方按 required 决定
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::vendor_profile::{AnchorStrategy, FieldAnchor, LabelMatch};
use crate::domain::worksheet::{CellValue, RawWorksheet};
use regex::Regex;
use tracing::trace;

/// 偏移 / 查找距离上限（行或列）
pub const MAX_ANCHOR_DISTANCE: usize = 64;

/// 锚点命中结果（行列为标签所在位置，0 起）
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorHit {
    pub row: usize,
    pub col: usize,
    pub value: CellValue,
}

/// 预编译的锚点（注册时编译一次，解析期间只读）
#[derive(Debug, Clone)]
pub struct CompiledAnchor {
    anchor: FieldAnchor,
    label: Regex,
    marker: Option<Regex>,
    pattern: Option<Regex>,
}

impl CompiledAnchor {
    pub fn compile(profile_id: &str, anchor: &FieldAnchor) -> ConfigResult<Self> {
        if anchor.label.trim().is_empty() {
            return Err(ConfigError::invalid_profile(profile_id, "锚点标签为空"));
        }

        let distance = match &anchor.strategy {
            AnchorStrategy::Offset { columns } | AnchorStrategy::LastMatch { columns } => *columns,
            AnchorStrategy::NextNonEmpty { max_distance } => *max_distance,
            AnchorStrategy::Below { rows } => *rows,
            AnchorStrategy::AfterSecondLabel { .. } | AnchorStrategy::Inline { .. } => 0,
        };
        if distance > MAX_ANCHOR_DISTANCE {
            return Err(ConfigError::invalid_profile(
                profile_id,
                format!(
                    "锚点 {} 的距离 {} 超过上限 {}",
                    anchor.label, distance, MAX_ANCHOR_DISTANCE
                ),
            ));
        }

        let label = label_regex(profile_id, &anchor.label, anchor.label_match)?;
        let marker = match &anchor.strategy {
            AnchorStrategy::AfterSecondLabel { marker } => {
                if marker.trim().is_empty() {
                    return Err(ConfigError::invalid_profile(profile_id, "第二标签为空"));
                }
                Some(label_regex(profile_id, marker, LabelMatch::Exact)?)
            }
            _ => None,
        };
        let pattern = anchor
            .pattern
            .as_deref()
            .map(|p| compile_regex(profile_id, p))
            .transpose()?;

        Ok(Self {
            anchor: anchor.clone(),
            label,
            marker,
            pattern,
        })
    }

    pub fn anchor(&self) -> &FieldAnchor {
        &self.anchor
    }
}

/// 标签正则：忽略大小写，标签内连续空白宽松匹配，忽略末尾冒号
pub fn label_regex(profile_id: &str, label: &str, mode: LabelMatch) -> ConfigResult<Regex> {
    let core = label
        .trim()
        .trim_end_matches(':')
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    let pattern = match mode {
        LabelMatch::Exact => format!(r"(?i)^\s*{}\s*:?\s*$", core),
        LabelMatch::Prefix => format!(r"(?i)^\s*{}", core),
        LabelMatch::Contains => format!(r"(?i){}", core),
    };
    compile_regex(profile_id, &pattern)
}

pub fn compile_regex(profile_id: &str, pattern: &str) -> ConfigResult<Regex> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
        profile: profile_id.to_string(),
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

// ==========================================
// AnchorExtractor
// ==========================================
pub struct AnchorExtractor;

impl AnchorExtractor {
    /// 在行范围内按行优先查找标签，返回第一个取到非空值的命中
    pub fn find(&self, ws: &RawWorksheet, anchor: &CompiledAnchor) -> Option<AnchorHit> {
        let scope = anchor.anchor.row_scope.bounded(ws.row_count());

        for row in scope {
            let label_cols = self.label_columns(ws, row, anchor);
            if label_cols.is_empty() {
                continue;
            }

            // 末次匹配只看该行最后一个标签
            let candidates: Vec<usize> = match anchor.anchor.strategy {
                AnchorStrategy::LastMatch { .. } => label_cols.last().copied().into_iter().collect(),
                _ => label_cols,
            };

            for col in candidates {
                let value = self
                    .read_value(ws, row, col, anchor)
                    .and_then(|v| apply_pattern(v, anchor.pattern.as_ref()));
                if let Some(value) = value {
                    trace!(label = %anchor.anchor.label, row, col, value = %value, "锚点命中");
                    return Some(AnchorHit { row, col, value });
                }
            }
        }
        None
    }

    fn label_columns(&self, ws: &RawWorksheet, row: usize, anchor: &CompiledAnchor) -> Vec<usize> {
        let cells = ws.row(row);
        let matches = |col: usize| {
            let text = ws.text(row, col);
            !text.is_empty() && anchor.label.is_match(&text)
        };
        match anchor.anchor.label_column {
            Some(col) => {
                if matches(col) {
                    vec![col]
                } else {
                    Vec::new()
                }
            }
            None => (0..cells.len()).filter(|&c| matches(c)).collect(),
        }
    }

    fn read_value(
        &self,
        ws: &RawWorksheet,
        row: usize,
        col: usize,
        anchor: &CompiledAnchor,
    ) -> Option<CellValue> {
        let value = match &anchor.anchor.strategy {
            AnchorStrategy::Offset { columns } | AnchorStrategy::LastMatch { columns } => {
                ws.cell(row, col.saturating_add(*columns)).clone()
            }
            AnchorStrategy::NextNonEmpty { max_distance } => (col.saturating_add(1)..ws.row(row).len())
                .take(*max_distance)
                .map(|c| ws.cell(row, c))
                .find(|c| !c.is_empty())
                .cloned()
                .unwrap_or(CellValue::Empty),
            AnchorStrategy::AfterSecondLabel { .. } => {
                let marker = anchor.marker.as_ref()?;
                let marker_col = (col + 1..ws.row(row).len())
                    .find(|&c| marker.is_match(&ws.text(row, c)))?;
                ws.cell(row, marker_col + 1).clone()
            }
            AnchorStrategy::Inline { stop_at } => {
                let text = match ws.cell(row, col) {
                    CellValue::Text(s) => s.clone(),
                    other => other.as_text(),
                };
                let end = anchor.label.find(&text)?.end();
                CellValue::from(inline_remainder(&text[end..], stop_at).as_str())
            }
            AnchorStrategy::Below { rows } => ws.cell(row.saturating_add(*rows), col).clone(),
        };

        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

/// 去掉前导分隔符，遇到截断字符停止
fn inline_remainder(rest: &str, stop_at: &[char]) -> String {
    let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | ',' | '|' | '='));
    let cut = match trimmed.find(|c: char| stop_at.contains(&c)) {
        Some(idx) => &trimmed[..idx],
        None => trimmed,
    };
    cut.trim().to_string()
}

/// 有分组取第 1 组，否则取整个匹配；不匹配视为未取到
fn apply_pattern(value: CellValue, pattern: Option<&Regex>) -> Option<CellValue> {
    let Some(re) = pattern else {
        return Some(value);
    };
    let text = match &value {
        CellValue::Text(s) => s.clone(),
        other => other.as_text(),
    };
    let caps = re.captures(&text)?;
    let matched = caps.get(1).or_else(|| caps.get(0))?.as_str().trim();
    if matched.is_empty() {
        None
    } else {
        Some(CellValue::Text(matched.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vendor_profile::RowScope;

    fn sheet(rows: Vec<Vec<&str>>) -> RawWorksheet {
        RawWorksheet::from_text_rows("t", rows)
    }

    fn find(ws: &RawWorksheet, anchor: FieldAnchor) -> Option<String> {
        let compiled = CompiledAnchor::compile("test", &anchor).unwrap();
        AnchorExtractor.find(ws, &compiled).map(|h| h.value.as_text())
    }

    #[test]
    fn test_offset() {
        let ws = sheet(vec![vec![], vec!["", "", ""], vec!["PO#", "PO12345", "x"]]);
        assert_eq!(find(&ws, FieldAnchor::offset("PO#", 1)).as_deref(), Some("PO12345"));
        assert_eq!(find(&ws, FieldAnchor::offset("po#:", 2)).as_deref(), Some("x"));
    }

    #[test]
    fn test_missing_label_is_none() {
        let ws = sheet(vec![vec!["Order", "1"]]);
        assert_eq!(find(&ws, FieldAnchor::offset("PO#", 1)), None);
    }

    #[test]
    fn test_exact_does_not_match_longer_label() {
        let ws = sheet(vec![vec!["GSTIN", "29AAA"], vec!["GST", "07BBB"]]);
        assert_eq!(find(&ws, FieldAnchor::offset("GST", 1)).as_deref(), Some("07BBB"));
    }

    #[test]
    fn test_next_non_empty() {
        let ws = sheet(vec![vec!["CREDIT TERM", "", "", "30 Days"]]);
        assert_eq!(
            find(&ws, FieldAnchor::next_non_empty("CREDIT TERM", 3)).as_deref(),
            Some("30 Days")
        );
        assert_eq!(find(&ws, FieldAnchor::next_non_empty("CREDIT TERM", 2)), None);
    }

    #[test]
    fn test_after_second_label() {
        let ws = sheet(vec![vec![
            "PO#",
            "FK-1",
            "Nature Of Supply",
            "Goods",
            "ORDER DATE",
            "21-09-25",
        ]]);
        assert_eq!(
            find(&ws, FieldAnchor::after_second_label("PO#", "ORDER DATE")).as_deref(),
            Some("21-09-25")
        );
        assert_eq!(
            find(&ws, FieldAnchor::after_second_label("PO#", "CATEGORY")),
            None
        );
    }

    #[test]
    fn test_last_match() {
        let ws = sheet(vec![vec![
            "Billed by", "GSTIN", "29AAA", "Shipped From", "Pune", "GSTIN", "27CCC",
        ]]);
        assert_eq!(find(&ws, FieldAnchor::offset("GSTIN", 1)).as_deref(), Some("29AAA"));
        assert_eq!(find(&ws, FieldAnchor::last_match("GSTIN", 1)).as_deref(), Some("27CCC"));
    }

    #[test]
    fn test_inline_same_cell() {
        let ws = sheet(vec![
            vec!["PO Number:BB123, PO Date:08/Aug/2025"],
            vec!["Purchase Order Number\nZHPGJ26-PO-2009516"],
        ]);
        assert_eq!(
            find(&ws, FieldAnchor::inline("PO Number", &[','])).as_deref(),
            Some("BB123")
        );
        assert_eq!(
            find(&ws, FieldAnchor::inline("Purchase Order Number", &[])).as_deref(),
            Some("ZHPGJ26-PO-2009516")
        );
        // 标签后无内容视为未取到
        let ws = sheet(vec![vec!["Vendor Name :"]]);
        assert_eq!(find(&ws, FieldAnchor::inline("Vendor Name", &[])), None);
    }

    #[test]
    fn test_pattern_capture() {
        let ws = sheet(vec![vec![
            "Purchase Order PO-4521\nPurchase Order Date: 01-08-2025",
        ]]);
        let po = FieldAnchor::inline("Purchase Order", &[]).with_pattern(r"PO-(\d+)");
        assert_eq!(find(&ws, po).as_deref(), Some("4521"));

        let date = FieldAnchor::inline("Purchase Order", &[])
            .with_pattern(r"Purchase Order Date\D*(\d{2}-\d{2}-\d{4})");
        assert_eq!(find(&ws, date).as_deref(), Some("01-08-2025"));

        let miss = FieldAnchor::inline("Purchase Order", &[]).with_pattern(r"Expiry\D*(\d+)");
        assert_eq!(find(&ws, miss), None);
    }

    #[test]
    fn test_row_scope_and_column() {
        let ws = sheet(vec![
            vec!["GST", "", "07BUYER"],
            vec![],
            vec!["GST", "", "", "", "29VENDOR"],
            vec!["x", "GST", "", "", "", "WRONG"],
        ]);
        let buyer = FieldAnchor::offset("GST", 2).in_column(0).rows(RowScope::between(0, 2));
        let vendor = FieldAnchor::offset("GST", 4).in_column(0).rows(RowScope::from(2));
        assert_eq!(find(&ws, buyer).as_deref(), Some("07BUYER"));
        assert_eq!(find(&ws, vendor).as_deref(), Some("29VENDOR"));
    }

    #[test]
    fn test_below() {
        let ws = sheet(vec![vec!["Supplier Details"], vec!["Acme Foods"], vec!["Plot 4"]]);
        assert_eq!(find(&ws, FieldAnchor::below("Supplier Details", 2)).as_deref(), Some("Plot 4"));
    }

    #[test]
    fn test_numeric_value_keeps_type() {
        let ws = RawWorksheet::new(
            "t",
            vec![vec![CellValue::from("ORDER DATE"), CellValue::Number(45566.0)]],
        );
        let compiled = CompiledAnchor::compile("t", &FieldAnchor::offset("ORDER DATE", 1)).unwrap();
        let hit = AnchorExtractor.find(&ws, &compiled).unwrap();
        assert_eq!(hit.value, CellValue::Number(45566.0));
        assert_eq!((hit.row, hit.col), (0, 0));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let anchor = FieldAnchor::offset("PO#", 1).with_pattern("(unclosed");
        assert!(matches!(
            CompiledAnchor::compile("acme", &anchor),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(CompiledAnchor::compile("acme", &FieldAnchor::offset("  ", 1)).is_err());
    }

    #[test]
    fn test_distance_over_limit_rejected() {
        for anchor in [
            FieldAnchor::offset("PO#", usize::MAX),
            FieldAnchor::last_match("GSTIN", MAX_ANCHOR_DISTANCE + 1),
            FieldAnchor::next_non_empty("PO No", usize::MAX),
            FieldAnchor::below("Supplier Details", usize::MAX),
        ] {
            assert!(matches!(
                CompiledAnchor::compile("acme", &anchor),
                Err(ConfigError::InvalidProfile { .. })
            ));
        }
        assert!(CompiledAnchor::compile("acme", &FieldAnchor::next_non_empty("PO No", MAX_ANCHOR_DISTANCE)).is_ok());
    }

    #[test]
    fn test_next_non_empty_stops_at_row_end() {
        // 查找范围按行宽截断，不会越界
        let ws = sheet(vec![vec!["PO No", "", ""], vec!["", "", "", "", "PO-9"]]);
        assert_eq!(
            find(&ws, FieldAnchor::next_non_empty("PO No", MAX_ANCHOR_DISTANCE)),
            None
        );
    }
}
