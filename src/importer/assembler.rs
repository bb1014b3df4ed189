// ==========================================
// 电商采购单解析引擎 - 表头与明细组装
// ==========================================
// 表头: 按锚点顺序取值，已有值的字段不再覆盖
// 明细: 按列布局读取被接受的行，逐字段规范化
// 规范化失败 → 字段置空 + ValueNormalization 告警
// ==========================================

use crate::config::{MissingDatePolicy, ParserConfig};
use crate::domain::purchase_order::{FieldValue, POHeader, POLine};
use crate::domain::types::ValueKind;
use crate::domain::vendor_profile::{HeaderField, LineField};
use crate::domain::worksheet::{CellValue, RawWorksheet};
use crate::importer::anchor_extractor::AnchorExtractor;
use crate::importer::error::{ParseError, ParseOutcome, ParseWarning};
use crate::importer::po_parser_trait::{DeclaredTotals, FieldNormalizer};
use crate::importer::row_classifier::AcceptedRow;
use crate::importer::table_locator::ColumnLayout;
use crate::vendor::registry::RegisteredProfile;
use tracing::{debug, warn};

pub struct Assembler<'a> {
    normalizer: &'a dyn FieldNormalizer,
    config: &'a ParserConfig,
}

impl<'a> Assembler<'a> {
    pub fn new(normalizer: &'a dyn FieldNormalizer, config: &'a ParserConfig) -> Self {
        Self { normalizer, config }
    }

    // ==========================================
    // 表头
    // ==========================================

    /// 组装表头
    ///
    /// # 返回
    /// - Ok((表头, 表格声明的合计))
    /// - Err(MissingPoNumber): 所有 PO 号锚点均未取到值
    pub fn header(
        &self,
        ws: &RawWorksheet,
        registered: &RegisteredProfile,
        warnings: &mut Vec<ParseWarning>,
    ) -> ParseOutcome<(POHeader, DeclaredTotals)> {
        let profile = &registered.profile;
        let mut header = POHeader {
            platform: profile.id.clone(),
            ..Default::default()
        };

        for (header_anchor, compiled) in &registered.anchors {
            let field = &header_anchor.field;
            if header.has(field) {
                continue;
            }
            let Some(hit) = AnchorExtractor.find(ws, compiled) else {
                continue;
            };
            match self.normalizer.normalize(&hit.value, field.kind()) {
                Some(value) => header.set(field, value),
                None => {
                    warn!(field = %field, raw = %hit.value, "表头字段无法规范化");
                    warnings.push(ParseWarning::ValueNormalization {
                        row: Some(hit.row + 1),
                        field: field.to_string(),
                        raw: hit.value.as_text(),
                    });
                }
            }
        }

        if header.po_number.trim().is_empty() {
            return Err(ParseError::MissingPoNumber {
                vendor: profile.id.clone(),
            });
        }

        // 必填字段缺失（同一字段多个锚点只报一次）
        let mut reported: Vec<&HeaderField> = Vec::new();
        for (header_anchor, _) in &registered.anchors {
            let field = &header_anchor.field;
            if !header_anchor.required || header.has(field) || reported.contains(&field) {
                continue;
            }
            reported.push(field);
            self.fill_missing(&mut header, field, warnings);
        }

        if header.status.is_none() {
            header.status = profile.default_status.clone();
        }

        let declared = DeclaredTotals {
            quantity: header.total_quantity,
            taxable_value: header.total_taxable_value,
            tax_amount: header.total_tax_amount,
            amount: header.total_amount,
        };

        debug!(
            vendor = %profile.id,
            po_number = %header.po_number,
            attributes = header.attributes.len(),
            "表头组装完成"
        );
        Ok((header, declared))
    }

    fn fill_missing(
        &self,
        header: &mut POHeader,
        field: &HeaderField,
        warnings: &mut Vec<ParseWarning>,
    ) {
        if field.kind() == ValueKind::Date {
            if let MissingDatePolicy::CallerDefault(date) = &self.config.missing_date_policy {
                header.set(field, FieldValue::Date(*date));
                warnings.push(ParseWarning::DateDefaulted {
                    field: field.to_string(),
                    date: date.format("%Y-%m-%d").to_string(),
                });
                return;
            }
        }
        warn!(field = %field, "必填表头字段缺失");
        warnings.push(ParseWarning::FieldExtractionGap {
            field: field.to_string(),
        });
    }

    // ==========================================
    // 明细
    // ==========================================

    pub fn lines(
        &self,
        ws: &RawWorksheet,
        rows: &[AcceptedRow],
        layout: &ColumnLayout<'_>,
        warnings: &mut Vec<ParseWarning>,
    ) -> Vec<POLine> {
        rows.iter()
            .map(|accepted| self.line(ws, accepted, layout, warnings))
            .collect()
    }

    fn line(
        &self,
        ws: &RawWorksheet,
        accepted: &AcceptedRow,
        layout: &ColumnLayout<'_>,
        warnings: &mut Vec<ParseWarning>,
    ) -> POLine {
        let mut line = POLine::new(accepted.line_number);

        for column in &layout.columns {
            let mapping = column.mapping;
            if mapping.field == LineField::LineNumber {
                continue;
            }
            let cell = cell_part(ws.cell(accepted.row, column.col), mapping.part);
            if cell.is_empty() {
                continue;
            }
            match self.normalizer.normalize(&cell, mapping.value_kind()) {
                Some(value) => line.set(&mapping.field, value),
                None => warnings.push(ParseWarning::ValueNormalization {
                    row: Some(accepted.row + 1),
                    field: mapping.field.to_string(),
                    raw: cell.as_text(),
                }),
            }
        }
        line
    }
}

/// 多行单元格取第 part 行；数值单元格只有第 0 行
fn cell_part(cell: &CellValue, part: Option<usize>) -> CellValue {
    match (part, cell) {
        (None, _) => cell.clone(),
        (Some(0), CellValue::Number(_)) => cell.clone(),
        (Some(_), CellValue::Number(_)) | (Some(_), CellValue::Empty) => CellValue::Empty,
        (Some(idx), CellValue::Text(s)) => s
            .lines()
            .nth(idx)
            .map(|p| CellValue::from(p.trim()))
            .unwrap_or(CellValue::Empty),
    }
}
