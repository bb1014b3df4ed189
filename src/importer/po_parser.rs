// ==========================================
// 电商采购单解析引擎 - 解析管道实现
// ==========================================
// 流程:
//   0. 加载: 字节流 → RawWorksheet
//   1. 平台: 调用方提示 / 签名识别
//   2. 表头: 锚点取值 + 规范化
//   3. 明细表: 表头行定位 + 列解析
//   4. 行分类: 明细 / 跳过 / 终止
//   5. 明细组装 + 行号与合计校验
// 无共享可变状态；同一实例可跨线程并发调用
// ==========================================

use crate::config::ParserConfig;
use crate::domain::purchase_order::ParseResult;
use crate::domain::types::FileKind;
use crate::domain::worksheet::RawWorksheet;
use crate::importer::assembler::Assembler;
use crate::importer::error::{ParseOutcome, ParseWarning};
use crate::importer::po_parser_trait::{PoParser, TotalsReconciler};
use crate::importer::reconciler::Reconciler;
use crate::importer::row_classifier::RowClassifier;
use crate::importer::table_locator::{resolve_columns, TableLocator};
use crate::importer::value_normalizer::ValueNormalizer;
use crate::importer::workbook_loader::UniversalLoader;
use crate::perf::StageTimer;
use crate::vendor::registry::VendorRegistry;
use tracing::{debug, info, instrument};

// ==========================================
// PurchaseOrderParser
// ==========================================
pub struct PurchaseOrderParser<'r> {
    registry: &'r VendorRegistry,
    config: ParserConfig,
    normalizer: ValueNormalizer,
}

impl<'r> PurchaseOrderParser<'r> {
    pub fn new(registry: &'r VendorRegistry) -> Self {
        Self::with_config(registry, ParserConfig::default())
    }

    pub fn with_config(registry: &'r VendorRegistry, config: ParserConfig) -> Self {
        let normalizer = ValueNormalizer::new(config.year_pivot);
        Self {
            registry,
            config,
            normalizer,
        }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn load(&self, bytes: &[u8], kind: FileKind) -> ParseOutcome<RawWorksheet> {
        let mut timer = StageTimer::new("load");
        let ws = UniversalLoader.load(bytes, kind, &self.config.sheet)?;
        timer.rows(ws.row_count());
        Ok(ws)
    }

    /// 仅识别平台（不解析）
    ///
    /// # 返回
    /// - Ok(Some(id)): 签名命中的平台
    /// - Ok(None): 无平台命中
    pub fn detect(&self, bytes: &[u8], kind: FileKind) -> ParseOutcome<Option<String>> {
        let ws = self.load(bytes, kind)?;
        Ok(self
            .registry
            .detect(&ws, self.config.header_scan_rows)
            .map(|p| p.id().to_string()))
    }

    /// 解析已加载的工作表
    #[instrument(skip(self, ws), fields(sheet = %ws.name(), rows = ws.row_count()))]
    pub fn parse_worksheet(
        &self,
        vendor_hint: Option<&str>,
        ws: &RawWorksheet,
    ) -> ParseOutcome<ParseResult> {
        let mut warnings: Vec<ParseWarning> = Vec::new();

        let registered = {
            let _timer = StageTimer::new("resolve_vendor");
            self.registry
                .resolve(vendor_hint, ws, self.config.header_scan_rows, &mut warnings)?
        };
        let profile = &registered.profile;
        debug!(vendor = %profile.id, "平台已确定");

        let assembler = Assembler::new(&self.normalizer, &self.config);
        let (mut header, declared) = {
            let _timer = StageTimer::new("header");
            assembler.header(ws, registered, &mut warnings)?
        };

        let (location, layout) = {
            let _timer = StageTimer::new("locate_table");
            let location = TableLocator::new(&self.config).locate(ws, profile, &mut warnings)?;
            let layout = resolve_columns(ws, location.header_row, profile, &mut warnings);
            (location, layout)
        };

        let scan = {
            let mut timer = StageTimer::new("classify_rows");
            let prose_threshold = profile
                .rows
                .prose_threshold
                .unwrap_or(self.config.prose_threshold);
            let scan = RowClassifier::new(&registered.terminators, prose_threshold).scan(
                ws,
                location.header_row,
                &layout,
            );
            timer.rows(scan.accepted.len() + scan.skipped);
            scan
        };

        let mut lines = assembler.lines(ws, &scan.accepted, &layout, &mut warnings);
        if lines.is_empty() {
            warnings.push(ParseWarning::NoLineItems);
        }

        let reconciler = Reconciler::new(
            self.config.totals_abs_tolerance,
            self.config.totals_pct_tolerance,
        );
        warnings.extend(reconciler.check_line_numbers(&mut lines));
        let (totals, total_warnings) = reconciler.reconcile_totals(&declared, &lines);
        warnings.extend(total_warnings);

        header.total_quantity = totals.quantity;
        header.total_taxable_value = totals.taxable_value;
        header.total_tax_amount = totals.tax_amount;
        header.total_amount = totals.amount;

        info!(
            vendor = %profile.id,
            po_number = %header.po_number,
            lines = lines.len(),
            warnings = warnings.len(),
            header_row = location.header_row,
            "采购单解析完成"
        );

        Ok(ParseResult {
            header,
            lines,
            warnings,
        })
    }
}

impl PoParser for PurchaseOrderParser<'_> {
    fn parse(
        &self,
        vendor_hint: Option<&str>,
        bytes: &[u8],
        kind: FileKind,
    ) -> ParseOutcome<ParseResult> {
        let _timer = StageTimer::new("parse");
        let ws = self.load(bytes, kind)?;
        self.parse_worksheet(vendor_hint, &ws)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::vendor_profile::{
        ColumnMapping, FieldAnchor, HeaderAnchor, HeaderField, LineField, RowRules, Signature,
        TableSpec, VendorProfile,
    };
    use crate::importer::error::ParseError;

    fn registry() -> VendorRegistry {
        let profile = VendorProfile {
            id: "acme".into(),
            display_name: "Acme".into(),
            signature: Signature {
                all_of: vec!["Acme Mart".into()],
                scan_rows: None,
            },
            header_anchors: vec![
                HeaderAnchor::new(HeaderField::PoNumber, FieldAnchor::offset("PO#", 1)).required(),
            ],
            table: TableSpec {
                tokens: vec!["S.No".into(), "HSN".into(), "Quantity".into()],
                ..Default::default()
            },
            columns: vec![
                ColumnMapping::at(0, LineField::LineNumber),
                ColumnMapping::at(1, LineField::HsnCode),
                ColumnMapping::at(2, LineField::Quantity),
            ],
            rows: RowRules {
                required_fields: vec![LineField::Quantity],
                terminators: vec!["^total".into()],
                prose_threshold: None,
            },
            default_status: None,
        };
        VendorRegistry::builder().register(profile).unwrap().build()
    }

    #[test]
    fn test_parse_csv_end_to_end() {
        let csv = "Acme Mart,\nPO#,A-77\n\nS.No,HSN,Quantity\n1,1001,4\n2,1002,\"1,000\"\nTotal,,1004\n";
        let registry = registry();
        let parser = PurchaseOrderParser::new(&registry);
        let result = parser.parse(None, csv.as_bytes(), FileKind::Csv).unwrap();

        assert_eq!(result.header.po_number, "A-77");
        assert_eq!(result.header.platform, "acme");
        assert_eq!(result.lines.len(), 2);
        assert_eq!(result.lines[1].quantity, Some(1000));
        assert_eq!(result.header.total_quantity, Some(1004));
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_header_only_document_warns_no_lines() {
        let csv = "Acme Mart\nPO#,A-1\nS.No,HSN,Quantity\nTotal,,0\n";
        let registry = registry();
        let result = PurchaseOrderParser::new(&registry)
            .parse(Some("acme"), csv.as_bytes(), FileKind::Csv)
            .unwrap();
        assert!(result.lines.is_empty());
        assert_eq!(result.header.total_quantity, None);
        assert_eq!(result.warnings, vec![ParseWarning::NoLineItems]);
    }

    #[test]
    fn test_detect() {
        let registry = registry();
        let parser = PurchaseOrderParser::new(&registry);
        assert_eq!(
            parser.detect(b"Acme Mart\nPO#,1\n", FileKind::Csv).unwrap().as_deref(),
            Some("acme")
        );
        assert_eq!(parser.detect(b"hello\n", FileKind::Csv).unwrap(), None);
    }

    #[test]
    fn test_missing_po_number() {
        let csv = "Acme Mart\nS.No,HSN,Quantity\n1,1001,4\n";
        let registry = registry();
        let err = PurchaseOrderParser::new(&registry)
            .parse(None, csv.as_bytes(), FileKind::Csv)
            .unwrap_err();
        assert_eq!(err, ParseError::MissingPoNumber { vendor: "acme".into() });
    }
}
