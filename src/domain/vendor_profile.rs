// ==========================================
// 电商采购单解析引擎 - 平台版式配置 (VendorProfile)
// ==========================================
// 职责: 描述单个平台 PO 表格的版式（数据，不是代码分支）
// 组成: 签名 / 表头锚点 / 明细表标记 / 列映射 / 行规则
// ==========================================
// 新增平台 = 新增一份 VendorProfile，引擎控制流不变
// ==========================================

use crate::domain::types::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 锚点取值策略
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnchorStrategy {
    /// 标签单元格右侧固定偏移列
    Offset {
        #[serde(default = "default_offset")]
        columns: usize,
    },

    /// 同一行中标签右侧第一个非空单元格（最多向右查找 max_distance 列）
    NextNonEmpty {
        #[serde(default = "default_max_distance")]
        max_distance: usize,
    },

    /// 在标签所在行继续查找第二个标记标签，取其右侧单元格
    /// 用于一行内并排多组 键/值 的版式
    AfterSecondLabel { marker: String },

    /// 同一行内标签重复出现时取最后一次出现（如两个主体各自的 GSTIN）
    LastMatch {
        #[serde(default = "default_offset")]
        columns: usize,
    },

    /// 标签与值在同一单元格（"PO Number:BB123," / "Purchase Order Number\nZH-1"）
    /// 取标签之后的文本，遇到 stop_at 中任一字符截断
    Inline {
        #[serde(default)]
        stop_at: Vec<char>,
    },

    /// 标签下方第 rows 行同列单元格
    Below {
        #[serde(default = "default_offset")]
        rows: usize,
    },
}

fn default_offset() -> usize {
    1
}

fn default_max_distance() -> usize {
    10
}

// ==========================================
// 标签匹配方式
// ==========================================
// 比较前统一: 忽略大小写 / 连续空白视为一个 / 忽略末尾冒号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelMatch {
    #[default]
    Exact,
    Prefix,
    Contains,
}

/// 行范围 [start, end)，end 为空表示直到工作表末尾
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowScope {
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: Option<usize>,
}

impl RowScope {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn between(start: usize, end: usize) -> Self {
        Self {
            start,
            end: Some(end),
        }
    }

    pub fn from(start: usize) -> Self {
        Self { start, end: None }
    }

    /// 裁剪到工作表实际行数
    pub fn bounded(&self, row_count: usize) -> std::ops::Range<usize> {
        let end = self.end.map_or(row_count, |e| e.min(row_count));
        self.start.min(end)..end
    }
}

// ==========================================
// FieldAnchor - 表头字段锚点
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnchor {
    /// 标签文本
    pub label: String,

    #[serde(default)]
    pub row_scope: RowScope,

    pub strategy: AnchorStrategy,

    #[serde(default)]
    pub label_match: LabelMatch,

    /// 仅在该列查找标签
    #[serde(default)]
    pub label_column: Option<usize>,

    /// 对取到的文本再做正则提取（有分组取第 1 组，否则取整个匹配）
    #[serde(default)]
    pub pattern: Option<String>,
}

impl FieldAnchor {
    pub fn new(label: impl Into<String>, strategy: AnchorStrategy) -> Self {
        Self {
            label: label.into(),
            row_scope: RowScope::all(),
            strategy,
            label_match: LabelMatch::Exact,
            label_column: None,
            pattern: None,
        }
    }

    pub fn offset(label: impl Into<String>, columns: usize) -> Self {
        Self::new(label, AnchorStrategy::Offset { columns })
    }

    pub fn next_non_empty(label: impl Into<String>, max_distance: usize) -> Self {
        Self::new(label, AnchorStrategy::NextNonEmpty { max_distance })
    }

    pub fn after_second_label(label: impl Into<String>, marker: impl Into<String>) -> Self {
        Self::new(
            label,
            AnchorStrategy::AfterSecondLabel {
                marker: marker.into(),
            },
        )
    }

    pub fn last_match(label: impl Into<String>, columns: usize) -> Self {
        Self::new(label, AnchorStrategy::LastMatch { columns })
    }

    /// 同单元格取值，默认按前缀匹配标签
    pub fn inline(label: impl Into<String>, stop_at: &[char]) -> Self {
        Self::new(
            label,
            AnchorStrategy::Inline {
                stop_at: stop_at.to_vec(),
            },
        )
        .matching(LabelMatch::Prefix)
    }

    pub fn below(label: impl Into<String>, rows: usize) -> Self {
        Self::new(label, AnchorStrategy::Below { rows })
    }

    pub fn matching(mut self, label_match: LabelMatch) -> Self {
        self.label_match = label_match;
        self
    }

    pub fn in_column(mut self, column: usize) -> Self {
        self.label_column = Some(column);
        self
    }

    pub fn rows(mut self, scope: RowScope) -> Self {
        self.row_scope = scope;
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}

// ==========================================
// 规范字段 - 表头
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderField {
    PoNumber,
    VendorName,
    VendorGstin,
    VendorAddress,
    VendorCode,
    VendorContact,
    VendorEmail,
    BuyerName,
    BuyerGstin,
    BuyerAddress,
    ShipToAddress,
    ShipToGstin,
    OrderDate,
    ExpiryDate,
    DeliveryDate,
    PaymentTerms,
    ContractRefId,
    Category,
    Status,
    TotalQuantity,
    TotalTaxableValue,
    TotalTaxAmount,
    TotalAmount,
    /// 平台自定义字段，写入 header.attributes
    Attribute(String),
}

impl HeaderField {
    pub fn kind(&self) -> ValueKind {
        match self {
            HeaderField::OrderDate | HeaderField::ExpiryDate | HeaderField::DeliveryDate => {
                ValueKind::Date
            }
            HeaderField::TotalQuantity => ValueKind::Integer,
            HeaderField::TotalTaxableValue
            | HeaderField::TotalTaxAmount
            | HeaderField::TotalAmount => ValueKind::Decimal,
            _ => ValueKind::Text,
        }
    }

    pub fn name(&self) -> String {
        match self {
            HeaderField::PoNumber => "po_number".into(),
            HeaderField::VendorName => "vendor_name".into(),
            HeaderField::VendorGstin => "vendor_gstin".into(),
            HeaderField::VendorAddress => "vendor_address".into(),
            HeaderField::VendorCode => "vendor_code".into(),
            HeaderField::VendorContact => "vendor_contact".into(),
            HeaderField::VendorEmail => "vendor_email".into(),
            HeaderField::BuyerName => "buyer_name".into(),
            HeaderField::BuyerGstin => "buyer_gstin".into(),
            HeaderField::BuyerAddress => "buyer_address".into(),
            HeaderField::ShipToAddress => "ship_to_address".into(),
            HeaderField::ShipToGstin => "ship_to_gstin".into(),
            HeaderField::OrderDate => "order_date".into(),
            HeaderField::ExpiryDate => "expiry_date".into(),
            HeaderField::DeliveryDate => "delivery_date".into(),
            HeaderField::PaymentTerms => "payment_terms".into(),
            HeaderField::ContractRefId => "contract_ref_id".into(),
            HeaderField::Category => "category".into(),
            HeaderField::Status => "status".into(),
            HeaderField::TotalQuantity => "total_quantity".into(),
            HeaderField::TotalTaxableValue => "total_taxable_value".into(),
            HeaderField::TotalTaxAmount => "total_tax_amount".into(),
            HeaderField::TotalAmount => "total_amount".into(),
            HeaderField::Attribute(name) => name.clone(),
        }
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "header.{}", self.name())
    }
}

// ==========================================
// 规范字段 - 明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineField {
    /// 序号列；映射了该字段的列即为行分类器的序号列
    LineNumber,
    Sku,
    ArticleId,
    Fsn,
    Ean,
    HsnCode,
    Title,
    Brand,
    Uom,
    Quantity,
    Mrp,
    UnitPrice,
    TaxableValue,
    CgstRate,
    CgstAmount,
    SgstRate,
    SgstAmount,
    IgstRate,
    IgstAmount,
    CessRate,
    CessAmount,
    TaxAmount,
    LineTotal,
    RequiredByDate,
    Attribute(String),
}

impl LineField {
    pub fn kind(&self) -> ValueKind {
        match self {
            LineField::LineNumber | LineField::Quantity => ValueKind::Integer,
            LineField::Mrp
            | LineField::UnitPrice
            | LineField::TaxableValue
            | LineField::CgstRate
            | LineField::CgstAmount
            | LineField::SgstRate
            | LineField::SgstAmount
            | LineField::IgstRate
            | LineField::IgstAmount
            | LineField::CessRate
            | LineField::CessAmount
            | LineField::TaxAmount
            | LineField::LineTotal => ValueKind::Decimal,
            LineField::RequiredByDate => ValueKind::Date,
            _ => ValueKind::Text,
        }
    }

    pub fn name(&self) -> String {
        match self {
            LineField::LineNumber => "line_number".into(),
            LineField::Sku => "sku".into(),
            LineField::ArticleId => "article_id".into(),
            LineField::Fsn => "fsn".into(),
            LineField::Ean => "ean".into(),
            LineField::HsnCode => "hsn_code".into(),
            LineField::Title => "title".into(),
            LineField::Brand => "brand".into(),
            LineField::Uom => "uom".into(),
            LineField::Quantity => "quantity".into(),
            LineField::Mrp => "mrp".into(),
            LineField::UnitPrice => "unit_price".into(),
            LineField::TaxableValue => "taxable_value".into(),
            LineField::CgstRate => "cgst_rate".into(),
            LineField::CgstAmount => "cgst_amount".into(),
            LineField::SgstRate => "sgst_rate".into(),
            LineField::SgstAmount => "sgst_amount".into(),
            LineField::IgstRate => "igst_rate".into(),
            LineField::IgstAmount => "igst_amount".into(),
            LineField::CessRate => "cess_rate".into(),
            LineField::CessAmount => "cess_amount".into(),
            LineField::TaxAmount => "tax_amount".into(),
            LineField::LineTotal => "line_total".into(),
            LineField::RequiredByDate => "required_by_date".into(),
            LineField::Attribute(name) => name.clone(),
        }
    }
}

impl fmt::Display for LineField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line.{}", self.name())
    }
}

// ==========================================
// 表头锚点 / 列映射 / 明细表 / 行规则
// ==========================================

/// 一个表头字段可配置多个锚点，按顺序取第一个非空结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderAnchor {
    pub field: HeaderField,
    pub anchor: FieldAnchor,
    /// 缺失时记录 FieldExtractionGap
    #[serde(default)]
    pub required: bool,
}

impl HeaderAnchor {
    pub fn new(field: HeaderField, anchor: FieldAnchor) -> Self {
        Self {
            field,
            anchor,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// 列映射：优先按表头文本定位列，找不到时回退到固定列号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(default)]
    pub column: Option<usize>,

    #[serde(default)]
    pub header: Option<String>,

    pub field: LineField,

    /// 多行单元格（"18\n0"）取第几行，0 起
    #[serde(default)]
    pub part: Option<usize>,

    /// 覆盖字段默认类型（自定义属性常用）
    #[serde(default)]
    pub kind: Option<ValueKind>,
}

impl ColumnMapping {
    pub fn at(column: usize, field: LineField) -> Self {
        Self {
            column: Some(column),
            header: None,
            field,
            part: None,
            kind: None,
        }
    }

    pub fn titled(header: impl Into<String>, field: LineField) -> Self {
        Self {
            column: None,
            header: Some(header.into()),
            field,
            part: None,
            kind: None,
        }
    }

    pub fn part(mut self, part: usize) -> Self {
        self.part = Some(part);
        self
    }

    pub fn as_kind(mut self, kind: ValueKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn value_kind(&self) -> ValueKind {
        self.kind.unwrap_or_else(|| self.field.kind())
    }
}

/// 明细表表头识别
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSpec {
    pub tokens: Vec<String>,

    /// 覆盖全局 min_token_matches
    #[serde(default)]
    pub min_matches: Option<usize>,

    /// 覆盖全局 table_scan_rows
    #[serde(default)]
    pub scan_rows: Option<usize>,
}

/// 明细行分类规则
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowRules {
    /// 有序号列时：至少一个非空即接受；无序号列时：必须全部非空
    #[serde(default)]
    pub required_fields: Vec<LineField>,

    /// 终止行正则（匹配行内第一个非空单元格，忽略大小写）
    #[serde(default)]
    pub terminators: Vec<String>,

    /// 覆盖全局 prose_threshold
    #[serde(default)]
    pub prose_threshold: Option<usize>,
}

/// 平台识别签名：前 scan_rows 行内所有标签均出现即命中
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signature {
    pub all_of: Vec<String>,

    #[serde(default)]
    pub scan_rows: Option<usize>,
}

// ==========================================
// VendorProfile
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProfile {
    /// 平台 ID（小写，注册表内唯一）
    pub id: String,

    pub display_name: String,

    pub signature: Signature,

    #[serde(default)]
    pub header_anchors: Vec<HeaderAnchor>,

    pub table: TableSpec,

    pub columns: Vec<ColumnMapping>,

    #[serde(default)]
    pub rows: RowRules,

    /// header.status 未从表格取到时使用
    #[serde(default)]
    pub default_status: Option<String>,
}

impl VendorProfile {
    /// 映射为 LineNumber 的列配置
    pub fn serial_mapping(&self) -> Option<&ColumnMapping> {
        self.columns
            .iter()
            .find(|m| m.field == LineField::LineNumber)
    }
}
