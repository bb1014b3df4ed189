// ==========================================
// 电商采购单解析引擎 - 规范采购单模型
// ==========================================
// 职责: 平台无关的 PO 表头 / 明细行 / 解析结果
// 红线: 金额与数量字段只能是 null 或规范化后的类型值
// 红线: 日期统一为 UTC 零点
// ==========================================

use crate::domain::vendor_profile::{HeaderField, LineField};
use crate::importer::error::ParseWarning;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// 标准化后的字段值
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// 写入 attributes 时的文本形式
    pub fn to_attribute(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Decimal(d) => d.normalize().to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }

    fn text(self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s),
            other => Some(other.to_attribute()),
        }
    }

    fn integer(self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(i),
            _ => None,
        }
    }

    fn decimal(self) -> Option<Decimal> {
        match self {
            FieldValue::Decimal(d) => Some(d),
            FieldValue::Integer(i) => Some(Decimal::from(i)),
            _ => None,
        }
    }

    fn date(self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(d),
            _ => None,
        }
    }
}

// ==========================================
// POHeader - 采购单表头
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct POHeader {
    pub po_number: String,
    /// 命中的平台 ID
    pub platform: String,

    pub vendor_name: Option<String>,
    pub vendor_gstin: Option<String>,
    pub vendor_address: Option<String>,
    pub vendor_code: Option<String>,
    pub vendor_contact: Option<String>,
    pub vendor_email: Option<String>,

    pub buyer_name: Option<String>,
    pub buyer_gstin: Option<String>,
    pub buyer_address: Option<String>,
    pub ship_to_address: Option<String>,
    pub ship_to_gstin: Option<String>,

    pub order_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub delivery_date: Option<DateTime<Utc>>,

    pub payment_terms: Option<String>,
    pub contract_ref_id: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,

    pub total_quantity: Option<i64>,
    pub total_taxable_value: Option<Decimal>,
    pub total_tax_amount: Option<Decimal>,
    pub total_amount: Option<Decimal>,

    /// 平台自定义字段
    pub attributes: BTreeMap<String, String>,
}

impl POHeader {
    /// 字段是否已有值
    pub fn has(&self, field: &HeaderField) -> bool {
        match field {
            HeaderField::PoNumber => !self.po_number.is_empty(),
            HeaderField::VendorName => self.vendor_name.is_some(),
            HeaderField::VendorGstin => self.vendor_gstin.is_some(),
            HeaderField::VendorAddress => self.vendor_address.is_some(),
            HeaderField::VendorCode => self.vendor_code.is_some(),
            HeaderField::VendorContact => self.vendor_contact.is_some(),
            HeaderField::VendorEmail => self.vendor_email.is_some(),
            HeaderField::BuyerName => self.buyer_name.is_some(),
            HeaderField::BuyerGstin => self.buyer_gstin.is_some(),
            HeaderField::BuyerAddress => self.buyer_address.is_some(),
            HeaderField::ShipToAddress => self.ship_to_address.is_some(),
            HeaderField::ShipToGstin => self.ship_to_gstin.is_some(),
            HeaderField::OrderDate => self.order_date.is_some(),
            HeaderField::ExpiryDate => self.expiry_date.is_some(),
            HeaderField::DeliveryDate => self.delivery_date.is_some(),
            HeaderField::PaymentTerms => self.payment_terms.is_some(),
            HeaderField::ContractRefId => self.contract_ref_id.is_some(),
            HeaderField::Category => self.category.is_some(),
            HeaderField::Status => self.status.is_some(),
            HeaderField::TotalQuantity => self.total_quantity.is_some(),
            HeaderField::TotalTaxableValue => self.total_taxable_value.is_some(),
            HeaderField::TotalTaxAmount => self.total_tax_amount.is_some(),
            HeaderField::TotalAmount => self.total_amount.is_some(),
            HeaderField::Attribute(name) => self.attributes.contains_key(name),
        }
    }

    /// 写入字段值（类型与字段不符时忽略）
    pub fn set(&mut self, field: &HeaderField, value: FieldValue) {
        match field {
            HeaderField::PoNumber => {
                if let Some(v) = value.text() {
                    self.po_number = v;
                }
            }
            HeaderField::VendorName => self.vendor_name = value.text(),
            HeaderField::VendorGstin => self.vendor_gstin = value.text(),
            HeaderField::VendorAddress => self.vendor_address = value.text(),
            HeaderField::VendorCode => self.vendor_code = value.text(),
            HeaderField::VendorContact => self.vendor_contact = value.text(),
            HeaderField::VendorEmail => self.vendor_email = value.text(),
            HeaderField::BuyerName => self.buyer_name = value.text(),
            HeaderField::BuyerGstin => self.buyer_gstin = value.text(),
            HeaderField::BuyerAddress => self.buyer_address = value.text(),
            HeaderField::ShipToAddress => self.ship_to_address = value.text(),
            HeaderField::ShipToGstin => self.ship_to_gstin = value.text(),
            HeaderField::OrderDate => self.order_date = value.date(),
            HeaderField::ExpiryDate => self.expiry_date = value.date(),
            HeaderField::DeliveryDate => self.delivery_date = value.date(),
            HeaderField::PaymentTerms => self.payment_terms = value.text(),
            HeaderField::ContractRefId => self.contract_ref_id = value.text(),
            HeaderField::Category => self.category = value.text(),
            HeaderField::Status => self.status = value.text(),
            HeaderField::TotalQuantity => self.total_quantity = value.integer(),
            HeaderField::TotalTaxableValue => self.total_taxable_value = value.decimal(),
            HeaderField::TotalTaxAmount => self.total_tax_amount = value.decimal(),
            HeaderField::TotalAmount => self.total_amount = value.decimal(),
            HeaderField::Attribute(name) => {
                self.attributes.insert(name.clone(), value.to_attribute());
            }
        }
    }
}

// ==========================================
// POLine - 采购单明细行
// ==========================================
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct POLine {
    pub line_number: u32,

    pub sku: Option<String>,
    pub article_id: Option<String>,
    pub fsn: Option<String>,
    pub ean: Option<String>,
    pub hsn_code: Option<String>,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub uom: Option<String>,

    pub quantity: Option<i64>,
    pub mrp: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    pub taxable_value: Option<Decimal>,

    pub cgst_rate: Option<Decimal>,
    pub cgst_amount: Option<Decimal>,
    pub sgst_rate: Option<Decimal>,
    pub sgst_amount: Option<Decimal>,
    pub igst_rate: Option<Decimal>,
    pub igst_amount: Option<Decimal>,
    pub cess_rate: Option<Decimal>,
    pub cess_amount: Option<Decimal>,
    pub tax_amount: Option<Decimal>,

    pub line_total: Option<Decimal>,
    pub required_by_date: Option<DateTime<Utc>>,

    pub attributes: BTreeMap<String, String>,
}

impl POLine {
    pub fn new(line_number: u32) -> Self {
        Self {
            line_number,
            ..Default::default()
        }
    }

    pub fn set(&mut self, field: &LineField, value: FieldValue) {
        match field {
            LineField::LineNumber => {
                if let Some(n) = value.integer().and_then(|n| u32::try_from(n).ok()) {
                    self.line_number = n;
                }
            }
            LineField::Sku => self.sku = value.text(),
            LineField::ArticleId => self.article_id = value.text(),
            LineField::Fsn => self.fsn = value.text(),
            LineField::Ean => self.ean = value.text(),
            LineField::HsnCode => self.hsn_code = value.text(),
            LineField::Title => self.title = value.text(),
            LineField::Brand => self.brand = value.text(),
            LineField::Uom => self.uom = value.text(),
            LineField::Quantity => self.quantity = value.integer(),
            LineField::Mrp => self.mrp = value.decimal(),
            LineField::UnitPrice => self.unit_price = value.decimal(),
            LineField::TaxableValue => self.taxable_value = value.decimal(),
            LineField::CgstRate => self.cgst_rate = value.decimal(),
            LineField::CgstAmount => self.cgst_amount = value.decimal(),
            LineField::SgstRate => self.sgst_rate = value.decimal(),
            LineField::SgstAmount => self.sgst_amount = value.decimal(),
            LineField::IgstRate => self.igst_rate = value.decimal(),
            LineField::IgstAmount => self.igst_amount = value.decimal(),
            LineField::CessRate => self.cess_rate = value.decimal(),
            LineField::CessAmount => self.cess_amount = value.decimal(),
            LineField::TaxAmount => self.tax_amount = value.decimal(),
            LineField::LineTotal => self.line_total = value.decimal(),
            LineField::RequiredByDate => self.required_by_date = value.date(),
            LineField::Attribute(name) => {
                self.attributes.insert(name.clone(), value.to_attribute());
            }
        }
    }

    /// 行税额：优先取表格给出的税额，否则由各税种金额相加（溢出时为 None）
    pub fn effective_tax_amount(&self) -> Option<Decimal> {
        if self.tax_amount.is_some() {
            return self.tax_amount;
        }
        let parts = [
            self.cgst_amount,
            self.sgst_amount,
            self.igst_amount,
            self.cess_amount,
        ];
        if parts.iter().all(Option::is_none) {
            return None;
        }
        parts
            .iter()
            .flatten()
            .try_fold(Decimal::ZERO, |acc, part| acc.checked_add(*part))
    }
}

// ==========================================
// ParseResult - 解析结果（唯一输出，生成后不再修改）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub header: POHeader,
    pub lines: Vec<POLine>,
    #[serde(serialize_with = "warnings_as_text")]
    pub warnings: Vec<ParseWarning>,
}

impl ParseResult {
    /// 告警文本（与序列化输出一致）
    pub fn warning_messages(&self) -> Vec<String> {
        self.warnings.iter().map(ToString::to_string).collect()
    }
}

fn warnings_as_text<S: Serializer>(warnings: &[ParseWarning], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(warnings.iter().map(ToString::to_string))
}
