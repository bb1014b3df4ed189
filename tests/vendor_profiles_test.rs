// ==========================================
// 内置平台版式集成测试
// ==========================================
// 测试目标: 每个内置平台的样例表格（CSV / XLSX）
// 均能自动识别平台、取到 PO 号与明细，且合计与明细一致
// ==========================================


use chrono::{DateTime, TimeZone, Utc};
use po_ingest::domain::FileKind;
use po_ingest::importer::{ParseWarning, PoParser, PurchaseOrderParser};
use po_ingest::logging;
use po_ingest::vendor::VendorRegistry;
use po_ingest::ParseResult;
use rust_decimal::Decimal;
use std::str::FromStr;
use test_helpers::{
    amazon_grid, bigbasket_grid, blinkit_grid, citymall_grid, dealshare_grid, flipkart_grid,
    grid_to_csv, grid_to_xlsx, swiggy_grid, zepto_grid, zomato_grid, Grid,
};

fn date(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap())
}

fn dec(s: &str) -> Option<Decimal> {
    Some(Decimal::from_str(s).unwrap())
}

/// 以 CSV 与 XLSX 两种编码解析同一网格，结果必须一致
fn parse_both(grid: &Grid) -> ParseResult {
    logging::init_test();
    let registry = VendorRegistry::builtin().unwrap();
    let parser = PurchaseOrderParser::new(&registry);

    let from_csv = parser
        .parse(None, &grid_to_csv(grid), FileKind::Csv)
        .unwrap();
    let from_xlsx = parser
        .parse(None, &grid_to_xlsx(grid).unwrap(), FileKind::Xlsx)
        .unwrap();
    assert_eq!(from_csv, from_xlsx);
    from_csv
}

fn assert_common(result: &ParseResult, platform: &str, lines: usize, total_quantity: i64) {
    assert_eq!(result.header.platform, platform);
    assert!(!result.header.po_number.is_empty());
    assert_eq!(result.lines.len(), lines);
    assert_eq!(result.header.total_quantity, Some(total_quantity));
    let sum: i64 = result.lines.iter().filter_map(|l| l.quantity).sum();
    assert_eq!(sum, total_quantity);
    assert!(
        !result
            .warnings
            .iter()
            .any(|w| matches!(w, ParseWarning::TotalsMismatch { .. })),
        "{:?}",
        result.warnings
    );
}

#[test]
fn test_flipkart_grocery() {
    let result = parse_both(&flipkart_grid());
    assert_common(&result, "flipkart_grocery", 2, 10);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let h = &result.header;
    assert_eq!(h.po_number, "FK-PO-1001");
    assert_eq!(h.order_date, date(2025, 9, 21));
    assert_eq!(h.expiry_date, date(2025, 9, 30));
    assert_eq!(h.category.as_deref(), Some("Grocery"));
    assert_eq!(h.vendor_name.as_deref(), Some("Acme Foods Pvt Ltd"));
    assert_eq!(h.vendor_address.as_deref(), Some("12 Market Road, Pune"));
    assert_eq!(h.vendor_contact.as_deref(), Some("9876543210"));
    assert_eq!(h.vendor_email.as_deref(), Some("acme@example.com"));
    assert_eq!(h.vendor_gstin.as_deref(), Some("29AAACF1234A1Z5"));
    assert_eq!(h.ship_to_gstin.as_deref(), Some("27AAACA9999B1Z1"));
    assert_eq!(h.buyer_address.as_deref(), Some("Flipkart Warehouse, Bengaluru"));
    assert_eq!(h.buyer_gstin.as_deref(), Some("29AAACF0000Z1Z9"));
    assert_eq!(h.ship_to_address.as_deref(), Some("Flipkart FC, Hoskote"));
    assert_eq!(h.payment_terms.as_deref(), Some("30 Days"));
    assert_eq!(h.contract_ref_id.as_deref(), Some("CR-778"));
    assert_eq!(h.status.as_deref(), Some("pending"));
    assert_eq!(h.attributes["nature_of_supply"], "Goods");
    assert_eq!(h.attributes["nature_of_transaction"], "Intra State");
    assert_eq!(h.attributes["mode_of_payment"], "NEFT");
    assert_eq!(h.attributes["contract_version"], "2");
    assert_eq!(h.total_amount, dec("1764"));
    assert_eq!(h.total_tax_amount, dec("84"));

    let first = &result.lines[0];
    assert_eq!(first.line_number, 1);
    assert_eq!(first.hsn_code.as_deref(), Some("21069099"));
    assert_eq!(first.fsn.as_deref(), Some("FSN001"));
    assert_eq!(first.quantity, Some(4));
    assert_eq!(first.ean.as_deref(), Some("8901234567890"));
    assert_eq!(first.mrp, dec("150"));
    assert_eq!(first.sgst_rate, dec("2.5"));
    assert_eq!(first.line_total, dec("504"));
    assert_eq!(first.required_by_date, date(2025, 9, 28));
    assert_eq!(first.attributes["pending_quantity"], "0");
    assert_eq!(first.attributes["vertical"], "Staples");

    // 前导 0 的编码保持原样
    assert_eq!(result.lines[1].hsn_code.as_deref(), Some("04090000"));
}

#[test]
fn test_citymall() {
    let result = parse_both(&citymall_grid());
    assert_common(&result, "citymall", 2, 13);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let h = &result.header;
    assert_eq!(h.po_number, "4521");
    assert_eq!(h.order_date, date(2025, 8, 1));
    assert_eq!(h.expiry_date, date(2025, 8, 15));
    assert_eq!(h.buyer_name.as_deref(), Some("CityMall Retail Pvt Ltd"));
    assert_eq!(h.buyer_gstin.as_deref(), Some("07AAACC1111C1Z1"));
    assert_eq!(h.buyer_address.as_deref(), Some("Sector 44, Gurugram"));
    assert_eq!(h.vendor_name.as_deref(), Some("Acme Foods Pvt Ltd"));
    assert_eq!(h.vendor_code.as_deref(), Some("VC-889"));
    assert_eq!(h.vendor_gstin.as_deref(), Some("29AAACA2222A1Z2"));
    assert_eq!(h.vendor_address.as_deref(), Some("12 Market Road, Pune"));
    assert_eq!(h.vendor_contact.as_deref(), Some("Ravi"));
    assert_eq!(h.attributes["vendor_phone"], "9876500000");

    let first = &result.lines[0];
    assert_eq!(first.article_id.as_deref(), Some("CM-1001"));
    assert_eq!(first.title.as_deref(), Some("Toor Dal 1kg"));
    assert_eq!(first.hsn_code.as_deref(), Some("07133100"));
    assert_eq!(first.igst_rate, dec("5"));
    assert_eq!(first.cess_rate, dec("0"));
    assert_eq!(first.igst_amount, dec("35"));
    assert_eq!(first.line_total, dec("735"));
}

#[test]
fn test_bigbasket() {
    let result = parse_both(&bigbasket_grid());
    assert_common(&result, "bigbasket", 2, 72);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let h = &result.header;
    assert_eq!(h.po_number, "BB-7781");
    assert_eq!(h.order_date, date(2025, 8, 8));
    assert_eq!(h.expiry_date, date(2025, 8, 22));
    assert_eq!(h.vendor_gstin.as_deref(), Some("29AAACB3333B1Z3"));
    assert_eq!(h.vendor_name.as_deref(), Some("Acme Foods Pvt Ltd"));
    assert_eq!(h.vendor_address.as_deref(), Some("12 Market Road, Pune"));
    assert_eq!(h.ship_to_address.as_deref(), Some("BB DC Bengaluru, Hosur Road"));

    let second = &result.lines[1];
    assert_eq!(second.sku.as_deref(), Some("BB-502"));
    assert_eq!(second.quantity, Some(24));
    assert_eq!(second.sgst_amount, dec("14.4"));
    assert_eq!(second.tax_amount, dec("28.8"));
    assert_eq!(second.line_total, dec("268.8"));
    assert_eq!(second.attributes["case_quantity"], "12");
    assert_eq!(second.attributes["landing_cost"], "11.2");
}

#[test]
fn test_swiggy() {
    let result = parse_both(&swiggy_grid());
    assert_common(&result, "swiggy", 2, 14);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let h = &result.header;
    assert_eq!(h.po_number, "SW-PO-3301");
    assert_eq!(h.order_date, date(2025, 9, 5));
    assert_eq!(h.delivery_date, date(2025, 9, 10));
    assert_eq!(h.expiry_date, date(2025, 9, 20));
    assert_eq!(h.payment_terms.as_deref(), Some("45 Days"));
    assert_eq!(h.vendor_name.as_deref(), Some("Acme Foods Pvt Ltd"));
    assert_eq!(h.vendor_gstin.as_deref(), Some("29AAACA2222A1Z2"));
    assert_eq!(h.total_taxable_value, dec("6480"));

    let first = &result.lines[0];
    assert_eq!(first.sku.as_deref(), Some("SW-11"));
    assert_eq!(first.title.as_deref(), Some("Almonds 500g"));
    assert_eq!(first.quantity, Some(10));
    assert_eq!(first.unit_price, dec("520"));
    assert_eq!(first.cgst_rate, dec("2.5"));
    assert_eq!(first.cgst_amount, dec("130"));
    assert_eq!(first.effective_tax_amount(), dec("260"));
    assert_eq!(first.attributes["additional_cess"], "0");
}

#[test]
fn test_zomato_sequential_numbering() {
    let result = parse_both(&zomato_grid());
    assert_common(&result, "zomato", 2, 35);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let h = &result.header;
    assert_eq!(h.po_number, "ZHPGJ26-PO-2009516");
    assert_eq!(h.order_date, date(2025, 8, 12));
    assert_eq!(h.delivery_date, date(2025, 8, 14));
    assert_eq!(h.vendor_code.as_deref(), Some("V-3391"));
    assert_eq!(h.vendor_name.as_deref(), Some("Acme Foods Pvt Ltd"));
    assert_eq!(h.vendor_address.as_deref(), Some("12 Market Road, Pune"));
    assert_eq!(h.vendor_gstin.as_deref(), Some("29AAACA2222A1Z2"));
    assert_eq!(h.buyer_name.as_deref(), Some("Zomato Hyperpure Pvt Ltd"));
    assert_eq!(h.buyer_address.as_deref(), Some("Warehouse 3, Gurugram"));
    assert_eq!(h.buyer_gstin.as_deref(), Some("06AAACZ4444Z1Z4"));
    assert_eq!(h.attributes["account_number"], "001122334455");
    assert_eq!(h.attributes["vendor_phone"], "9876543210");

    let numbers: Vec<u32> = result.lines.iter().map(|l| l.line_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    assert_eq!(result.lines[0].uom.as_deref(), Some("KG"));
    assert_eq!(result.lines[0].attributes["gst_rate"], "5");
    assert_eq!(result.lines[1].title.as_deref(), Some("Butter 500g"));
}

#[test]
fn test_dealshare() {
    let result = parse_both(&dealshare_grid());
    assert_common(&result, "dealshare", 2, 42);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let h = &result.header;
    assert_eq!(h.po_number, "DS-PO-55012");
    // Excel 序列号日期
    assert_eq!(h.order_date, date(2025, 9, 1));
    assert_eq!(h.delivery_date, date(2025, 9, 5));
    assert_eq!(h.expiry_date, date(2025, 9, 15));
    assert_eq!(h.vendor_name.as_deref(), Some("Acme Foods Pvt Ltd"));
    assert_eq!(h.vendor_address.as_deref(), Some("12 Market Road"));
    assert_eq!(h.vendor_gstin.as_deref(), Some("29AAACA2222A1Z2"));
    assert_eq!(h.vendor_contact.as_deref(), Some("9876543210"));
    assert_eq!(h.vendor_code.as_deref(), Some("DS-V-204"));
    assert_eq!(h.ship_to_address.as_deref(), Some("Sitapura Industrial Area"));
    assert_eq!(h.ship_to_gstin.as_deref(), Some("08AAACD5555D1Z5"));
    assert_eq!(h.buyer_name.as_deref(), Some("Dealshare Retail Pvt Ltd"));
    assert_eq!(h.buyer_address.as_deref(), Some("Malviya Nagar"));
    assert_eq!(h.buyer_gstin.as_deref(), Some("08AAACD6666D1Z6"));
    assert_eq!(h.attributes["comments"], "Deliver before noon");
    assert_eq!(h.status.as_deref(), Some("pending"));
    assert_eq!(h.total_amount, dec("3055.5"));

    let numbers: Vec<u32> = result.lines.iter().map(|l| l.line_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    let first = &result.lines[0];
    assert_eq!(first.sku.as_deref(), Some("DS-1001"));
    assert_eq!(first.title.as_deref(), Some("Sugar 1kg"));
    assert_eq!(first.unit_price, dec("45"));
    assert_eq!(first.mrp, dec("55"));
    assert_eq!(first.line_total, dec("1417.5"));
    assert_eq!(first.attributes["gst_rate"], "5");
    assert_eq!(result.lines[1].hsn_code.as_deref(), Some("09023010"));
}

#[test]
fn test_blinkit() {
    let result = parse_both(&blinkit_grid());
    assert_common(&result, "blinkit", 2, 30);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let h = &result.header;
    assert_eq!(h.po_number, "1100012345678");
    assert_eq!(h.order_date, date(2025, 9, 5));
    assert_eq!(h.delivery_date, date(2025, 9, 12));
    assert_eq!(h.expiry_date, date(2025, 9, 20));
    assert_eq!(h.payment_terms.as_deref(), Some("30 Days"));
    assert_eq!(h.vendor_code.as_deref(), Some("4417"));
    assert_eq!(h.vendor_name.as_deref(), Some("Acme Foods Pvt Ltd"));
    assert_eq!(h.vendor_address.as_deref(), Some("12 Market Road, Pune"));
    assert_eq!(h.vendor_contact.as_deref(), Some("Ravi"));
    assert_eq!(h.vendor_email.as_deref(), Some("acme@example.com"));
    assert_eq!(h.vendor_gstin.as_deref(), Some("29AAACA2222A1Z2"));
    assert_eq!(h.buyer_name.as_deref(), Some("HANDS ON TRADES PRIVATE LIMITED"));
    assert_eq!(
        h.ship_to_address.as_deref(),
        Some("Blinkit Warehouse, Khasra 12, Dehradun, Uttarakhand")
    );
    assert_eq!(h.ship_to_gstin.as_deref(), Some("05AAACH1234H1Z5"));
    assert_eq!(h.attributes["po_type"], "Regular");
    assert_eq!(h.attributes["buyer_pan"], "AAACH1234H");
    assert_eq!(h.attributes["buyer_cin"], "U51909DL2015PTC000001");
    assert_eq!(h.total_amount, dec("584"));

    let first = &result.lines[0];
    assert_eq!(first.line_number, 1);
    assert_eq!(first.sku.as_deref(), Some("10023"));
    assert_eq!(first.ean.as_deref(), Some("8901000000011"));
    assert_eq!(first.igst_rate, dec("18"));
    assert_eq!(first.tax_amount, dec("72"));
    assert_eq!(first.quantity, Some(20));
    assert_eq!(first.attributes["landing_rate"], "23.6");
    assert_eq!(first.attributes["margin_percent"], "21.33");
}

#[test]
fn test_zepto_flat_export() {
    let result = parse_both(&zepto_grid());
    assert_common(&result, "zepto", 2, 30);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let h = &result.header;
    assert_eq!(h.po_number, "ZEP-PO-7781");
    // 日期时间只取日期部分
    assert_eq!(h.order_date, date(2025, 9, 17));
    assert_eq!(h.expiry_date, date(2025, 9, 30));
    assert_eq!(h.status.as_deref(), Some("PENDING_ACKNOWLEDGEMENT"));
    assert_eq!(h.vendor_code.as_deref(), Some("ZV-118"));
    assert_eq!(h.vendor_name.as_deref(), Some("Acme Foods Pvt Ltd"));
    assert_eq!(h.ship_to_address.as_deref(), Some("Bengaluru Mother Hub"));
    assert_eq!(h.total_amount, dec("1890"));

    let numbers: Vec<u32> = result.lines.iter().map(|l| l.line_number).collect();
    assert_eq!(numbers, vec![1, 2]);
    let second = &result.lines[1];
    assert_eq!(second.sku.as_deref(), Some("a1b2c3d4-sku-2"));
    assert_eq!(second.title.as_deref(), Some("Muesli 500g"));
    assert_eq!(second.brand.as_deref(), Some("Acme"));
    assert_eq!(second.cgst_rate, dec("2.5"));
    assert_eq!(second.line_total, dec("630"));
    assert_eq!(second.attributes["landing_cost"], "63");
    assert_eq!(second.attributes["grn_quantity"], "0");
}

#[test]
fn test_amazon_titled_columns() {
    let result = parse_both(&amazon_grid());
    assert_common(&result, "amazon", 2, 36);
    assert!(result.warnings.is_empty(), "{:?}", result.warnings);

    let h = &result.header;
    assert_eq!(h.po_number, "664155NW");
    assert_eq!(h.order_date, date(2025, 9, 24));
    // 发货窗口取截止日
    assert_eq!(h.delivery_date, date(2025, 10, 21));
    assert_eq!(h.vendor_code.as_deref(), Some("0M7KK"));
    assert_eq!(h.ship_to_address.as_deref(), Some("Plot 12, Bommasandra, Bengaluru"));
    assert_eq!(h.payment_terms.as_deref(), Some("Net 60"));
    assert_eq!(h.buyer_name.as_deref(), Some("Amazon Seller Services Pvt Ltd"));
    assert_eq!(h.status.as_deref(), Some("Confirmed"));
    assert_eq!(h.attributes["ship_to_location"], "BLR7 - Bengaluru");
    assert_eq!(h.attributes["freight_terms"], "Prepaid");
    assert_eq!(h.attributes["payment_method"], "Invoice");
    assert_eq!(h.total_amount, dec("6120"));

    let first = &result.lines[0];
    assert_eq!(first.article_id.as_deref(), Some("B0C1111111"));
    assert_eq!(first.sku.as_deref(), Some("8901000000059"));
    assert_eq!(first.hsn_code.as_deref(), Some("11041200"));
    assert_eq!(first.title.as_deref(), Some("Rolled Oats 1kg"));
    assert_eq!(first.unit_price, dec("150"));
    assert_eq!(first.line_total, dec("3600"));
    assert_eq!(first.attributes["model_number"], "AC-OAT-1");
    assert_eq!(first.attributes["accepted_quantity"], "24");
}

#[test]
fn test_explicit_hint_on_matching_file_has_no_mismatch() {
    let registry = VendorRegistry::builtin().unwrap();
    let parser = PurchaseOrderParser::new(&registry);
    let result = parser
        .parse(Some("Swiggy"), &grid_to_csv(&swiggy_grid()), FileKind::Csv)
        .unwrap();
    assert_eq!(result.header.platform, "swiggy");
    assert!(!result
        .warnings
        .iter()
        .any(|w| matches!(w, ParseWarning::VendorHintMismatch { .. })));
}
