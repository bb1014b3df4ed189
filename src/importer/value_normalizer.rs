// ==========================================
// 电商采购单解析引擎 - 字段值规范化
// ==========================================
// 职责: 文本清洗 / 日期 / 定点小数 / 整数
// 红线: 从不报错，无法解析返回 None（由调用方决定是否记录告警）
// 红线: 日期按 UTC 零点构造，避免时区导致日期偏移
// ==========================================

use crate::domain::worksheet::CellValue;
use crate::importer::po_parser_trait::FieldNormalizer;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Excel 1900 纪元可表示的最大序列号（9999-12-31）
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

/// 货币前缀（按长度降序，先匹配长的）
const CURRENCY_PREFIXES: &[&str] = &["inr", "rs.", "rs", "₹", "$", "€", "£"];

/// 名称日期格式（"Aug 4, 2025" / "4 Aug 2025"）
const NAMED_DATE_FORMATS: &[&str] = &[
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d %b, %Y",
];

pub struct ValueNormalizer {
    year_pivot: u32,
}

impl Default for ValueNormalizer {
    fn default() -> Self {
        Self { year_pivot: 50 }
    }
}

impl ValueNormalizer {
    pub fn new(year_pivot: u32) -> Self {
        Self { year_pivot }
    }

    /// 两位年份按分界展开
    fn expand_year(&self, year: i32, digits: usize) -> i32 {
        if digits > 2 {
            return year;
        }
        if (year as u32) < self.year_pivot {
            2000 + year
        } else {
            1900 + year
        }
    }

    /// 分隔符日期: 首段 4 位 → 年-月-日，否则 日-月-年
    fn parse_delimited(&self, text: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = text
            .split(|c| c == '-' || c == '/' || c == '.')
            .map(str::trim)
            .collect();
        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return None;
        }

        if parts[0].len() == 4 && is_digits(parts[0]) {
            let year: i32 = parts[0].parse().ok()?;
            let month = parse_month(parts[1])?;
            let day: u32 = digits_value(parts[2])?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }

        let day: u32 = digits_value(parts[0])?;
        let month = parse_month(parts[1])?;
        if !is_digits(parts[2]) || !(parts[2].len() == 2 || parts[2].len() == 4) {
            return None;
        }
        let year: i32 = parts[2].parse().ok()?;
        let year = self.expand_year(year, parts[2].len());
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

impl FieldNormalizer for ValueNormalizer {
    fn normalize_text(&self, cell: &CellValue) -> Option<String> {
        let text = cell.as_text();
        let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            None
        } else {
            Some(collapsed)
        }
    }

    fn normalize_date(&self, cell: &CellValue) -> Option<DateTime<Utc>> {
        let date = match cell {
            CellValue::Empty => None,
            CellValue::Number(n) => excel_serial_to_date(*n),
            CellValue::Text(s) => self.parse_date_text(s.trim()),
        }?;
        Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
    }

    fn normalize_decimal(&self, cell: &CellValue) -> Option<Decimal> {
        match cell {
            CellValue::Empty => None,
            CellValue::Number(n) => decimal_from_f64(*n),
            CellValue::Text(s) => parse_decimal_text(s),
        }
    }

    fn normalize_integer(&self, cell: &CellValue) -> Option<i64> {
        match cell {
            CellValue::Empty => None,
            CellValue::Number(n) if n.is_finite() && n.abs() < i64::MAX as f64 => {
                Some(n.trunc() as i64)
            }
            CellValue::Number(_) => None,
            CellValue::Text(s) => parse_integer_prefix(s),
        }
    }
}

impl ValueNormalizer {
    fn parse_date_text(&self, text: &str) -> Option<NaiveDate> {
        if text.is_empty() {
            return None;
        }

        // 纯数字文本按 Excel 序列号处理
        if text.chars().all(|c| c.is_ascii_digit() || c == '.')
            && text.chars().filter(|&c| c == '.').count() <= 1
        {
            return text.parse::<f64>().ok().and_then(excel_serial_to_date);
        }

        // 日期时间文本只取日期部分（"2025-08-06 10:30:00" / "2025-08-06T00:00:00Z"）
        let first_token = text.split_whitespace().next().unwrap_or(text);
        if let Some(date) = self.parse_delimited(first_token) {
            return Some(date);
        }
        if let Some((date_part, _)) = first_token.split_once('T') {
            if let Some(date) = self.parse_delimited(date_part) {
                return Some(date);
            }
        }

        NAMED_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
    }
}

// ==========================================
// Excel 序列号
// ==========================================
// 1900 纪元: Excel 把 1900 视为闰年，序列号 60 (1900-02-29) 不存在
// 序列号 >= 61 以 1899-12-30 为基准，< 60 以 1899-12-31 为基准
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > MAX_EXCEL_SERIAL {
        return None;
    }
    let days = serial.floor() as i64;
    let base = match days {
        60 => return None,
        d if d > 60 => NaiveDate::from_ymd_opt(1899, 12, 30)?,
        _ => NaiveDate::from_ymd_opt(1899, 12, 31)?,
    };
    base.checked_add_signed(Duration::days(days))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn digits_value(s: &str) -> Option<u32> {
    if is_digits(s) && s.len() <= 2 {
        s.parse().ok()
    } else {
        None
    }
}

/// 数字月份或英文月份名（取前三个字母）
fn parse_month(s: &str) -> Option<u32> {
    if is_digits(s) {
        return digits_value(s).filter(|m| (1..=12).contains(m));
    }
    let prefix: String = s.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

// ==========================================
// 小数 / 整数
// ==========================================

fn decimal_from_f64(n: f64) -> Option<Decimal> {
    if !n.is_finite() {
        return None;
    }
    Decimal::from_str(&format!("{}", n)).ok()
}

/// 去掉货币符号 / 百分号 / 千分位 / 空白 / 尾部 "/-"
fn strip_numeric_noise(raw: &str) -> String {
    let mut text = raw.trim().trim_end_matches("/-").trim().to_string();

    let mut negative = false;
    if let Some(rest) = text.strip_prefix('-') {
        negative = true;
        text = rest.trim_start().to_string();
    }

    let lower = text.to_lowercase();
    for prefix in CURRENCY_PREFIXES {
        if lower.starts_with(prefix) {
            text = text[prefix.len()..].to_string();
            break;
        }
    }

    let mut cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '%' | '\u{a0}') && !c.is_whitespace())
        .collect();
    if negative && !cleaned.starts_with('-') {
        cleaned.insert(0, '-');
    }
    cleaned
}

pub fn parse_decimal_text(raw: &str) -> Option<Decimal> {
    let cleaned = strip_numeric_noise(raw);
    let body = cleaned.strip_prefix('-').unwrap_or(&cleaned);
    let body = body.strip_prefix('+').unwrap_or(body);

    let dots = body.chars().filter(|&c| c == '.').count();
    let digits = body.chars().filter(char::is_ascii_digit).count();
    if digits == 0 || dots > 1 || body.chars().any(|c| !(c.is_ascii_digit() || c == '.')) {
        return None;
    }

    let normalized = if cleaned.starts_with('-') {
        format!("-{}", body)
    } else {
        body.to_string()
    };
    Decimal::from_str(&normalized).ok()
}

/// 取前导整数部分（"10 pcs" → 10，"1,200" → 1200，"12.00" → 12）
pub fn parse_integer_prefix(raw: &str) -> Option<i64> {
    let cleaned = strip_numeric_noise(raw);
    let (negative, body) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let digits: String = body.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let value: i64 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}
