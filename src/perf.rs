use std::sync::OnceLock;
use std::time::Instant;

static PERF_ENABLED: OnceLock<bool> = OnceLock::new();

pub(crate) fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 阶段耗时日志开关
///
/// - Debug 默认开启；Release 默认关闭
/// - `PO_INGEST_PERF=1` 强制开启，`PO_INGEST_PERF=0` 强制关闭
pub fn perf_enabled() -> bool {
    *PERF_ENABLED.get_or_init(|| match std::env::var("PO_INGEST_PERF") {
        Ok(v) => is_true(&v),
        Err(_) => cfg!(debug_assertions),
    })
}

/// 解析阶段耗时 Guard：drop 时记录 stage + elapsed_ms（+ 行数）
///
/// 使用方式：
/// ```ignore
/// let _perf = po_ingest::perf::StageTimer::new("locate_table");
/// // do work...
/// ```
pub struct StageTimer {
    stage: &'static str,
    start: Instant,
    rows: Option<usize>,
}

impl StageTimer {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            start: Instant::now(),
            rows: None,
        }
    }

    /// 记录本阶段处理的行数
    pub fn rows(&mut self, rows: usize) {
        self.rows = Some(rows);
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        if !perf_enabled() {
            return;
        }
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        match self.rows {
            Some(rows) => tracing::info!(
                target: "perf",
                stage = self.stage,
                elapsed_ms,
                rows,
                "done"
            ),
            None => tracing::info!(target: "perf", stage = self.stage, elapsed_ms, "done"),
        }
    }
}
