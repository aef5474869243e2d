use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::feed::{decode_feed, parse_inventory_snapshot, parse_product_master};
use crate::models::{
    CountSheet, InventorySnapshotEntry, Observation, ProductMasterEntry, ReconReport, RowUpdate,
    SheetKind, SheetSummary, SpreadsheetImport,
};
use crate::service::aggregator::{classify, master_keys, RowOutcome};
use crate::service::engine;
use crate::service::normalizer::{optical_sheet, parse_extraction, parse_import_csv, spreadsheet_sheet};

/// 一次棚卸作业的累积输入
///
/// 主数据重新上传时整体替换; 表和行可以在审核时修改或删除。
#[derive(Debug, Clone)]
pub struct Session {
    /// 最近一次访问时间, 空闲清理用
    pub last_active: DateTime<Utc>,
    pub product_master: Vec<ProductMasterEntry>,
    pub snapshot: Vec<InventorySnapshotEntry>,
    pub sheets: Vec<CountSheet>,
    /// 已导入的 OCR 表数量, 只增不减, 用于占位シートNo
    optical_ingested: usize,
    next_sheet_id: u64,
}

impl Session {
    fn new() -> Self {
        Self {
            last_active: Utc::now(),
            product_master: Vec::new(),
            snapshot: Vec::new(),
            sheets: Vec::new(),
            optical_ingested: 0,
            next_sheet_id: 1,
        }
    }

    fn allocate_sheet_id(&mut self) -> u64 {
        let id = self.next_sheet_id;
        self.next_sheet_id += 1;
        id
    }

    fn sheet_mut(&mut self, session: u64, sheet: u64) -> AppResult<&mut CountSheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.id == sheet)
            .ok_or(AppError::SheetNotFound { session, sheet })
    }

    fn row_mut(&mut self, session: u64, sheet: u64, row: usize) -> AppResult<&mut Observation> {
        self.sheet_mut(session, sheet)?
            .observations
            .get_mut(row)
            .ok_or(AppError::RowNotFound { sheet, row })
    }

    /// 全部实盘记录: 先 OCR 表, 再 EC 表, 各自按导入顺序
    pub fn observations(&self) -> Vec<Observation> {
        let optical = self.sheets.iter().filter(|s| s.kind == SheetKind::Optical);
        let spreadsheet = self.sheets.iter().filter(|s| s.kind == SheetKind::Spreadsheet);
        optical
            .chain(spreadsheet)
            .flat_map(|s| s.observations.iter().cloned())
            .collect()
    }

    fn summarize(&self, sheet: &CountSheet, keys: &HashSet<String>) -> SheetSummary {
        SheetSummary {
            sheet_id: sheet.id,
            kind: sheet.kind,
            file_name: sheet.file_name.clone(),
            label: sheet.label.clone(),
            department: sheet.department.clone(),
            rows: sheet.observations.len(),
            unmatched: sheet
                .observations
                .iter()
                .filter(|o| classify(o, keys) == RowOutcome::Unmatched)
                .count(),
        }
    }
}

/// 棚卸突合服务: 会话存储 + 引擎入口
pub struct StocktakeService {
    config: AppConfig,
    sessions: DashMap<u64, Session>,
    next_id: AtomicU64,
}

impl StocktakeService {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn create_session(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.insert(id, Session::new());
        tracing::info!("Session {} created", id);
        id
    }

    pub fn delete_session(&self, id: u64) -> AppResult<()> {
        self.sessions
            .remove(&id)
            .map(|_| tracing::info!("Session {} deleted", id))
            .ok_or(AppError::SessionNotFound(id))
    }

    /// 上传 商品マスタ, 替换原有数据, 返回有效行数
    pub fn load_product_master(&self, id: u64, bytes: &[u8]) -> AppResult<usize> {
        let text = decode_feed(bytes, &self.config.feed.encoding)?;
        let items = parse_product_master(&text, &self.config.feed.master);
        let count = items.len();

        self.with_session(id, |s| s.product_master = items)?;
        tracing::info!("Session {}: 商品マスタ loaded, {} items", id, count);
        Ok(count)
    }

    /// 上传 在庫一覧, 替换原有数据, 返回有效行数
    pub fn load_inventory_snapshot(&self, id: u64, bytes: &[u8]) -> AppResult<usize> {
        let text = decode_feed(bytes, &self.config.feed.encoding)?;
        let items = parse_inventory_snapshot(&text, &self.config.feed.snapshot);
        let count = items.len();

        self.with_session(id, |s| s.snapshot = items)?;
        tracing::info!("Session {}: 在庫一覧 loaded, {} items", id, count);
        Ok(count)
    }

    /// 追加一张 OCR 棚卸表
    pub fn ingest_extraction(&self, id: u64, file_name: &str, text: &str) -> AppResult<SheetSummary> {
        let result = parse_extraction(text)?;

        let summary = self.with_session(id, |s| {
            let sheet_id = s.allocate_sheet_id();
            let sheet = optical_sheet(sheet_id, file_name, result, s.optical_ingested);
            s.optical_ingested += 1;
            let summary = s.summarize(&sheet, &master_keys(&s.product_master));
            s.sheets.push(sheet);
            summary
        })?;

        tracing::info!(
            "Session {}: OCR sheet {} ({}) ingested, {} rows, {} unmatched",
            id, summary.label, file_name, summary.rows, summary.unmatched
        );
        Ok(summary)
    }

    /// 追加一张 EC 表格
    pub fn ingest_import(&self, id: u64, file_name: &str, import: SpreadsheetImport) -> AppResult<SheetSummary> {
        let summary = self.with_session(id, |s| {
            let sheet_id = s.allocate_sheet_id();
            let sheet = spreadsheet_sheet(sheet_id, file_name, import, &self.config.import);
            let summary = s.summarize(&sheet, &master_keys(&s.product_master));
            s.sheets.push(sheet);
            summary
        })?;

        tracing::info!(
            "Session {}: spreadsheet {} ({}) imported, {} rows",
            id, summary.label, file_name, summary.rows
        );
        Ok(summary)
    }

    pub fn ingest_import_csv(&self, id: u64, file_name: &str, text: &str) -> AppResult<SheetSummary> {
        let import = parse_import_csv(text)?;
        self.ingest_import(id, file_name, import)
    }

    /// 各表概要, 品番エラー数按当前 商品マスタ 计算
    pub fn sheets(&self, id: u64) -> AppResult<Vec<SheetSummary>> {
        self.with_session(id, |s| {
            let keys = master_keys(&s.product_master);
            s.sheets.iter().map(|sheet| s.summarize(sheet, &keys)).collect()
        })
    }

    /// 单张表的全部行 (审核用)
    pub fn sheet(&self, id: u64, sheet_id: u64) -> AppResult<CountSheet> {
        self.with_session(id, |s| s.sheet_mut(id, sheet_id).map(|sheet| sheet.clone()))?
    }

    /// 删除一张表; 占位シートNo 计数器不回退
    pub fn delete_sheet(&self, id: u64, sheet_id: u64) -> AppResult<()> {
        self.with_session(id, |s| {
            let pos = s
                .sheets
                .iter()
                .position(|sheet| sheet.id == sheet_id)
                .ok_or(AppError::SheetNotFound { session: id, sheet: sheet_id })?;
            s.sheets.remove(pos);
            Ok::<_, AppError>(())
        })??;
        tracing::info!("Session {}: sheet {} deleted", id, sheet_id);
        Ok(())
    }

    /// 修改一行, 返回修改后的记录
    pub fn update_row(&self, id: u64, sheet_id: u64, row: usize, update: RowUpdate) -> AppResult<Observation> {
        let updated = self.with_session(id, |s| {
            let obs = s.row_mut(id, sheet_id, row)?;
            update.apply(obs);
            Ok::<_, AppError>(obs.clone())
        })??;
        tracing::info!("Session {}: sheet {} row {} updated", id, sheet_id, row);
        Ok(updated)
    }

    /// 删除一行, 后面的行下标前移
    pub fn delete_row(&self, id: u64, sheet_id: u64, row: usize) -> AppResult<Observation> {
        let removed = self.with_session(id, |s| {
            let sheet = s.sheet_mut(id, sheet_id)?;
            if row >= sheet.observations.len() {
                return Err(AppError::RowNotFound { sheet: sheet_id, row });
            }
            Ok::<_, AppError>(sheet.observations.remove(row))
        })??;
        tracing::info!("Session {}: sheet {} row {} deleted", id, sheet_id, row);
        Ok(removed)
    }

    /// 对会话当前累积的全部数据做一次突合
    pub fn reconcile(&self, id: u64) -> AppResult<ReconReport> {
        // 先复制输入再释放锁, 引擎运行期间不持有会话
        let (master, snapshot, observations) = self.with_session(id, |s| {
            (s.product_master.clone(), s.snapshot.clone(), s.observations())
        })?;
        Ok(engine::reconcile(&master, &snapshot, &observations))
    }

    /// 清理空闲超过 ttl 的会话, 返回清理数量
    pub fn expire_idle_sessions(&self, ttl: Duration) -> usize {
        let now = Utc::now();
        let mut expired = 0usize;
        self.sessions.retain(|id, s| {
            let keep = now - s.last_active < ttl;
            if !keep {
                tracing::info!("Session {} expired (idle since {})", id, s.last_active);
                expired += 1;
            }
            keep
        });
        expired
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn with_session<T>(&self, id: u64, f: impl FnOnce(&mut Session) -> T) -> AppResult<T> {
        let mut guard = self.sessions.get_mut(&id).ok_or_else(|| {
            tracing::warn!("Session {} not found", id);
            AppError::SessionNotFound(id)
        })?;
        let session = guard.value_mut();
        session.last_active = Utc::now();
        Ok(f(session))
    }
}
