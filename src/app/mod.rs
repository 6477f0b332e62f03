// ==========================================
// HRM8 销售引擎 - 应用层
// ==========================================
// 职责: 服务装配, 供二进制与宿主进程使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
