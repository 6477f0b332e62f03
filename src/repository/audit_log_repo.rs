// ==========================================
// HRM8 销售引擎 - 审计日志数据仓储
// ==========================================
// 依据: audit_log 表 (migrations/v0.1_sales_engine.sql)
// 红线: 只追加, 不提供修改/删除
// ==========================================

mod core;
mod queries;

#[cfg(test)]
mod tests;

pub use core::AuditLogRepository;
