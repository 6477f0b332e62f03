// ==========================================
// HRM8 销售引擎 - 通知事件发布
// ==========================================
// 职责: 定义通知发布 trait, 实现依赖倒置
// 说明: 引擎层定义 trait, 通知投递方 (邮件/站内信) 实现适配器
// 红线: 通知失败只记录日志, 不得中断触发它的业务操作
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 通知事件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesEventType {
    AttributionLocked,
    AttributionTransferred,
    /// 归属锁即将到期, 可跟进续约
    RenewalOpportunity,
    CommissionCreated,
    CommissionConfirmed,
    CommissionPaid,
    CommissionCancelled,
    CommissionExpired,
    ConsultantAssigned,
    RevenueConfirmed,
    RevenuePaid,
    LicenseeStatusChanged,
    /// CRITICAL 级合规告警
    ComplianceCritical,
}

impl SalesEventType {
    pub fn as_str(&self) -> &str {
        match self {
            SalesEventType::AttributionLocked => "AttributionLocked",
            SalesEventType::AttributionTransferred => "AttributionTransferred",
            SalesEventType::RenewalOpportunity => "RenewalOpportunity",
            SalesEventType::CommissionCreated => "CommissionCreated",
            SalesEventType::CommissionConfirmed => "CommissionConfirmed",
            SalesEventType::CommissionPaid => "CommissionPaid",
            SalesEventType::CommissionCancelled => "CommissionCancelled",
            SalesEventType::CommissionExpired => "CommissionExpired",
            SalesEventType::ConsultantAssigned => "ConsultantAssigned",
            SalesEventType::RevenueConfirmed => "RevenueConfirmed",
            SalesEventType::RevenuePaid => "RevenuePaid",
            SalesEventType::LicenseeStatusChanged => "LicenseeStatusChanged",
            SalesEventType::ComplianceCritical => "ComplianceCritical",
        }
    }
}

/// 通知事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesEvent {
    pub event_type: SalesEventType,
    pub entity_type: String,
    pub entity_id: String,
    /// 接收方 (顾问 id / 被许可方 id), None 表示运营方
    pub recipient_id: Option<String>,
    pub payload: JsonValue,
}

impl SalesEvent {
    pub fn new(event_type: SalesEventType, entity_type: &str, entity_id: &str) -> Self {
        Self {
            event_type,
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            recipient_id: None,
            payload: JsonValue::Null,
        }
    }

    pub fn to_recipient(mut self, recipient_id: impl Into<String>) -> Self {
        self.recipient_id = Some(recipient_id.into());
        self
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = payload;
        self
    }
}

// ==========================================
// 通知发布 Trait
// ==========================================

/// 通知发布者
///
/// # 返回
/// - `Ok(message_id)`: 投递方返回的消息 ID (不支持时为空字符串)
pub trait NotificationPublisher: Send + Sync {
    fn publish(&self, event: SalesEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作发布者 (单元测试 / 未接入通知服务)
#[derive(Debug, Clone, Default)]
pub struct NoOpNotificationPublisher;

impl NotificationPublisher for NoOpNotificationPublisher {
    fn publish(&self, event: SalesEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            event_type = event.event_type.as_str(),
            entity_id = %event.entity_id,
            "NoOpNotificationPublisher: skipping notification"
        );
        Ok(String::new())
    }
}

/// 可选的发布者包装
///
/// 简化 Option<Arc<dyn NotificationPublisher>> 的使用
#[derive(Clone)]
pub struct OptionalNotificationPublisher {
    inner: Option<Arc<dyn NotificationPublisher>>,
}

impl OptionalNotificationPublisher {
    pub fn with_publisher(publisher: Arc<dyn NotificationPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    pub fn publish(&self, event: SalesEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    event_type = event.event_type.as_str(),
                    entity_id = %event.entity_id,
                    "no notification publisher configured, skipping"
                );
                Ok(String::new())
            }
        }
    }

    /// 尽力发布: 失败时记录 warn 并返回 false
    pub fn notify(&self, event: SalesEvent) -> bool {
        let event_type = event.event_type;
        let entity_id = event.entity_id.clone();
        match self.publish(event) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    event_type = event_type.as_str(),
                    entity_id = %entity_id,
                    error = %e,
                    "notification failed"
                );
                false
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalNotificationPublisher {
    fn default() -> Self {
        Self::none()
    }
}
