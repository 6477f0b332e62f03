use super::scoring::score_consultant;
use super::{
    first_failing_gate, rank_order, AssignmentMatch, EligibilityCheck, IneligibilityReason,
    NoMatchReason, RankedConsultant,
};
use crate::domain::{
    entity_types, AssignmentSource, AssignmentStatus, AuditAction, ConsultantJobAssignment,
    ConsultantStatus, Job, SYSTEM_ACTOR,
};
use crate::engine::audit::AuditRecorder;
use crate::engine::error::AssignmentError;
use crate::engine::events::{OptionalNotificationPublisher, SalesEvent, SalesEventType};
use crate::engine::repositories::SalesRepositories;
use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

// ==========================================
// AutoAssignmentService - 顾问自动分配服务
// ==========================================
pub struct AutoAssignmentService {
    repos: SalesRepositories,
    audit: AuditRecorder,
    notifier: OptionalNotificationPublisher,
}

impl AutoAssignmentService {
    pub fn new(repos: SalesRepositories, notifier: OptionalNotificationPublisher) -> Self {
        Self {
            audit: AuditRecorder::new(repos.audit.clone()),
            repos,
            notifier,
        }
    }

    fn load_job(&self, job_id: &str) -> Result<Job, AssignmentError> {
        self.repos
            .jobs
            .find_by_id(job_id)?
            .ok_or_else(|| AssignmentError::JobNotFound(job_id.to_string()))
    }

    // ==========================================
    // 评分与准入 (只读)
    // ==========================================

    /// 为岗位选出最佳顾问
    ///
    /// # 返回
    /// - best = Some: 排名第一的顾问及得分说明
    /// - best = None: no_match 给出第一个适用的阻断原因
    #[instrument(skip(self))]
    pub fn find_best_match(&self, job_id: &str) -> Result<AssignmentMatch, AssignmentError> {
        let job = match self.repos.jobs.find_by_id(job_id)? {
            Some(job) => job,
            None => return Ok(AssignmentMatch::no_match(job_id, NoMatchReason::JobNotFound)),
        };
        let region_id = match job.region_id.as_deref() {
            Some(region) => region,
            None => return Ok(AssignmentMatch::no_match(job_id, NoMatchReason::JobHasNoRegion)),
        };

        let consultants = self.repos.consultants.list_by_region(region_id)?;
        if consultants.is_empty() {
            return Ok(AssignmentMatch::no_match(
                job_id,
                NoMatchReason::NoConsultantsInRegion,
            ));
        }

        let mut ranked = Vec::new();
        let mut recruiting = 0usize;
        let mut capacity_blocked = 0usize;
        for consultant in &consultants {
            if consultant.role.can_recruit() && consultant.status == ConsultantStatus::Active {
                recruiting += 1;
            }
            match first_failing_gate(&job, consultant) {
                Some(reason) => {
                    if reason.is_capacity() {
                        capacity_blocked += 1;
                    }
                    tracing::debug!(consultant_id = %consultant.id, %reason, "consultant filtered");
                }
                None => ranked.push(RankedConsultant {
                    consultant_id: consultant.id.clone(),
                    consultant_name: consultant.name.clone(),
                    score: score_consultant(consultant, job.category.as_deref()),
                }),
            }
        }

        if ranked.is_empty() {
            let reason = if recruiting > 0 && capacity_blocked == recruiting {
                NoMatchReason::AllAtCapacity
            } else {
                NoMatchReason::NoEligibleConsultants
            };
            return Ok(AssignmentMatch::no_match(job_id, reason));
        }

        ranked.sort_by(rank_order);
        let best = ranked[0].clone();
        let reason = format!("{} ({})", best.consultant_name, best.score.describe());
        tracing::info!(
            best = %best.consultant_id,
            total = best.score.total,
            candidates = ranked.len(),
            "best match found"
        );

        Ok(AssignmentMatch {
            job_id: job_id.to_string(),
            best: Some(best),
            ranked,
            no_match: None,
            reason,
        })
    }

    /// 单个顾问的准入检查 (不评分)
    ///
    /// 岗位或顾问不存在时返回不可分配结果, 不报错
    pub fn check_consultant_eligibility(
        &self,
        consultant_id: &str,
        job_id: &str,
    ) -> Result<EligibilityCheck, AssignmentError> {
        let job = match self.repos.jobs.find_by_id(job_id)? {
            Some(job) => job,
            None => {
                return Ok(EligibilityCheck::rejected(
                    consultant_id,
                    job_id,
                    IneligibilityReason::JobNotFound,
                ))
            }
        };
        let consultant = match self.repos.consultants.find_by_id(consultant_id)? {
            Some(c) => c,
            None => {
                return Ok(EligibilityCheck::rejected(
                    consultant_id,
                    job_id,
                    IneligibilityReason::ConsultantNotFound,
                ))
            }
        };

        Ok(match first_failing_gate(&job, &consultant) {
            Some(reason) => EligibilityCheck::rejected(consultant_id, job_id, reason),
            None => EligibilityCheck::eligible(consultant_id, job_id),
        })
    }

    // ==========================================
    // 分配 / 撤销
    // ==========================================

    /// 将顾问分配到岗位
    ///
    /// # 流程
    /// 1) 门槛检查
    /// 2) 条件 UPDATE 占用名额 (current_jobs < max_jobs)
    /// 3) 岗位负责人比较并交换, 失败则归还名额
    /// 4) 停用旧分配并归还旧顾问名额
    /// 5) 写入 ACTIVE 分配记录
    #[instrument(skip(self))]
    pub fn assign_consultant(
        &self,
        job_id: &str,
        consultant_id: &str,
        source: AssignmentSource,
        now: DateTime<Utc>,
    ) -> Result<ConsultantJobAssignment, AssignmentError> {
        let job = self.load_job(job_id)?;
        let consultant = self
            .repos
            .consultants
            .find_by_id(consultant_id)?
            .ok_or_else(|| AssignmentError::ConsultantNotFound(consultant_id.to_string()))?;

        let previous = self.repos.assignments.find_active_for_job(job_id)?;
        if let Some(active) = &previous {
            if active.consultant_id == consultant_id {
                return Ok(active.clone());
            }
        }

        if let Some(reason) = first_failing_gate(&job, &consultant) {
            if reason.is_capacity() {
                return Err(AssignmentError::CapacityExhausted(consultant_id.to_string()));
            }
            return Err(AssignmentError::NotEligible {
                consultant_id: consultant_id.to_string(),
                reason: reason.message().to_string(),
            });
        }

        if !self.repos.consultants.try_reserve_capacity(consultant_id, now)? {
            tracing::debug!("capacity re-check failed");
            return Err(AssignmentError::CapacityExhausted(consultant_id.to_string()));
        }

        if !self.repos.jobs.compare_and_set_assignee(
            job_id,
            job.assigned_consultant_id.as_deref(),
            Some(consultant_id),
            now,
        )? {
            self.repos.consultants.release_capacity(consultant_id, now)?;
            return Err(AssignmentError::ConcurrentUpdate(job_id.to_string()));
        }

        if let Some(active) = &previous {
            if self.repos.assignments.deactivate(&active.id, now)? {
                self.repos
                    .consultants
                    .release_capacity(&active.consultant_id, now)?;
                tracing::info!(previous = %active.consultant_id, "previous assignment deactivated");
            }
        }

        self.repos.assignments.upsert_active(&ConsultantJobAssignment {
            id: Uuid::new_v4().to_string(),
            consultant_id: consultant_id.to_string(),
            job_id: job_id.to_string(),
            status: AssignmentStatus::Active,
            assignment_source: source,
            pipeline_stage: None,
            pipeline_progress: 0,
            assigned_at: now,
            updated_at: now,
        })?;
        let assignment = self
            .repos
            .assignments
            .find_active_for_job(job_id)?
            .ok_or_else(|| AssignmentError::ConcurrentUpdate(job_id.to_string()))?;

        self.audit.record_change(
            entity_types::JOB,
            job_id,
            AuditAction::ConsultantAssigned,
            json!({ "assigned_consultant_id": job.assigned_consultant_id }),
            json!({
                "assigned_consultant_id": consultant_id,
                "assignment_source": source.to_db_str(),
            }),
            SYSTEM_ACTOR,
            now,
        );
        self.notifier.notify(
            SalesEvent::new(SalesEventType::ConsultantAssigned, entity_types::JOB, job_id)
                .to_recipient(consultant_id)
                .with_payload(json!({ "job_title": job.title })),
        );
        tracing::info!(source = source.to_db_str(), "consultant assigned");
        Ok(assignment)
    }

    /// 自动分配: 按排名依次尝试, 直到某个顾问的容量复核通过
    #[instrument(skip(self))]
    pub fn auto_assign(
        &self,
        job_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsultantJobAssignment, AssignmentError> {
        let matched = self.find_best_match(job_id)?;
        if let Some(reason) = matched.no_match {
            if reason == NoMatchReason::JobNotFound {
                return Err(AssignmentError::JobNotFound(job_id.to_string()));
            }
            return Err(AssignmentError::NoMatch {
                job_id: job_id.to_string(),
                reason: reason.message().to_string(),
            });
        }

        for candidate in &matched.ranked {
            match self.assign_consultant(job_id, &candidate.consultant_id, AssignmentSource::Auto, now)
            {
                Ok(assignment) => return Ok(assignment),
                Err(AssignmentError::CapacityExhausted(id))
                | Err(AssignmentError::NotEligible {
                    consultant_id: id, ..
                }) => {
                    tracing::debug!(consultant_id = %id, "candidate lost race, trying next");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AssignmentError::NoMatch {
            job_id: job_id.to_string(),
            reason: NoMatchReason::AllAtCapacity.message().to_string(),
        })
    }

    /// 撤销岗位的当前分配并归还名额
    #[instrument(skip(self))]
    pub fn deassign(
        &self,
        job_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ConsultantJobAssignment, AssignmentError> {
        let mut active = self
            .repos
            .assignments
            .find_active_for_job(job_id)?
            .ok_or_else(|| AssignmentError::NotAssigned(job_id.to_string()))?;

        if !self.repos.assignments.deactivate(&active.id, now)? {
            return Err(AssignmentError::ConcurrentUpdate(job_id.to_string()));
        }
        self.repos
            .consultants
            .release_capacity(&active.consultant_id, now)?;

        if !self.repos.jobs.compare_and_set_assignee(
            job_id,
            Some(active.consultant_id.as_str()),
            None,
            now,
        )? {
            tracing::warn!(
                consultant_id = %active.consultant_id,
                "job assignee already changed, leaving it untouched"
            );
        }

        self.audit.record_change(
            entity_types::JOB,
            job_id,
            AuditAction::ConsultantUnassigned,
            json!({ "assigned_consultant_id": active.consultant_id }),
            json!({ "assigned_consultant_id": null }),
            SYSTEM_ACTOR,
            now,
        );
        tracing::info!(consultant_id = %active.consultant_id, "consultant unassigned");

        active.status = AssignmentStatus::Inactive;
        active.updated_at = now;
        Ok(active)
    }
}
