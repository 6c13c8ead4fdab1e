//! Collaboration service
//!
//! Every write follows the same cycle: load the program aggregate, let the
//! state engine plan the event, then commit the plan against the program
//! version it was planned from. When another writer got there first the
//! store refuses the commit and the cycle starts over from a fresh read, so
//! each committed change is what the engine would produce for some serial
//! order of the competing calls.

use crate::config::WorkflowConfig;
use crate::notifier::ChangeNotifier;
use crate::views::{CollaborationView, ProgramDetail, TransitionOutcome};
use chrono::{DateTime, Utc};
use collab_engine::{ProgramEvent, RowEvent, StateEngine, TransitionPlan};
use collab_storage::{AggregateCommit, CollabStorage, ProgramAggregate, StorageError};
use collab_types::{
    Actor, AdminAccount, AdminId, Audience, CollabError, CollabResult, Collaboration,
    CollaborationId, Guard, NewProgram, Program, ProgramChanged, ProgramId, ProgramStatus,
    ResponseDecision, SuperadminDecision, TransitionKind, WorkflowEvent,
};
use std::collections::HashMap;
use std::sync::Arc;

/// What one planning pass decided to write
enum Staged {
    /// Nothing to do; the call is answered from the loaded state
    Unchanged,
    Write {
        program: Program,
        rows: Vec<Collaboration>,
        transition: TransitionKind,
    },
}

impl Staged {
    fn from_plan(plan: &TransitionPlan, aggregate: &ProgramAggregate, at: DateTime<Utc>) -> Self {
        let mut program = aggregate.program.clone();
        let mut rows = aggregate.collaborations.clone();
        let touched = plan.apply(&mut program, &mut rows, at);
        rows.retain(|row| touched.contains(&row.collaboration_id));

        Staged::Write {
            program,
            rows,
            transition: plan.event.transition_kind(),
        }
    }
}

/// Workflow entry point shared by every API surface
pub struct CollaborationService {
    storage: Arc<dyn CollabStorage>,
    notifier: Arc<dyn ChangeNotifier>,
    engine: StateEngine,
    config: WorkflowConfig,
}

impl CollaborationService {
    pub fn new(
        storage: Arc<dyn CollabStorage>,
        notifier: Arc<dyn ChangeNotifier>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            storage,
            notifier,
            engine: StateEngine::new(),
            config,
        }
    }

    pub fn storage(&self) -> &Arc<dyn CollabStorage> {
        &self.storage
    }

    /// Create a draft program owned by the actor's organization.
    pub async fn create_program(&self, actor: &Actor, request: NewProgram) -> CollabResult<Program> {
        const ACTION: &str = "create programs";

        let account = self.account(actor, ACTION).await?;
        if account.is_superadmin() {
            return Err(CollabError::forbidden(
                &actor.admin_id,
                ACTION,
                "programs are owned by organization admins",
            ));
        }
        if request.title.trim().is_empty() {
            return Err(CollabError::Validation(
                "program title must not be empty".to_string(),
            ));
        }

        let program = Program::draft(request, account.organization_id, account.admin_id);
        self.storage
            .insert_program(program.clone())
            .await
            .map_err(persistence)?;

        tracing::info!(
            program_id = %program.program_id,
            owner = %program.owner_admin_id,
            "program created"
        );
        self.publish(
            &ProgramAggregate {
                program: program.clone(),
                collaborations: Vec::new(),
            },
            TransitionKind::Created,
        );
        Ok(program)
    }

    /// Invite an admin of another organization to co-host a program.
    ///
    /// Re-inviting an admin who already holds a live invite returns that
    /// invite and changes nothing.
    pub async fn invite_collaborator(
        &self,
        actor: &Actor,
        program_id: &ProgramId,
        invitee_admin_id: &AdminId,
    ) -> CollabResult<Collaboration> {
        const ACTION: &str = "invite collaborators";

        let inviter = self.account(actor, ACTION).await?;
        if &inviter.admin_id == invitee_admin_id {
            return Err(CollabError::Validation(
                "an admin cannot invite themselves".to_string(),
            ));
        }
        let invitee = self
            .storage
            .get_admin(invitee_admin_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| CollabError::Validation(format!("unknown admin {invitee_admin_id}")))?;
        if invitee.is_superadmin() {
            return Err(CollabError::Validation(format!(
                "{invitee_admin_id} is a superadmin and cannot collaborate"
            )));
        }

        let aggregate = self
            .run_transition(program_id, |aggregate| {
                let program = &aggregate.program;
                if inviter.organization_id != program.owning_organization_id {
                    return Err(CollabError::forbidden(
                        &inviter.admin_id,
                        ACTION,
                        format!("not an admin of {}", program.owning_organization_id),
                    ));
                }
                if invitee.organization_id == program.owning_organization_id {
                    return Err(CollabError::Validation(format!(
                        "{} belongs to the owning organization",
                        invitee.admin_id
                    )));
                }
                if aggregate
                    .collaborations
                    .iter()
                    .any(|row| row.invitee_admin_id == invitee.admin_id && row.status.is_live())
                {
                    return Ok(Staged::Unchanged);
                }

                let plan = self.engine.apply_program_event(
                    program,
                    &aggregate.collaborations,
                    ProgramEvent::Invite,
                )?;
                let mut next = program.clone();
                plan.apply(&mut next, &mut [], Utc::now());
                let row = Collaboration::invite(
                    program.program_id.clone(),
                    inviter.admin_id.clone(),
                    inviter.organization_id.clone(),
                    invitee.admin_id.clone(),
                    invitee.organization_id.clone(),
                );

                Ok(Staged::Write {
                    program: next,
                    rows: vec![row],
                    transition: TransitionKind::Invited,
                })
            })
            .await?;

        aggregate
            .collaborations
            .into_iter()
            .find(|row| &row.invitee_admin_id == invitee_admin_id && row.status.is_live())
            .ok_or_else(|| CollabError::Persistence("invite missing after commit".to_string()))
    }

    /// Accept or decline a pending invite. Only the invitee may respond.
    pub async fn respond_to_collaboration(
        &self,
        actor: &Actor,
        collaboration_id: &CollaborationId,
        decision: ResponseDecision,
    ) -> CollabResult<TransitionOutcome> {
        self.row_transition(actor, collaboration_id, RowEvent::from(decision))
            .await
    }

    /// Withdraw an accepted collaboration before the program is approved.
    pub async fn opt_out_of_collaboration(
        &self,
        actor: &Actor,
        collaboration_id: &CollaborationId,
    ) -> CollabResult<TransitionOutcome> {
        self.row_transition(actor, collaboration_id, RowEvent::OptOut)
            .await
    }

    /// Send a program with no outstanding invites to superadmin review.
    pub async fn submit_for_approval(
        &self,
        actor: &Actor,
        program_id: &ProgramId,
    ) -> CollabResult<Program> {
        const ACTION: &str = "submit programs";

        let account = self.account(actor, ACTION).await?;
        let aggregate = self
            .run_transition(program_id, |aggregate| {
                if account.organization_id != aggregate.program.owning_organization_id {
                    return Err(CollabError::forbidden(
                        &account.admin_id,
                        ACTION,
                        format!(
                            "not an admin of {}",
                            aggregate.program.owning_organization_id
                        ),
                    ));
                }
                let plan = self.engine.apply_program_event(
                    &aggregate.program,
                    &aggregate.collaborations,
                    ProgramEvent::Submit,
                )?;
                Ok(Staged::from_plan(&plan, aggregate, Utc::now()))
            })
            .await?;

        Ok(aggregate.program)
    }

    /// Approve or reject a program awaiting review.
    ///
    /// Guards are evaluated against the state the commit is based on. A guard
    /// that a collaborator can break after the superadmin loaded the queue (an
    /// opt-out, a fresh invite) surfaces as `PreconditionFailed`. Deciding on
    /// a draft or an already decided program stays `InvalidTransition`.
    pub async fn superadmin_decide(
        &self,
        actor: &Actor,
        program_id: &ProgramId,
        decision: SuperadminDecision,
    ) -> CollabResult<Program> {
        let action = WorkflowEvent::from(decision).as_str();
        let account = self.account(actor, action).await?;
        if !account.is_superadmin() {
            return Err(CollabError::forbidden(
                &actor.admin_id,
                action,
                "superadmin role required",
            ));
        }

        let event = ProgramEvent::from(decision);
        let aggregate = self
            .run_transition(program_id, |aggregate| {
                let plan = self.engine.apply_program_event(
                    &aggregate.program,
                    &aggregate.collaborations,
                    event,
                )?;
                Ok(Staged::from_plan(&plan, aggregate, Utc::now()))
            })
            .await
            .map_err(|err| match err {
                CollabError::InvalidTransition(rejection)
                    if broken_by_collaborators(&rejection.guard) =>
                {
                    CollabError::PreconditionFailed {
                        program_id: program_id.clone(),
                        reason: rejection.guard.to_string(),
                        rejection: Some(rejection),
                    }
                }
                other => other,
            })?;

        tracing::info!(
            program_id = %program_id,
            superadmin = %actor.admin_id,
            decision = %action,
            "superadmin decision recorded"
        );
        Ok(aggregate.program)
    }

    /// Every collaboration the admin sent or received, newest first, each
    /// resolved to the status that admin should see.
    pub async fn list_collaborations_for_admin(
        &self,
        admin_id: &AdminId,
    ) -> CollabResult<Vec<CollaborationView>> {
        let rows = self
            .storage
            .list_collaborations_for_admin(admin_id)
            .await
            .map_err(persistence)?;

        // Rows and program are taken from one snapshot per program so the
        // resolver never combines two different moments.
        let mut snapshots: HashMap<ProgramId, Option<ProgramAggregate>> = HashMap::new();
        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            if !snapshots.contains_key(&row.program_id) {
                let snapshot = self
                    .storage
                    .load_aggregate(&row.program_id)
                    .await
                    .map_err(persistence)?;
                snapshots.insert(row.program_id.clone(), snapshot);
            }
            let Some(Some(snapshot)) = snapshots.get(&row.program_id) else {
                continue;
            };
            let Some(current) = snapshot
                .collaborations
                .iter()
                .find(|candidate| candidate.collaboration_id == row.collaboration_id)
            else {
                continue;
            };
            if let Some(view) =
                CollaborationView::for_viewer(admin_id, current.clone(), &snapshot.program)
            {
                views.push(view);
            }
        }
        Ok(views)
    }

    /// Programs awaiting a superadmin decision.
    pub async fn superadmin_queue(&self, actor: &Actor) -> CollabResult<Vec<ProgramDetail>> {
        const ACTION: &str = "view the approval queue";

        let account = self.account(actor, ACTION).await?;
        if !account.is_superadmin() {
            return Err(CollabError::forbidden(
                &actor.admin_id,
                ACTION,
                "superadmin role required",
            ));
        }

        let programs = self
            .storage
            .list_programs_by_status(ProgramStatus::PendingSuperadminApproval)
            .await
            .map_err(persistence)?;

        let mut queue = Vec::with_capacity(programs.len());
        for program in programs {
            let snapshot = self
                .storage
                .load_aggregate(&program.program_id)
                .await
                .map_err(persistence)?;
            if let Some(snapshot) = snapshot
                .filter(|s| s.program.status == ProgramStatus::PendingSuperadminApproval)
            {
                queue.push(ProgramDetail::from(snapshot));
            }
        }
        Ok(queue)
    }

    /// A program, its rows and its aggregate effective status.
    pub async fn program_detail(&self, program_id: &ProgramId) -> CollabResult<ProgramDetail> {
        let aggregate = self.load(program_id).await?;
        Ok(ProgramDetail::from(aggregate))
    }

    /// [`Self::program_detail`] restricted to superadmins, admins of the
    /// owning organization and admins named on one of the program's rows.
    pub async fn program_detail_for(
        &self,
        actor: &Actor,
        program_id: &ProgramId,
    ) -> CollabResult<ProgramDetail> {
        const ACTION: &str = "view programs";

        let account = self.account(actor, ACTION).await?;
        let aggregate = self.load(program_id).await?;

        let visible = account.is_superadmin()
            || account.organization_id == aggregate.program.owning_organization_id
            || aggregate.collaborations.iter().any(|row| {
                row.inviter_admin_id == account.admin_id
                    || row.invitee_admin_id == account.admin_id
            });
        if !visible {
            return Err(CollabError::forbidden(
                &actor.admin_id,
                ACTION,
                format!("not a party to program {program_id}"),
            ));
        }
        Ok(ProgramDetail::from(aggregate))
    }

    /// Directory entry of the calling admin; unknown admins are refused.
    pub async fn admin_account(&self, actor: &Actor) -> CollabResult<AdminAccount> {
        self.account(actor, "use the workflow").await
    }

    async fn row_transition(
        &self,
        actor: &Actor,
        collaboration_id: &CollaborationId,
        event: RowEvent,
    ) -> CollabResult<TransitionOutcome> {
        let row = self
            .storage
            .get_collaboration(collaboration_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| CollabError::not_found("collaboration", collaboration_id))?;

        if row.invitee_admin_id != actor.admin_id {
            return Err(CollabError::forbidden(
                &actor.admin_id,
                WorkflowEvent::from(event).as_str(),
                "only the invited admin may act on this collaboration",
            ));
        }

        let aggregate = self
            .run_transition(&row.program_id, |aggregate| {
                let plan = self.engine.apply_row_event(
                    &aggregate.program,
                    &aggregate.collaborations,
                    collaboration_id,
                    event,
                )?;
                Ok(Staged::from_plan(&plan, aggregate, Utc::now()))
            })
            .await?;

        let collaboration = aggregate
            .collaborations
            .iter()
            .find(|row| &row.collaboration_id == collaboration_id)
            .cloned()
            .ok_or_else(|| CollabError::not_found("collaboration", collaboration_id))?;

        Ok(TransitionOutcome {
            collaboration,
            program: aggregate.program,
        })
    }

    /// Load, plan and commit until the commit lands on the version it was
    /// planned from.
    ///
    /// A rejection on the first pass is the caller's own mistake. A rejection
    /// after a lost race means the state moved under the caller, which is
    /// reported as `PreconditionFailed`.
    async fn run_transition<F>(
        &self,
        program_id: &ProgramId,
        mut stage: F,
    ) -> CollabResult<ProgramAggregate>
    where
        F: FnMut(&ProgramAggregate) -> CollabResult<Staged>,
    {
        let attempts = self.config.max_commit_attempts.max(1);

        for attempt in 1..=attempts {
            let aggregate = self.load(program_id).await?;

            let staged = match stage(&aggregate) {
                Ok(staged) => staged,
                Err(CollabError::InvalidTransition(rejection)) if attempt > 1 => {
                    return Err(CollabError::PreconditionFailed {
                        program_id: program_id.clone(),
                        reason: format!("state changed concurrently: {}", rejection.guard),
                        rejection: Some(rejection),
                    });
                }
                Err(err) => return Err(err),
            };

            let Staged::Write {
                program,
                rows,
                transition,
            } = staged
            else {
                return Ok(aggregate);
            };

            let commit = AggregateCommit::new(program, aggregate.program.version)
                .with_collaborations(rows.iter().cloned());

            match self.storage.commit_aggregate(commit).await {
                Ok(committed) => {
                    let aggregate = merge(aggregate, committed, rows);
                    tracing::info!(
                        program_id = %program_id,
                        version = aggregate.program.version,
                        transition = ?transition,
                        program_status = %aggregate.program.status,
                        "collaboration transition committed"
                    );
                    self.publish(&aggregate, transition);
                    return Ok(aggregate);
                }
                Err(StorageError::VersionConflict {
                    expected, found, ..
                }) => {
                    tracing::debug!(
                        program_id = %program_id,
                        attempt,
                        expected,
                        found,
                        "program changed before commit, planning again"
                    );
                }
                Err(StorageError::NotFound(_)) => {
                    return Err(CollabError::not_found("program", program_id));
                }
                Err(StorageError::Conflict(reason)) => {
                    return Err(CollabError::PreconditionFailed {
                        program_id: program_id.clone(),
                        reason,
                        rejection: None,
                    });
                }
                Err(err) => return Err(persistence(err)),
            }
        }

        tracing::warn!(
            program_id = %program_id,
            attempts,
            "giving up after repeated commit conflicts"
        );
        Err(CollabError::PreconditionFailed {
            program_id: program_id.clone(),
            reason: format!("program changed concurrently on each of {attempts} attempts"),
            rejection: None,
        })
    }

    async fn load(&self, program_id: &ProgramId) -> CollabResult<ProgramAggregate> {
        self.storage
            .load_aggregate(program_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| CollabError::not_found("program", program_id))
    }

    async fn account(&self, actor: &Actor, action: &str) -> CollabResult<AdminAccount> {
        self.storage
            .get_admin(&actor.admin_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| CollabError::forbidden(&actor.admin_id, action, "unknown admin"))
    }

    fn publish(&self, aggregate: &ProgramAggregate, transition: TransitionKind) {
        let mut audiences = vec![Audience::Admin(aggregate.program.owner_admin_id.clone())];
        for row in &aggregate.collaborations {
            for admin_id in [&row.inviter_admin_id, &row.invitee_admin_id] {
                let audience = Audience::Admin(admin_id.clone());
                if !audiences.contains(&audience) {
                    audiences.push(audience);
                }
            }
        }
        audiences.push(Audience::SuperadminQueue);

        self.notifier.publish(ProgramChanged {
            program_id: aggregate.program.program_id.clone(),
            version: aggregate.program.version,
            transition,
            program_status: aggregate.program.status,
            audiences,
            occurred_at: aggregate.program.updated_at,
        });
    }
}

fn merge(
    mut aggregate: ProgramAggregate,
    program: Program,
    rows: Vec<Collaboration>,
) -> ProgramAggregate {
    aggregate.program = program;
    for row in rows {
        match aggregate
            .collaborations
            .iter_mut()
            .find(|existing| existing.collaboration_id == row.collaboration_id)
        {
            Some(existing) => *existing = row,
            None => aggregate.collaborations.push(row),
        }
    }
    aggregate
}

/// Guards on a superadmin decision that a collaborator's action can break
/// between the queue read and the decision.
fn broken_by_collaborators(guard: &Guard) -> bool {
    matches!(
        guard,
        Guard::UnanimityBroken { .. }
            | Guard::ProgramPhaseMismatch {
                found: ProgramStatus::PendingCollaboration,
                ..
            }
    )
}

fn persistence(err: StorageError) -> CollabError {
    CollabError::Persistence(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_storage::InMemoryCollabStorage;
    use collab_types::CollaborationStatus;

    #[test]
    fn merge_replaces_known_rows_and_appends_new_ones() {
        let program = Program::draft(
            NewProgram::new("Soup kitchen"),
            collab_types::OrganizationId::new("org-a"),
            AdminId::new("alice"),
        );
        let invite = |who: &str| {
            Collaboration::invite(
                program.program_id.clone(),
                AdminId::new("alice"),
                collab_types::OrganizationId::new("org-a"),
                AdminId::new(who),
                collab_types::OrganizationId::new(format!("org-{who}")),
            )
        };
        let bob = invite("bob");
        let carol = invite("carol");
        let aggregate = ProgramAggregate {
            program: program.clone(),
            collaborations: vec![bob.clone()],
        };

        let mut accepted = bob.clone();
        accepted.status = CollaborationStatus::Accepted;
        let merged = merge(aggregate, program, vec![accepted, carol.clone()]);

        assert_eq!(merged.collaborations.len(), 2);
        assert_eq!(merged.collaborations[0].status, CollaborationStatus::Accepted);
        assert_eq!(merged.collaborations[1], carol);
    }

    #[tokio::test]
    async fn unknown_actor_is_forbidden() {
        let service = CollaborationService::new(
            Arc::new(InMemoryCollabStorage::new()),
            Arc::new(crate::BroadcastNotifier::new(4)),
            WorkflowConfig::default(),
        );
        let err = service
            .create_program(&Actor::new("ghost"), NewProgram::new("Anything"))
            .await
            .unwrap_err();
        assert!(matches!(err, CollabError::Forbidden { .. }));
    }
}
