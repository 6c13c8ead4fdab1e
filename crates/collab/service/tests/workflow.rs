use collab_service::{ChangeNotifier, CollaborationService, WorkflowConfig};
use collab_storage::InMemoryCollabStorage;
use collab_types::*;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingNotifier {
    changes: Mutex<Vec<ProgramChanged>>,
}

impl RecordingNotifier {
    fn transitions(&self) -> Vec<TransitionKind> {
        self.changes
            .lock()
            .unwrap()
            .iter()
            .map(|change| change.transition)
            .collect()
    }

    fn last(&self) -> ProgramChanged {
        self.changes.lock().unwrap().last().cloned().unwrap()
    }

    fn count(&self) -> usize {
        self.changes.lock().unwrap().len()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn publish(&self, change: ProgramChanged) {
        self.changes.lock().unwrap().push(change);
    }
}

async fn setup() -> (CollaborationService, Arc<RecordingNotifier>) {
    let storage = InMemoryCollabStorage::new()
        .with_admins([
            AdminAccount::organization_admin("alice", "org-a"),
            AdminAccount::organization_admin("alice-deputy", "org-a"),
            AdminAccount::organization_admin("bob", "org-b"),
            AdminAccount::organization_admin("carol", "org-c"),
            AdminAccount::superadmin("root"),
        ])
        .await;
    let notifier = Arc::new(RecordingNotifier::default());
    let service = CollaborationService::new(
        Arc::new(storage),
        notifier.clone(),
        WorkflowConfig::default(),
    );
    (service, notifier)
}

fn alice() -> Actor {
    Actor::new("alice")
}

fn bob() -> Actor {
    Actor::new("bob")
}

fn carol() -> Actor {
    Actor::new("carol")
}

fn root() -> Actor {
    Actor::new("root")
}

/// Draft program owned by alice with pending invites to bob and carol
async fn two_invites(service: &CollaborationService) -> (Program, Collaboration, Collaboration) {
    let program = service
        .create_program(&alice(), NewProgram::new("Harbour cleanup").with_category("environment"))
        .await
        .unwrap();
    let bob_row = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("bob"))
        .await
        .unwrap();
    let carol_row = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("carol"))
        .await
        .unwrap();
    (program, bob_row, carol_row)
}

#[tokio::test]
async fn unanimous_acceptance_escalates_and_approval_goes_live() {
    let (service, notifier) = setup().await;
    let (program, bob_row, carol_row) = two_invites(&service).await;

    let first = service
        .respond_to_collaboration(&bob(), &bob_row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap();
    assert_eq!(first.collaboration.status, CollaborationStatus::Accepted);
    assert!(first.collaboration.responded_at.is_some());
    assert_eq!(first.program.status, ProgramStatus::PendingCollaboration);

    let bob_view = &service
        .list_collaborations_for_admin(&AdminId::new("bob"))
        .await
        .unwrap()[0];
    assert_eq!(bob_view.request_type, RequestType::Received);
    assert_eq!(bob_view.status_label, "Waiting on other collaborators");
    assert!(bob_view.allowed_actions.can_opt_out);

    let second = service
        .respond_to_collaboration(&carol(), &carol_row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap();
    assert_eq!(second.program.status, ProgramStatus::PendingSuperadminApproval);

    let queue = service.superadmin_queue(&root()).await.unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].program.program_id, program.program_id);
    assert_eq!(queue[0].effective_status, EffectiveStatus::PendingSuperadminApproval);

    let approved = service
        .superadmin_decide(&root(), &program.program_id, SuperadminDecision::Approve)
        .await
        .unwrap();
    assert_eq!(approved.status, ProgramStatus::Approved);
    assert!(service.superadmin_queue(&root()).await.unwrap().is_empty());

    let inviter_views = service
        .list_collaborations_for_admin(&AdminId::new("alice"))
        .await
        .unwrap();
    assert_eq!(inviter_views.len(), 2);
    for view in &inviter_views {
        assert_eq!(view.request_type, RequestType::Sent);
        assert_eq!(view.effective_status, EffectiveStatus::Approved);
        assert!(!view.allowed_actions.any());
    }

    assert_eq!(
        notifier.transitions(),
        vec![
            TransitionKind::Created,
            TransitionKind::Invited,
            TransitionKind::Invited,
            TransitionKind::Accepted,
            TransitionKind::Accepted,
            TransitionKind::Approved,
        ]
    );
    let last = notifier.last();
    assert_eq!(last.version, approved.version);
    assert!(last.addresses(&AdminId::new("alice")));
    assert!(last.addresses(&AdminId::new("bob")));
    assert!(last.addresses(&AdminId::new("carol")));
    assert!(last.addresses_superadmin_queue());
}

#[tokio::test]
async fn one_decline_kills_the_collaboration() {
    let (service, _notifier) = setup().await;
    let (program, bob_row, carol_row) = two_invites(&service).await;

    service
        .respond_to_collaboration(&bob(), &bob_row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap();
    let declined = service
        .respond_to_collaboration(&carol(), &carol_row.collaboration_id, ResponseDecision::Decline)
        .await
        .unwrap();
    assert_eq!(declined.collaboration.status, CollaborationStatus::Declined);
    assert_eq!(declined.program.status, ProgramStatus::Declined);

    let detail = service.program_detail(&program.program_id).await.unwrap();
    assert_eq!(detail.effective_status, EffectiveStatus::Declined);
    let bob_now = detail
        .collaborations
        .iter()
        .find(|row| row.collaboration_id == bob_row.collaboration_id)
        .unwrap();
    assert_eq!(bob_now.status, CollaborationStatus::Superseded);
    assert!(bob_now.responded_at.is_some());

    let bob_view = &service
        .list_collaborations_for_admin(&AdminId::new("bob"))
        .await
        .unwrap()[0];
    assert_eq!(bob_view.effective_status, EffectiveStatus::Declined);
    assert!(!bob_view.allowed_actions.any());

    let err = service
        .opt_out_of_collaboration(&bob(), &bob_row.collaboration_id)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::InvalidTransition(_)));

    let err = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("bob"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.rejection().map(|r| &r.guard),
        Some(Guard::ProgramClosed { .. })
    ));
}

#[tokio::test]
async fn duplicate_invite_returns_the_live_row_silently() {
    let (service, notifier) = setup().await;
    let program = service
        .create_program(&alice(), NewProgram::new("Library tutoring"))
        .await
        .unwrap();

    let first = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("bob"))
        .await
        .unwrap();
    let again = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("bob"))
        .await
        .unwrap();

    assert_eq!(first.collaboration_id, again.collaboration_id);
    assert_eq!(notifier.count(), 2);
    assert_eq!(
        service
            .program_detail(&program.program_id)
            .await
            .unwrap()
            .collaborations
            .len(),
        1
    );
}

#[tokio::test]
async fn opt_out_reopens_escalation_and_stale_approve_fails() {
    let (service, notifier) = setup().await;
    let (program, bob_row, carol_row) = two_invites(&service).await;
    for (actor, row) in [(bob(), &bob_row), (carol(), &carol_row)] {
        service
            .respond_to_collaboration(&actor, &row.collaboration_id, ResponseDecision::Accept)
            .await
            .unwrap();
    }
    let queued = service.superadmin_queue(&root()).await.unwrap();
    assert_eq!(queued.len(), 1);

    let opted = service
        .opt_out_of_collaboration(&carol(), &carol_row.collaboration_id)
        .await
        .unwrap();
    assert_eq!(opted.collaboration.status, CollaborationStatus::OptedOut);
    assert_eq!(opted.program.status, ProgramStatus::PendingCollaboration);

    let signals = notifier.count();
    let err = service
        .superadmin_decide(&root(), &program.program_id, SuperadminDecision::Approve)
        .await
        .unwrap_err();
    match err {
        CollabError::PreconditionFailed { rejection, .. } => {
            assert!(rejection.is_some());
        }
        other => panic!("expected PreconditionFailed, got {other:?}"),
    }
    assert_eq!(notifier.count(), signals);

    let carol_view = &service
        .list_collaborations_for_admin(&AdminId::new("carol"))
        .await
        .unwrap()[0];
    assert_eq!(carol_view.status_label, "Opted Out");
}

#[tokio::test]
async fn superadmin_rejection_is_shown_to_the_inviter() {
    let (service, _notifier) = setup().await;
    let program = service
        .create_program(&alice(), NewProgram::new("Park restoration"))
        .await
        .unwrap();
    let row = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("bob"))
        .await
        .unwrap();
    service
        .respond_to_collaboration(&bob(), &row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap();

    let rejected = service
        .superadmin_decide(&root(), &program.program_id, SuperadminDecision::Reject)
        .await
        .unwrap();
    assert_eq!(rejected.status, ProgramStatus::Rejected);

    let view = &service
        .list_collaborations_for_admin(&AdminId::new("alice"))
        .await
        .unwrap()[0];
    assert_eq!(view.status_label, "Rejected by Superadmin");

    let err = service
        .superadmin_decide(&root(), &program.program_id, SuperadminDecision::Approve)
        .await
        .unwrap_err();
    match err {
        CollabError::InvalidTransition(rejection) => assert_eq!(
            rejection.guard,
            Guard::ProgramClosed {
                status: ProgramStatus::Rejected
            }
        ),
        other => panic!("expected InvalidTransition, got {other:?}"),
    }
}

#[tokio::test]
async fn deciding_a_draft_is_an_invalid_transition() {
    let (service, notifier) = setup().await;
    let program = service
        .create_program(&alice(), NewProgram::new("Toy drive"))
        .await
        .unwrap();
    let signals = notifier.count();

    let err = service
        .superadmin_decide(&root(), &program.program_id, SuperadminDecision::Approve)
        .await
        .unwrap_err();
    match err {
        CollabError::InvalidTransition(rejection) => assert!(matches!(
            rejection.guard,
            Guard::ProgramPhaseMismatch {
                found: ProgramStatus::Draft,
                ..
            }
        )),
        other => panic!("expected InvalidTransition, got {other:?}"),
    }
    assert_eq!(notifier.count(), signals);
}

#[tokio::test]
async fn withdrawn_collaborator_keeps_the_program_out_of_review() {
    let (service, _notifier) = setup().await;
    let program = service
        .create_program(&alice(), NewProgram::new("Senior tech help"))
        .await
        .unwrap();
    let bob_row = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("bob"))
        .await
        .unwrap();
    service
        .respond_to_collaboration(&bob(), &bob_row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap();
    let opted = service
        .opt_out_of_collaboration(&bob(), &bob_row.collaboration_id)
        .await
        .unwrap();
    assert_eq!(opted.program.status, ProgramStatus::PendingCollaboration);

    let detail = service.program_detail(&program.program_id).await.unwrap();
    assert_eq!(detail.effective_status, EffectiveStatus::CollaboratorWithdrawn);
    assert_eq!(detail.status_label, "Collaborator Withdrawn");

    let err = service
        .submit_for_approval(&alice(), &program.program_id)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CollabError::InvalidTransition(TransitionRejection {
            guard: Guard::CollaboratorsOutstanding { .. },
            ..
        })
    ));

    // A fresh collaborator accepting does not paper over the withdrawal.
    let carol_row = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("carol"))
        .await
        .unwrap();
    let accepted = service
        .respond_to_collaboration(&carol(), &carol_row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap();
    assert_eq!(accepted.program.status, ProgramStatus::PendingCollaboration);
    assert!(service.superadmin_queue(&root()).await.unwrap().is_empty());

    let detail = service.program_detail(&program.program_id).await.unwrap();
    assert_eq!(detail.effective_status, EffectiveStatus::CollaboratorWithdrawn);
}

#[tokio::test]
async fn program_without_collaborators_is_submitted_directly() {
    let (service, notifier) = setup().await;
    let program = service
        .create_program(&alice(), NewProgram::new("Blood drive"))
        .await
        .unwrap();

    let err = service
        .submit_for_approval(&bob(), &program.program_id)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden { .. }));

    let submitted = service
        .submit_for_approval(&Actor::new("alice-deputy"), &program.program_id)
        .await
        .unwrap();
    assert_eq!(submitted.status, ProgramStatus::PendingSuperadminApproval);
    assert_eq!(notifier.last().transition, TransitionKind::Submitted);

    let approved = service
        .superadmin_decide(&root(), &program.program_id, SuperadminDecision::Approve)
        .await
        .unwrap();
    assert_eq!(approved.status, ProgramStatus::Approved);
}

#[tokio::test]
async fn double_accept_is_rejected_without_a_signal() {
    let (service, notifier) = setup().await;
    let (_program, bob_row, _carol_row) = two_invites(&service).await;
    service
        .respond_to_collaboration(&bob(), &bob_row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap();
    let signals = notifier.count();

    let err = service
        .respond_to_collaboration(&bob(), &bob_row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap_err();
    assert!(matches!(
        err.rejection().map(|r| &r.guard),
        Some(Guard::RowNotPending {
            found: CollaborationStatus::Accepted
        })
    ));
    assert_eq!(notifier.count(), signals);
}

#[tokio::test]
async fn authorization_and_validation_are_distinct_failures() {
    let (service, notifier) = setup().await;
    let (program, bob_row, _carol_row) = two_invites(&service).await;
    let signals = notifier.count();

    let err = service
        .respond_to_collaboration(&carol(), &bob_row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden { .. }));

    let err = service
        .respond_to_collaboration(
            &bob(),
            &CollaborationId::new("missing"),
            ResponseDecision::Accept,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::NotFound { .. }));

    let err = service
        .invite_collaborator(&bob(), &program.program_id, &AdminId::new("carol"))
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden { .. }));

    let err = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("alice-deputy"))
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Validation(_)));

    let err = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Validation(_)));

    let err = service
        .superadmin_decide(&bob(), &program.program_id, SuperadminDecision::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Forbidden { .. }));

    let err = service.superadmin_queue(&alice()).await.unwrap_err();
    assert!(matches!(err, CollabError::Forbidden { .. }));

    let err = service
        .invite_collaborator(&alice(), &ProgramId::new("missing"), &AdminId::new("bob"))
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::NotFound { .. }));

    let err = service
        .create_program(&alice(), NewProgram::new("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, CollabError::Validation(_)));

    assert_eq!(notifier.count(), signals);
}

#[tokio::test]
async fn inviting_during_review_sends_the_program_back() {
    let (service, _notifier) = setup().await;
    let program = service
        .create_program(&alice(), NewProgram::new("Winter coats"))
        .await
        .unwrap();
    let row = service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("bob"))
        .await
        .unwrap();
    service
        .respond_to_collaboration(&bob(), &row.collaboration_id, ResponseDecision::Accept)
        .await
        .unwrap();

    service
        .invite_collaborator(&alice(), &program.program_id, &AdminId::new("carol"))
        .await
        .unwrap();
    let detail = service.program_detail(&program.program_id).await.unwrap();
    assert_eq!(detail.program.status, ProgramStatus::PendingCollaboration);
    assert!(service.superadmin_queue(&root()).await.unwrap().is_empty());
}
