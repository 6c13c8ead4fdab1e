//! Effective-status resolver
//!
//! The only place the two stored status dimensions are combined. Every list
//! view, detail view and "may this admin still act" check goes through here.
//! Resolution never writes and never panics: combinations the engine cannot
//! produce degrade to [`EffectiveStatus::Indeterminate`].

use collab_types::{
    AllowedActions, CollaborationStatus, EffectiveStatus, Perspective, ProgramStatus,
};

/// Resolve the status of one collaboration row as seen from one side of it
pub fn resolve(
    collaboration: CollaborationStatus,
    program: ProgramStatus,
    perspective: Perspective,
) -> EffectiveStatus {
    use CollaborationStatus as C;
    use ProgramStatus as P;

    if perspective == Perspective::Inviter && program == P::Rejected {
        return EffectiveStatus::RejectedBySuperadmin;
    }

    match (collaboration, program) {
        (C::Declined | C::Superseded, _) => EffectiveStatus::Declined,
        (C::OptedOut, _) => EffectiveStatus::OptedOut,
        (C::Pending, P::PendingCollaboration) => EffectiveStatus::PendingResponse,
        (C::Accepted, P::PendingCollaboration) => EffectiveStatus::WaitingOnCollaborators,
        (C::Accepted, P::PendingSuperadminApproval) => EffectiveStatus::PendingSuperadminApproval,
        (C::Accepted, P::Approved) => EffectiveStatus::Approved,
        (C::Accepted, P::Active) => EffectiveStatus::Active,
        (C::Accepted, P::Completed) => EffectiveStatus::Completed,
        (C::Accepted, P::Rejected) => EffectiveStatus::RejectedBySuperadmin,
        _ => EffectiveStatus::Indeterminate,
    }
}

/// Resolve the status of a whole program from its owner's or a superadmin's
/// point of view
pub fn resolve_program(program: ProgramStatus, rows: &[CollaborationStatus]) -> EffectiveStatus {
    use ProgramStatus as P;

    let any_pending = rows.contains(&CollaborationStatus::Pending);
    let any_withdrawn = rows.iter().any(CollaborationStatus::is_declined_variant);
    let all_accepted = rows.iter().all(|s| *s == CollaborationStatus::Accepted);

    match program {
        P::Draft if rows.is_empty() => EffectiveStatus::Draft,
        P::PendingCollaboration if any_withdrawn => EffectiveStatus::CollaboratorWithdrawn,
        P::PendingCollaboration if any_pending => EffectiveStatus::WaitingOnCollaborators,
        P::PendingSuperadminApproval if !any_pending => EffectiveStatus::PendingSuperadminApproval,
        P::Approved if all_accepted => EffectiveStatus::Approved,
        P::Active if all_accepted => EffectiveStatus::Active,
        P::Completed if all_accepted => EffectiveStatus::Completed,
        P::Rejected => EffectiveStatus::RejectedBySuperadmin,
        P::Declined => EffectiveStatus::Declined,
        _ => EffectiveStatus::Indeterminate,
    }
}

/// What the viewer may still do with a row
pub fn allowed_actions(
    collaboration: CollaborationStatus,
    program: ProgramStatus,
    perspective: Perspective,
) -> AllowedActions {
    if perspective != Perspective::Invitee {
        return AllowedActions::NONE;
    }

    match resolve(collaboration, program, perspective) {
        EffectiveStatus::PendingResponse => AllowedActions {
            can_accept: true,
            can_decline: true,
            can_opt_out: false,
        },
        EffectiveStatus::WaitingOnCollaborators | EffectiveStatus::PendingSuperadminApproval => {
            AllowedActions {
                can_accept: false,
                can_decline: false,
                can_opt_out: true,
            }
        }
        _ => AllowedActions::NONE,
    }
}
