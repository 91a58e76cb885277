use bson::{doc, oid::ObjectId, DateTime};
use immolink_db::models::{
    step_title, AccountType, ActivityType, Collaboration, CollaborationStatus, CompensationType,
    CompletionReason, NotificationType, ParticipantRole, PostRef, User,
};
use mongodb::Database;
use serde::Deserialize;
use tracing::{info, warn};

use super::base::{BaseDao, DaoError, DaoResult};
use super::post::PostDao;
use super::user::UserDao;
use crate::notifier::Notifier;

/// Commercial terms of a proposal. Percentage commission applies when
/// `compensation_type` is `percentage` or unset; fixed amounts and gift
/// vouchers carry an explicit amount instead.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposalTerms {
    pub proposed_commission: Option<f64>,
    pub compensation_type: Option<CompensationType>,
    pub compensation_amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseDecision {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ForceCloseMode {
    Cancel,
    Complete,
}

/// Whitelisted fields an admin may set directly, bypassing the normal
/// transition preconditions.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminUpdateFields {
    pub proposed_commission: Option<f64>,
    pub compensation_amount: Option<f64>,
    pub status: Option<CollaborationStatus>,
    pub current_step: Option<String>,
    pub note: Option<String>,
}

/// Lifecycle controller for the collaboration aggregate: proposal,
/// response, progress tracking, terminal transitions and the admin
/// override paths. All validation happens before any write; every
/// mutation is a compare-and-swap on the aggregate's version.
pub struct CollaborationDao {
    pub base: BaseDao<Collaboration>,
    posts: PostDao,
    users: UserDao,
    notifier: Notifier,
}

impl CollaborationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Collaboration::COLLECTION),
            posts: PostDao::new(db),
            users: UserDao::new(db),
            notifier: Notifier::new(db),
        }
    }

    /// CAS save: the write only lands if nobody else touched the document
    /// since it was loaded. A miss means a concurrent writer won; the
    /// caller gets a conflict and retries with fresh state.
    pub(crate) async fn save(&self, collab: &mut Collaboration) -> DaoResult<()> {
        let id = collab.id.ok_or(DaoError::NotFound)?;
        let expected = collab.version;
        collab.version = expected + 1;
        collab.updated_at = DateTime::now();

        let replaced = self
            .base
            .replace_one(doc! { "_id": id, "version": expected }, collab)
            .await?;
        if !replaced {
            return Err(DaoError::Conflict(
                "Collaboration was modified concurrently, please retry".to_string(),
            ));
        }
        Ok(())
    }

    // ----- Proposal -----

    pub async fn propose(
        &self,
        actor: &User,
        post_ref: PostRef,
        terms: ProposalTerms,
    ) -> DaoResult<Collaboration> {
        let actor_id = actor.id.ok_or(DaoError::NotFound)?;

        if actor.account_type == AccountType::ReferralPartner {
            return Err(DaoError::Forbidden(
                "Referral partner accounts cannot propose collaborations".to_string(),
            ));
        }

        let post = self.posts.resolve(post_ref).await?;
        if post.archived {
            return Err(DaoError::Gone(
                "This listing has been archived and no longer accepts proposals".to_string(),
            ));
        }
        if post.owner_id == actor_id {
            return Err(DaoError::Validation(
                "You cannot collaborate on your own listing".to_string(),
            ));
        }

        let owner = self.users.find_by_id(post.owner_id).await?;
        validate_terms(&terms, owner.account_type)?;

        // Exclusivity pre-check; the unique partial index closes the race
        // two concurrent proposals would otherwise slip through.
        if let Some(existing) = self
            .base
            .find_one(doc! {
                "post_ref.post_id": post_ref.post_id,
                "status": { "$in": ["pending", "accepted", "active"] },
            })
            .await?
        {
            let message = if existing.collaborator_id == actor_id {
                "You already have a collaboration in progress for this listing"
            } else {
                "This listing is already under collaboration with another partner"
            };
            return Err(DaoError::Conflict(message.to_string()));
        }

        // A prior rejected/cancelled record for this pair does not block a
        // new proposal; drop it so the pair can start over. Runs after the
        // exclusivity check: a proposal that conflicts must leave the pair's
        // history untouched.
        self.base
            .delete_one(doc! {
                "post_ref.post_id": post_ref.post_id,
                "collaborator_id": actor_id,
                "status": { "$in": ["rejected", "cancelled"] },
            })
            .await?;

        let now = DateTime::now();
        let mut collab = Collaboration {
            id: None,
            post_ref,
            post_owner_id: post.owner_id,
            collaborator_id: actor_id,
            proposed_commission: terms.proposed_commission,
            compensation_type: terms.compensation_type,
            compensation_amount: terms.compensation_amount,
            status: CollaborationStatus::Pending,
            current_step: "proposal".to_string(),
            contract_text: String::new(),
            additional_terms: String::new(),
            owner_signed: false,
            owner_signed_at: None,
            collaborator_signed: false,
            collaborator_signed_at: None,
            contract_modified: false,
            contract_last_modified_by: None,
            contract_last_modified_at: None,
            progress_steps: Collaboration::seed_steps(),
            completed_at: None,
            completed_by: None,
            completed_by_role: None,
            completion_reason: None,
            activities: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        };
        collab.append_activity(
            ActivityType::Proposal,
            format!("{} proposed a collaboration", actor.display_name),
            actor_id,
            now,
        );

        // The aggregate embeds its activity log and step list, so the
        // record and its initial proposal activity commit in one atomic
        // insert. A duplicate key here is a concurrent proposal that won.
        let id = self.base.insert_one(&collab).await.map_err(|e| match e {
            DaoError::DuplicateKey(_) => DaoError::Conflict(
                "This listing is already under collaboration".to_string(),
            ),
            other => other,
        })?;

        let collab = self.base.find_by_id(id).await?;

        self.notifier
            .emit(
                post.owner_id,
                Some(actor_id),
                NotificationType::CollaborationProposal,
                "collaboration",
                id,
                "Nouvelle proposition de collaboration",
                format!("{} vous propose une collaboration", actor.display_name),
                None,
            )
            .await;

        Ok(collab)
    }

    // ----- Reads -----

    /// Fetch with participant/admin authorization. A collaboration whose
    /// referenced post is deleted or archived is "gone" rather than
    /// not-found for participants; admins still see it.
    pub async fn find_by_id_for(
        &self,
        actor_id: ObjectId,
        is_admin: bool,
        id: ObjectId,
    ) -> DaoResult<Collaboration> {
        let collab = self.base.find_by_id(id).await?;

        if !is_admin && !collab.is_participant(actor_id) {
            return Err(DaoError::Forbidden(
                "Only the participants may view this collaboration".to_string(),
            ));
        }

        if !is_admin {
            match self.posts.resolve(collab.post_ref).await {
                Ok(post) if post.archived => {
                    return Err(DaoError::Gone(
                        "The listing behind this collaboration has been archived".to_string(),
                    ));
                }
                Err(DaoError::NotFound) => {
                    return Err(DaoError::Gone(
                        "The listing behind this collaboration no longer exists".to_string(),
                    ));
                }
                Ok(_) => {}
                Err(e) => return Err(e),
            }
        }

        Ok(collab)
    }

    pub async fn find_for_user(&self, actor_id: ObjectId) -> DaoResult<Vec<Collaboration>> {
        self.base
            .find_many(
                doc! {
                    "$or": [
                        { "post_owner_id": actor_id },
                        { "collaborator_id": actor_id },
                    ]
                },
                Some(doc! { "created_at": -1 }),
            )
            .await
    }

    pub async fn find_by_post(
        &self,
        actor_id: ObjectId,
        is_admin: bool,
        post_ref: PostRef,
    ) -> DaoResult<Vec<Collaboration>> {
        let collabs = self
            .base
            .find_many(
                doc! { "post_ref.post_id": post_ref.post_id },
                Some(doc! { "created_at": -1 }),
            )
            .await?;

        Ok(collabs
            .into_iter()
            .filter(|c| is_admin || c.is_participant(actor_id))
            .collect())
    }

    // ----- Transitions -----

    pub async fn respond(
        &self,
        actor_id: ObjectId,
        id: ObjectId,
        decision: ResponseDecision,
    ) -> DaoResult<Collaboration> {
        let mut collab = self.base.find_by_id(id).await?;

        if collab.post_owner_id != actor_id {
            return Err(DaoError::Forbidden(
                "Only the listing owner may respond to a proposal".to_string(),
            ));
        }
        if collab.status != CollaborationStatus::Pending {
            return Err(DaoError::Validation(
                "This proposal has already been responded to".to_string(),
            ));
        }

        let now = DateTime::now();
        let (status, step, message, notif_message) = match decision {
            ResponseDecision::Accepted => (
                CollaborationStatus::Accepted,
                "accepted",
                "Proposal accepted",
                "Votre proposition de collaboration a été acceptée",
            ),
            ResponseDecision::Rejected => (
                CollaborationStatus::Rejected,
                "rejected",
                "Proposal rejected",
                "Votre proposition de collaboration a été refusée",
            ),
        };
        collab.status = status;
        collab.current_step = step.to_string();
        collab.append_activity(ActivityType::StatusUpdate, message, actor_id, now);

        self.save(&mut collab).await?;

        self.notifier
            .emit(
                collab.collaborator_id,
                Some(actor_id),
                NotificationType::CollaborationResponse,
                "collaboration",
                id,
                "Réponse à votre proposition",
                notif_message,
                None,
            )
            .await;

        Ok(collab)
    }

    pub async fn add_note(
        &self,
        actor_id: ObjectId,
        id: ObjectId,
        content: String,
    ) -> DaoResult<Collaboration> {
        let mut collab = self.base.find_by_id(id).await?;

        if !collab.is_participant(actor_id) {
            return Err(DaoError::Forbidden(
                "Only the participants may add notes".to_string(),
            ));
        }
        if collab.status != CollaborationStatus::Active {
            return Err(DaoError::Validation(
                "Notes can only be added while the collaboration is active".to_string(),
            ));
        }
        if content.trim().is_empty() {
            return Err(DaoError::Validation("Note content is required".to_string()));
        }

        collab.append_activity(ActivityType::Note, content, actor_id, DateTime::now());
        self.save(&mut collab).await?;

        self.notifier
            .emit(
                other_participant(&collab, actor_id),
                Some(actor_id),
                NotificationType::NoteAdded,
                "collaboration",
                id,
                "Nouvelle note",
                "Une note a été ajoutée à votre collaboration",
                None,
            )
            .await;

        Ok(collab)
    }

    pub async fn update_progress(
        &self,
        actor_id: ObjectId,
        id: ObjectId,
        step_id: &str,
        validated_by: ParticipantRole,
        note: Option<String>,
    ) -> DaoResult<Collaboration> {
        let Some(title) = step_title(step_id) else {
            return Err(DaoError::Validation(format!(
                "Unknown progress step: {step_id}"
            )));
        };

        let mut collab = self.base.find_by_id(id).await?;

        let Some(actor_role) = collab.participant_role(actor_id) else {
            return Err(DaoError::Forbidden(
                "Only the participants may update progress".to_string(),
            ));
        };
        if !matches!(
            collab.status,
            CollaborationStatus::Accepted | CollaborationStatus::Active
        ) {
            return Err(DaoError::Validation(
                "Progress can only be updated on an accepted or active collaboration".to_string(),
            ));
        }
        // Cross-validation: nobody validates on behalf of the other party.
        if validated_by != actor_role {
            return Err(DaoError::Forbidden(
                "You cannot validate a step on behalf of the other party".to_string(),
            ));
        }

        let now = DateTime::now();
        collab.validate_step(step_id, validated_by, note);
        collab.append_activity(
            ActivityType::StatusUpdate,
            format!("Step validated: {title}"),
            actor_id,
            now,
        );

        self.save(&mut collab).await?;

        self.notifier
            .emit(
                other_participant(&collab, actor_id),
                Some(actor_id),
                NotificationType::ProgressUpdate,
                "collaboration",
                id,
                "Avancement du dossier",
                format!("Étape validée : {title}"),
                None,
            )
            .await;

        Ok(collab)
    }

    pub async fn cancel(&self, actor_id: ObjectId, id: ObjectId) -> DaoResult<Collaboration> {
        let mut collab = self.base.find_by_id(id).await?;

        if !collab.is_participant(actor_id) {
            return Err(DaoError::Forbidden(
                "Only the participants may cancel a collaboration".to_string(),
            ));
        }
        if collab.status == CollaborationStatus::Completed {
            return Err(DaoError::Validation(
                "A completed collaboration cannot be cancelled".to_string(),
            ));
        }

        collab.status = CollaborationStatus::Cancelled;
        collab.current_step = "cancelled".to_string();
        collab.append_activity(
            ActivityType::StatusUpdate,
            "Collaboration cancelled",
            actor_id,
            DateTime::now(),
        );

        self.save(&mut collab).await?;

        self.notifier
            .emit(
                other_participant(&collab, actor_id),
                Some(actor_id),
                NotificationType::CollaborationCancelled,
                "collaboration",
                id,
                "Collaboration annulée",
                "La collaboration a été annulée",
                None,
            )
            .await;

        Ok(collab)
    }

    pub async fn complete(
        &self,
        actor_id: ObjectId,
        id: ObjectId,
        reason: CompletionReason,
    ) -> DaoResult<Collaboration> {
        let mut collab = self.base.find_by_id(id).await?;

        let Some(actor_role) = collab.participant_role(actor_id) else {
            return Err(DaoError::Forbidden(
                "Only the participants may complete a collaboration".to_string(),
            ));
        };
        if collab.status != CollaborationStatus::Active {
            return Err(DaoError::Validation(
                "Only an active collaboration can be completed".to_string(),
            ));
        }
        if !collab.deal_concluded_validated_by_both() {
            return Err(DaoError::Validation(
                "Cannot complete: both parties must validate deal closure first".to_string(),
            ));
        }

        let now = DateTime::now();
        collab.stamp_completion(actor_id, actor_role, reason, now);
        collab.append_activity(
            ActivityType::StatusUpdate,
            format!("Collaboration completed: {}", reason.label()),
            actor_id,
            now,
        );

        self.save(&mut collab).await?;

        // Best-effort cross-aggregate side effect: the post flip runs after
        // the collaboration save committed and is never rolled into it. A
        // crash between the two writes is reconciled out of band.
        if reason == CompletionReason::VenteConclueCollaboration {
            if let Err(e) = self.posts.mark_completed(collab.post_ref).await {
                warn!(
                    collaboration = %id,
                    post_id = %collab.post_ref.post_id,
                    error = %e,
                    "Failed to update post status after completion"
                );
            }
        }

        self.notifier
            .emit(
                other_participant(&collab, actor_id),
                Some(actor_id),
                NotificationType::CollaborationCompleted,
                "collaboration",
                id,
                "Collaboration terminée",
                format!("Collaboration terminée : {}", reason.label()),
                None,
            )
            .await;

        Ok(collab)
    }

    // ----- Admin override paths -----

    pub async fn admin_force_close(
        &self,
        admin_id: ObjectId,
        id: ObjectId,
        mode: ForceCloseMode,
        reason: Option<CompletionReason>,
    ) -> DaoResult<Collaboration> {
        let mut collab = self.base.find_by_id(id).await?;
        let now = DateTime::now();

        match mode {
            ForceCloseMode::Cancel => {
                collab.status = CollaborationStatus::Cancelled;
                collab.current_step = "cancelled".to_string();
                collab.append_activity(
                    ActivityType::StatusUpdate,
                    "Collaboration cancelled by an administrator",
                    admin_id,
                    now,
                );
            }
            ForceCloseMode::Complete => {
                let reason = reason.unwrap_or(CompletionReason::SansSuite);
                collab.stamp_completion(admin_id, ParticipantRole::Admin, reason, now);
                collab.append_activity(
                    ActivityType::StatusUpdate,
                    format!("Collaboration closed by an administrator: {}", reason.label()),
                    admin_id,
                    now,
                );
            }
        }

        self.save(&mut collab).await?;
        self.notify_both_admin_action(&collab, admin_id, id).await;

        Ok(collab)
    }

    /// Narrow override for deals finished in substance where one side never
    /// validated the final step: validates it for both, then completes.
    pub async fn admin_force_complete(
        &self,
        admin_id: ObjectId,
        id: ObjectId,
        reason: Option<CompletionReason>,
    ) -> DaoResult<Collaboration> {
        let mut collab = self.base.find_by_id(id).await?;
        let now = DateTime::now();
        let reason = reason.unwrap_or(CompletionReason::VenteConclueCollaboration);

        collab.force_validate_deal_concluded();
        collab.stamp_completion(admin_id, ParticipantRole::Admin, reason, now);
        collab.append_activity(
            ActivityType::StatusUpdate,
            format!("Collaboration completed by an administrator: {}", reason.label()),
            admin_id,
            now,
        );

        self.save(&mut collab).await?;
        self.notify_both_admin_action(&collab, admin_id, id).await;

        Ok(collab)
    }

    /// Escape hatch: direct mutation of a whitelisted field set without the
    /// normal transition preconditions. Logged loudly so unsafe transitions
    /// can be audited after the fact.
    pub async fn admin_update(
        &self,
        admin_id: ObjectId,
        id: ObjectId,
        fields: AdminUpdateFields,
    ) -> DaoResult<Collaboration> {
        let mut collab = self.base.find_by_id(id).await?;
        let now = DateTime::now();

        warn!(
            admin = %admin_id,
            collaboration = %id,
            ?fields,
            "Admin update bypassing state-machine guards"
        );

        if let Some(commission) = fields.proposed_commission {
            collab.proposed_commission = Some(commission);
        }
        if let Some(amount) = fields.compensation_amount {
            collab.compensation_amount = Some(amount);
        }
        if let Some(status) = fields.status {
            collab.status = status;
        }
        if let Some(step) = fields.current_step {
            collab.current_step = step;
        }
        if let Some(note) = fields.note {
            collab.append_activity(
                ActivityType::Note,
                format!("Admin: {note}"),
                admin_id,
                now,
            );
        }

        self.save(&mut collab).await?;
        Ok(collab)
    }

    /// Hard delete, no cascade, no recovery. Last resort; the operator log
    /// keeps the only trace.
    pub async fn admin_delete(&self, admin_id: ObjectId, id: ObjectId) -> DaoResult<()> {
        let collab = self.base.find_by_id(id).await?;

        warn!(
            admin = %admin_id,
            collaboration = %id,
            post_id = %collab.post_ref.post_id,
            owner = %collab.post_owner_id,
            collaborator = %collab.collaborator_id,
            status = ?collab.status,
            "Hard-deleting collaboration"
        );

        self.base.delete_one(doc! { "_id": id }).await?;
        info!(collaboration = %id, "Collaboration deleted");
        Ok(())
    }

    async fn notify_both_admin_action(
        &self,
        collab: &Collaboration,
        admin_id: ObjectId,
        id: ObjectId,
    ) {
        for recipient in [collab.post_owner_id, collab.collaborator_id] {
            self.notifier
                .emit(
                    recipient,
                    Some(admin_id),
                    NotificationType::AdminAction,
                    "collaboration",
                    id,
                    "Intervention administrateur",
                    "Un administrateur a mis à jour votre collaboration",
                    None,
                )
                .await;
        }
    }
}

fn other_participant(collab: &Collaboration, actor_id: ObjectId) -> ObjectId {
    if collab.post_owner_id == actor_id {
        collab.collaborator_id
    } else {
        collab.post_owner_id
    }
}

/// Compensation validation against the post owner's account category.
/// Referral partners may not receive 50% or more; amount-based terms
/// must carry a positive amount.
fn validate_terms(terms: &ProposalTerms, owner_type: AccountType) -> DaoResult<()> {
    match terms.compensation_type {
        Some(CompensationType::FixedAmount) | Some(CompensationType::GiftVouchers) => {
            let amount = terms.compensation_amount.ok_or_else(|| {
                DaoError::Validation("A compensation amount is required".to_string())
            })?;
            if amount <= 0.0 {
                return Err(DaoError::Validation(
                    "The compensation amount must be greater than zero".to_string(),
                ));
            }
        }
        Some(CompensationType::Percentage) | None => {
            let commission = terms.proposed_commission.ok_or_else(|| {
                DaoError::Validation("A commission percentage is required".to_string())
            })?;
            if commission <= 0.0 || commission > 100.0 {
                return Err(DaoError::Validation(
                    "The commission must be between 0 and 100 percent".to_string(),
                ));
            }
            if owner_type == AccountType::ReferralPartner && commission >= 50.0 {
                return Err(DaoError::Validation(
                    "A referral partner cannot receive a commission of 50% or more".to_string(),
                ));
            }
        }
    }
    Ok(())
}
