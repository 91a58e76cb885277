pub mod template;

use bson::{oid::ObjectId, DateTime};
use immolink_db::models::{
    ActivityType, Collaboration, CollaborationStatus, NotificationType, ParticipantRole, User,
};
use mongodb::Database;
use serde::Serialize;

use crate::dao::base::{DaoError, DaoResult};
use crate::dao::collaboration::CollaborationDao;
use crate::dao::post::PostDao;
use crate::dao::user::UserDao;
use crate::notifier::Notifier;
use template::{template_for, PartyDetails, TemplateContext};

/// What a participant sees when fetching the contract, with the derived
/// flags the client uses to drive the signing UI.
#[derive(Debug, Clone, Serialize)]
pub struct ContractView {
    pub contract_text: String,
    pub additional_terms: String,
    pub owner_signed: bool,
    pub owner_signed_at: Option<bson::DateTime>,
    pub collaborator_signed: bool,
    pub collaborator_signed_at: Option<bson::DateTime>,
    pub contract_modified: bool,
    pub status: CollaborationStatus,
    pub can_edit: bool,
    pub can_sign: bool,
    /// Exactly one side has signed; tells the UI why the collaboration is
    /// not active yet.
    pub requires_both_signatures: bool,
}

/// Co-signing controller: contract negotiation, dual signature capture,
/// automatic activation on dual-sign and signature invalidation on edit.
pub struct ContractService {
    collabs: CollaborationDao,
    users: UserDao,
    posts: PostDao,
    notifier: Notifier,
}

impl ContractService {
    pub fn new(db: &Database) -> Self {
        Self {
            collabs: CollaborationDao::new(db),
            users: UserDao::new(db),
            posts: PostDao::new(db),
            notifier: Notifier::new(db),
        }
    }

    /// Fetches the contract, synthesizing and persisting the initial text
    /// from the owner-category template when none exists yet. Re-invoking
    /// with text already present never regenerates it.
    pub async fn get_or_init(
        &self,
        actor_id: ObjectId,
        id: ObjectId,
    ) -> DaoResult<ContractView> {
        let mut collab = self.collabs.base.find_by_id(id).await?;

        if !collab.is_participant(actor_id) {
            return Err(DaoError::Forbidden(
                "Only the participants may view the contract".to_string(),
            ));
        }

        if collab.contract_text.is_empty() {
            let owner = self.users.find_by_id(collab.post_owner_id).await?;
            let collaborator = self.users.find_by_id(collab.collaborator_id).await?;
            let post_title = match self.posts.resolve(collab.post_ref).await {
                Ok(post) => post.title,
                // The post may be gone; the contract is still initializable
                // from what the aggregate knows.
                Err(DaoError::NotFound) => "Annonce".to_string(),
                Err(e) => return Err(e),
            };

            let ctx = TemplateContext {
                owner: party_details(&owner),
                collaborator: party_details(&collaborator),
                post_title,
                proposed_commission: collab.proposed_commission,
                compensation_type: collab.compensation_type,
                compensation_amount: collab.compensation_amount,
            };
            collab.contract_text = template_for(owner.account_type).render(&ctx);
            collab.contract_modified = false;
            self.collabs.save(&mut collab).await?;
        }

        Ok(view(&collab, actor_id))
    }

    /// A modifying edit resets both signatures; saving identical content is
    /// inert: no signature reset, no activity, no notification.
    pub async fn update(
        &self,
        actor_id: ObjectId,
        id: ObjectId,
        contract_text: String,
        additional_terms: String,
    ) -> DaoResult<ContractView> {
        let mut collab = self.collabs.base.find_by_id(id).await?;

        let Some(editor_role) = collab.participant_role(actor_id) else {
            return Err(DaoError::Forbidden(
                "Only the participants may edit the contract".to_string(),
            ));
        };
        if collab.status != CollaborationStatus::Accepted {
            return Err(DaoError::Validation(
                "The contract can only be edited while the collaboration is accepted".to_string(),
            ));
        }

        let changed =
            contract_text != collab.contract_text || additional_terms != collab.additional_terms;
        if !changed {
            return Ok(view(&collab, actor_id));
        }

        let now = DateTime::now();
        collab.contract_text = contract_text;
        collab.additional_terms = additional_terms;
        collab.invalidate_signatures(editor_role, now);
        collab.append_activity(
            ActivityType::StatusUpdate,
            format!(
                "Contract edited by the {}; both parties must sign again",
                role_label(editor_role)
            ),
            actor_id,
            now,
        );

        self.collabs.save(&mut collab).await?;

        self.notifier
            .emit(
                other_participant(&collab, actor_id),
                Some(actor_id),
                NotificationType::ContractUpdated,
                "collaboration",
                id,
                "Contrat modifié",
                "Le contrat a été modifié ; les deux parties doivent signer à nouveau",
                None,
            )
            .await;

        Ok(view(&collab, actor_id))
    }

    /// Records the caller's signature(s). Owner and collaborator standing
    /// are independent booleans: an actor holding both sides signs both.
    /// When both flags end up set, the collaboration activates in the same
    /// operation and a second, distinct notification goes out.
    pub async fn sign(&self, actor_id: ObjectId, id: ObjectId) -> DaoResult<ContractView> {
        let mut collab = self.collabs.base.find_by_id(id).await?;

        let as_owner = collab.post_owner_id == actor_id;
        let as_collaborator = collab.collaborator_id == actor_id;
        if !as_owner && !as_collaborator {
            return Err(DaoError::Forbidden(
                "Only the participants may sign the contract".to_string(),
            ));
        }
        if collab.status != CollaborationStatus::Accepted {
            return Err(DaoError::Validation(
                "The contract can only be signed while the collaboration is accepted".to_string(),
            ));
        }

        let now = DateTime::now();
        let activated = collab.record_signature(as_owner, as_collaborator, now);

        let signer_label = if as_owner {
            role_label(ParticipantRole::Owner)
        } else {
            role_label(ParticipantRole::Collaborator)
        };
        collab.append_activity(
            ActivityType::Signing,
            format!("Contract signed by the {signer_label}"),
            actor_id,
            now,
        );

        self.collabs.save(&mut collab).await?;

        let other = other_participant(&collab, actor_id);
        self.notifier
            .emit(
                other,
                Some(actor_id),
                NotificationType::ContractSigned,
                "collaboration",
                id,
                "Contrat signé",
                format!("Le contrat a été signé par le {signer_label}"),
                None,
            )
            .await;

        if activated {
            self.notifier
                .emit(
                    other,
                    Some(actor_id),
                    NotificationType::CollaborationActivated,
                    "collaboration",
                    id,
                    "Collaboration activée",
                    "Les deux parties ont signé ; la collaboration est active",
                    None,
                )
                .await;
        }

        Ok(view(&collab, actor_id))
    }
}

fn view(collab: &Collaboration, actor_id: ObjectId) -> ContractView {
    let is_owner = collab.post_owner_id == actor_id;
    let is_collaborator = collab.collaborator_id == actor_id;
    let is_participant = is_owner || is_collaborator;

    let already_signed = (is_owner && collab.owner_signed)
        || (is_collaborator && collab.collaborator_signed);

    ContractView {
        contract_text: collab.contract_text.clone(),
        additional_terms: collab.additional_terms.clone(),
        owner_signed: collab.owner_signed,
        owner_signed_at: collab.owner_signed_at,
        collaborator_signed: collab.collaborator_signed,
        collaborator_signed_at: collab.collaborator_signed_at,
        contract_modified: collab.contract_modified,
        status: collab.status,
        can_edit: is_participant,
        can_sign: is_participant && !already_signed,
        requires_both_signatures: collab.owner_signed != collab.collaborator_signed,
    }
}

fn party_details(user: &User) -> PartyDetails {
    PartyDetails {
        display_name: user.display_name.clone(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        agency_name: user.agency_name.clone(),
        siren: user.siren.clone(),
    }
}

fn role_label(role: ParticipantRole) -> &'static str {
    match role {
        ParticipantRole::Owner => "owner",
        ParticipantRole::Collaborator => "collaborator",
        ParticipantRole::Admin => "administrator",
    }
}

fn other_participant(collab: &Collaboration, actor_id: ObjectId) -> ObjectId {
    if collab.post_owner_id == actor_id {
        collab.collaborator_id
    } else {
        collab.post_owner_id
    }
}
