use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

/// The collaboration aggregate: one document per partnership between two
/// professionals over a single post, with the activity log, the progress
/// steps, the contract block and the completion block embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaboration {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub post_ref: PostRef,
    pub post_owner_id: ObjectId,
    pub collaborator_id: ObjectId,
    /// Percentage terms; used when `compensation_type` is `percentage` or unset.
    pub proposed_commission: Option<f64>,
    pub compensation_type: Option<CompensationType>,
    pub compensation_amount: Option<f64>,
    pub status: CollaborationStatus,
    /// Free-form label mirroring status/progress ("proposal", "active", ...).
    pub current_step: String,

    // Contract block
    #[serde(default)]
    pub contract_text: String,
    #[serde(default)]
    pub additional_terms: String,
    #[serde(default)]
    pub owner_signed: bool,
    pub owner_signed_at: Option<DateTime>,
    #[serde(default)]
    pub collaborator_signed: bool,
    pub collaborator_signed_at: Option<DateTime>,
    #[serde(default)]
    pub contract_modified: bool,
    pub contract_last_modified_by: Option<ParticipantRole>,
    pub contract_last_modified_at: Option<DateTime>,

    #[serde(default)]
    pub progress_steps: Vec<ProgressStep>,

    // Completion block
    pub completed_at: Option<DateTime>,
    pub completed_by: Option<ObjectId>,
    pub completed_by_role: Option<ParticipantRole>,
    pub completion_reason: Option<CompletionReason>,

    /// Append-only audit log; never truncated or edited.
    #[serde(default)]
    pub activities: Vec<Activity>,

    /// Optimistic-concurrency counter; every write is a CAS on
    /// `{_id, version}` with `$inc {version: 1}`.
    #[serde(default)]
    pub version: i64,

    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Polymorphic reference to the subject of the collaboration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostRef {
    pub post_type: PostType,
    pub post_id: ObjectId,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    Property,
    SearchAd,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Active,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompensationType {
    Percentage,
    FixedAmount,
    GiftVouchers,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Owner,
    Collaborator,
    /// Admin-driven completions stamp this explicitly rather than
    /// borrowing the owner role.
    Admin,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    VenteConclueCollaboration,
    VenteConclueSeul,
    BienRetire,
    MandatExpire,
    ClientDesiste,
    VenduTiers,
    SansSuite,
}

impl CompletionReason {
    pub fn label(&self) -> &'static str {
        match self {
            Self::VenteConclueCollaboration => "Vente conclue grâce à la collaboration",
            Self::VenteConclueSeul => "Vente conclue par le propriétaire seul",
            Self::BienRetire => "Bien retiré de la vente",
            Self::MandatExpire => "Mandat expiré",
            Self::ClientDesiste => "Client désisté",
            Self::VenduTiers => "Vendu par un tiers",
            Self::SansSuite => "Sans suite",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressStep {
    /// One of the ten identifiers in [`PROGRESS_STEPS`].
    pub id: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub owner_validated: bool,
    #[serde(default)]
    pub collaborator_validated: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub activity_type: ActivityType,
    pub message: String,
    pub created_by: ObjectId,
    pub created_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Proposal,
    StatusUpdate,
    Note,
    Signing,
}

/// One entry of the fixed milestone table.
pub struct StepDef {
    pub id: &'static str,
    pub title: &'static str,
}

/// The ten deal milestones, in canonical order. Single source of truth for
/// step seeding, identifier validation and notification titles.
pub const PROGRESS_STEPS: [StepDef; 10] = [
    StepDef { id: "accord_collaboration", title: "Accord de collaboration" },
    StepDef { id: "premier_contact", title: "Premier contact" },
    StepDef { id: "visite_programmee", title: "Visite programmée" },
    StepDef { id: "visite_realisee", title: "Visite réalisée" },
    StepDef { id: "retour_client", title: "Retour client" },
    StepDef { id: "offre_en_cours", title: "Offre en cours" },
    StepDef { id: "negociation_en_cours", title: "Négociation en cours" },
    StepDef { id: "compromis_signe", title: "Compromis signé" },
    StepDef { id: "signature_notaire", title: "Signature chez le notaire" },
    StepDef { id: "affaire_conclue", title: "Affaire conclue" },
];

/// The final milestone; both parties must validate it before completion.
pub const DEAL_CONCLUDED_STEP: &str = "affaire_conclue";

pub fn step_title(step_id: &str) -> Option<&'static str> {
    PROGRESS_STEPS
        .iter()
        .find(|s| s.id == step_id)
        .map(|s| s.title)
}

impl Collaboration {
    pub const COLLECTION: &'static str = "collaborations";

    /// The step list every new collaboration starts with.
    pub fn seed_steps() -> Vec<ProgressStep> {
        PROGRESS_STEPS
            .iter()
            .map(|def| ProgressStep {
                id: def.id.to_string(),
                completed: false,
                owner_validated: false,
                collaborator_validated: false,
                notes: Vec::new(),
            })
            .collect()
    }

    pub fn is_participant(&self, actor_id: ObjectId) -> bool {
        self.post_owner_id == actor_id || self.collaborator_id == actor_id
    }

    /// Owner wins when an actor somehow holds both sides.
    pub fn participant_role(&self, actor_id: ObjectId) -> Option<ParticipantRole> {
        if self.post_owner_id == actor_id {
            Some(ParticipantRole::Owner)
        } else if self.collaborator_id == actor_id {
            Some(ParticipantRole::Collaborator)
        } else {
            None
        }
    }

    pub fn append_activity(
        &mut self,
        activity_type: ActivityType,
        message: impl Into<String>,
        created_by: ObjectId,
        now: DateTime,
    ) {
        self.activities.push(Activity {
            activity_type,
            message: message.into(),
            created_by,
            created_at: now,
        });
    }

    /// Records one or both signatures. "Is owner" and "is collaborator" are
    /// independent booleans: an actor holding both sides signs both.
    /// Returns `true` when this call activated the collaboration.
    pub fn record_signature(
        &mut self,
        as_owner: bool,
        as_collaborator: bool,
        now: DateTime,
    ) -> bool {
        if as_owner {
            self.owner_signed = true;
            self.owner_signed_at = Some(now);
        }
        if as_collaborator {
            self.collaborator_signed = true;
            self.collaborator_signed_at = Some(now);
        }

        if self.owner_signed
            && self.collaborator_signed
            && self.status == CollaborationStatus::Accepted
        {
            self.status = CollaborationStatus::Active;
            self.current_step = "active".to_string();
            return true;
        }
        false
    }

    /// A modifying contract edit voids both signatures.
    pub fn invalidate_signatures(&mut self, editor: ParticipantRole, now: DateTime) {
        self.owner_signed = false;
        self.owner_signed_at = None;
        self.collaborator_signed = false;
        self.collaborator_signed_at = None;
        self.contract_modified = true;
        self.contract_last_modified_by = Some(editor);
        self.contract_last_modified_at = Some(now);
    }

    /// Sole writer of progress-step state. Marks the given side's
    /// validation and flips `completed` once both sides have validated.
    /// Returns `false` when the step id is not one of the ten milestones.
    pub fn validate_step(
        &mut self,
        step_id: &str,
        role: ParticipantRole,
        note: Option<String>,
    ) -> bool {
        let Some(step) = self.progress_steps.iter_mut().find(|s| s.id == step_id) else {
            return false;
        };
        match role {
            ParticipantRole::Owner => step.owner_validated = true,
            ParticipantRole::Collaborator => step.collaborator_validated = true,
            ParticipantRole::Admin => {
                step.owner_validated = true;
                step.collaborator_validated = true;
            }
        }
        step.completed = step.owner_validated && step.collaborator_validated;
        if let Some(note) = note {
            step.notes.push(note);
        }
        true
    }

    pub fn deal_concluded_validated_by_both(&self) -> bool {
        self.progress_steps
            .iter()
            .find(|s| s.id == DEAL_CONCLUDED_STEP)
            .is_some_and(|s| s.owner_validated && s.collaborator_validated)
    }

    /// Marks only the final milestone validated by both sides; the narrow
    /// admin path for deals finished in substance but never clicked through.
    pub fn force_validate_deal_concluded(&mut self) {
        if let Some(step) = self
            .progress_steps
            .iter_mut()
            .find(|s| s.id == DEAL_CONCLUDED_STEP)
        {
            step.owner_validated = true;
            step.collaborator_validated = true;
            step.completed = true;
        }
    }

    /// Terminal completion stamping. Steps may legitimately be skipped in
    /// practice, so completion force-closes all of them.
    pub fn stamp_completion(
        &mut self,
        completed_by: ObjectId,
        role: ParticipantRole,
        reason: CompletionReason,
        now: DateTime,
    ) {
        for step in &mut self.progress_steps {
            step.completed = true;
            step.owner_validated = true;
            step.collaborator_validated = true;
        }
        self.status = CollaborationStatus::Completed;
        self.current_step = "completed".to_string();
        self.completed_at = Some(now);
        self.completed_by = Some(completed_by);
        self.completed_by_role = Some(role);
        self.completion_reason = Some(reason);
    }
}
