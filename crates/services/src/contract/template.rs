use immolink_db::models::{AccountType, CompensationType};

/// Everything a contract template needs about one party.
#[derive(Debug, Clone)]
pub struct PartyDetails {
    pub display_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub agency_name: Option<String>,
    pub siren: Option<String>,
}

impl PartyDetails {
    fn identity_block(&self) -> String {
        let mut lines = vec![self.display_name.clone()];
        if let Some(agency) = &self.agency_name {
            lines.push(agency.clone());
        }
        if let Some(siren) = &self.siren {
            lines.push(format!("SIREN : {siren}"));
        }
        lines.push(format!("Email : {}", self.email));
        if let Some(phone) = &self.phone {
            lines.push(format!("Téléphone : {phone}"));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct TemplateContext {
    pub owner: PartyDetails,
    pub collaborator: PartyDetails,
    pub post_title: String,
    pub proposed_commission: Option<f64>,
    pub compensation_type: Option<CompensationType>,
    pub compensation_amount: Option<f64>,
}

impl TemplateContext {
    fn compensation_clause(&self) -> String {
        match self.compensation_type {
            Some(CompensationType::FixedAmount) => format!(
                "une rémunération forfaitaire de {:.2} € TTC",
                self.compensation_amount.unwrap_or(0.0)
            ),
            Some(CompensationType::GiftVouchers) => format!(
                "des chèques cadeaux d'une valeur de {:.2} € TTC",
                self.compensation_amount.unwrap_or(0.0)
            ),
            Some(CompensationType::Percentage) | None => format!(
                "une commission de {:.1} % des honoraires perçus sur la transaction",
                self.proposed_commission.unwrap_or(0.0)
            ),
        }
    }
}

/// Contract text generation strategy, selected by the post owner's account
/// category. Adding a jurisdiction/category variant means adding an impl,
/// not branching in the co-signing controller.
pub trait ContractTemplate: Send + Sync {
    fn name(&self) -> &'static str;
    fn render(&self, ctx: &TemplateContext) -> String;
}

/// Inter-agency mandate: the post owner is a listing-management account.
pub struct AgencyMandateTemplate;

impl ContractTemplate for AgencyMandateTemplate {
    fn name(&self) -> &'static str {
        "agency_mandate"
    }

    fn render(&self, ctx: &TemplateContext) -> String {
        format!(
            "CONVENTION DE COLLABORATION INTER-AGENCES\n\
             \n\
             Entre les soussignés :\n\
             \n\
             L'agence mandataire (le « Propriétaire de l'annonce ») :\n{owner}\n\
             \n\
             et\n\
             \n\
             L'agence collaboratrice (le « Collaborateur ») :\n{collaborator}\n\
             \n\
             Objet : {post}\n\
             \n\
             Article 1 — Objet de la convention\n\
             Les parties conviennent de collaborer à la réalisation de la \
             transaction portant sur le bien ou la recherche désigné ci-dessus.\n\
             \n\
             Article 2 — Rémunération\n\
             En cas de réalisation de la transaction par l'intermédiaire du \
             Collaborateur, le Propriétaire de l'annonce lui versera {clause}.\n\
             \n\
             Article 3 — Suivi de la transaction\n\
             Les parties s'engagent à tenir à jour conjointement les étapes \
             d'avancement du dossier sur la plateforme et à valider chacune la \
             conclusion de l'affaire.\n\
             \n\
             Article 4 — Signature\n\
             La présente convention prend effet à la signature des deux \
             parties. Toute modification du texte annule les signatures \
             apposées et impose une nouvelle signature des deux parties.",
            owner = ctx.owner.identity_block(),
            collaborator = ctx.collaborator.identity_block(),
            post = ctx.post_title,
            clause = ctx.compensation_clause(),
        )
    }
}

/// Referral agreement: the post owner is a referral-partner account.
pub struct ReferralAgreementTemplate;

impl ContractTemplate for ReferralAgreementTemplate {
    fn name(&self) -> &'static str {
        "referral_agreement"
    }

    fn render(&self, ctx: &TemplateContext) -> String {
        format!(
            "CONVENTION D'APPORT D'AFFAIRES\n\
             \n\
             Entre les soussignés :\n\
             \n\
             L'apporteur d'affaires :\n{owner}\n\
             \n\
             et\n\
             \n\
             Le professionnel mandaté (le « Collaborateur ») :\n{collaborator}\n\
             \n\
             Objet : {post}\n\
             \n\
             Article 1 — Objet de la convention\n\
             L'apporteur d'affaires met en relation le Collaborateur avec le \
             client concerné par l'annonce désignée ci-dessus.\n\
             \n\
             Article 2 — Rémunération\n\
             En cas de réalisation de la transaction, l'apporteur d'affaires \
             percevra {clause}. Cette rémunération ne peut excéder 50 % des \
             honoraires perçus.\n\
             \n\
             Article 3 — Indépendance des parties\n\
             L'apporteur d'affaires n'accomplit aucun acte d'entremise au sens \
             de la loi Hoguet ; seul le Collaborateur conduit la transaction.\n\
             \n\
             Article 4 — Signature\n\
             La présente convention prend effet à la signature des deux \
             parties. Toute modification du texte annule les signatures \
             apposées et impose une nouvelle signature des deux parties.",
            owner = ctx.owner.identity_block(),
            collaborator = ctx.collaborator.identity_block(),
            post = ctx.post_title,
            clause = ctx.compensation_clause(),
        )
    }
}

/// The single template-selection point.
pub fn template_for(owner_account_type: AccountType) -> &'static dyn ContractTemplate {
    match owner_account_type {
        AccountType::ReferralPartner => &ReferralAgreementTemplate,
        AccountType::Agent | AccountType::Admin => &AgencyMandateTemplate,
    }
}
