//! Pure transition rules for the annonce / devis / tracking workflow
//!
//! Every function here takes document snapshots and returns either a
//! decision describing the mutations to apply, or a [`WorkflowError`].
//! Nothing in this module touches the store: the services replay decisions
//! with conditional writes, so two racing actors cannot both win a
//! transition the engine approved from the same stale snapshot.

use uuid::Uuid;

use crate::annonce::{Annonce, AnnonceStatut};
use crate::devis::{Devis, DevisStatut};
use crate::models::{Capability, UserRole};
use crate::tracking::{Tracking, TrackingEvent, TrackingStatut};

use super::error::{WorkflowError, WorkflowResult};

/// The authenticated party performing a workflow operation
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(user_id: Uuid, role: UserRole) -> Self {
        Self { user_id, role }
    }

    fn require(&self, capability: Capability, action: &str) -> WorkflowResult<()> {
        if self.role.can(capability) {
            Ok(())
        } else {
            Err(WorkflowError::Permission(format!(
                "role {:?} cannot {}",
                self.role, action
            )))
        }
    }
}

/// Outcome of a quote decision: the new quote status, and the listing
/// status to set alongside it when acceptance locks the listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteDecision {
    pub devis_statut: DevisStatut,
    pub annonce_statut: Option<AnnonceStatut>,
}

/// Outcome of a tracking advancement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingDecision {
    /// New current status of the tracking record
    pub statut: TrackingStatut,
    /// First real movement: the accepted quote transitions to `en_cours`
    pub demarre_devis: bool,
    /// Delivery: synchronize devis and annonce to `termine`
    pub terminal: bool,
}

/// Signature captured at delivery
#[derive(Debug, Clone)]
pub struct DeliveryProof {
    pub signature: String,
    pub signataire: String,
}

// ===== Listing operations =====

/// Check that an actor may publish a listing.
pub fn publish_annonce(actor: &Actor) -> WorkflowResult<()> {
    actor.require(Capability::PublishAnnonce, "publish a listing")
}

// ===== Quote operations =====

/// Check that an actor may bid on a listing.
pub fn submit_devis(actor: &Actor, annonce: &Annonce) -> WorkflowResult<()> {
    actor.require(Capability::SubmitDevis, "submit a quote")?;

    if annonce.client_id == actor.user_id {
        return Err(WorkflowError::Permission(
            "cannot bid on your own listing".to_string(),
        ));
    }
    if annonce.statut != AnnonceStatut::Disponible {
        return Err(WorkflowError::StateConflict(format!(
            "listing {} is not open for quotes",
            annonce.id
        )));
    }

    Ok(())
}

/// Accept a pending quote on behalf of the listing owner.
///
/// Accepting locks the listing: sibling pending quotes stay `en_attente`
/// but can no longer be accepted, because the listing leaves `disponible`.
pub fn accept_devis(
    actor: &Actor,
    devis: &Devis,
    annonce: &Annonce,
) -> WorkflowResult<QuoteDecision> {
    actor.require(Capability::DecideDevis, "accept a quote")?;

    if annonce.client_id != actor.user_id {
        return Err(WorkflowError::Permission(
            "only the listing owner can accept a quote".to_string(),
        ));
    }
    if devis.statut != DevisStatut::EnAttente {
        return Err(WorkflowError::StateConflict(format!(
            "quote {} is already resolved",
            devis.id
        )));
    }
    if annonce.statut != AnnonceStatut::Disponible {
        return Err(WorkflowError::StateConflict(format!(
            "listing {} already has an accepted quote or is closed",
            annonce.id
        )));
    }

    Ok(QuoteDecision {
        devis_statut: DevisStatut::Accepte,
        annonce_statut: Some(AnnonceStatut::EnCours),
    })
}

/// Refuse a pending quote on behalf of the listing owner.
///
/// The listing stays open for the remaining quotes.
pub fn refuse_devis(
    actor: &Actor,
    devis: &Devis,
    annonce: &Annonce,
) -> WorkflowResult<QuoteDecision> {
    actor.require(Capability::DecideDevis, "refuse a quote")?;

    if annonce.client_id != actor.user_id {
        return Err(WorkflowError::Permission(
            "only the listing owner can refuse a quote".to_string(),
        ));
    }
    if devis.statut != DevisStatut::EnAttente {
        return Err(WorkflowError::StateConflict(format!(
            "quote {} is already resolved",
            devis.id
        )));
    }

    Ok(QuoteDecision {
        devis_statut: DevisStatut::Refuse,
        annonce_statut: None,
    })
}

/// Withdraw a pending quote on behalf of the bidding transporter.
pub fn cancel_devis(actor: &Actor, devis: &Devis) -> WorkflowResult<QuoteDecision> {
    actor.require(Capability::SubmitDevis, "cancel a quote")?;

    if devis.transporteur_id != actor.user_id {
        return Err(WorkflowError::Permission(
            "only the bidding transporter can cancel a quote".to_string(),
        ));
    }
    if devis.statut != DevisStatut::EnAttente {
        return Err(WorkflowError::StateConflict(format!(
            "quote {} is already resolved",
            devis.id
        )));
    }

    Ok(QuoteDecision {
        devis_statut: DevisStatut::Annule,
        annonce_statut: None,
    })
}

// ===== Listing guards =====

/// Check that an actor may edit or delete a listing.
///
/// Major edits and deletion are gated on `disponible`: once a quote is
/// accepted the listing document is part of a running transport.
pub fn modify_annonce(actor: &Actor, annonce: &Annonce) -> WorkflowResult<()> {
    actor.require(Capability::PublishAnnonce, "modify a listing")?;

    if annonce.client_id != actor.user_id {
        return Err(WorkflowError::Permission(
            "only the listing owner can modify it".to_string(),
        ));
    }
    if annonce.statut != AnnonceStatut::Disponible {
        return Err(WorkflowError::StateConflict(format!(
            "listing {} can no longer be modified",
            annonce.id
        )));
    }

    Ok(())
}

/// Check that an actor may cancel a listing (any state before `termine`).
pub fn cancel_annonce(actor: &Actor, annonce: &Annonce) -> WorkflowResult<()> {
    actor.require(Capability::PublishAnnonce, "cancel a listing")?;

    if annonce.client_id != actor.user_id {
        return Err(WorkflowError::Permission(
            "only the listing owner can cancel it".to_string(),
        ));
    }
    match annonce.statut {
        AnnonceStatut::Disponible | AnnonceStatut::EnCours => Ok(()),
        AnnonceStatut::Termine | AnnonceStatut::Annule => {
            Err(WorkflowError::StateConflict(format!(
                "listing {} is already closed",
                annonce.id
            )))
        }
    }
}

// ===== Tracking operations =====

/// Furthest normal (ordered) status reached by this shipment.
///
/// `probleme` entries are skipped: a problem report does not move the
/// progression, and advancement resumes one step past this value.
pub fn progression(tracking: Option<&Tracking>, history: &[TrackingEvent]) -> TrackingStatut {
    let mut best = TrackingStatut::EnAttente;
    let mut best_rank = 0u8;

    let statuts = history
        .iter()
        .map(|e| e.statut)
        .chain(tracking.map(|t| t.statut));
    for statut in statuts {
        if let Some(rank) = statut.rank() {
            if rank > best_rank {
                best_rank = rank;
                best = statut;
            }
        }
    }

    best
}

/// Decide a shipment status advancement.
///
/// `tracking` is `None` before the first update (the record is created
/// lazily at `en_attente`). Rules:
/// - the actor must be the transporter holding the accepted quote;
/// - normal statuses advance strictly one step along the ordering;
/// - `probleme` is reachable from any non-terminal state;
/// - re-submitting the current status appends a history event without
///   moving the status or duplicating terminal side effects;
/// - `livre` requires a non-empty signature and signer name, and flags the
///   devis/annonce synchronization to `termine`.
pub fn advance_tracking(
    actor: &Actor,
    devis: &Devis,
    tracking: Option<&Tracking>,
    history: &[TrackingEvent],
    nouveau: TrackingStatut,
    preuve: Option<&DeliveryProof>,
) -> WorkflowResult<TrackingDecision> {
    actor.require(Capability::AdvanceTracking, "advance a shipment")?;

    if devis.transporteur_id != actor.user_id {
        return Err(WorkflowError::Permission(
            "only the assigned transporter can advance this shipment".to_string(),
        ));
    }

    let current = tracking.map(|t| t.statut).unwrap_or(TrackingStatut::EnAttente);
    let re_report = nouveau == current;

    if re_report {
        // A delivered shipment may still be re-reported (the quote is
        // already `termine` by then); anything else needs a live quote.
        if !current.is_terminal() && !devis.statut.is_live_accepted() {
            return Err(WorkflowError::StateConflict(format!(
                "quote {} is not the live accepted quote",
                devis.id
            )));
        }
    } else {
        if !devis.statut.is_live_accepted() {
            return Err(WorkflowError::StateConflict(format!(
                "quote {} is not the live accepted quote",
                devis.id
            )));
        }
        if current.is_terminal() {
            return Err(WorkflowError::StateConflict(
                "shipment is already delivered".to_string(),
            ));
        }
        if nouveau != TrackingStatut::Probleme {
            let furthest = progression(tracking, history);
            // rank() is Some for every non-probleme status
            let expected = furthest.rank().unwrap_or(0) + 1;
            if nouveau.rank() != Some(expected) {
                return Err(WorkflowError::StateConflict(format!(
                    "cannot move from {:?} to {:?}: one step at a time",
                    current, nouveau
                )));
            }
        }
    }

    if nouveau == TrackingStatut::Livre {
        let preuve = preuve.ok_or_else(|| {
            WorkflowError::Validation("delivery requires a captured signature".to_string())
        })?;
        if preuve.signature.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "signature payload must not be empty".to_string(),
            ));
        }
        if preuve.signataire.trim().is_empty() {
            return Err(WorkflowError::Validation(
                "signer name must not be empty".to_string(),
            ));
        }
    }

    let demarre_devis =
        !re_report && devis.statut == DevisStatut::Accepte && nouveau != TrackingStatut::Probleme;

    Ok(TrackingDecision {
        statut: nouveau,
        demarre_devis,
        terminal: nouveau == TrackingStatut::Livre,
    })
}
