//! Database-backed workflow tests
//!
//! These exercise the conditional-update paths the pure scenario tests
//! cannot: the acceptance compare-and-swap, the transactional delivery
//! synchronization and the expiry sweep.

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use sqlx::PgPool;
    use uuid::Uuid;

    use protrans_server::annonce::{
        AnnonceService, AnnonceStatut, CreateAnnonceRequest, TypeTransport,
    };
    use protrans_server::devis::{CreateDevisRequest, DevisService, DevisStatut};
    use protrans_server::models::UserRole;
    use protrans_server::tracking::{TrackingService, TrackingStatut};
    use protrans_server::workflow::{Actor, DeliveryProof, WorkflowError};

    /// Helper to create a test database pool
    async fn setup_test_db() -> PgPool {
        let database_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/protrans_test".to_string());

        sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database")
    }

    fn listing_request(days_until_departure: i64) -> CreateAnnonceRequest {
        CreateAnnonceRequest {
            titre: "Cartons de déménagement".to_string(),
            description: "Une vingtaine de cartons".to_string(),
            type_transport: TypeTransport::Demenagement,
            ville_depart: "Nantes".to_string(),
            adresse_depart: "5 rue Crébillon".to_string(),
            ville_arrivee: "Rennes".to_string(),
            adresse_arrivee: "2 place Sainte-Anne".to_string(),
            date_depart: Utc::now() + Duration::days(days_until_departure),
            poids: Some(300.0),
            volume: Some(4.0),
            dimensions: None,
            valeur_declaree: None,
            urgent: false,
            photos: vec![],
        }
    }

    fn quote_request(annonce_id: Uuid, montant: i64) -> CreateDevisRequest {
        CreateDevisRequest {
            annonce_id,
            montant,
            message: "Disponible ce week-end".to_string(),
            date_livraison_prevue: None,
        }
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_second_acceptance_loses_the_race() {
        let db_pool = setup_test_db().await;
        let annonces = AnnonceService::new(db_pool.clone());
        let devis = DevisService::new(db_pool.clone());

        let owner = Actor::new(Uuid::new_v4(), UserRole::Client);
        let t1 = Actor::new(Uuid::new_v4(), UserRole::Transporteur);
        let t2 = Actor::new(Uuid::new_v4(), UserRole::Transporteur);

        let annonce = annonces.create(&owner, listing_request(7)).await.unwrap();
        let q1 = devis
            .create(&t1, quote_request(annonce.id, 10_000))
            .await
            .unwrap();
        let q2 = devis
            .create(&t2, quote_request(annonce.id, 12_000))
            .await
            .unwrap();

        let accepted = devis.accept(&owner, &q1.id).await.unwrap();
        assert_eq!(accepted.statut, DevisStatut::Accepte);

        let listing = annonces.get(&annonce.id).await.unwrap();
        assert_eq!(listing.statut, AnnonceStatut::EnCours);

        // The sibling can no longer win
        let second = devis.accept(&owner, &q2.id).await;
        assert!(matches!(second, Err(WorkflowError::StateConflict(_))));

        // And it stays pending, only unacceptable
        let sibling = devis.get(&q2.id).await.unwrap();
        assert_eq!(sibling.statut, DevisStatut::EnAttente);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_delivery_synchronizes_all_three_documents() {
        let db_pool = setup_test_db().await;
        let annonces = AnnonceService::new(db_pool.clone());
        let devis = DevisService::new(db_pool.clone());
        let trackings = TrackingService::new(db_pool.clone());

        let owner = Actor::new(Uuid::new_v4(), UserRole::Client);
        let transporteur = Actor::new(Uuid::new_v4(), UserRole::Transporteur);

        let annonce = annonces.create(&owner, listing_request(3)).await.unwrap();
        let quote = devis
            .create(&transporteur, quote_request(annonce.id, 15_000))
            .await
            .unwrap();
        devis.accept(&owner, &quote.id).await.unwrap();

        for statut in [
            TrackingStatut::PrisEnCharge,
            TrackingStatut::EnTransit,
            TrackingStatut::EnLivraison,
        ] {
            trackings
                .advance(&transporteur, &annonce.id, statut, None, None, None)
                .await
                .unwrap();
        }

        let preuve = DeliveryProof {
            signature: "data:image/png;base64,SIGNED".to_string(),
            signataire: "Jean Dupont".to_string(),
        };
        let delivered = trackings
            .advance(
                &transporteur,
                &annonce.id,
                TrackingStatut::Livre,
                Some("Remis en main propre".to_string()),
                None,
                Some(preuve.clone()),
            )
            .await
            .unwrap();

        assert_eq!(delivered.tracking.statut, TrackingStatut::Livre);
        assert_eq!(delivered.tracking.signataire.as_deref(), Some("Jean Dupont"));
        assert_eq!(delivered.evenements.len(), 4);

        let final_quote = devis.get(&quote.id).await.unwrap();
        assert_eq!(final_quote.statut, DevisStatut::Termine);

        let final_listing = annonces.get(&annonce.id).await.unwrap();
        assert_eq!(final_listing.statut, AnnonceStatut::Termine);

        // Replayed delivery appends a history event, nothing else changes
        let replayed = trackings
            .advance(
                &transporteur,
                &annonce.id,
                TrackingStatut::Livre,
                None,
                None,
                Some(preuve),
            )
            .await
            .unwrap();
        assert_eq!(replayed.evenements.len(), 5);
        assert_eq!(replayed.tracking.statut, TrackingStatut::Livre);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_skipping_a_tracking_step_is_rejected() {
        let db_pool = setup_test_db().await;
        let annonces = AnnonceService::new(db_pool.clone());
        let devis = DevisService::new(db_pool.clone());
        let trackings = TrackingService::new(db_pool.clone());

        let owner = Actor::new(Uuid::new_v4(), UserRole::Client);
        let transporteur = Actor::new(Uuid::new_v4(), UserRole::Transporteur);

        let annonce = annonces.create(&owner, listing_request(3)).await.unwrap();
        let quote = devis
            .create(&transporteur, quote_request(annonce.id, 9_000))
            .await
            .unwrap();
        devis.accept(&owner, &quote.id).await.unwrap();

        let skipped = trackings
            .advance(
                &transporteur,
                &annonce.id,
                TrackingStatut::EnTransit,
                None,
                None,
                None,
            )
            .await;
        assert!(matches!(skipped, Err(WorkflowError::StateConflict(_))));
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_concurrent_first_advancements_never_surface_db_errors() {
        let db_pool = setup_test_db().await;
        let annonces = AnnonceService::new(db_pool.clone());
        let devis = DevisService::new(db_pool.clone());
        let trackings = TrackingService::new(db_pool.clone());

        let owner = Actor::new(Uuid::new_v4(), UserRole::Client);
        let transporteur = Actor::new(Uuid::new_v4(), UserRole::Transporteur);

        let annonce = annonces.create(&owner, listing_request(3)).await.unwrap();
        let quote = devis
            .create(&transporteur, quote_request(annonce.id, 9_000))
            .await
            .unwrap();
        devis.accept(&owner, &quote.id).await.unwrap();

        // Both racers see no tracking record yet; the loser of the lazy
        // creation must get a state conflict, not a database error
        let (r1, r2) = tokio::join!(
            trackings.advance(
                &transporteur,
                &annonce.id,
                TrackingStatut::PrisEnCharge,
                None,
                None,
                None,
            ),
            trackings.advance(
                &transporteur,
                &annonce.id,
                TrackingStatut::PrisEnCharge,
                None,
                None,
                None,
            ),
        );

        assert!(r1.is_ok() || r2.is_ok());
        for result in [r1, r2] {
            if let Err(e) = result {
                assert!(matches!(e, WorkflowError::StateConflict(_)));
            }
        }

        let tracking = trackings.get(&annonce.id).await.unwrap();
        assert_eq!(tracking.tracking.statut, TrackingStatut::PrisEnCharge);
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_expiry_sweep_only_touches_stale_pending_quotes() {
        let db_pool = setup_test_db().await;
        let annonces = AnnonceService::new(db_pool.clone());
        let devis = DevisService::new(db_pool.clone());

        let owner = Actor::new(Uuid::new_v4(), UserRole::Client);
        let transporteur = Actor::new(Uuid::new_v4(), UserRole::Transporteur);

        // Departure already passed
        let stale = annonces.create(&owner, listing_request(-1)).await.unwrap();
        let stale_quote = devis
            .create(&transporteur, quote_request(stale.id, 7_000))
            .await
            .unwrap();

        // Departure in the future
        let fresh = annonces.create(&owner, listing_request(7)).await.unwrap();
        let fresh_quote = devis
            .create(&transporteur, quote_request(fresh.id, 7_000))
            .await
            .unwrap();

        let expired = devis.expire_stale().await.unwrap();
        assert!(expired.contains(&stale_quote.id));
        assert!(!expired.contains(&fresh_quote.id));

        assert_eq!(
            devis.get(&stale_quote.id).await.unwrap().statut,
            DevisStatut::Expire
        );
        assert_eq!(
            devis.get(&fresh_quote.id).await.unwrap().statut,
            DevisStatut::EnAttente
        );
    }

    #[tokio::test]
    #[ignore] // Requires database setup
    async fn test_cancel_listing_cancels_the_live_quote() {
        let db_pool = setup_test_db().await;
        let annonces = AnnonceService::new(db_pool.clone());
        let devis = DevisService::new(db_pool.clone());

        let owner = Actor::new(Uuid::new_v4(), UserRole::Client);
        let transporteur = Actor::new(Uuid::new_v4(), UserRole::Transporteur);

        let annonce = annonces.create(&owner, listing_request(5)).await.unwrap();
        let quote = devis
            .create(&transporteur, quote_request(annonce.id, 11_000))
            .await
            .unwrap();
        devis.accept(&owner, &quote.id).await.unwrap();

        let cancelled = annonces.cancel(&owner, &annonce.id).await.unwrap();
        assert_eq!(cancelled.statut, AnnonceStatut::Annule);

        assert_eq!(
            devis.get(&quote.id).await.unwrap().statut,
            DevisStatut::Annule
        );
    }
}
