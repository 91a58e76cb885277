use serde_json::Value;

use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn propose_creates_pending_collaboration() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("propose").await;

    let json = app
        .get_collab(&collab.collab_id, &collab.collaborator.access_token)
        .await;

    assert_eq!(json["status"], "pending");
    assert_eq!(json["current_step"], "proposal");
    assert_eq!(json["post_owner_id"], collab.owner.id);
    assert_eq!(json["collaborator_id"], collab.collaborator.id);
    assert_eq!(json["proposed_commission"], 20.0);
    assert_eq!(json["owner_signed"], false);
    assert_eq!(json["collaborator_signed"], false);

    let steps = json["progress_steps"].as_array().unwrap();
    assert_eq!(steps.len(), 10);
    assert_eq!(steps[0]["id"], "accord_collaboration");
    assert_eq!(steps[9]["id"], "affaire_conclue");
    assert!(steps.iter().all(|s| s["completed"] == false));

    let activities = json["activities"].as_array().unwrap();
    assert_eq!(activities.len(), 1);
    assert_eq!(activities[0]["activity_type"], "proposal");
}

#[tokio::test]
async fn cannot_propose_on_own_listing() {
    let app = TestApp::spawn().await;
    let owner = app
        .register_user("self@test.fr", "Self Owner", "password123", "agent")
        .await;
    let property_id = app.create_property(&owner.access_token, "Appartement T3").await;

    let resp = app
        .auth_post("/api/collaboration", &owner.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": property_id,
            "proposed_commission": 20.0,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn referral_partner_cannot_propose() {
    let app = TestApp::spawn().await;
    let owner = app
        .register_user("rp-owner@test.fr", "Agent Owner", "password123", "agent")
        .await;
    let partner = app
        .register_user(
            "partner@test.fr",
            "Partner",
            "password123",
            "referral_partner",
        )
        .await;
    let property_id = app.create_property(&owner.access_token, "Studio").await;

    let resp = app
        .auth_post("/api/collaboration", &partner.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": property_id,
            "proposed_commission": 20.0,
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn commission_capped_when_owner_is_referral_partner() {
    let app = TestApp::spawn().await;
    let owner = app
        .register_user(
            "cap-owner@test.fr",
            "Referral Owner",
            "password123",
            "referral_partner",
        )
        .await;
    let agent = app
        .register_user("cap-agent@test.fr", "Agent", "password123", "agent")
        .await;
    let property_id = app.create_property(&owner.access_token, "Villa").await;

    let resp = app
        .auth_post("/api/collaboration", &agent.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": property_id,
            "proposed_commission": 50.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let resp = app
        .auth_post("/api/collaboration", &agent.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": property_id,
            "proposed_commission": 40.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn one_live_collaboration_per_post() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("excl").await;

    // Same collaborator proposing again
    let resp = app
        .auth_post("/api/collaboration", &collab.collaborator.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": collab.property_id,
            "proposed_commission": 25.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("already have a collaboration in progress"));

    // A third party while the first proposal is still live
    let third = app
        .register_user("excl-third@test.fr", "Third Agent", "password123", "agent")
        .await;
    let resp = app
        .auth_post("/api/collaboration", &third.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": collab.property_id,
            "proposed_commission": 25.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);
    let json: Value = resp.json().await.unwrap();
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("another partner"));
}

#[tokio::test]
async fn rejection_allows_a_new_proposal() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("reject").await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/respond", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "decision": "rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "rejected");

    // The same pair can start over
    let resp = app
        .auth_post("/api/collaboration", &collab.collaborator.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": collab.property_id,
            "proposed_commission": 15.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "pending");
    assert_eq!(json["proposed_commission"], 15.0);
}

#[tokio::test]
async fn conflicting_proposal_leaves_the_pair_history_intact() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("history").await;

    // The first pair's proposal is rejected
    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/respond", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "decision": "rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    // A third party takes the listing in the meantime
    let third = app
        .register_user("history-third@test.fr", "Third Agent", "password123", "agent")
        .await;
    let resp = app
        .auth_post("/api/collaboration", &third.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": collab.property_id,
            "proposed_commission": 25.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    // Re-proposing now conflicts, and must not have eaten the rejected record
    let resp = app
        .auth_post("/api/collaboration", &collab.collaborator.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": collab.property_id,
            "proposed_commission": 20.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 409);

    let resp = app
        .auth_get(
            &format!("/api/collaboration/post/property/{}", collab.property_id),
            &collab.collaborator.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    let mine = json.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["status"], "rejected");
}

#[tokio::test]
async fn only_the_owner_may_respond() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("respond").await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/respond", collab.collab_id),
            &collab.collaborator.access_token,
        )
        .json(&serde_json::json!({ "decision": "accepted" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn responding_twice_is_rejected() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("twice").await;
    app.accept_collab(&collab).await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/respond", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "decision": "rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn non_participant_cannot_view() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("view").await;
    let outsider = app
        .register_user("outsider@test.fr", "Outsider", "password123", "agent")
        .await;

    let resp = app
        .auth_get(
            &format!("/api/collaboration/{}", collab.collab_id),
            &outsider.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn list_returns_collaborations_for_both_sides() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("list").await;

    for token in [&collab.owner.access_token, &collab.collaborator.access_token] {
        let resp = app.auth_get("/api/collaboration", token).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        let json: Value = resp.json().await.unwrap();
        let items = json.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"], collab.collab_id.as_str());
    }
}

#[tokio::test]
async fn notes_require_an_active_collaboration() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("notes").await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/note", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "content": "Trop tôt" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    app.accept_collab(&collab).await;
    app.activate_collab(&collab).await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/note", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "content": "Visite prévue samedi" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let notes: Vec<&str> = json["activities"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|a| a["activity_type"] == "note")
        .map(|a| a["message"].as_str().unwrap())
        .collect();
    assert_eq!(notes, vec!["Visite prévue samedi"]);
}

#[tokio::test]
async fn empty_note_is_rejected() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("empty-note").await;
    app.accept_collab(&collab).await;
    app.activate_collab(&collab).await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/note", collab.collab_id),
            &collab.collaborator.access_token,
        )
        .json(&serde_json::json!({ "content": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn participant_can_cancel_before_completion() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("cancel").await;
    app.accept_collab(&collab).await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/cancel", collab.collab_id),
            &collab.collaborator.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "cancelled");
    assert_eq!(json["current_step"], "cancelled");

    // Cancellation frees the listing for someone else
    let third = app
        .register_user("cancel-third@test.fr", "Third", "password123", "agent")
        .await;
    let resp = app
        .auth_post("/api/collaboration", &third.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": collab.property_id,
            "proposed_commission": 30.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn by_post_lists_history_for_participants() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("bypost").await;

    let resp = app
        .auth_get(
            &format!("/api/collaboration/post/property/{}", collab.property_id),
            &collab.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);

    // An outsider sees nothing for the same post
    let outsider = app
        .register_user("bypost-out@test.fr", "Outsider", "password123", "agent")
        .await;
    let resp = app
        .auth_get(
            &format!("/api/collaboration/post/property/{}", collab.property_id),
            &outsider.access_token,
        )
        .send()
        .await
        .unwrap();
    let json: Value = resp.json().await.unwrap();
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_ids_are_bad_requests() {
    let app = TestApp::spawn().await;
    let user = app
        .register_user("badid@test.fr", "Bad Id", "password123", "agent")
        .await;

    let resp = app
        .auth_get("/api/collaboration/not-an-id", &user.access_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = app
        .auth_post("/api/collaboration", &user.access_token)
        .json(&serde_json::json!({
            "post_type": "property",
            "post_id": "nope",
            "proposed_commission": 20.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn archived_listing_makes_the_collaboration_gone() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("gone").await;

    app.db
        .collection::<bson::Document>("properties")
        .update_one(
            bson::doc! { "_id": bson::oid::ObjectId::parse_str(&collab.property_id).unwrap() },
            bson::doc! { "$set": { "is_archived": true } },
        )
        .await
        .unwrap();

    let resp = app
        .auth_get(
            &format!("/api/collaboration/{}", collab.collab_id),
            &collab.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 410);

    // Admins still see it
    let admin = app
        .register_user("gone-admin@test.fr", "Admin", "password123", "admin")
        .await;
    let resp = app
        .auth_get(
            &format!("/api/collaboration/{}", collab.collab_id),
            &admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn requests_without_a_token_are_unauthorized() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/api/collaboration"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 401);
}
