use bson::{doc, oid::ObjectId};
use serde_json::Value;

use crate::fixtures::seed::SeededCollab;
use crate::fixtures::test_app::TestApp;

async fn active_collab(app: &TestApp, prefix: &str) -> SeededCollab {
    let collab = app.seed_collab(prefix).await;
    app.accept_collab(&collab).await;
    app.activate_collab(&collab).await;
    collab
}

fn step<'a>(json: &'a Value, id: &str) -> &'a Value {
    json["progress_steps"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["id"] == id)
        .unwrap()
}

#[tokio::test]
async fn a_step_completes_when_both_parties_validate() {
    let app = TestApp::spawn().await;
    let collab = active_collab(&app, "step").await;

    let resp = app
        .auth_put(
            &format!("/api/collaboration/{}/progress", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({
            "step": "premier_contact",
            "validated_by": "owner",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let s = step(&json, "premier_contact");
    assert_eq!(s["owner_validated"], true);
    assert_eq!(s["collaborator_validated"], false);
    assert_eq!(s["completed"], false);

    let resp = app
        .auth_put(
            &format!("/api/collaboration/{}/progress", collab.collab_id),
            &collab.collaborator.access_token,
        )
        .json(&serde_json::json!({
            "step": "premier_contact",
            "validated_by": "collaborator",
            "note": "Client contacté par téléphone",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    let s = step(&json, "premier_contact");
    assert_eq!(s["completed"], true);
    assert_eq!(
        s["notes"].as_array().unwrap(),
        &vec![Value::from("Client contacté par téléphone")]
    );
}

#[tokio::test]
async fn nobody_validates_on_behalf_of_the_other_party() {
    let app = TestApp::spawn().await;
    let collab = active_collab(&app, "cross").await;

    let resp = app
        .auth_put(
            &format!("/api/collaboration/{}/progress", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({
            "step": "premier_contact",
            "validated_by": "collaborator",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let json: Value = resp.json().await.unwrap();
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("on behalf of the other party"));
}

#[tokio::test]
async fn unknown_steps_are_rejected() {
    let app = TestApp::spawn().await;
    let collab = active_collab(&app, "unknown").await;

    let resp = app
        .auth_put(
            &format!("/api/collaboration/{}/progress", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({
            "step": "etape_inconnue",
            "validated_by": "owner",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn progress_requires_an_accepted_or_active_collaboration() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("gate").await;

    // Pending: no progress yet
    let resp = app
        .auth_put(
            &format!("/api/collaboration/{}/progress", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({
            "step": "accord_collaboration",
            "validated_by": "owner",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    // Accepted is enough
    app.accept_collab(&collab).await;
    let resp = app
        .auth_put(
            &format!("/api/collaboration/{}/progress", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({
            "step": "accord_collaboration",
            "validated_by": "owner",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
}

#[tokio::test]
async fn completion_requires_both_validations_of_the_final_step() {
    let app = TestApp::spawn().await;
    let collab = active_collab(&app, "final").await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/complete", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "completion_reason": "vente_conclue_collaboration" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
    let json: Value = resp.json().await.unwrap();
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("both parties must validate deal closure"));

    // One-sided validation is still not enough
    let resp = app
        .auth_put(
            &format!("/api/collaboration/{}/progress", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({
            "step": "affaire_conclue",
            "validated_by": "owner",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/complete", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "completion_reason": "vente_conclue_collaboration" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn completing_a_collaborative_sale_closes_everything_and_flips_the_listing() {
    let app = TestApp::spawn().await;
    let collab = active_collab(&app, "close").await;
    app.validate_step_both(&collab, "affaire_conclue").await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/complete", collab.collab_id),
            &collab.collaborator.access_token,
        )
        .json(&serde_json::json!({ "completion_reason": "vente_conclue_collaboration" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();

    assert_eq!(json["status"], "completed");
    assert_eq!(json["current_step"], "completed");
    assert_eq!(json["completion_reason"], "vente_conclue_collaboration");
    assert_eq!(json["completed_by_role"], "collaborator");
    assert!(json["progress_steps"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["completed"] == true));

    // The sale listing is flipped to sold
    let property = app
        .db
        .collection::<bson::Document>("properties")
        .find_one(doc! { "_id": ObjectId::parse_str(&collab.property_id).unwrap() })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(property.get_str("status").unwrap(), "sold");
}

#[tokio::test]
async fn other_completion_reasons_leave_the_listing_untouched() {
    let app = TestApp::spawn().await;
    let collab = active_collab(&app, "untouched").await;
    app.validate_step_both(&collab, "affaire_conclue").await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/complete", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "completion_reason": "client_desiste" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["completion_reason"], "client_desiste");
    assert_eq!(json["completed_by_role"], "owner");

    let property = app
        .db
        .collection::<bson::Document>("properties")
        .find_one(doc! { "_id": ObjectId::parse_str(&collab.property_id).unwrap() })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(property.get_str("status").unwrap(), "active");
}

#[tokio::test]
async fn a_completed_collaboration_cannot_be_cancelled() {
    let app = TestApp::spawn().await;
    let collab = active_collab(&app, "locked").await;
    app.validate_step_both(&collab, "affaire_conclue").await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/complete", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "completion_reason": "vente_conclue_collaboration" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/cancel", collab.collab_id),
            &collab.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}

#[tokio::test]
async fn completion_requires_an_active_collaboration() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("inactive").await;
    app.accept_collab(&collab).await;

    let resp = app
        .auth_post(
            &format!("/api/collaboration/{}/complete", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "completion_reason": "vente_conclue_collaboration" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);
}
