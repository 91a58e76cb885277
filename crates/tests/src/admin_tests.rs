use serde_json::Value;

use crate::fixtures::seed::SeededUser;
use crate::fixtures::test_app::TestApp;

async fn register_admin(app: &TestApp, prefix: &str) -> SeededUser {
    app.register_user(
        &format!("{prefix}-admin@test.fr"),
        &format!("{prefix} Admin"),
        "password123",
        "admin",
    )
    .await
}

#[tokio::test]
async fn the_override_surface_requires_the_admin_role() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("guard").await;

    let resp = app
        .auth_post(
            &format!("/api/admin/collaboration/{}/force-close", collab.collab_id),
            &collab.owner.access_token,
        )
        .json(&serde_json::json!({ "mode": "cancel" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 403);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["message"], "Administrator access required");
}

#[tokio::test]
async fn admin_can_view_any_collaboration() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("adminview").await;
    let admin = register_admin(&app, "adminview").await;

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
async fn force_close_cancels_regardless_of_state() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("fclose").await;
    let admin = register_admin(&app, "fclose").await;

    let resp = app
        .auth_post(
            &format!("/api/admin/collaboration/{}/force-close", collab.collab_id),
            &admin.access_token,
        )
        .json(&serde_json::json!({ "mode": "cancel" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "cancelled");
    assert_eq!(json["current_step"], "cancelled");
}

#[tokio::test]
async fn force_close_complete_defaults_to_sans_suite() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("fcomplete").await;
    app.accept_collab(&collab).await;
    let admin = register_admin(&app, "fcomplete").await;

    let resp = app
        .auth_post(
            &format!("/api/admin/collaboration/{}/force-close", collab.collab_id),
            &admin.access_token,
        )
        .json(&serde_json::json!({ "mode": "complete" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["completion_reason"], "sans_suite");
    assert_eq!(json["completed_by_role"], "admin");
}

#[tokio::test]
async fn force_complete_bypasses_the_dual_validation_gate() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("bypass").await;
    app.accept_collab(&collab).await;
    app.activate_collab(&collab).await;
    let admin = register_admin(&app, "bypass").await;

    // Neither party validated the final step; an admin closes it anyway.
    let resp = app
        .auth_post(
            &format!(
                "/api/admin/collaboration/{}/force-complete",
                collab.collab_id
            ),
            &admin.access_token,
        )
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["status"], "completed");
    assert_eq!(json["completion_reason"], "vente_conclue_collaboration");
    assert_eq!(json["completed_by_role"], "admin");
    assert!(json["progress_steps"]
        .as_array()
        .unwrap()
        .iter()
        .all(|s| s["completed"] == true));
}

#[tokio::test]
async fn admin_update_sets_whitelisted_fields_directly() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("override").await;
    let admin = register_admin(&app, "override").await;

    let resp = app
        .auth_put(
            &format!("/api/admin/collaboration/{}", collab.collab_id),
            &admin.access_token,
        )
        .json(&serde_json::json!({
            "proposed_commission": 35.0,
            "status": "active",
            "current_step": "active",
            "note": "Litige résolu par le support",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();

    assert_eq!(json["proposed_commission"], 35.0);
    assert_eq!(json["status"], "active");
    assert_eq!(json["current_step"], "active");
    let messages: Vec<&str> = json["activities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["message"].as_str().unwrap())
        .collect();
    assert!(messages.contains(&"Admin: Litige résolu par le support"));
}

#[tokio::test]
async fn admin_delete_removes_the_record() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("purge").await;
    let admin = register_admin(&app, "purge").await;

    let resp = app
        .auth_delete(
            &format!("/api/admin/collaboration/{}", collab.collab_id),
            &admin.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
    let json: Value = resp.json().await.unwrap();
    assert_eq!(json["deleted"], true);

    let resp = app
        .auth_get(
            &format!("/api/collaboration/{}", collab.collab_id),
            &collab.owner.access_token,
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn deleting_twice_is_a_not_found() {
    let app = TestApp::spawn().await;
    let collab = app.seed_collab("gone").await;
    let admin = register_admin(&app, "gone").await;

    let path = format!("/api/admin/collaboration/{}", collab.collab_id);
    let resp = app.auth_delete(&path, &admin.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app.auth_delete(&path, &admin.access_token).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
