mod common;

use anyhow::Result;
use common::{lead, ApiClient};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn create_applies_defaults() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;

    let created = api
        .create_lead(json!({
            "firstName": "John",
            "lastName": "Doe",
            "email": "John.Doe@Company1.com",
            "company": "Tech Corp",
            "source": "google_ads"
        }))
        .await?;

    assert!(created["id"].as_str().is_some());
    assert_eq!(created["email"], "john.doe@company1.com");
    assert_eq!(created["source"], "google_ads");
    assert_eq!(created["status"], "new");
    assert_eq!(created["score"], 0);
    assert_eq!(created["isQualified"], false);
    assert!(created["createdAt"].as_str().is_some());
    Ok(())
}

#[tokio::test]
async fn create_reports_field_errors() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;

    let res = api
        .post("/api/leads")
        .json(&json!({ "firstName": "No", "lastName": "Source", "email": "nosource@x.com", "score": 101 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["source"].is_string(), "{}", body);
    assert!(body["field_errors"]["score"].is_string(), "{}", body);
    Ok(())
}

#[tokio::test]
async fn system_fields_are_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;

    let mut body = lead("system@x.com");
    body["ownerId"] = json!("00000000-0000-0000-0000-000000000000");
    let res = api.post("/api/leads").json(&body).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;

    let res = api
        .post("/api/leads")
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn get_update_delete_round() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    let created = api.create_lead(lead("cycle@x.com")).await?;
    let path = format!("/api/leads/{}", created["id"].as_str().unwrap_or_default());

    let fetched = api.get(&path).send().await?;
    assert_eq!(fetched.status(), StatusCode::OK);
    assert_eq!(fetched.json::<Value>().await?["email"], "cycle@x.com");

    let updated = api
        .put(&path)
        .json(&json!({ "status": "qualified", "score": 77, "company": "Acme" }))
        .send()
        .await?;
    assert_eq!(updated.status(), StatusCode::OK);
    let updated = updated.json::<Value>().await?;
    assert_eq!(updated["status"], "qualified");
    assert_eq!(updated["score"], 77);
    assert_eq!(updated["firstName"], "Test");
    assert_eq!(updated["createdAt"], created["createdAt"]);

    let cleared = api.put(&path).json(&json!({ "company": null })).send().await?;
    assert_eq!(cleared.status(), StatusCode::OK);
    assert!(cleared.json::<Value>().await?["company"].is_null());

    let deleted = api.delete(&path).send().await?;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = api.get(&path).send().await?;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    assert_eq!(gone.json::<Value>().await?["error"], "Lead not found");

    let again = api.delete(&path).send().await?;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn invalid_update_value_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    let created = api.create_lead(lead("badupdate@x.com")).await?;
    let path = format!("/api/leads/{}", created["id"].as_str().unwrap_or_default());

    let res = api.put(&path).json(&json!({ "status": "archived" })).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn leads_are_invisible_to_other_accounts() -> Result<()> {
    let server = common::ensure_server().await?;
    let owner = ApiClient::register(server).await?;
    let stranger = ApiClient::register(server).await?;

    let created = owner.create_lead(lead("private@x.com")).await?;
    let path = format!("/api/leads/{}", created["id"].as_str().unwrap_or_default());

    assert_eq!(stranger.get(&path).send().await?.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        stranger.put(&path).json(&json!({ "score": 5 })).send().await?.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(stranger.delete(&path).send().await?.status(), StatusCode::NOT_FOUND);

    let listing = stranger.list_leads(&[]).await?;
    assert_eq!(listing["total"], 0);

    // Same email under a different owner is fine
    stranger.create_lead(lead("private@x.com")).await?;
    assert_eq!(owner.get(&path).send().await?.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_per_owner_conflicts() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    api.create_lead(lead("dup@x.com")).await?;

    let res = api.post("/api/leads").json(&lead("DUP@x.com")).send().await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "Lead with this email already exists");
    assert_eq!(body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn updating_email_checks_uniqueness() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    let first = api.create_lead(lead("first@x.com")).await?;
    api.create_lead(lead("second@x.com")).await?;
    let path = format!("/api/leads/{}", first["id"].as_str().unwrap_or_default());

    let taken = api.put(&path).json(&json!({ "email": "second@x.com" })).send().await?;
    assert_eq!(taken.status(), StatusCode::CONFLICT);

    let unchanged = api.put(&path).json(&json!({ "email": "first@x.com" })).send().await?;
    assert_eq!(unchanged.status(), StatusCode::OK);

    let moved = api.put(&path).json(&json!({ "email": "third@x.com" })).send().await?;
    assert_eq!(moved.status(), StatusCode::OK);
    assert_eq!(moved.json::<Value>().await?["email"], "third@x.com");
    Ok(())
}

#[tokio::test]
async fn non_uuid_id_is_404() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    let res = api.get("/api/leads/not-a-uuid").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
