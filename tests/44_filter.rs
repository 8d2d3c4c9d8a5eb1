mod common;

use anyhow::Result;
use common::{lead, ApiClient};
use serde_json::{json, Value};

// Each test registers its own account, so listings only see the leads it creates.

fn emails(page: &Value) -> Vec<String> {
    let mut out: Vec<String> = page["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["email"].as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    out.sort();
    out
}

async fn seed_scores(api: &ApiClient, scores: &[i64]) -> Result<()> {
    for (i, score) in scores.iter().enumerate() {
        let mut body = lead(&format!("score{}@x.com", i));
        body["score"] = json!(score);
        api.create_lead(body).await?;
    }
    Ok(())
}

#[tokio::test]
async fn bracket_notation_between_is_inclusive() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    seed_scores(&api, &[10, 20, 35, 50, 51]).await?;

    let page = api
        .list_leads(&[
            ("score[operator]", "between"),
            ("score[value][min]", "20"),
            ("score[value][max]", "50"),
        ])
        .await?;

    let mut scores: Vec<i64> = page["data"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["score"].as_i64()).collect())
        .unwrap_or_default();
    scores.sort();
    assert_eq!(scores, vec![20, 35, 50]);
    assert_eq!(page["total"], 3);
    Ok(())
}

#[tokio::test]
async fn fractional_score_bounds() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    seed_scores(&api, &[49, 50, 75]).await?;

    let page = api.list_leads(&[("score[operator]", "gt"), ("score[value]", "49.5")]).await?;
    assert_eq!(page["total"], 2);

    let page = api
        .list_leads(&[
            ("score[operator]", "between"),
            ("score[value][min]", "49.5"),
            ("score[value][max]", "74.9"),
        ])
        .await?;
    assert_eq!(emails(&page), vec!["score1@x.com"]);
    Ok(())
}

#[tokio::test]
async fn json_literal_contains_ignores_case() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;

    let mut tech = lead("tech@x.com");
    tech["company"] = json!("Tech Corp");
    api.create_lead(tech).await?;
    let mut other = lead("other@x.com");
    other["company"] = json!("Marketing Inc");
    api.create_lead(other).await?;

    let filter = json!({ "operator": "contains", "value": "tech" }).to_string();
    let page = api.list_leads(&[("company", filter.as_str())]).await?;
    assert_eq!(emails(&page), vec!["tech@x.com"]);
    Ok(())
}

#[tokio::test]
async fn status_in_and_bare_boolean() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;

    for (email, status, qualified) in [
        ("new@x.com", "new", false),
        ("won@x.com", "won", true),
        ("lost@x.com", "lost", true),
    ] {
        let mut body = lead(email);
        body["status"] = json!(status);
        body["isQualified"] = json!(qualified);
        api.create_lead(body).await?;
    }

    let page = api
        .list_leads(&[("status[operator]", "in"), ("status[value]", "new,won")])
        .await?;
    assert_eq!(emails(&page), vec!["new@x.com", "won@x.com"]);

    let page = api.list_leads(&[("is_qualified", "true")]).await?;
    assert_eq!(emails(&page), vec!["lost@x.com", "won@x.com"]);

    let page = api
        .list_leads(&[("is_qualified", "true"), ("status[operator]", "equals"), ("status[value]", "won")])
        .await?;
    assert_eq!(emails(&page), vec!["won@x.com"]);
    Ok(())
}

#[tokio::test]
async fn unsupported_operator_is_ignored() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    seed_scores(&api, &[1, 2]).await?;

    // `contains` is not a numeric operator: the filter is dropped, not rejected
    let page = api
        .list_leads(&[("score[operator]", "contains"), ("score[value]", "1"), ("unknown_field", "x")])
        .await?;
    assert_eq!(page["total"], 2);
    Ok(())
}

#[tokio::test]
async fn malformed_value_is_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;

    let res = api
        .get("/api/leads")
        .query(&[("score[operator]", "gt"), ("score[value]", "high")])
        .send()
        .await?;
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["score"].is_string(), "{}", body);
    Ok(())
}

#[tokio::test]
async fn created_at_window() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    api.create_lead(lead("recent@x.com")).await?;

    let page = api
        .list_leads(&[("created_at[operator]", "after"), ("created_at[value]", "2000-01-01")])
        .await?;
    assert_eq!(page["total"], 1);

    let page = api
        .list_leads(&[("created_at[operator]", "before"), ("created_at[value]", "2000-01-01")])
        .await?;
    assert_eq!(page["total"], 0);
    Ok(())
}

#[tokio::test]
async fn pagination_envelope_and_order() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    for i in 0..25 {
        api.create_lead(lead(&format!("page{:02}@x.com", i))).await?;
    }

    let first = api.list_leads(&[("limit", "10")]).await?;
    assert_eq!(first["total"], 25);
    assert_eq!(first["totalPages"], 3);
    assert_eq!(first["page"], 1);
    assert_eq!(first["limit"], 10);
    // Newest first
    assert_eq!(first["data"][0]["email"], "page24@x.com");

    let last = api.list_leads(&[("limit", "10"), ("page", "3")]).await?;
    assert_eq!(last["data"].as_array().map(Vec::len), Some(5));
    assert_eq!(last["data"][4]["email"], "page00@x.com");

    let beyond = api.list_leads(&[("limit", "10"), ("page", "9")]).await?;
    assert_eq!(beyond["data"].as_array().map(Vec::len), Some(0));
    assert_eq!(beyond["total"], 25);

    let capped = api.list_leads(&[("limit", "500")]).await?;
    assert_eq!(capped["limit"], 100);

    let defaults = api.list_leads(&[("limit", "abc"), ("page", "-2")]).await?;
    assert_eq!(defaults["limit"], 20);
    assert_eq!(defaults["page"], 1);
    Ok(())
}

#[tokio::test]
async fn empty_listing_has_zero_pages() -> Result<()> {
    let server = common::ensure_server().await?;
    let api = ApiClient::register(server).await?;
    let page = api.list_leads(&[]).await?;
    assert_eq!(page["total"], 0);
    assert_eq!(page["totalPages"], 0);
    assert_eq!(page["data"], json!([]));
    Ok(())
}
