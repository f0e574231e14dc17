use std::net::SocketAddr;

use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use migration::MigratorTrait;
use reqwest::StatusCode as HttpStatusCode;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use server::routes::{self, auth};
use service::storage::StorageSigner;

fn cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

struct TestApp {
    base_url: String,
    db: DatabaseConnection,
}

async fn start_server() -> anyhow::Result<TestApp> {
    // Ensure models prefer env over config file
    std::env::set_var("CONFIG_PATH", "/nonexistent-config-for-tests.toml");

    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL missing; skip e2e tests. Provide .env.test or env var.");
        return Err(anyhow::anyhow!("missing DATABASE_URL"));
    }

    let db = models::db::connect().await?;
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("migrations notice: {}", e);
    }

    let state = auth::ServerState {
        db: db.clone(),
        auth: auth::ServerAuthConfig { jwt_secret: "test-secret".into() },
        site: configs::SiteConfig::default(),
        storage_signer: StorageSigner::new("http://localhost:9000/lead-files", "test-secret", 900),
        lead_webhook_url: None,
    };

    let app: Router = routes::build_router(cors(), state);
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    let base_url = format!("http://{}:{}", addr.ip(), addr.port());

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });

    Ok(TestApp { base_url, db })
}

fn client() -> reqwest::Client {
    reqwest::Client::builder().cookie_store(true).build().expect("reqwest client")
}

#[derive(serde::Serialize)]
struct Claims {
    sub: String,
    pid: String,
    role: String,
    admin_view: bool,
    exp: usize,
}

fn admin_token() -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    let claims = Claims {
        sub: "admin@example.com".into(),
        pid: Uuid::new_v4().to_string(),
        role: models::partner::ROLE_ADMIN.into(),
        admin_view: false,
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret("test-secret".as_bytes()))
        .expect("encode token")
}

/// Register a partner, log in, and return (partner bearer token).
async fn partner_token(c: &reqwest::Client, base_url: &str) -> anyhow::Result<String> {
    let email = format!("partner_{}@example.com", Uuid::new_v4());
    let password = "S3curePass!";
    let res = c
        .post(format!("{}/auth/register", base_url))
        .json(&json!({"email": email, "name": "E2E Partner", "password": password}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == HttpStatusCode::OK, "register failed: {}", res.status());
    let res = c
        .post(format!("{}/auth/login", base_url))
        .json(&json!({"email": email, "password": password}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == HttpStatusCode::OK, "login failed: {}", res.status());
    let body = res.json::<serde_json::Value>().await?;
    Ok(body["token"].as_str().unwrap_or_default().to_string())
}

#[tokio::test]
async fn e2e_public_health() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let res = client().get(format!("{}/health", app.base_url)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn e2e_referral_click_dedup_and_lead_funnel() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();
    let admin = admin_token();

    // partner creates a tracking link through the dashboard
    let partner = partner_token(&c, &app.base_url).await?;
    let res = c
        .post(format!("{}/dashboard/links", app.base_url))
        .header("Authorization", format!("Bearer {}", partner))
        .json(&json!({"name": "E2E Campaign"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let link = res.json::<serde_json::Value>().await?;
    let slug = link["slug"].as_str().unwrap().to_string();

    // admin publishes a catalog entry for the form
    let res = c
        .post(format!("{}/admin/services", app.base_url))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({"name": format!("Roofing {}", Uuid::new_v4()), "commission_pct": 10.0}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let svc = res.json::<serde_json::Value>().await?;
    let service_id = svc["id"].as_str().unwrap().to_string();

    let res = c
        .post(format!("{}/admin/services/{}/sub-services", app.base_url, service_id))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({"name": "Roof Repair"}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let sub = res.json::<serde_json::Value>().await?;
    let sub_service_id = sub["id"].as_str().unwrap().to_string();

    // first visit counts the click
    let res = c
        .get(format!("{}/r/{}?utm_source=newsletter", app.base_url, slug))
        .header("x-forwarded-for", "203.0.113.77")
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let bootstrap = res.json::<serde_json::Value>().await?;
    assert_eq!(bootstrap["click_counted"], true);
    assert!(bootstrap["services"].as_array().map(|s| !s.is_empty()).unwrap_or(false));

    // an immediate repeat from the same address lands in the dedup window
    let res = c
        .get(format!("{}/r/{}", app.base_url, slug))
        .header("x-forwarded-for", "203.0.113.77")
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let bootstrap = res.json::<serde_json::Value>().await?;
    assert_eq!(bootstrap["click_counted"], false);

    // three-step funnel: contact info, service choice, submit
    let res = c
        .post(format!("{}/leads", app.base_url))
        .json(&json!({
            "full_name": "Homer Owner",
            "email": "homer@example.com",
            "phone": "555-0100",
            "referral_slug": slug,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let lead = res.json::<serde_json::Value>().await?;
    let lead_id = lead["id"].as_str().unwrap().to_string();
    assert_eq!(lead["completion_status"], "step1_complete");

    let res = c
        .put(format!("{}/leads/{}/service", app.base_url, lead_id))
        .json(&json!({
            "service_id": service_id,
            "sub_service_id": sub_service_id,
            "details": "shingles blew off",
            "zip": "97201",
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    let res = c.post(format!("{}/leads/{}/submit", app.base_url, lead_id)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let submitted = res.json::<serde_json::Value>().await?;
    assert_eq!(submitted["completion_status"], "submitted");

    // a second submit on the same lead is a conflict
    let res = c.post(format!("{}/leads/{}/submit", app.base_url, lead_id)).send().await?;
    assert_eq!(res.status(), HttpStatusCode::CONFLICT);

    // the dashboard attributes the click and the lead to the partner's link
    let res = c
        .get(format!("{}/dashboard/stats", app.base_url))
        .header("Authorization", format!("Bearer {}", partner))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let stats = res.json::<serde_json::Value>().await?;
    let entry = stats
        .as_array()
        .and_then(|a| a.iter().find(|s| s["link"]["slug"] == json!(slug.clone())))
        .cloned()
        .expect("stats entry for link");
    assert_eq!(entry["link"]["click_count"], 1);
    assert_eq!(entry["total_leads"], 1);
    assert_eq!(entry["submitted_leads"], 1);

    // admin review sees the inherited commission
    let res = c
        .get(format!("{}/admin/leads/{}", app.base_url, lead_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let detail = res.json::<serde_json::Value>().await?;
    assert_eq!(detail["commission_pct"], 10.0);
    Ok(())
}

async fn seed_city(db: &DatabaseConnection, state_code: &str, state_name: &str) -> anyhow::Result<(models::county::Model, models::city::Model, String)> {
    use sea_orm::EntityTrait;
    if models::state::Entity::find_by_id(state_code.to_string()).one(db).await?.is_none() {
        models::state::ActiveModel {
            code: Set(state_code.to_string()),
            name: Set(state_name.to_string()),
        }
        .insert(db)
        .await?;
    }
    let county = models::county::ActiveModel {
        id: Set(Uuid::new_v4()),
        state_code: Set(state_code.to_string()),
        name: Set(format!("E2E County {}", Uuid::new_v4())),
    }
    .insert(db)
    .await?;
    let city = models::city::ActiveModel {
        id: Set(Uuid::new_v4()),
        county_id: Set(county.id),
        state_code: Set(state_code.to_string()),
        name: Set("Portland".to_string()),
    }
    .insert(db)
    .await?;
    let zip = format!("{:09}", Uuid::new_v4().as_u128() % 1_000_000_000);
    models::zip_code::ActiveModel { zip: Set(zip.clone()), city_id: Set(city.id) }
        .insert(db)
        .await?;
    Ok((county, city, zip))
}

#[tokio::test]
async fn e2e_service_area_exclusion_respects_siblings() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();
    let admin = admin_token();

    let (county, portland, zip) = seed_city(&app.db, "OR", "Oregon").await?;

    let res = c
        .post(format!("{}/admin/services", app.base_url))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({"name": format!("Roofing {}", Uuid::new_v4()), "commission_pct": 10.0}))
        .send()
        .await?;
    let svc = res.json::<serde_json::Value>().await?;
    let service_id = svc["id"].as_str().unwrap().to_string();

    let mut sub_ids = Vec::new();
    for name in ["Roof Repair", "Roof Replacement"] {
        let res = c
            .post(format!("{}/admin/services/{}/sub-services", app.base_url, service_id))
            .header("Authorization", format!("Bearer {}", admin))
            .json(&json!({"name": name}))
            .send()
            .await?;
        let sub = res.json::<serde_json::Value>().await?;
        sub_ids.push(sub["id"].as_str().unwrap().to_string());
    }
    let (repair_id, replacement_id) = (sub_ids[0].clone(), sub_ids[1].clone());

    // service-level default: the whole county
    let res = c
        .post(format!("{}/admin/service-areas", app.base_url))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({"service_id": service_id, "county_id": county.id}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);

    // adding the same county again is a duplicate
    let res = c
        .post(format!("{}/admin/service-areas", app.base_url))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({"service_id": service_id, "county_id": county.id}))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::CONFLICT);

    // carve Portland out of Roof Repair only
    let res = c
        .post(format!("{}/admin/service-areas", app.base_url))
        .header("Authorization", format!("Bearer {}", admin))
        .json(&json!({
            "service_id": service_id,
            "sub_service_id": repair_id,
            "exclude": true,
            "city_id": portland.id,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let exclusion = res.json::<serde_json::Value>().await?;
    let exclusion_id = exclusion["id"].as_str().unwrap().to_string();

    // sub-service view lists the default as inherited and the carve-out
    let res = c
        .get(format!(
            "{}/admin/service-areas?service_id={}&sub_service_id={}",
            app.base_url, service_id, repair_id
        ))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let areas = res.json::<serde_json::Value>().await?;
    let tags: Vec<String> = areas
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["provenance"].as_str().unwrap().to_string())
        .collect();
    assert!(tags.contains(&"inherited".to_string()));
    assert!(tags.contains(&"excluded".to_string()));

    // public coverage check: excluded for Roof Repair, covered for the sibling
    let res = c
        .get(format!(
            "{}/services/{}/coverage?sub_service_id={}&zip={}",
            app.base_url, service_id, repair_id, zip
        ))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::OK);
    let verdict = res.json::<serde_json::Value>().await?;
    assert_eq!(verdict["covered"], false);

    let res = c
        .get(format!(
            "{}/services/{}/coverage?sub_service_id={}&zip={}",
            app.base_url, service_id, replacement_id, zip
        ))
        .send()
        .await?;
    let verdict = res.json::<serde_json::Value>().await?;
    assert_eq!(verdict["covered"], true);

    // removing the exclusion reinstates the inherited area ("Add Back")
    let res = c
        .delete(format!("{}/admin/service-areas/{}", app.base_url, exclusion_id))
        .header("Authorization", format!("Bearer {}", admin))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::NO_CONTENT);
    let res = c
        .get(format!(
            "{}/services/{}/coverage?sub_service_id={}&zip={}",
            app.base_url, service_id, repair_id, zip
        ))
        .send()
        .await?;
    let verdict = res.json::<serde_json::Value>().await?;
    assert_eq!(verdict["covered"], true);
    Ok(())
}

#[tokio::test]
async fn e2e_admin_surface_denied_without_role() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
    let app = match start_server().await {
        Ok(a) => a,
        Err(_) => return Ok(()),
    };
    let c = client();

    // no session at all
    let res = reqwest::Client::new()
        .get(format!("{}/admin/services", app.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::UNAUTHORIZED);

    // plain partner session
    let partner = partner_token(&c, &app.base_url).await?;
    let res = c
        .get(format!("{}/admin/services", app.base_url))
        .header("Authorization", format!("Bearer {}", partner))
        .send()
        .await?;
    assert_eq!(res.status(), HttpStatusCode::FORBIDDEN);
    Ok(())
}
