use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use models::{lead, referral_click, referral_link};

use crate::errors::ServiceError;

/// Clicks from the same (ip, slug) inside this window do not move the counter.
pub const DEDUP_WINDOW_SECS: i64 = 60;

const SLUG_SUFFIX_LEN: usize = 6;
const SLUG_MAX_ATTEMPTS: usize = 5;

/// UTM query parameters captured off the tracking URL.
#[derive(Clone, Debug, Default)]
pub struct UtmParams {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
}

/// Outcome of a click: the (possibly updated) link and whether the counter moved.
#[derive(Clone, Debug)]
pub struct ClickOutcome {
    pub link: referral_link::Model,
    pub counted: bool,
}

/// Lowercase the base and collapse anything non-alphanumeric into hyphens.
pub fn slugify(base: &str) -> String {
    let mut out = String::with_capacity(base.len());
    let mut last_hyphen = true; // swallow leading hyphens
    for c in base.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .take(SLUG_SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// Generate a unique slug from a display name, retrying on collisions.
pub async fn generate_slug(db: &DatabaseConnection, base: &str) -> Result<String, ServiceError> {
    let stem = slugify(base);
    let stem = if stem.is_empty() { "partner".to_string() } else { stem };
    // keep room for the suffix within the column limit
    let stem: String = stem.chars().take(64 - SLUG_SUFFIX_LEN - 1).collect();
    for _ in 0..SLUG_MAX_ATTEMPTS {
        let candidate = format!("{}-{}", stem.trim_end_matches('-'), random_suffix());
        let taken = referral_link::Entity::find()
            .filter(referral_link::Column::Slug.eq(candidate.clone()))
            .one(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        if taken.is_none() {
            return Ok(candidate);
        }
    }
    Err(ServiceError::Conflict("could not generate a unique slug".into()))
}

/// Create a referral link for a partner with a generated slug.
pub async fn create_link(
    db: &DatabaseConnection,
    partner_id: Uuid,
    base_name: &str,
) -> Result<referral_link::Model, ServiceError> {
    let slug = generate_slug(db, base_name).await?;
    let created = referral_link::create(db, partner_id, &slug).await?;
    info!(link_id = %created.id, slug = %created.slug, "referral_link_created");
    Ok(created)
}

/// List a partner's links, newest first.
pub async fn list_links(
    db: &DatabaseConnection,
    partner_id: Uuid,
) -> Result<Vec<referral_link::Model>, ServiceError> {
    referral_link::Entity::find()
        .filter(referral_link::Column::PartnerId.eq(partner_id))
        .order_by_desc(referral_link::Column::CreatedAt)
        .all(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// Toggle a link's active flag; the partner must own the link.
pub async fn set_link_active(
    db: &DatabaseConnection,
    link_id: Uuid,
    partner_id: Uuid,
    active: bool,
) -> Result<referral_link::Model, ServiceError> {
    let found = referral_link::Entity::find_by_id(link_id)
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?
        .ok_or_else(|| ServiceError::not_found("referral link"))?;
    if found.partner_id != partner_id {
        return Err(ServiceError::not_found("referral link"));
    }
    let mut am: referral_link::ActiveModel = found.into();
    am.active = Set(active);
    am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))
}

/// Find an active link by slug.
pub async fn find_active_by_slug(
    db: &DatabaseConnection,
    slug: &str,
) -> Result<Option<referral_link::Model>, ServiceError> {
    referral_link::Entity::find()
        .filter(referral_link::Column::Slug.eq(slug.to_string()))
        .filter(referral_link::Column::Active.eq(true))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))
}

/// True when a previous click timestamp falls inside the dedup window.
pub fn within_dedup_window(prev: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now - prev < Duration::seconds(DEDUP_WINDOW_SECS)
}

/// Record a click on a partner slug.
///
/// The event row is always written; the link's counter and last-clicked
/// timestamp move only when no click from the same (ip, link) landed inside
/// the last 60 seconds. Read-then-write without a transaction; rapid
/// concurrent clicks may occasionally both count (accepted).
pub async fn record_click(
    db: &DatabaseConnection,
    slug: &str,
    ip: &str,
    user_agent: Option<&str>,
    utm: UtmParams,
) -> Result<ClickOutcome, ServiceError> {
    let link = find_active_by_slug(db, slug)
        .await?
        .ok_or_else(|| ServiceError::not_found("referral link"))?;

    let now = Utc::now();
    let window_start = now - Duration::seconds(DEDUP_WINDOW_SECS);
    let recent = referral_click::Entity::find()
        .filter(referral_click::Column::LinkId.eq(link.id))
        .filter(referral_click::Column::Ip.eq(ip.to_string()))
        .filter(referral_click::Column::ClickedAt.gt(window_start))
        .one(db)
        .await
        .map_err(|e| ServiceError::Db(e.to_string()))?;
    let counted = recent.is_none();

    let am = referral_click::ActiveModel {
        id: Set(0), // auto-increment by DB
        link_id: Set(link.id),
        ip: Set(ip.to_string()),
        user_agent: Set(user_agent.map(|s| s.to_string())),
        utm_source: Set(utm.source),
        utm_medium: Set(utm.medium),
        utm_campaign: Set(utm.campaign),
        counted: Set(counted),
        clicked_at: Set(now.into()),
    };
    am.insert(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;

    if !counted {
        warn!(slug = %slug, ip = %ip, "click inside dedup window, counter unchanged");
        return Ok(ClickOutcome { link, counted });
    }

    let mut link_am: referral_link::ActiveModel = link.clone().into();
    link_am.click_count = Set(link.click_count + 1);
    link_am.last_clicked_at = Set(Some(now.into()));
    let updated = link_am.update(db).await.map_err(|e| ServiceError::Db(e.to_string()))?;
    info!(slug = %slug, clicks = updated.click_count, "referral_click_counted");
    Ok(ClickOutcome { link: updated, counted })
}

/// Per-link dashboard stats.
#[derive(Clone, Debug, Serialize)]
pub struct LinkStats {
    pub link: referral_link::Model,
    pub total_leads: u64,
    pub submitted_leads: u64,
}

/// Click and lead counts for every link a partner owns.
pub async fn partner_stats(
    db: &DatabaseConnection,
    partner_id: Uuid,
) -> Result<Vec<LinkStats>, ServiceError> {
    let links = list_links(db, partner_id).await?;
    let mut out = Vec::with_capacity(links.len());
    for link in links {
        let total_leads = lead::Entity::find()
            .filter(lead::Column::ReferralLinkId.eq(link.id))
            .count(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        let submitted_leads = lead::Entity::find()
            .filter(lead::Column::ReferralLinkId.eq(link.id))
            .filter(lead::Column::CompletionStatus.eq(lead::COMPLETION_SUBMITTED))
            .count(db)
            .await
            .map_err(|e| ServiceError::Db(e.to_string()))?;
        out.push(LinkStats { link, total_leads, submitted_leads });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::get_db;

    #[test]
    fn slugify_collapses_and_lowercases() {
        assert_eq!(slugify("Pat's Roofing Co."), "pat-s-roofing-co");
        assert_eq!(slugify("  --Acme!!  "), "acme");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn dedup_window_boundaries() {
        let now = Utc::now();
        assert!(within_dedup_window(now - Duration::seconds(59), now));
        assert!(!within_dedup_window(now - Duration::seconds(60), now));
        assert!(!within_dedup_window(now - Duration::seconds(120), now));
    }

    async fn test_partner(db: &sea_orm::DatabaseConnection) -> models::partner::Model {
        models::partner::create(
            db,
            &format!("partner_{}@example.com", Uuid::new_v4()),
            "Link Owner",
            None,
            models::partner::ROLE_PARTNER,
        )
        .await
        .expect("create partner")
    }

    #[tokio::test]
    async fn rapid_clicks_from_same_ip_count_once() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let p = test_partner(&db).await;
        let link = create_link(&db, p.id, "Pat's Roofing").await?;
        assert_eq!(link.click_count, 0);

        let first = record_click(&db, &link.slug, "203.0.113.9", Some("Mozilla/5.0"), UtmParams::default()).await?;
        assert!(first.counted);
        assert_eq!(first.link.click_count, 1);

        // same ip inside the window: event stored, counter unchanged
        let second = record_click(&db, &link.slug, "203.0.113.9", Some("Mozilla/5.0"), UtmParams::default()).await?;
        assert!(!second.counted);
        assert_eq!(second.link.click_count, 1);

        // different ip counts immediately
        let third = record_click(&db, &link.slug, "198.51.100.4", None, UtmParams::default()).await?;
        assert!(third.counted);
        assert_eq!(third.link.click_count, 2);

        let events = referral_click::Entity::find()
            .filter(referral_click::Column::LinkId.eq(link.id))
            .all(&db)
            .await?;
        assert_eq!(events.len(), 3);

        models::partner::Entity::delete_by_id(p.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn inactive_links_do_not_record() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let p = test_partner(&db).await;
        let link = create_link(&db, p.id, "Dormant").await?;
        set_link_active(&db, link.id, p.id, false).await?;

        let err = record_click(&db, &link.slug, "203.0.113.1", None, UtmParams::default()).await;
        assert!(matches!(err, Err(ServiceError::NotFound(_))));

        models::partner::Entity::delete_by_id(p.id).exec(&db).await?;
        Ok(())
    }

    #[tokio::test]
    async fn generated_slugs_are_unique_and_well_formed() -> Result<(), anyhow::Error> {
        if std::env::var("SKIP_DB_TESTS").is_ok() { return Ok(()); }
        let db = get_db().await?;

        let p = test_partner(&db).await;
        let a = create_link(&db, p.id, "Same Name").await?;
        let b = create_link(&db, p.id, "Same Name").await?;
        assert_ne!(a.slug, b.slug);
        assert!(a.slug.starts_with("same-name-"));
        models::referral_link::validate_slug(&a.slug).expect("valid slug");

        models::partner::Entity::delete_by_id(p.id).exec(&db).await?;
        Ok(())
    }
}
