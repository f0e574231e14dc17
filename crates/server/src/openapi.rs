use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct RegisterRequest { pub email: String, pub name: String, pub company_name: Option<String>, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(utoipa::ToSchema)]
pub struct StartLeadRequest { pub full_name: String, pub email: String, pub phone: String, pub referral_slug: Option<String> }

#[derive(utoipa::ToSchema)]
pub struct SelectServiceRequest {
    pub service_id: Uuid,
    pub sub_service_id: Option<Uuid>,
    pub details: Option<String>,
    pub street_address: Option<String>,
    pub city_name: Option<String>,
    pub state_code: Option<String>,
    pub zip: Option<String>,
}

#[derive(utoipa::ToSchema)]
pub struct CreateLinkRequest { pub name: String }

#[derive(utoipa::ToSchema)]
pub struct UpdateLinkRequest { pub active: bool }

#[derive(utoipa::ToSchema)]
pub struct CreateServiceRequest { pub name: String, pub description: Option<String>, pub commission_pct: f64 }

#[derive(utoipa::ToSchema)]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub active: Option<bool>,
    pub commission_pct: Option<f64>,
}

#[derive(utoipa::ToSchema)]
pub struct CreateSubServiceRequest { pub name: String, pub description: Option<String> }

#[derive(utoipa::ToSchema)]
pub struct UpdateSubServiceRequest { pub name: Option<String>, pub description: Option<String>, pub active: Option<bool> }

#[derive(utoipa::ToSchema)]
pub struct CommissionRequest { pub percentage: f64 }

#[derive(utoipa::ToSchema)]
pub struct AddAreaRequest {
    pub service_id: Uuid,
    pub sub_service_id: Option<Uuid>,
    pub exclude: bool,
    pub city_id: Option<Uuid>,
    pub county_id: Option<Uuid>,
    pub state_code: Option<String>,
}

#[derive(utoipa::ToSchema)]
pub struct UpdateStatusRequest { pub status: String }

#[derive(utoipa::ToSchema)]
pub struct AddAttachmentRequest { pub file_name: String, pub content_type: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::me,
        crate::routes::public::referral_landing,
        crate::routes::public::list_services,
        crate::routes::public::coverage_check,
        crate::routes::public::start_lead,
        crate::routes::public::select_service,
        crate::routes::public::submit_lead,
        crate::routes::dashboard::list_links,
        crate::routes::dashboard::create_link,
        crate::routes::dashboard::update_link,
        crate::routes::dashboard::list_leads,
        crate::routes::dashboard::stats,
        crate::routes::admin_catalog::list_services,
        crate::routes::admin_catalog::create_service,
        crate::routes::admin_catalog::get_service,
        crate::routes::admin_catalog::update_service,
        crate::routes::admin_catalog::delete_service,
        crate::routes::admin_catalog::list_sub_services,
        crate::routes::admin_catalog::create_sub_service,
        crate::routes::admin_catalog::update_sub_service,
        crate::routes::admin_catalog::delete_sub_service,
        crate::routes::admin_catalog::set_commission,
        crate::routes::admin_catalog::clear_commission,
        crate::routes::admin_areas::list_areas,
        crate::routes::admin_areas::add_area,
        crate::routes::admin_areas::remove_area,
        crate::routes::geo::list_states,
        crate::routes::geo::list_counties,
        crate::routes::geo::list_cities,
        crate::routes::geo::resolve_zip,
        crate::routes::geo::search_cities,
        crate::routes::admin_leads::list_leads,
        crate::routes::admin_leads::lead_detail,
        crate::routes::admin_leads::update_status,
        crate::routes::admin_leads::add_attachment,
        crate::routes::admin_leads::attachment_url,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            StartLeadRequest,
            SelectServiceRequest,
            CreateLinkRequest,
            UpdateLinkRequest,
            CreateServiceRequest,
            UpdateServiceRequest,
            CreateSubServiceRequest,
            UpdateSubServiceRequest,
            CommissionRequest,
            AddAreaRequest,
            UpdateStatusRequest,
            AddAttachmentRequest,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "public"),
        (name = "leads"),
        (name = "dashboard"),
        (name = "catalog"),
        (name = "areas"),
        (name = "geo")
    )
)]
pub struct ApiDoc;
