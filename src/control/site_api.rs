use crate::control::{ControllerError, LocaleQuery, Response};
use crate::Repositories;
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::web::{self, Data, Json, JsonConfig, Path, Query, QueryConfig};
use actix_web::{get, post, HttpResponse};
use cms_types::content::{ContentTranslation, Translations};
use cms_types::form::{
    FormConfigRepository, FormSubmission, FormSubmissionRepository, NewFormSubmission,
};
use cms_types::menu::{build_menu_tree, All, MenuRepository};
use cms_types::page::PageRepository;
use cms_types::product_series::{ProductSeriesRecord, ProductSeriesRepository, Published};
use cms_types::{is_valid_slug, ImageRef};
use log_error::LogError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use typesafe_repository::async_ops::Select;
use uuid::Uuid;

const MAX_JSON_BODY: usize = 64 * 1024;

/// `Cache-Control` applied to public read endpoints.
#[derive(Clone, Copy, Debug)]
pub struct CachePolicy {
    pub max_age: u32,
}

impl CachePolicy {
    pub fn new(max_age: u64) -> Self {
        Self {
            max_age: u32::try_from(max_age).unwrap_or(u32::MAX),
        }
    }

    fn header(&self) -> CacheControl {
        if self.max_age == 0 {
            CacheControl(vec![CacheDirective::NoCache])
        } else {
            CacheControl(vec![CacheDirective::Public, CacheDirective::MaxAge(self.max_age)])
        }
    }

    fn ok(&self) -> actix_web::HttpResponseBuilder {
        let mut res = HttpResponse::Ok();
        res.insert_header(self.header());
        res
    }
}

/// Registers the content API together with the state it needs.
pub fn configure(repos: &Repositories, cache: CachePolicy) -> impl FnOnce(&mut web::ServiceConfig) {
    let repos = repos.clone();
    move |cfg| {
        cfg.app_data(Data::new(repos.menu))
            .app_data(Data::new(repos.pages))
            .app_data(Data::new(repos.product_series))
            .app_data(Data::new(repos.form_configs))
            .app_data(Data::new(repos.form_submissions))
            .app_data(Data::new(cache))
            .app_data(JsonConfig::default().limit(MAX_JSON_BODY).error_handler(|err, _req| {
                ControllerError::invalid("body", err.to_string()).into()
            }))
            .app_data(QueryConfig::default().error_handler(|err, _req| {
                ControllerError::invalid("query", err.to_string()).into()
            }))
            .default_service(web::to(not_found))
            .service(navigation)
            .service(get_page)
            .service(list_product_series)
            .service(get_product_series)
            .service(get_form_config)
            .service(submit_form);
    }
}

async fn not_found() -> Response {
    Err(ControllerError::NotFound("Not found"))
}

#[get("/api/navigation")]
pub async fn navigation(
    menu_repo: Data<Arc<dyn MenuRepository>>,
    cache: Data<CachePolicy>,
    query: Query<LocaleQuery>,
) -> Response {
    let locale = query.locale();
    let nodes = menu_repo.select(&All).await?;
    Ok(cache.ok().json(build_menu_tree(&nodes, &locale)))
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PageDto {
    pub id: Uuid,
    pub slug: String,
    pub path: String,
    pub page_type: String,
    pub template: String,
    pub title: String,
    pub status: &'static str,
    pub content: serde_json::Value,
    pub locale: String,
}

fn translation<'a>(
    translations: &'a Translations,
    locale: &str,
) -> Result<&'a ContentTranslation, ControllerError> {
    translations
        .resolve(locale)
        .ok_or(ControllerError::NotFound("Translation not found"))
}

#[get("/api/pages/{slug}")]
pub async fn get_page(
    page_repo: Data<Arc<dyn PageRepository>>,
    cache: Data<CachePolicy>,
    slug: Path<String>,
    query: Query<LocaleQuery>,
) -> Response {
    let locale = query.locale();
    let slug = slug.trim();
    if !is_valid_slug(slug) {
        return Err(ControllerError::NotFound("Page not found"));
    }
    let page = page_repo
        .get_by_slug(slug)
        .await?
        .filter(|p| p.status.is_published())
        .ok_or(ControllerError::NotFound("Page not found"))?;
    let t = translation(&page.translations, &locale)?;
    Ok(cache.ok().json(PageDto {
        id: page.id,
        slug: page.slug.clone(),
        path: page.path.clone(),
        page_type: page.page_type.clone(),
        template: page.template.clone(),
        title: page.title.resolve(&locale, ""),
        status: page.status.as_str(),
        content: t.content.clone(),
        locale: t.locale.clone(),
    }))
}

#[derive(Serialize, Debug)]
pub struct ProductSeriesDto {
    pub id: Uuid,
    pub slug: String,
    pub path: String,
    pub name: String,
    pub summary: String,
    pub image: Option<ImageRef>,
    pub status: &'static str,
}

impl ProductSeriesDto {
    fn new(s: &ProductSeriesRecord, locale: &str) -> Self {
        Self {
            id: s.id,
            slug: s.slug.clone(),
            path: s.path.clone(),
            name: s.name.resolve(locale, &s.slug),
            summary: s.summary.resolve(locale, ""),
            image: s.image.clone(),
            status: s.status.as_str(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ProductSeriesDetailDto {
    #[serde(flatten)]
    pub series: ProductSeriesDto,
    pub content: serde_json::Value,
    pub locale: String,
}

#[get("/api/product-series")]
pub async fn list_product_series(
    series_repo: Data<Arc<dyn ProductSeriesRepository>>,
    cache: Data<CachePolicy>,
    query: Query<LocaleQuery>,
) -> Response {
    let locale = query.locale();
    let series = series_repo.select(&Published).await?;
    let res: Vec<_> = series
        .iter()
        .map(|s| ProductSeriesDto::new(s, &locale))
        .collect();
    Ok(cache.ok().json(res))
}

#[get("/api/product-series/{slug}")]
pub async fn get_product_series(
    series_repo: Data<Arc<dyn ProductSeriesRepository>>,
    cache: Data<CachePolicy>,
    slug: Path<String>,
    query: Query<LocaleQuery>,
) -> Response {
    let locale = query.locale();
    let slug = slug.trim();
    if !is_valid_slug(slug) {
        return Err(ControllerError::NotFound("Product series not found"));
    }
    let series = series_repo
        .get_by_slug(slug)
        .await?
        .filter(|s| s.status.is_published())
        .ok_or(ControllerError::NotFound("Product series not found"))?;
    let t = translation(&series.translations, &locale)?;
    Ok(cache.ok().json(ProductSeriesDetailDto {
        series: ProductSeriesDto::new(&series, &locale),
        content: t.content.clone(),
        locale: t.locale.clone(),
    }))
}

#[get("/api/form-config/{name}")]
pub async fn get_form_config(
    form_repo: Data<Arc<dyn FormConfigRepository>>,
    cache: Data<CachePolicy>,
    name: Path<String>,
    query: Query<LocaleQuery>,
) -> Response {
    let locale = query.locale();
    let form = form_repo
        .get_by_name(name.trim())
        .await?
        .ok_or(ControllerError::NotFound("Form not found"))?;
    Ok(cache.ok().json(form.localize(&locale)))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRequest {
    #[serde(default)]
    pub form_id: Option<Uuid>,
    #[serde(default)]
    pub form_name: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub auto_submitted: bool,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDto {
    pub id: i64,
    pub form_id: Option<Uuid>,
    pub form_name: String,
    pub data: serde_json::Value,
    pub locale: String,
    pub auto_submitted: bool,
    pub created_at: String,
}

impl From<FormSubmission> for SubmissionDto {
    fn from(s: FormSubmission) -> Self {
        Self {
            id: s.id,
            form_id: s.form_id,
            form_name: s.form_name,
            data: s.data,
            locale: s.locale,
            auto_submitted: s.auto_submitted,
            created_at: s.created_at.format(&Rfc3339).unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SubmissionResponse {
    pub success: bool,
    pub submission: SubmissionDto,
}

#[post("/api/form-submissions")]
pub async fn submit_form(
    form_repo: Data<Arc<dyn FormConfigRepository>>,
    submission_repo: Data<Arc<dyn FormSubmissionRepository>>,
    payload: Json<SubmissionRequest>,
) -> Response {
    let SubmissionRequest {
        form_id,
        form_name,
        data,
        locale,
        auto_submitted,
    } = payload.into_inner();
    let form_name = form_name.trim().to_string();
    if form_name.is_empty() {
        return Err(ControllerError::invalid("formName", "must not be empty"));
    }
    let data = match data {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        data @ serde_json::Value::Object(_) => data,
        _ => return Err(ControllerError::invalid("data", "must be an object")),
    };
    let form_id = match form_id {
        Some(id) => Some(id),
        None => form_repo
            .get_by_name(&form_name)
            .await
            .log_error("Unable to look up form config")
            .flatten()
            .map(|f| f.id),
    };
    let submission = submission_repo
        .add(NewFormSubmission {
            form_id,
            form_name,
            data,
            locale: cms_types::locale::normalize_locale(locale.as_deref()),
            auto_submitted,
            created_at: OffsetDateTime::now_utc(),
        })
        .await
        .map_err(ControllerError::internal("Failed to submit form"))?;
    log::info!(
        "Form submission {} for {}",
        submission.id,
        submission.form_name
    );
    Ok(HttpResponse::Ok().json(SubmissionResponse {
        success: true,
        submission: submission.into(),
    }))
}
