use actix_web::{web, HttpResponse};
use bruteguard_types::{
    AuthorizeRequest, ListAddRequest, ListDelRequest, OkResponse, ResetIpRequest,
    ResetLoginRequest, ViewListsResponse,
};

use crate::authorize::{self, Verdict};
use crate::bucket::RateLimiter;
use crate::cidr;
use crate::config::Config;
use crate::error::ApiError;
use crate::list_store::{ListKind, ListStore};

#[tracing::instrument(skip(list_store, rate_limiter, config, body), fields(login = %body.login, ip = %body.ip))]
async fn authorize_handler(
    list_store: web::Data<ListStore>,
    rate_limiter: web::Data<RateLimiter>,
    config: web::Data<Config>,
    body: web::Json<AuthorizeRequest>,
) -> Result<HttpResponse, ApiError> {
    let verdict = tokio::time::timeout(
        config.decision_deadline,
        authorize::verdict(
            &list_store,
            rate_limiter.get_ref(),
            &body.login,
            &body.password,
            &body.ip,
        ),
    )
    .await
    .map_err(|_| ApiError::Cancelled)??;

    match verdict {
        Verdict::Allow => Ok(HttpResponse::Ok().json(OkResponse::ok())),
        Verdict::Reject => Ok(HttpResponse::Ok().json(OkResponse::fail("rate limit exceeded"))),
    }
}

#[tracing::instrument(skip(rate_limiter))]
async fn reset_bucket_handler(
    rate_limiter: web::Data<RateLimiter>,
) -> Result<HttpResponse, ApiError> {
    rate_limiter.reset_all().await?;
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

#[tracing::instrument(skip(rate_limiter, body), fields(ip = %body.ip))]
async fn reset_bucket_ip_handler(
    rate_limiter: web::Data<RateLimiter>,
    body: web::Json<ResetIpRequest>,
) -> Result<HttpResponse, ApiError> {
    cidr::parse_bare_ipv4(&body.ip)?;
    rate_limiter.reset_ip(&body.ip).await?;
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

#[tracing::instrument(skip(rate_limiter, body), fields(login = %body.login))]
async fn reset_bucket_login_handler(
    rate_limiter: web::Data<RateLimiter>,
    body: web::Json<ResetLoginRequest>,
) -> Result<HttpResponse, ApiError> {
    rate_limiter.reset_login(&body.login).await?;
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

fn list_add(
    list_store: &ListStore,
    kind: ListKind,
    body: &ListAddRequest,
) -> Result<HttpResponse, ApiError> {
    let net = cidr::parse_ipv4_cidr(&body.ip)?;
    list_store.add(kind, net, body.force)?;
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

fn list_del(
    list_store: &ListStore,
    kind: ListKind,
    body: &ListDelRequest,
) -> Result<HttpResponse, ApiError> {
    let net = cidr::parse_ipv4_cidr(&body.ip)?;
    list_store.remove(kind, net)?;
    Ok(HttpResponse::Ok().json(OkResponse::ok()))
}

#[tracing::instrument(skip(list_store, body), fields(ip = %body.ip, force = body.force))]
async fn whitelist_add_handler(
    list_store: web::Data<ListStore>,
    body: web::Json<ListAddRequest>,
) -> Result<HttpResponse, ApiError> {
    list_add(&list_store, ListKind::Whitelist, &body)
}

#[tracing::instrument(skip(list_store, body), fields(ip = %body.ip))]
async fn whitelist_del_handler(
    list_store: web::Data<ListStore>,
    body: web::Json<ListDelRequest>,
) -> Result<HttpResponse, ApiError> {
    list_del(&list_store, ListKind::Whitelist, &body)
}

#[tracing::instrument(skip(list_store, body), fields(ip = %body.ip, force = body.force))]
async fn blacklist_add_handler(
    list_store: web::Data<ListStore>,
    body: web::Json<ListAddRequest>,
) -> Result<HttpResponse, ApiError> {
    list_add(&list_store, ListKind::Blacklist, &body)
}

#[tracing::instrument(skip(list_store, body), fields(ip = %body.ip))]
async fn blacklist_del_handler(
    list_store: web::Data<ListStore>,
    body: web::Json<ListDelRequest>,
) -> Result<HttpResponse, ApiError> {
    list_del(&list_store, ListKind::Blacklist, &body)
}

#[tracing::instrument(skip(list_store))]
async fn view_lists_handler(list_store: web::Data<ListStore>) -> HttpResponse {
    let (whitelist, blacklist) = list_store.enumerate();
    HttpResponse::Ok().json(ViewListsResponse {
        ok: true,
        whitelist,
        blacklist,
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/authorize", web::post().to(authorize_handler))
            .route("/bucket/reset", web::post().to(reset_bucket_handler))
            .route("/bucket/reset/ip", web::post().to(reset_bucket_ip_handler))
            .route(
                "/bucket/reset/login",
                web::post().to(reset_bucket_login_handler),
            )
            .route("/whitelist/add", web::post().to(whitelist_add_handler))
            .route("/whitelist/del", web::post().to(whitelist_del_handler))
            .route("/blacklist/add", web::post().to(blacklist_add_handler))
            .route("/blacklist/del", web::post().to(blacklist_del_handler))
            .route("/view/lists", web::get().to(view_lists_handler)),
    );
}
