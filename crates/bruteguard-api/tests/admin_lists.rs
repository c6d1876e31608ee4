//! Exercises the list-mutation and enumeration endpoints end-to-end over
//! actix-web's in-process test harness. The rate-limited `/api/authorize`
//! path needs a live bucket store and is covered at the unit level instead
//! (see `src/authorize.rs`).

use actix_web::{test, web, App};
use bruteguard_api::list_store::ListStore;
use bruteguard_api::routes;
use bruteguard_types::{ListAddRequest, OkResponse, ViewListsResponse};

#[actix_web::test]
async fn whitelist_add_then_view_lists_reflects_entry() {
    let store = web::Data::new(ListStore::new());
    let app = test::init_service(App::new().app_data(store.clone()).configure(routes::configure))
        .await;

    let req = test::TestRequest::post()
        .uri("/api/whitelist/add")
        .set_json(ListAddRequest {
            ip: "198.51.100.0/24".to_string(),
            force: false,
        })
        .to_request();
    let resp: OkResponse = test::call_and_read_body_json(&app, req).await;
    assert!(resp.ok);

    let req = test::TestRequest::get().uri("/api/view/lists").to_request();
    let resp: ViewListsResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp.whitelist, vec!["198.51.100.0/24".to_string()]);
    assert!(resp.blacklist.is_empty());
}

#[actix_web::test]
async fn cross_list_overlap_without_force_is_rejected_with_200() {
    let store = web::Data::new(ListStore::new());
    let app = test::init_service(App::new().app_data(store.clone()).configure(routes::configure))
        .await;

    let req = test::TestRequest::post()
        .uri("/api/blacklist/add")
        .set_json(ListAddRequest {
            ip: "10.0.0.0/8".to_string(),
            force: false,
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::post()
        .uri("/api/whitelist/add")
        .set_json(ListAddRequest {
            ip: "10.0.0.0/8".to_string(),
            force: false,
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: OkResponse = test::read_body_json(resp).await;
    assert!(!body.ok);
    assert!(body.reason.unwrap().contains("overlaps"));
}

#[actix_web::test]
async fn malformed_cidr_is_a_bad_request() {
    let store = web::Data::new(ListStore::new());
    let app = test::init_service(App::new().app_data(store.clone()).configure(routes::configure))
        .await;

    let req = test::TestRequest::post()
        .uri("/api/whitelist/add")
        .set_json(ListAddRequest {
            ip: "garbage".to_string(),
            force: false,
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn remove_missing_entry_reports_not_present() {
    let store = web::Data::new(ListStore::new());
    let app = test::init_service(App::new().app_data(store.clone()).configure(routes::configure))
        .await;

    let req = test::TestRequest::post()
        .uri("/api/whitelist/del")
        .set_json(bruteguard_types::ListDelRequest {
            ip: "203.0.113.0/24".to_string(),
        })
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let body: OkResponse = test::read_body_json(resp).await;
    assert!(!body.ok);
}
