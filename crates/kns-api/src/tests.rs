//! Router tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
  response::IntoResponse as _,
};
use chrono::NaiveDate;
use kns_core::{
  group::{Group, NewGroup},
  hierarchy::{GroupTree, MoveKind, MoveRequest, plan_move},
  location::Location,
  profile::{Gender, NewProfile, Profile, Role},
  store::CommunityStore,
};
use kns_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ACTING_HEADER, ApiError, api_router};

// ─── Harness ─────────────────────────────────────────────────────────────────

struct World {
  store:        Arc<SqliteStore>,
  app:          Router,
  root_leader:  Profile,
  root:         Group,
  alpha_leader: Profile,
  alpha:        Group,
  beta_leader:  Profile,
  beta:         Group,
  /// A complete adult member of `root`.
  member:       Profile,
}

fn complete(email: &str, born: i32) -> NewProfile {
  NewProfile {
    first_name: Some("Sam".into()),
    last_name: Some(email.split('@').next().unwrap_or_default().to_owned()),
    gender: Some(Gender::Male),
    date_of_birth: NaiveDate::from_ymd_opt(born, 4, 1),
    location: Location::new("GB", "Leeds"),
    ..NewProfile::new(email)
  }
}

/// A complete profile with a confirmed email and accepted terms.
async fn confirmed(store: &SqliteStore, email: &str, born: i32) -> Profile {
  let mut profile = store.add_profile(complete(email, born)).await.unwrap();
  profile.account.verified = true;
  profile.account.agreed_to_terms = true;
  store.save_profile(profile).await.unwrap()
}

fn group_input(name: &str) -> NewGroup {
  NewGroup {
    name:        name.to_owned(),
    description: "We meet every Thursday evening to share a meal, read together and pray for the city."
      .repeat(2),
    location:    Location::new("GB", "Leeds"),
  }
}

async fn leader(store: &SqliteStore, email: &str, name: &str, parent: Option<&Group>) -> (Profile, Group) {
  let added = confirmed(store, email, 1980).await;
  let profile = store.set_role(added.profile_id, Role::Leader).await.unwrap();
  let group = store
    .register_group(profile.profile_id, parent.map(|g| g.group_id), group_input(name))
    .await
    .unwrap();
  if let Some(parent) = parent {
    store.add_member(profile.profile_id, parent.group_id).await.unwrap();
  }
  (profile, group)
}

/// root ─┬─ alpha
///       └─ beta
async fn world() -> World {
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let (root_leader, root) = leader(&store, "root@example.org", "Root", None).await;
  let (alpha_leader, alpha) = leader(&store, "alpha@example.org", "Alpha", Some(&root)).await;
  let (beta_leader, beta) = leader(&store, "beta@example.org", "Beta", Some(&root)).await;
  let member = confirmed(&store, "member@example.org", 1995).await;
  store.add_member(member.profile_id, root.group_id).await.unwrap();

  let app = api_router(store.clone());
  World { store, app, root_leader, root, alpha_leader, alpha, beta_leader, beta, member }
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  acting: Option<&Profile>,
  body: Option<Value>,
) -> (StatusCode, String) {
  let mut req = Request::builder().method(method).uri(uri);
  if let Some(p) = acting {
    req = req.header(ACTING_HEADER, p.slug.as_str());
  }
  let req = match body {
    Some(b) => req
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(b.to_string()))
      .unwrap(),
    None => req.body(Body::empty()).unwrap(),
  };
  let res = app.clone().oneshot(req).await.unwrap();
  let status = res.status();
  let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
  (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn call(
  app: &Router,
  method: Method,
  uri: &str,
  acting: Option<&Profile>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let (status, text) = send(app, method, uri, acting, body).await;
  (status, serde_json::from_str(&text).unwrap_or(Value::Null))
}

fn move_body(profile: &Profile, target: &Group) -> Option<Value> {
  Some(json!({ "profile_slug": profile.slug, "target_group_slug": target.slug }))
}

// ─── Acting profile ──────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_or_unknown_acting_profile_is_unauthorized() {
  let w = world().await;
  let uri = format!("/groups/{}/move-to-child", w.root.slug);

  let (status, _) = call(&w.app, Method::POST, &uri, None, move_body(&w.member, &w.alpha)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let mut ghost = w.member.clone();
  ghost.slug = "nobody".into();
  let (status, _) =
    call(&w.app, Method::POST, &uri, Some(&ghost), move_body(&w.member, &w.alpha)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ─── Moves ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn move_to_child_group() {
  let w = world().await;
  let uri = format!("/groups/{}/move-to-child", w.root.slug);
  let (status, body) =
    call(&w.app, Method::POST, &uri, Some(&w.root_leader), move_body(&w.member, &w.alpha)).await;
  assert_eq!(status, StatusCode::OK, "{body}");

  let membership = w.store.membership_of(w.member.profile_id).await.unwrap().unwrap();
  assert_eq!(membership.group_id, w.alpha.group_id);
}

#[tokio::test]
async fn move_to_non_descendant_is_rejected() {
  let w = world().await;
  let uri = format!("/groups/{}/move-to-child", w.root.slug);
  let (status, body) =
    call(&w.app, Method::POST, &uri, Some(&w.root_leader), move_body(&w.member, &w.root)).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert!(body["error"].as_str().unwrap().contains("not a child group"));

  let membership = w.store.membership_of(w.member.profile_id).await.unwrap().unwrap();
  assert_eq!(membership.group_id, w.root.group_id);
}

#[tokio::test]
async fn only_the_group_leader_may_move() {
  let w = world().await;
  let uri = format!("/groups/{}/move-to-child", w.root.slug);
  let (status, _) =
    call(&w.app, Method::POST, &uri, Some(&w.alpha_leader), move_body(&w.member, &w.alpha)).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn move_to_sister_group() {
  let w = world().await;
  let m = confirmed(&w.store, "m@example.org", 1990).await;
  w.store.add_member(m.profile_id, w.alpha.group_id).await.unwrap();
  let uri = format!("/groups/{}/move-to-sister", w.alpha.slug);

  let (status, _) =
    call(&w.app, Method::POST, &uri, Some(&w.alpha_leader), move_body(&m, &w.alpha)).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  let (status, _) =
    call(&w.app, Method::POST, &uri, Some(&w.alpha_leader), move_body(&m, &w.root)).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) =
    call(&w.app, Method::POST, &uri, Some(&w.alpha_leader), move_body(&m, &w.beta)).await;
  assert_eq!(status, StatusCode::OK);
  let membership = w.store.membership_of(m.profile_id).await.unwrap().unwrap();
  assert_eq!(membership.group_id, w.beta.group_id);
}

#[tokio::test]
async fn moving_a_leader_detaches_their_group() {
  let w = world().await;
  let uri = format!("/groups/{}/move-to-child", w.root.slug);
  let (status, _) = call(
    &w.app,
    Method::POST,
    &uri,
    Some(&w.root_leader),
    move_body(&w.beta_leader, &w.alpha),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, beta) = call(&w.app, Method::GET, &format!("/groups/{}", w.beta.slug), None, None).await;
  assert_eq!(beta["parent_id"], Value::Null);

  let (_, children) =
    call(&w.app, Method::GET, &format!("/groups/{}/children", w.root.slug), None, None).await;
  let names: Vec<_> = children.as_array().unwrap().iter().map(|g| g["name"].clone()).collect();
  assert_eq!(names, [json!("Alpha")]);
}

// ─── Tree ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn tree_json_and_html() {
  let w = world().await;
  let (status, tree) =
    call(&w.app, Method::GET, &format!("/groups/{}/tree", w.root.slug), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(tree["name"], "Root");
  assert_eq!(tree["leader_name"], "Sam root");
  // alpha leader, beta leader and member, plus the root leader.
  assert_eq!(tree["member_count"], 4);
  assert_eq!(tree["descendant_count"], 2);
  assert_eq!(tree["children"][0]["name"], "Alpha");
  assert_eq!(tree["children"][1]["name"], "Beta");

  let (status, html) =
    send(&w.app, Method::GET, &format!("/groups/{}/tree.html", w.root.slug), None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(html.starts_with("<ul class=\"kns-tree\">"));
  assert!(html.contains(&format!("data-slug=\"{}\"", w.beta.slug)));

  let (status, _) = call(&w.app, Method::GET, "/groups/missing/tree", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hierarchy_queries() {
  let w = world().await;
  let (_, sisters) =
    call(&w.app, Method::GET, &format!("/groups/{}/sisters", w.alpha.slug), None, None).await;
  assert_eq!(sisters.as_array().unwrap().len(), 1);
  assert_eq!(sisters[0]["slug"], w.beta.slug.as_str());

  let (_, rows) =
    call(&w.app, Method::GET, &format!("/groups/{}/descendants", w.root.slug), None, None).await;
  assert_eq!(rows.as_array().unwrap().len(), 2);
  assert_eq!(rows[0]["depth"], 1);

  let (_, ancestors) =
    call(&w.app, Method::GET, &format!("/groups/{}/ancestors", w.beta.slug), None, None).await;
  assert_eq!(ancestors[0]["slug"], w.root.slug.as_str());

  let (_, close) =
    call(&w.app, Method::GET, &format!("/groups/{}/close-groups", w.alpha.slug), None, None).await;
  assert_eq!(close["city"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn list_filters_and_statistics() {
  let w = world().await;
  let (_, groups) = call(&w.app, Method::GET, "/groups?search=alp", None, None).await;
  assert_eq!(groups.as_array().unwrap().len(), 1);
  let (_, groups) = call(&w.app, Method::GET, "/groups?country=gb&city=leeds", None, None).await;
  assert_eq!(groups.as_array().unwrap().len(), 3);

  let (status, stats) = call(&w.app, Method::GET, "/groups/statistics", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(stats["total_groups"], 3);
  assert_eq!(stats["average_members"], 1.0);
  assert_eq!(stats["most_members_group"]["name"], "Root");
}

// ─── Roles ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn make_leader_in_root_group_promotes_directly() {
  let w = world().await;
  let uri = format!("/profiles/{}/make-leader", w.member.slug);
  let (status, body) = call(&w.app, Method::POST, &uri, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  assert_eq!(body["role"], "leader");
}

#[tokio::test]
async fn make_leader_reports_every_missing_condition() {
  let w = world().await;
  let p = w.store.add_profile(NewProfile::new("new@example.org")).await.unwrap();
  w.store.add_member(p.profile_id, w.root.group_id).await.unwrap();

  let uri = format!("/profiles/{}/make-leader", p.slug);
  let (status, body) = call(&w.app, Method::POST, &uri, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(
    body["reasons"],
    json!(["profile_incomplete", "email_not_verified", "terms_not_accepted", "consent_form_required"])
  );
}

#[tokio::test]
async fn make_leader_in_child_group_needs_parent_approval() {
  let w = world().await;
  let m = confirmed(&w.store, "m@example.org", 1990).await;
  w.store.add_member(m.profile_id, w.alpha.group_id).await.unwrap();

  let uri = format!("/profiles/{}/make-leader", m.slug);
  let (status, request) = call(&w.app, Method::POST, &uri, Some(&w.alpha_leader), None).await;
  assert_eq!(status, StatusCode::ACCEPTED);
  assert_eq!(request["status"], "pending");

  let (status, _) = call(&w.app, Method::POST, &uri, Some(&w.alpha_leader), None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, pending) = call(&w.app, Method::GET, "/approvals", Some(&w.root_leader), None).await;
  assert_eq!(pending.as_array().unwrap().len(), 1);

  let id = request["approval_id"].as_str().unwrap();
  let decide = format!("/approvals/{id}/approve");
  let (status, _) = call(&w.app, Method::POST, &decide, Some(&w.alpha_leader), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, decided) = call(&w.app, Method::POST, &decide, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(decided["status"], "approved");

  let promoted = w.store.get_profile(m.profile_id).await.unwrap().unwrap();
  assert_eq!(promoted.role, Role::Leader);

  let (status, _) = call(&w.app, Method::POST, &decide, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn leader_of_group_cannot_become_member() {
  let w = world().await;
  let uri = format!("/profiles/{}/make-member", w.alpha_leader.slug);
  let (status, body) = call(&w.app, Method::POST, &uri, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["reasons"], json!(["leads_group"]));

  let uri = format!("/profiles/{}/make-external-person", w.member.slug);
  let (status, body) = call(&w.app, Method::POST, &uri, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["role"], "external_person");
}

#[tokio::test]
async fn eligibility_report() {
  let w = world().await;
  let uri = format!("/profiles/{}/eligibility", w.member.slug);
  let (status, report) = call(&w.app, Method::GET, &uri, None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["leader"]["eligible"], true);
  assert_eq!(report["member"]["reasons"], json!(["already_member"]));
  assert_eq!(report["register_group"]["reasons"], json!(["not_leader_role"]));
}

// ─── Consent forms and drawer ────────────────────────────────────────────────

#[tokio::test]
async fn consent_form_review_and_drawer() {
  let w = world().await;
  let minor = confirmed(&w.store, "kid@example.org", 2015).await;
  w.store.add_member(minor.profile_id, w.alpha.group_id).await.unwrap();

  let uri = format!("/profiles/{}/consent-form", minor.slug);
  let (status, form) = call(&w.app, Method::POST, &uri, Some(&minor), None).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, _) = call(&w.app, Method::POST, &uri, Some(&minor), None).await;
  assert_eq!(status, StatusCode::CONFLICT);

  for viewer in [&w.alpha_leader, &w.root_leader] {
    let (_, drawer) = call(&w.app, Method::GET, "/notifications", Some(viewer), None).await;
    assert_eq!(drawer["count"], 1);
    assert_eq!(drawer["sections"][0]["label"], "Today");
    assert_eq!(drawer["sections"][0]["items"][0]["kind"], "consent_form");
  }
  let (_, drawer) = call(&w.app, Method::GET, "/notifications", Some(&w.beta_leader), None).await;
  assert_eq!(drawer["count"], 0);

  let id = form["consent_form_id"].as_str().unwrap();
  let (status, _) = call(
    &w.app,
    Method::POST,
    &format!("/consent-forms/{id}/approve"),
    Some(&w.beta_leader),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(
    &w.app,
    Method::POST,
    &format!("/consent-forms/{id}/reject"),
    Some(&w.alpha_leader),
    Some(json!({ "reason": "too short" })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

  let (status, approved) = call(
    &w.app,
    Method::POST,
    &format!("/consent-forms/{id}/approve"),
    Some(&w.alpha_leader),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(approved["status"], "approved");

  let (status, _) = call(
    &w.app,
    Method::POST,
    &format!("/consent-forms/{id}/reject"),
    Some(&w.alpha_leader),
    Some(json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, drawer) = call(&w.app, Method::GET, "/notifications", Some(&w.alpha_leader), None).await;
  assert_eq!(drawer["count"], 0);
}

// ─── Profiles and reference data ─────────────────────────────────────────────

#[tokio::test]
async fn create_and_update_profile() {
  let w = world().await;
  let (status, created) = call(
    &w.app,
    Method::POST,
    "/profiles",
    None,
    Some(json!({ "email": "new@example.org" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["role"], "member");

  let (status, _) = call(
    &w.app,
    Method::POST,
    "/profiles",
    None,
    Some(json!({ "email": "new@example.org" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let slug = created["slug"].as_str().unwrap();
  let me = w.store.get_profile_by_slug(slug).await.unwrap().unwrap();
  let uri = format!("/profiles/{slug}");
  let (status, _) =
    call(&w.app, Method::PATCH, &uri, Some(&w.member), Some(json!({ "first_name": "Eve" }))).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, updated) =
    call(&w.app, Method::PATCH, &uri, Some(&me), Some(json!({ "first_name": "Eve" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(updated["first_name"], "Eve");

  let (status, _) =
    call(&w.app, Method::PATCH, &uri, Some(&me), Some(json!({ "phone_prefix": "+999" }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn register_group_under_own_group() {
  let w = world().await;
  let p = confirmed(&w.store, "new-leader@example.org", 1985).await;
  w.store.add_member(p.profile_id, w.beta.group_id).await.unwrap();
  let body = serde_json::to_value(group_input("Gamma")).unwrap();

  let (status, res) = call(&w.app, Method::POST, "/groups", Some(&p), Some(body.clone())).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(res["reasons"], json!(["not_leader_role"]));

  w.store.set_role(p.profile_id, Role::Leader).await.unwrap();
  let (status, group) = call(&w.app, Method::POST, "/groups", Some(&p), Some(body.clone())).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(group["parent_id"], w.beta.group_id.to_string());

  let (status, res) = call(&w.app, Method::POST, "/groups", Some(&p), Some(body)).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(res["reasons"], json!(["leads_group"]));
}

#[tokio::test]
async fn countries_and_settings() {
  let w = world().await;
  let (status, countries) = call(&w.app, Method::GET, "/countries", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(countries.as_array().unwrap().iter().any(|c| c["code"] == "GB"));

  let (_, settings) = call(&w.app, Method::GET, "/settings", None, None).await;
  assert_eq!(settings["adult_age"], 16);
}

#[tokio::test]
async fn new_profiles_cannot_choose_role_or_verification() {
  let w = world().await;
  let (status, created) = call(
    &w.app,
    Method::POST,
    "/profiles",
    None,
    Some(json!({
      "email": "eager@example.org",
      "role": "leader",
      "account": { "verified": true, "agreed_to_terms": true, "is_visitor": false },
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["role"], "member");
  assert_eq!(created["account"]["verified"], false);

  let slug = created["slug"].as_str().unwrap();
  let me = w.store.get_profile_by_slug(slug).await.unwrap().unwrap();
  let uri = format!("/profiles/{slug}");
  let (status, patched) = call(
    &w.app,
    Method::PATCH,
    &uri,
    Some(&me),
    Some(json!({ "verified": true, "account": { "verified": true } })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(patched["account"]["verified"], false);

  let body = serde_json::to_value(group_input("Eager")).unwrap();
  let (status, res) = call(&w.app, Method::POST, "/groups", Some(&me), Some(body)).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(res["reasons"], json!(["not_leader_role"]));
}

#[tokio::test]
async fn email_is_verified_with_the_issued_token() {
  let w = world().await;
  let (_, created) =
    call(&w.app, Method::POST, "/profiles", None, Some(json!({ "email": "v@example.org" }))).await;
  let slug = created["slug"].as_str().unwrap();
  let uri = format!("/profiles/{slug}/verify-email");

  let (status, _) = call(&w.app, Method::POST, &uri, None, Some(json!({ "token": "guess" }))).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let me = w.store.get_profile_by_slug(slug).await.unwrap().unwrap();
  let token = w.store.issue_email_token(me.profile_id).await.unwrap();
  let (status, verified) = call(&w.app, Method::POST, &uri, None, Some(json!({ "token": token }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(verified["account"]["verified"], true);
}

// ─── Store error classification ──────────────────────────────────────────────

#[tokio::test]
async fn stale_move_plan_is_a_conflict() {
  let w = world().await;
  let tree = GroupTree::new(w.store.list_groups().await.unwrap());
  let plan = plan_move(&tree, MoveRequest {
    kind:              MoveKind::ChildGroup,
    source_group_id:   w.root.group_id,
    profile_id:        w.member.profile_id,
    profile_group_id:  Some(w.root.group_id),
    profile_led_group: None,
    target_slug:       &w.alpha.slug,
  })
  .unwrap();

  let uri = format!("/groups/{}/move-to-child", w.root.slug);
  let (status, _) =
    call(&w.app, Method::POST, &uri, Some(&w.root_leader), move_body(&w.member, &w.beta)).await;
  assert_eq!(status, StatusCode::OK);

  let err = w.store.apply_move(plan).await.map_err(ApiError::store).unwrap_err();
  assert!(matches!(err, ApiError::Conflict(_)));
  assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

  let missing = w
    .store
    .set_role(uuid::Uuid::new_v4(), Role::Member)
    .await
    .map_err(ApiError::store)
    .unwrap_err();
  assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_membership_is_a_conflict() {
  let w = world().await;
  let err = w
    .store
    .add_member(w.member.profile_id, w.alpha.group_id)
    .await
    .map_err(ApiError::store)
    .unwrap_err();
  assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

  let taken = w
    .store
    .add_profile(NewProfile::new("member@example.org"))
    .await
    .map_err(ApiError::store)
    .unwrap_err();
  assert_eq!(taken.into_response().status(), StatusCode::CONFLICT);
}

// ─── Root groups ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn root_groups_are_sisters() {
  let w = world().await;
  let (_, other) = leader(&w.store, "other@example.org", "Other", None).await;

  let (_, sisters) =
    call(&w.app, Method::GET, &format!("/groups/{}/sisters", w.root.slug), None, None).await;
  assert_eq!(sisters[0]["slug"], other.slug.as_str());

  let uri = format!("/groups/{}/move-to-sister", w.root.slug);
  let (status, body) =
    call(&w.app, Method::POST, &uri, Some(&w.root_leader), move_body(&w.member, &other)).await;
  assert_eq!(status, StatusCode::OK, "{body}");
  let membership = w.store.membership_of(w.member.profile_id).await.unwrap().unwrap();
  assert_eq!(membership.group_id, other.group_id);
}

// ─── Consent self-review ─────────────────────────────────────────────────────

#[tokio::test]
async fn submitter_cannot_review_their_own_consent_form() {
  let w = world().await;
  let minor = confirmed(&w.store, "kid@example.org", 2015).await;
  w.store.add_member(minor.profile_id, w.alpha.group_id).await.unwrap();

  let uri = format!("/profiles/{}/consent-form", minor.slug);
  let (status, form) = call(&w.app, Method::POST, &uri, Some(&w.alpha_leader), None).await;
  assert_eq!(status, StatusCode::CREATED);
  let approve = format!("/consent-forms/{}/approve", form["consent_form_id"].as_str().unwrap());

  let (status, _) = call(&w.app, Method::POST, &approve, Some(&w.alpha_leader), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, approved) = call(&w.app, Method::POST, &approve, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(approved["reviewed_by"], w.root_leader.profile_id.to_string());
}

// ─── Name encryption ─────────────────────────────────────────────────────────

#[tokio::test]
async fn encrypted_names_are_masked_until_the_encrypter_reveals_them() {
  let w = world().await;
  let (status, reasons) = call(&w.app, Method::GET, "/encryption-reasons", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(reasons.as_array().unwrap().len(), 5);

  let encrypt = format!("/profiles/{}/encrypt", w.alpha_leader.slug);
  let body = Some(json!({ "reason": "security_purposes" }));
  let (status, _) = call(&w.app, Method::POST, &encrypt, Some(&w.beta_leader), body.clone()).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, hidden) =
    call(&w.app, Method::POST, &encrypt, Some(&w.root_leader), body.clone()).await;
  assert_eq!(status, StatusCode::OK, "{hidden}");
  assert_eq!(hidden["encrypted"], true);
  assert_ne!(hidden["last_name"], "alpha");
  let pseudonym = format!(
    "{} {}",
    hidden["first_name"].as_str().unwrap(),
    hidden["last_name"].as_str().unwrap()
  );

  let (_, tree) =
    call(&w.app, Method::GET, &format!("/groups/{}/tree", w.root.slug), None, None).await;
  assert_eq!(tree["children"][0]["leader_name"], pseudonym.as_str());
  let (_, members) =
    call(&w.app, Method::GET, &format!("/groups/{}/members", w.root.slug), None, None).await;
  assert!(members.as_array().unwrap().iter().all(|m| m["last_name"] != "alpha"));

  let (status, _) = call(&w.app, Method::POST, &encrypt, Some(&w.root_leader), body).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let decrypt = format!("/profiles/{}/decrypt", w.alpha_leader.slug);
  let (status, _) = call(&w.app, Method::POST, &decrypt, Some(&w.alpha_leader), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, revealed) = call(&w.app, Method::POST, &decrypt, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(revealed["encrypted"], false);
  assert_eq!(revealed["last_name"], "alpha");

  let (status, _) = call(&w.app, Method::POST, &decrypt, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::CONFLICT);
}

// ─── Catalogs and journey ────────────────────────────────────────────────────

#[tokio::test]
async fn levels_and_classifications_are_listed() {
  let w = world().await;
  let (status, levels) = call(&w.app, Method::GET, "/levels", None, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(levels.as_array().unwrap().len(), 6);
  assert_eq!(levels[1]["title"], "Seekers");
  assert_eq!(levels[1]["sublevels"].as_array().unwrap().len(), 3);

  let (_, sublevels) = call(&w.app, Method::GET, "/levels/seekers/sublevels", None, None).await;
  assert_eq!(sublevels[2]["title"], "Person of Peace");
  let (status, _) = call(&w.app, Method::GET, "/levels/nowhere/sublevels", None, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, all) = call(&w.app, Method::GET, "/sublevels", None, None).await;
  assert_eq!(all.as_array().unwrap().len(), 14);

  let (_, classes) = call(&w.app, Method::GET, "/classifications", None, None).await;
  assert_eq!(classes[0]["title"], "Other Religions");
  assert_eq!(classes[0]["position"], 1);
  assert_eq!(classes[0]["subclassifications"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn leaders_record_a_profiles_journey() {
  let w = world().await;
  let level = format!("/profiles/{}/level", w.member.slug);

  let peace = Some(json!({ "entry": "seekers", "sub_entry": "person-of-peace" }));
  let (status, _) = call(&w.app, Method::POST, &level, Some(&w.beta_leader), peace.clone()).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, first) = call(&w.app, Method::POST, &level, Some(&w.root_leader), peace).await;
  assert_eq!(status, StatusCode::CREATED, "{first}");
  assert_eq!(first["sub_entry_title"], "Person of Peace");

  let stray = Some(json!({ "entry": "seekers", "sub_entry": "unreached-person" }));
  let (status, _) = call(&w.app, Method::POST, &level, Some(&w.root_leader), stray).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (status, _) = call(
    &w.app,
    Method::POST,
    &level,
    Some(&w.root_leader),
    Some(json!({ "entry": "team-members" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let classes = format!("/profiles/{}/classifications", w.member.slug);
  let body = Some(json!({ "entry": "underprivileged", "sub_entry": "unemployed-with-skills" }));
  let (status, class) = call(&w.app, Method::POST, &classes, Some(&w.root_leader), body.clone()).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, _) = call(&w.app, Method::POST, &classes, Some(&w.root_leader), body).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let close = format!(
    "/profiles/{}/placements/{}",
    w.member.slug,
    class["placement_id"].as_str().unwrap()
  );
  let (status, closed) = call(&w.app, Method::DELETE, &close, Some(&w.root_leader), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(closed["removed_at"].is_string());

  let (_, journey) =
    call(&w.app, Method::GET, &format!("/profiles/{}/journey", w.member.slug), None, None).await;
  let levels = journey["levels"].as_array().unwrap();
  assert_eq!(levels.len(), 2);
  let open: Vec<_> = levels.iter().filter(|l| l["removed_at"].is_null()).collect();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0]["entry_title"], "Team Members");
  assert_eq!(journey["classifications"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn faith_milestones_are_authored_by_leaders_and_recorded_once() {
  let w = world().await;
  let description = "Shared their story of faith with the whole group during the Sunday gathering.";
  let new = json!({ "title": "Shared testimony", "description": description.repeat(2) });

  let (status, _) =
    call(&w.app, Method::POST, "/faith-milestones", Some(&w.member), Some(new.clone())).await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  let (status, milestone) =
    call(&w.app, Method::POST, "/faith-milestones", Some(&w.root_leader), Some(new)).await;
  assert_eq!(status, StatusCode::CREATED, "{milestone}");
  assert_eq!(milestone["milestone_type"], "profile");

  let group_kind = json!({
    "title": "Group multiplied",
    "description": description.repeat(2),
    "milestone_type": "group",
  });
  let (_, group_milestone) =
    call(&w.app, Method::POST, "/faith-milestones", Some(&w.root_leader), Some(group_kind)).await;

  let record = format!("/profiles/{}/faith-milestones", w.member.slug);
  let body = Some(json!({ "milestone": milestone["slug"] }));
  let (status, _) = call(&w.app, Method::POST, &record, Some(&w.root_leader), body.clone()).await;
  assert_eq!(status, StatusCode::CREATED);
  let (status, _) = call(&w.app, Method::POST, &record, Some(&w.root_leader), body).await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (status, _) = call(
    &w.app,
    Method::POST,
    &record,
    Some(&w.root_leader),
    Some(json!({ "milestone": group_milestone["slug"] })),
  )
  .await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

  let (_, all) = call(&w.app, Method::GET, "/faith-milestones", None, None).await;
  assert_eq!(all.as_array().unwrap().len(), 2);
  let (_, journey) =
    call(&w.app, Method::GET, &format!("/profiles/{}/journey", w.member.slug), None, None).await;
  assert_eq!(journey["faith_milestones"][0]["milestone"]["title"], "Shared testimony");
}
