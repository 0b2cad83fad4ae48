use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, models, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::sessions::open_session,
		routes::sessions::current_session,
		routes::sessions::close_session,
		routes::sessions::check_permission,
		routes::sessions::switch_role,
		routes::rbac::list_catalog,
		routes::rbac::list_roles,
		routes::rbac::get_role_scope,
		routes::rbac::get_override,
		routes::rbac::write_override,
		routes::rbac::reset_override
	),
	components(
		schemas(
			authz::Permission,
			authz::PermissionGroup,
			authz::Role,
			authz::ResolutionSource,
			models::rbac::CatalogEntry,
			models::rbac::RoleScope,
			models::rbac::ScopeOverrideView,
			models::rbac::OverrideWriteRequest,
			models::session::OpenSessionRequest,
			models::session::SwitchRoleRequest,
			models::session::SessionView,
			models::session::PermissionCheck,
			models::user::User,
			models::user::NewUser,
			routes::health::HealthResponse
		)
	),
	tags(
		(name = "Health", description = "Liveness"),
		(name = "Sessions", description = "Session lifecycle, permission checks and role switching"),
		(name = "RBAC", description = "Permission catalog, role scopes and scope overrides")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc);
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = get(move || {
		let doc_json = Arc::clone(&doc_json);
		async move { Json((*doc_json).clone()) }
	});

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

/// Session tokens are sent as bearer credentials.
fn ensure_security_components(doc: &mut Value) {
	let Some(root) = doc.as_object_mut() else {
		return;
	};

	let components = root.entry("components").or_insert_with(|| json!({}));
	if let Some(components) = components.as_object_mut() {
		let schemes = components.entry("securitySchemes").or_insert_with(|| json!({}));
		if let Some(schemes) = schemes.as_object_mut() {
			schemes.insert(
				"bearerAuth".to_string(),
				json!({
					"type": "http",
					"scheme": "bearer",
					"description": "Session token returned by POST /sessions"
				}),
			);
		}
	}
}

fn ensure_servers(doc: &mut Value, port: u16) {
	if doc.get("servers").is_none() {
		doc["servers"] = json!([{ "url": format!("http://localhost:{}", port) }]);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn openapi_lists_rbac_and_session_paths() {
		let doc = serde_json::to_value(build_openapi(8000).unwrap()).unwrap();
		let paths = doc["paths"].as_object().unwrap();

		assert!(paths.contains_key("/rbac/overrides/{role}"));
		assert!(paths.contains_key("/sessions/me/role"));
		assert!(doc["components"]["securitySchemes"]["bearerAuth"].is_object());
		assert_eq!(doc["servers"][0]["url"], "http://localhost:8000");
	}
}
