use anyhow::{Context, Result};
use axum::{
	body::Bytes,
	extract::{DefaultBodyLimit, Path as AxumPath, State},
	http::{header, HeaderMap, StatusCode},
	response::{Html, IntoResponse, Response},
	routing::{get, post},
	Json, Router,
};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::export::EXPORT_FILE_NAME;
use crate::logo::LogoFile;
use crate::navigation::InputEvent;
use crate::session::DeckSession;
use crate::templates::{SCRIPT, STYLESHEET};

const FILE_NAME_HEADER: &str = "x-file-name";
const MAX_LOGO_BYTES: usize = 16 * 1024 * 1024;

pub struct DeckServer {
	session: Arc<DeckSession>,
	host: String,
	port: u16,
	default_logo: Option<PathBuf>,
}

impl DeckServer {
	pub fn new(config: &Config) -> Result<Self> {
		let session = DeckSession::new(config).context("Failed to prepare slide documents")?;

		Ok(Self {
			session,
			host: config.server.host.clone(),
			port: config.server.port,
			default_logo: config.default_logo().map(Path::to_path_buf),
		})
	}

	pub async fn serve(&self) -> Result<()> {
		// Kept alive until the server stops.
		let _watcher = match &self.default_logo {
			Some(path) => self.watch_logo(path)?,
			None => None,
		};

		let app = router(Arc::clone(&self.session));

		let addr = format!("{}:{}", self.host, self.port);
		let listener = tokio::net::TcpListener::bind(&addr)
			.await
			.with_context(|| format!("Failed to bind {}", addr))?;

		info!("Deck running at http://{}", addr);
		axum::serve(listener, app).await?;

		Ok(())
	}

	/// Rebuilds the slide documents when the default logo changes on disk.
	fn watch_logo(&self, path: &Path) -> Result<Option<RecommendedWatcher>> {
		let dir = match path.parent() {
			Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
			_ => PathBuf::from("."),
		};
		if !dir.is_dir() {
			warn!("Not watching {}: directory does not exist", path.display());
			return Ok(None);
		}

		let rt = tokio::runtime::Handle::current();
		let mut watcher = notify::recommended_watcher({
			let session = Arc::clone(&self.session);
			let logo = path.to_path_buf();

			move |event: Result<notify::Event, notify::Error>| {
				let event = match event {
					Ok(event) => event,
					Err(e) => {
						error!("Logo watch error: {}", e);
						return;
					}
				};
				if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
					return;
				}
				if !event.paths.iter().any(|p| p.file_name() == logo.file_name()) {
					return;
				}

				let session = Arc::clone(&session);
				let logo = logo.clone();
				rt.spawn_blocking(move || match session.reload_default_logo(&logo) {
					Ok(true) => info!("Default logo {} changed, slides rebuilt", logo.display()),
					Ok(false) => debug!("Default logo changed but is not in use"),
					Err(e) => error!("Rebuild error: {}", e),
				});
			}
		})?;

		watcher
			.watch(&dir, RecursiveMode::NonRecursive)
			.with_context(|| format!("Failed to watch {}", dir.display()))?;
		info!("Watching {} for changes", path.display());

		Ok(Some(watcher))
	}
}

pub fn router(session: Arc<DeckSession>) -> Router {
	Router::new()
		.route("/", get(serve_viewer))
		.route("/slides/{index}", get(serve_slide))
		.route("/api/state", get(serve_state))
		.route("/api/input", post(handle_input))
		.route(
			"/api/logo",
			post(upload_logo)
				.delete(clear_logo)
				.layer(DefaultBodyLimit::max(MAX_LOGO_BYTES)),
		)
		.route("/logo", get(serve_logo))
		.route("/api/export", post(start_export))
		.route("/download/{file}", get(serve_download))
		.route("/assets/style.css", get(serve_stylesheet))
		.route("/assets/deck.js", get(serve_script))
		.layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
		.with_state(session)
}

async fn serve_viewer(State(session): State<Arc<DeckSession>>) -> Response {
	match session.render_viewer() {
		Ok(html) => Html(html).into_response(),
		Err(e) => {
			error!("Failed to render viewer: {}", e);
			(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render slide").into_response()
		}
	}
}

async fn serve_slide(State(session): State<Arc<DeckSession>>, AxumPath(index): AxumPath<usize>) -> Response {
	match session.engine().render_fragment(index) {
		Ok(html) => Html(html).into_response(),
		Err(_) => (StatusCode::NOT_FOUND, "Not found").into_response(),
	}
}

async fn serve_state(State(session): State<Arc<DeckSession>>) -> Response {
	Json(session.snapshot()).into_response()
}

async fn handle_input(State(session): State<Arc<DeckSession>>, Json(event): Json<InputEvent>) -> Response {
	Json(session.handle_input(&event)).into_response()
}

async fn upload_logo(State(session): State<Arc<DeckSession>>, headers: HeaderMap, body: Bytes) -> Response {
	// No file chosen: nothing changes.
	if body.is_empty() {
		return (StatusCode::BAD_REQUEST, "No file selected").into_response();
	}

	let content_type = headers
		.get(header::CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.unwrap_or("application/octet-stream")
		.to_string();
	let file_name = headers
		.get(FILE_NAME_HEADER)
		.and_then(|v| v.to_str().ok())
		.map(|v| urlencoding::decode(v).map(|s| s.into_owned()).unwrap_or_else(|_| v.to_string()));

	let file = LogoFile {
		file_name,
		content_type,
		bytes: body.to_vec(),
	};
	let session_ref = Arc::clone(&session);
	match tokio::task::spawn_blocking(move || session_ref.set_logo(file)).await {
		Ok(Ok(())) => Json(session.snapshot()).into_response(),
		Ok(Err(e)) => {
			error!("Failed to apply logo: {}", e);
			(StatusCode::INTERNAL_SERVER_ERROR, "Failed to apply logo").into_response()
		}
		Err(e) => {
			error!("Logo task failed: {}", e);
			StatusCode::INTERNAL_SERVER_ERROR.into_response()
		}
	}
}

async fn clear_logo(State(session): State<Arc<DeckSession>>) -> Response {
	match session.clear_logo() {
		Ok(()) => Json(session.snapshot()).into_response(),
		Err(e) => {
			error!("Failed to clear logo: {}", e);
			(StatusCode::INTERNAL_SERVER_ERROR, "Failed to clear logo").into_response()
		}
	}
}

async fn serve_logo(State(session): State<Arc<DeckSession>>) -> Response {
	match session.logo().load() {
		Some((content_type, bytes)) => (
			[
				(header::CONTENT_TYPE, content_type),
				(header::CACHE_CONTROL, "no-cache".to_string()),
			],
			bytes,
		)
			.into_response(),
		None => (StatusCode::NOT_FOUND, "No logo").into_response(),
	}
}

async fn start_export(State(session): State<Arc<DeckSession>>) -> Response {
	let status = if session.start_export() {
		StatusCode::ACCEPTED
	} else {
		debug!("Export requested while one is running");
		StatusCode::CONFLICT
	};
	(status, Json(session.snapshot())).into_response()
}

async fn serve_download(State(session): State<Arc<DeckSession>>, AxumPath(file): AxumPath<String>) -> Response {
	let Some(path) = session.download_path(&file) else {
		return (StatusCode::NOT_FOUND, "Not found").into_response();
	};

	match tokio::fs::read(&path).await {
		Ok(bytes) => (
			[
				(header::CONTENT_TYPE, "application/pdf".to_string()),
				(
					header::CONTENT_DISPOSITION,
					format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
				),
			],
			bytes,
		)
			.into_response(),
		Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to read file").into_response(),
	}
}

async fn serve_stylesheet() -> impl IntoResponse {
	([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}

async fn serve_script() -> impl IntoResponse {
	([(header::CONTENT_TYPE, "application/javascript; charset=utf-8")], SCRIPT)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::session::tests::{session_with, wait_idle};
	use axum::body::{to_bytes, Body};
	use axum::http::{Method, Request};
	use tower::ServiceExt;

	async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Vec<u8>) {
		let response = app.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let headers = response.headers().clone();
		let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		(status, headers, body.to_vec())
	}

	fn get(uri: &str) -> Request<Body> {
		Request::builder().uri(uri).body(Body::empty()).unwrap()
	}

	fn json(body: &[u8]) -> serde_json::Value {
		serde_json::from_slice(body).unwrap()
	}

	#[tokio::test]
	async fn test_viewer_and_fragments() {
		let dir = tempfile::tempdir().unwrap();
		let app = router(session_with(dir.path(), None));

		let (status, _, body) = send(&app, get("/")).await;
		assert_eq!(status, StatusCode::OK);
		assert!(String::from_utf8(body).unwrap().contains("data-index=\"0\""));

		let (status, _, body) = send(&app, get("/slides/14")).await;
		assert_eq!(status, StatusCode::OK);
		assert!(String::from_utf8(body).unwrap().contains("data-index=\"14\""));

		let (status, _, _) = send(&app, get("/slides/15")).await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, headers, _) = send(&app, get("/assets/style.css")).await;
		assert_eq!(status, StatusCode::OK);
		assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/css"));
	}

	#[tokio::test]
	async fn test_input_moves_current_slide() {
		let dir = tempfile::tempdir().unwrap();
		let app = router(session_with(dir.path(), None));

		let input = |body: &'static str| {
			Request::builder()
				.method(Method::POST)
				.uri("/api/input")
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from(body))
				.unwrap()
		};

		let (_, _, body) = send(&app, input(r#"{"kind":"key","key":"ArrowLeft"}"#)).await;
		let state = json(&body);
		assert_eq!(state["index"], 0);
		assert_eq!(state["first"], true);
		assert_eq!(state["last"], false);

		let (_, _, body) = send(&app, input(r#"{"kind":"key","key":"ArrowRight"}"#)).await;
		assert_eq!(json(&body)["index"], 1);

		let (_, _, body) = send(&app, input(r#"{"kind":"swipe","start_x":300,"end_x":250}"#)).await;
		assert_eq!(json(&body)["index"], 1);

		let (_, _, body) = send(&app, input(r#"{"kind":"swipe","start_x":300,"end_x":249}"#)).await;
		assert_eq!(json(&body)["index"], 2);

		let (_, _, body) = send(&app, input(r#"{"kind":"swipe","start_x":null,"end_x":10}"#)).await;
		assert_eq!(json(&body)["index"], 2);

		let (_, _, body) = send(&app, input(r#"{"kind":"click","target":"previous"}"#)).await;
		let state = json(&body);
		assert_eq!(state["index"], 1);
		assert_eq!(state["label"], "2 / 15");

		let (status, _, _) = send(&app, input(r#"{"kind":"dance"}"#)).await;
		assert!(status.is_client_error());
	}

	#[tokio::test]
	async fn test_logo_upload_and_clear() {
		let dir = tempfile::tempdir().unwrap();
		let app = router(session_with(dir.path(), None));

		let (status, _, _) = send(&app, get("/logo")).await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let upload = Request::builder()
			.method(Method::POST)
			.uri("/api/logo")
			.header(header::CONTENT_TYPE, "image/svg+xml")
			.header(FILE_NAME_HEADER, "brand%20mark.svg")
			.body(Body::from("<svg/>"))
			.unwrap();
		let (status, _, body) = send(&app, upload).await;
		assert_eq!(status, StatusCode::OK);
		let state = json(&body);
		assert_eq!(state["logo"]["kind"], "uploaded");
		assert_eq!(state["logo"]["name"], "brand mark.svg");
		assert_eq!(state["logo"]["src"], "/logo?v=1");

		let (status, headers, body) = send(&app, get("/logo")).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(headers[header::CONTENT_TYPE], "image/svg+xml");
		assert_eq!(body, b"<svg/>");

		let empty = Request::builder()
			.method(Method::POST)
			.uri("/api/logo")
			.body(Body::empty())
			.unwrap();
		let (status, _, _) = send(&app, empty).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);

		let clear = Request::builder()
			.method(Method::DELETE)
			.uri("/api/logo")
			.body(Body::empty())
			.unwrap();
		let (_, _, body) = send(&app, clear).await;
		assert_eq!(json(&body)["logo"]["kind"], "none");

		let (status, _, _) = send(&app, get("/logo")).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_export_then_download() {
		let dir = tempfile::tempdir().unwrap();
		let session = session_with(dir.path(), None);
		let app = router(Arc::clone(&session));

		let export = || {
			Request::builder()
				.method(Method::POST)
				.uri("/api/export")
				.body(Body::empty())
				.unwrap()
		};

		let (status, _, body) = send(&app, export()).await;
		assert_eq!(status, StatusCode::ACCEPTED);
		assert_eq!(json(&body)["export"]["state"], "running");

		let (status, _, _) = send(&app, export()).await;
		assert_eq!(status, StatusCode::CONFLICT);

		wait_idle(&session).await;

		let (_, _, body) = send(&app, get("/api/state")).await;
		let state = json(&body);
		assert_eq!(state["export"]["state"], "idle");
		let url = state["download"]["url"].as_str().unwrap().to_string();
		assert_eq!(url, format!("/download/{}", EXPORT_FILE_NAME));

		let (status, headers, body) = send(&app, get(&url)).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
		assert!(body.starts_with(b"%PDF"));

		let (status, _, _) = send(&app, get("/download/other.pdf")).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}
}
