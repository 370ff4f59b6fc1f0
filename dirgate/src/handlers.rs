//! Request Handlers and Route Registration

use actix_files::Files;
use actix_multipart::Multipart;
use actix_session::Session;
use actix_web::{HttpRequest, HttpResponse, http::header, mime, web};
use serde::Deserialize;

use crate::AppState;
use crate::auth::{self, AuthenticatedUser, LOGIN_PATH, RequireLogin};
use crate::error::ServeError;
use crate::files::{Target, listing, resolve, transfer, upload};
use crate::render;

/// Prefix of the upload route.
const UPLOAD_PREFIX: &str = "/upload";

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    name: String,
}

#[inline]
fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

async fn login_form() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(mime::TEXT_HTML_UTF_8)
        .body(render::login_page())
}

async fn login(session: Session, form: web::Form<LoginForm>) -> Result<HttpResponse, ServeError> {
    let name = form.name.trim();
    if name.is_empty() {
        return Ok(redirect(LOGIN_PATH));
    }
    auth::login(&session, name)?;
    Ok(redirect("/"))
}

/// List a directory or stream a file, depending on what the path points at.
async fn browse(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: web::ReqData<AuthenticatedUser>,
) -> Result<HttpResponse, ServeError> {
    let resolved = resolve(&state.root, req.path().trim_start_matches('/'))?;
    match Target::probe(resolved.path()).await? {
        Target::Directory => {
            let listing =
                listing::list(resolved.path(), resolved.relative(), state.sort_entries).await?;
            Ok(HttpResponse::Ok()
                .content_type(mime::TEXT_HTML_UTF_8)
                .body(render::listing_page(&listing)))
        }
        Target::File => {
            let name = transfer::download_filename(req.path(), resolved.path());
            let transfer = transfer::open(resolved.path(), name, state.chunk_size).await?;
            log::info!("user {:?} downloading /{}", user.0, resolved.relative());
            Ok(transfer.into_response())
        }
        Target::Missing => Err(ServeError::NotFound),
    }
}

/// Store the uploaded files in the target directory and go back to it.
async fn upload(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: web::ReqData<AuthenticatedUser>,
    payload: Multipart,
) -> Result<HttpResponse, ServeError> {
    let raw = req.path().strip_prefix(UPLOAD_PREFIX).unwrap_or_default();
    let resolved = resolve(&state.root, raw.trim_start_matches('/'))?;
    if Target::probe(resolved.path()).await? != Target::Directory {
        return Err(ServeError::NotFound);
    }

    let parts = upload::collect_parts(payload, state.upload_limit).await?;
    let written = upload::receive(resolved.path(), &parts).await?;
    log::info!(
        "user {:?} uploaded {written} file(s) to /{}",
        user.0,
        resolved.relative()
    );
    Ok(redirect(&render::href(resolved.relative())))
}

/// Register every route of the server.
///
/// Login and static assets are public, everything else sits behind
/// [`RequireLogin`].
pub fn configure(state: AppState) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let static_dir = state.static_dir.clone();
        cfg.app_data(web::Data::new(state)).service(
            web::resource(LOGIN_PATH)
                .route(web::get().to(login_form))
                .route(web::post().to(login)),
        );

        // a missing dir would make `Files` fall back to the working directory
        if static_dir.is_dir() {
            cfg.service(Files::new("/static", static_dir));
        } else {
            log::debug!("static dir {static_dir:?} missing, not serving /static");
        }

        cfg.service(
            web::scope("")
                .wrap(RequireLogin)
                .service(
                    web::resource(format!("{UPLOAD_PREFIX}/{{path:.*}}"))
                        .route(web::post().to(upload)),
                )
                .service(web::resource("/{path:.*}").route(web::get().to(browse))),
        );
    }
}
