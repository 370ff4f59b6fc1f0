//! Middleware Rejecting Anonymous Requests

use std::{ops::Deref, rc::Rc};

use actix_session::SessionExt;
use actix_web::{
    Error, HttpMessage,
    body::{EitherBody, MessageBody},
    dev::{self, Service, ServiceRequest, ServiceResponse, Transform},
};
use futures_core::future::LocalBoxFuture;

use super::{AuthenticatedUser, current_user};
use crate::error::ServeError;

/// Redirects anonymous requests to the login form before they reach the
/// wrapped handlers.
///
/// Authenticated requests get an [`AuthenticatedUser`] in their extensions.
#[derive(Clone, Debug, Default)]
pub struct RequireLogin;

impl<S, B> Transform<S, ServiceRequest> for RequireLogin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequireLoginService<S>;
    type InitError = ();
    type Future = LocalBoxFuture<'static, Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let inner = RequireLoginInner { service };
        Box::pin(async move { Ok(RequireLoginService(Rc::new(inner))) })
    }
}

pub struct RequireLoginService<S>(Rc<RequireLoginInner<S>>);

impl<S> Deref for RequireLoginService<S> {
    type Target = RequireLoginInner<S>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub struct RequireLoginInner<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequireLoginService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // gate runs before any handler can touch the filesystem
        let Some(user) = current_user(&req.get_session()) else {
            log::debug!("anonymous {} {} sent to login", req.method(), req.path());
            return Box::pin(async move {
                Ok(req
                    .error_response(ServeError::AuthRequired)
                    .map_into_right_body())
            });
        };

        log::trace!("request {} by user {user:?}", req.path());
        req.extensions_mut().insert(AuthenticatedUser(user));
        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    use actix_session::Session;
    use actix_web::{
        App, HttpResponse,
        cookie::Key,
        http::{StatusCode, header},
        test, web,
    };

    use crate::auth::{LOGIN_PATH, login, session_middleware};
    use crate::config::SessionCfg;

    thread_local! {
        static REACHED: Cell<bool> = const { Cell::new(false) };
    }

    async fn protected(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
        REACHED.with(|r| r.set(true));
        HttpResponse::Ok().body(user.into_inner().0)
    }

    async fn sign_in(session: Session) -> Result<HttpResponse, ServeError> {
        login(&session, "alice")?;
        Ok(HttpResponse::Ok().finish())
    }

    #[actix_web::test]
    async fn anonymous_never_reaches_handler() {
        REACHED.with(|r| r.set(false));
        let app = test::init_service(
            App::new()
                .wrap(session_middleware(Key::generate(), &SessionCfg::default()))
                .service(web::scope("").wrap(RequireLogin).route("/x", web::get().to(protected))),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/x").to_request()).await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers().get(header::LOCATION).unwrap(), LOGIN_PATH);
        assert!(!REACHED.with(|r| r.get()));
    }

    #[actix_web::test]
    async fn session_cookie_unlocks_handler() {
        let app = test::init_service(
            App::new()
                .wrap(session_middleware(Key::generate(), &SessionCfg::default()))
                .route("/in", web::post().to(sign_in))
                .service(web::scope("").wrap(RequireLogin).route("/x", web::get().to(protected))),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::post().uri("/in").to_request()).await;
        let cookie = res.response().cookies().next().unwrap().into_owned();

        let req = test::TestRequest::get().uri("/x").cookie(cookie).to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "alice");
    }

    #[actix_web::test]
    async fn tampered_cookie_is_anonymous() {
        let cfg = SessionCfg::default();
        let app = test::init_service(
            App::new()
                .wrap(session_middleware(Key::generate(), &cfg))
                .service(web::scope("").wrap(RequireLogin).route("/x", web::get().to(protected))),
        )
        .await;

        let forged = actix_web::cookie::Cookie::new(cfg.cookie_name(), r#"{"user":"\"mallory\""}"#);
        let req = test::TestRequest::get().uri("/x").cookie(forged).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::FOUND);
    }
}
