use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header, web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

use crate::services::auth_service::{bearer_token, TokenIssuer};
use crate::utils::AppError;

pub use crate::services::auth_service::Claims;

/// Requires a valid `Authorization: Bearer <token>` header and stores the
/// decoded [`Claims`] in the request extensions (`web::ReqData<Claims>`).
pub struct Authenticate;

impl<S, B> Transform<S, ServiceRequest> for Authenticate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthenticateMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthenticateMiddleware { service }))
    }
}

pub struct AuthenticateMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthenticateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match authenticate(&req) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Err(e) => {
                log::warn!("🔒 {} {} rejected: {}", req.method(), req.path(), e);
                Box::pin(async move { Err(e.into()) })
            }
        }
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Claims, AppError> {
    let issuer = req
        .app_data::<web::Data<TokenIssuer>>()
        .ok_or_else(|| AppError::Internal("token issuer not registered".to_string()))?;

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(AppError::Unauthorized)?;

    issuer.verify(token)
}
