use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

use crate::database::MongoDB;
use crate::services::auth_service::{self, Claims};
use crate::utils::AppError;

/// Requires the authenticated caller to be an admin user.
///
/// Must run after [`super::Authenticate`]: it reads the claims that middleware
/// stored and looks the email up in the `users` collection.
pub struct RequireAdmin;

impl<S, B> Transform<S, ServiceRequest> for RequireAdmin
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAdminMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAdminMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireAdminMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireAdminMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let email = req
                .extensions()
                .get::<Claims>()
                .map(|claims| claims.email.clone())
                .ok_or(AppError::Unauthorized)?;

            let email = match email {
                Some(email) => email,
                None => {
                    log::warn!("⛔ {} {}: token carries no email", req.method(), req.path());
                    return Err(AppError::Forbidden.into());
                }
            };

            let db = req
                .app_data::<web::Data<MongoDB>>()
                .cloned()
                .ok_or_else(|| AppError::Internal("database not registered".to_string()))?;

            let record = auth_service::find_user_role(&db, &email).await?;
            if let Err(e) = auth_service::ensure_admin(record.as_ref()) {
                log::warn!("⛔ {} {}: {} is not an admin", req.method(), req.path(), email);
                return Err(e.into());
            }

            service.call(req).await
        })
    }
}
