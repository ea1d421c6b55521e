use std::future::{ready, Ready};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    HttpMessage,
};
use futures_util::future::LocalBoxFuture;

/// Identity resolved from a validated bearer token. This is only who the
/// caller *is*; the stored user row (and with it the role) is looked up
/// per operation.
#[derive(Debug, Clone)]
pub struct AuthenticatedSubject {
    pub subject: String,
    pub name: String,
    pub email: String,
}

/// Rejects requests without a valid bearer token and inserts the resolved
/// subject into request extensions for the handlers.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService { service }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match jwt::authenticate(&req) {
            Ok(subject) => {
                req.extensions_mut().insert(subject);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await })
            }
            Err(err) => Box::pin(async move { Err(err.into()) }),
        }
    }
}

pub mod jwt {
    use std::env::{self, VarError};

    use actix_web::dev::ServiceRequest;
    use chrono::Utc;
    use jsonwebtoken::{
        decode, encode, errors::Error, DecodingKey, EncodingKey, Header, TokenData, Validation,
    };

    use super::AuthenticatedSubject;
    use crate::{dto::Claims, errors::ApiError};

    pub fn get_secret() -> Result<String, VarError> {
        env::var("JWT_ACCESS_SECRET")
    }

    /// Mint an HS256 token for `subject`, valid for `ttl_secs`. The
    /// identity provider does this in production; tests and local tooling
    /// use it directly.
    pub fn create(subject: &str, name: &str, email: &str, ttl_secs: usize) -> Result<String, Error> {
        let exp = Utc::now().timestamp() as usize + ttl_secs;
        let secret = get_secret().expect("JWT_ACCESS_SECRET must be set");
        let claims = Claims::new(subject, name, email, exp);
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
    }

    /// Decode and validate; expiry is checked by the library.
    pub fn decode_claims(token: &str) -> Result<TokenData<Claims>, Error> {
        let secret = get_secret().expect("JWT_ACCESS_SECRET must be set");
        let decoding_key = DecodingKey::from_secret(secret.as_ref());
        decode::<Claims>(token, &decoding_key, &Validation::default())
    }

    pub fn authenticate(req: &ServiceRequest) -> Result<AuthenticatedSubject, ApiError> {
        let token = parse_request(req, "Bearer ")?;
        let claims = decode_claims(&token).map_err(|_| ApiError::Unauthenticated)?;
        Ok(AuthenticatedSubject {
            subject: claims.claims.sub,
            name: claims.claims.name,
            email: claims.claims.email,
        })
    }

    pub fn parse_request(req: &ServiceRequest, prefix: &str) -> Result<String, ApiError> {
        if let Some(auth_header) = req.headers().get("Authorization") {
            if let Ok(auth_value) = auth_header.to_str() {
                if let Some(token) = auth_value.strip_prefix(prefix) {
                    return Ok(token.trim().to_string());
                }
            }
        }
        Err(ApiError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::jwt;

    #[test]
    fn tokens_round_trip_their_claims() {
        std::env::set_var("JWT_ACCESS_SECRET", "test-secret");
        let token = jwt::create("subj-1", "Ada", "ada@example.com", 3600).unwrap();
        let data = jwt::decode_claims(&token).unwrap();
        assert_eq!(data.claims.sub, "subj-1");
        assert_eq!(data.claims.name, "Ada");
        assert_eq!(data.claims.email, "ada@example.com");
    }
}
