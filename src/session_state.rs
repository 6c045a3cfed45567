use std::future::{Ready, ready};

use actix_session::{Session, SessionExt, SessionGetError, SessionInsertError};
use actix_web::{FromRequest, HttpRequest, dev::Payload};

pub struct TypedSession(Session);

impl TypedSession {
    const ADMIN_KEY: &'static str = "admin";

    pub fn renew(&self) {
        self.0.renew();
    }

    pub fn mark_as_admin(&self) -> Result<(), SessionInsertError> {
        self.0.insert(Self::ADMIN_KEY, true)
    }

    pub fn is_admin(&self) -> Result<bool, SessionGetError> {
        Ok(self.0.get::<bool>(Self::ADMIN_KEY)?.unwrap_or(false))
    }

    pub fn log_out(self) {
        self.0.purge()
    }
}

impl FromRequest for TypedSession {
    type Error = <Session as FromRequest>::Error;
    type Future = Ready<Result<TypedSession, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(TypedSession(req.get_session())))
    }
}
