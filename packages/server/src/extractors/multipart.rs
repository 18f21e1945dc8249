use axum::extract::{FromRequest, Multipart, Request};

use crate::error::AppError;

/// A `Multipart` wrapper whose rejections become `AppError::Validation`, so a
/// request without a multipart body gets the usual `{code, message}` shape.
pub struct AppMultipart(pub Multipart);

impl<S> FromRequest<S> for AppMultipart
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Multipart::from_request(req, state)
            .await
            .map(AppMultipart)
            .map_err(|e| AppError::Validation(e.body_text()))
    }
}
