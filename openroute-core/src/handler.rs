use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::{FromRequest, FromRequestParts, Multipart};

use crate::binder::{bind, RawRequest};
use crate::http::header::is_multipart;
use crate::http::{Bytes, IntoResponse, RawPathParams, Request, Response, CONTENT_TYPE};
use crate::part::{PartSchemas, PartSlot, Validated};
use crate::reply::Reply;
use crate::validation::ValidationFailure;

pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// The type-erased, validating wrapper installed with the router.
///
/// The flag tells whether the final rule has placeholders to extract.
pub(crate) type Endpoint = Arc<dyn Fn(Request, bool) -> BoxFuture + Send + Sync>;

/// Wrap `handler` with request binding and reply normalization.
///
/// On a binding failure the handler is not called and a 422 response
/// carrying every violation is returned.
pub(crate) fn wrap<H, C, P, Q, F, B, Fun, Fut>(schemas: PartSchemas, handler: Fun) -> Endpoint
where
    H: PartSlot,
    C: PartSlot,
    P: PartSlot,
    Q: PartSlot,
    F: PartSlot,
    B: PartSlot,
    Fun: Fn(Validated<H::Output, C::Output, P::Output, Q::Output, F::Output, B::Output>) -> Fut
        + Clone
        + Send
        + Sync
        + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: Reply,
{
    let schemas = Arc::new(schemas);
    Arc::new(move |req: Request, has_placeholders: bool| {
        let schemas = Arc::clone(&schemas);
        let handler = handler.clone();
        Box::pin(async move {
            let raw = match extract(req, has_placeholders, schemas.needs_body()).await {
                Ok(raw) => raw,
                Err(rejection) => return rejection,
            };

            match bind::<H, C, P, Q, F, B>(&schemas, &raw) {
                Ok(validated) => handler(validated).await.into_reply(),
                Err(failure) => reject(failure),
            }
        })
    })
}

fn reject(failure: ValidationFailure) -> Response {
    tracing::debug!(
        violations = failure.violations.len(),
        locations = ?failure.locations(),
        "request rejected by validation"
    );
    failure.into_response()
}

/// Pull the raw parts out of the request. Router-level rejections (missing
/// captures, oversized or unreadable bodies) are returned as responses.
async fn extract(
    req: Request,
    has_placeholders: bool,
    needs_body: bool,
) -> Result<RawRequest, Response> {
    let (mut head, body) = req.into_parts();

    let path = if has_placeholders {
        RawPathParams::from_request_parts(&mut head, &())
            .await
            .map_err(IntoResponse::into_response)?
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    } else {
        Vec::new()
    };

    let query = head.uri.query().map(str::to_string);
    let headers = head.headers.clone();

    if !needs_body {
        return Ok(RawRequest::from_head(path, query.as_deref(), &headers, None));
    }

    let multipart = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(is_multipart);
    let req = Request::from_parts(head, body);

    if multipart {
        let form = read_multipart(req).await?;
        let mut raw = RawRequest::from_head(path, query.as_deref(), &headers, None);
        raw.form = form;
        return Ok(raw);
    }

    let bytes = Bytes::from_request(req, &())
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(RawRequest::from_head(path, query.as_deref(), &headers, Some(&bytes)))
}

/// Collect multipart fields as name-value pairs. File fields contribute their
/// file name.
async fn read_multipart(req: Request) -> Result<Vec<(String, String)>, Response> {
    let mut multipart = Multipart::from_request(req, &())
        .await
        .map_err(IntoResponse::into_response)?;

    let mut pairs = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(IntoResponse::into_response)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let value = match file_name {
            Some(file_name) => file_name,
            None => field.text().await.map_err(IntoResponse::into_response)?,
        };
        pairs.push((name, value));
    }
    Ok(pairs)
}
