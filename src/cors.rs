use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Build a layer that attaches CORS headers to all responses.
///
/// Credentialed requests require the allowed origin to match the request
/// origin, so when no origins are configured the request origin is echoed
/// back.
pub fn cors_layer(allowed_origins: &[String]) -> anyhow::Result<CorsLayer> {
    let allow_origin = if allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        let origins = allowed_origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin)
                    .with_context(|| format!("Invalid allowed origin: {}", origin))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::OPTIONS, Method::POST])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::ORIGIN])
        .allow_credentials(true))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn invalid_origin_is_rejected() {
        let origins = vec!["https://books.example.com\n".to_owned()];

        assert!(cors_layer(&origins).is_err());
    }

    #[test]
    fn no_origins_is_allowed() {
        assert!(cors_layer(&[]).is_ok());
    }
}
