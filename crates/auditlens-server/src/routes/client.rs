//! Server-side client metadata for the track endpoints.
//!
//! IP address and User-Agent come from the connection and headers only; the
//! request body is never consulted.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};

use auditlens_core::visitor::ClientContext;

use crate::state::AppState;

/// Extractor yielding the [`ClientContext`] for the current request.
pub struct Client(pub ClientContext);

impl FromRequestParts<Arc<AppState>> for Client {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let socket = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let ip_address = extract_client_ip(&parts.headers, socket);
        let user_agent = parts
            .headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let mut context = ClientContext {
            ip_address,
            user_agent,
            ..ClientContext::default()
        };

        if let Some(ua) = context.user_agent.as_deref().and_then(parse_user_agent) {
            context.device_type = Some(ua.device_type);
            context.browser = ua.browser;
            context.os = ua.os;
        }
        if let (Some(reader), Some(ip)) = (&state.geoip, context.ip_address.as_deref()) {
            if let Some(geo) = lookup_geo(reader, ip) {
                context.country = geo.country;
                context.city = geo.city;
            }
        }

        Ok(Client(context))
    }
}

/// First hop of `X-Forwarded-For`, else the socket peer address.
pub fn extract_client_ip(headers: &HeaderMap, socket: Option<IpAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| socket.map(|ip| ip.to_string()))
}

struct GeoInfo {
    country: Option<String>,
    city: Option<String>,
}

fn lookup_geo(reader: &maxminddb::Reader<Vec<u8>>, ip: &str) -> Option<GeoInfo> {
    let ip_addr = IpAddr::from_str(ip).ok()?;
    let record: maxminddb::geoip2::City = reader.lookup(ip_addr).ok()?;

    let country = record
        .country
        .as_ref()
        .and_then(|c| c.iso_code)
        .map(|s| s.to_string());

    let city = record
        .city
        .as_ref()
        .and_then(|c| c.names.as_ref())
        .and_then(|names| names.get("en"))
        .map(|s| s.to_string());

    Some(GeoInfo { country, city })
}

struct UaInfo {
    device_type: String,
    browser: Option<String>,
    os: Option<String>,
}

/// Classify a User-Agent with `woothee`. `None` when it cannot be parsed.
fn parse_user_agent(user_agent: &str) -> Option<UaInfo> {
    let result = woothee::parser::Parser::new().parse(user_agent)?;

    let device_type = match result.category {
        "smartphone" | "mobilephone" => "mobile",
        "tablet" => "tablet",
        _ => "desktop",
    }
    .to_string();

    Some(UaInfo {
        device_type,
        browser: known(result.name),
        os: known(result.os),
    })
}

/// woothee reports unknown fields as `"UNKNOWN"` or an empty string.
fn known(value: &str) -> Option<String> {
    if value.is_empty() || value == "UNKNOWN" {
        None
    } else {
        Some(value.to_string())
    }
}
