//! CalDAV client helpers using libdav.
//!
//! Client construction plus the two requests libdav does not ship in the
//! shape we need: listing task-capable calendars and fetching every VTODO
//! of a collection.

use anyhow::{Context, Result};
use http::{Method, Uri};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};
use libdav::CalDavClient;
use libdav::dav::WebDavClient;
use libdav::requests::{DavRequest, ParseResponseError, PreparedRequest};
use roxmltree::Node;
use tower::ServiceBuilder;
use tower_http::{auth::AddAuthorization, follow_redirect::FollowRedirect};

use gradesync_core::store::CalendarInfo;

/// Type alias for the HTTP client with auth and redirect following.
type HttpClient = FollowRedirect<
    AddAuthorization<
        Client<
            hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
            String,
        >,
    >,
>;

pub type TaskCalDavClient = CalDavClient<HttpClient>;

const CALDAV_NS: &str = "urn:ietf:params:xml:ns:caldav";

/// Create a libdav CalDavClient with basic auth and redirect following.
pub fn create_caldav_client(
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<TaskCalDavClient> {
    let uri: Uri = base_url
        .parse()
        .with_context(|| format!("Invalid base URL: {}", base_url))?;

    let https_connector = HttpsConnectorBuilder::new()
        .with_native_roots()
        .context("Failed to load native TLS roots")?
        .https_or_http()
        .enable_http1()
        .build();

    let http_client = Client::builder(TokioExecutor::new()).build(https_connector);

    let auth_client = AddAuthorization::basic(http_client, username, password);

    // Hosted servers commonly redirect well-known paths to per-user hosts
    let client = ServiceBuilder::new()
        .layer(tower_http::follow_redirect::FollowRedirectLayer::new())
        .service(auth_client);

    let webdav = WebDavClient::new(uri, client);
    Ok(CalDavClient::new(webdav))
}

/// Build the href for a task resource inside a collection.
///
/// The uid becomes the resource name, so it must not contain path separators.
pub fn task_href(collection_href: &str, uid: &str) -> String {
    let base = collection_href.trim_end_matches('/');
    format!("{}/{}.ics", base, uid.replace('/', "_"))
}

/// Extract the href path from a full URL.
///
/// Converts "https://dav.example.com/dav/calendars/me/" to "/dav/calendars/me/"
pub fn url_to_href(url: &str) -> String {
    if let Ok(uri) = url.parse::<Uri>() {
        uri.path().to_string()
    } else {
        url.to_string()
    }
}

// ============================================================================
// Calendar discovery
// ============================================================================

/// PROPFIND (Depth 1) on a calendar home set, keeping only calendar
/// collections that accept VTODO components.
pub struct ListTaskCalendars<'a> {
    home_set_href: &'a str,
}

impl<'a> ListTaskCalendars<'a> {
    pub fn new(home_set_href: &'a str) -> Self {
        Self { home_set_href }
    }
}

#[derive(Debug)]
pub struct ListTaskCalendarsResponse {
    pub calendars: Vec<CalendarInfo>,
}

impl DavRequest for ListTaskCalendars<'_> {
    type Response = ListTaskCalendarsResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        let body = r#"<propfind xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <prop>
        <displayname/>
        <resourcetype/>
        <C:supported-calendar-component-set/>
    </prop>
</propfind>"#
            .to_string();

        Ok(PreparedRequest {
            method: Method::from_bytes(b"PROPFIND")?,
            path: self.home_set_href.to_string(),
            body,
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let calendars = parse_task_calendars(body)?;
        Ok(ListTaskCalendarsResponse { calendars })
    }
}

/// Parse calendar collections from a PROPFIND multistatus response.
fn parse_task_calendars(body: &[u8]) -> std::result::Result<Vec<CalendarInfo>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    let mut calendars = Vec::new();

    for response in root.descendants().filter(|n| n.tag_name().name() == "response") {
        let Some(href) = child_text(response, "href") else {
            continue;
        };

        // The home set itself is a plain collection
        let is_calendar = response
            .descendants()
            .filter(|n| n.tag_name().name() == "resourcetype")
            .flat_map(|n| n.children())
            .any(|n| n.tag_name().name() == "calendar" && n.tag_name().namespace() == Some(CALDAV_NS));
        if !is_calendar {
            continue;
        }

        // No component set advertised means every component type is accepted
        let components: Vec<_> = response
            .descendants()
            .filter(|n| n.tag_name().name() == "comp")
            .filter_map(|n| n.attribute("name"))
            .collect();
        if !components.is_empty() && !components.iter().any(|c| c.eq_ignore_ascii_case("VTODO")) {
            continue;
        }

        let display_name = child_text(response, "displayname").filter(|name| !name.is_empty());

        calendars.push(CalendarInfo { href, display_name });
    }

    Ok(calendars)
}

// ============================================================================
// Task listing
// ============================================================================

/// calendar-query REPORT returning every VTODO of a collection.
pub struct GetTodoResources<'a> {
    collection_href: &'a str,
}

impl<'a> GetTodoResources<'a> {
    pub fn new(collection_href: &'a str) -> Self {
        Self { collection_href }
    }
}

/// A fetched task resource with its ICS data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoResource {
    pub href: String,
    pub etag: Option<String>,
    pub data: String,
}

#[derive(Debug)]
pub struct GetTodoResourcesResponse {
    pub resources: Vec<TodoResource>,
}

impl DavRequest for GetTodoResources<'_> {
    type Response = GetTodoResourcesResponse;
    type ParseError = ParseResponseError;
    type Error<E> = libdav::dav::WebDavError<E>;

    fn prepare_request(&self) -> std::result::Result<PreparedRequest, http::Error> {
        let body = r#"<C:calendar-query xmlns="DAV:" xmlns:C="urn:ietf:params:xml:ns:caldav">
    <prop>
        <getetag/>
        <C:calendar-data/>
    </prop>
    <C:filter>
        <C:comp-filter name="VCALENDAR">
            <C:comp-filter name="VTODO"/>
        </C:comp-filter>
    </C:filter>
</C:calendar-query>"#
            .to_string();

        Ok(PreparedRequest {
            method: Method::from_bytes(b"REPORT")?,
            path: self.collection_href.to_string(),
            body,
            headers: vec![("Depth".to_string(), "1".to_string())],
        })
    }

    fn parse_response(
        &self,
        parts: &http::response::Parts,
        body: &[u8],
    ) -> std::result::Result<Self::Response, ParseResponseError> {
        if !parts.status.is_success() {
            return Err(ParseResponseError::BadStatusCode(parts.status));
        }

        let resources = parse_todo_resources(body)?;
        Ok(GetTodoResourcesResponse { resources })
    }
}

/// Parse task resources from a calendar-query multistatus response.
fn parse_todo_resources(body: &[u8]) -> std::result::Result<Vec<TodoResource>, ParseResponseError> {
    let text = std::str::from_utf8(body)?;
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();

    let mut resources = Vec::new();

    for response in root.descendants().filter(|n| n.tag_name().name() == "response") {
        let Some(href) = child_text(response, "href") else {
            continue;
        };
        let etag = child_text(response, "getetag");

        // Only include resources that have calendar data
        let data = response
            .descendants()
            .find(|n| n.tag_name().name() == "calendar-data")
            .and_then(|n| n.text())
            .map(|s| s.to_string());

        if let Some(data) = data {
            resources.push(TodoResource { href, etag, data });
        }
    }

    Ok(resources)
}

fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.descendants()
        .find(|n| n.tag_name().name() == name)
        .and_then(|n| n.text())
        .map(|s| s.trim().to_string())
}
