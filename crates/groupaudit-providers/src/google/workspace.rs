//! Admin Directory and Groups Settings API client.

use groupaudit_core::{Group, GroupSettings};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::source::{BoxFuture, GroupDirectory, GroupPage, GroupSettingsSource};

use super::client::AuthorizedClient;

/// Base URL for the Admin SDK Directory API.
const DIRECTORY_API_BASE: &str = "https://admin.googleapis.com/admin/directory/v1";

/// Base URL for the Groups Settings API.
const SETTINGS_API_BASE: &str = "https://www.googleapis.com/groups/v1";

/// Google Workspace client implementing both [`GroupDirectory`] and
/// [`GroupSettingsSource`].
#[derive(Debug)]
pub struct GoogleWorkspace {
    client: AuthorizedClient,
    directory_base: String,
    settings_base: String,
}

impl GoogleWorkspace {
    /// Creates a client against the public Google endpoints.
    pub fn new(client: AuthorizedClient) -> Self {
        Self {
            client,
            directory_base: DIRECTORY_API_BASE.to_string(),
            settings_base: SETTINGS_API_BASE.to_string(),
        }
    }

    /// Points the client at other API roots.
    pub fn with_base_urls(
        mut self,
        directory_base: impl Into<String>,
        settings_base: impl Into<String>,
    ) -> Self {
        self.directory_base = directory_base.into();
        self.settings_base = settings_base.into();
        self
    }

    async fn list_groups_page_impl(
        &self,
        customer_id: &str,
        page_token: Option<&str>,
        max_results: u32,
    ) -> ApiResult<GroupPage> {
        let url = format!("{}/groups", self.directory_base);
        let max_results = max_results.to_string();

        let mut query = vec![
            ("customer", customer_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        let response: GroupListResponse = self.client.get_json(&url, &query).await?;
        let page = response.into_page();
        debug!(
            "listed {} groups (more: {})",
            page.groups.len(),
            page.continuation().is_some()
        );
        Ok(page)
    }

    async fn group_settings_impl(&self, group_email: &str) -> ApiResult<GroupSettings> {
        let url = format!(
            "{}/groups/{}",
            self.settings_base,
            urlencoding::encode(group_email)
        );

        let settings: ApiGroupSettings = self.client.get_json(&url, &[("alt", "json")]).await?;
        Ok(settings.into_settings(group_email))
    }
}

impl GroupDirectory for GoogleWorkspace {
    fn list_groups_page<'a>(
        &'a self,
        customer_id: &'a str,
        page_token: Option<&'a str>,
        max_results: u32,
    ) -> BoxFuture<'a, ApiResult<GroupPage>> {
        Box::pin(self.list_groups_page_impl(customer_id, page_token, max_results))
    }
}

impl GroupSettingsSource for GoogleWorkspace {
    fn group_settings<'a>(
        &'a self,
        group_email: &'a str,
    ) -> BoxFuture<'a, ApiResult<GroupSettings>> {
        Box::pin(self.group_settings_impl(group_email))
    }
}

// Directory API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupListResponse {
    #[serde(default)]
    groups: Vec<ApiGroup>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl GroupListResponse {
    fn into_page(self) -> GroupPage {
        GroupPage {
            groups: self.groups.into_iter().map(ApiGroup::into_group).collect(),
            next_page_token: self.next_page_token,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGroup {
    #[serde(default)]
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    description: Option<String>,
    /// The API encodes this int64 as a string.
    direct_members_count: Option<String>,
    #[serde(default)]
    admin_created: bool,
}

impl ApiGroup {
    fn into_group(self) -> Group {
        Group {
            id: self.id,
            email: self.email,
            name: self.name,
            description: self.description.filter(|d| !d.is_empty()),
            direct_members_count: self
                .direct_members_count
                .and_then(|count| count.parse().ok()),
            admin_created: self.admin_created,
        }
    }
}

// Groups Settings API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGroupSettings {
    email: Option<String>,
    name: Option<String>,
    #[serde(default)]
    who_can_join: String,
}

impl ApiGroupSettings {
    fn into_settings(self, requested_email: &str) -> GroupSettings {
        let mut settings = GroupSettings::new(
            self.email.unwrap_or_else(|| requested_email.to_string()),
            &self.who_can_join,
        );
        settings.name = self.name;
        settings
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use groupaudit_core::WhoCanJoin;
    use mockito::{Matcher, Server};

    use super::*;
    use crate::error::ApiErrorCode;
    use crate::google::config::OAuthCredentials;
    use crate::google::oauth::OAuthClient;
    use crate::google::tokens::Token;
    use crate::lister::GroupLister;

    fn workspace(base: &str) -> GoogleWorkspace {
        let token = Token {
            access_token: "ya29.valid".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: None,
            expiry: Some(Utc::now() + chrono::Duration::hours(1)),
        };
        let oauth =
            OAuthClient::new(OAuthCredentials::new("id", "secret"), Duration::from_secs(5))
                .unwrap();
        let client = AuthorizedClient::new(token, oauth, Duration::from_secs(5), "test").unwrap();
        GoogleWorkspace::new(client).with_base_urls(
            format!("{}/admin/directory/v1", base),
            format!("{}/groups/v1", base),
        )
    }

    #[test]
    fn parses_directory_page() {
        let json = r#"{
            "kind": "admin#directory#groups",
            "etag": "\"abc\"",
            "groups": [
                {
                    "kind": "admin#directory#group",
                    "id": "00abc",
                    "email": "eng@example.com",
                    "name": "Engineering",
                    "directMembersCount": "42",
                    "description": "",
                    "adminCreated": true
                },
                {"email": "sales@example.com"}
            ],
            "nextPageToken": "tok2"
        }"#;
        let page = serde_json::from_str::<GroupListResponse>(json)
            .unwrap()
            .into_page();

        assert_eq!(page.continuation(), Some("tok2"));
        assert_eq!(page.groups.len(), 2);
        let eng = &page.groups[0];
        assert_eq!(eng.id, "00abc");
        assert_eq!(eng.name, "Engineering");
        assert_eq!(eng.direct_members_count, Some(42));
        assert_eq!(eng.description, None);
        assert!(eng.admin_created);
        assert_eq!(page.groups[1].email, "sales@example.com");
    }

    #[test]
    fn parses_last_page_without_groups() {
        let page = serde_json::from_str::<GroupListResponse>(r#"{"kind":"admin#directory#groups"}"#)
            .unwrap()
            .into_page();
        assert!(page.groups.is_empty());
        assert_eq!(page.continuation(), None);
    }

    #[test]
    fn parses_settings() {
        let json = r#"{
            "kind": "groupsSettings#groups",
            "email": "eng@example.com",
            "name": "Engineering",
            "whoCanJoin": "ALL_IN_DOMAIN_CAN_JOIN",
            "whoCanViewMembership": "ALL_IN_DOMAIN_CAN_VIEW"
        }"#;
        let settings = serde_json::from_str::<ApiGroupSettings>(json)
            .unwrap()
            .into_settings("eng@example.com");
        assert_eq!(settings.who_can_join, WhoCanJoin::AllInDomainCanJoin);
        assert_eq!(settings.name.as_deref(), Some("Engineering"));
    }

    #[test]
    fn settings_without_email_use_requested_one() {
        let settings = serde_json::from_str::<ApiGroupSettings>(r#"{"whoCanJoin":"X"}"#)
            .unwrap()
            .into_settings("a@example.com");
        assert_eq!(settings.email, "a@example.com");
        assert_eq!(settings.who_can_join, WhoCanJoin::Other("X".to_string()));
    }

    #[tokio::test]
    async fn lists_all_pages_with_customer_and_page_size() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/admin/directory/v1/groups")
            .match_query(Matcher::Exact("customer=C0abc&maxResults=100".into()))
            .match_header("authorization", "Bearer ya29.valid")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"groups":[{"email":"a@x.com"}],"nextPageToken":"p2"}"#)
            .create_async()
            .await;
        let second = server
            .mock("GET", "/admin/directory/v1/groups")
            .match_query(Matcher::Exact(
                "customer=C0abc&maxResults=100&pageToken=p2".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"groups":[{"email":"b@x.com"}],"nextPageToken":""}"#)
            .create_async()
            .await;
        let workspace = workspace(&server.url());

        let groups = GroupLister::new(&workspace, "C0abc")
            .collect_all()
            .await
            .unwrap();
        let emails: Vec<_> = groups.iter().map(|g| g.email.as_str()).collect();
        assert_eq!(emails, vec!["a@x.com", "b@x.com"]);

        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn fetches_settings_by_encoded_email() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/groups/v1/groups/a%2Bb%40x.com")
            .match_query(Matcher::Exact("alt=json".into()))
            .match_header("authorization", "Bearer ya29.valid")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"email":"a+b@x.com","whoCanJoin":"ANYONE_CAN_JOIN"}"#)
            .create_async()
            .await;
        let workspace = workspace(&server.url());

        let settings = workspace.group_settings("a+b@x.com").await.unwrap();
        assert_eq!(settings.who_can_join, WhoCanJoin::AnyoneCanJoin);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn settings_error_is_returned() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/groups/v1/groups/gone%40x.com")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"code":404,"message":"Resource Not Found: groupKey"}}"#)
            .create_async()
            .await;

        let err = workspace(&server.url())
            .group_settings("gone@x.com")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ApiErrorCode::NotFound);
        assert!(err.message().contains("Resource Not Found: groupKey"));
    }

    #[tokio::test]
    async fn directory_error_stops_listing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/admin/directory/v1/groups")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":{"code":403,"message":"Not Authorized to access this resource/api"}}"#)
            .expect(1)
            .create_async()
            .await;
        let workspace = workspace(&server.url());

        let err = GroupLister::new(&workspace, "C0abc")
            .collect_all()
            .await
            .unwrap_err();
        assert_eq!(err.code(), ApiErrorCode::AuthorizationFailed);
        mock.assert_async().await;
    }
}
