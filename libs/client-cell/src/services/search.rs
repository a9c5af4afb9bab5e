use anyhow::Result;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Client, ClientSearchHit, MatchKind};

/// Which predicates a free-text query activates. Decided entirely
/// client-side so it can be unit tested without the datastore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPlan {
    pub phone_fragment: Option<String>,
    pub name_fragment: Option<String>,
    pub email_fragment: Option<String>,
}

impl SearchPlan {
    pub fn is_empty(&self) -> bool {
        self.phone_fragment.is_none()
            && self.name_fragment.is_none()
            && self.email_fragment.is_none()
    }
}

/// Builds the search plan for a raw query:
/// - the digit-only subsequence, when at least 3 digits, searches phones;
/// - a query that is not purely numeric searches names;
/// - a query containing `@` also searches emails.
pub fn plan_search(query: &str) -> SearchPlan {
    let trimmed = query.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    let purely_numeric = !trimmed.is_empty()
        && trimmed.chars().all(|c| c.is_ascii_digit() || c.is_whitespace());

    SearchPlan {
        phone_fragment: (digits.len() >= 3).then(|| digits),
        name_fragment: (!trimmed.is_empty() && !purely_numeric).then(|| trimmed.to_string()),
        email_fragment: trimmed.contains('@').then(|| trimmed.to_string()),
    }
}

pub struct SearchService {
    supabase: SupabaseClient,
}

impl SearchService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    /// Ranked-by-nothing candidate search: contains matches only, tagged
    /// with the predicate that found them, de-duplicated by client id.
    /// Callers are expected to debounce (~300ms); responses for stale
    /// queries are not correlated or cancelled here.
    pub async fn search_clients(
        &self,
        organization_id: &str,
        query: &str,
        auth_token: &str,
    ) -> Result<Vec<ClientSearchHit>> {
        let plan = plan_search(query);
        debug!("Client search plan for {:?}: {:?}", query, plan);

        if plan.is_empty() {
            return Ok(vec![]);
        }

        let mut hits: Vec<ClientSearchHit> = Vec::new();
        let mut seen: Vec<Uuid> = Vec::new();

        if let Some(ref fragment) = plan.phone_fragment {
            let clients = self.query_contains(organization_id, "phone", fragment, auth_token).await?;
            merge_hits(&mut hits, &mut seen, clients, MatchKind::Phone);
        }

        if let Some(ref fragment) = plan.name_fragment {
            let encoded = fragment.replace(' ', "%20");
            let path = format!(
                "/rest/v1/clients?organization_id=eq.{}&or=(first_name.ilike.*{}*,last_name.ilike.*{}*)",
                organization_id, encoded, encoded
            );
            let clients = self.fetch(&path, auth_token).await?;
            merge_hits(&mut hits, &mut seen, clients, MatchKind::Name);
        }

        if let Some(ref fragment) = plan.email_fragment {
            let clients = self.query_contains(organization_id, "email", fragment, auth_token).await?;
            merge_hits(&mut hits, &mut seen, clients, MatchKind::Email);
        }

        Ok(hits)
    }

    async fn query_contains(
        &self,
        organization_id: &str,
        column: &str,
        fragment: &str,
        auth_token: &str,
    ) -> Result<Vec<Client>> {
        let path = format!(
            "/rest/v1/clients?organization_id=eq.{}&{}=ilike.*{}*",
            organization_id, column, fragment
        );
        self.fetch(&path, auth_token).await
    }

    async fn fetch(&self, path: &str, auth_token: &str) -> Result<Vec<Client>> {
        let result: Vec<Value> = self.supabase.request(
            Method::GET,
            path,
            Some(auth_token),
            None,
        ).await?;

        let clients: Vec<Client> = result.into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Client>, _>>()?;

        Ok(clients)
    }
}

fn merge_hits(
    hits: &mut Vec<ClientSearchHit>,
    seen: &mut Vec<Uuid>,
    clients: Vec<Client>,
    kind: MatchKind,
) {
    for client in clients {
        if seen.contains(&client.id) {
            continue;
        }
        seen.push(client.id);
        hits.push(ClientSearchHit { client, matched_by: kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_digit_query_searches_phones_only() {
        let plan = plan_search("612");
        assert_eq!(plan.phone_fragment.as_deref(), Some("612"));
        assert_eq!(plan.name_fragment, None);
        assert_eq!(plan.email_fragment, None);
    }

    #[test]
    fn short_digit_queries_search_nothing() {
        let plan = plan_search("61");
        assert!(plan.is_empty());
    }

    #[test]
    fn mixed_query_searches_names_and_phones() {
        // Digits embedded in text still form the phone subsequence
        let plan = plan_search("garcia 612");
        assert_eq!(plan.phone_fragment.as_deref(), Some("612"));
        assert_eq!(plan.name_fragment.as_deref(), Some("garcia 612"));
        assert_eq!(plan.email_fragment, None);
    }

    #[test]
    fn text_query_searches_names_only() {
        let plan = plan_search("Maria");
        assert_eq!(plan.phone_fragment, None);
        assert_eq!(plan.name_fragment.as_deref(), Some("Maria"));
        assert_eq!(plan.email_fragment, None);
    }

    #[test]
    fn at_sign_activates_email_search() {
        let plan = plan_search("maria@example");
        assert_eq!(plan.name_fragment.as_deref(), Some("maria@example"));
        assert_eq!(plan.email_fragment.as_deref(), Some("maria@example"));
    }

    #[test]
    fn whitespace_only_is_empty() {
        assert!(plan_search("   ").is_empty());
        assert!(plan_search("").is_empty());
    }

    #[test]
    fn duplicate_clients_keep_the_first_match_tag() {
        use chrono::Utc;

        let client = Client {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            first_name: "Maria".to_string(),
            last_name: "Garcia".to_string(),
            email: Some("maria@example.com".to_string()),
            phone: Some("612345678".to_string()),
            tax_id: None,
            address: None,
            postal_code: None,
            city: None,
            province: None,
            date_of_birth: None,
            gender: None,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut hits = Vec::new();
        let mut seen = Vec::new();
        merge_hits(&mut hits, &mut seen, vec![client.clone()], MatchKind::Phone);
        merge_hits(&mut hits, &mut seen, vec![client], MatchKind::Name);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched_by, MatchKind::Phone);
    }
}
