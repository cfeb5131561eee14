use axum::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::model::Recipe;
use crate::config::RecipeApiConfig;
use crate::dietary::DietaryProfile;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("recipe provider request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("recipe provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("recipe provider rate limit reached")]
    RateLimited,
}

/// Upstream source of recipes.
#[async_trait]
pub trait RecipeProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        profile: &DietaryProfile,
        count: usize,
    ) -> Result<Vec<Recipe>, ProviderError>;
    async fn random(&self, profile: &DietaryProfile, count: usize) -> Result<Vec<Recipe>, ProviderError>;
    async fn details(&self, id: i64) -> Result<Recipe, ProviderError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Recipe>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RandomResponse {
    Wrapped { recipes: Vec<Recipe> },
    Bare(Vec<Recipe>),
}

impl RandomResponse {
    fn into_recipes(self) -> Vec<Recipe> {
        match self {
            Self::Wrapped { recipes } | Self::Bare(recipes) => recipes,
        }
    }
}

/// Query parameters derived from a user's profile. The provider narrows
/// results with them; the local filter still runs on whatever comes back.
pub fn profile_params(profile: &DietaryProfile) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    let diets: Vec<&str> = profile
        .dietary_preferences
        .iter()
        .filter_map(|t| t.provider_diet())
        .collect();
    if !diets.is_empty() {
        params.push(("diet", diets.join(",")));
    }
    if !profile.allergies.is_empty() {
        params.push(("intolerances", profile.allergies.join(",")));
    }
    if !profile.cuisines.is_empty() {
        params.push(("cuisine", profile.cuisines.join(",")));
    }
    params
}

/// Query for the random endpoint, which takes diets, intolerances and
/// cuisines all as `include-tags`.
pub fn random_params(profile: &DietaryProfile, count: usize) -> Vec<(&'static str, String)> {
    let mut params = vec![("number", count.to_string())];
    let tags: Vec<String> = profile_params(profile)
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    if !tags.is_empty() {
        params.push(("include-tags", tags.join(",")));
    }
    params
}

#[derive(Clone)]
pub struct SpoonacularClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SpoonacularClient {
    pub fn new(http: reqwest::Client, config: &RecipeApiConfig) -> Self {
        if config.api_key.is_empty() {
            warn!("SPOONACULAR_API_KEY is not set; recipe requests will be rejected upstream");
        }
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!(%url, ?params, "recipe provider request");
        let res = self
            .http
            .get(&url)
            .header("x-api-key", &self.api_key)
            .query(params)
            .send()
            .await?;

        let status = res.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(res.json::<T>().await?)
    }
}

#[async_trait]
impl RecipeProvider for SpoonacularClient {
    async fn search(
        &self,
        query: &str,
        profile: &DietaryProfile,
        count: usize,
    ) -> Result<Vec<Recipe>, ProviderError> {
        let mut params = vec![
            ("query", query.to_string()),
            ("number", count.to_string()),
            ("addRecipeInformation", "true".to_string()),
            ("addRecipeInstructions", "true".to_string()),
            ("fillIngredients", "true".to_string()),
        ];
        params.extend(profile_params(profile));
        let body: SearchResponse = self.get_json("complexSearch", &params).await?;
        Ok(body.results)
    }

    async fn random(&self, profile: &DietaryProfile, count: usize) -> Result<Vec<Recipe>, ProviderError> {
        let body: RandomResponse = self.get_json("random", &random_params(profile, count)).await?;
        Ok(body.into_recipes())
    }

    async fn details(&self, id: i64) -> Result<Recipe, ProviderError> {
        self.get_json(&format!("{id}/information"), &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dietary::DietaryTag;

    #[test]
    fn profile_params_only_send_provider_diets() {
        let profile = DietaryProfile {
            dietary_preferences: vec![DietaryTag::Vegan, DietaryTag::Halal, DietaryTag::GlutenFree],
            allergies: vec!["soy".into(), "peanut".into()],
            cuisines: vec!["thai".into()],
            ..Default::default()
        };
        let params = profile_params(&profile);
        assert_eq!(
            params,
            vec![
                ("diet", "vegan,gluten free".to_string()),
                ("intolerances", "soy,peanut".to_string()),
                ("cuisine", "thai".to_string()),
            ]
        );
        assert!(profile_params(&DietaryProfile::default()).is_empty());
    }

    #[test]
    fn random_request_carries_cuisines() {
        let profile = DietaryProfile {
            dietary_preferences: vec![DietaryTag::Vegan],
            cuisines: vec!["thai".into()],
            ..Default::default()
        };
        assert_eq!(
            random_params(&profile, 50),
            vec![
                ("number", "50".to_string()),
                ("include-tags", "vegan,thai".to_string()),
            ]
        );

        let cuisine_only = DietaryProfile {
            cuisines: vec!["thai".into(), "indian".into()],
            ..Default::default()
        };
        assert!(random_params(&cuisine_only, 10)
            .contains(&("include-tags", "thai,indian".to_string())));
        assert_eq!(
            random_params(&DietaryProfile::default(), 10),
            vec![("number", "10".to_string())]
        );
    }

    #[test]
    fn random_response_accepts_both_shapes() {
        let wrapped: RandomResponse =
            serde_json::from_str(r#"{"recipes": [{"id": 1, "title": "A"}]}"#).unwrap();
        assert_eq!(wrapped.into_recipes().len(), 1);

        let bare: RandomResponse = serde_json::from_str(r#"[{"id": 2}, {"id": 3}]"#).unwrap();
        let ids: Vec<i64> = bare.into_recipes().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn search_response_tolerates_missing_results() {
        let body: SearchResponse = serde_json::from_str(r#"{"offset": 0, "totalResults": 0}"#).unwrap();
        assert!(body.results.is_empty());
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = SpoonacularClient::new(
            reqwest::Client::new(),
            &RecipeApiConfig {
                base_url: "https://api.example.com/recipes/".into(),
                api_key: "k".into(),
            },
        );
        assert_eq!(client.base_url, "https://api.example.com/recipes");
    }
}
