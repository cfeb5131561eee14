use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct GroceryListResponse {
    pub items: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRecipeRequest {
    pub recipe_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListRequest {
    #[serde(default)]
    pub items: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUpdatedResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grocery_list: Option<String>,
}

impl ListUpdatedResponse {
    pub fn new(message: &str, grocery_list: Option<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            grocery_list,
        }
    }
}
