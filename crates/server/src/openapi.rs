use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RosterEntryDoc {
    pub name: String,
    pub full_name: Option<String>,
    pub user_image: Option<String>,
    pub first_name: Option<String>,
    pub enabled: bool,
}

#[derive(ToSchema)]
pub struct RosterListDoc { pub message: Vec<RosterEntryDoc> }

/// `users` is a list of user ids or a JSON string encoding one.
#[derive(ToSchema)]
pub struct OnboardRequestDoc { pub users: Vec<String> }

#[derive(ToSchema)]
pub struct OnboardResultDoc {
    #[schema(value_type = Vec<Object>)]
    pub success_users: Vec<serde_json::Value>,
    #[schema(value_type = Vec<Object>)]
    pub failed_users: Vec<serde_json::Value>,
}

#[derive(ToSchema)]
pub struct OnboardOutcomeDoc { pub message: OnboardResultDoc }

/// `function` is one of get_document, get_documents, create_document, create_documents,
/// update_document, update_documents, delete_document, delete_documents, attach_file_to_document.
#[derive(ToSchema)]
pub struct FunctionCallDoc {
    pub function: String,
    #[schema(value_type = Object)]
    pub arguments: serde_json::Value,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::roster::list_users,
        crate::routes::roster::onboard_users,
        crate::routes::functions::call,
    ),
    components(
        schemas(
            HealthResponse,
            RosterEntryDoc,
            RosterListDoc,
            OnboardRequestDoc,
            OnboardResultDoc,
            OnboardOutcomeDoc,
            FunctionCallDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "roster"),
        (name = "documents")
    )
)]
pub struct ApiDoc;
