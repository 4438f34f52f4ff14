//! Handler for listing reconciled outputs without a job record.

use axum::extract::State;
use axum::Json;
use flowgen_core::error::CoreError;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::extract::ApiQuery;
use crate::handlers::blocking;
use crate::links::BaseUrl;
use crate::middleware::auth::JobKey;
use crate::response::ListOutputsResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListOutputsQuery {
    /// Output folder to reconcile. Empty or absent means "everything".
    #[serde(default)]
    pub folder_id: Option<String>,
}

/// GET /list-outputs
///
/// With `folder_id`, slots run up to the highest scene found in that
/// folder. Without it, scenes from every folder are merged by ordinal.
pub async fn list_outputs(
    _key: JobKey,
    State(state): State<AppState>,
    base: BaseUrl,
    ApiQuery(query): ApiQuery<ListOutputsQuery>,
) -> AppResult<Json<ListOutputsResponse>> {
    let folder = query.folder_id.filter(|f| !f.is_empty());
    let dispatcher = state.dispatcher.clone();

    let response = blocking(move || match folder {
        Some(folder) => {
            let reconciled = dispatcher
                .list_folder(&folder, |name| base.folder_file_url(&folder, name))
                .map_err(|e| match e {
                    CoreError::Validation(msg) => {
                        AppError::BadRequest(format!("Invalid folder_id: {msg}"))
                    }
                    other => AppError::Core(other),
                })?;
            Ok::<_, AppError>(ListOutputsResponse {
                folder_id: Some(folder),
                outputs: reconciled.outputs,
            })
        }
        None => Ok(ListOutputsResponse {
            folder_id: None,
            outputs: dispatcher.list_all(|relative| base.output_url(relative)).outputs,
        }),
    })
    .await??;

    Ok(Json(response))
}
