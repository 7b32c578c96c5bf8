use std::sync::Arc;

use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    error::AppError,
    recipes::{Lookup, Recipe, RecipeError},
    state::State as AppState,
    templates::Page,
    utils::{EDIT_ROUTE, VIEW_ROUTE, redirect_to},
};

pub const RECIPE_DELETED: &str = "recipe deleted";
pub const DELETE_FAILED: &str = "failed to delete";

#[derive(Deserialize)]
pub struct SaveForm {
    #[serde(default)]
    body: String,
}

pub async fn view_handler(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Result<Response, AppError> {
    match state.recipes.lookup(&title).await? {
        Lookup::Exists(recipe) => render(&state, Page::View, &recipe),
        // Missing recipes are created from the edit page
        Lookup::Missing => Ok(redirect_to(EDIT_ROUTE, &title)),
    }
}

pub async fn edit_handler(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Result<Response, AppError> {
    let recipe = match state.recipes.load(&title).await {
        Ok(recipe) => recipe,
        Err(RecipeError::NotFound) => Recipe::blank(&title),
        Err(e) => {
            warn!("Serving a blank form for {title:?}: {e}");
            Recipe::blank(&title)
        }
    };

    render(&state, Page::Edit, &recipe)
}

pub async fn save_handler(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
    Form(form): Form<SaveForm>,
) -> Result<Response, AppError> {
    match state.recipes.lookup(&title).await? {
        Lookup::Exists(recipe) => {
            info!("Updating recipe {} ({title:?})", recipe.id);
            state.recipes.update(&title, &form.body).await?;
        }
        Lookup::Missing => {
            let mut recipe = Recipe {
                id: 0,
                title: title.clone(),
                body: form.body,
            };
            state.recipes.save(&mut recipe).await?;
        }
    }

    Ok(redirect_to(VIEW_ROUTE, &title))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(title): Path<String>,
) -> Result<Response, AppError> {
    let recipe = match state.recipes.lookup(&title).await? {
        Lookup::Exists(recipe) => recipe,
        Lookup::Missing => return Ok(redirect_to(EDIT_ROUTE, &title)),
    };

    let status = match state.recipes.delete(&recipe.title).await {
        Ok(()) => RECIPE_DELETED,
        Err(e) => {
            warn!("Failed to delete {title:?}: {e}");
            DELETE_FAILED
        }
    };

    render(&state, Page::View, &Recipe::blank(status))
}

fn render(state: &AppState, page: Page, recipe: &Recipe) -> Result<Response, AppError> {
    Ok(Html(state.templates.render(page, recipe)?).into_response())
}
