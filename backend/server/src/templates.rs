//! # Templates
//!
//! Handlebars views rendered with a single [`Recipe`] as context. Values are
//! HTML escaped by Handlebars; `{{segment title}}` additionally percent-encodes
//! a title for use inside a URL path.
//!
//! The views are compiled into the binary. Setting `TEMPLATE_DIR` loads
//! `view.hbs` and `edit.hbs` from disk instead.
use std::path::Path;

use handlebars::{Handlebars, TemplateError, handlebars_helper};
use tracing::info;

use crate::{error::AppError, recipes::Recipe};

pub const VIEW_TEMPLATE: &str = include_str!("../templates/view.hbs");
pub const EDIT_TEMPLATE: &str = include_str!("../templates/edit.hbs");

handlebars_helper!(segment: |title: str| urlencoding::encode(title).into_owned());

#[derive(Debug, Clone, Copy)]
pub enum Page {
    View,
    Edit,
}

impl Page {
    pub const ALL: [Page; 2] = [Page::View, Page::Edit];

    pub fn name(self) -> &'static str {
        match self {
            Page::View => "view",
            Page::Edit => "edit",
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            Page::View => VIEW_TEMPLATE,
            Page::Edit => EDIT_TEMPLATE,
        }
    }
}

pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new(dir: Option<&Path>) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_helper("segment", Box::new(segment));

        for page in Page::ALL {
            match dir {
                Some(dir) => {
                    let path = dir.join(format!("{}.hbs", page.name()));
                    info!("Loading {} template from {}", page.name(), path.display());
                    registry.register_template_file(page.name(), path)?;
                }
                None => registry.register_template_string(page.name(), page.embedded())?,
            }
        }

        Ok(Self { registry })
    }

    pub fn render(&self, page: Page, recipe: &Recipe) -> Result<String, AppError> {
        Ok(self.registry.render(page.name(), recipe)?)
    }
}
