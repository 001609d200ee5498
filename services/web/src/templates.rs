//! Tera views embedded in the binary

use chrono::{Datelike, Utc};
use serde::Serialize;
use tera::{Context, Tera};

use crate::{
    models::{Snippet, SnippetListing, User},
    validation::Form,
};

const VIEWS: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("snippet_fields.html", include_str!("../templates/snippet_fields.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("show.html", include_str!("../templates/show.html")),
    ("create.html", include_str!("../templates/create.html")),
    ("edit.html", include_str!("../templates/edit.html")),
    ("mysnippets.html", include_str!("../templates/mysnippets.html")),
    ("signup.html", include_str!("../templates/signup.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("profile.html", include_str!("../templates/profile.html")),
    ("password.html", include_str!("../templates/password.html")),
    ("about.html", include_str!("../templates/about.html")),
];

/// Everything a view may read
#[derive(Debug, Default, Serialize)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub current_user_id: Option<i64>,
    pub form: Option<Form>,
    pub snippet: Option<Snippet>,
    pub author: Option<String>,
    pub snippets: Vec<Snippet>,
    pub listings: Vec<SnippetListing>,
    pub user: Option<User>,
}

impl TemplateData {
    pub fn with_form(form: Form) -> Self {
        Self {
            form: Some(form),
            ..Self::default()
        }
    }
}

/// Compiled view set
pub struct Templates {
    tera: Tera,
}

impl Templates {
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(VIEWS.iter().copied())?;
        Ok(Self { tera })
    }

    /// Render `view`, stamping the current year into `data`
    pub fn render(&self, view: &str, mut data: TemplateData) -> tera::Result<String> {
        data.current_year = Utc::now().year();
        let context = Context::from_serialize(&data)?;
        self.tera.render(view, &context)
    }
}
