//! Public home page: data assembly and server-side rendering

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ImagesConfig;
use crate::entity::{Facility, Organization, Record, Scripture, Slide};
use crate::image::render_configured;
use crate::store::{Filter, Query, RemoteStore, Table};

/// Everything shown on the home page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HomePage {
    pub slides: Vec<Slide>,
    pub organizations: Vec<Organization>,
    pub facilities: Vec<Facility>,
    pub scripture: Option<Scripture>,
}

/// Fetch the public listing of one kind of row; failures log and yield an empty list
pub async fn fetch_list<T: Record>(store: &Arc<dyn RemoteStore>) -> Vec<T> {
    match Table::<T>::new(Arc::clone(store))
        .list(&T::public_query())
        .await
    {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Failed to load '{}': {}", T::COLLECTION, e);
            Vec::new()
        }
    }
}

/// Query selecting the active scripture row
pub fn active_scripture_query() -> Query {
    Query::new().filter(Filter::eq("is_active", "true"))
}

/// Fetch the active scripture; failures log and yield `None`
pub async fn fetch_scripture(store: &Arc<dyn RemoteStore>) -> Option<Scripture> {
    match Table::<Scripture>::new(Arc::clone(store))
        .single(&active_scripture_query())
        .await
    {
        Ok(scripture) => Some(scripture),
        Err(e) => {
            tracing::error!("Failed to load active scripture: {}", e);
            None
        }
    }
}

impl HomePage {
    /// Fetch the four sections concurrently. A failing section is left empty.
    pub async fn load(store: &Arc<dyn RemoteStore>) -> Self {
        let (slides, organizations, facilities, scripture) = tokio::join!(
            fetch_list::<Slide>(store),
            fetch_list::<Organization>(store),
            fetch_list::<Facility>(store),
            fetch_scripture(store),
        );
        tracing::debug!(
            "Loaded home page: {} slides, {} organizations, {} facilities, scripture={}",
            slides.len(),
            organizations.len(),
            facilities.len(),
            scripture.is_some()
        );
        Self {
            slides,
            organizations,
            facilities,
            scripture,
        }
    }

    /// Copy of the page with every hosted image URL rewritten for rendering
    pub fn with_render_urls(mut self, images: &ImagesConfig) -> Self {
        for slide in &mut self.slides {
            slide.image_url = render_configured(&slide.image_url, images);
        }
        for org in &mut self.organizations {
            for member in &mut org.members {
                member.image_url = render_configured(&member.image_url, images);
            }
        }
        for facility in &mut self.facilities {
            facility.image_url = render_configured(&facility.image_url, images);
        }
        self
    }

    pub fn render_html(&self, images: &ImagesConfig) -> String {
        let slides: String = self
            .slides
            .iter()
            .map(|s| {
                format!(
                    r#"<figure class="slide"><img src="{}" alt="{}"><figcaption><strong>{}</strong> {}</figcaption></figure>"#,
                    escape(&render_configured(&s.image_url, images)),
                    escape(&s.title),
                    escape(&s.title),
                    escape(&s.description)
                )
            })
            .collect();

        let organizations: String = self
            .organizations
            .iter()
            .map(|o| {
                let thumbnail = o
                    .thumbnail()
                    .map(|url| {
                        format!(
                            r#"<img src="{}" alt="">"#,
                            escape(&render_configured(url, images))
                        )
                    })
                    .unwrap_or_default();
                let members: String = o
                    .members
                    .iter()
                    .map(|m| format!("<li>{} <em>{}</em></li>", escape(&m.name), escape(&m.role)))
                    .collect();
                format!(
                    r#"<article class="organization">{}<h3>{}</h3><p>{}</p><ul>{}</ul></article>"#,
                    thumbnail,
                    escape(&o.name),
                    escape(&o.description),
                    members
                )
            })
            .collect();

        let facilities: String = self
            .facilities
            .iter()
            .map(|f| {
                format!(
                    r#"<article class="facility"><img src="{}" alt="{}"><h3>{}</h3><p>{}</p></article>"#,
                    escape(&render_configured(&f.image_url, images)),
                    escape(&f.name),
                    escape(&f.name),
                    escape(&f.description)
                )
            })
            .collect();

        let scripture = match &self.scripture {
            Some(s) => format!(
                r#"<blockquote class="scripture"><p>{}</p><cite>{}</cite><p>{}</p></blockquote>"#,
                escape(&s.verse),
                escape(&s.reference),
                escape(&s.description)
            ),
            None => String::new(),
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Yedalm</title>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem;">
    <section id="slides">{slides}</section>
    <section id="scripture">{scripture}</section>
    <section id="organizations"><h2>Organization</h2>{organizations}</section>
    <section id="facilities"><h2>Facilities</h2>{facilities}</section>
</body>
</html>"#,
            slides = slides,
            scripture = scripture,
            organizations = organizations,
            facilities = facilities,
        )
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
