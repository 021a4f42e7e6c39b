//! Template engine for rendering documentation pages.

use minijinja::{context, Environment};

/// A navigation item.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NavItem {
    /// Display title
    pub title: String,
    /// URL path
    pub path: String,
    /// Child items
    pub children: Vec<NavItem>,
    /// Whether this is the current page
    pub active: bool,
}

/// A table of contents entry.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TocEntry {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Context for rendering a page template.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PageContext {
    /// Page title
    pub title: String,
    /// Site title from mkdocs.yml
    pub site_name: String,
    /// Site description, if configured
    pub description: Option<String>,
    /// Rendered content HTML
    pub content: String,
    /// Navigation items
    pub nav: Vec<NavItem>,
    /// Table of contents
    pub toc: Vec<TocEntry>,
    /// URLs of extra stylesheets
    pub extra_css: Vec<String>,
    /// Include the live-reload client script
    pub live_reload: bool,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create a new template engine with the built-in theme templates.
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();

        env.add_template_owned("base.html".to_string(), BASE_TEMPLATE.to_string())?;
        env.add_template_owned("page.html".to_string(), PAGE_TEMPLATE.to_string())?;
        env.add_template_owned("nav.html".to_string(), NAV_TEMPLATE.to_string())?;

        Ok(Self { env })
    }

    /// Render a page using the specified template.
    pub fn render_page(
        &self,
        template: &str,
        page: &PageContext,
    ) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template)?;

        tmpl.render(context! {
            title => &page.title,
            site_name => &page.site_name,
            description => &page.description,
            content => &page.content,
            nav => &page.nav,
            toc => &page.toc,
            extra_css => &page.extra_css,
            live_reload => &page.live_reload,
        })
    }
}

const BASE_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  {% if description %}<meta name="description" content="{{ description }}">
  {% endif %}<title>{{ title }} - {{ site_name }}</title>
  <link rel="stylesheet" href="/assets/mvcdoc.css">
  {% for href in extra_css %}<link rel="stylesheet" href="{{ href }}">
  {% endfor %}</head>
<body>
  <div class="layout">
    <nav class="sidebar">
      {% include "nav.html" %}
    </nav>
    <main class="main">
      {% block content %}{% endblock %}
    </main>
  </div>
  {% if live_reload %}<script src="/~/livereload.js"></script>
  {% endif %}</body>
</html>"##;

const PAGE_TEMPLATE: &str = r##"{% extends "base.html" %}

{% block content %}
<article class="page">
  <div class="content">
    {{ content | safe }}
  </div>
</article>

{% if toc %}
<aside class="toc">
  <h2>On this page</h2>
  <ul>
  {% for entry in toc %}
    <li class="toc-level-{{ entry.level }}">
      <a href="#{{ entry.id }}">{{ entry.title }}</a>
    </li>
  {% endfor %}
  </ul>
</aside>
{% endif %}
{% endblock %}"##;

const NAV_TEMPLATE: &str = r##"<div class="nav-header">
  <a href="/" class="nav-logo">{{ site_name }}</a>
</div>
<ul class="nav-list">
{% for item in nav %}
  <li class="nav-item{% if item.active %} active{% endif %}">
    <a href="{{ item.path }}">{{ item.title }}</a>
    {% if item.children %}
    <ul class="nav-children">
      {% for child in item.children %}
      <li class="nav-item{% if child.active %} active{% endif %}">
        <a href="{{ child.path }}">{{ child.title }}</a>
      </li>
      {% endfor %}
    </ul>
    {% endif %}
  </li>
{% endfor %}
</ul>"##;
