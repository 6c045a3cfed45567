use once_cell::sync::Lazy;
use regex::Regex;
use tera::{Context, Tera};

use crate::domain::NewsletterMessage;

const EMAIL_TEMPLATE: &str = "newsletter_email.html";
const PARAGRAPH_OPEN: &str = r#"<p style="margin: 12px 0;">"#;

static IMAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").expect("Invalid image regex"));
static H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^### (.*)$").expect("Invalid h3 regex"));
static H2: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^## (.*)$").expect("Invalid h2 regex"));
static H1: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^# (.*)$").expect("Invalid h1 regex"));
static BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("Invalid bold regex"));
static LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("Invalid link regex"));

pub fn render_images(text: &str) -> String {
    IMAGE
        .replace_all(
            text,
            r#"<img src="${2}" alt="${1}" style="max-width: 100%; height: auto; margin: 16px 0; border-radius: 8px;" />"#,
        )
        .into_owned()
}

pub fn render_headings(text: &str) -> String {
    let text = H3.replace_all(
        text,
        r#"<h3 style="margin: 16px 0 8px; font-size: 18px; font-weight: bold;">${1}</h3>"#,
    );
    let text = H2.replace_all(
        &text,
        r#"<h2 style="margin: 20px 0 12px; font-size: 20px; font-weight: bold;">${1}</h2>"#,
    );
    H1.replace_all(
        &text,
        r#"<h1 style="margin: 24px 0 16px; font-size: 24px; font-weight: bold;">${1}</h1>"#,
    )
    .into_owned()
}

pub fn render_bold(text: &str) -> String {
    BOLD.replace_all(text, "<strong>${1}</strong>").into_owned()
}

/// Must run after [`render_images`], or image syntax would be read as a link.
pub fn render_links(text: &str) -> String {
    LINK.replace_all(
        text,
        r#"<a href="${2}" style="color: #2563eb; text-decoration: underline;">${1}</a>"#,
    )
    .into_owned()
}

pub fn render_line_breaks(text: &str) -> String {
    text.replace("\n\n", &format!("</p>{PARAGRAPH_OPEN}"))
        .replace('\n', "<br>")
}

pub fn wrap_paragraph(html: String) -> String {
    if html.starts_with('<') {
        html
    } else {
        format!("{PARAGRAPH_OPEN}{html}</p>")
    }
}

/// Converts the small markdown subset used by newsletters and posts into inline-styled HTML.
pub fn markdown_to_html(markdown: &str) -> String {
    let html = render_images(markdown);
    let html = render_headings(&html);
    let html = render_bold(&html);
    let html = render_links(&html);
    let html = render_line_breaks(&html);
    wrap_paragraph(html)
}

/// Renders the outer email document around a newsletter body.
pub struct EmailTemplate {
    tera: Tera,
    site_origin: String,
    organization_name: String,
    default_link_text: String,
}

impl EmailTemplate {
    pub fn new(
        site_origin: String,
        organization_name: String,
        default_link_text: String,
    ) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        // Values are escaped by hand; the rendered markdown must stay raw HTML.
        tera.autoescape_on(vec![]);
        tera.add_raw_template(
            EMAIL_TEMPLATE,
            include_str!("../../views/newsletter_email.html"),
        )?;

        Ok(Self {
            tera,
            site_origin,
            organization_name,
            default_link_text,
        })
    }

    pub fn site_origin(&self) -> &str {
        &self.site_origin
    }

    pub fn organization_name(&self) -> &str {
        &self.organization_name
    }

    pub fn unsubscribe_url(&self, recipient: &str) -> String {
        format!(
            "{}/unsubscribe?email={}",
            self.site_origin,
            urlencoding::encode(recipient)
        )
    }

    /// Builds the personalised document for one recipient.
    pub fn render(
        &self,
        content_html: &str,
        message: &NewsletterMessage,
        recipient: &str,
    ) -> Result<String, tera::Error> {
        let mut ctx = Context::new();
        ctx.insert("content_html", content_html);
        ctx.insert(
            "organization_name",
            &htmlescape::encode_minimal(&self.organization_name),
        );
        ctx.insert(
            "unsubscribe_url",
            &htmlescape::encode_minimal(&self.unsubscribe_url(recipient)),
        );

        if let Some(cta) = &message.call_to_action {
            let label = cta.label.as_deref().unwrap_or(&self.default_link_text);
            ctx.insert("link_url", &htmlescape::encode_minimal(&cta.url));
            ctx.insert("link_text", &htmlescape::encode_minimal(label));
        }

        self.tera.render(EMAIL_TEMPLATE, &ctx)
    }
}
