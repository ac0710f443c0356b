//! HTML document shell shared by every generated page.
//!
//! The shell is shared between build and preview so what you see locally
//! is exactly what gets deployed.

use docsite_kit_core::{Site, Transform};

/// HTML-escape a string to prevent XSS attacks
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '&' => "&amp;".to_string(),
            '<' => "&lt;".to_string(),
            '>' => "&gt;".to_string(),
            '"' => "&quot;".to_string(),
            '\'' => "&#x27;".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

/// Per-build page chrome, rendered once and reused for every page.
pub struct Chrome {
    pub navbar: String,
    pub footer: String,
    pub has_math: bool,
}

impl Chrome {
    pub fn for_site(site: &Site) -> Self {
        Self {
            navbar: crate::components::navbar_html(site),
            footer: crate::components::footer_html(site),
            has_math: site.pipeline.iter().any(|t| matches!(t, Transform::Math)),
        }
    }
}

/// Render a complete HTML document around the given body content.
///
/// `page_title` is `None` for the homepage, which uses the site-level
/// greeting title instead.
pub fn render_page(
    site: &Site,
    chrome: &Chrome,
    page_title: Option<&str>,
    description: &str,
    content_html: &str,
) -> String {
    let title = match page_title {
        Some(t) => format!("{} | {}", t, site.meta.title),
        None => format!("Hello from {}", site.meta.title),
    };

    let katex = if chrome.has_math {
        concat!(
            "<link rel=\"stylesheet\" href=\"https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/katex.min.css\">\n",
            "    <script defer src=\"https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/katex.min.js\"></script>\n",
            "    <script defer src=\"https://cdn.jsdelivr.net/npm/katex@0.16.11/dist/contrib/auto-render.min.js\" onload=\"renderMathInElement(document.body)\"></script>",
        )
    } else {
        ""
    };

    let gtag = match &site.analytics {
        Some(analytics) => {
            let id = html_escape(&analytics.tracking_id);
            format!(
                r#"<script async src="https://www.googletagmanager.com/gtag/js?id={id}"></script>
    <script>
      window.dataLayer = window.dataLayer || [];
      function gtag() {{ dataLayer.push(arguments); }}
      gtag('js', new Date());
      gtag('config', '{id}', {{ 'anonymize_ip': {anonymize} }});
    </script>"#,
                id = id,
                anonymize = analytics.anonymize_ip,
            )
        }
        None => String::new(),
    };

    let zoom = &site.theme.image_zoom;
    let zoom_script = format!(
        r#"<script>
      (function () {{
        var overlay = null;
        document.querySelectorAll('{selector}').forEach(function (img) {{
          img.style.cursor = 'zoom-in';
          img.addEventListener('click', function () {{
            if (overlay) return;
            window.scrollBy(0, {scroll_offset});
            overlay = document.createElement('div');
            overlay.className = 'image-zoom-overlay';
            overlay.style.background = '{background}';
            overlay.style.padding = '{margin}px';
            var zoomed = img.cloneNode();
            zoomed.className = 'image-zoom-target';
            overlay.appendChild(zoomed);
            overlay.addEventListener('click', function () {{
              overlay.remove();
              overlay = null;
            }});
            document.body.appendChild(overlay);
          }});
        }});
      }})();
    </script>"#,
        selector = zoom.selector,
        scroll_offset = zoom.scroll_offset,
        background = zoom.background,
        margin = zoom.margin,
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="en" data-code-theme-light="{code_light}" data-code-theme-dark="{code_dark}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="description" content="{description}">
    <title>{title}</title>
    <link rel="icon" href="{favicon}">
    <link rel="stylesheet" href="{stylesheet}">
    {katex}
    {gtag}
</head>
<body>
    {navbar}
    <main class="main-wrapper markdown">
{content}
    </main>
    {footer}
    {zoom_script}
</body>
</html>"#,
        code_light = html_escape(&site.theme.code_theme.light),
        code_dark = html_escape(&site.theme.code_theme.dark),
        description = html_escape(description),
        title = html_escape(&title),
        favicon = site.asset_url(&site.meta.favicon),
        stylesheet = site.absolute_route("/assets/site.css"),
        katex = katex,
        gtag = gtag,
        navbar = chrome.navbar,
        content = content_html,
        footer = chrome.footer,
        zoom_script = zoom_script,
    )
}

/// Site-wide stylesheet, emitted once as a generated asset.
pub const SITE_CSS: &str = r#"/* docsite-kit default theme */
:root {
    --primary: #8c3232;
    --primary-dark: #6e2727;
    --text: #1c1e21;
    --text-muted: #606770;
    --surface: #ffffff;
    --surface-alt: #f5f6f7;
    --footer-dark: #303846;
}

* { margin: 0; padding: 0; box-sizing: border-box; }

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    line-height: 1.65;
    color: var(--text);
    background: var(--surface);
}

.container { max-width: 1140px; margin: 0 auto; padding: 0 1rem; }
.row { display: flex; flex-wrap: wrap; margin: 0 -1rem; }
.col { flex: 1 1 0; padding: 0 1rem; min-width: 240px; }
.text--center { text-align: center; }
.padding-horiz--md { padding-left: 1rem; padding-right: 1rem; }

/* Navbar */
.navbar {
    display: flex;
    background: var(--surface);
    box-shadow: 0 1px 2px 0 rgba(0, 0, 0, 0.1);
    padding: 0.5rem 1rem;
    position: sticky;
    top: 0;
    z-index: 10;
}
.navbar__inner { display: flex; width: 100%; justify-content: space-between; }
.navbar__items { display: flex; align-items: center; gap: 0.75rem; }
.navbar__brand { display: flex; align-items: center; gap: 0.5rem; text-decoration: none; color: var(--text); }
.navbar__logo { height: 2rem; }
.navbar__title { font-weight: 700; }
.navbar__link { color: var(--text); text-decoration: none; padding: 0.25rem 0.5rem; }
.navbar__link:hover { color: var(--primary); }

/* Hero */
.hero {
    text-align: center;
    padding: 4rem 1rem;
    background: var(--primary);
    color: #ffffff;
}
.hero__title { font-size: 3rem; margin-bottom: 0.5rem; }
.hero__subtitle { font-size: 1.3rem; opacity: 0.9; margin-bottom: 1.5rem; }
.hero__cta {
    display: inline-block;
    background: #ffffff;
    color: var(--primary);
    border-radius: 4px;
    padding: 0.75rem 1.5rem;
    font-weight: 600;
    text-decoration: none;
}
.hero__cta:hover { background: var(--surface-alt); }
.hero__rule { border: none; border-top: 1px solid rgba(255, 255, 255, 0.3); margin-top: 2rem; }

/* Feature cards */
.features { padding: 3rem 0; }
.feature__link { color: var(--text); text-decoration: none; display: block; }
.feature__link:hover h3 { color: var(--primary); }
.feature__icon { height: 180px; width: 180px; }

/* Markdown content */
.main-wrapper { max-width: 860px; margin: 0 auto; padding: 2rem 1rem 4rem; }
.markdown h1 { font-size: 2.2rem; margin: 1.5rem 0 1rem; }
.markdown h2 { font-size: 1.6rem; margin: 1.5rem 0 0.75rem; }
.markdown h3 { font-size: 1.25rem; margin: 1rem 0 0.5rem; }
.markdown p, .markdown ul, .markdown ol, .markdown dl { margin-bottom: 1rem; }
.markdown li { margin-left: 1.5rem; }
.markdown code {
    background: var(--surface-alt);
    border-radius: 3px;
    padding: 0.1rem 0.3rem;
    font-size: 0.9em;
}
.markdown pre {
    background: var(--surface-alt);
    border-radius: 6px;
    padding: 1rem;
    overflow-x: auto;
    margin-bottom: 1rem;
}
.markdown pre code { background: none; padding: 0; }
.markdown blockquote {
    border-left: 3px solid var(--primary);
    padding-left: 1rem;
    color: var(--text-muted);
    margin-bottom: 1rem;
}
.markdown table { border-collapse: collapse; margin-bottom: 1rem; }
.markdown th, .markdown td { border: 1px solid #dadde1; padding: 0.4rem 0.75rem; }
.markdown img { max-width: 100%; }

.heading-anchor {
    margin-left: 0.4rem;
    text-decoration: none;
    color: var(--text-muted);
    opacity: 0;
}
h1:hover .heading-anchor, h2:hover .heading-anchor, h3:hover .heading-anchor,
h4:hover .heading-anchor, h5:hover .heading-anchor, h6:hover .heading-anchor { opacity: 1; }

.doc-meta { color: var(--text-muted); font-size: 0.85rem; margin-bottom: 1.5rem; }

.citation a { text-decoration: none; }
.references { margin-top: 3rem; border-top: 1px solid #dadde1; padding-top: 1rem; }

/* Footer */
.footer { padding: 2rem 1rem; }
.footer--dark { background: var(--footer-dark); color: #ebedf0; }
.footer--dark .footer__link { color: #ebedf0; }
.footer__title { font-weight: 700; margin-bottom: 0.5rem; }
.footer__items { list-style: none; }
.footer__item { margin-bottom: 0.25rem; }
.footer__link { text-decoration: none; }
.footer__link:hover { text-decoration: underline; }
.footer__bottom { margin-top: 2rem; font-size: 0.85rem; opacity: 0.8; }

/* Image zoom overlay */
.image-zoom-overlay {
    position: fixed;
    inset: 0;
    display: flex;
    align-items: center;
    justify-content: center;
    cursor: zoom-out;
    z-index: 100;
}
.image-zoom-target { max-width: 100%; max-height: 100%; }
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use docsite_kit_core::parse_site_toml_str;

    const SITE_TOML: &str = r##"
[site]
title = "Make Use of Data"
tagline = "A collection of useful data-related notes, considerations, and articles"
url = "https://www.makeuseofdata.com"
favicon = "static/img/favicon.ico"
organization = "make-use-of-data"
project = "website"

[[section]]
id = "docs"
path = "docs"
route_prefix = "docs"

[pipeline]
transforms = ["gfm", "math"]

[navbar]
title = "MakeUseofData"

[footer]
copyright_owner = "MakeUseofData.com"

[analytics]
tracking_id = "G-VKV4WP95W2"
anonymize_ip = true
"##;

    #[test]
    fn test_page_carries_chrome_and_content() {
        let site = parse_site_toml_str(SITE_TOML).unwrap();
        let chrome = Chrome::for_site(&site);
        let html = render_page(&site, &chrome, Some("Intro"), "Intro page", "<p>body</p>");

        assert!(html.contains("<title>Intro | Make Use of Data</title>"));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("navbar"));
        assert!(html.contains(&site.footer.copyright));
        assert!(html.contains("href=\"/img/favicon.ico\""));
    }

    #[test]
    fn test_homepage_title_greeting() {
        let site = parse_site_toml_str(SITE_TOML).unwrap();
        let chrome = Chrome::for_site(&site);
        let html = render_page(&site, &chrome, None, "tagline", "<p>home</p>");
        assert!(html.contains("<title>Hello from Make Use of Data</title>"));
    }

    #[test]
    fn test_gtag_snippet_present_with_analytics() {
        let site = parse_site_toml_str(SITE_TOML).unwrap();
        let chrome = Chrome::for_site(&site);
        let html = render_page(&site, &chrome, None, "d", "");

        assert!(html.contains("googletagmanager.com/gtag/js?id=G-VKV4WP95W2"));
        assert!(html.contains("'anonymize_ip': true"));
    }

    #[test]
    fn test_gtag_absent_without_analytics() {
        let start = SITE_TOML.find("[analytics]").unwrap();
        let site = parse_site_toml_str(&SITE_TOML[..start]).unwrap();
        let chrome = Chrome::for_site(&site);
        let html = render_page(&site, &chrome, None, "d", "");
        assert!(!html.contains("googletagmanager"));
    }

    #[test]
    fn test_katex_included_only_with_math_transform() {
        let site = parse_site_toml_str(SITE_TOML).unwrap();
        let chrome = Chrome::for_site(&site);
        let html = render_page(&site, &chrome, None, "d", "");
        assert!(html.contains("katex.min.css"));

        let toml = SITE_TOML.replace("transforms = [\"gfm\", \"math\"]", "transforms = [\"gfm\"]");
        let site = parse_site_toml_str(&toml).unwrap();
        let chrome = Chrome::for_site(&site);
        let html = render_page(&site, &chrome, None, "d", "");
        assert!(!html.contains("katex.min.css"));
    }

    #[test]
    fn test_image_zoom_options_passed_through() {
        let site = parse_site_toml_str(SITE_TOML).unwrap();
        let chrome = Chrome::for_site(&site);
        let html = render_page(&site, &chrome, None, "d", "");

        assert!(html.contains(".markdown img"));
        assert!(html.contains("'#8c3232'"));
        assert!(html.contains("'24px'"));
    }

    #[test]
    fn test_code_theme_data_attributes() {
        let site = parse_site_toml_str(SITE_TOML).unwrap();
        let chrome = Chrome::for_site(&site);
        let html = render_page(&site, &chrome, None, "d", "");
        assert!(html.contains("data-code-theme-light=\"github\""));
        assert!(html.contains("data-code-theme-dark=\"dracula\""));
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b>"x" & 'y'</b>"#),
            "&lt;b&gt;&quot;x&quot; &amp; &#x27;y&#x27;&lt;/b&gt;"
        );
    }
}
