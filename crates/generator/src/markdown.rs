//! Markdown compilation with the configured transform chain.
//!
//! Transforms come in two shapes: CommonMark extension flags, folded into
//! the parser options, and event-stream passes applied in the author's
//! order. Earlier passes' output is later passes' input.

use docsite_kit_core::Transform;
use pulldown_cmark::{html, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::collections::HashMap;

use crate::citations::Bibliography;
use crate::page::html_escape;

/// A compiled document: rendered HTML plus whatever the compiler learned
/// along the way.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub html: String,
    /// Text of the first top-level heading, used for the page title
    pub title: Option<String>,
    pub word_count: usize,
}

/// Compile one markdown document through the transform chain.
///
/// `bibliography` must be present when the chain contains the citations
/// transform; the caller loads it once per build.
pub fn compile(
    content: &str,
    transforms: &[Transform],
    bibliography: Option<&Bibliography>,
) -> Compiled {
    let body = strip_front_matter(content);

    let mut options = Options::empty();
    for transform in transforms {
        options.insert(parser_options(transform));
    }

    let mut events: Vec<Event<'_>> = Parser::new_ext(body, options).collect();

    for transform in transforms {
        match transform {
            Transform::HeadingIds => assign_heading_ids(&mut events),
            Transform::AutolinkHeadings => events = autolink_headings(events),
            Transform::Math => events = wrap_math(events),
            Transform::Citations(_) => {
                if let Some(bib) = bibliography {
                    events = crate::citations::CitationPass::new(bib).apply(events);
                }
            }
            // Parser-option transforms have already done their work
            Transform::Gfm | Transform::DefinitionLists | Transform::SmartPunctuation => {}
        }
    }

    let title = first_heading_text(&events);
    let word_count = count_words(&events);

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());

    Compiled {
        html: out,
        title,
        word_count,
    }
}

fn parser_options(transform: &Transform) -> Options {
    match transform {
        Transform::Gfm => {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_GFM
        }
        Transform::DefinitionLists => Options::ENABLE_DEFINITION_LIST,
        Transform::SmartPunctuation => Options::ENABLE_SMART_PUNCTUATION,
        Transform::Math => Options::ENABLE_MATH,
        Transform::HeadingIds => Options::ENABLE_HEADING_ATTRIBUTES,
        Transform::AutolinkHeadings | Transform::Citations(_) => Options::empty(),
    }
}

/// Drop a leading `---` front-matter block; the metadata inside it is the
/// authoring layer's concern, not the compiler's.
pub fn strip_front_matter(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("---\n") else {
        return content;
    };
    match rest.find("\n---\n") {
        Some(end) => &rest[end + 5..],
        None => content,
    }
}

/// Give every id-less heading a slug derived from its text. Explicitly
/// authored ids (heading attributes) are left alone; collisions get a
/// numeric suffix.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut idx = 0;

    while idx < events.len() {
        let needs_id = matches!(
            &events[idx],
            Event::Start(Tag::Heading { id: None, .. })
        );
        if !needs_id {
            idx += 1;
            continue;
        }

        let text = heading_text(&events[idx..]);
        let mut slug = slugify(&text);
        let n = seen.entry(slug.clone()).or_insert(0);
        *n += 1;
        if *n > 1 {
            slug = format!("{}-{}", slug, *n - 1);
        }

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[idx] {
            *id = Some(CowStr::from(slug));
        }
        idx += 1;
    }
}

/// Append an anchor link inside each heading that carries an id.
fn autolink_headings<'a>(events: Vec<Event<'a>>) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut pending_anchor: Option<String> = None;

    for event in events {
        match &event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => {
                pending_anchor = Some(id.to_string());
                out.push(event);
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(id) = pending_anchor.take() {
                    out.push(Event::Html(CowStr::from(format!(
                        "<a class=\"heading-anchor\" href=\"#{}\" aria-label=\"Direct link to this heading\">#</a>",
                        html_escape(&id)
                    ))));
                }
                out.push(event);
            }
            _ => out.push(event),
        }
    }

    out
}

/// Wrap math events as KaTeX-ready spans; the actual typesetting stays
/// client-side, matching the delegated-rendering model.
fn wrap_math<'a>(events: Vec<Event<'a>>) -> Vec<Event<'a>> {
    events
        .into_iter()
        .map(|event| match event {
            Event::InlineMath(src) => Event::Html(CowStr::from(format!(
                "<span class=\"math math-inline\">\\({}\\)</span>",
                html_escape(&src)
            ))),
            Event::DisplayMath(src) => Event::Html(CowStr::from(format!(
                "<div class=\"math math-display\">\\[{}\\]</div>",
                html_escape(&src)
            ))),
            other => other,
        })
        .collect()
}

/// Collect the text of the heading starting at `events[0]`.
fn heading_text(events: &[Event<'_>]) -> String {
    let mut text = String::new();
    for event in &events[1..] {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(t),
            Event::End(TagEnd::Heading(_)) => break,
            _ => {}
        }
    }
    text
}

fn first_heading_text(events: &[Event<'_>]) -> Option<String> {
    for (idx, event) in events.iter().enumerate() {
        if matches!(
            event,
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            })
        ) {
            let text = heading_text(&events[idx..]);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn count_words(events: &[Event<'_>]) -> usize {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Text(t) => Some(t.split_whitespace().count()),
            _ => None,
        })
        .sum()
}

fn slugify(text: &str) -> String {
    let slug: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c
            } else if c.is_whitespace() || c == '-' || c == '_' {
                '-'
            } else {
                '\0'
            }
        })
        .filter(|&c| c != '\0')
        .collect();

    let collapsed: Vec<&str> = slug.split('-').filter(|s| !s.is_empty()).collect();
    if collapsed.is_empty() {
        "section".to_string()
    } else {
        collapsed.join("-")
    }
}
